//! Workflow handlers, one method per [`crate::layer::Layer`] operation.
//! Split by concern: fleet management (accounts and aircraft) and the
//! mission lifecycle (activate, resolve, abort).

mod fleet;
mod missions;
