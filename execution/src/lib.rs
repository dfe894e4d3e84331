pub mod mission;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod integration_tests;

mod engine;

mod layer;

mod state;

pub use engine::Engine;
pub use layer::Layer;
pub use state::{load_account, Adb, Memory, State, Status};
