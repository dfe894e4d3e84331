//! Shared types for the skyport mission engine: the persisted domain model,
//! the keyed storage schema, the operation/event surface, and per-operation
//! receipts.

pub mod api;
pub mod engine;
pub mod error;
pub mod game;

/// Account identity, supplied by the trusted auth layer.
pub type AccountId = u64;
/// Owned aircraft (unit) identity.
pub type AircraftId = u64;
/// Catalog aircraft type identity.
pub type AircraftTypeId = u64;
/// Mission template (catalog) identity.
pub type TemplateId = u64;
/// Activated mission instance identity.
pub type MissionId = u64;
/// Unix timestamp in seconds.
pub type Timestamp = u64;
