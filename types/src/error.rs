use thiserror::Error;

/// Business-rule violations surfaced by the engine. Every variant is
/// attributable to one precondition; none of them indicates a fault in the
/// engine itself, and a returned error implies no state was written.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("account not found or inactive")]
    AccountNotFound,
    #[error("account already exists")]
    AccountExists,
    #[error("mission not found, inactive, or not owned by the account")]
    MissionNotFound,
    #[error("insufficient credits: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("no idle aircraft with the required role")]
    NoCompatibleUnit,
    #[error("aircraft status changed concurrently")]
    UnitStateConflict,
    #[error("mission is not running")]
    MissionNotRunning,
    /// Expected outcome of an opportunistic sweep, not a failure.
    #[error("no missions due for settlement")]
    NoDueMissions,
    #[error("aircraft not found or not owned by the account")]
    AircraftNotFound,
    #[error("aircraft type not found or inactive")]
    AircraftTypeNotFound,
    #[error("fleet limit reached")]
    FleetLimitReached,
}
