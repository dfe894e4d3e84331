//! Receipts returned to the caller by each engine operation. These cross an
//! in-process boundary only (the HTTP layer shapes its own responses), so
//! unlike the persisted types they carry no storage codec.

use crate::game::Aircraft;
use crate::{AccountId, AircraftId, MissionId, TemplateId, Timestamp};

/// Result of `OpenAccount`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenReceipt {
    pub account: AccountId,
    pub balance: u64,
}

/// Result of `PurchaseAircraft`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub aircraft: Aircraft,
    pub new_balance: u64,
}

/// Result of `SellAircraft`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleReceipt {
    pub aircraft: AircraftId,
    pub sale_price: u64,
    pub new_balance: u64,
}

/// Result of `ActivateMission`. The real duration is returned so clients can
/// animate progress, but whether it beat the nominal duration (the outcome)
/// is only revealed at settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivationReceipt {
    pub mission: MissionId,
    pub new_balance: u64,
    pub started_at: Timestamp,
    pub planned_finish: Timestamp,
    pub nominal_duration: u64,
    pub real_duration: u64,
}

/// One settled instance inside a [`ResolutionReport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettledMission {
    pub mission: MissionId,
    pub template: TemplateId,
    pub aircraft: AircraftId,
    pub success: bool,
    pub reward_applied: u64,
    pub xp_applied: u64,
}

/// Result of `ResolveDueMissions`: every due instance for the account,
/// settled together, with the balance written once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionReport {
    pub new_balance: u64,
    pub settled: Vec<SettledMission>,
}

/// Result of `AbortMission`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbortReceipt {
    pub mission: MissionId,
    pub released: AircraftId,
}

/// Tagged union of the per-operation receipts, returned by the generic
/// dispatch entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Receipt {
    Open(OpenReceipt),
    Purchase(PurchaseReceipt),
    Sale(SaleReceipt),
    Activation(ActivationReceipt),
    Resolution(ResolutionReport),
    Abort(AbortReceipt),
}
