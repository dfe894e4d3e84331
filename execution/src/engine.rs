use skyport_types::{
    api::{
        AbortReceipt, ActivationReceipt, OpenReceipt, PurchaseReceipt, Receipt, ResolutionReport,
        SaleReceipt,
    },
    engine::{Event, Key, Operation, Value},
    error::EngineError,
    AccountId, AircraftId, AircraftTypeId, MissionId, TemplateId, Timestamp,
};
use tracing::debug;

use crate::layer::Layer;
use crate::state::State;

/// The engine: owns a keyed store and turns operations into atomic commits.
///
/// Every call buffers its writes in a [`Layer`] and applies them to the store
/// only on success, so a returned error always means the store is untouched.
/// Timestamps are supplied by the caller; the engine never reads a clock.
pub struct Engine<S: State> {
    state: S,
    entropy: [u8; 32],
}

impl<S: State> Engine<S> {
    /// `entropy` seeds the per-mission outcome draws. It must be fixed for
    /// the lifetime of the store to keep replays deterministic.
    pub fn new(state: S, entropy: [u8; 32]) -> Self {
        Self { state, entropy }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Execute one operation at time `now`. On success the change set has
    /// been applied and the workflow's events are returned; on error nothing
    /// was written and the event list is empty.
    pub async fn apply(
        &mut self,
        operation: &Operation,
        now: Timestamp,
    ) -> (Result<Receipt, EngineError>, Vec<Event>) {
        let mut layer = Layer::new(&self.state, self.entropy, now);
        match layer.apply_operation(operation).await {
            Ok(receipt) => {
                let (changes, events) = layer.commit();
                debug!(
                    account = operation.account(),
                    writes = changes.len(),
                    "operation committed"
                );
                self.state.apply(changes).await;
                (Ok(receipt), events)
            }
            Err(e) => {
                debug!(account = operation.account(), "operation rejected: {e}");
                (Err(e), Vec::new())
            }
        }
    }

    pub async fn open_account(
        &mut self,
        account: AccountId,
        name: String,
        now: Timestamp,
    ) -> (Result<OpenReceipt, EngineError>, Vec<Event>) {
        let (result, events) = self
            .apply(&Operation::OpenAccount { account, name }, now)
            .await;
        (
            result.map(|receipt| match receipt {
                Receipt::Open(receipt) => receipt,
                _ => unreachable!(),
            }),
            events,
        )
    }

    pub async fn purchase_aircraft(
        &mut self,
        account: AccountId,
        aircraft_type: AircraftTypeId,
        now: Timestamp,
    ) -> (Result<PurchaseReceipt, EngineError>, Vec<Event>) {
        let (result, events) = self
            .apply(
                &Operation::PurchaseAircraft {
                    account,
                    aircraft_type,
                },
                now,
            )
            .await;
        (
            result.map(|receipt| match receipt {
                Receipt::Purchase(receipt) => receipt,
                _ => unreachable!(),
            }),
            events,
        )
    }

    pub async fn sell_aircraft(
        &mut self,
        account: AccountId,
        aircraft: AircraftId,
        now: Timestamp,
    ) -> (Result<SaleReceipt, EngineError>, Vec<Event>) {
        let (result, events) = self
            .apply(&Operation::SellAircraft { account, aircraft }, now)
            .await;
        (
            result.map(|receipt| match receipt {
                Receipt::Sale(receipt) => receipt,
                _ => unreachable!(),
            }),
            events,
        )
    }

    pub async fn activate_mission(
        &mut self,
        account: AccountId,
        template: TemplateId,
        now: Timestamp,
    ) -> (Result<ActivationReceipt, EngineError>, Vec<Event>) {
        let (result, events) = self
            .apply(&Operation::ActivateMission { account, template }, now)
            .await;
        (
            result.map(|receipt| match receipt {
                Receipt::Activation(receipt) => receipt,
                _ => unreachable!(),
            }),
            events,
        )
    }

    pub async fn resolve_due_missions(
        &mut self,
        account: AccountId,
        now: Timestamp,
    ) -> (Result<ResolutionReport, EngineError>, Vec<Event>) {
        let (result, events) = self
            .apply(&Operation::ResolveDueMissions { account }, now)
            .await;
        (
            result.map(|receipt| match receipt {
                Receipt::Resolution(receipt) => receipt,
                _ => unreachable!(),
            }),
            events,
        )
    }

    pub async fn abort_mission(
        &mut self,
        account: AccountId,
        mission: MissionId,
        now: Timestamp,
    ) -> (Result<AbortReceipt, EngineError>, Vec<Event>) {
        let (result, events) = self
            .apply(&Operation::AbortMission { account, mission }, now)
            .await;
        (
            result.map(|receipt| match receipt {
                Receipt::Abort(receipt) => receipt,
                _ => unreachable!(),
            }),
            events,
        )
    }

    /// Current cached balance of an account.
    pub async fn balance(&self, account: AccountId) -> Result<u64, EngineError> {
        match self.state.get(&Key::Account(account)).await {
            Some(Value::Account(record)) => Ok(record.balance),
            _ => Err(EngineError::AccountNotFound),
        }
    }

    /// Sum of the account's ledger entries. Always equals the cached balance
    /// for an account the engine created; exposed so callers can audit.
    pub async fn ledger_sum(&self, account: AccountId) -> Option<i64> {
        let record = match self.state.get(&Key::Account(account)).await {
            Some(Value::Account(record)) => record,
            _ => return None,
        };
        let mut sum = 0i64;
        for seq in 0..record.ledger_entries {
            if let Some(Value::Ledger(entry)) = self.state.get(&Key::Ledger(account, seq)).await {
                sum += entry.amount;
            }
        }
        Some(sum)
    }
}
