use skyport_types::{
    api::Receipt,
    engine::{Event, Key, Operation, Value},
    error::EngineError,
    game::{Account, Aircraft, AircraftStatus, LedgerCategory, LedgerEntry},
    AccountId, AircraftId, MissionId, Timestamp,
};
use std::collections::BTreeMap;

use crate::state::{State, Status};

mod handlers;

/// Write-buffering overlay over a [`State`].
///
/// A layer is created per workflow call: reads fall through to the backing
/// store, writes collect in `pending`, and nothing is visible to anyone else
/// until the caller commits the change set as one unit. Dropping the layer
/// (on any handler error) therefore rolls the whole call back.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,
    events: Vec<Event>,

    entropy: [u8; 32],
    now: Timestamp,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, entropy: [u8; 32], now: Timestamp) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
            events: Vec::new(),
            entropy,
            now,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Dispatch one operation to its workflow handler.
    pub async fn apply_operation(&mut self, operation: &Operation) -> Result<Receipt, EngineError> {
        match operation {
            Operation::OpenAccount { account, name } => self
                .handle_open_account(*account, name)
                .await
                .map(Receipt::Open),
            Operation::PurchaseAircraft {
                account,
                aircraft_type,
            } => self
                .handle_purchase_aircraft(*account, *aircraft_type)
                .await
                .map(Receipt::Purchase),
            Operation::SellAircraft { account, aircraft } => self
                .handle_sell_aircraft(*account, *aircraft)
                .await
                .map(Receipt::Sale),
            Operation::ActivateMission { account, template } => self
                .handle_activate_mission(*account, *template)
                .await
                .map(Receipt::Activation),
            Operation::ResolveDueMissions { account } => self
                .handle_resolve_due_missions(*account)
                .await
                .map(Receipt::Resolution),
            Operation::AbortMission { account, mission } => self
                .handle_abort_mission(*account, *mission)
                .await
                .map(Receipt::Abort),
        }
    }

    /// Consume the layer, yielding the ordered change set and the events the
    /// committed workflow produced.
    pub fn commit(self) -> (Vec<(Key, Status)>, Vec<Event>) {
        (self.pending.into_iter().collect(), self.events)
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub(crate) fn entropy(&self) -> [u8; 32] {
        self.entropy
    }

    /// Load an account that exists and is active.
    pub(crate) async fn active_account(&self, account: AccountId) -> Result<Account, EngineError> {
        match self.get(&Key::Account(account)).await {
            Some(Value::Account(record)) if record.is_active => Ok(record),
            _ => Err(EngineError::AccountNotFound),
        }
    }

    /// Load an index list, defaulting to empty.
    pub(crate) async fn ids(&self, key: &Key) -> Vec<u64> {
        match self.get(key).await {
            Some(Value::Ids(ids)) => ids,
            _ => Vec::new(),
        }
    }

    /// Take the next id from a sequence key.
    pub(crate) async fn next_id(&mut self, key: Key) -> u64 {
        let next = match self.get(&key).await {
            Some(Value::Seq(next)) => next,
            _ => 0,
        };
        self.insert(key, Value::Seq(next + 1)).await;
        next
    }

    /// Append one immutable ledger entry and adjust the cached balance in
    /// lock-step. This is the only path that touches `Account::balance`, and
    /// it always runs inside the same pending set as the business effect it
    /// records.
    pub(crate) async fn record_entry(
        &mut self,
        id: AccountId,
        account: &mut Account,
        amount: i64,
        category: LedgerCategory,
        description: String,
        aircraft: Option<AircraftId>,
        mission: Option<MissionId>,
    ) {
        let entry = LedgerEntry {
            account: id,
            seq: account.ledger_entries,
            amount,
            category,
            description,
            aircraft,
            mission,
            created_at: self.now,
        };
        self.insert(Key::Ledger(id, entry.seq), Value::Ledger(entry))
            .await;

        account.ledger_entries += 1;
        if amount >= 0 {
            account.balance = account.balance.saturating_add(amount as u64);
        } else {
            // Debits are precondition-checked; saturate rather than wrap if a
            // caller ever slips one through.
            account.balance = account.balance.saturating_sub(amount.unsigned_abs());
        }
    }

    /// Compare-and-set an aircraft's status. Fails with `UnitStateConflict`
    /// when the stored status does not match `expected`, which is how two
    /// racing workflows are kept from claiming or double-releasing a unit.
    pub(crate) async fn set_aircraft_status(
        &mut self,
        aircraft: AircraftId,
        expected: AircraftStatus,
        new: AircraftStatus,
    ) -> Result<Aircraft, EngineError> {
        let mut record = match self.get(&Key::Aircraft(aircraft)).await {
            Some(Value::Aircraft(record)) => record,
            _ => return Err(EngineError::AircraftNotFound),
        };
        if record.status != expected {
            return Err(EngineError::UnitStateConflict);
        }
        record.status = new;
        self.insert(Key::Aircraft(aircraft), Value::Aircraft(record.clone()))
            .await;
        Ok(record)
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Option<Value> {
        match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await,
        }
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    async fn delete(&mut self, key: &Key) {
        self.pending.insert(key.clone(), Status::Delete);
    }
}
