//! Headless randomized workload harness: drives an in-memory engine with a
//! seeded stream of operations over a virtual clock and checks the engine's
//! invariants after every batch. Used to shake out workflow interleavings no
//! hand-written test would cover.

use anyhow::{bail, ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use skyport_execution::{mocks::seed_catalog, Engine, Memory, State};
use skyport_types::{
    engine::{Key, Value},
    error::EngineError,
    game::{AircraftStatus, MissionStatus},
    AccountId, Timestamp,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Catalog sizes written by the fixture seed.
const AIRCRAFT_TYPES: u64 = 5;
const TEMPLATES: u64 = 4;

/// Steps between invariant sweeps.
const CHECK_INTERVAL: u64 = 256;

/// Largest virtual-clock jump per step, in seconds.
const MAX_CLOCK_JUMP: u64 = 3_600;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub purchases: u64,
    pub sales: u64,
    pub activations: u64,
    pub settlements: u64,
    pub aborts: u64,
    pub rejections: u64,
}

pub struct Simulator {
    engine: Engine<Memory>,
    rng: StdRng,
    now: Timestamp,
    accounts: Vec<AccountId>,
    stats: Stats,
}

impl Simulator {
    pub async fn new(seed: u64, accounts: u64) -> Result<Self> {
        let mut state = Memory::default();
        seed_catalog(&mut state).await;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut entropy = [0u8; 32];
        rng.fill(&mut entropy);

        let mut engine = Engine::new(state, entropy);
        let mut now: Timestamp = 1_700_000_000;
        let mut opened = Vec::with_capacity(accounts as usize);
        for account in 1..=accounts {
            let (result, _) = engine
                .open_account(account, format!("operator-{account}"), now)
                .await;
            result.map_err(|e| anyhow::anyhow!("open {account}: {e}"))?;
            now += 1;
            opened.push(account);
        }

        Ok(Self {
            engine,
            rng,
            now,
            accounts: opened,
            stats: Stats::default(),
        })
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Run `steps` random operations, sweeping invariants periodically and
    /// once more at the end.
    pub async fn run(&mut self, steps: u64) -> Result<Stats> {
        for step in 0..steps {
            self.step().await?;
            if step % CHECK_INTERVAL == CHECK_INTERVAL - 1 {
                self.check_invariants().await?;
            }
        }
        self.check_invariants().await?;
        info!(stats = ?self.stats, "workload complete");
        Ok(self.stats)
    }

    async fn step(&mut self) -> Result<()> {
        self.now += self.rng.gen_range(0..MAX_CLOCK_JUMP);
        let account = self.accounts[self.rng.gen_range(0..self.accounts.len())];

        let outcome = match self.rng.gen_range(0..10u8) {
            0 | 1 => {
                let aircraft_type = self.rng.gen_range(0..AIRCRAFT_TYPES);
                let (result, _) = self
                    .engine
                    .purchase_aircraft(account, aircraft_type, self.now)
                    .await;
                result.map(|_| &mut self.stats.purchases)
            }
            2 => match self.random_owned_aircraft(account).await {
                Some(aircraft) => {
                    let (result, _) = self.engine.sell_aircraft(account, aircraft, self.now).await;
                    result.map(|_| &mut self.stats.sales)
                }
                None => return Ok(()),
            },
            3..=6 => {
                let template = self.rng.gen_range(0..TEMPLATES);
                let (result, _) = self
                    .engine
                    .activate_mission(account, template, self.now)
                    .await;
                result.map(|_| &mut self.stats.activations)
            }
            7 | 8 => {
                let (result, _) = self.engine.resolve_due_missions(account, self.now).await;
                match result {
                    Ok(report) => {
                        self.stats.settlements += report.settled.len() as u64;
                        return Ok(());
                    }
                    Err(e) => Err(e),
                }
            }
            _ => match self.random_running_mission(account).await {
                Some(mission) => {
                    let (result, _) = self.engine.abort_mission(account, mission, self.now).await;
                    result.map(|_| &mut self.stats.aborts)
                }
                None => return Ok(()),
            },
        };

        match outcome {
            Ok(counter) => *counter += 1,
            // Every rejection here is a legal engine answer to a random
            // request; anything else would have panicked in the engine.
            Err(
                EngineError::InsufficientFunds { .. }
                | EngineError::NoCompatibleUnit
                | EngineError::NoDueMissions
                | EngineError::FleetLimitReached
                | EngineError::MissionNotFound
                | EngineError::MissionNotRunning
                | EngineError::UnitStateConflict,
            ) => self.stats.rejections += 1,
            Err(e) => bail!("unexpected rejection: {e}"),
        }
        Ok(())
    }

    async fn random_owned_aircraft(&mut self, account: AccountId) -> Option<u64> {
        let fleet = self.ids(Key::Fleet(account)).await;
        if fleet.is_empty() {
            return None;
        }
        Some(fleet[self.rng.gen_range(0..fleet.len())])
    }

    async fn random_running_mission(&mut self, account: AccountId) -> Option<u64> {
        let running = self.ids(Key::RunningMissions(account)).await;
        if running.is_empty() {
            return None;
        }
        Some(running[self.rng.gen_range(0..running.len())])
    }

    async fn ids(&self, key: Key) -> Vec<u64> {
        match self.engine.state().get(&key).await {
            Some(Value::Ids(ids)) => ids,
            _ => Vec::new(),
        }
    }

    /// The two structural invariants the engine promises: every balance is
    /// the sum of its ledger, and committed aircraft correspond one-to-one
    /// with running mission instances.
    async fn check_invariants(&self) -> Result<()> {
        for &account in &self.accounts {
            let balance = match self.engine.balance(account).await {
                Ok(balance) => balance,
                Err(e) => bail!("account {account} disappeared: {e}"),
            };
            let sum = match self.engine.ledger_sum(account).await {
                Some(sum) => sum,
                None => bail!("ledger for {account} disappeared"),
            };
            ensure!(
                balance as i64 == sum,
                "account {account}: balance {balance} != ledger sum {sum}"
            );

            let mut committed = BTreeSet::new();
            for id in self.ids(Key::Fleet(account)).await {
                match self.engine.state().get(&Key::Aircraft(id)).await {
                    Some(Value::Aircraft(unit)) => {
                        if unit.status == AircraftStatus::Committed {
                            committed.insert(id);
                        }
                    }
                    _ => bail!("fleet index of {account} points at missing aircraft {id}"),
                }
            }

            let mut flying = BTreeSet::new();
            for id in self.ids(Key::RunningMissions(account)).await {
                match self.engine.state().get(&Key::Mission(id)).await {
                    Some(Value::Mission(instance)) => {
                        ensure!(
                            instance.status == MissionStatus::Running,
                            "running index of {account} holds terminal mission {id}"
                        );
                        flying.insert(instance.aircraft);
                    }
                    _ => bail!("running index of {account} points at missing mission {id}"),
                }
            }
            ensure!(
                committed == flying,
                "account {account}: committed {committed:?} != flying {flying:?}"
            );
        }
        debug!(accounts = self.accounts.len(), "invariants hold");
        Ok(())
    }
}
