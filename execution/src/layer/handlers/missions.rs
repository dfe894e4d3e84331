//! Mission lifecycle workflows: activate, resolve the due set, abort.

use skyport_types::{
    api::{AbortReceipt, ActivationReceipt, ResolutionReport, SettledMission},
    engine::{Event, Key, Value},
    error::EngineError,
    game::{
        AircraftStatus, LedgerCategory, MissionInstance, MissionStatus, MissionTemplate,
        FAILURE_TIMEOUT,
    },
    AccountId, AircraftId, MissionId, TemplateId,
};
use tracing::warn;

use crate::layer::Layer;
use crate::mission::{plan_duration, OutcomeRng};
use crate::state::State;

impl<'a, S: State> Layer<'a, S> {
    /// Activate a catalog mission: debit the cost, commit the lowest-id idle
    /// aircraft of the required role, and fix the outcome by drawing the
    /// duration factor now. Preconditions are checked in a stable order
    /// (template, account, funds, unit) so callers see deterministic errors.
    pub(crate) async fn handle_activate_mission(
        &mut self,
        account: AccountId,
        template: TemplateId,
    ) -> Result<ActivationReceipt, EngineError> {
        let catalog = match self.get(&Key::Template(template)).await {
            Some(Value::Template(catalog)) if catalog.is_active => catalog,
            _ => return Err(EngineError::MissionNotFound),
        };
        let mut record = self.active_account(account).await?;
        if record.balance < catalog.cost {
            return Err(EngineError::InsufficientFunds {
                have: record.balance,
                need: catalog.cost,
            });
        }

        let aircraft = self.allocate_aircraft(account, &catalog).await?;

        let id = self.next_id(Key::MissionSeq).await;
        let mut rng = OutcomeRng::new(&self.entropy(), id);
        let plan = plan_duration(catalog.duration_seconds, &mut rng);

        let started_at = self.now();
        let planned_finish = started_at + plan.real_seconds;
        let instance = MissionInstance {
            id,
            account,
            template,
            aircraft,
            status: MissionStatus::Running,
            started_at,
            planned_finish,
            cost_at_start: catalog.cost,
            reward_on_success: catalog.reward,
            xp_on_success: catalog.xp_reward,
            cost_applied: true,
            reward_applied: false,
            xp_applied: false,
            failure_reason: (!plan.will_succeed).then(|| FAILURE_TIMEOUT.to_string()),
        };

        self.record_entry(
            account,
            &mut record,
            -(catalog.cost as i64),
            LedgerCategory::MissionActivate,
            format!("mission cost: {}", catalog.name),
            Some(aircraft),
            Some(id),
        )
        .await;
        let new_balance = record.balance;

        let mut running = self.ids(&Key::RunningMissions(account)).await;
        running.push(id);
        self.insert(Key::Mission(id), Value::Mission(instance)).await;
        self.insert(Key::RunningMissions(account), Value::Ids(running))
            .await;
        self.insert(Key::Account(account), Value::Account(record))
            .await;

        self.emit(Event::MissionActivated {
            account,
            mission: id,
            template,
            aircraft,
            cost: catalog.cost,
            planned_finish,
            new_balance,
        });
        Ok(ActivationReceipt {
            mission: id,
            new_balance,
            started_at,
            planned_finish,
            nominal_duration: catalog.duration_seconds,
            real_duration: plan.real_seconds,
        })
    }

    /// Settle every due mission of the account in one commit: each instance
    /// goes terminal, each aircraft is released, and the balance is written
    /// once for the whole batch.
    pub(crate) async fn handle_resolve_due_missions(
        &mut self,
        account: AccountId,
    ) -> Result<ResolutionReport, EngineError> {
        let mut record = self.active_account(account).await?;

        let running = self.ids(&Key::RunningMissions(account)).await;
        let mut due = Vec::new();
        let mut still_running = Vec::new();
        for id in running {
            match self.get(&Key::Mission(id)).await {
                Some(Value::Mission(instance)) if instance.is_due(self.now()) => {
                    due.push(instance);
                }
                Some(Value::Mission(_)) => still_running.push(id),
                _ => {
                    warn!(mission = id, "running index points at missing mission");
                }
            }
        }
        if due.is_empty() {
            return Err(EngineError::NoDueMissions);
        }
        due.sort_by_key(|instance| instance.id);

        let mut settled = Vec::with_capacity(due.len());
        for mut instance in due {
            let success = instance.failure_reason.is_none();
            instance.status = if success {
                MissionStatus::Success
            } else {
                MissionStatus::Failed
            };

            // reward_applied only ever flips on a Success settlement; a
            // Failed instance keeps it false. Re-selection is impossible
            // either way since due-selection requires Running.
            let mut reward_applied = 0;
            let mut xp_applied = 0;
            if success {
                instance.reward_applied = true;
                reward_applied = instance.reward_on_success;
                self.record_entry(
                    account,
                    &mut record,
                    reward_applied as i64,
                    LedgerCategory::MissionReward,
                    format!("mission reward: {}", instance.id),
                    Some(instance.aircraft),
                    Some(instance.id),
                )
                .await;
                if !instance.xp_applied {
                    xp_applied = instance.xp_on_success;
                    record.grant_xp(xp_applied);
                    instance.xp_applied = true;
                }
            }

            // Release the unit. A conflict here means it was already freed
            // (or sold through a bug); the settlement still stands.
            if let Err(e) = self
                .set_aircraft_status(instance.aircraft, AircraftStatus::Committed, AircraftStatus::Idle)
                .await
            {
                warn!(
                    mission = instance.id,
                    aircraft = instance.aircraft,
                    "aircraft not committed at settlement: {e}"
                );
            }

            self.emit(Event::MissionSettled {
                account,
                mission: instance.id,
                aircraft: instance.aircraft,
                success,
                reward_applied,
                new_balance: record.balance,
            });
            settled.push(SettledMission {
                mission: instance.id,
                template: instance.template,
                aircraft: instance.aircraft,
                success,
                reward_applied,
                xp_applied,
            });
            self.insert(Key::Mission(instance.id), Value::Mission(instance))
                .await;
        }

        let new_balance = record.balance;
        self.insert(Key::RunningMissions(account), Value::Ids(still_running))
            .await;
        self.insert(Key::Account(account), Value::Account(record))
            .await;

        Ok(ResolutionReport {
            new_balance,
            settled,
        })
    }

    /// Cancel a running mission. The activation cost stays spent, no reward
    /// or xp is paid, and the aircraft returns to the idle pool.
    pub(crate) async fn handle_abort_mission(
        &mut self,
        account: AccountId,
        mission: MissionId,
    ) -> Result<AbortReceipt, EngineError> {
        self.active_account(account).await?;

        let mut instance = match self.get(&Key::Mission(mission)).await {
            Some(Value::Mission(instance)) if instance.account == account => instance,
            _ => return Err(EngineError::MissionNotFound),
        };
        if instance.status.is_terminal() {
            return Err(EngineError::MissionNotRunning);
        }

        instance.status = MissionStatus::Aborted;
        let released = instance.aircraft;

        if let Err(e) = self
            .set_aircraft_status(released, AircraftStatus::Committed, AircraftStatus::Idle)
            .await
        {
            warn!(
                mission,
                aircraft = released,
                "aircraft not committed at abort: {e}"
            );
        }

        let still_running: Vec<u64> = self
            .ids(&Key::RunningMissions(account))
            .await
            .into_iter()
            .filter(|id| *id != mission)
            .collect();
        self.insert(Key::Mission(mission), Value::Mission(instance))
            .await;
        self.insert(Key::RunningMissions(account), Value::Ids(still_running))
            .await;

        self.emit(Event::MissionAborted {
            account,
            mission,
            aircraft: released,
        });
        Ok(AbortReceipt { mission, released })
    }

    /// Pick the allocatable unit for a template: the lowest-id idle aircraft
    /// of the required role, claimed by compare-and-set. If a claim conflicts
    /// the next candidate is tried once before giving up.
    async fn allocate_aircraft(
        &mut self,
        account: AccountId,
        catalog: &MissionTemplate,
    ) -> Result<AircraftId, EngineError> {
        let mut fleet = self.ids(&Key::Fleet(account)).await;
        fleet.sort_unstable();

        let mut candidates = Vec::new();
        for id in fleet {
            if let Some(Value::Aircraft(unit)) = self.get(&Key::Aircraft(id)).await {
                if unit.role == catalog.required_role && unit.status == AircraftStatus::Idle {
                    candidates.push(id);
                }
            }
        }

        for id in candidates.into_iter().take(2) {
            match self
                .set_aircraft_status(id, AircraftStatus::Idle, AircraftStatus::Committed)
                .await
            {
                Ok(_) => return Ok(id),
                Err(EngineError::UnitStateConflict) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::NoCompatibleUnit)
    }
}
