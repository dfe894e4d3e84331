//! End-to-end engine tests over the in-memory store, plus one pass over the
//! durable store. Every test runs under the deterministic runtime.

use crate::mocks::{
    assert_reconciled, create_store, force_balance, seed_catalog, seeded_engine, T0,
    TEMPLATE_CARGO, TEMPLATE_RETIRED, TEMPLATE_STRIKE, TEST_ENTROPY, TYPE_ATTACK_CHEAP,
    TYPE_TRANSPORT,
};
use crate::{Engine, State};
use commonware_runtime::{deterministic, Runner as _};
use skyport_types::{
    engine::{Event, Key, Value},
    error::EngineError,
    game::{
        AircraftStatus, MissionInstance, MissionStatus, FLEET_LIMIT, STARTING_BALANCE,
    },
    AccountId, AircraftId, MissionId, Timestamp,
};

const ALICE: AccountId = 1;
const BOB: AccountId = 2;

async fn mission<S: State>(engine: &Engine<S>, id: MissionId) -> MissionInstance {
    match engine.state().get(&Key::Mission(id)).await {
        Some(Value::Mission(instance)) => instance,
        other => panic!("missing mission {id}: {other:?}"),
    }
}

async fn aircraft_status<S: State>(engine: &Engine<S>, id: AircraftId) -> AircraftStatus {
    match engine.state().get(&Key::Aircraft(id)).await {
        Some(Value::Aircraft(unit)) => unit.status,
        other => panic!("missing aircraft {id}: {other:?}"),
    }
}

/// Activate the cargo template repeatedly until the drawn outcome matches
/// `want_success`, settling each unwanted draw to free the aircraft again.
/// Returns the matching mission id and its planned finish.
async fn activate_until(
    engine: &mut Engine<crate::Memory>,
    account: AccountId,
    want_success: bool,
    mut now: Timestamp,
) -> (MissionId, Timestamp) {
    for _ in 0..64 {
        let (result, _) = engine.activate_mission(account, TEMPLATE_CARGO, now).await;
        let receipt = result.expect("activation failed");
        let success = receipt.real_duration <= receipt.nominal_duration;
        if success == want_success {
            return (receipt.mission, receipt.planned_finish);
        }
        now = receipt.planned_finish;
        engine
            .resolve_due_missions(account, now)
            .await
            .0
            .expect("settle failed");
    }
    panic!("no {want_success} draw in 64 activations");
}

#[test]
fn test_open_account() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;

        let (result, events) = engine.open_account(ALICE, "alice".to_string(), T0).await;
        let receipt = result.expect("open failed");
        assert_eq!(receipt.balance, STARTING_BALANCE);
        assert_eq!(
            events,
            vec![Event::AccountOpened {
                account: ALICE,
                starting_balance: STARTING_BALANCE,
            }]
        );
        assert_reconciled(&engine, ALICE).await;

        // Idempotence: a second open is rejected and writes nothing.
        let (result, events) = engine.open_account(ALICE, "alice".to_string(), T0).await;
        assert_eq!(result, Err(EngineError::AccountExists));
        assert!(events.is_empty());
        assert_eq!(engine.balance(ALICE).await, Ok(STARTING_BALANCE));

        // Balance lookups on unknown accounts fail typed, like the workflows.
        assert_eq!(engine.balance(BOB).await, Err(EngineError::AccountNotFound));
    });
}

#[test]
fn test_purchase_and_sell() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");

        let (result, _) = engine.purchase_aircraft(ALICE, TYPE_TRANSPORT, T0).await;
        let receipt = result.expect("purchase failed");
        assert_eq!(receipt.new_balance, STARTING_BALANCE - 3_000);
        assert_eq!(receipt.aircraft.status, AircraftStatus::Idle);
        let unit = receipt.aircraft.id;
        assert!(matches!(
            engine.state().get(&Key::Fleet(ALICE)).await,
            Some(Value::Ids(ids)) if ids == vec![unit]
        ));
        assert_reconciled(&engine, ALICE).await;

        // Resale at 70% of the purchase price.
        let (result, _) = engine.sell_aircraft(ALICE, unit, T0 + 60).await;
        let receipt = result.expect("sale failed");
        assert_eq!(receipt.sale_price, 2_100);
        assert_eq!(receipt.new_balance, STARTING_BALANCE - 3_000 + 2_100);
        assert!(engine.state().get(&Key::Aircraft(unit)).await.is_none());
        assert!(matches!(
            engine.state().get(&Key::Fleet(ALICE)).await,
            Some(Value::Ids(ids)) if ids.is_empty()
        ));
        assert_reconciled(&engine, ALICE).await;
    });
}

#[test]
fn test_fleet_limit() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        force_balance(engine.state_mut(), ALICE, 30_000).await;

        for _ in 0..FLEET_LIMIT {
            engine
                .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
                .await
                .0
                .expect("purchase failed");
        }
        let (result, _) = engine.purchase_aircraft(ALICE, TYPE_TRANSPORT, T0).await;
        assert_eq!(result, Err(EngineError::FleetLimitReached));
    });
}

#[test]
fn test_purchase_insufficient_funds_writes_nothing() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        force_balance(engine.state_mut(), ALICE, 100).await;

        let (result, events) = engine.purchase_aircraft(ALICE, TYPE_TRANSPORT, T0).await;
        assert_eq!(
            result,
            Err(EngineError::InsufficientFunds {
                have: 100,
                need: 3_000,
            })
        );
        assert!(events.is_empty());
        assert_eq!(engine.balance(ALICE).await, Ok(100));
        assert!(engine.state().get(&Key::AircraftSeq).await.is_none());
        assert!(engine.state().get(&Key::Fleet(ALICE)).await.is_none());
    });
}

#[test]
fn test_activation_and_settlement_scenario() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        let unit = engine
            .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
            .await
            .0
            .expect("purchase failed")
            .aircraft
            .id;
        force_balance(engine.state_mut(), ALICE, 1_000).await;

        // Cargo Run: cost 500, reward 900, nominal 1800s.
        let (result, events) = engine.activate_mission(ALICE, TEMPLATE_CARGO, T0).await;
        let receipt = result.expect("activation failed");
        assert_eq!(receipt.new_balance, 500);
        assert_eq!(receipt.started_at, T0);
        assert_eq!(
            receipt.planned_finish,
            T0 + receipt.real_duration
        );
        // Factor range [0.8, 1.2] of nominal.
        assert!(receipt.real_duration >= 1_440 && receipt.real_duration <= 2_160);
        assert!(matches!(events[0], Event::MissionActivated { .. }));

        let instance = mission(&engine, receipt.mission).await;
        assert_eq!(instance.status, MissionStatus::Running);
        assert!(instance.cost_applied);
        assert!(!instance.reward_applied);
        assert_eq!(aircraft_status(&engine, unit).await, AircraftStatus::Committed);
        assert_reconciled(&engine, ALICE).await;

        // Not yet due.
        let (result, _) = engine
            .resolve_due_missions(ALICE, receipt.planned_finish - 1)
            .await;
        assert_eq!(result, Err(EngineError::NoDueMissions));

        // Due: the outcome was fixed at activation, so the final balance is
        // 1400 on success and 500 on failure.
        let expected_success = receipt.real_duration <= receipt.nominal_duration;
        let (result, events) = engine
            .resolve_due_missions(ALICE, receipt.planned_finish)
            .await;
        let report = result.expect("resolution failed");
        assert_eq!(report.settled.len(), 1);
        assert_eq!(report.settled[0].success, expected_success);
        if expected_success {
            assert_eq!(report.new_balance, 1_400);
            assert_eq!(report.settled[0].reward_applied, 900);
            assert_eq!(report.settled[0].xp_applied, 50);
        } else {
            assert_eq!(report.new_balance, 500);
            assert_eq!(report.settled[0].reward_applied, 0);
            assert_eq!(report.settled[0].xp_applied, 0);
        }
        assert!(matches!(
            events[0],
            Event::MissionSettled { success, .. } if success == expected_success
        ));

        let instance = mission(&engine, receipt.mission).await;
        assert!(instance.status.is_terminal());
        assert_eq!(instance.reward_applied, expected_success);
        assert_eq!(aircraft_status(&engine, unit).await, AircraftStatus::Idle);
        assert_reconciled(&engine, ALICE).await;

        // Idempotence: nothing left to settle.
        let (result, _) = engine
            .resolve_due_missions(ALICE, receipt.planned_finish + 3_600)
            .await;
        assert_eq!(result, Err(EngineError::NoDueMissions));
    });
}

#[test]
fn test_activation_rejections_write_nothing() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");

        // Inactive template.
        let (result, _) = engine.activate_mission(ALICE, TEMPLATE_RETIRED, T0).await;
        assert_eq!(result, Err(EngineError::MissionNotFound));

        // No aircraft of the required role: the attack unit cannot fly cargo.
        engine
            .purchase_aircraft(ALICE, TYPE_ATTACK_CHEAP, T0)
            .await
            .0
            .expect("purchase failed");
        let before = engine.balance(ALICE).await;
        let (result, events) = engine.activate_mission(ALICE, TEMPLATE_CARGO, T0).await;
        assert_eq!(result, Err(EngineError::NoCompatibleUnit));
        assert!(events.is_empty());
        assert_eq!(engine.balance(ALICE).await, before);
        assert!(engine.state().get(&Key::MissionSeq).await.is_none());

        // Funds checked before allocation.
        force_balance(engine.state_mut(), ALICE, 1_000).await;
        let (result, _) = engine.activate_mission(ALICE, TEMPLATE_STRIKE, T0).await;
        assert_eq!(
            result,
            Err(EngineError::InsufficientFunds {
                have: 1_000,
                need: 1_200,
            })
        );
        assert_reconciled(&engine, ALICE).await;
    });
}

#[test]
fn test_batch_resolution() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        force_balance(engine.state_mut(), ALICE, 20_000).await;
        engine
            .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
            .await
            .0
            .expect("purchase failed");
        engine
            .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
            .await
            .0
            .expect("purchase failed");

        let first = engine
            .activate_mission(ALICE, TEMPLATE_CARGO, T0)
            .await
            .0
            .expect("activation failed");
        let second = engine
            .activate_mission(ALICE, TEMPLATE_CARGO, T0 + 10)
            .await
            .0
            .expect("activation failed");
        assert_ne!(first.mission, second.mission);
        assert_reconciled(&engine, ALICE).await;

        // Both instances settle in one call, ordered by id, with one balance.
        let due_at = first.planned_finish.max(second.planned_finish);
        let (result, events) = engine.resolve_due_missions(ALICE, due_at).await;
        let report = result.expect("resolution failed");
        assert_eq!(report.settled.len(), 2);
        assert_eq!(report.settled[0].mission, first.mission);
        assert_eq!(report.settled[1].mission, second.mission);
        assert_eq!(events.len(), 2);
        assert_eq!(report.new_balance, engine.balance(ALICE).await.unwrap());
        assert!(matches!(
            engine.state().get(&Key::RunningMissions(ALICE)).await,
            Some(Value::Ids(ids)) if ids.is_empty()
        ));
        assert_reconciled(&engine, ALICE).await;
    });
}

#[test]
fn test_failed_mission_pays_nothing() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        engine
            .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
            .await
            .0
            .expect("purchase failed");
        // Headroom for however many successful draws precede the failing one.
        force_balance(engine.state_mut(), ALICE, 100_000).await;

        let (id, due_at) = activate_until(&mut engine, ALICE, false, T0).await;
        let before = engine.balance(ALICE).await.unwrap();
        let xp_before = match engine.state().get(&Key::Account(ALICE)).await {
            Some(Value::Account(record)) => record.xp,
            _ => panic!("missing account"),
        };

        let report = engine
            .resolve_due_missions(ALICE, due_at)
            .await
            .0
            .expect("resolution failed");
        assert!(!report.settled[0].success);
        assert_eq!(report.new_balance, before);

        let instance = mission(&engine, id).await;
        assert_eq!(instance.status, MissionStatus::Failed);
        assert!(instance.failure_reason.is_some());
        // A failed settlement never marks the reward applied.
        assert!(!instance.reward_applied);
        assert!(!instance.xp_applied);
        match engine.state().get(&Key::Account(ALICE)).await {
            Some(Value::Account(record)) => assert_eq!(record.xp, xp_before),
            _ => panic!("missing account"),
        }
        assert_reconciled(&engine, ALICE).await;
    });
}

#[test]
fn test_abort_mission() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        engine
            .open_account(BOB, "bob".to_string(), T0)
            .await
            .0
            .expect("open failed");
        let unit = engine
            .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
            .await
            .0
            .expect("purchase failed")
            .aircraft
            .id;

        let receipt = engine
            .activate_mission(ALICE, TEMPLATE_CARGO, T0)
            .await
            .0
            .expect("activation failed");
        let balance_after_start = engine.balance(ALICE).await.unwrap();

        // Another account cannot touch the mission.
        let (result, _) = engine.abort_mission(BOB, receipt.mission, T0 + 60).await;
        assert_eq!(result, Err(EngineError::MissionNotFound));

        // Abort keeps the cost spent, pays nothing, and frees the unit.
        let (result, events) = engine.abort_mission(ALICE, receipt.mission, T0 + 60).await;
        let abort = result.expect("abort failed");
        assert_eq!(abort.released, unit);
        assert_eq!(events.len(), 1);
        assert_eq!(engine.balance(ALICE).await, Ok(balance_after_start));
        assert_eq!(mission(&engine, receipt.mission).await.status, MissionStatus::Aborted);
        assert_eq!(aircraft_status(&engine, unit).await, AircraftStatus::Idle);
        assert_reconciled(&engine, ALICE).await;

        // Aborted instances never settle, and cannot abort twice.
        let (result, _) = engine
            .resolve_due_missions(ALICE, receipt.planned_finish + 1)
            .await;
        assert_eq!(result, Err(EngineError::NoDueMissions));
        let (result, _) = engine.abort_mission(ALICE, receipt.mission, T0 + 120).await;
        assert_eq!(result, Err(EngineError::MissionNotRunning));
    });
}

#[test]
fn test_xp_accrues_and_levels() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        engine
            .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
            .await
            .0
            .expect("purchase failed");
        // Headroom for the failed draws interleaved with the wanted ones.
        force_balance(engine.state_mut(), ALICE, 100_000).await;

        // Ten successful cargo runs at 50 xp each reach level 2.
        let mut now = T0;
        for _ in 0..10 {
            let (_, due_at) = activate_until(&mut engine, ALICE, true, now).await;
            now = due_at;
            engine
                .resolve_due_missions(ALICE, now)
                .await
                .0
                .expect("settle failed");
        }

        match engine.state().get(&Key::Account(ALICE)).await {
            Some(Value::Account(record)) => {
                assert_eq!(record.xp, 500);
                assert_eq!(record.level, 2);
            }
            _ => panic!("missing account"),
        }
        assert_reconciled(&engine, ALICE).await;
    });
}

#[test]
fn test_ledger_is_dense_and_reconciled() {
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut engine = seeded_engine().await;
        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        engine
            .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
            .await
            .0
            .expect("purchase failed");
        let receipt = engine
            .activate_mission(ALICE, TEMPLATE_CARGO, T0)
            .await
            .0
            .expect("activation failed");
        engine
            .resolve_due_missions(ALICE, receipt.planned_finish)
            .await
            .0
            .expect("resolution failed");

        let record = match engine.state().get(&Key::Account(ALICE)).await {
            Some(Value::Account(record)) => record,
            _ => panic!("missing account"),
        };
        // Sequence numbers are dense from zero with no gaps.
        for seq in 0..record.ledger_entries {
            let entry = match engine.state().get(&Key::Ledger(ALICE, seq)).await {
                Some(Value::Ledger(entry)) => entry,
                other => panic!("missing ledger entry {seq}: {other:?}"),
            };
            assert_eq!(entry.seq, seq);
            assert_eq!(entry.account, ALICE);
        }
        assert!(engine
            .state()
            .get(&Key::Ledger(ALICE, record.ledger_entries))
            .await
            .is_none());
        assert_reconciled(&engine, ALICE).await;
    });
}

#[test]
fn test_durable_store_roundtrip() {
    let executor = deterministic::Runner::default();
    executor.start(|context| async move {
        let mut store = create_store(&context).await;
        seed_catalog(&mut store).await;
        let mut engine = Engine::new(store, TEST_ENTROPY);

        engine
            .open_account(ALICE, "alice".to_string(), T0)
            .await
            .0
            .expect("open failed");
        let unit = engine
            .purchase_aircraft(ALICE, TYPE_TRANSPORT, T0)
            .await
            .0
            .expect("purchase failed")
            .aircraft
            .id;
        let receipt = engine
            .activate_mission(ALICE, TEMPLATE_CARGO, T0)
            .await
            .0
            .expect("activation failed");
        engine
            .resolve_due_missions(ALICE, receipt.planned_finish)
            .await
            .0
            .expect("resolution failed");

        assert_eq!(aircraft_status(&engine, unit).await, AircraftStatus::Idle);
        assert!(mission(&engine, receipt.mission).await.status.is_terminal());
        assert_reconciled(&engine, ALICE).await;
    });
}
