//! Test fixtures: a seeded catalog, an in-memory engine, and a durable store
//! constructor for storage-backed tests.

use crate::{Adb, Engine, Memory, State};
use anyhow::Context;
use commonware_runtime::{buffer::PoolRef, Clock, Metrics, Spawner, Storage};
use commonware_storage::{adb, translator::EightCap};
use commonware_utils::{NZUsize, NZU64};
use skyport_types::{
    engine::{Key, Value},
    game::{
        Account, AircraftRole, AircraftType, LedgerCategory, LedgerEntry, MissionTemplate,
    },
    AccountId, Timestamp,
};

const TEST_BUFFER_POOL_PAGES: usize = 1024;
const TEST_BUFFER_POOL_PAGE_SIZE: usize = 1024;
const TEST_MMR_ITEMS_PER_BLOB: u64 = 1024;
const TEST_MMR_WRITE_BUFFER: usize = 1024;
const TEST_LOG_ITEMS_PER_SECTION: u64 = 1024;
const TEST_LOG_WRITE_BUFFER: usize = 1024;
const TEST_LOCATIONS_ITEMS_PER_BLOB: u64 = 1024;

/// Fixed outcome entropy for deterministic tests.
pub const TEST_ENTROPY: [u8; 32] = [42u8; 32];

/// Base timestamp for test clocks.
pub const T0: Timestamp = 1_700_000_000;

/// Catalog ids written by [`seed_catalog`].
pub const TYPE_TRANSPORT: u64 = 0;
pub const TYPE_TRANSPORT_HEAVY: u64 = 1;
pub const TYPE_ATTACK: u64 = 2;
pub const TYPE_ATTACK_CHEAP: u64 = 3;
pub const TYPE_RECON: u64 = 4;

pub const TEMPLATE_CARGO: u64 = 0;
pub const TEMPLATE_STRIKE: u64 = 1;
pub const TEMPLATE_SURVEY: u64 = 2;
pub const TEMPLATE_RETIRED: u64 = 3;

/// Write a small aircraft and mission catalog directly into the store.
pub async fn seed_catalog<S: State>(state: &mut S) {
    let types = [
        (
            TYPE_TRANSPORT,
            AircraftType {
                model: "C-130 Hercules".to_string(),
                role: AircraftRole::MilitaryTransport,
                base_price: 3_000,
                description: "Four-engine tactical airlifter.".to_string(),
                is_active: true,
            },
        ),
        (
            TYPE_TRANSPORT_HEAVY,
            AircraftType {
                model: "A400M Atlas".to_string(),
                role: AircraftRole::MilitaryTransport,
                base_price: 4_500,
                description: "Heavy turboprop transport.".to_string(),
                is_active: true,
            },
        ),
        (
            TYPE_ATTACK,
            AircraftType {
                model: "F-16 Fighting Falcon".to_string(),
                role: AircraftRole::MilitaryAttack,
                base_price: 5_000,
                description: "Multirole fighter.".to_string(),
                is_active: true,
            },
        ),
        (
            TYPE_ATTACK_CHEAP,
            AircraftType {
                model: "A-10 Thunderbolt II".to_string(),
                role: AircraftRole::MilitaryAttack,
                base_price: 3_500,
                description: "Close air support platform.".to_string(),
                is_active: true,
            },
        ),
        (
            TYPE_RECON,
            AircraftType {
                model: "RQ-4 Global Hawk".to_string(),
                role: AircraftRole::MilitaryRecon,
                base_price: 6_000,
                description: "High-altitude surveillance drone.".to_string(),
                is_active: true,
            },
        ),
    ];
    for (id, catalog) in types {
        state
            .insert(Key::AircraftType(id), Value::AircraftType(catalog))
            .await;
    }

    let templates = [
        (
            TEMPLATE_CARGO,
            MissionTemplate {
                name: "Cargo Run".to_string(),
                required_role: AircraftRole::MilitaryTransport,
                cost: 500,
                reward: 900,
                duration_seconds: 1_800,
                xp_reward: 50,
                description: "Haul supplies to a forward base.".to_string(),
                level_required: 1,
                is_active: true,
            },
        ),
        (
            TEMPLATE_STRIKE,
            MissionTemplate {
                name: "Strike Package".to_string(),
                required_role: AircraftRole::MilitaryAttack,
                cost: 1_200,
                reward: 2_000,
                duration_seconds: 3_600,
                xp_reward: 150,
                description: "Precision strike on a designated target.".to_string(),
                level_required: 2,
                is_active: true,
            },
        ),
        (
            TEMPLATE_SURVEY,
            MissionTemplate {
                name: "High Altitude Survey".to_string(),
                required_role: AircraftRole::MilitaryRecon,
                cost: 800,
                reward: 1_500,
                duration_seconds: 7_200,
                xp_reward: 120,
                description: "Wide-area imaging pass.".to_string(),
                level_required: 1,
                is_active: true,
            },
        ),
        (
            TEMPLATE_RETIRED,
            MissionTemplate {
                name: "Retired Exercise".to_string(),
                required_role: AircraftRole::MilitaryTransport,
                cost: 100,
                reward: 200,
                duration_seconds: 600,
                xp_reward: 10,
                description: "No longer offered.".to_string(),
                level_required: 1,
                is_active: false,
            },
        ),
    ];
    for (id, template) in templates {
        state
            .insert(Key::Template(id), Value::Template(template))
            .await;
    }
}

/// In-memory engine with the catalog seeded and fixed entropy.
pub async fn seeded_engine() -> Engine<Memory> {
    let mut state = Memory::default();
    seed_catalog(&mut state).await;
    Engine::new(state, TEST_ENTROPY)
}

/// Force an account's balance to `target`, recording the delta as a ledger
/// adjustment so reconciliation still holds.
pub async fn force_balance<S: State>(state: &mut S, account: AccountId, target: u64) {
    let mut record = match state.get(&Key::Account(account)).await {
        Some(Value::Account(record)) => record,
        _ => Account::open("fixture".to_string(), T0),
    };
    let delta = target as i64 - record.balance as i64;
    let entry = LedgerEntry {
        account,
        seq: record.ledger_entries,
        amount: delta,
        category: LedgerCategory::InitialGrant,
        description: "test adjustment".to_string(),
        aircraft: None,
        mission: None,
        created_at: T0,
    };
    state
        .insert(Key::Ledger(account, entry.seq), Value::Ledger(entry))
        .await;
    record.ledger_entries += 1;
    record.balance = target;
    state
        .insert(Key::Account(account), Value::Account(record))
        .await;
}

/// Assert the cached balance matches the ledger sum.
pub async fn assert_reconciled<S: State>(engine: &Engine<S>, account: AccountId) {
    let balance = engine.balance(account).await.expect("missing account");
    let sum = engine.ledger_sum(account).await.expect("missing account");
    assert_eq!(balance as i64, sum, "balance diverged from ledger");
}

/// Creates a durable store for storage-backed tests.
pub async fn create_store_result<E: Spawner + Metrics + Storage + Clock>(
    context: &E,
) -> anyhow::Result<Adb<E, EightCap>> {
    let buffer_pool = PoolRef::new(
        NZUsize!(TEST_BUFFER_POOL_PAGES),
        NZUsize!(TEST_BUFFER_POOL_PAGE_SIZE),
    );

    let state = Adb::init(
        context.with_label("state"),
        adb::any::variable::Config {
            mmr_journal_partition: String::from("state-mmr-journal"),
            mmr_metadata_partition: String::from("state-mmr-metadata"),
            mmr_items_per_blob: NZU64!(TEST_MMR_ITEMS_PER_BLOB),
            mmr_write_buffer: NZUsize!(TEST_MMR_WRITE_BUFFER),
            log_journal_partition: String::from("state-log-journal"),
            log_items_per_section: NZU64!(TEST_LOG_ITEMS_PER_SECTION),
            log_write_buffer: NZUsize!(TEST_LOG_WRITE_BUFFER),
            log_compression: None,
            log_codec_config: (),
            locations_journal_partition: String::from("state-locations-journal"),
            locations_items_per_blob: NZU64!(TEST_LOCATIONS_ITEMS_PER_BLOB),
            translator: EightCap,
            thread_pool: None,
            buffer_pool,
        },
    )
    .await
    .context("failed to initialize state store")?;

    Ok(state)
}

pub async fn create_store<E: Spawner + Metrics + Storage + Clock>(context: &E) -> Adb<E, EightCap> {
    create_store_result(context)
        .await
        .expect("failed to initialize test store")
}
