/// Maximum length for account and aircraft nicknames.
pub const MAX_NAME_LENGTH: usize = 32;

/// Maximum length for catalog descriptions and ledger entry descriptions.
pub const MAX_DESCRIPTION_LENGTH: usize = 256;

/// Credits granted when an account is opened, recorded as the account's
/// first ledger entry so balance and ledger agree from the start.
pub const STARTING_BALANCE: u64 = 10_000;

/// Maximum operational aircraft per account (idle, committed or maintenance).
pub const FLEET_LIMIT: usize = 6;

/// Resale value of an aircraft, in basis points of its purchase price.
pub const RESALE_RATE_BPS: u64 = 7_000;

/// Basis point denominator.
pub const BPS: u64 = 10_000;

/// Lower bound of the randomized mission duration factor (0.8x).
pub const DURATION_FACTOR_MIN_BPS: u64 = 8_000;

/// Upper bound of the randomized mission duration factor (1.2x).
pub const DURATION_FACTOR_MAX_BPS: u64 = 12_000;

/// Failure reason recorded at activation when the drawn duration exceeds the
/// nominal duration. The sweep treats any non-empty reason as a failure.
pub const FAILURE_TIMEOUT: &str = "planned_failure_timeout";

/// Accumulated xp required per account level beyond the first.
pub const XP_PER_LEVEL: u64 = 500;

/// Upper bound on per-account index lists (owned aircraft, running missions,
/// due-mission batches). Generous: the fleet limit caps concurrent missions
/// far below this.
pub const MAX_INDEX_ENTRIES: usize = 4_096;
