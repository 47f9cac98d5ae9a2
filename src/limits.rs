//! Hard input limits. Anything beyond these is rejected with `EngineError::LimitExceeded`.

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_NOTES_LEN: usize = 4096;

/// Users, projects, tasks, assignments and time-off entries, each counted separately.
pub const MAX_ENTITIES_PER_COLLECTION: usize = 100_000;

pub const MAX_HOURS_PER_DAY: f64 = 24.0;
pub const MAX_WEEKLY_CAPACITY: u32 = 168;

/// Longest stored range and widest query window, in calendar days (about ten years).
pub const MAX_RANGE_DAYS: i64 = 3660;

pub const MIN_VALID_YEAR: i32 = 1970;
pub const MAX_VALID_YEAR: i32 = 2200;

pub const MAX_TREND_WEEKS: usize = 104;
