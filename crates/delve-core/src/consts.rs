//! Engine-wide constants

/// Shortest accepted location name, in characters.
pub const MIN_NAME_LEN: usize = 2;

/// Longest accepted location name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Upper bound on treasure chests placed per interior batch.
pub const MAX_TREASURE_CHESTS: usize = 3;

/// Percent chance that a non-boss dead-end tower floor holds treasure.
pub const TOWER_TREASURE_CHANCE: u32 = 30;

/// Lock difficulty of a chest sitting at the entry.
pub const LOCK_DIFFICULTY_BASE: u32 = 5;

/// Lock difficulty added per point of depth score.
pub const LOCK_DIFFICULTY_STEP: u32 = 2;

/// Hardest lock the placement pass will produce.
pub const LOCK_DIFFICULTY_CAP: u32 = 30;

/// Perception threshold of a secret at the entry.
pub const SECRET_THRESHOLD_BASE: u32 = 10;

/// Perception threshold added per point of depth score.
pub const SECRET_THRESHOLD_STEP: u32 = 1;
