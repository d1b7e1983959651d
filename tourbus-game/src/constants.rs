//! Centralized bounds and tuning constants for Tourbus session logic.
//!
//! Field limits, tutorial thresholds and the persisted record format live here
//! so that balance changes go through code review instead of asset edits.

// Field bounds -------------------------------------------------------------
pub const MONEY_RANGE: (i32, i32) = (0, 9_999);
pub const HEALTH_RANGE: (i32, i32) = (0, 100);
pub const PLAYER_SKILL_RANGE: (i32, i32) = (0, 100);
pub const DIFFICULTY_RANGE: (i32, i32) = (0, 100);
pub const MOMENTUM_RANGE: (i32, i32) = (0, 100);
pub const PLOT_RANGE: (i32, i32) = (0, 100);
pub const SPEED_CRANK_RANGE: (i32, i32) = (0, 100);
pub const KNOB_RANGE: (i32, i32) = (0, 100);
pub const MONTHLY_LISTENERS_RANGE: (i64, i64) = (0, 999_999_999);
pub const BUZZ_RANGE: (f64, f64) = (0.0, 100.0);
pub const COUNTER_RANGE: (i64, i64) = (0, u32::MAX as i64);

// Plot tags ----------------------------------------------------------------
pub const DEFAULT_PLOT_TAG: &str = "none";
pub const KNOWN_PLOT_TAGS: &[&str] = &[
    DEFAULT_PLOT_TAG,
    "intro",
    "rising",
    "conflict",
    "breakup",
    "reunion",
    "sellout",
    "indie",
    "climax",
    "resolution",
];

// Tutorial -----------------------------------------------------------------
/// Steps spent in `InitialDriving` before the countdown starts.
pub const INITIAL_DRIVING_STEPS: u32 = 4;

// Listener economy ---------------------------------------------------------
pub const LISTENER_BUZZ_MULTIPLIER: f64 = 10.0;

// Region sequencing --------------------------------------------------------
pub const MIN_SEQUENCES_PER_VISIT: u32 = 2;
pub const SEQUENCE_SPREAD: u32 = 2;

// Event scheduling ---------------------------------------------------------
pub const PROGRESS_MIN: f64 = 0.0;
pub const PROGRESS_MAX: f64 = 100.0;

// Persistence --------------------------------------------------------------
pub const SAVE_SLOT_KEY: &str = "tourbus.save";
pub const SAVE_FORMAT_VERSION: &str = "1.0.0";
pub const SAVE_FIELD_STEP: &str = "step";
pub const SAVE_FIELD_TIME: &str = "saveTime";
pub const SAVE_FIELD_VERSION: &str = "version";

/// Fields that only `change_region`, `tick` or the tutorial machine may write.
pub(crate) const PROTECTED_FIELDS: &[&str] = &[
    "tutorialPhase",
    "tutorialStep",
    "currentRegion",
    "regionHistory",
    "sequencesInCurrentRegion",
    "stepCounter",
    "sessionStartTimestamp",
    "lastSaveTimestamp",
];
