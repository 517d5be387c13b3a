//! Sea Typer - a falling-word typing arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (word lifecycle, matching, scoring, weather)
//! - `session`: Owns one round plus its result sink
//! - `stage`: Word-list providers and per-stage configuration
//! - `results` / `progress`: Round result payload and sinks
//! - `settings`: Engine tunables

pub mod error;
pub mod progress;
pub mod results;
pub mod session;
pub mod settings;
pub mod sim;
pub mod stage;

pub use error::{LoadError, PersistenceError, SettingsError};
pub use progress::ProgressBook;
pub use results::{ResultSink, RoundResult};
pub use session::Session;
pub use settings::Settings;
pub use stage::{BuiltinWords, JsonWordSource, StageConfig, StageData, WordSource};

/// Game configuration constants
pub mod consts {
    /// Simulation tick cadence (20 Hz)
    pub const SIM_TICK_MS: u64 = 50;

    /// Delay between a terminal transition and removal from the store
    pub const RETIRE_GRACE_MS: u64 = 500;

    /// Misses that end the round
    pub const MISS_LIMIT: u32 = 3;

    /// Fraction of the lifetime after which a word has reached the sea
    pub const FALL_MISS_THRESHOLD: f64 = 0.8;

    /// Words per round
    pub const TARGET_WORD_COUNT: u32 = 20;

    /// Base fall duration and per-stage increment
    pub const LIFETIME_BASE_MS: u64 = 8000;
    pub const LIFETIME_STEP_MS: u64 = 200;

    /// Points per character of a completed word
    pub const POINTS_PER_CHAR: u64 = 10;
    /// Remaining lifetime per bonus point
    pub const BONUS_DIVISOR_MS: u64 = 100;

    /// Highest stage in the built-in catalog
    pub const MAX_STAGE: u32 = 20;
}

/// Fraction of the fall completed, in [0, 1]
#[inline]
pub fn fall_progress(elapsed_ms: u64, lifetime_ms: u64) -> f64 {
    if lifetime_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f64 / lifetime_ms as f64).min(1.0)
}

/// Points for completing a word of `len` characters after `elapsed_ms` of its lifetime
#[inline]
pub fn word_points(len: usize, lifetime_ms: u64, elapsed_ms: u64) -> u64 {
    let remaining = lifetime_ms.saturating_sub(elapsed_ms);
    len as u64 * consts::POINTS_PER_CHAR + remaining / consts::BONUS_DIVISOR_MS
}

/// Accuracy percentage; a round with no typed characters is perfect
#[inline]
pub fn accuracy_percent(correct_chars: u64, total_chars: u64) -> f64 {
    if total_chars == 0 {
        100.0
    } else {
        correct_chars as f64 / total_chars as f64 * 100.0
    }
}
