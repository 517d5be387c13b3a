//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Logical time only (milliseconds, advanced by the host)
//! - Seeded RNG only
//! - Stable iteration order (by word ID, which follows spawn order)
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod clock;
pub mod events;
pub mod matcher;
pub mod round;
pub mod spawner;
pub mod weather;
pub mod word;

pub use autoplay::{AutoAction, Autopilot};
pub use clock::{Scheduler, TimerId};
pub use events::GameEvent;
pub use matcher::{Feedback, MatchResult, normalize_input};
pub use round::{EndCause, Round, RoundPhase, RoundState, Transition};
pub use weather::{
    AmbientEffect, Hazard, WEATHER_CATALOG, WeatherEngine, WeatherEvent, WeatherKind,
    WeatherMode, roulette_index,
};
pub use word::{WordEntity, WordId, WordState, WordStore};
