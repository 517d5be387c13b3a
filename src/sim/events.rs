//! Presentation notifications
//!
//! The simulation pushes these as state changes; a rendering layer drains them.

use serde::{Deserialize, Serialize};

use super::round::RoundPhase;
use super::weather::WeatherEvent;
use super::word::WordId;
use crate::results::RoundResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    WordSpawned {
        id: WordId,
        text: String,
        lifetime_ms: u64,
    },
    /// A word became (or stayed) the typing target
    WordMatched { id: WordId, prefix: String },
    /// The typing target lost its match
    WordReleased { id: WordId },
    WordCompleted { id: WordId, points: u64 },
    WordMissed { id: WordId, missed: u32 },
    WordRetired { id: WordId },
    ScoreChanged { delta: u64, total: u64 },
    /// Input matched nothing
    NoMatch { input: String },
    PhaseChanged { phase: RoundPhase },
    RoundEnded { result: RoundResult },
    Weather(WeatherEvent),
}
