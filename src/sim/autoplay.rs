//! Demo autopilot
//!
//! Plays a round keystroke by keystroke: targets the word closest to the sea,
//! types its letters at a fixed cadence and now and then hits a wrong key that it
//! backspaces on the next keystroke.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::matcher::{Feedback, MatchResult};
use super::round::Round;
use super::word::WordId;

/// Character the autopilot "fat-fingers"
const TYPO_CHAR: char = '#';

/// What the host should feed back into the round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoAction {
    /// New contents of the input buffer
    Type(String),
    /// Press Enter with this buffer
    Submit(String),
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    keystroke_ms: u64,
    typo_chance: f64,
    since_key_ms: u64,
    buffer: String,
    target: Option<WordId>,
}

impl Autopilot {
    pub fn new(seed: u64, keystroke_ms: u64, typo_chance: f64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            keystroke_ms: keystroke_ms.max(1),
            typo_chance: typo_chance.clamp(0.0, 1.0),
            since_key_ms: 0,
            buffer: String::new(),
            target: None,
        }
    }

    /// Current input buffer
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn target(&self) -> Option<WordId> {
        self.target
    }

    /// Let `dt_ms` pass; returns at most one keystroke
    pub fn step(&mut self, round: &Round, dt_ms: u64) -> Option<AutoAction> {
        if !round.is_running() {
            return None;
        }
        self.since_key_ms = (self.since_key_ms + dt_ms).min(self.keystroke_ms);
        if self.since_key_ms < self.keystroke_ms {
            return None;
        }
        self.since_key_ms = 0;

        if self.buffer.ends_with(TYPO_CHAR) {
            self.buffer.pop();
            return Some(AutoAction::Type(self.buffer.clone()));
        }

        let target = self.retarget(round)?;
        let word = round.word(target)?.folded();
        let typed = self.buffer.chars().count();
        let Some(next) = word.chars().nth(typed) else {
            // Typed in full but an earlier word with the same prefix took the match
            let buffer = std::mem::take(&mut self.buffer);
            self.target = None;
            return Some(AutoAction::Submit(buffer));
        };

        if self.rng.random::<f64>() < self.typo_chance {
            self.buffer.push(TYPO_CHAR);
        } else {
            self.buffer.push(next);
        }
        Some(AutoAction::Type(self.buffer.clone()))
    }

    /// Feed back the round's response to the last action
    pub fn observe(&mut self, result: &MatchResult) {
        if result.clear_input {
            self.buffer.clear();
            self.target = None;
        }
        if let Feedback::Completed { id, .. } = result.feedback {
            if self.target == Some(id) {
                self.target = None;
            }
        }
    }

    /// Keep the current target while it is live and the buffer still fits it,
    /// otherwise pick the live word nearest the sea
    fn retarget(&mut self, round: &Round) -> Option<WordId> {
        let still_valid = self.target.and_then(|id| round.word(id)).is_some_and(|w| {
            w.state.is_live() && w.folded().starts_with(self.buffer.as_str())
        });
        if still_valid {
            return self.target;
        }

        let now = round.now();
        self.buffer.clear();
        self.target = round
            .words()
            .filter(|w| w.state.is_live())
            .max_by(|a, b| {
                a.fall_progress(now)
                    .total_cmp(&b.fall_progress(now))
                    .then(b.id.cmp(&a.id))
            })
            .map(|w| w.id);
        self.target
    }
}
