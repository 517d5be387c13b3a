//! Game session
//!
//! Owns one round and the sink its result goes to. This is the host's single
//! entry point: feed it input and elapsed time, drain events to render.

use crate::error::LoadError;
use crate::results::{ResultSink, RoundResult};
use crate::settings::Settings;
use crate::sim::events::GameEvent;
use crate::sim::matcher::MatchResult;
use crate::sim::round::Round;
use crate::sim::word::WordId;
use crate::stage::WordSource;

pub struct Session {
    round: Round,
    sink: Box<dyn ResultSink>,
    delivered: bool,
}

impl Session {
    /// Load the stage's words and start a round. Nothing starts if loading fails.
    pub fn start(
        source: &dyn WordSource,
        stage: u32,
        settings: Settings,
        seed: u64,
        sink: Box<dyn ResultSink>,
    ) -> Result<Self, LoadError> {
        let data = source.load(stage)?;
        if data.words.is_empty() {
            return Err(LoadError::EmptyWordList(stage));
        }
        log::info!("Loaded {} words for stage {}", data.words.len(), stage);
        Ok(Self {
            round: Round::new(data.config, data.words, settings, seed),
            sink,
            delivered: false,
        })
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    /// Result of the finished round
    pub fn result(&self) -> Option<&RoundResult> {
        self.round.result()
    }

    pub fn is_finished(&self) -> bool {
        self.round.is_ended()
    }

    /// Input buffer changed
    pub fn type_text(&mut self, buffer: &str) -> MatchResult {
        let result = self.round.handle_input(buffer);
        self.flush();
        result
    }

    /// Enter pressed
    pub fn submit(&mut self, buffer: &str) -> MatchResult {
        let result = self.round.handle_exact_submit(buffer);
        self.flush();
        result
    }

    /// Word tapped or clicked
    pub fn select_word(&mut self, id: WordId) -> MatchResult {
        let result = self.round.select_word(id);
        self.flush();
        result
    }

    pub fn pause(&mut self) -> bool {
        self.round.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.round.resume()
    }

    /// Escape key
    pub fn toggle_pause(&mut self) -> bool {
        self.round.toggle_pause()
    }

    /// Window or tab lost focus; a running round pauses
    pub fn focus_lost(&mut self) -> bool {
        self.round.pause()
    }

    /// Let `dt_ms` of wall time pass
    pub fn advance(&mut self, dt_ms: u64) {
        self.round.advance(dt_ms);
        self.flush();
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.round.drain_events()
    }

    /// Hand the result to the sink once; a failing sink only logs
    fn flush(&mut self) {
        if self.delivered {
            return;
        }
        let Some(result) = self.round.result() else {
            return;
        };
        self.delivered = true;
        if let Err(err) = self.sink.submit(result) {
            log::warn!("Failed to store result for stage {}: {}", result.stage, err);
        }
    }
}
