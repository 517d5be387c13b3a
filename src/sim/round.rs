//! Round controller
//!
//! Owns the word store, counters, timers and the weather engine, and runs the
//! `Running -> Paused -> Ended` state machine. Every timer callback checks the
//! round is still running before touching anything, so a stray callback after
//! the round ended is a no-op.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::Scheduler;
use super::events::GameEvent;
use super::spawner;
use super::weather::WeatherEngine;
use super::word::{WordEntity, WordId, WordState, WordStore};
use crate::results::RoundResult;
use crate::settings::Settings;
use crate::stage::StageConfig;
use crate::{accuracy_percent, word_points};

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCause {
    /// Every word was spawned and resolved
    Completed,
    /// Miss limit reached
    GameOver,
}

/// Round state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Running,
    Paused,
    Ended(EndCause),
}

/// Aggregate counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub score: u64,
    pub total_spawned: u32,
    pub completed: u32,
    pub missed: u32,
    /// Live words swept away when the round ended
    pub abandoned: u32,
    pub correct_chars: u64,
    pub total_chars: u64,
    pub phase: RoundPhase,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            score: 0,
            total_spawned: 0,
            completed: 0,
            missed: 0,
            abandoned: 0,
            correct_chars: 0,
            total_chars: 0,
            phase: RoundPhase::Running,
        }
    }

    /// Typing accuracy in percent
    pub fn accuracy(&self) -> f64 {
        accuracy_percent(self.correct_chars, self.total_chars)
    }

    /// Words still to be spawned
    pub fn remaining(&self, target_words: u32) -> u32 {
        target_words.saturating_sub(self.total_spawned)
    }
}

/// Outcome of a completion or miss request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Word already terminal or retired, or the round is not running
    Ignored,
}

/// Timers owned by a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTimer {
    /// Fast simulation tick: fall scan, then termination check
    SimTick,
    /// Spawn cadence
    Spawn,
    /// Lifetime budget of a word ran out
    Expire(WordId),
    /// Grace delay after a terminal transition
    Retire(WordId),
}

/// Seed offset for the weather RNG
const WEATHER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// One round of play
#[derive(Debug)]
pub struct Round {
    pub(super) stage: StageConfig,
    pub(super) settings: Settings,
    pool: Vec<String>,
    rng: Pcg32,
    pub(super) timers: Scheduler<RoundTimer>,
    pub(super) store: WordStore,
    pub(super) state: RoundState,
    weather: WeatherEngine,
    pub(super) events: Vec<GameEvent>,
    result: Option<RoundResult>,
}

impl Round {
    /// Start a round from loaded word data; the round is Running immediately
    pub fn new(mut stage: StageConfig, pool: Vec<String>, mut settings: Settings, seed: u64) -> Self {
        stage.spawn_interval_ms = stage.spawn_interval_ms.max(1);
        settings.tick_ms = settings.tick_ms.max(1);
        let weather = WeatherEngine::new(settings.weather.clone(), seed ^ WEATHER_SEED_SALT);

        let mut round = Self {
            stage,
            settings,
            pool,
            rng: Pcg32::seed_from_u64(seed),
            timers: Scheduler::new(),
            store: WordStore::new(),
            state: RoundState::new(),
            weather,
            events: Vec::new(),
            result: None,
        };
        round.start();
        round
    }

    fn start(&mut self) {
        log::info!(
            "Stage {} started: {} words, one every {} ms, at most {} at once",
            self.stage.stage,
            self.stage.target_words,
            self.stage.spawn_interval_ms,
            self.stage.max_concurrent
        );
        self.events.push(GameEvent::PhaseChanged {
            phase: RoundPhase::Running,
        });
        if self.settings.weather.enabled {
            self.weather.start(self.timers.now());
            self.collect_weather_events();
        }

        self.spawn_word();
        self.timers
            .schedule_in(self.stage.spawn_interval_ms, RoundTimer::Spawn);
        self.timers
            .schedule_in(self.settings.tick_ms, RoundTimer::SimTick);
    }

    // === Queries ===

    pub fn stage(&self) -> &StageConfig {
        &self.stage
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == RoundPhase::Running
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state.phase, RoundPhase::Ended(_))
    }

    /// Round time (ms); frozen while paused
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// Unretired words in spawn order
    pub fn words(&self) -> impl Iterator<Item = &WordEntity> {
        self.store.iter()
    }

    pub fn word(&self, id: WordId) -> Option<&WordEntity> {
        self.store.get(id)
    }

    /// Falling or Typing words
    pub fn live_count(&self) -> usize {
        self.store.live_count()
    }

    pub fn active_word(&self) -> Option<WordId> {
        self.store.active()
    }

    pub fn weather(&self) -> &WeatherEngine {
        &self.weather
    }

    /// Summary of an ended round
    pub fn result(&self) -> Option<&RoundResult> {
        self.result.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Time ===

    /// Run the round clock forward by `dt_ms`, firing due timers in order
    pub fn advance(&mut self, dt_ms: u64) {
        if !self.is_running() {
            return;
        }
        let target = self.timers.now().saturating_add(dt_ms);
        while let Some((_, timer)) = self.timers.pop_due(target) {
            self.fire(timer);
            if !self.is_running() {
                return;
            }
        }
        self.timers.advance_to(target);
        self.weather.advance_to(target);
        self.collect_weather_events();
    }

    fn fire(&mut self, timer: RoundTimer) {
        if !self.is_running() {
            log::debug!("Dropping {:?}: round not running", timer);
            return;
        }
        match timer {
            RoundTimer::SimTick => self.sim_tick(),
            RoundTimer::Spawn => {
                self.spawn_word();
                if self.state.total_spawned < self.stage.target_words {
                    self.timers
                        .schedule_in(self.stage.spawn_interval_ms, RoundTimer::Spawn);
                }
            }
            RoundTimer::Expire(id) => {
                if self.miss_word(id) == Transition::Ignored {
                    log::debug!("Lifetime expiry of {} ignored: already resolved", id);
                }
            }
            RoundTimer::Retire(id) => self.retire(id),
        }
    }

    /// Fall scan first, then the termination check
    fn sim_tick(&mut self) {
        let now = self.now();
        for id in self.store.overdue(now, self.settings.fall_threshold) {
            self.miss_word(id);
            if !self.is_running() {
                return;
            }
        }
        if self.state.total_spawned >= self.stage.target_words && self.store.is_empty() {
            self.end(EndCause::Completed);
            return;
        }
        self.timers
            .schedule_in(self.settings.tick_ms, RoundTimer::SimTick);
    }

    fn spawn_word(&mut self) {
        let spawned = spawner::try_spawn(
            &mut self.store,
            &mut self.state,
            &self.stage,
            &self.pool,
            &mut self.rng,
            &mut self.timers,
        );
        if let Some(id) = spawned {
            self.announce_spawn(id);
        }
    }

    pub(super) fn announce_spawn(&mut self, id: WordId) {
        if let Some(word) = self.store.get(id) {
            self.events.push(GameEvent::WordSpawned {
                id,
                text: word.text.clone(),
                lifetime_ms: word.lifetime_ms,
            });
        }
    }

    // === Transitions ===

    /// Score a live word as typed. Returns the points awarded.
    pub(super) fn complete(&mut self, id: WordId) -> Option<u64> {
        if !self.is_running() {
            return None;
        }
        let now = self.now();
        let word = self.store.get(id).filter(|w| w.state.is_live())?;
        let len = word.len() as u64;
        let points = word_points(word.len(), word.lifetime_ms, word.elapsed(now));

        self.store.resolve(id, WordState::Completed, now);
        self.state.completed += 1;
        self.state.correct_chars += len;
        self.state.total_chars += len;
        self.state.score += points;

        self.events.push(GameEvent::WordCompleted { id, points });
        self.events.push(GameEvent::ScoreChanged {
            delta: points,
            total: self.state.score,
        });
        self.timers
            .schedule_in(self.settings.grace_ms, RoundTimer::Retire(id));
        Some(points)
    }

    /// Mark a word as typed in full
    pub fn complete_word(&mut self, id: WordId) -> Transition {
        match self.complete(id) {
            Some(_) => Transition::Applied,
            None => {
                log::debug!("Completion of {} ignored", id);
                Transition::Ignored
            }
        }
    }

    /// Mark a word as fallen into the sea. Reaching the miss limit ends the
    /// round inside this call.
    pub fn miss_word(&mut self, id: WordId) -> Transition {
        if !self.is_running() {
            return Transition::Ignored;
        }
        let now = self.now();
        let Some(len) = self
            .store
            .get(id)
            .filter(|w| w.state.is_live())
            .map(|w| w.len() as u64)
        else {
            return Transition::Ignored;
        };

        self.store.resolve(id, WordState::Missed, now);
        self.state.missed += 1;
        self.state.total_chars += len;
        self.events.push(GameEvent::WordMissed {
            id,
            missed: self.state.missed,
        });
        log::debug!(
            "Word {} missed ({}/{})",
            id,
            self.state.missed,
            self.settings.miss_limit
        );

        if self.state.missed >= self.settings.miss_limit {
            self.end(EndCause::GameOver);
        } else {
            self.timers
                .schedule_in(self.settings.grace_ms, RoundTimer::Retire(id));
        }
        Transition::Applied
    }

    fn retire(&mut self, id: WordId) {
        if self.store.retire(id) {
            self.events.push(GameEvent::WordRetired { id });
        }
    }

    // === Phase changes ===

    /// Freeze the round; returns false unless it was running
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state.phase = RoundPhase::Paused;
        self.weather.stop();
        self.collect_weather_events();
        self.events.push(GameEvent::PhaseChanged {
            phase: RoundPhase::Paused,
        });
        log::info!("Round paused at {} ms", self.now());
        true
    }

    /// Continue a paused round; weather restarts with a fresh roll
    pub fn resume(&mut self) -> bool {
        if self.state.phase != RoundPhase::Paused {
            return false;
        }
        self.state.phase = RoundPhase::Running;
        if self.settings.weather.enabled {
            self.weather.start(self.now());
            self.collect_weather_events();
        }
        self.events.push(GameEvent::PhaseChanged {
            phase: RoundPhase::Running,
        });
        log::info!("Round resumed at {} ms", self.now());
        true
    }

    /// Pause if running, resume if paused; false once ended
    pub fn toggle_pause(&mut self) -> bool {
        match self.state.phase {
            RoundPhase::Running => self.pause(),
            RoundPhase::Paused => self.resume(),
            RoundPhase::Ended(_) => false,
        }
    }

    fn end(&mut self, cause: EndCause) {
        if self.is_ended() {
            return;
        }
        self.state.phase = RoundPhase::Ended(cause);
        self.timers.clear();
        self.events.push(GameEvent::PhaseChanged {
            phase: RoundPhase::Ended(cause),
        });

        let abandoned = self.store.live_count() as u32;
        self.state.abandoned += abandoned;
        for id in self.store.retire_all() {
            self.events.push(GameEvent::WordRetired { id });
        }
        self.weather.stop();
        self.collect_weather_events();

        let result = RoundResult::from_state(self.stage.stage, &self.state, cause);
        log::info!(
            "Stage {} ended ({:?}): score {}, accuracy {:.1}%, {} completed, {} missed",
            result.stage,
            cause,
            result.score,
            result.accuracy,
            result.completed,
            result.missed
        );
        self.events.push(GameEvent::RoundEnded {
            result: result.clone(),
        });
        self.result = Some(result);
    }

    fn collect_weather_events(&mut self) {
        self.events.extend(
            self.weather
                .drain_events()
                .into_iter()
                .map(GameEvent::Weather),
        );
    }

    /// Put a specific word in play, bypassing the spawner's random pick
    #[cfg(test)]
    pub(crate) fn spawn_exact(&mut self, text: &str) -> WordId {
        let id = spawner::spawn_text(
            &mut self.store,
            &mut self.state,
            &self.stage,
            &mut self.timers,
            text.to_string(),
        );
        self.announce_spawn(id);
        id
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sim::weather::WeatherEvent;

    /// Stage that never spawns on its own; tests place words with `spawn_exact`
    pub(crate) fn manual_stage() -> StageConfig {
        StageConfig {
            stage: 0,
            spawn_interval_ms: 1000,
            max_concurrent: 0,
            lifetime_base_ms: 8000,
            lifetime_step_ms: 200,
            target_words: 20,
        }
    }

    pub(crate) fn quiet_settings() -> Settings {
        let mut settings = Settings::default();
        settings.weather.enabled = false;
        settings
    }

    pub(crate) fn manual_round() -> Round {
        Round::new(manual_stage(), vec!["unused".into()], quiet_settings(), 42)
    }

    pub(crate) fn assert_counts(round: &Round) {
        let s = round.state();
        assert_eq!(
            s.completed + s.missed + round.live_count() as u32 + s.abandoned,
            s.total_spawned,
            "counter invariant broken: {s:?}"
        );
        assert!(round.words().filter(|w| w.state == WordState::Typing).count() <= 1);
    }

    #[test]
    fn test_starts_running_with_first_word() {
        let round = Round::new(StageConfig::for_stage(1), vec!["tide".into()], quiet_settings(), 1);
        assert_eq!(round.phase(), RoundPhase::Running);
        assert_eq!(round.state().total_spawned, 1);
        assert_eq!(round.words().next().unwrap().text, "tide");
        assert_eq!(round.state().remaining(20), 19);
        assert_counts(&round);
    }

    #[test]
    fn test_score_with_speed_bonus() {
        let mut round = manual_round();
        let id = round.spawn_exact("ocean");
        assert_eq!(round.word(id).unwrap().lifetime_ms, 8000);

        round.advance(5000);
        assert_eq!(round.complete(id), Some(80));
        assert_eq!(round.state().score, 80);
        assert_eq!(round.state().correct_chars, 5);
        assert_eq!(round.state().total_chars, 5);
        assert_eq!(round.word(id).unwrap().state, WordState::Completed);
        assert_counts(&round);

        // Retired after the grace delay
        round.advance(499);
        assert!(round.word(id).is_some());
        round.advance(1);
        assert!(round.word(id).is_none());
    }

    #[test]
    fn test_miss_is_idempotent() {
        let mut round = manual_round();
        let id = round.spawn_exact("reef");
        assert_eq!(round.miss_word(id), Transition::Applied);
        assert_eq!(round.miss_word(id), Transition::Ignored);
        assert_eq!(round.complete_word(id), Transition::Ignored);
        assert_eq!(round.state().missed, 1);
        assert_eq!(round.state().total_chars, 4);
        assert_eq!(round.state().correct_chars, 0);
        assert_counts(&round);
    }

    #[test]
    fn test_game_over_on_third_miss() {
        let mut round = manual_round();
        let ids: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|w| round.spawn_exact(w))
            .collect();

        round.miss_word(ids[0]);
        round.miss_word(ids[1]);
        assert_eq!(round.phase(), RoundPhase::Running);
        assert!(round.result().is_none());

        assert_eq!(round.miss_word(ids[2]), Transition::Applied);
        assert_eq!(round.phase(), RoundPhase::Ended(EndCause::GameOver));
        assert_eq!(round.state().missed, 3);
        // The fourth word is swept, not missed
        assert_eq!(round.miss_word(ids[3]), Transition::Ignored);
        assert_eq!(round.state().missed, 3);
        assert_eq!(round.state().abandoned, 1);
        assert_eq!(round.words().count(), 0);
        assert_counts(&round);

        let result = round.result().unwrap();
        assert_eq!(result.outcome, EndCause::GameOver);
        assert_eq!(result.missed, 3);
    }

    #[test]
    fn test_scan_and_expiry_count_once() {
        let mut round = manual_round();
        let id = round.spawn_exact("shell");
        // Scan trips at 80% of 8000 ms
        round.advance(6399);
        assert_eq!(round.word(id).unwrap().state, WordState::Falling);
        round.advance(50);
        assert_eq!(round.word(id).unwrap().state, WordState::Missed);
        assert_eq!(round.word(id).unwrap().resolved_at, Some(6400));
        round.advance(10_000);
        assert_eq!(round.state().missed, 1);
        assert!(round.word(id).is_none());
        assert_counts(&round);
    }

    #[test]
    fn test_expiry_wins_when_scan_is_late() {
        let mut settings = quiet_settings();
        settings.fall_threshold = 1.0;
        let mut round = Round::new(manual_stage(), vec!["x".into()], settings, 1);
        let id = round.spawn_exact("kelp");
        round.advance(8000);
        // Expiry timer and scan both fire at 8000; only one counts
        assert_eq!(round.state().missed, 1);
        assert_eq!(round.word(id).unwrap().state, WordState::Missed);
        round.advance(1000);
        assert_eq!(round.state().missed, 1);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut round = manual_round();
        let id = round.spawn_exact("crab");
        round.advance(1000);
        round.drain_events();

        assert!(round.pause());
        assert!(!round.pause());
        round.advance(60_000);
        assert_eq!(round.now(), 1000);
        assert_eq!(round.word(id).unwrap().state, WordState::Falling);
        assert_eq!(
            round.drain_events(),
            vec![GameEvent::PhaseChanged {
                phase: RoundPhase::Paused
            }]
        );
        assert_eq!(round.complete_word(id), Transition::Ignored);

        assert!(round.resume());
        // 5400 ms of fall time remained before the scan trips
        round.advance(5399);
        assert_eq!(round.word(id).unwrap().state, WordState::Falling);
        round.advance(50);
        assert_eq!(round.word(id).unwrap().state, WordState::Missed);
    }

    #[test]
    fn test_pause_stops_weather_and_resume_rolls_fresh() {
        let mut round = Round::new(manual_stage(), vec!["x".into()], Settings::default(), 9);
        assert!(round.weather().is_running());
        let restarts = round.weather().restart_count();

        round.pause();
        assert!(!round.weather().is_running());
        assert_eq!(round.weather().current(), None);
        assert!(round
            .drain_events()
            .contains(&GameEvent::Weather(WeatherEvent::Cleared)));

        round.resume();
        assert!(round.weather().is_running());
        assert_eq!(round.weather().restart_count(), restarts + 1);
        assert!(round.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::Weather(WeatherEvent::ModeChanged { from: None, .. })
        )));
    }

    #[test]
    fn test_toggle_pause() {
        let mut round = manual_round();
        assert!(round.toggle_pause());
        assert_eq!(round.phase(), RoundPhase::Paused);
        assert!(round.toggle_pause());
        assert_eq!(round.phase(), RoundPhase::Running);
    }

    #[test]
    fn test_ended_round_is_inert() {
        let mut round = manual_round();
        let ids: Vec<_> = (0..3).map(|_| round.spawn_exact("gull")).collect();
        for id in &ids {
            round.miss_word(*id);
        }
        assert!(round.is_ended());
        assert!(round.timers.is_empty());
        round.drain_events();

        round.advance(100_000);
        assert!(!round.resume());
        assert!(!round.pause());
        assert!(!round.toggle_pause());
        assert!(round.drain_events().is_empty());
        assert_eq!(round.now(), 0);

        // A stray callback after the end does nothing
        round.fire(RoundTimer::Expire(ids[0]));
        round.fire(RoundTimer::SimTick);
        assert!(round.timers.is_empty());
        assert!(round.drain_events().is_empty());
    }

    #[test]
    fn test_spawner_stops_at_target() {
        let stage = StageConfig {
            stage: 1,
            spawn_interval_ms: 100,
            max_concurrent: 50,
            lifetime_base_ms: 100_000,
            lifetime_step_ms: 0,
            target_words: 5,
        };
        let mut round = Round::new(stage, vec!["foam".into()], quiet_settings(), 3);
        round.advance(2000);
        assert_eq!(round.state().total_spawned, 5);
        assert_eq!(round.live_count(), 5);
        assert_eq!(round.state().remaining(5), 0);
    }

    #[test]
    fn test_zero_intervals_still_progress() {
        let stage = StageConfig {
            spawn_interval_ms: 0,
            target_words: 2,
            ..StageConfig::for_stage(1)
        };
        let mut settings = Settings::default();
        settings.tick_ms = 0;
        settings.weather.min_hold_ms = 0;
        settings.weather.max_hold_ms = 0;
        settings.weather.hazard_check_ms = 0;

        let mut round = Round::new(stage, vec!["surf".into()], settings, 4);
        assert_eq!(round.settings().tick_ms, 1);
        assert_eq!(round.stage().spawn_interval_ms, 1);

        round.advance(1000);
        assert_eq!(round.now(), 1000);
        assert_eq!(round.state().total_spawned, 2);
        assert!(round.weather().selection_count() > 1);
        assert_eq!(round.weather().next_roll_at(), Some(1001));

        // Words fall and the round still reaches its end
        round.advance(20_000);
        assert_eq!(round.phase(), RoundPhase::Ended(EndCause::Completed));
        assert_eq!(round.state().missed, 2);
        assert_counts(&round);
    }

    #[test]
    fn test_completes_after_last_word_retires() {
        let stage = StageConfig {
            target_words: 2,
            max_concurrent: 2,
            ..StageConfig::for_stage(1)
        };
        let mut round = Round::new(stage, vec!["sand".into()], quiet_settings(), 8);
        round.advance(3000);
        assert_eq!(round.state().total_spawned, 2);
        let ids: Vec<_> = round.words().map(|w| w.id).collect();
        for id in ids {
            assert_eq!(round.complete_word(id), Transition::Applied);
        }
        assert_eq!(round.phase(), RoundPhase::Running);

        // Retirement after 500 ms, detected by the next tick
        round.advance(600);
        assert_eq!(round.phase(), RoundPhase::Ended(EndCause::Completed));
        let result = round.result().unwrap();
        assert_eq!(result.completed, 2);
        assert_eq!(result.missed, 0);
        assert_eq!(result.accuracy, 100.0);
    }
}
