//! Ambient weather state machine
//!
//! Picks a mode by roulette selection over the catalog weights, holds it for a
//! randomized interval, then rolls again. Purely cosmetic: nothing here touches
//! scoring. Stopping clears every timer and effect; starting always rolls fresh.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::{Scheduler, TimerId};
use crate::settings::WeatherSettings;

/// Weather modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherKind {
    Clear,
    Cloudy,
    Rain,
    Storm,
    Fog,
    Wind,
    Snow,
}

/// Visual layers a mode switches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbientEffect {
    Sunlight,
    Clouds,
    Rain,
    Wind,
    Fog,
    Snow,
}

/// Occasional one-shot events layered on a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hazard {
    Lightning,
}

/// Catalog entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherMode {
    pub kind: WeatherKind,
    /// Relative selection probability
    pub weight: u32,
    /// Typical time the mode stays on screen (ms)
    pub mean_hold_ms: u64,
    pub effects: &'static [AmbientEffect],
    pub hazard: Option<Hazard>,
}

pub const WEATHER_CATALOG: [WeatherMode; 7] = [
    WeatherMode {
        kind: WeatherKind::Clear,
        weight: 25,
        mean_hold_ms: 25_000,
        effects: &[AmbientEffect::Sunlight],
        hazard: None,
    },
    WeatherMode {
        kind: WeatherKind::Cloudy,
        weight: 20,
        mean_hold_ms: 25_000,
        effects: &[AmbientEffect::Clouds],
        hazard: None,
    },
    WeatherMode {
        kind: WeatherKind::Rain,
        weight: 15,
        mean_hold_ms: 25_000,
        effects: &[AmbientEffect::Clouds, AmbientEffect::Rain],
        hazard: None,
    },
    WeatherMode {
        kind: WeatherKind::Storm,
        weight: 10,
        mean_hold_ms: 20_000,
        effects: &[AmbientEffect::Clouds, AmbientEffect::Rain, AmbientEffect::Wind],
        hazard: Some(Hazard::Lightning),
    },
    WeatherMode {
        kind: WeatherKind::Fog,
        weight: 8,
        mean_hold_ms: 30_000,
        effects: &[AmbientEffect::Fog],
        hazard: None,
    },
    WeatherMode {
        kind: WeatherKind::Wind,
        weight: 12,
        mean_hold_ms: 20_000,
        effects: &[AmbientEffect::Wind],
        hazard: None,
    },
    WeatherMode {
        kind: WeatherKind::Snow,
        weight: 10,
        mean_hold_ms: 30_000,
        effects: &[AmbientEffect::Clouds, AmbientEffect::Snow],
        hazard: None,
    },
];

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherEvent {
    ModeChanged {
        from: Option<WeatherKind>,
        to: WeatherKind,
    },
    EffectStarted(AmbientEffect),
    EffectStopped(AmbientEffect),
    Hazard(Hazard),
    /// Engine stopped; nothing is active
    Cleared,
}

/// Index of the first entry whose cumulative weight exceeds `u`.
/// `u` is expected in `[0, total)`; values at or past the total pick the last
/// weighted entry. Returns None when every weight is zero.
pub fn roulette_index(weights: &[u32], u: f64) -> Option<usize> {
    let mut cumulative = 0u64;
    let mut last = None;
    for (i, &weight) in weights.iter().enumerate() {
        if weight == 0 {
            continue;
        }
        cumulative += weight as u64;
        last = Some(i);
        if cumulative as f64 > u {
            return Some(i);
        }
    }
    last
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeatherTimer {
    Reroll,
    HazardRoll,
}

/// Weather engine with its own timers and RNG
#[derive(Debug, Clone)]
pub struct WeatherEngine {
    settings: WeatherSettings,
    catalog: &'static [WeatherMode],
    weights: Vec<u32>,
    rng: Pcg32,
    timers: Scheduler<WeatherTimer>,
    running: bool,
    current: Option<usize>,
    effects: Vec<AmbientEffect>,
    reroll_timer: Option<TimerId>,
    hazard_timer: Option<TimerId>,
    selections: u32,
    restarts: u32,
    events: Vec<WeatherEvent>,
}

impl WeatherEngine {
    /// Zero intervals are raised to 1 ms so a timer can never re-fire at the same instant
    pub fn new(mut settings: WeatherSettings, seed: u64) -> Self {
        settings.min_hold_ms = settings.min_hold_ms.max(1);
        settings.max_hold_ms = settings.max_hold_ms.max(settings.min_hold_ms);
        settings.hazard_check_ms = settings.hazard_check_ms.max(1);
        let catalog: &'static [WeatherMode] = &WEATHER_CATALOG;
        Self {
            settings,
            catalog,
            weights: catalog.iter().map(|m| m.weight).collect(),
            rng: Pcg32::seed_from_u64(seed),
            timers: Scheduler::new(),
            running: false,
            current: None,
            effects: Vec::new(),
            reroll_timer: None,
            hazard_timer: None,
            selections: 0,
            restarts: 0,
            events: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current(&self) -> Option<WeatherKind> {
        self.current.map(|i| self.catalog[i].kind)
    }

    pub fn active_effects(&self) -> &[AmbientEffect] {
        &self.effects
    }

    /// Number of times a mode's effects were started
    pub fn restart_count(&self) -> u32 {
        self.restarts
    }

    /// Number of roulette draws performed
    pub fn selection_count(&self) -> u32 {
        self.selections
    }

    /// When the next roll is due
    pub fn next_roll_at(&self) -> Option<u64> {
        self.reroll_timer.and_then(|id| self.timers.due_of(id))
    }

    pub fn drain_events(&mut self) -> Vec<WeatherEvent> {
        std::mem::take(&mut self.events)
    }

    /// Roll a mode immediately and arm the re-roll timer
    pub fn start(&mut self, now: u64) {
        if self.running {
            return;
        }
        self.timers.advance_to(now);
        self.running = true;
        self.roll();
        self.arm_reroll();
    }

    /// Cancel all timers and clear the active mode
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.timers.clear();
        self.reroll_timer = None;
        self.hazard_timer = None;
        self.stop_effects();
        self.current = None;
        self.events.push(WeatherEvent::Cleared);
        log::debug!("Weather stopped");
    }

    /// Fire every timer due up to `now`
    pub fn advance_to(&mut self, now: u64) {
        if !self.running {
            return;
        }
        while let Some((_, timer)) = self.timers.pop_due(now) {
            match timer {
                WeatherTimer::Reroll => {
                    self.reroll_timer = None;
                    self.roll();
                    self.arm_reroll();
                }
                WeatherTimer::HazardRoll => {
                    self.hazard_timer = None;
                    self.roll_hazard();
                }
            }
        }
        self.timers.advance_to(now);
    }

    fn roll(&mut self) {
        let total: u64 = self.weights.iter().map(|&w| w as u64).sum();
        if total == 0 {
            return;
        }
        let u = self.rng.random_range(0.0..total as f64);
        self.selections += 1;
        if let Some(index) = roulette_index(&self.weights, u) {
            self.transition(index);
        }
    }

    fn arm_reroll(&mut self) {
        let hold = self
            .rng
            .random_range(self.settings.min_hold_ms..=self.settings.max_hold_ms);
        self.reroll_timer = Some(self.timers.schedule_in(hold, WeatherTimer::Reroll));
    }

    /// Switch to catalog entry `index`; re-selecting the current mode does nothing
    fn transition(&mut self, index: usize) -> bool {
        if self.current == Some(index) {
            log::debug!("Weather stays {:?}", self.catalog[index].kind);
            return false;
        }
        let from = self.current();
        self.stop_effects();
        self.current = Some(index);
        self.start_effects(index);

        let to = self.catalog[index].kind;
        log::info!("Weather {:?} -> {:?}", from, to);
        self.events.push(WeatherEvent::ModeChanged { from, to });
        true
    }

    fn start_effects(&mut self, index: usize) {
        let mode = self.catalog[index];
        self.restarts += 1;
        for &effect in mode.effects {
            self.effects.push(effect);
            self.events.push(WeatherEvent::EffectStarted(effect));
        }
        if mode.hazard.is_some() {
            self.hazard_timer = Some(
                self.timers
                    .schedule_in(self.settings.hazard_check_ms, WeatherTimer::HazardRoll),
            );
        }
    }

    fn stop_effects(&mut self) {
        if let Some(id) = self.hazard_timer.take() {
            self.timers.cancel(id);
        }
        for effect in self.effects.drain(..) {
            self.events.push(WeatherEvent::EffectStopped(effect));
        }
    }

    fn roll_hazard(&mut self) {
        let Some(hazard) = self.current.and_then(|i| self.catalog[i].hazard) else {
            return;
        };
        if self.rng.random::<f64>() < self.settings.hazard_chance {
            log::debug!("Weather hazard: {:?}", hazard);
            self.events.push(WeatherEvent::Hazard(hazard));
        }
        self.hazard_timer = Some(
            self.timers
                .schedule_in(self.settings.hazard_check_ms, WeatherTimer::HazardRoll),
        );
    }
}
