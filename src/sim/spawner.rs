//! Word spawning

use rand::Rng;

use super::clock::Scheduler;
use super::round::{RoundState, RoundTimer};
use super::word::{WordId, WordStore};
use crate::stage::StageConfig;

/// Spawn a random word from `pool` if the stage allows another one.
///
/// Selection is uniform with repetition. Returns None, without touching any
/// state, when the pool is empty, the concurrency cap is reached or the round
/// already spawned its quota.
pub fn try_spawn(
    store: &mut WordStore,
    state: &mut RoundState,
    stage: &StageConfig,
    pool: &[String],
    rng: &mut impl Rng,
    timers: &mut Scheduler<RoundTimer>,
) -> Option<WordId> {
    if pool.is_empty()
        || store.live_count() >= stage.max_concurrent as usize
        || state.total_spawned >= stage.target_words
    {
        return None;
    }
    let text = pool[rng.random_range(0..pool.len())].clone();
    Some(spawn_text(store, state, stage, timers, text))
}

/// Insert `text` as a falling word and arm its lifetime expiry
pub(crate) fn spawn_text(
    store: &mut WordStore,
    state: &mut RoundState,
    stage: &StageConfig,
    timers: &mut Scheduler<RoundTimer>,
    text: String,
) -> WordId {
    let now = timers.now();
    let lifetime = stage.lifetime_ms();
    let id = store.insert(text, now, lifetime);
    state.total_spawned += 1;
    timers.schedule_in(lifetime, RoundTimer::Expire(id));
    id
}
