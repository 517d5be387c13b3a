//! Falling word entities and the table that owns them

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fall_progress;

/// Opaque entity handle; ids increase in spawn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordId(u32);

impl WordId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Match/lifecycle state of a word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordState {
    /// On screen, not targeted
    Falling,
    /// The word the player is currently typing
    Typing,
    /// Typed in full (terminal)
    Completed,
    /// Reached the sea (terminal)
    Missed,
}

impl WordState {
    /// Falling or Typing
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(self, WordState::Falling | WordState::Typing)
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }
}

/// A falling word
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEntity {
    pub id: WordId,
    pub text: String,
    /// Lowercased `text`, used for matching
    folded: String,
    /// Round time at spawn (ms)
    pub spawned_at: u64,
    /// Time budget before the word is missed (ms)
    pub lifetime_ms: u64,
    pub state: WordState,
    /// Input committed toward this word while it is the active target
    pub typed_prefix: String,
    /// Round time of the terminal transition
    pub resolved_at: Option<u64>,
}

impl WordEntity {
    fn new(id: WordId, text: String, spawned_at: u64, lifetime_ms: u64) -> Self {
        let folded = text.to_lowercase();
        Self {
            id,
            text,
            folded,
            spawned_at,
            lifetime_ms,
            state: WordState::Falling,
            typed_prefix: String::new(),
            resolved_at: None,
        }
    }

    #[inline]
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Length in characters of the folded text, the same text input is matched
    /// and charged against
    #[inline]
    pub fn len(&self) -> usize {
        self.folded.chars().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.spawned_at)
    }

    /// Simulated fall position, 0 at spawn and 1 at the bottom of the play area
    pub fn fall_progress(&self, now: u64) -> f64 {
        fall_progress(self.elapsed(now), self.lifetime_ms)
    }
}

/// Owned entity table
#[derive(Debug, Clone, Default)]
pub struct WordStore {
    words: BTreeMap<WordId, WordEntity>,
    next_id: u32,
}

impl WordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new falling word
    pub fn insert(&mut self, text: String, now: u64, lifetime_ms: u64) -> WordId {
        self.next_id += 1;
        let id = WordId(self.next_id);
        self.words.insert(id, WordEntity::new(id, text, now, lifetime_ms));
        id
    }

    pub fn get(&self, id: WordId) -> Option<&WordEntity> {
        self.words.get(&id)
    }

    pub fn get_mut(&mut self, id: WordId) -> Option<&mut WordEntity> {
        self.words.get_mut(&id)
    }

    /// All unretired words in spawn order
    pub fn iter(&self) -> impl Iterator<Item = &WordEntity> {
        self.words.values()
    }

    /// Falling or Typing words in spawn order
    pub fn live(&self) -> impl Iterator<Item = &WordEntity> {
        self.words.values().filter(|w| w.state.is_live())
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    /// Unretired words, terminal ones included
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The word currently being typed
    pub fn active(&self) -> Option<WordId> {
        self.words
            .values()
            .find(|w| w.state == WordState::Typing)
            .map(|w| w.id)
    }

    /// First live word (spawn order) whose folded text starts with `prefix`
    pub fn find_prefix(&self, prefix: &str) -> Option<WordId> {
        self.live().find(|w| w.folded.starts_with(prefix)).map(|w| w.id)
    }

    /// First live word (spawn order) whose folded text equals `text`
    pub fn find_exact(&self, text: &str) -> Option<WordId> {
        self.live().find(|w| w.folded == text).map(|w| w.id)
    }

    /// Make `id` the only Typing word; returns the demoted word, if any
    pub fn activate(&mut self, id: WordId, prefix: &str) -> Option<WordId> {
        let demoted = self.active().filter(|&active| active != id);
        if let Some(prev) = demoted {
            self.demote(prev);
        }
        if let Some(word) = self.words.get_mut(&id) {
            if word.state.is_live() {
                word.state = WordState::Typing;
                word.typed_prefix.clear();
                word.typed_prefix.push_str(prefix);
            }
        }
        demoted
    }

    /// Demote the active word back to Falling; returns it
    pub fn release_active(&mut self) -> Option<WordId> {
        let id = self.active()?;
        self.demote(id);
        Some(id)
    }

    fn demote(&mut self, id: WordId) {
        if let Some(word) = self.words.get_mut(&id) {
            if word.state == WordState::Typing {
                word.state = WordState::Falling;
            }
            word.typed_prefix.clear();
        }
    }

    /// Move a live word into a terminal state; false if it is already terminal or retired
    pub fn resolve(&mut self, id: WordId, state: WordState, now: u64) -> bool {
        debug_assert!(state.is_terminal());
        match self.words.get_mut(&id) {
            Some(word) if word.state.is_live() => {
                word.state = state;
                word.typed_prefix.clear();
                word.resolved_at = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Live words whose fall progress reached `threshold`, in spawn order
    pub fn overdue(&self, now: u64, threshold: f64) -> Vec<WordId> {
        self.live()
            .filter(|w| w.fall_progress(now) >= threshold)
            .map(|w| w.id)
            .collect()
    }

    /// Remove a word; retiring twice is a no-op
    pub fn retire(&mut self, id: WordId) -> bool {
        self.words.remove(&id).is_some()
    }

    /// Remove every word, returning their ids in spawn order
    pub fn retire_all(&mut self) -> Vec<WordId> {
        let ids = self.words.keys().copied().collect();
        self.words.clear();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(words: &[&str]) -> (WordStore, Vec<WordId>) {
        let mut store = WordStore::new();
        let ids = words
            .iter()
            .enumerate()
            .map(|(i, w)| store.insert(w.to_string(), i as u64 * 100, 8000))
            .collect();
        (store, ids)
    }

    #[test]
    fn test_prefix_tie_breaks_by_spawn_order() {
        let (store, ids) = store_with(&["Sea", "seal", "sand"]);
        assert_eq!(store.find_prefix("se"), Some(ids[0]));
        assert_eq!(store.find_prefix("sea"), Some(ids[0]));
        assert_eq!(store.find_prefix("seal"), Some(ids[1]));
        assert_eq!(store.find_prefix("x"), None);
        assert_eq!(store.find_exact("seal"), Some(ids[1]));
        assert_eq!(store.find_exact("sea"), Some(ids[0]));
    }

    #[test]
    fn test_single_active_word() {
        let (mut store, ids) = store_with(&["sea", "wave"]);
        assert_eq!(store.activate(ids[0], "se"), None);
        assert_eq!(store.get(ids[0]).unwrap().typed_prefix, "se");

        assert_eq!(store.activate(ids[1], "w"), Some(ids[0]));
        assert_eq!(store.active(), Some(ids[1]));
        let first = store.get(ids[0]).unwrap();
        assert_eq!(first.state, WordState::Falling);
        assert!(first.typed_prefix.is_empty());

        assert_eq!(store.release_active(), Some(ids[1]));
        assert_eq!(store.active(), None);
    }

    #[test]
    fn test_resolve_once() {
        let (mut store, ids) = store_with(&["sea"]);
        assert!(store.resolve(ids[0], WordState::Missed, 10));
        assert!(!store.resolve(ids[0], WordState::Missed, 20));
        assert!(!store.resolve(ids[0], WordState::Completed, 20));
        let word = store.get(ids[0]).unwrap();
        assert_eq!(word.state, WordState::Missed);
        assert_eq!(word.resolved_at, Some(10));
        assert_eq!(store.find_prefix("s"), None);
    }

    #[test]
    fn test_retire_idempotent() {
        let (mut store, ids) = store_with(&["sea", "wave"]);
        assert!(store.retire(ids[0]));
        assert!(!store.retire(ids[0]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.retire_all(), vec![ids[1]]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_overdue_uses_fall_progress() {
        let (store, ids) = store_with(&["sea", "wave"]);
        // Spawned at 0 and 100 with 8000 ms lifetimes; 80% is 6400 ms
        assert!(store.overdue(6399, 0.8).is_empty());
        assert_eq!(store.overdue(6400, 0.8), vec![ids[0]]);
        assert_eq!(store.overdue(6500, 0.8), ids);
    }
}
