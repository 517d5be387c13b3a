//! Input matching
//!
//! Resolves the player's input buffer against the live words. Matching is
//! case-insensitive on trimmed input; ties go to the earliest spawned word.

use super::events::GameEvent;
use super::round::Round;
use super::word::WordId;

/// Trim and lowercase raw input
pub fn normalize_input(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// What the input did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Empty input, nothing changed
    Idle,
    /// Round not running
    Ignored,
    /// Input is a prefix of the word now being typed
    Progress { id: WordId },
    Completed { id: WordId, points: u64 },
    /// Typed input matches no live word
    NoMatch,
    /// Submitted input matches no live word exactly
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub feedback: Feedback,
    /// The host should empty its input buffer
    pub clear_input: bool,
}

impl MatchResult {
    fn keep(feedback: Feedback) -> Self {
        Self {
            feedback,
            clear_input: false,
        }
    }

    fn clear(feedback: Feedback) -> Self {
        Self {
            feedback,
            clear_input: true,
        }
    }
}

impl Round {
    /// Match the current input buffer as the player types
    pub fn handle_input(&mut self, raw: &str) -> MatchResult {
        if !self.is_running() {
            return MatchResult::keep(Feedback::Ignored);
        }
        let input = normalize_input(raw);
        if input.is_empty() {
            return MatchResult::keep(Feedback::Idle);
        }

        let Some(id) = self.store.find_prefix(&input) else {
            self.state.total_chars += input.chars().count() as u64;
            self.release_active();
            self.events.push(GameEvent::NoMatch { input });
            return MatchResult::keep(Feedback::NoMatch);
        };

        if let Some(prev) = self.store.activate(id, &input) {
            self.events.push(GameEvent::WordReleased { id: prev });
        }
        self.events.push(GameEvent::WordMatched {
            id,
            prefix: input.clone(),
        });

        let exact = self
            .store
            .get(id)
            .is_some_and(|w| w.folded() == input);
        if exact {
            if let Some(points) = self.complete(id) {
                return MatchResult::clear(Feedback::Completed { id, points });
            }
        }
        MatchResult::keep(Feedback::Progress { id })
    }

    /// Enter pressed: only an exact match counts. The buffer is always cleared.
    pub fn handle_exact_submit(&mut self, raw: &str) -> MatchResult {
        if !self.is_running() {
            return MatchResult::keep(Feedback::Ignored);
        }
        let input = normalize_input(raw);
        if input.is_empty() {
            return MatchResult::clear(Feedback::Idle);
        }

        if let Some(id) = self.store.find_exact(&input) {
            if let Some(points) = self.complete(id) {
                return MatchResult::clear(Feedback::Completed { id, points });
            }
        }

        self.state.total_chars += input.chars().count() as u64;
        self.release_active();
        log::debug!("Submit of {:?} rejected", input);
        MatchResult::clear(Feedback::Rejected)
    }

    /// Tap or click on a falling word: completes it as if typed
    pub fn select_word(&mut self, id: WordId) -> MatchResult {
        if !self.is_running() {
            return MatchResult::keep(Feedback::Ignored);
        }
        match self.complete(id) {
            Some(points) => MatchResult::clear(Feedback::Completed { id, points }),
            None => {
                log::debug!("Selection of {} ignored: not live", id);
                MatchResult::keep(Feedback::Idle)
            }
        }
    }

    fn release_active(&mut self) {
        if let Some(id) = self.store.release_active() {
            self.events.push(GameEvent::WordReleased { id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::round::tests::{assert_counts, manual_round};
    use crate::sim::word::WordState;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_input("  SeA \n"), "sea");
        assert_eq!(normalize_input("   "), "");
    }

    #[test]
    fn test_empty_input_is_idle() {
        let mut round = manual_round();
        round.spawn_exact("sea");
        round.drain_events();
        assert_eq!(round.handle_input("  ").feedback, Feedback::Idle);
        assert_eq!(round.state().total_chars, 0);
        assert!(round.drain_events().is_empty());
    }

    #[test]
    fn test_prefix_tie_goes_to_earliest() {
        let mut round = manual_round();
        let sea = round.spawn_exact("sea");
        let seal = round.spawn_exact("seal");

        assert_eq!(round.handle_input("se").feedback, Feedback::Progress { id: sea });
        assert_eq!(round.word(sea).unwrap().typed_prefix, "se");

        // Exact match on the earlier word completes it
        let result = round.handle_input("SEA");
        assert!(result.clear_input);
        assert!(matches!(result.feedback, Feedback::Completed { id, .. } if id == sea));
        assert_eq!(round.word(seal).unwrap().state, WordState::Falling);
        assert_counts(&round);
    }

    #[test]
    fn test_switching_target_demotes_previous() {
        let mut round = manual_round();
        let wave = round.spawn_exact("wave");
        let tide = round.spawn_exact("tide");

        round.handle_input("wa");
        assert_eq!(round.active_word(), Some(wave));
        round.drain_events();

        assert_eq!(round.handle_input("t").feedback, Feedback::Progress { id: tide });
        assert_eq!(round.active_word(), Some(tide));
        let first = round.word(wave).unwrap();
        assert_eq!(first.state, WordState::Falling);
        assert!(first.typed_prefix.is_empty());
        assert_eq!(
            round.drain_events(),
            vec![
                GameEvent::WordReleased { id: wave },
                GameEvent::WordMatched {
                    id: tide,
                    prefix: "t".into()
                },
            ]
        );
        assert_counts(&round);
    }

    #[test]
    fn test_no_match_charges_chars_and_releases() {
        let mut round = manual_round();
        let wave = round.spawn_exact("wave");
        round.handle_input("wa");

        assert_eq!(round.handle_input("wx").feedback, Feedback::NoMatch);
        assert_eq!(round.active_word(), None);
        assert_eq!(round.word(wave).unwrap().state, WordState::Falling);
        assert_eq!(round.state().total_chars, 2);
        assert_eq!(round.state().correct_chars, 0);
    }

    #[test]
    fn test_exact_submit() {
        let mut round = manual_round();
        let reef = round.spawn_exact("reef");

        let rejected = round.handle_exact_submit("ree");
        assert_eq!(rejected.feedback, Feedback::Rejected);
        assert!(rejected.clear_input);
        assert_eq!(round.state().total_chars, 3);

        let done = round.handle_exact_submit(" Reef ");
        assert!(matches!(done.feedback, Feedback::Completed { id, .. } if id == reef));
        assert_eq!(round.state().completed, 1);
        assert_eq!(round.state().total_chars, 7);
        assert_eq!(round.state().correct_chars, 4);

        // Terminal words never match again
        assert_eq!(round.handle_exact_submit("reef").feedback, Feedback::Rejected);
        assert_eq!(round.state().completed, 1);
    }

    #[test]
    fn test_input_ignored_unless_running() {
        let mut round = manual_round();
        let id = round.spawn_exact("gull");
        round.pause();
        assert_eq!(round.handle_input("gull").feedback, Feedback::Ignored);
        assert_eq!(round.handle_exact_submit("gull").feedback, Feedback::Ignored);
        assert_eq!(round.select_word(id).feedback, Feedback::Ignored);
        assert_eq!(round.word(id).unwrap().state, WordState::Falling);
        assert_eq!(round.state().total_chars, 0);
    }

    #[test]
    fn test_select_word() {
        let mut round = manual_round();
        let first = round.spawn_exact("kelp");
        let second = round.spawn_exact("kelp");

        // The tapped duplicate is the one completed
        let result = round.select_word(second);
        assert!(matches!(result.feedback, Feedback::Completed { id, .. } if id == second));
        assert_eq!(round.word(first).unwrap().state, WordState::Falling);
        assert_eq!(round.select_word(second).feedback, Feedback::Idle);
        assert_eq!(round.state().completed, 1);
        assert_counts(&round);
    }

    #[test]
    fn test_length_follows_folded_text() {
        let mut round = manual_round();
        // 'İ' lowercases to two characters
        let id = round.spawn_exact("İz");
        assert_eq!(round.word(id).unwrap().len(), 3);

        assert_eq!(round.handle_exact_submit("i\u{307}x").feedback, Feedback::Rejected);
        assert_eq!(round.state().total_chars, 3);

        let done = round.handle_exact_submit("İZ");
        assert!(matches!(done.feedback, Feedback::Completed { .. }));
        assert_eq!(round.state().correct_chars, 3);
        assert_eq!(round.state().total_chars, 6);
        assert_eq!(round.state().score, 30 + 80);
    }
}
