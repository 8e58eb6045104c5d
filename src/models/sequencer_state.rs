use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::MovieId;

/// Rounds in one known-vs-unknown / known-vs-known cycle
pub const PATTERN_LENGTH: u8 = 5;

/// Pattern slot reserved for known-vs-known rounds
pub const KNOWN_VS_KNOWN_SLOT: u8 = PATTERN_LENGTH - 1;

/// Persisted progress of the comparison sequencer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerState {
    /// Candidates already used in a round
    pub compared_ids: BTreeSet<MovieId>,
    /// Candidates the user skipped
    pub skipped_ids: BTreeSet<MovieId>,
    /// Rounds that consumed an unknown candidate
    pub total_comparisons: u32,
    /// Position in the 0..=4 round cycle
    pub pattern_position: u8,
    pub baseline_complete: bool,
}

impl SequencerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_pattern(&mut self) {
        self.pattern_position = (self.pattern_position + 1) % PATTERN_LENGTH;
    }

    pub fn rewind_pattern(&mut self) {
        self.pattern_position = (self.pattern_position + PATTERN_LENGTH - 1) % PATTERN_LENGTH;
    }

    pub fn is_known_vs_known_turn(&self) -> bool {
        self.pattern_position == KNOWN_VS_KNOWN_SLOT
    }

    /// Whether the id was used as a candidate or skipped
    pub fn is_consumed(&self, id: MovieId) -> bool {
        self.compared_ids.contains(&id) || self.skipped_ids.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_cycles() {
        let mut state = SequencerState::new();
        for _ in 0..4 {
            assert!(!state.is_known_vs_known_turn());
            state.advance_pattern();
        }
        assert!(state.is_known_vs_known_turn());
        state.advance_pattern();
        assert_eq!(state.pattern_position, 0);
    }

    #[test]
    fn test_rewind_wraps() {
        let mut state = SequencerState::new();
        state.rewind_pattern();
        assert_eq!(state.pattern_position, 4);
        state.advance_pattern();
        assert_eq!(state.pattern_position, 0);
    }

    #[test]
    fn test_is_consumed() {
        let mut state = SequencerState::new();
        state.compared_ids.insert(1);
        state.skipped_ids.insert(2);
        assert!(state.is_consumed(1));
        assert!(state.is_consumed(2));
        assert!(!state.is_consumed(3));
    }
}
