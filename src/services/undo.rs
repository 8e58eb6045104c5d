use super::sequencer::ComparisonRound;
use super::wildcard::Outcome;
use crate::models::{MovieId, MovieLibrary, RatedMovie, SequencerState, WatchlistMovie};

/// Everything needed to reverse one recorded outcome
#[derive(Debug, Clone, PartialEq)]
pub struct UndoRecord {
    pub round: ComparisonRound,
    pub outcome: Outcome,
    /// Rated entries of both movies before the outcome (None: not rated)
    rated_before: Vec<(MovieId, Option<RatedMovie>)>,
    /// Watchlist entries of both movies before the outcome
    watchlist_before: Vec<(MovieId, Option<WatchlistMovie>)>,
    /// Ids this outcome newly inserted into the compared set
    inserted_compared: Option<MovieId>,
    inserted_skipped: Option<MovieId>,
    counted: bool,
    advanced_pattern: bool,
}

impl UndoRecord {
    /// Snapshots both movies of the round as they are now
    pub(crate) fn capture(round: &ComparisonRound, outcome: Outcome, library: &MovieLibrary) -> Self {
        let ids = [round.known.id, round.candidate.id()];
        Self {
            round: round.clone(),
            outcome,
            rated_before: ids.iter().map(|&id| (id, library.get(id).cloned())).collect(),
            watchlist_before: ids
                .iter()
                .map(|&id| (id, library.watchlist_entry(id).cloned()))
                .collect(),
            inserted_compared: None,
            inserted_skipped: None,
            counted: false,
            advanced_pattern: false,
        }
    }

    pub(crate) fn note_compared(&mut self, id: MovieId) {
        self.inserted_compared = Some(id);
    }

    pub(crate) fn note_skipped(&mut self, id: MovieId) {
        self.inserted_skipped = Some(id);
    }

    pub(crate) fn note_counted(&mut self) {
        self.counted = true;
    }

    pub(crate) fn note_pattern_advanced(&mut self) {
        self.advanced_pattern = true;
    }

    /// Restores the library and state, returning the round that was undone.
    /// Snapshots are applied in reverse so the first capture wins when both
    /// sides share an id.
    pub fn revert(self, library: &mut MovieLibrary, state: &mut SequencerState) -> ComparisonRound {
        for (id, entry) in self.rated_before.into_iter().rev() {
            library.restore_rated(id, entry);
        }
        for (id, entry) in self.watchlist_before.into_iter().rev() {
            library.restore_watchlist(id, entry);
        }

        if let Some(id) = self.inserted_compared {
            state.compared_ids.remove(&id);
        }
        if let Some(id) = self.inserted_skipped {
            state.skipped_ids.remove(&id);
        }
        if self.counted {
            state.total_comparisons = state.total_comparisons.saturating_sub(1);
        }
        if self.advanced_pattern {
            state.rewind_pattern();
        }

        self.round
    }
}

/// One level of undo. Recording overwrites the previous record; taking
/// empties the slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoSlot {
    record: Option<UndoRecord>,
}

impl UndoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, record: UndoRecord) {
        self.record = Some(record);
    }

    pub fn take(&mut self) -> Option<UndoRecord> {
        self.record.take()
    }

    pub fn peek(&self) -> Option<&UndoRecord> {
        self.record.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_none()
    }

    pub fn clear(&mut self) {
        self.record = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogMovie;
    use crate::services::sequencer::{Candidate, RoundKind};

    fn catalog(id: MovieId) -> CatalogMovie {
        CatalogMovie {
            id,
            title: format!("Movie {}", id),
            poster_path: None,
            vote_average: 7.0,
            vote_count: 100,
            release_date: None,
            genre_ids: vec![18],
            overview: None,
        }
    }

    fn round(library: &MovieLibrary) -> ComparisonRound {
        ComparisonRound {
            known: library.get(1).cloned().unwrap(),
            candidate: Candidate::Unknown(catalog(2)),
            kind: RoundKind::BaselineUnknown,
        }
    }

    #[test]
    fn test_slot_holds_one_record() {
        let mut library = MovieLibrary::new();
        library.rate(&catalog(1), 6.0).unwrap();
        let round = round(&library);

        let mut slot = UndoSlot::new();
        assert!(slot.is_empty());
        slot.store(UndoRecord::capture(&round, Outcome::Skip, &library));
        slot.store(UndoRecord::capture(&round, Outcome::Tie, &library));

        assert_eq!(slot.peek().map(|r| r.outcome), Some(Outcome::Tie));
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_revert_restores_only_noted_changes() {
        let mut library = MovieLibrary::new();
        library.rate(&catalog(1), 6.0).unwrap();
        let round = round(&library);
        let mut state = SequencerState::new();
        state.compared_ids.insert(2);
        let before_library = library.clone();

        // Candidate was already compared, so only the count and pattern moved
        let mut record = UndoRecord::capture(&round, Outcome::CandidateWins, &library);
        record.note_counted();
        record.note_pattern_advanced();
        state.total_comparisons += 1;
        state.advance_pattern();
        let entry = library.get(1).cloned().unwrap();
        library.apply_rating(&entry, 5.3).unwrap();
        library.apply_rating(&round.candidate.as_rated(), 7.7).unwrap();

        let restored = record.revert(&mut library, &mut state);

        assert_eq!(restored, round);
        assert_eq!(library, before_library);
        assert!(state.compared_ids.contains(&2));
        assert_eq!(state.total_comparisons, 0);
        assert_eq!(state.pattern_position, 0);
    }
}
