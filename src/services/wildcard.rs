use super::rating::{adjust, tough_choice, RatingInput, TieKind};
use super::sequencer::{Candidate, ComparisonRound, RoundKind, RoundSelection};
use super::undo::{UndoRecord, UndoSlot};
use crate::error::{EngineError, EngineResult};
use crate::models::{CatalogMovie, MovieId, MovieLibrary, RatedMovie, SequencerState, WatchlistMovie};

/// The user's answer to a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The known movie is better
    SeenWins,
    CandidateWins,
    /// Too close to call
    Tie,
    Skip,
    /// Haven't seen the candidate but want to
    AddToWatchlist,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingChange {
    pub movie_id: MovieId,
    pub title: String,
    /// None when the movie was not rated before this outcome
    pub previous: Option<f64>,
    pub rating: f64,
    pub comparison_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOutcome {
    pub state: SequencerState,
    pub rating_changes: Vec<RatingChange>,
}

/// Library, sequencer progress and the undo slot, mutated together.
///
/// Every outcome advances the pattern by one. Only rounds with an unknown
/// candidate touch the compared set and the comparison counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WildcardState {
    library: MovieLibrary,
    sequencer: SequencerState,
    undo: UndoSlot,
}

impl WildcardState {
    pub fn new(library: MovieLibrary, sequencer: SequencerState) -> Self {
        Self {
            library,
            sequencer,
            undo: UndoSlot::new(),
        }
    }

    pub fn library(&self) -> &MovieLibrary {
        &self.library
    }

    pub fn sequencer_state(&self) -> &SequencerState {
        &self.sequencer
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Marks the baseline phase complete if the selection ended it. Returns
    /// true only the first time.
    pub fn apply_selection(&mut self, selection: &RoundSelection) -> bool {
        if !selection.baseline_completed || self.sequencer.baseline_complete {
            return false;
        }
        self.sequencer.baseline_complete = true;
        tracing::info!(
            total_comparisons = self.sequencer.total_comparisons,
            compared = self.sequencer.compared_ids.len(),
            "Baseline phase complete"
        );
        true
    }

    /// Latest library entry for a movie, falling back to the given snapshot
    fn current(&self, movie: &RatedMovie) -> RatedMovie {
        self.library.get(movie.id).cloned().unwrap_or_else(|| movie.clone())
    }

    fn current_candidate(&self, candidate: &Candidate) -> RatedMovie {
        match candidate {
            Candidate::Known(movie) => self.current(movie),
            Candidate::Unknown(movie) => self
                .library
                .get(movie.id)
                .cloned()
                .unwrap_or_else(|| RatedMovie::provisional(movie)),
        }
    }

    pub fn record_outcome(
        &mut self,
        round: &ComparisonRound,
        outcome: Outcome,
    ) -> EngineResult<RecordedOutcome> {
        if outcome == Outcome::AddToWatchlist && round.kind == RoundKind::KnownVsKnown {
            return Err(EngineError::IllegalOutcome(
                "both movies in a known-vs-known round are already rated".to_string(),
            ));
        }

        let mut record = UndoRecord::capture(round, outcome, &self.library);
        let known = self.current(&round.known);
        let candidate = self.current_candidate(&round.candidate);

        // Ratings are computed before anything is written
        let updates = match outcome {
            Outcome::SeenWins => {
                let result = adjust(input(&known), input(&candidate))?;
                vec![(known, result.winner_rating), (candidate, result.loser_rating)]
            }
            Outcome::CandidateWins => {
                let result = adjust(input(&candidate), input(&known))?;
                vec![(candidate, result.winner_rating), (known, result.loser_rating)]
            }
            Outcome::Tie => {
                let kind = match round.kind {
                    RoundKind::KnownVsKnown => TieKind::KnownVsKnown,
                    _ => TieKind::KnownVsUnknown,
                };
                let result = tough_choice(known.user_rating, candidate.user_rating, kind)?;
                vec![(known, result.known_rating), (candidate, result.candidate_rating)]
            }
            Outcome::Skip | Outcome::AddToWatchlist => Vec::new(),
        };

        let mut rating_changes = Vec::with_capacity(updates.len());
        for (movie, rating) in updates {
            let previous = self.library.get(movie.id).map(|m| m.user_rating);
            let updated = self.library.apply_rating(&movie, rating)?;
            rating_changes.push(RatingChange {
                movie_id: updated.id,
                title: updated.title,
                previous,
                rating: updated.user_rating,
                comparison_count: updated.comparison_count,
            });
        }

        if let (Outcome::AddToWatchlist, Candidate::Unknown(movie)) = (outcome, &round.candidate) {
            if !self.library.add_to_watchlist(movie.clone().into()) {
                tracing::debug!(movie_id = movie.id, "Candidate already rated or listed");
            }
        }

        if round.consumes_candidate() {
            let id = round.candidate.id();
            if outcome == Outcome::Skip && self.sequencer.skipped_ids.insert(id) {
                record.note_skipped(id);
            }
            let skip_of_rated = outcome == Outcome::Skip && self.library.is_rated(id);
            if !skip_of_rated && self.sequencer.compared_ids.insert(id) {
                record.note_compared(id);
            }
            self.sequencer.total_comparisons += 1;
            record.note_counted();
        }

        self.sequencer.advance_pattern();
        record.note_pattern_advanced();
        self.undo.store(record);

        tracing::info!(
            outcome = ?outcome,
            kind = ?round.kind,
            known = round.known.id,
            candidate = round.candidate.id(),
            pattern_position = self.sequencer.pattern_position,
            total_comparisons = self.sequencer.total_comparisons,
            "Recorded comparison outcome"
        );

        Ok(RecordedOutcome {
            state: self.sequencer.clone(),
            rating_changes,
        })
    }

    /// Reverses the last recorded outcome. No-op when there is nothing to undo.
    pub fn undo(&mut self) -> Option<ComparisonRound> {
        let record = self.undo.take()?;
        let round = record.revert(&mut self.library, &mut self.sequencer);

        tracing::info!(
            known = round.known.id,
            candidate = round.candidate.id(),
            pattern_position = self.sequencer.pattern_position,
            "Undid last outcome"
        );

        Some(round)
    }

    /// Direct rating outside of a round. Clears the undo slot.
    pub fn rate_movie(&mut self, movie: &CatalogMovie, rating: f64) -> EngineResult<Option<RatedMovie>> {
        let previous = self.library.rate(movie, rating)?;
        self.undo.clear();
        Ok(previous)
    }

    pub fn add_to_watchlist(&mut self, movie: WatchlistMovie) -> bool {
        let added = self.library.add_to_watchlist(movie);
        if added {
            self.undo.clear();
        }
        added
    }

    pub fn remove_from_watchlist(&mut self, id: MovieId) -> Option<WatchlistMovie> {
        let removed = self.library.remove_from_watchlist(id);
        if removed.is_some() {
            self.undo.clear();
        }
        removed
    }

    /// Forgets comparison progress but keeps every rating
    pub fn reset_comparisons(&mut self) {
        self.sequencer = SequencerState::new();
        self.undo.clear();
    }
}

fn input(movie: &RatedMovie) -> RatingInput {
    RatingInput::new(movie.user_rating, movie.comparison_count)
}
