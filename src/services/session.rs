use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::RwLock;

use super::sequencer::{ComparisonRound, ComparisonSequencer, RoundSelection};
use super::wildcard::{Outcome, RecordedOutcome, WildcardState};
use crate::db::SequencerStore;
use crate::error::{EngineError, EngineResult};
use crate::models::{CatalogMovie, GenreId, MovieId, MovieLibrary, RatedMovie, SequencerState, WatchlistMovie};

struct SessionState {
    wildcard: WildcardState,
    current_round: Option<ComparisonRound>,
    genre_filter: Option<GenreId>,
}

/// A user's comparison session.
///
/// All mutations go through one lock that is never held across an await.
/// The only suspension point is the candidate fetch in [`next_round`], and
/// a newer request supersedes an older in-flight one: the older call
/// returns [`EngineError::Superseded`] and its result is dropped. Sequencer
/// state and the library are persisted fire-and-forget after every change.
///
/// [`next_round`]: WildcardSession::next_round
pub struct WildcardSession {
    sequencer: ComparisonSequencer,
    store: SequencerStore,
    state: RwLock<SessionState>,
    generation: AtomicU64,
    rng: Mutex<StdRng>,
}

impl WildcardSession {
    /// Restores the persisted library and sequencer progress
    pub async fn open(sequencer: ComparisonSequencer, store: SequencerStore) -> EngineResult<Self> {
        let library = store.load_library().await?;
        let sequencer_state = store.load().await?;
        Ok(Self::with_state(sequencer, store, library, sequencer_state))
    }

    pub fn with_state(
        sequencer: ComparisonSequencer,
        store: SequencerStore,
        library: MovieLibrary,
        sequencer_state: SequencerState,
    ) -> Self {
        Self {
            sequencer,
            store,
            state: RwLock::new(SessionState {
                wildcard: WildcardState::new(library, sequencer_state),
                current_round: None,
                genre_filter: None,
            }),
            generation: AtomicU64::new(0),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeds the random source, for reproducible sessions
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Selects and presents the next pair. The presented round is cleared
    /// while loading, so outcomes cannot be recorded against a stale pair.
    pub async fn next_round(&self) -> EngineResult<RoundSelection> {
        let generation = self.bump_generation();

        let plan = {
            let mut state = self.state.write().await;
            state.current_round = None;
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.sequencer.plan(
                state.wildcard.library(),
                state.wildcard.sequencer_state(),
                state.genre_filter,
                &mut *rng,
            )?
        };

        let resolved = self.sequencer.resolve(plan).await;

        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            tracing::debug!(generation, "Discarding superseded round");
            return Err(EngineError::Superseded);
        }
        let selection = resolved?;

        if state.wildcard.apply_selection(&selection) {
            self.store.persist(state.wildcard.sequencer_state());
        }
        state.current_round = Some(selection.round.clone());

        Ok(selection)
    }

    /// Applies the user's answer to the presented round
    pub async fn record_outcome(&self, outcome: Outcome) -> EngineResult<RecordedOutcome> {
        let mut state = self.state.write().await;
        let round = state.current_round.clone().ok_or(EngineError::NoActiveRound)?;

        let recorded = state.wildcard.record_outcome(&round, outcome)?;
        state.current_round = None;
        self.store.persist(&recorded.state);
        self.store.persist_library(state.wildcard.library());

        Ok(recorded)
    }

    /// Reverses the last outcome and presents its round again. Any round
    /// still loading is superseded.
    pub async fn undo(&self) -> Option<ComparisonRound> {
        let mut state = self.state.write().await;
        let round = state.wildcard.undo()?;

        self.bump_generation();
        state.current_round = Some(round.clone());
        self.store.persist(state.wildcard.sequencer_state());
        self.store.persist_library(state.wildcard.library());

        Some(round)
    }

    /// Clears comparison progress, persisted keys included. Ratings stay.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        self.bump_generation();
        state.wildcard.reset_comparisons();
        state.current_round = None;
        self.store.clear();
        tracing::info!("Comparison progress reset");
    }

    pub async fn set_genre_filter(&self, genre: Option<GenreId>) {
        self.state.write().await.genre_filter = genre;
    }

    pub async fn genre_filter(&self) -> Option<GenreId> {
        self.state.read().await.genre_filter
    }

    pub async fn current_round(&self) -> Option<ComparisonRound> {
        self.state.read().await.current_round.clone()
    }

    pub async fn can_undo(&self) -> bool {
        self.state.read().await.wildcard.can_undo()
    }

    pub async fn library(&self) -> MovieLibrary {
        self.state.read().await.wildcard.library().clone()
    }

    pub async fn sequencer_state(&self) -> SequencerState {
        self.state.read().await.wildcard.sequencer_state().clone()
    }

    pub async fn rate_movie(&self, movie: &CatalogMovie, rating: f64) -> EngineResult<Option<RatedMovie>> {
        let mut state = self.state.write().await;
        let previous = state.wildcard.rate_movie(movie, rating)?;
        self.store.persist_library(state.wildcard.library());
        Ok(previous)
    }

    pub async fn add_to_watchlist(&self, movie: WatchlistMovie) -> bool {
        let mut state = self.state.write().await;
        let added = state.wildcard.add_to_watchlist(movie);
        if added {
            self.store.persist_library(state.wildcard.library());
        }
        added
    }

    pub async fn remove_from_watchlist(&self, id: MovieId) -> Option<WatchlistMovie> {
        let mut state = self.state.write().await;
        let removed = state.wildcard.remove_from_watchlist(id);
        if removed.is_some() {
            self.store.persist_library(state.wildcard.library());
        }
        removed
    }
}
