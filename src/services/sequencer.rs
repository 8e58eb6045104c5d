//! Comparison pair selection.
//!
//! Picking a pair is split in two: [`ComparisonSequencer::plan`] makes every
//! random choice synchronously against the current library and state, and
//! [`ComparisonSequencer::resolve`] performs the single asynchronous step of
//! fetching the candidate from the catalog or the recommendation source.
//! Nothing here mutates state; applying a selection is up to the caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use super::providers::MovieCatalog;
use super::recommendations::{RecommendationRequest, RecommendationSource};
use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BaselineList, BaselineMovie, CatalogMovie, GenreId, MovieId, MovieLibrary, RatedMovie,
    SequencerState,
};

/// Rated movies required before any round can be played
pub const MIN_SEEN_MOVIES: usize = 3;
/// Rated movies required for known-vs-known rounds
pub const MIN_KNOWN_VS_KNOWN: usize = 5;
/// Rated movies in the filtered genre required for a known-vs-unknown round
pub const MIN_GENRE_MATCHES: usize = 2;
/// Percentage of the baseline list left when the baseline phase ends
pub const BASELINE_REMAINING_PERCENT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundKind {
    BaselineUnknown,
    RecommendedUnknown,
    KnownVsKnown,
}

/// The second movie of a round
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Known(RatedMovie),
    Unknown(CatalogMovie),
}

impl Candidate {
    pub fn id(&self) -> MovieId {
        match self {
            Candidate::Known(movie) => movie.id,
            Candidate::Unknown(movie) => movie.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Candidate::Known(movie) => &movie.title,
            Candidate::Unknown(movie) => &movie.title,
        }
    }

    /// Rated view of the candidate; unknown movies start at the catalog score
    pub fn as_rated(&self) -> RatedMovie {
        match self {
            Candidate::Known(movie) => movie.clone(),
            Candidate::Unknown(movie) => RatedMovie::provisional(movie),
        }
    }
}

/// A pair presented to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRound {
    pub known: RatedMovie,
    pub candidate: Candidate,
    pub kind: RoundKind,
}

impl ComparisonRound {
    /// Whether the round puts a not-yet-rated candidate in front of the user
    pub fn consumes_candidate(&self) -> bool {
        self.kind != RoundKind::KnownVsKnown
    }
}

/// Random choices made for the next round, before any fetch
#[derive(Debug, Clone, PartialEq)]
pub enum RoundPlan {
    /// Both movies come from the library
    Ready(ComparisonRound),
    Baseline {
        known: RatedMovie,
        entry: BaselineMovie,
        /// Tried once if fetching `entry` fails
        alternate: Option<BaselineMovie>,
        completes_baseline: bool,
    },
    Recommended {
        known: RatedMovie,
        request: RecommendationRequest,
        completes_baseline: bool,
    },
}

impl RoundPlan {
    pub fn known(&self) -> &RatedMovie {
        match self {
            RoundPlan::Ready(round) => &round.known,
            RoundPlan::Baseline { known, .. } | RoundPlan::Recommended { known, .. } => known,
        }
    }
}

/// A resolved round and whether it ends the baseline phase
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSelection {
    pub round: ComparisonRound,
    pub baseline_completed: bool,
}

pub struct ComparisonSequencer {
    baseline: Arc<BaselineList>,
    catalog: Arc<dyn MovieCatalog>,
    recommender: Arc<dyn RecommendationSource>,
    min_score: f64,
    min_vote_count: u64,
}

impl ComparisonSequencer {
    pub fn new(
        baseline: Arc<BaselineList>,
        catalog: Arc<dyn MovieCatalog>,
        recommender: Arc<dyn RecommendationSource>,
    ) -> Self {
        Self {
            baseline,
            catalog,
            recommender,
            min_score: 7.0,
            min_vote_count: 500,
        }
    }

    /// Recommendation thresholds from configuration
    pub fn from_config(
        baseline: Arc<BaselineList>,
        catalog: Arc<dyn MovieCatalog>,
        recommender: Arc<dyn RecommendationSource>,
        config: &Config,
    ) -> Self {
        Self::new(baseline, catalog, recommender)
            .with_thresholds(config.min_recommendation_score, config.min_vote_count)
    }

    /// Quality thresholds passed to the recommendation source
    pub fn with_thresholds(mut self, min_score: f64, min_vote_count: u64) -> Self {
        self.min_score = min_score;
        self.min_vote_count = min_vote_count;
        self
    }

    pub fn baseline(&self) -> &BaselineList {
        &self.baseline
    }

    /// Chooses the round kind and both movies, short of fetching an unknown
    /// candidate
    pub fn plan<R: Rng + ?Sized>(
        &self,
        library: &MovieLibrary,
        state: &SequencerState,
        genre_filter: Option<GenreId>,
        rng: &mut R,
    ) -> EngineResult<RoundPlan> {
        let seen = library.rated_len();
        if seen < MIN_SEEN_MOVIES {
            return Err(EngineError::InsufficientData { found: seen });
        }

        if state.is_known_vs_known_turn() && seen >= MIN_KNOWN_VS_KNOWN {
            return self.plan_known_vs_known(library, genre_filter, rng);
        }

        let eligible = eligible_known(library, genre_filter, MIN_GENRE_MATCHES)?;
        let known = eligible
            .choose(rng)
            .map(|movie| (*movie).clone())
            .ok_or(EngineError::InsufficientData { found: 0 })?;

        if state.baseline_complete {
            return Ok(RoundPlan::Recommended {
                request: self.recommendation_request(library, state, genre_filter, &known),
                known,
                completes_baseline: false,
            });
        }

        let remaining: Vec<&BaselineMovie> = self
            .baseline
            .movies()
            .iter()
            .filter(|m| !state.is_consumed(m.id) && !library.is_rated(m.id))
            .collect();

        let threshold = self.baseline.len() * BASELINE_REMAINING_PERCENT / 100;
        let completes_baseline = remaining.len() <= threshold;

        let usable: Vec<&BaselineMovie> = remaining
            .iter()
            .copied()
            .filter(|m| m.id != known.id)
            .collect();

        let Some(entry) = usable.choose(rng).map(|m| (*m).clone()) else {
            tracing::info!(
                remaining = remaining.len(),
                "Baseline pool exhausted, switching to recommendations"
            );
            return Ok(RoundPlan::Recommended {
                request: self.recommendation_request(library, state, genre_filter, &known),
                known,
                completes_baseline: true,
            });
        };

        let alternate = usable
            .iter()
            .filter(|m| m.id != entry.id)
            .choose(rng)
            .map(|m| (*m).clone());

        tracing::debug!(
            known = known.id,
            baseline = entry.id,
            title = %entry.title,
            remaining = remaining.len(),
            "Planned baseline round"
        );

        Ok(RoundPlan::Baseline {
            known,
            entry,
            alternate,
            completes_baseline,
        })
    }

    fn plan_known_vs_known<R: Rng + ?Sized>(
        &self,
        library: &MovieLibrary,
        genre_filter: Option<GenreId>,
        rng: &mut R,
    ) -> EngineResult<RoundPlan> {
        let eligible = eligible_known(library, genre_filter, MIN_KNOWN_VS_KNOWN)?;

        let mut pair = eligible.choose_multiple(rng, 2);
        let (Some(first), Some(second)) = (pair.next(), pair.next()) else {
            return Err(EngineError::DuplicateCandidate);
        };

        // Library entries are keyed by id, so this only trips on a corrupt library
        if first.id == second.id {
            return Err(EngineError::DuplicateCandidate);
        }

        tracing::debug!(first = first.id, second = second.id, "Planned known-vs-known round");

        Ok(RoundPlan::Ready(ComparisonRound {
            known: (*first).clone(),
            candidate: Candidate::Known((*second).clone()),
            kind: RoundKind::KnownVsKnown,
        }))
    }

    fn recommendation_request(
        &self,
        library: &MovieLibrary,
        state: &SequencerState,
        genre_filter: Option<GenreId>,
        known: &RatedMovie,
    ) -> RecommendationRequest {
        let mut excluded_ids: BTreeSet<MovieId> = library.rated_ids().collect();
        excluded_ids.extend(library.watchlist_ids());
        excluded_ids.extend(state.compared_ids.iter().copied());
        excluded_ids.extend(state.skipped_ids.iter().copied());
        excluded_ids.insert(known.id);

        RecommendationRequest {
            history: library.history(),
            excluded_ids,
            genre_filter,
            min_score: self.min_score,
            min_vote_count: self.min_vote_count,
        }
    }

    /// Fetches the candidate a plan calls for
    pub async fn resolve(&self, plan: RoundPlan) -> EngineResult<RoundSelection> {
        match plan {
            RoundPlan::Ready(round) => Ok(RoundSelection {
                round,
                baseline_completed: false,
            }),
            RoundPlan::Baseline {
                known,
                entry,
                alternate,
                completes_baseline,
            } => {
                let movie = match self.catalog.get_by_id(entry.id).await {
                    Ok(movie) => movie,
                    Err(e) => {
                        let Some(alternate) = alternate else {
                            return Err(e);
                        };
                        tracing::warn!(
                            movie_id = entry.id,
                            alternate_id = alternate.id,
                            error = %e,
                            "Baseline fetch failed, trying alternate"
                        );
                        self.catalog.get_by_id(alternate.id).await?
                    }
                };

                if movie.id == known.id {
                    return Err(EngineError::DuplicateCandidate);
                }

                Ok(RoundSelection {
                    round: ComparisonRound {
                        known,
                        candidate: Candidate::Unknown(movie),
                        kind: RoundKind::BaselineUnknown,
                    },
                    baseline_completed: completes_baseline,
                })
            }
            RoundPlan::Recommended {
                known,
                mut request,
                completes_baseline,
            } => {
                let mut movie = self.recommender.recommend(&request).await?;
                if movie.id == known.id {
                    tracing::warn!(movie_id = movie.id, "Recommendation matched the known movie, retrying");
                    request.excluded_ids.insert(movie.id);
                    movie = self.recommender.recommend(&request).await?;
                    if movie.id == known.id {
                        return Err(EngineError::DuplicateCandidate);
                    }
                }

                Ok(RoundSelection {
                    round: ComparisonRound {
                        known,
                        candidate: Candidate::Unknown(movie),
                        kind: RoundKind::RecommendedUnknown,
                    },
                    baseline_completed: completes_baseline,
                })
            }
        }
    }

    /// Plans and resolves in one step
    pub async fn next_round<R: Rng + Send + ?Sized>(
        &self,
        library: &MovieLibrary,
        state: &SequencerState,
        genre_filter: Option<GenreId>,
        rng: &mut R,
    ) -> EngineResult<RoundSelection> {
        let plan = self.plan(library, state, genre_filter, rng)?;
        self.resolve(plan).await
    }
}

/// Rated movies eligible as the known side, honoring the genre filter
fn eligible_known(
    library: &MovieLibrary,
    genre_filter: Option<GenreId>,
    required: usize,
) -> EngineResult<Vec<&RatedMovie>> {
    let eligible: Vec<&RatedMovie> = library
        .rated()
        .filter(|m| genre_filter.map_or(true, |g| m.has_genre(g)))
        .collect();

    match genre_filter {
        Some(genre) if eligible.len() < required => Err(EngineError::InsufficientGenreData {
            genre,
            required,
            found: eligible.len(),
        }),
        _ => Ok(eligible),
    }
}
