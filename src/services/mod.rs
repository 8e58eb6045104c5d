//! The rating engine: title matching, taste modelling, relevance ranking,
//! rating updates, and the comparison flow built on them.

pub mod preference;
pub mod providers;
pub mod ranking;
pub mod rating;
pub mod recommendations;
pub mod search;
pub mod sequencer;
pub mod session;
pub mod similarity;
pub mod undo;
pub mod wildcard;

pub use preference::{top_genres, GenreInsight, PreferenceProfile};
pub use providers::{MovieCatalog, TmdbCatalog};
pub use ranking::{suggest_from_watchlist, RankedMovie, RankingWeights, RelevanceRanker, WatchlistSuggestion};
pub use rating::{adjust, tough_choice, RatingAdjustment, RatingInput, TieKind};
pub use recommendations::{DiscoverRecommender, RecommendationRequest, RecommendationSource};
pub use search::MovieSearcher;
pub use sequencer::{Candidate, ComparisonRound, ComparisonSequencer, RoundKind, RoundSelection};
pub use session::WildcardSession;
pub use similarity::similarity;
pub use undo::UndoSlot;
pub use wildcard::{Outcome, RatingChange, RecordedOutcome, WildcardState};
