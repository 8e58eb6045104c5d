use crate::models::GenreId;

/// Errors raised by the rating engine and its collaborators
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("At least 3 rated movies are required, found {found}")]
    InsufficientData { found: usize },

    #[error("Not enough rated movies in genre {genre}: need {required}, found {found}")]
    InsufficientGenreData {
        genre: GenreId,
        required: usize,
        found: usize,
    },

    #[error("Could not produce two distinct movies for a comparison")]
    DuplicateCandidate,

    #[error("No new movies found to compare")]
    NoCandidatesFound,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Rating {0} is outside the 1-10 range")]
    InvalidRating(f64),

    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Outcome not allowed: {0}")]
    IllegalOutcome(String),

    #[error("No comparison round is currently presented")]
    NoActiveRound,

    #[error("Round request was superseded by a newer one")]
    Superseded,
}

impl EngineError {
    /// Whether the presentation layer should offer a retry for this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Network(_)
                | EngineError::ExternalApi(_)
                | EngineError::NoCandidatesFound
                | EngineError::DuplicateCandidate
                | EngineError::Store(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_genre_message() {
        let err = EngineError::InsufficientGenreData {
            genre: 27,
            required: 5,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Not enough rated movies in genre 27: need 5, found 2"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(EngineError::NoCandidatesFound.is_retryable());
        assert!(EngineError::ExternalApi("503".to_string()).is_retryable());
        assert!(!EngineError::InvalidRating(11.0).is_retryable());
        assert!(!EngineError::InsufficientData { found: 2 }.is_retryable());
    }
}
