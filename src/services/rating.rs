//! Pairwise rating updates.
//!
//! Two distinct algorithms live here. [`adjust`] is an Elo-style update
//! rescaled to the 1-10 rating domain, used when the user picks a winner.
//! [`tough_choice`] handles "too close to call": both ratings collapse
//! towards their mean with a small nudge that keeps them distinct.
//!
//! Both are pure. Incrementing comparison counts is left to the caller.

use crate::error::EngineResult;
use crate::models::movie::{validate_rating, MAX_RATING, MIN_RATING};
use crate::models::round_to_tenth;

/// Largest rating change a single comparison can cause
pub const MAX_RATING_CHANGE: f64 = 0.7;

/// Smallest rating change a decided comparison causes
pub const MIN_RATING_CHANGE: f64 = 0.1;

/// Multiplier for the winner's change when the lower-rated movie wins
pub const UPSET_BONUS: f64 = 1.2;

/// Logistic scale for the 1-10 domain
const RATING_SCALE: f64 = 4.0;

/// A movie's side of a comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingInput {
    pub rating: f64,
    pub comparison_count: u32,
}

impl RatingInput {
    pub fn new(rating: f64, comparison_count: u32) -> Self {
        Self {
            rating,
            comparison_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAdjustment {
    pub winner_rating: f64,
    pub loser_rating: f64,
}

/// Movies with fewer comparisons move faster
pub fn k_factor(comparison_count: u32) -> f64 {
    match comparison_count {
        0..=4 => 20.0,
        5..=9 => 15.0,
        10..=19 => 10.0,
        _ => 5.0,
    }
}

pub fn expected_win_probability(winner_rating: f64, loser_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((loser_rating - winner_rating) / RATING_SCALE))
}

/// New ratings after `winner` beat `loser`, each rounded to one decimal
pub fn adjust(winner: RatingInput, loser: RatingInput) -> EngineResult<RatingAdjustment> {
    let winner_rating = validate_rating(winner.rating)?;
    let loser_rating = validate_rating(loser.rating)?;

    let surprise = 1.0 - expected_win_probability(winner_rating, loser_rating);

    let mut winner_delta = (k_factor(winner.comparison_count) * surprise).max(MIN_RATING_CHANGE);
    let loser_delta = (k_factor(loser.comparison_count) * surprise).max(MIN_RATING_CHANGE);

    if winner_rating < loser_rating {
        winner_delta *= UPSET_BONUS;
    }

    let winner_delta = winner_delta.min(MAX_RATING_CHANGE);
    let loser_delta = loser_delta.min(MAX_RATING_CHANGE);

    Ok(RatingAdjustment {
        winner_rating: round_to_tenth((winner_rating + winner_delta).clamp(MIN_RATING, MAX_RATING)),
        loser_rating: round_to_tenth((loser_rating - loser_delta).clamp(MIN_RATING, MAX_RATING)),
    })
}

/// Which movies met in a round that ended without a winner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieKind {
    /// Two rated movies. The round's known movie keeps the higher rating.
    KnownVsKnown,
    /// A rated movie against a candidate. The lower-rated side is lifted.
    KnownVsUnknown,
}

const KNOWN_TIE_NUDGE: f64 = 0.05;
const UNKNOWN_TIE_NUDGE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TieAdjustment {
    pub known_rating: f64,
    pub candidate_rating: f64,
}

/// Pulls both ratings to their mean, then nudges them apart. Results are
/// clamped to the rating range but not rounded.
pub fn tough_choice(known: f64, candidate: f64, kind: TieKind) -> EngineResult<TieAdjustment> {
    let known = validate_rating(known)?;
    let candidate = validate_rating(candidate)?;
    let mean = (known + candidate) / 2.0;

    let known_nudge = match kind {
        TieKind::KnownVsKnown => KNOWN_TIE_NUDGE,
        TieKind::KnownVsUnknown if known <= candidate => UNKNOWN_TIE_NUDGE,
        TieKind::KnownVsUnknown => -UNKNOWN_TIE_NUDGE,
    };

    Ok(TieAdjustment {
        known_rating: (mean + known_nudge).clamp(MIN_RATING, MAX_RATING),
        candidate_rating: (mean - known_nudge).clamp(MIN_RATING, MAX_RATING),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_k_factor_tiers() {
        assert_eq!(k_factor(0), 20.0);
        assert_eq!(k_factor(4), 20.0);
        assert_eq!(k_factor(5), 15.0);
        assert_eq!(k_factor(19), 10.0);
        assert_eq!(k_factor(20), 5.0);
        assert_eq!(k_factor(250), 5.0);
    }

    #[test]
    fn test_expected_probability_is_symmetric() {
        let p = expected_win_probability(8.0, 6.0);
        assert!((p - 1.0 / (1.0 + 10f64.powf(-0.5))).abs() < 1e-12);
        assert!((p + expected_win_probability(6.0, 8.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_favorite_wins_capped() {
        // E ≈ 0.7597, so both raw deltas exceed the cap
        let result = adjust(RatingInput::new(8.0, 0), RatingInput::new(6.0, 3)).unwrap();
        assert_eq!(result.winner_rating, 8.7);
        assert_eq!(result.loser_rating, 5.3);
    }

    #[test]
    fn test_upset_capped() {
        let result = adjust(RatingInput::new(5.0, 30), RatingInput::new(6.0, 30)).unwrap();
        // 5 * (1 - E) ≈ 3.20 then * 1.2, capped at 0.7
        assert_eq!(result.winner_rating, 5.7);
        assert_eq!(result.loser_rating, 5.3);
    }

    #[test]
    fn test_extremes_stay_in_range() {
        let result = adjust(RatingInput::new(10.0, 0), RatingInput::new(1.0, 0)).unwrap();
        assert_eq!(result.winner_rating, 10.0);
        assert_eq!(result.loser_rating, 1.0);

        let result = adjust(RatingInput::new(1.0, 50), RatingInput::new(10.0, 50)).unwrap();
        assert_eq!(result.winner_rating, 1.7);
        assert_eq!(result.loser_rating, 9.3);
    }

    #[test]
    fn test_k_factor_monotonicity() {
        // E ≈ 0.9825: K=20 gives ≈0.35, K=5 falls to the 0.1 floor
        let fresh = adjust(RatingInput::new(9.0, 2), RatingInput::new(2.0, 2)).unwrap();
        let veteran = adjust(RatingInput::new(9.0, 25), RatingInput::new(2.0, 25)).unwrap();

        assert_eq!(fresh.winner_rating, 9.3);
        assert_eq!(veteran.winner_rating, 9.1);
        assert!(fresh.winner_rating - 9.0 > veteran.winner_rating - 9.0);
        assert!(2.0 - fresh.loser_rating > 2.0 - veteran.loser_rating);
    }

    #[test]
    fn test_winner_never_decreases() {
        let steps: Vec<f64> = (10..=100).map(|r| r as f64 / 10.0).collect();
        for &w in &steps {
            for &l in steps.iter().step_by(7) {
                for count in [0, 7, 15, 40] {
                    let result = adjust(RatingInput::new(w, count), RatingInput::new(l, count)).unwrap();
                    assert!(result.winner_rating >= w - 0.01, "winner {} vs {}", w, l);
                    assert!(result.loser_rating <= l + 0.01, "loser {} vs {}", w, l);
                    assert!((1.0..=10.0).contains(&result.winner_rating));
                    assert!((1.0..=10.0).contains(&result.loser_rating));
                }
            }
        }
    }

    #[test]
    fn test_invalid_ratings_rejected() {
        assert!(matches!(
            adjust(RatingInput::new(11.0, 0), RatingInput::new(5.0, 0)),
            Err(EngineError::InvalidRating(r)) if r == 11.0
        ));
        assert!(matches!(
            tough_choice(5.0, 0.0, TieKind::KnownVsUnknown),
            Err(EngineError::InvalidRating(_))
        ));
    }

    #[test]
    fn test_tough_choice_known_vs_known() {
        let result = tough_choice(6.0, 8.0, TieKind::KnownVsKnown).unwrap();
        assert!((result.known_rating - 7.05).abs() < 1e-9);
        assert!((result.candidate_rating - 6.95).abs() < 1e-9);
    }

    #[test]
    fn test_tough_choice_lifts_lower_rated_side() {
        let result = tough_choice(6.0, 8.0, TieKind::KnownVsUnknown).unwrap();
        assert!((result.known_rating - 7.1).abs() < 1e-9);
        assert!((result.candidate_rating - 6.9).abs() < 1e-9);

        let result = tough_choice(9.0, 7.0, TieKind::KnownVsUnknown).unwrap();
        assert!((result.known_rating - 7.9).abs() < 1e-9);
        assert!((result.candidate_rating - 8.1).abs() < 1e-9);
    }

    #[test]
    fn test_tough_choice_clamps() {
        let result = tough_choice(10.0, 10.0, TieKind::KnownVsUnknown).unwrap();
        assert_eq!(result.known_rating, 10.0);
        assert!((result.candidate_rating - 9.9).abs() < 1e-9);
    }
}
