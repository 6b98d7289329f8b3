//! Score validation against a race-to target.

use super::errors::ScoreError;

/// Check that `(score1, score2)` is a finished race to `race_to`.
///
/// Exactly one side must equal `race_to`, the other must be strictly lower,
/// and neither may be negative.
///
/// # Errors
///
/// * `ScoreError::NonPositiveRaceTo` - Target is zero or negative
/// * `ScoreError::NegativeScore` - Either side is below zero
/// * `ScoreError::ExceedsTarget` - Either side is above the target
/// * `ScoreError::BothReachedTarget` - Both sides equal the target
/// * `ScoreError::NoWinner` - Neither side reached the target
pub fn validate_score(score1: i32, score2: i32, race_to: i32) -> Result<(), ScoreError> {
    if race_to <= 0 {
        return Err(ScoreError::NonPositiveRaceTo(race_to));
    }

    if score1 < 0 || score2 < 0 {
        return Err(ScoreError::NegativeScore { score1, score2 });
    }

    if let Some(score) = [score1, score2].into_iter().find(|s| *s > race_to) {
        return Err(ScoreError::ExceedsTarget { score, race_to });
    }

    match (score1 == race_to, score2 == race_to) {
        (true, true) => Err(ScoreError::BothReachedTarget { race_to }),
        (false, false) => Err(ScoreError::NoWinner {
            score1,
            score2,
            race_to,
        }),
        _ => Ok(()),
    }
}

/// Boolean form of [`validate_score`]
pub fn is_valid_score(score1: i32, score2: i32, race_to: i32) -> bool {
    validate_score(score1, score2, race_to).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_races() {
        assert!(is_valid_score(5, 0, 5));
        assert!(is_valid_score(4, 5, 5));
        assert!(is_valid_score(1, 0, 1));
    }

    #[test]
    fn test_rejections_name_the_rule() {
        assert_eq!(
            validate_score(5, 5, 5),
            Err(ScoreError::BothReachedTarget { race_to: 5 })
        );
        assert_eq!(
            validate_score(4, 3, 5),
            Err(ScoreError::NoWinner {
                score1: 4,
                score2: 3,
                race_to: 5
            })
        );
        assert_eq!(
            validate_score(6, 2, 5),
            Err(ScoreError::ExceedsTarget {
                score: 6,
                race_to: 5
            })
        );
        assert_eq!(
            validate_score(5, -1, 5),
            Err(ScoreError::NegativeScore {
                score1: 5,
                score2: -1
            })
        );
        assert_eq!(validate_score(0, 0, 0), Err(ScoreError::NonPositiveRaceTo(0)));
    }
}
