use crate::error::EngineError;
use crate::models::{Behavior, Feedback, FeedbackSummary};

/// Average rating at or above which feedback counts as outstanding.
pub const HIGH_RATING: f64 = 4.5;

/// Exact mean rating; `None` for an empty list.
pub fn mean_rating(feedback: &[Feedback]) -> Option<f64> {
    if feedback.is_empty() {
        return None;
    }
    let rating_sum: i64 = feedback.iter().map(|entry| i64::from(entry.rating)).sum();
    Some(rating_sum as f64 / feedback.len() as f64)
}

/// Exact mean compared against `HIGH_RATING`, before any display rounding.
pub fn is_highly_rated(feedback: &[Feedback]) -> bool {
    mean_rating(feedback).is_some_and(|mean| mean >= HIGH_RATING)
}

pub fn aggregate(feedback: &[Feedback]) -> FeedbackSummary {
    let mut summary = FeedbackSummary {
        total_feedback: feedback.len(),
        ..FeedbackSummary::default()
    };
    for entry in feedback {
        match entry.behavior {
            Behavior::Good => summary.good_count += 1,
            Behavior::Neutral => summary.neutral_count += 1,
            Behavior::Bad => summary.bad_count += 1,
        }
    }

    summary.average_rating = mean_rating(feedback).map(round_two).unwrap_or(0.0);
    summary
}

pub fn validate(feedback: &Feedback) -> Result<(), EngineError> {
    if !(1..=5).contains(&feedback.rating) {
        return Err(EngineError::validation(
            "rating",
            format!("{} is outside 1..=5", feedback.rating),
        ));
    }
    if feedback.learned.trim().is_empty() {
        return Err(EngineError::validation(
            "learned",
            "describe what was learned",
        ));
    }
    Ok(())
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
