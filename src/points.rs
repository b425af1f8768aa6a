use crate::feedback;
use crate::models::{Behavior, Feedback, PointsAward, Session, SessionStatus};

pub fn attendance_points(attendee_count: usize) -> i64 {
    match attendee_count {
        0 => 0,
        1 => 2,
        2 => 3,
        3 => 4,
        4 => 5,
        5 => 6,
        6 => 7,
        7 => 8,
        _ => 10,
    }
}

pub fn base_points(session: &Session) -> i64 {
    let completion = if session.status == SessionStatus::Completed {
        1
    } else {
        0
    };
    attendance_points(session.attendees.len()) + completion
}

pub fn bonus_points(feedback: &[Feedback]) -> i64 {
    if feedback.is_empty() {
        return 0;
    }

    let rating_bonus = if feedback::is_highly_rated(feedback) { 3 } else { 0 };
    let good_count = feedback
        .iter()
        .filter(|entry| entry.behavior == Behavior::Good)
        .count() as i64;

    rating_bonus + good_count
}

pub fn total_points(session: &Session, feedback: &[Feedback]) -> PointsAward {
    let base_points = base_points(session);
    let bonus_points = bonus_points(feedback);
    PointsAward {
        base_points,
        bonus_points,
        total: base_points + bonus_points,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{feedback, session};
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn attendance_follows_step_table() {
        let expected = [0, 2, 3, 4, 5, 6, 7, 8, 10, 10, 10];
        for (count, points) in expected.iter().enumerate() {
            assert_eq!(attendance_points(count), *points, "{count} attendees");
        }
        assert_eq!(attendance_points(250), 10);
    }

    #[test]
    fn completed_session_earns_extra_point() {
        assert_eq!(base_points(&session(5, SessionStatus::Completed)), 7);
        assert_eq!(base_points(&session(5, SessionStatus::Scheduled)), 6);
        assert_eq!(base_points(&session(0, SessionStatus::Completed)), 1);
    }

    #[test]
    fn empty_feedback_has_no_bonus() {
        assert_eq!(bonus_points(&[]), 0);
    }

    #[test]
    fn high_average_and_good_behavior_add_bonus() {
        let entries = vec![feedback(5, Behavior::Good), feedback(4, Behavior::Good)];
        assert_eq!(bonus_points(&entries), 5);
    }

    #[test]
    fn average_below_threshold_only_counts_behavior() {
        let entries = vec![
            feedback(4, Behavior::Good),
            feedback(4, Behavior::Neutral),
            feedback(5, Behavior::Bad),
        ];
        assert_eq!(bonus_points(&entries), 1);
    }

    #[test]
    fn total_combines_base_and_bonus() {
        let award = total_points(
            &session(3, SessionStatus::Completed),
            &[feedback(5, Behavior::Good), feedback(5, Behavior::Neutral)],
        );
        assert_eq!(award.base_points, 5);
        assert_eq!(award.bonus_points, 4);
        assert_eq!(award.total, 9);
    }

    proptest! {
        #[test]
        fn attendance_points_never_decrease(count in 0usize..64) {
            prop_assert!(attendance_points(count) <= attendance_points(count + 1));
        }

        #[test]
        fn bonus_is_bounded_by_feedback_count(ratings in prop::collection::vec(1i32..=5, 0..20)) {
            let entries: Vec<_> = ratings
                .iter()
                .map(|rating| feedback(*rating, Behavior::Good))
                .collect();
            let bonus = bonus_points(&entries);
            prop_assert!(bonus >= entries.len() as i64);
            prop_assert!(bonus <= entries.len() as i64 + 3);
        }
    }
}
