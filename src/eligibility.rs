use crate::feedback;
use crate::models::{
    Badge, Certificate, CertificateEligibility, Feedback, Session, SessionStatus,
};

/// Badge ladder, lowest threshold first.
pub const BADGE_THRESHOLDS: [Badge; 4] = [
    Badge {
        name: "Beginner Helper",
        threshold_points: 5,
    },
    Badge {
        name: "Peer Mentor",
        threshold_points: 20,
    },
    Badge {
        name: "Super Helper",
        threshold_points: 50,
    },
    Badge {
        name: "Champion Mentor",
        threshold_points: 100,
    },
];

/// Badges reached by `total_points` that the user does not hold yet.
pub fn awardable_badges<S: AsRef<str>>(total_points: i64, held: &[S]) -> Vec<Badge> {
    BADGE_THRESHOLDS
        .iter()
        .filter(|badge| badge.threshold_points <= total_points)
        .filter(|badge| !held.iter().any(|name| name.as_ref() == badge.name))
        .copied()
        .collect()
}

pub fn certificate_eligibility(session: &Session, feedback: &[Feedback]) -> CertificateEligibility {
    let summary = feedback::aggregate(feedback);
    CertificateEligibility {
        peer_mentor: session.status == SessionStatus::Completed && !session.attendees.is_empty(),
        outstanding_helper: feedback::is_highly_rated(feedback)
            && summary.good_count > summary.bad_count,
    }
}

/// Certificate for the session creator, if the session qualifies for one.
pub fn issue_certificate(session: &Session, feedback: &[Feedback]) -> Option<Certificate> {
    let certificate_type = certificate_eligibility(session, feedback).certificate_type()?;
    Some(Certificate {
        certificate_type,
        user_id: session.creator_id,
        session_id: session.id,
        average_rating: feedback::aggregate(feedback).average_rating,
    })
}
