use crate::eligibility;
use crate::error::EngineError;
use crate::feedback;
use crate::models::{CompletionAward, Feedback, Session, UserStanding};
use crate::points;
use crate::session;

/// Completes a snapshot of `session` and works out what its creator earns.
///
/// Returns the completed session next to the award. Nothing is persisted;
/// the caller must write the status change and the award together, guarded
/// by a check that the stored session is not already completed.
pub fn plan_completion(
    session: &Session,
    feedback: &[Feedback],
    creator: &UserStanding,
) -> Result<(Session, CompletionAward), EngineError> {
    if creator.user_id != session.creator_id {
        return Err(EngineError::validation(
            "creator",
            format!(
                "standing for {} does not belong to session creator {}",
                creator.user_id, session.creator_id
            ),
        ));
    }

    let mut completed = session.clone();
    session::complete_session(&mut completed)?;

    let points = points::total_points(&completed, feedback);
    let new_total_points = creator.total_points + points.total;
    let badges = eligibility::awardable_badges(new_total_points, creator.badges.as_slice());
    let certificate = eligibility::issue_certificate(&completed, feedback);

    tracing::debug!(
        session_id = %session.id,
        user_id = %creator.user_id,
        points = points.total,
        new_badges = badges.len(),
        certificate = certificate.is_some(),
        "planned session completion"
    );

    let award = CompletionAward {
        session_id: completed.id,
        recipient_id: creator.user_id,
        points,
        summary: feedback::aggregate(feedback),
        new_total_points,
        badges,
        certificate,
    };
    Ok((completed, award))
}
