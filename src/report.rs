use std::fmt::Write;

use crate::eligibility;
use crate::feedback;
use crate::models::{CompletionAward, Feedback, IssuedCertificate, LeaderboardEntry, Session};
use crate::points;

pub fn build_report(
    session: &Session,
    feedback: &[Feedback],
    certificate: Option<&IssuedCertificate>,
) -> String {
    let summary = feedback::aggregate(feedback);
    let award = points::total_points(session, feedback);
    let eligibility = eligibility::certificate_eligibility(session, feedback);

    let mut output = String::new();
    let seats = session
        .max_seats
        .map(|max| max.to_string())
        .unwrap_or_else(|| "unlimited".to_string());

    let _ = writeln!(output, "# Session Report: {}", session.title);
    let _ = writeln!(
        output,
        "Scheduled for {} ({}), {} attendees of {} seats",
        session.scheduled_for,
        session.status,
        session.attendees.len(),
        seats
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Feedback");

    if summary.total_feedback == 0 {
        let _ = writeln!(output, "No feedback submitted yet.");
    } else {
        let _ = writeln!(
            output,
            "- {} responses, average rating {:.2}",
            summary.total_feedback, summary.average_rating
        );
        let _ = writeln!(
            output,
            "- Behavior: {} good, {} neutral, {} bad",
            summary.good_count, summary.neutral_count, summary.bad_count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Points");
    let _ = writeln!(
        output,
        "- Base {} + bonus {} = {}",
        award.base_points, award.bonus_points, award.total
    );
    if !session.status.is_terminal() {
        let _ = writeln!(output, "- Completing the session adds 1 more base point.");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Certificate");

    match (certificate, eligibility.certificate_type()) {
        (Some(issued), _) => {
            let _ = writeln!(
                output,
                "- {} issued on {} (average rating {:.2})",
                issued.certificate.certificate_type,
                issued.issued_at.date_naive(),
                issued.certificate.average_rating
            );
        }
        (None, Some(certificate_type)) => {
            let _ = writeln!(output, "- Qualifies for {certificate_type}.");
        }
        (None, None) => {
            let _ = writeln!(output, "- Not eligible for a certificate yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## What Students Learned");

    if feedback.is_empty() {
        let _ = writeln!(output, "No feedback submitted yet.");
    } else {
        for entry in feedback.iter().rev().take(5) {
            let _ = write!(
                output,
                "- ({}/5, {}) {}",
                entry.rating, entry.behavior, entry.learned
            );
            if let Some(comment) = &entry.comment {
                let _ = write!(output, " - \"{comment}\"");
            }
            let _ = writeln!(output);
        }
    }

    output
}

pub fn format_award(award: &CompletionAward) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Awarded {} points (base {}, bonus {}); creator now has {}.",
        award.points.total,
        award.points.base_points,
        award.points.bonus_points,
        award.new_total_points
    );
    for badge in &award.badges {
        let _ = writeln!(
            output,
            "- New badge: {} ({} points)",
            badge.name, badge.threshold_points
        );
    }
    match &award.certificate {
        Some(certificate) => {
            let _ = writeln!(
                output,
                "- Certificate: {} (average rating {:.2})",
                certificate.certificate_type, certificate.average_rating
            );
        }
        None => {
            let _ = writeln!(output, "- No certificate for this session.");
        }
    }
    output
}

pub fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut output = String::new();
    if entries.is_empty() {
        let _ = writeln!(output, "No users recorded yet.");
        return output;
    }

    let _ = writeln!(output, "Top helpers by points:");
    for (rank, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({}) {} points, {} badges",
            rank + 1,
            entry.full_name,
            entry.email,
            entry.total_points,
            entry.badge_count
        );
    }
    output
}
