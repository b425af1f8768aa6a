use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Ongoing => "ongoing",
            SessionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "scheduled" => Ok(SessionStatus::Scheduled),
            "ongoing" => Ok(SessionStatus::Ongoing),
            "completed" => Ok(SessionStatus::Completed),
            other => anyhow::bail!("unknown session status `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Good,
    Neutral,
    Bad,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Good => "good",
            Behavior::Neutral => "neutral",
            Behavior::Bad => "bad",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "good" => Ok(Behavior::Good),
            "neutral" => Ok(Behavior::Neutral),
            "bad" => Ok(Behavior::Bad),
            _ => anyhow::bail!("unknown behavior `{value}` (expected good, neutral or bad)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificateType {
    PeerMentor,
    OutstandingHelper,
}

impl CertificateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateType::PeerMentor => "peer-mentor",
            CertificateType::OutstandingHelper => "outstanding-helper",
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "peer-mentor" => Ok(CertificateType::PeerMentor),
            "outstanding-helper" => Ok(CertificateType::OutstandingHelper),
            other => anyhow::bail!("unknown certificate type `{other}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub status: SessionStatus,
    pub attendees: Vec<Uuid>,
    pub max_seats: Option<usize>,
    pub creator_id: Uuid,
    pub scheduled_for: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub rating: i32,
    pub behavior: Behavior,
    pub learned: String,
    pub comment: Option<String>,
}

/// Points earned by a session creator; recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointsAward {
    pub base_points: i64,
    pub bonus_points: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub name: &'static str,
    pub threshold_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certificate {
    pub certificate_type: CertificateType,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FeedbackSummary {
    pub average_rating: f64,
    pub total_feedback: usize,
    pub good_count: usize,
    pub neutral_count: usize,
    pub bad_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CertificateEligibility {
    pub peer_mentor: bool,
    pub outstanding_helper: bool,
}

impl CertificateEligibility {
    pub fn certificate_type(&self) -> Option<CertificateType> {
        if self.outstanding_helper {
            Some(CertificateType::OutstandingHelper)
        } else if self.peer_mentor {
            Some(CertificateType::PeerMentor)
        } else {
            None
        }
    }
}

/// Cumulative points and held badge names for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStanding {
    pub user_id: Uuid,
    pub total_points: i64,
    pub badges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionAward {
    pub session_id: Uuid,
    pub recipient_id: Uuid,
    pub points: PointsAward,
    pub summary: FeedbackSummary,
    pub new_total_points: i64,
    pub badges: Vec<Badge>,
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub full_name: String,
    pub email: String,
    pub total_points: i64,
    pub badge_count: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_status_spellings_agree() {
        for (status, wire) in [
            (SessionStatus::Scheduled, "scheduled"),
            (SessionStatus::Ongoing, "ongoing"),
            (SessionStatus::Completed, "completed"),
        ] {
            assert_eq!(status.as_str(), wire);
            assert_eq!(status.to_string(), wire);
            assert_eq!(wire.parse::<SessionStatus>().unwrap(), status);
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{wire}\""));
            let decoded: SessionStatus = serde_json::from_str(&format!("\"{wire}\"")).unwrap();
            assert_eq!(decoded, status);
        }
        assert!("archived".parse::<SessionStatus>().is_err());
        assert_eq!(SessionStatus::default(), SessionStatus::Scheduled);
    }

    #[test]
    fn behavior_spellings_agree() {
        for (behavior, wire) in [
            (Behavior::Good, "good"),
            (Behavior::Neutral, "neutral"),
            (Behavior::Bad, "bad"),
        ] {
            assert_eq!(behavior.as_str(), wire);
            assert_eq!(wire.parse::<Behavior>().unwrap(), behavior);
            assert_eq!(serde_json::to_string(&behavior).unwrap(), format!("\"{wire}\""));
            let decoded: Behavior = serde_json::from_str(&format!("\"{wire}\"")).unwrap();
            assert_eq!(decoded, behavior);
        }
        assert_eq!("Good".parse::<Behavior>().unwrap(), Behavior::Good);
        assert_eq!("NEUTRAL".parse::<Behavior>().unwrap(), Behavior::Neutral);
        assert!("great".parse::<Behavior>().is_err());
    }

    #[test]
    fn certificate_type_spellings_agree() {
        for (certificate_type, wire) in [
            (CertificateType::PeerMentor, "peer-mentor"),
            (CertificateType::OutstandingHelper, "outstanding-helper"),
        ] {
            assert_eq!(certificate_type.as_str(), wire);
            assert_eq!(wire.parse::<CertificateType>().unwrap(), certificate_type);
            assert_eq!(
                serde_json::to_string(&certificate_type).unwrap(),
                format!("\"{wire}\"")
            );
            let decoded: CertificateType = serde_json::from_str(&format!("\"{wire}\"")).unwrap();
            assert_eq!(decoded, certificate_type);
        }
        assert!("peer_mentor".parse::<CertificateType>().is_err());
    }

    #[test]
    fn stored_spellings_match_schema_checks() {
        let schema = include_str!("../migrations/0001_peer_learning.sql");
        let statuses = [
            SessionStatus::Scheduled,
            SessionStatus::Ongoing,
            SessionStatus::Completed,
        ];
        for status in statuses {
            assert!(schema.contains(&format!("'{}'", status.as_str())));
        }
        for behavior in [Behavior::Good, Behavior::Neutral, Behavior::Bad] {
            assert!(schema.contains(&format!("'{}'", behavior.as_str())));
        }
        for certificate_type in [CertificateType::PeerMentor, CertificateType::OutstandingHelper] {
            assert!(schema.contains(&format!("'{}'", certificate_type.as_str())));
        }
    }
}
