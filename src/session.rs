//! Session lifecycle and roster rules.
//!
//! Status only moves forward: `scheduled -> ongoing -> completed`, or
//! straight from `scheduled` to `completed`. Completion is terminal.

use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{Session, SessionStatus};

impl SessionStatus {
    pub fn can_transition_to(&self, target: &SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Scheduled, Ongoing) | (Scheduled, Completed) | (Ongoing, Completed)
        )
    }

    pub fn valid_transitions(&self) -> Vec<SessionStatus> {
        match self {
            SessionStatus::Scheduled => vec![SessionStatus::Ongoing, SessionStatus::Completed],
            SessionStatus::Ongoing => vec![SessionStatus::Completed],
            SessionStatus::Completed => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

pub fn transition(session: &mut Session, target: SessionStatus) -> Result<(), EngineError> {
    if !session.status.can_transition_to(&target) {
        return Err(EngineError::InvalidStateTransition {
            session_id: session.id,
            from: session.status,
            to: target,
        });
    }
    session.status = target;
    Ok(())
}

/// Marks the session completed. Does not award anything; see `award`.
pub fn complete_session(session: &mut Session) -> Result<(), EngineError> {
    transition(session, SessionStatus::Completed)
}

pub fn add_attendee(session: &mut Session, user_id: Uuid) -> Result<(), EngineError> {
    if session.attendees.contains(&user_id) {
        return Err(EngineError::AlreadyJoined {
            session_id: session.id,
            user_id,
        });
    }

    if let Some(max_seats) = session.max_seats {
        if session.attendees.len() >= max_seats && user_id != session.creator_id {
            return Err(EngineError::Capacity {
                session_id: session.id,
                max_seats,
            });
        }
    }

    session.attendees.push(user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::fixtures::session;
    use proptest::prelude::*;

    #[test]
    fn scheduled_session_completes() {
        let mut scheduled = session(2, SessionStatus::Scheduled);
        assert!(complete_session(&mut scheduled).is_ok());
        assert_eq!(scheduled.status, SessionStatus::Completed);
    }

    #[test]
    fn ongoing_session_completes() {
        let mut running = session(2, SessionStatus::Scheduled);
        transition(&mut running, SessionStatus::Ongoing).unwrap();
        complete_session(&mut running).unwrap();
        assert_eq!(running.status, SessionStatus::Completed);
    }

    #[test]
    fn completing_twice_is_rejected() {
        let mut completed = session(2, SessionStatus::Completed);
        let err = complete_session(&mut completed).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidStateTransition {
                session_id: completed.id,
                from: SessionStatus::Completed,
                to: SessionStatus::Completed,
            }
        );
    }

    #[test]
    fn status_never_moves_backwards() {
        let mut completed = session(1, SessionStatus::Completed);
        assert!(transition(&mut completed, SessionStatus::Scheduled).is_err());
        assert!(transition(&mut completed, SessionStatus::Ongoing).is_err());

        let mut running = session(1, SessionStatus::Ongoing);
        assert!(transition(&mut running, SessionStatus::Scheduled).is_err());
        assert_eq!(running.status, SessionStatus::Ongoing);
    }

    #[test]
    fn only_completed_is_terminal() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(!SessionStatus::Scheduled.is_terminal());
        assert!(!SessionStatus::Ongoing.is_terminal());
    }

    #[test]
    fn full_session_rejects_second_student() {
        let mut full = session(0, SessionStatus::Scheduled);
        full.max_seats = Some(1);
        add_attendee(&mut full, Uuid::new_v4()).unwrap();

        let err = add_attendee(&mut full, Uuid::new_v4()).unwrap_err();
        assert_eq!(
            err,
            EngineError::Capacity {
                session_id: full.id,
                max_seats: 1,
            }
        );
        assert_eq!(full.attendees.len(), 1);
    }

    #[test]
    fn creator_can_join_full_session() {
        let mut full = session(0, SessionStatus::Scheduled);
        full.max_seats = Some(1);
        add_attendee(&mut full, Uuid::new_v4()).unwrap();

        let creator = full.creator_id;
        add_attendee(&mut full, creator).unwrap();
        assert_eq!(full.attendees.last(), Some(&creator));
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let mut open = session(0, SessionStatus::Scheduled);
        let student = Uuid::new_v4();
        add_attendee(&mut open, student).unwrap();
        assert_eq!(
            add_attendee(&mut open, student),
            Err(EngineError::AlreadyJoined {
                session_id: open.id,
                user_id: student,
            })
        );
    }

    proptest! {
        #[test]
        fn roster_never_exceeds_seats(max_seats in 0usize..6, joins in 0usize..12) {
            let mut capped = session(0, SessionStatus::Scheduled);
            capped.max_seats = Some(max_seats);
            for _ in 0..joins {
                let _ = add_attendee(&mut capped, Uuid::new_v4());
            }
            prop_assert!(capped.attendees.len() <= max_seats);
        }
    }
}
