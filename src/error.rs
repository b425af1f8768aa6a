use uuid::Uuid;

use crate::models::SessionStatus;

/// Failures raised by the session and scoring rules.
///
/// Every variant is recoverable; callers decide how to present it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("session {session_id} is full ({max_seats} seats)")]
    Capacity { session_id: Uuid, max_seats: usize },

    #[error("user {user_id} already joined session {session_id}")]
    AlreadyJoined { session_id: Uuid, user_id: Uuid },

    #[error("session {session_id} cannot move from {from} to {to}")]
    InvalidStateTransition {
        session_id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    },
}

impl EngineError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            message: message.into(),
        }
    }
}
