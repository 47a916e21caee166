//! Error types for evaluation sessions.
//!
//! Every failure is scoped to the session that produced it. Callers use
//! [`SessionError::is_recoverable`] to decide between retrying and treating
//! the error as a bug.

use thiserror::Error;

use crate::model::Evaluation;

/// Why a camera could not be acquired or read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The user or the OS refused camera access.
    #[error("camera permission denied")]
    PermissionDenied,

    /// No video device is present.
    #[error("no camera device found")]
    NoDevice,

    /// The device is held by another session or process.
    #[error("camera device is busy")]
    DeviceBusy,

    /// A frame could not be sampled or encoded.
    #[error("could not read frame: {0}")]
    FrameUnreadable(String),
}

/// Roster lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("unknown workshop: {0}")]
    UnknownWorkshop(String),

    #[error("unknown student {student_id} in workshop {workshop_id}")]
    UnknownStudent {
        workshop_id: String,
        student_id: String,
    },
}

/// A sink refused an evaluation.
///
/// The rejected evaluation travels back with the error so nothing captured
/// is lost.
#[derive(Debug, Error)]
#[error("evaluation rejected: {reason}")]
pub struct PersistError {
    reason: String,
    evaluation: Box<Evaluation>,
}

impl PersistError {
    pub fn new(reason: impl Into<String>, evaluation: Evaluation) -> Self {
        Self {
            reason: reason.into(),
            evaluation: Box::new(evaluation),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn into_evaluation(self) -> Evaluation {
        *self.evaluation
    }
}

/// Errors surfaced by capture sessions, drafts and the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(#[from] CameraError),

    /// The operation is not supported in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("capture a photo and choose a grade")]
    IncompleteDraft,

    #[error("failed to save evaluation: {reason}")]
    Persist { reason: String },

    /// The session was stopped or closed before the camera answered.
    #[error("camera acquisition cancelled")]
    AcquisitionCancelled,

    #[error(transparent)]
    Roster(#[from] RosterError),
}

impl SessionError {
    pub(crate) fn invalid(operation: &'static str, state: &'static str) -> Self {
        SessionError::InvalidState { operation, state }
    }

    /// Returns `true` if the user can fix this by acting again (retry the
    /// camera, pick a grade, re-submit).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::CameraUnavailable(_)
                | SessionError::IncompleteDraft
                | SessionError::Persist { .. }
                | SessionError::AcquisitionCancelled
        )
    }

    /// Message suitable for showing in the classroom UI.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::CameraUnavailable(CameraError::PermissionDenied) => {
                "camera access was denied".to_string()
            }
            SessionError::CameraUnavailable(_) => "unable to access the camera".to_string(),
            SessionError::IncompleteDraft => self.to_string(),
            SessionError::Persist { .. } => {
                "the evaluation could not be saved, try again".to_string()
            }
            other => other.to_string(),
        }
    }
}
