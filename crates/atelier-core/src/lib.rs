//! atelier-core: capture-and-evaluate session core.
//!
//! This crate owns the state machines behind a single student evaluation:
//! camera acquisition and capture, the grade/photo draft, and the
//! coordinator that hands finished evaluations to a sink.

pub mod capture;
pub mod clock;
pub mod coordinator;
pub mod draft;
pub mod encode;
pub mod error;
pub mod model;
pub mod traits;

#[cfg(test)]
mod testing;

pub use capture::{CaptureSession, CaptureSettings, CaptureState};
pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{Collaborators, DraftStatus, SessionCoordinator, SessionPhase};
pub use draft::EvaluationDraft;
pub use error::{CameraError, PersistError, RosterError, SessionError};
pub use model::{CapturedImage, Evaluation, EvaluationReceipt, Grade, Student, Workshop};
