//! Per-student evaluation session.
//!
//! A [`SessionCoordinator`] binds one capture session and one draft to a
//! `(workshop, student)` pair, and hands the finished evaluation to the sink.
//! It is created when the evaluation screen opens and closed when it goes
//! away; nothing is shared between coordinators.

use std::sync::{Arc, Mutex};

use crate::capture::{lock, CaptureSession, CaptureSettings, CaptureState};
use crate::clock::Clock;
use crate::draft::EvaluationDraft;
use crate::error::SessionError;
use crate::model::{CapturedImage, EvaluationReceipt, Grade, Student};
use crate::traits::{CameraDevice, EvaluationSink, Roster, StreamSettings};

/// Where a session is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Open,
    /// Closed after the sink accepted the evaluation.
    Committed,
    /// Closed without emitting anything.
    Abandoned,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Open => "open",
            SessionPhase::Committed => "committed",
            SessionPhase::Abandoned => "abandoned",
        }
    }
}

/// The external capabilities a session is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub roster: Arc<dyn Roster>,
    pub sink: Arc<dyn EvaluationSink>,
    pub camera: Arc<dyn CameraDevice>,
    pub clock: Arc<dyn Clock>,
}

/// Snapshot of the session for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftStatus {
    pub capture: CaptureState,
    pub has_image: bool,
    pub grade: Option<Grade>,
    pub committable: bool,
}

/// Reopens the draft if `finalize` is dropped while the sink still holds the
/// evaluation, so the session can capture and finalize again.
struct PendingSave<'a> {
    draft: &'a Mutex<EvaluationDraft>,
    armed: bool,
}

impl Drop for PendingSave<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("save abandoned before the sink answered, photo discarded");
            lock(self.draft).reopen();
        }
    }
}

pub struct SessionCoordinator {
    workshop_id: String,
    student_id: String,
    student: Student,
    capture: CaptureSession,
    draft: Mutex<EvaluationDraft>,
    phase: Mutex<SessionPhase>,
    sink: Arc<dyn EvaluationSink>,
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    /// Open a fresh session for a student. The roster is only read.
    pub async fn open(
        collaborators: &Collaborators,
        settings: CaptureSettings,
        workshop_id: &str,
        student_id: &str,
    ) -> Result<Self, SessionError> {
        let student = collaborators
            .roster
            .get_student(workshop_id, student_id)
            .await?;
        tracing::info!(
            "opened evaluation session for {} ({workshop_id}/{student_id})",
            student.name
        );

        Ok(Self {
            workshop_id: workshop_id.to_string(),
            student_id: student_id.to_string(),
            student,
            capture: CaptureSession::new(Arc::clone(&collaborators.camera), settings),
            draft: Mutex::new(EvaluationDraft::new()),
            phase: Mutex::new(SessionPhase::Open),
            sink: Arc::clone(&collaborators.sink),
            clock: Arc::clone(&collaborators.clock),
        })
    }

    pub fn workshop_id(&self) -> &str {
        &self.workshop_id
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// The student as the roster knew them when the session opened.
    pub fn student(&self) -> &Student {
        &self.student
    }

    pub fn phase(&self) -> SessionPhase {
        *lock(&self.phase)
    }

    pub fn status(&self) -> DraftStatus {
        let draft = lock(&self.draft);
        DraftStatus {
            capture: self.capture.state(),
            has_image: draft.image().is_some(),
            grade: draft.grade(),
            committable: draft.is_committable(),
        }
    }

    /// A copy of the held photo, for preview.
    pub fn photo(&self) -> Option<CapturedImage> {
        lock(&self.draft).image().cloned()
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.phase() {
            SessionPhase::Open => Ok(()),
            phase => Err(SessionError::invalid(operation, phase.as_str())),
        }
    }

    pub async fn start_camera(&self) -> Result<StreamSettings, SessionError> {
        self.ensure_open("start camera")?;
        self.capture.start().await
    }

    pub fn stop_camera(&self) -> Result<(), SessionError> {
        self.ensure_open("stop camera")?;
        self.capture.stop();
        Ok(())
    }

    /// Take the still and place it in the draft.
    pub fn capture(&self) -> Result<(), SessionError> {
        self.ensure_open("capture")?;
        let image = self.capture.capture()?;
        lock(&self.draft).set_image(image);
        Ok(())
    }

    /// Discard the held photo and go live again. The selected grade is kept.
    pub async fn retake(&self) -> Result<StreamSettings, SessionError> {
        self.ensure_open("retake")?;
        let state = self.capture.state();
        if state != CaptureState::Captured {
            return Err(SessionError::invalid("retake", state.as_str()));
        }
        lock(&self.draft).clear_image();
        self.capture.retake().await
    }

    pub fn select_grade(&self, grade: Grade) -> Result<(), SessionError> {
        self.ensure_open("select grade")?;
        lock(&self.draft).set_grade(grade);
        Ok(())
    }

    /// Commit the draft and hand the evaluation to the sink.
    ///
    /// An incomplete draft is reported without changing anything. If the sink
    /// rejects the evaluation the draft is restored and stays committable, so
    /// `finalize` can be called again without re-capturing. If this future is
    /// dropped before the sink answers, the photo is gone but the grade is
    /// kept; retake and finalize again.
    ///
    /// Once the sink accepts, the session is `Committed` even if `close` ran
    /// while the save was in flight.
    pub async fn finalize(&self) -> Result<EvaluationReceipt, SessionError> {
        self.ensure_open("finalize")?;
        let evaluation = lock(&self.draft).commit(
            &self.workshop_id,
            &self.student_id,
            self.clock.as_ref(),
        );
        let evaluation = match evaluation {
            Ok(evaluation) => evaluation,
            Err(error) => {
                tracing::info!("finalize refused: {error}");
                return Err(error);
            }
        };

        let receipt = evaluation.receipt();
        let mut pending = PendingSave {
            draft: &self.draft,
            armed: true,
        };
        let outcome = self.sink.save_evaluation(evaluation).await;
        pending.armed = false;

        match outcome {
            Ok(()) => {
                {
                    let mut phase = lock(&self.phase);
                    if *phase == SessionPhase::Abandoned {
                        tracing::info!("session closed during save, evaluation still recorded");
                    }
                    *phase = SessionPhase::Committed;
                }
                self.capture.stop();
                tracing::info!(
                    "evaluation {} saved for {}/{}: {}",
                    receipt.evaluation_id,
                    self.workshop_id,
                    self.student_id,
                    receipt.grade
                );
                Ok(receipt)
            }
            Err(rejected) => {
                let reason = rejected.reason().to_string();
                tracing::warn!("evaluation {} rejected: {reason}", receipt.evaluation_id);
                lock(&self.draft).restore(rejected.into_evaluation());
                Err(SessionError::Persist { reason })
            }
        }
    }

    /// Tear the session down. The camera is always released; nothing is
    /// emitted. Safe to call more than once. A save already handed to the sink
    /// is not withdrawn.
    pub fn close(&self) {
        self.capture.stop();
        let mut phase = lock(&self.phase);
        if *phase == SessionPhase::Open {
            *phase = SessionPhase::Abandoned;
            tracing::info!(
                "evaluation session {}/{} abandoned",
                self.workshop_id,
                self.student_id
            );
        }
    }
}
