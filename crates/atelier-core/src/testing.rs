//! In-crate fakes for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{CameraError, PersistError, RosterError};
use crate::model::{Evaluation, Grade, Student};
use crate::traits::{
    CameraConstraints, CameraDevice, CameraHandle, EvaluationSink, Frame, Roster, StreamSettings,
};

/// Camera whose outcomes are queued up front. Grants when the queue is empty.
pub(crate) struct FakeCamera {
    outcomes: Mutex<VecDeque<CameraError>>,
    gate: Option<Arc<Notify>>,
    live: Arc<AtomicUsize>,
    acquisitions: AtomicUsize,
}

impl FakeCamera {
    pub fn granting() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            gate: None,
            live: Arc::new(AtomicUsize::new(0)),
            acquisitions: AtomicUsize::new(0),
        }
    }

    pub fn failing_once(error: CameraError) -> Self {
        let camera = Self::granting();
        camera.outcomes.lock().unwrap().push_back(error);
        camera
    }

    /// Acquisition waits until the returned notify fires.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let camera = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::granting()
        };
        (camera, gate)
    }

    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraDevice for FakeCamera {
    fn name(&self) -> &str {
        "fake"
    }

    async fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraHandle>, CameraError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(error) = self.outcomes.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeHandle {
            live: Arc::clone(&self.live),
            released: false,
            width: constraints.ideal_width / 40,
            height: constraints.ideal_height / 40,
        }))
    }
}

struct FakeHandle {
    live: Arc<AtomicUsize>,
    released: bool,
    width: u32,
    height: u32,
}

impl CameraHandle for FakeHandle {
    fn settings(&self) -> StreamSettings {
        StreamSettings {
            width: self.width,
            height: self.height,
            facing: None,
        }
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        Ok(Frame::filled(self.width, self.height, [90, 140, 60]))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Sink that records evaluations and can be told to reject.
#[derive(Default)]
pub(crate) struct FakeSink {
    pub saved: Mutex<Vec<Evaluation>>,
    rejections: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl FakeSink {
    /// Every save waits until the returned notify fires.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let sink = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (sink, gate)
    }

    pub fn reject_next(&self, count: usize) {
        self.rejections.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl EvaluationSink for FakeSink {
    async fn save_evaluation(&self, evaluation: Evaluation) -> Result<(), PersistError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let remaining = self.rejections.load(Ordering::SeqCst);
        if remaining > 0 {
            self.rejections.store(remaining - 1, Ordering::SeqCst);
            return Err(PersistError::new("storage offline", evaluation));
        }
        self.saved.lock().unwrap().push(evaluation);
        Ok(())
    }
}

/// Roster with a single student "1" in workshop "1".
pub(crate) struct FakeRoster;

#[async_trait]
impl Roster for FakeRoster {
    async fn get_student(
        &self,
        workshop_id: &str,
        student_id: &str,
    ) -> Result<Student, RosterError> {
        if workshop_id != "1" {
            return Err(RosterError::UnknownWorkshop(workshop_id.to_string()));
        }
        if student_id != "1" {
            return Err(RosterError::UnknownStudent {
                workshop_id: workshop_id.to_string(),
                student_id: student_id.to_string(),
            });
        }
        Ok(Student {
            id: "1".into(),
            name: "Emma Martin".into(),
            last_grade: Some(Grade::Green),
            last_evaluated_at: None,
        })
    }
}
