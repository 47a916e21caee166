//! Scripted camera for tests and demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use atelier_core::error::CameraError;
use atelier_core::traits::{
    CameraConstraints, CameraDevice, CameraHandle, FacingMode, Frame, StreamSettings,
};

/// Resolutions a typical webcam advertises.
pub const DEFAULT_RESOLUTIONS: [(u32, u32); 3] = [(640, 480), (1280, 720), (1920, 1080)];

/// A camera that answers acquisitions from a queue of scripted failures and
/// grants whenever the queue is empty.
///
/// Frames are a flat colour at the granted resolution.
pub struct ScriptedCamera {
    /// Failures returned by the next acquisitions, in order.
    failures: Mutex<VecDeque<CameraError>>,
    /// Modes the device can deliver.
    resolutions: Vec<(u32, u32)>,
    facing: FacingMode,
    /// When set, acquisition waits for a notification before answering.
    gate: Option<Arc<Notify>>,
    unreadable_frames: bool,
    live: Arc<AtomicUsize>,
    acquisitions: AtomicU32,
    last_constraints: Mutex<Option<CameraConstraints>>,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self {
            failures: Mutex::new(VecDeque::new()),
            resolutions: DEFAULT_RESOLUTIONS.to_vec(),
            facing: FacingMode::Environment,
            gate: None,
            unreadable_frames: false,
            live: Arc::new(AtomicUsize::new(0)),
            acquisitions: AtomicU32::new(0),
            last_constraints: Mutex::new(None),
        }
    }

    /// Restrict the device to the given modes.
    pub fn with_resolutions(mut self, resolutions: Vec<(u32, u32)>) -> Self {
        self.resolutions = resolutions;
        self
    }

    pub fn facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    /// Queue a failure for the next unanswered acquisition.
    pub fn then_fail(self, error: CameraError) -> Self {
        self.push_failure(error);
        self
    }

    pub fn push_failure(&self, error: CameraError) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
    }

    /// Hold every acquisition until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Make `grab_frame` fail on every handle.
    pub fn with_unreadable_frames(mut self) -> Self {
        self.unreadable_frames = true;
        self
    }

    /// Handles granted and not yet released.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> u32 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn last_constraints(&self) -> Option<CameraConstraints> {
        *self.last_constraints.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ScriptedCamera {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the supported mode closest to the ideal one. Ties go to the larger
/// mode.
pub fn nearest_resolution(
    supported: &[(u32, u32)],
    ideal_width: u32,
    ideal_height: u32,
) -> Option<(u32, u32)> {
    supported.iter().copied().min_by_key(|&(w, h)| {
        let distance = (i64::from(w) - i64::from(ideal_width)).abs()
            + (i64::from(h) - i64::from(ideal_height)).abs();
        (distance, std::cmp::Reverse(u64::from(w) * u64::from(h)))
    })
}

#[async_trait]
impl CameraDevice for ScriptedCamera {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraHandle>, CameraError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        *self.last_constraints.lock().unwrap_or_else(|e| e.into_inner()) = Some(*constraints);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        let (width, height) =
            nearest_resolution(&self.resolutions, constraints.ideal_width, constraints.ideal_height)
                .ok_or(CameraError::NoDevice)?;

        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedHandle {
            settings: StreamSettings {
                width,
                height,
                facing: Some(self.facing),
            },
            unreadable: self.unreadable_frames,
            live: Arc::clone(&self.live),
            released: false,
        }))
    }
}

struct ScriptedHandle {
    settings: StreamSettings,
    unreadable: bool,
    live: Arc<AtomicUsize>,
    released: bool,
}

impl CameraHandle for ScriptedHandle {
    fn settings(&self) -> StreamSettings {
        self.settings
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if self.released {
            return Err(CameraError::FrameUnreadable("stream released".into()));
        }
        if self.unreadable {
            return Err(CameraError::FrameUnreadable("sensor returned no data".into()));
        }
        Ok(Frame::filled(
            self.settings.width,
            self.settings.height,
            [46, 139, 87],
        ))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        self.release();
    }
}
