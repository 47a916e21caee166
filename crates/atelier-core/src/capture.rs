//! Camera lifecycle for one evaluation session.
//!
//! A [`CaptureSession`] holds at most one live device handle, and only while
//! it is `Live`. Every other state, and every error path, leaves the device
//! released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::encode::{encode_jpeg, DEFAULT_JPEG_QUALITY};
use crate::error::SessionError;
use crate::model::CapturedImage;
use crate::traits::{CameraConstraints, CameraDevice, CameraHandle, StreamSettings};

/// Observable capture state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureState {
    Idle,
    /// Waiting on the device (permission prompt, warm-up).
    Acquiring,
    Live,
    /// A still has been taken; the device is already released.
    Captured,
}

impl CaptureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Acquiring => "acquiring",
            CaptureState::Live => "live",
            CaptureState::Captured => "captured",
        }
    }
}

/// Configuration for capture sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Device preferences sent with every acquisition.
    pub constraints: CameraConstraints,
    /// JPEG quality for stills, 1..=100.
    pub jpeg_quality: u8,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            constraints: CameraConstraints::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

enum Slot {
    Idle,
    Acquiring { epoch: u64 },
    Live(Box<dyn CameraHandle>),
    Captured,
}

impl Slot {
    fn state(&self) -> CaptureState {
        match self {
            Slot::Idle => CaptureState::Idle,
            Slot::Acquiring { .. } => CaptureState::Acquiring,
            Slot::Live(_) => CaptureState::Live,
            Slot::Captured => CaptureState::Captured,
        }
    }

    fn is_acquiring(&self, epoch: u64) -> bool {
        matches!(self, Slot::Acquiring { epoch: e } if *e == epoch)
    }
}

struct Inner {
    slot: Slot,
    next_epoch: u64,
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resets an abandoned acquisition back to `Idle` if the `start` future is
/// dropped while suspended.
struct PendingAcquisition<'a> {
    inner: &'a Mutex<Inner>,
    epoch: u64,
    armed: bool,
}

impl Drop for PendingAcquisition<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = lock(self.inner);
            if inner.slot.is_acquiring(self.epoch) {
                tracing::debug!("acquisition {} dropped before completion", self.epoch);
                inner.slot = Slot::Idle;
            }
        }
    }
}

/// Scoped owner of a camera device for one session.
pub struct CaptureSession {
    camera: Arc<dyn CameraDevice>,
    settings: CaptureSettings,
    inner: Mutex<Inner>,
}

impl CaptureSession {
    pub fn new(camera: Arc<dyn CameraDevice>, settings: CaptureSettings) -> Self {
        Self {
            camera,
            settings,
            inner: Mutex::new(Inner {
                slot: Slot::Idle,
                next_epoch: 0,
            }),
        }
    }

    pub fn state(&self) -> CaptureState {
        lock(&self.inner).slot.state()
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Acquire the camera. Only valid from `Idle`.
    ///
    /// A second call while the first is still suspended fails with
    /// `InvalidState` without touching the device.
    pub async fn start(&self) -> Result<StreamSettings, SessionError> {
        self.acquire("start", CaptureState::Idle).await
    }

    /// Drop the held still and go live again. Only valid from `Captured`.
    pub async fn retake(&self) -> Result<StreamSettings, SessionError> {
        self.acquire("retake", CaptureState::Captured).await
    }

    async fn acquire(
        &self,
        operation: &'static str,
        from: CaptureState,
    ) -> Result<StreamSettings, SessionError> {
        let epoch = {
            let mut inner = lock(&self.inner);
            let state = inner.slot.state();
            if state != from {
                return Err(SessionError::invalid(operation, state.as_str()));
            }
            inner.next_epoch += 1;
            let epoch = inner.next_epoch;
            inner.slot = Slot::Acquiring { epoch };
            epoch
        };

        let mut pending = PendingAcquisition {
            inner: &self.inner,
            epoch,
            armed: true,
        };
        tracing::debug!(
            "acquiring camera '{}' ({}x{}, {:?})",
            self.camera.name(),
            self.settings.constraints.ideal_width,
            self.settings.constraints.ideal_height,
            self.settings.constraints.facing,
        );
        let outcome = self.camera.acquire(&self.settings.constraints).await;
        pending.armed = false;

        let mut inner = lock(&self.inner);
        let current = inner.slot.is_acquiring(epoch);
        match outcome {
            Ok(handle) if current => {
                let granted = handle.settings();
                tracing::debug!("camera live at {}x{}", granted.width, granted.height);
                inner.slot = Slot::Live(handle);
                Ok(granted)
            }
            Ok(mut handle) => {
                handle.release();
                tracing::info!("camera granted after session stopped, released");
                Err(SessionError::AcquisitionCancelled)
            }
            Err(error) if current => {
                inner.slot = Slot::Idle;
                tracing::warn!("camera unavailable: {error}");
                Err(error.into())
            }
            Err(error) => {
                tracing::debug!("ignoring late camera failure: {error}");
                Err(SessionError::AcquisitionCancelled)
            }
        }
    }

    /// Take a still from the live stream and release the device.
    ///
    /// If the frame cannot be read the device is still released and the
    /// session falls back to `Idle`.
    pub fn capture(&self) -> Result<CapturedImage, SessionError> {
        let mut inner = lock(&self.inner);
        let mut handle = match std::mem::replace(&mut inner.slot, Slot::Idle) {
            Slot::Live(handle) => handle,
            other => {
                let state = other.state();
                inner.slot = other;
                return Err(SessionError::invalid("capture", state.as_str()));
            }
        };

        let frame = handle.grab_frame();
        handle.release();

        let image = frame.and_then(|frame| encode_jpeg(&frame, self.settings.jpeg_quality))?;
        tracing::debug!(
            "captured {}x{} still ({} bytes)",
            image.width(),
            image.height(),
            image.bytes().len()
        );
        inner.slot = Slot::Captured;
        Ok(image)
    }

    /// Release any held device and return to `Idle`. Idempotent.
    ///
    /// Stopping while acquisition is in flight makes the pending `start`
    /// resolve with `AcquisitionCancelled` and release whatever it obtained.
    pub fn stop(&self) {
        let mut inner = lock(&self.inner);
        match std::mem::replace(&mut inner.slot, Slot::Idle) {
            Slot::Live(mut handle) => {
                handle.release();
                tracing::debug!("camera stopped");
            }
            Slot::Acquiring { epoch } => {
                tracing::debug!("camera acquisition {epoch} abandoned");
            }
            Slot::Idle | Slot::Captured => {}
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Slot::Live(handle) = &mut inner.slot {
            handle.release();
            tracing::debug!("camera released on drop");
        }
        inner.slot = Slot::Idle;
    }
}
