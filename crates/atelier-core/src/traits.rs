//! Capability traits for the collaborators a session depends on.
//!
//! Camera devices are implemented by the `atelier-devices` crate; rosters
//! and sinks by `atelier-roster`. Tests inject their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CameraError, PersistError, RosterError};
use crate::model::{Evaluation, Student};

// ---------------------------------------------------------------------------
// Camera capability
// ---------------------------------------------------------------------------

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed at the work on the table.
    #[default]
    Environment,
    /// Front camera.
    User,
}

/// What a session asks of a device. All fields are preferences; a device may
/// substitute its closest supported mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// The mode a device actually granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSettings {
    pub width: u32,
    pub height: u32,
    /// `None` when the device cannot tell which way it faces.
    pub facing: Option<FacingMode>,
}

/// A raw RGB8 frame sampled from a live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triples, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A frame of a single colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Platform access to a video device.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Human-readable device name (e.g. "still-image").
    fn name(&self) -> &str;

    /// Request exclusive access to a live stream. May wait on a permission
    /// prompt or device warm-up for an arbitrary time.
    async fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraHandle>, CameraError>;
}

/// An exclusively held live stream.
pub trait CameraHandle: Send {
    fn settings(&self) -> StreamSettings;

    /// Sample the current frame at the stream's native resolution.
    fn grab_frame(&mut self) -> Result<Frame, CameraError>;

    /// Give the device back. Must be safe to call more than once.
    fn release(&mut self);
}

// ---------------------------------------------------------------------------
// Roster and persistence
// ---------------------------------------------------------------------------

/// Read-only student lookup.
#[async_trait]
pub trait Roster: Send + Sync {
    async fn get_student(&self, workshop_id: &str, student_id: &str)
        -> Result<Student, RosterError>;
}

/// Destination for finalized evaluations.
#[async_trait]
pub trait EvaluationSink: Send + Sync {
    /// Take ownership of an evaluation. On rejection the evaluation is handed
    /// back inside the error.
    async fn save_evaluation(&self, evaluation: Evaluation) -> Result<(), PersistError>;
}
