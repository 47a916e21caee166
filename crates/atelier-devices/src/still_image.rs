//! A camera that serves frames decoded from an image file.
//!
//! Useful on machines without a video device: point it at a photo of the work
//! and the session captures it as if it came from a live stream. The file is
//! decoded on acquisition, so a photo replaced on disk between sessions is
//! picked up on the next `start`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageError, RgbImage};

use atelier_core::error::CameraError;
use atelier_core::traits::{
    CameraConstraints, CameraDevice, CameraHandle, FacingMode, Frame, StreamSettings,
};

pub struct StillImageCamera {
    path: PathBuf,
    in_use: Arc<AtomicBool>,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a handle is currently held.
    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }
}

fn decode(path: &Path) -> Result<RgbImage, CameraError> {
    match image::open(path) {
        Ok(img) => Ok(img.to_rgb8()),
        Err(ImageError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
            Err(CameraError::NoDevice)
        }
        Err(ImageError::IoError(e)) if e.kind() == io::ErrorKind::PermissionDenied => {
            Err(CameraError::PermissionDenied)
        }
        Err(e) => Err(CameraError::FrameUnreadable(format!(
            "{}: {e}",
            path.display()
        ))),
    }
}

#[async_trait]
impl CameraDevice for StillImageCamera {
    fn name(&self) -> &str {
        "still-image"
    }

    async fn acquire(
        &self,
        _constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraHandle>, CameraError> {
        if self.in_use.swap(true, Ordering::SeqCst) {
            return Err(CameraError::DeviceBusy);
        }
        let reservation = Reservation {
            in_use: Arc::clone(&self.in_use),
            armed: true,
        };

        let path = self.path.clone();
        let decoded = tokio::task::spawn_blocking(move || decode(&path))
            .await
            .map_err(|e| CameraError::FrameUnreadable(format!("decoder task failed: {e}")))
            .and_then(|result| result);

        let image = decoded?;
        tracing::debug!(
            "still-image camera opened {} ({}x{})",
            self.path.display(),
            image.width(),
            image.height()
        );
        Ok(Box::new(StillImageHandle {
            image,
            in_use: reservation.hand_over(),
            released: false,
        }))
    }
}

/// Holds the busy flag while the file is decoded. Dropping it, including
/// when the `acquire` future itself is dropped, frees the device.
struct Reservation {
    in_use: Arc<AtomicBool>,
    armed: bool,
}

impl Reservation {
    fn hand_over(mut self) -> Arc<AtomicBool> {
        self.armed = false;
        Arc::clone(&self.in_use)
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.armed {
            self.in_use.store(false, Ordering::SeqCst);
        }
    }
}

struct StillImageHandle {
    image: RgbImage,
    in_use: Arc<AtomicBool>,
    released: bool,
}

impl CameraHandle for StillImageHandle {
    fn settings(&self) -> StreamSettings {
        StreamSettings {
            width: self.image.width(),
            height: self.image.height(),
            facing: Some(FacingMode::Environment),
        }
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if self.released {
            return Err(CameraError::FrameUnreadable("stream released".into()));
        }
        Ok(Frame {
            width: self.image.width(),
            height: self.image.height(),
            pixels: self.image.as_raw().clone(),
        })
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.in_use.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for StillImageHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("work.png");
        RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn serves_file_at_native_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(write_png(dir.path(), 40, 30));

        let mut handle = camera
            .acquire(&CameraConstraints::default())
            .await
            .unwrap();
        assert_eq!(handle.settings().width, 40);
        assert_eq!(handle.settings().height, 30);

        let frame = handle.grab_frame().unwrap();
        assert_eq!(frame.pixels.len(), 40 * 30 * 3);
        assert_eq!(&frame.pixels[..3], &[200, 30, 30]);
    }

    #[tokio::test]
    async fn second_acquisition_is_busy_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(write_png(dir.path(), 8, 8));
        let constraints = CameraConstraints::default();

        let mut first = camera.acquire(&constraints).await.unwrap();
        assert!(camera.is_in_use());
        assert_eq!(
            camera.acquire(&constraints).await.err(),
            Some(CameraError::DeviceBusy)
        );

        first.release();
        assert!(!camera.is_in_use());
        let second = camera.acquire(&constraints).await.unwrap();
        drop(second);
        assert!(!camera.is_in_use());
    }

    #[tokio::test]
    async fn cancelled_acquisition_frees_device() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(write_png(dir.path(), 1000, 1000));
        let constraints = CameraConstraints::default();

        // poll once, then give up while the decode is still running
        tokio::select! {
            biased;
            _ = camera.acquire(&constraints) => {}
            _ = std::future::ready(()) => {}
        }
        assert!(!camera.is_in_use());

        let handle = camera.acquire(&constraints).await.unwrap();
        assert_eq!(handle.settings().width, 1000);
        assert!(camera.is_in_use());
        drop(handle);
        assert!(!camera.is_in_use());
    }

    #[tokio::test]
    async fn missing_file_is_no_device() {
        let dir = tempfile::tempdir().unwrap();
        let camera = StillImageCamera::new(dir.path().join("absent.png"));

        assert_eq!(
            camera.acquire(&CameraConstraints::default()).await.err(),
            Some(CameraError::NoDevice)
        );
        assert!(!camera.is_in_use());
    }

    #[tokio::test]
    async fn garbage_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        let camera = StillImageCamera::new(path);

        assert!(matches!(
            camera.acquire(&CameraConstraints::default()).await.err(),
            Some(CameraError::FrameUnreadable(_))
        ));
        assert!(!camera.is_in_use());
    }
}
