//! Still encoding for captured frames.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::error::CameraError;
use crate::model::CapturedImage;
use crate::traits::Frame;

/// JPEG quality used when nothing else is configured (roughly 0.8).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Encode a frame as a lossy JPEG still at its native resolution.
///
/// `quality` is clamped to `1..=100`.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<CapturedImage, CameraError> {
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.width == 0 || frame.height == 0 {
        return Err(CameraError::FrameUnreadable(format!(
            "empty frame ({}x{})",
            frame.width, frame.height
        )));
    }
    if frame.pixels.len() != expected {
        return Err(CameraError::FrameUnreadable(format!(
            "expected {expected} bytes for {}x{} RGB, got {}",
            frame.width,
            frame.height,
            frame.pixels.len()
        )));
    }

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode(
            &frame.pixels,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CameraError::FrameUnreadable(e.to_string()))?;

    Ok(CapturedImage::from_jpeg(bytes, frame.width, frame.height))
}
