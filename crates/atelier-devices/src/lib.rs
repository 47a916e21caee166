//! atelier-devices: camera devices and configuration.
//!
//! Implements the `CameraDevice` capability for a scripted test camera and a
//! still-image camera backed by a file, plus the configuration layer that
//! chooses between them.

pub mod config;
pub mod scripted;
pub mod still_image;

pub use config::{
    create_camera, load_config, load_config_from, AtelierConfig, CameraConfig, CaptureConfig,
};
pub use scripted::ScriptedCamera;
pub use still_image::StillImageCamera;
