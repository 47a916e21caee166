//! Configuration and camera factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use atelier_core::capture::CaptureSettings;
use atelier_core::encode::DEFAULT_JPEG_QUALITY;
use atelier_core::traits::{CameraConstraints, CameraDevice, FacingMode};

use crate::scripted::ScriptedCamera;
use crate::still_image::StillImageCamera;

/// Which camera device to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraConfig {
    /// Serve frames from an image file.
    StillImage { path: String },
    /// Synthetic device offering a single mode.
    Scripted {
        #[serde(default = "default_ideal_width")]
        width: u32,
        #[serde(default = "default_ideal_height")]
        height: u32,
    },
}

/// How stills are requested and encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Preferred camera direction.
    #[serde(default)]
    pub facing: FacingMode,
    #[serde(default = "default_ideal_width")]
    pub ideal_width: u32,
    #[serde(default = "default_ideal_height")]
    pub ideal_height: u32,
    /// JPEG quality, 1..=100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_ideal_width() -> u32 {
    1280
}
fn default_ideal_height() -> u32 {
    720
}
fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::default(),
            ideal_width: default_ideal_width(),
            ideal_height: default_ideal_height(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl CaptureConfig {
    /// Validate and convert into session settings.
    pub fn settings(&self) -> Result<CaptureSettings> {
        anyhow::ensure!(
            (1..=100).contains(&self.jpeg_quality),
            "jpeg_quality must be between 1 and 100, got {}",
            self.jpeg_quality
        );
        anyhow::ensure!(
            self.ideal_width > 0 && self.ideal_height > 0,
            "ideal resolution must be non-zero"
        );
        Ok(CaptureSettings {
            constraints: CameraConstraints {
                facing: self.facing,
                ideal_width: self.ideal_width,
                ideal_height: self.ideal_height,
            },
            jpeg_quality: self.jpeg_quality,
        })
    }
}

/// Top-level atelier configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtelierConfig {
    /// Camera device. `None` until one is configured or passed on the
    /// command line.
    #[serde(default)]
    pub camera: Option<CameraConfig>,
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `atelier.toml` in the current directory
/// 2. `~/.config/atelier/config.toml`
///
/// `ATELIER_CAMERA_FILE` overrides the camera with a still-image device.
pub fn load_config() -> Result<AtelierConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AtelierConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("atelier.toml");
        if local.exists() {
            Some(local)
        } else {
            config_dir()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AtelierConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AtelierConfig::default(),
    };

    if let Ok(file) = std::env::var("ATELIER_CAMERA_FILE") {
        config.camera = Some(CameraConfig::StillImage { path: file });
    }

    if let Some(CameraConfig::StillImage { path }) = &mut config.camera {
        *path = resolve_env_vars(path);
    }

    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("atelier"))
}

/// Create a camera device from its configuration.
pub fn create_camera(config: &CameraConfig) -> Result<Arc<dyn CameraDevice>> {
    match config {
        CameraConfig::StillImage { path } => {
            anyhow::ensure!(!path.is_empty(), "still_image camera needs a path");
            Ok(Arc::new(StillImageCamera::new(path)))
        }
        CameraConfig::Scripted { width, height } => {
            anyhow::ensure!(
                *width > 0 && *height > 0,
                "scripted camera resolution must be non-zero"
            );
            Ok(Arc::new(
                ScriptedCamera::new().with_resolutions(vec![(*width, *height)]),
            ))
        }
    }
}
