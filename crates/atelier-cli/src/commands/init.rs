//! The `atelier init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("atelier.toml").exists() {
        println!("atelier.toml already exists, skipping.");
    } else {
        std::fs::write("atelier.toml", SAMPLE_CONFIG)?;
        println!("Created atelier.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point [camera] at a photo of student work, or keep the scripted device");
    println!("  2. Run: atelier workshops");
    println!("  3. Run: atelier evaluate --workshop 1 --student 1 --grade green");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# atelier configuration

# Frames come from an image file. ATELIER_CAMERA_FILE overrides this.
# [camera]
# type = "still_image"
# path = "${HOME}/Pictures/work.png"

[camera]
type = "scripted"
width = 1280
height = 720

[capture]
facing = "environment"
ideal_width = 1280
ideal_height = 720
jpeg_quality = 80
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let config: atelier_devices::AtelierConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(
            config.camera,
            Some(atelier_devices::CameraConfig::Scripted {
                width: 1280,
                height: 720
            })
        );
        assert!(config.capture.settings().is_ok());
    }
}
