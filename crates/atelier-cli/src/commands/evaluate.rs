//! The `atelier evaluate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use atelier_core::clock::SystemClock;
use atelier_core::coordinator::{Collaborators, SessionCoordinator};
use atelier_core::error::SessionError;
use atelier_core::model::{EvaluationReceipt, Grade};
use atelier_core::traits::{EvaluationSink, Roster};
use atelier_devices::{create_camera, load_config_from, CameraConfig};
use atelier_roster::ClassroomStore;

use super::describe_grade;

pub async fn execute(
    workshop_id: String,
    student_id: String,
    grade: String,
    frame: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let grade: Grade = grade.parse().map_err(anyhow::Error::msg)?;

    let config = load_config_from(config_path.as_deref())?;
    let settings = config.capture.settings()?;
    let camera_config = match frame {
        Some(path) => CameraConfig::StillImage {
            path: path.to_string_lossy().into_owned(),
        },
        None => config.camera.clone().ok_or_else(|| {
            anyhow::anyhow!("no camera configured; pass --frame or set [camera] in atelier.toml")
        })?,
    };
    let camera = create_camera(&camera_config)?;

    let store = Arc::new(ClassroomStore::demo());
    let collaborators = Collaborators {
        roster: Arc::clone(&store) as Arc<dyn Roster>,
        sink: Arc::clone(&store) as Arc<dyn EvaluationSink>,
        camera,
        clock: Arc::new(SystemClock),
    };

    let session = SessionCoordinator::open(&collaborators, settings, &workshop_id, &student_id)
        .await
        .context("failed to open evaluation session")?;

    let student = session.student();
    println!(
        "[{}] {} (last grade: {})",
        student.initials(),
        student.name,
        describe_grade(student.last_grade)
    );

    let result = run_session(&session, grade).await;
    session.close();
    let receipt = result?;

    println!(
        "Recorded {} ({}) for {} at {}",
        receipt.grade.label(),
        receipt.grade,
        session.student().name,
        receipt.taken_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Evaluation id: {}", receipt.evaluation_id);

    if let Some(dir) = output {
        let files = store.export_evaluation(receipt.evaluation_id, &dir)?;
        println!("Photo written to {}", files.image.display());
        println!("Record written to {}", files.metadata.display());
    }

    Ok(())
}

async fn run_session(
    session: &SessionCoordinator,
    grade: Grade,
) -> Result<EvaluationReceipt, SessionError> {
    let stream = session.start_camera().await?;
    tracing::info!("camera live at {}x{}", stream.width, stream.height);
    session.capture()?;
    session.select_grade(grade)?;
    session.finalize().await
}
