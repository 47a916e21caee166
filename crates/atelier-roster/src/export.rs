//! Evaluation export: a JPEG and a JSON metadata file per evaluation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::model::{Evaluation, Grade};

/// JSON side of an exported evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub id: Uuid,
    pub workshop_id: String,
    pub student_id: String,
    pub grade: Grade,
    pub taken_at: DateTime<Utc>,
    pub image: ImageRecord,
}

/// Where the still lives and what it looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// File name relative to the metadata file.
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    pub bytes: usize,
}

/// Paths written by [`write_evaluation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub metadata: PathBuf,
    pub image: PathBuf,
}

impl EvaluationRecord {
    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        let image = evaluation.image();
        Self {
            id: evaluation.id(),
            workshop_id: evaluation.workshop_id().to_string(),
            student_id: evaluation.student_id().to_string(),
            grade: evaluation.grade(),
            taken_at: evaluation.taken_at(),
            image: ImageRecord {
                file: format!("{}.jpg", evaluation.id()),
                width: image.width(),
                height: image.height(),
                mime_type: image.mime_type().to_string(),
                bytes: image.bytes().len(),
            },
        }
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record from {}", path.display()))?;
        let record: EvaluationRecord =
            serde_json::from_str(&content).context("failed to parse evaluation record")?;
        Ok(record)
    }
}

/// Write `<id>.jpg` and `<id>.json` into `dir`, creating it if needed.
pub fn write_evaluation(dir: &Path, evaluation: &Evaluation) -> Result<ExportedFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export dir {}", dir.display()))?;

    let record = EvaluationRecord::from_evaluation(evaluation);
    let image = dir.join(&record.image.file);
    let metadata = dir.join(format!("{}.json", record.id));

    std::fs::write(&image, evaluation.image().bytes())
        .with_context(|| format!("failed to write image to {}", image.display()))?;
    let json = serde_json::to_string_pretty(&record).context("failed to serialize record")?;
    std::fs::write(&metadata, json)
        .with_context(|| format!("failed to write record to {}", metadata.display()))?;

    Ok(ExportedFiles { metadata, image })
}
