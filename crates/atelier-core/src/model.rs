//! Core data model types for atelier.
//!
//! Workshops and students are owned by the surrounding roster; the core only
//! reads them. Captured images and evaluations are produced here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse quality rating for a piece of student work.
///
/// Variants are declared worst-first so the derived ordering gives
/// `Green > Orange > Red`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Red,
    Orange,
    Green,
}

impl Grade {
    /// All grades, best first.
    pub const ALL: [Grade; 3] = [Grade::Green, Grade::Orange, Grade::Red];

    /// Short label shown next to the grade.
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Green => "Excellent",
            Grade::Orange => "Good",
            Grade::Red => "Needs improvement",
        }
    }

    /// What the grade says about the workshop objectives.
    pub fn description(&self) -> &'static str {
        match self {
            Grade::Green => "Objectives met",
            Grade::Orange => "Objectives partially met",
            Grade::Red => "Objectives not met",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Green => write!(f, "green"),
            Grade::Orange => write!(f, "orange"),
            Grade::Red => write!(f, "red"),
        }
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "green" => Ok(Grade::Green),
            "orange" => Ok(Grade::Orange),
            "red" => Ok(Grade::Red),
            other => Err(format!("unknown grade: {other}")),
        }
    }
}

/// A named teaching activity with a roster of students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workshop {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Enrolled student count as advertised by the workshop list.
    #[serde(default)]
    pub student_count: u32,
    pub created_at: DateTime<Utc>,
}

/// A roster entry, carrying the most recent grade it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub last_grade: Option<Grade>,
    #[serde(default)]
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

impl Student {
    /// Uppercased first letter of each part of the name ("Emma Martin" -> "EM").
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// An encoded still (JPEG) taken from a live camera frame.
///
/// The buffer is private and never handed out mutably.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl CapturedImage {
    pub fn from_jpeg(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A finalized grade + photo for one student, at one point in time.
#[derive(Debug)]
pub struct Evaluation {
    id: Uuid,
    workshop_id: String,
    student_id: String,
    grade: Grade,
    image: CapturedImage,
    taken_at: DateTime<Utc>,
}

impl Evaluation {
    pub(crate) fn new(
        workshop_id: &str,
        student_id: &str,
        grade: Grade,
        image: CapturedImage,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workshop_id: workshop_id.to_string(),
            student_id: student_id.to_string(),
            grade,
            image,
            taken_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn workshop_id(&self) -> &str {
        &self.workshop_id
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn grade(&self) -> Grade {
        self.grade
    }

    pub fn image(&self) -> &CapturedImage {
        &self.image
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Split the evaluation back into its grade and image.
    pub fn into_parts(self) -> (Grade, CapturedImage) {
        (self.grade, self.image)
    }

    pub fn receipt(&self) -> EvaluationReceipt {
        EvaluationReceipt {
            evaluation_id: self.id,
            workshop_id: self.workshop_id.clone(),
            student_id: self.student_id.clone(),
            grade: self.grade,
            taken_at: self.taken_at,
        }
    }
}

/// What a caller gets back once an evaluation has been accepted by the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReceipt {
    pub evaluation_id: Uuid,
    pub workshop_id: String,
    pub student_id: String,
    pub grade: Grade,
    pub taken_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_display_and_parse() {
        assert_eq!(Grade::Green.to_string(), "green");
        assert_eq!("Orange".parse::<Grade>().unwrap(), Grade::Orange);
        assert_eq!(" red ".parse::<Grade>().unwrap(), Grade::Red);
        assert!("blue".parse::<Grade>().is_err());
    }

    #[test]
    fn grade_ordering() {
        assert!(Grade::Green > Grade::Orange);
        assert!(Grade::Orange > Grade::Red);
        assert_eq!(Grade::ALL.iter().max(), Some(&Grade::Green));
    }

    #[test]
    fn grade_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Grade::Orange).unwrap(), "\"orange\"");
    }

    #[test]
    fn student_initials() {
        let student = Student {
            id: "1".into(),
            name: "Emma Martin".into(),
            last_grade: None,
            last_evaluated_at: None,
        };
        assert_eq!(student.initials(), "EM");

        let student = Student {
            name: "chloé  durand".into(),
            ..student
        };
        assert_eq!(student.initials(), "CD");
    }

    #[test]
    fn captured_image_debug_hides_bytes() {
        let image = CapturedImage::from_jpeg(vec![0xFF; 64], 8, 8);
        let debug = format!("{image:?}");
        assert!(debug.contains("len: 64"));
        assert!(!debug.contains("255"));
    }
}
