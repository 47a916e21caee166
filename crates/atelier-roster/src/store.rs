//! In-memory classroom data.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::error::{PersistError, RosterError};
use atelier_core::model::{Evaluation, EvaluationReceipt, Grade, Student, Workshop};
use atelier_core::traits::{EvaluationSink, Roster};

use crate::export::{write_evaluation, ExportedFiles};

/// Dashboard numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomSummary {
    pub workshops: usize,
    /// Sum of the advertised student counts of every workshop.
    pub students: u32,
    pub evaluations: usize,
}

#[derive(Default)]
struct Inner {
    workshops: Vec<Workshop>,
    rosters: HashMap<String, Vec<Student>>,
    evaluations: Vec<Evaluation>,
}

/// Workshops, their rosters and the evaluations recorded against them.
///
/// Acts as both the [`Roster`] a session reads from and the
/// [`EvaluationSink`] it writes to. Recording an evaluation updates the
/// student's last grade.
#[derive(Default)]
pub struct ClassroomStore {
    inner: RwLock<Inner>,
}

fn day(year: i32, month: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, d, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

impl ClassroomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two workshops sharing the same eight-student roster.
    pub fn demo() -> Self {
        let students = || {
            let entry = |id: &str, name: &str, grade: Option<Grade>, at: Option<DateTime<Utc>>| {
                Student {
                    id: id.into(),
                    name: name.into(),
                    last_grade: grade,
                    last_evaluated_at: at,
                }
            };
            vec![
                entry("1", "Emma Martin", Some(Grade::Green), Some(day(2024, 1, 20))),
                entry("2", "Lucas Dubois", Some(Grade::Orange), Some(day(2024, 1, 19))),
                entry("3", "Chloé Durand", None, None),
                entry("4", "Nathan Leroy", Some(Grade::Red), Some(day(2024, 1, 18))),
                entry("5", "Léa Moreau", Some(Grade::Green), Some(day(2024, 1, 21))),
                entry("6", "Hugo Simon", None, None),
                entry("7", "Manon Laurent", Some(Grade::Orange), Some(day(2024, 1, 17))),
                entry("8", "Théo Petit", Some(Grade::Green), Some(day(2024, 1, 22))),
            ]
        };

        Self::new()
            .with_workshop(
                Workshop {
                    id: "1".into(),
                    name: "Mathématiques".into(),
                    description: "Mathematical problem-solving workshop".into(),
                    student_count: 24,
                    created_at: day(2024, 1, 15),
                },
                students(),
            )
            .with_workshop(
                Workshop {
                    id: "2".into(),
                    name: "Sciences".into(),
                    description: "Scientific experiments and discoveries".into(),
                    student_count: 22,
                    created_at: day(2024, 1, 16),
                },
                students(),
            )
    }

    /// Seed a workshop and its roster.
    pub fn with_workshop(self, workshop: Workshop, students: Vec<Student>) -> Self {
        {
            let mut inner = self.write();
            inner.rosters.insert(workshop.id.clone(), students);
            inner.workshops.push(workshop);
        }
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn workshops(&self) -> Vec<Workshop> {
        self.read().workshops.clone()
    }

    pub fn workshop(&self, id: &str) -> Option<Workshop> {
        self.read().workshops.iter().find(|w| w.id == id).cloned()
    }

    pub fn students(&self, workshop_id: &str) -> Result<Vec<Student>, RosterError> {
        self.read()
            .rosters
            .get(workshop_id)
            .cloned()
            .ok_or_else(|| RosterError::UnknownWorkshop(workshop_id.to_string()))
    }

    /// Students whose name contains `term`, ignoring case.
    pub fn search_students(
        &self,
        workshop_id: &str,
        term: &str,
    ) -> Result<Vec<Student>, RosterError> {
        let needle = term.trim().to_lowercase();
        let mut students = self.students(workshop_id)?;
        students.retain(|s| s.name.to_lowercase().contains(&needle));
        Ok(students)
    }

    pub fn summary(&self) -> ClassroomSummary {
        let inner = self.read();
        ClassroomSummary {
            workshops: inner.workshops.len(),
            students: inner.workshops.iter().map(|w| w.student_count).sum(),
            evaluations: inner.evaluations.len(),
        }
    }

    /// Receipts for everything recorded so far, oldest first.
    pub fn receipts(&self) -> Vec<EvaluationReceipt> {
        self.read()
            .evaluations
            .iter()
            .map(Evaluation::receipt)
            .collect()
    }

    /// Write a recorded evaluation's photo and metadata into `dir`.
    pub fn export_evaluation(&self, id: Uuid, dir: &Path) -> Result<ExportedFiles> {
        let inner = self.read();
        let evaluation = inner
            .evaluations
            .iter()
            .find(|e| e.id() == id)
            .ok_or_else(|| anyhow::anyhow!("no evaluation with id {id}"))?;
        write_evaluation(dir, evaluation)
    }
}

#[async_trait]
impl Roster for ClassroomStore {
    async fn get_student(
        &self,
        workshop_id: &str,
        student_id: &str,
    ) -> Result<Student, RosterError> {
        self.students(workshop_id)?
            .into_iter()
            .find(|s| s.id == student_id)
            .ok_or_else(|| RosterError::UnknownStudent {
                workshop_id: workshop_id.to_string(),
                student_id: student_id.to_string(),
            })
    }
}

#[async_trait]
impl EvaluationSink for ClassroomStore {
    async fn save_evaluation(&self, evaluation: Evaluation) -> Result<(), PersistError> {
        let mut inner = self.write();
        let student = inner
            .rosters
            .get_mut(evaluation.workshop_id())
            .and_then(|roster| roster.iter_mut().find(|s| s.id == evaluation.student_id()));

        let Some(student) = student else {
            let reason = format!(
                "no student {} in workshop {}",
                evaluation.student_id(),
                evaluation.workshop_id()
            );
            return Err(PersistError::new(reason, evaluation));
        };

        student.last_grade = Some(evaluation.grade());
        student.last_evaluated_at = Some(evaluation.taken_at());
        tracing::debug!(
            "recorded {} for {} ({} bytes)",
            evaluation.grade(),
            student.name,
            evaluation.image().bytes().len()
        );
        inner.evaluations.push(evaluation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use atelier_core::clock::FixedClock;
    use atelier_core::draft::EvaluationDraft;
    use atelier_core::encode::encode_jpeg;
    use atelier_core::traits::Frame;

    use super::*;
    use crate::export::EvaluationRecord;

    fn evaluation(workshop_id: &str, student_id: &str, grade: Grade) -> Evaluation {
        let mut draft = EvaluationDraft::new();
        draft.set_image(encode_jpeg(&Frame::filled(16, 12, [10, 200, 10]), 80).unwrap());
        draft.set_grade(grade);
        draft
            .commit(workshop_id, student_id, &FixedClock(day(2024, 2, 1)))
            .unwrap()
    }

    #[test]
    fn demo_summary_matches_dashboard() {
        let store = ClassroomStore::demo();
        let summary = store.summary();
        assert_eq!(summary.workshops, 2);
        assert_eq!(summary.students, 46);
        assert_eq!(summary.evaluations, 0);
    }

    #[test]
    fn search_is_case_insensitive() {
        let store = ClassroomStore::demo();
        let found = store.search_students("1", "MAR").unwrap();
        let names: Vec<_> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Emma Martin"]);

        assert_eq!(store.search_students("1", "").unwrap().len(), 8);
        assert!(store.search_students("1", "zzz").unwrap().is_empty());
        assert_eq!(
            store.search_students("9", "emma").unwrap_err(),
            RosterError::UnknownWorkshop("9".into())
        );
    }

    #[tokio::test]
    async fn get_student_looks_up_roster() {
        let store = ClassroomStore::demo();
        let student = store.get_student("2", "3").await.unwrap();
        assert_eq!(student.name, "Chloé Durand");
        assert!(student.last_grade.is_none());

        assert!(matches!(
            store.get_student("2", "99").await,
            Err(RosterError::UnknownStudent { .. })
        ));
    }

    #[tokio::test]
    async fn saving_updates_last_grade() {
        let store = ClassroomStore::demo();
        store
            .save_evaluation(evaluation("1", "3", Grade::Orange))
            .await
            .unwrap();

        let student = store.get_student("1", "3").await.unwrap();
        assert_eq!(student.last_grade, Some(Grade::Orange));
        assert_eq!(student.last_evaluated_at, Some(day(2024, 2, 1)));
        // the other workshop keeps its own roster
        assert!(store.get_student("2", "3").await.unwrap().last_grade.is_none());
        assert_eq!(store.summary().evaluations, 1);
    }

    #[tokio::test]
    async fn saving_for_unknown_student_hands_evaluation_back() {
        let store = ClassroomStore::demo();
        let err = store
            .save_evaluation(evaluation("1", "99", Grade::Red))
            .await
            .unwrap_err();
        assert!(err.reason().contains("no student 99"));
        assert_eq!(err.into_evaluation().grade(), Grade::Red);
        assert!(store.receipts().is_empty());
    }

    #[tokio::test]
    async fn export_writes_image_and_record() {
        let store = ClassroomStore::demo();
        let evaluation = evaluation("2", "8", Grade::Green);
        let id = evaluation.id();
        store.save_evaluation(evaluation).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let files = store.export_evaluation(id, dir.path()).unwrap();

        let jpeg = std::fs::read(&files.image).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let record = EvaluationRecord::load_json(&files.metadata).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.grade, Grade::Green);
        assert_eq!((record.image.width, record.image.height), (16, 12));
        assert_eq!(record.image.bytes, jpeg.len());
        assert_eq!(record.image.file, format!("{id}.jpg"));
    }

    #[test]
    fn export_unknown_id_fails() {
        let store = ClassroomStore::demo();
        let dir = tempfile::tempdir().unwrap();
        assert!(store.export_evaluation(Uuid::nil(), dir.path()).is_err());
    }
}
