//! The grade + photo pair collected during a session.

use crate::clock::Clock;
use crate::error::SessionError;
use crate::model::{CapturedImage, Evaluation, Grade};

/// Transient choices for one evaluation. Committable once both the image and
/// the grade are present.
#[derive(Debug, Default)]
pub struct EvaluationDraft {
    image: Option<CapturedImage>,
    grade: Option<Grade>,
    committed: bool,
}

impl EvaluationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `image`, discarding any previous one.
    pub fn set_image(&mut self, image: CapturedImage) {
        self.image = Some(image);
    }

    /// Drop the held image, if any.
    pub fn clear_image(&mut self) -> Option<CapturedImage> {
        self.image.take()
    }

    pub fn set_grade(&mut self, grade: Grade) {
        self.grade = Some(grade);
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn grade(&self) -> Option<Grade> {
        self.grade
    }

    pub fn is_committable(&self) -> bool {
        self.image.is_some() && self.grade.is_some()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Turn the draft into an [`Evaluation`] stamped with `clock.now()`.
    ///
    /// The image moves into the evaluation. An incomplete draft is left
    /// untouched; a draft that was already committed must be
    /// [`reset`](Self::reset) or [`restore`](Self::restore)d first.
    pub fn commit(
        &mut self,
        workshop_id: &str,
        student_id: &str,
        clock: &dyn Clock,
    ) -> Result<Evaluation, SessionError> {
        if self.committed {
            return Err(SessionError::invalid("commit", "committed"));
        }
        if !self.is_committable() {
            return Err(SessionError::IncompleteDraft);
        }
        let (Some(image), Some(grade)) = (self.image.take(), self.grade) else {
            return Err(SessionError::IncompleteDraft);
        };
        self.committed = true;
        Ok(Evaluation::new(
            workshop_id,
            student_id,
            grade,
            image,
            clock.now(),
        ))
    }

    /// Put a rejected evaluation's grade and image back so it can be
    /// committed again.
    pub fn restore(&mut self, evaluation: Evaluation) {
        let (grade, image) = evaluation.into_parts();
        self.image = Some(image);
        self.grade = Some(grade);
        self.committed = false;
    }

    /// Clear the committed flag after an evaluation was lost before the sink
    /// answered. The grade stays; the image went with the evaluation.
    pub fn reopen(&mut self) {
        self.committed = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
