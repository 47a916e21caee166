pub mod evaluate;
pub mod init;
pub mod students;
pub mod workshops;

use atelier_core::model::Grade;

/// "Excellent (green)", or a placeholder for students never graded.
pub(crate) fn describe_grade(grade: Option<Grade>) -> String {
    match grade {
        Some(grade) => format!("{} ({grade})", grade.label()),
        None => "-".to_string(),
    }
}
