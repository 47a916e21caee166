//! atelier-roster: workshop rosters and the evaluation sink.
//!
//! An in-memory stand-in for the classroom data the evaluation core reads
//! from and writes to, plus JSON/JPEG export of recorded evaluations.

pub mod export;
pub mod store;

pub use export::{write_evaluation, EvaluationRecord, ExportedFiles};
pub use store::{ClassroomStore, ClassroomSummary};
