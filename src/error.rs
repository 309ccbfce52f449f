//! Fatal error types for the solving pipeline.
//!
//! Only configuration-class problems abort a run: malformed slot grids,
//! requirements that cannot be scheduled at all (no rooms), structurally
//! broken input. Everything else — unplaceable lessons, clamped hours,
//! solver timeouts — degrades to warnings on the [`SolveOutcome`].
//!
//! [`SolveOutcome`]: crate::solver::SolveOutcome

use thiserror::Error;

use crate::models::{ClassId, SubjectId};
use crate::validation::ValidationError;

/// Errors that abort a solving run.
#[derive(Error, Debug)]
pub enum SolveError {
    /// The schedule settings describe an unusable slot grid.
    #[error("invalid schedule settings: {reason}")]
    InvalidSettings { reason: String },

    /// A teacher carries weekly hours but has no candidate room.
    #[error("no usable rooms for class {class_id}, subject {subject_id}")]
    NoUsableRooms {
        class_id: ClassId,
        subject_id: SubjectId,
    },

    /// Structural validation of the input failed.
    #[error("invalid input: {}", format_validation_errors(.0))]
    InvalidInput(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
