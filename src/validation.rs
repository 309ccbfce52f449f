//! Input validation for timetabling problems.
//!
//! Checks structural integrity of requirements before solving. Detects:
//! - Duplicate (class, subject) requirements
//! - Teachers carrying hours without any candidate room
//! - Degenerate allowed subgroup pairs
//!
//! These are the fatal-configuration class of problems: everything the
//! pipeline can degrade gracefully on (excess hours, unplaceable
//! lessons) is deliberately not validated here and surfaces as warnings
//! instead.

use std::collections::HashSet;

use crate::models::{Requirement, SubjectId};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two requirements share the same (class, subject) pair.
    DuplicateRequirement,
    /// A teacher has weekly hours but no candidate room.
    MissingRooms,
    /// An allowed subgroup pair names the same subject twice.
    DegenerateSubgroupPair,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates requirements and allowed subgroup pairs.
///
/// Collects all detected issues rather than stopping at the first.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` otherwise.
pub fn validate_input(
    requirements: &[Requirement],
    subgroup_pairs: &[(SubjectId, SubjectId)],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for req in requirements {
        if !seen.insert((req.class_id, req.subject_id)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateRequirement,
                format!(
                    "duplicate requirement for class {}, subject {}",
                    req.class_id, req.subject_id
                ),
            ));
        }

        for teacher in &req.teachers {
            if teacher.hours_per_week > 0 && teacher.candidate_rooms.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingRooms,
                    format!(
                        "teacher {} has {} hours for class {}, subject {} but no candidate room",
                        teacher.teacher_id, teacher.hours_per_week, req.class_id, req.subject_id
                    ),
                ));
            }
        }
    }

    for (a, b) in subgroup_pairs {
        if a == b {
            errors.push(ValidationError::new(
                ValidationErrorKind::DegenerateSubgroupPair,
                format!("subgroup pair ({a}, {b}) names the same subject twice"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
