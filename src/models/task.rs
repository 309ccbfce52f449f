//! Atomic lesson task.
//!
//! A task is one lesson-hour derived from a requirement/teacher pair by
//! the task builder. Tasks are immutable after creation; their identity
//! persists through all pipeline stages while their slot assignment
//! lives in the [`Placement`].
//!
//! [`Placement`]: super::Placement

use serde::{Deserialize, Serialize};

use super::{ClassId, SubjectId, TeacherId};

/// Task identifier, unique and stable within a run.
pub type TaskId = usize;

/// One atomic lesson-hour to be placed into a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier within the run.
    pub id: TaskId,
    /// Class receiving the lesson.
    pub class_id: ClassId,
    /// Subject taught.
    pub subject_id: SubjectId,
    /// Teacher delivering the lesson.
    pub teacher_id: TeacherId,
    /// Room the lesson occupies.
    pub room: String,
    /// Whether the lesson covers a subgroup rather than the whole class.
    pub is_subgroup: bool,
}

impl Task {
    /// Creates a whole-class task.
    pub fn new(
        id: TaskId,
        class_id: ClassId,
        subject_id: SubjectId,
        teacher_id: TeacherId,
        room: impl Into<String>,
    ) -> Self {
        Self {
            id,
            class_id,
            subject_id,
            teacher_id,
            room: room.into(),
            is_subgroup: false,
        }
    }

    /// Marks the task as a subgroup lesson.
    pub fn subgroup(mut self) -> Self {
        self.is_subgroup = true;
        self
    }
}
