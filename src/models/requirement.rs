//! Teaching requirement model.
//!
//! A requirement is one (class, subject) obligation for the scheduling
//! period: how many weekly hours the class owes the subject, which
//! teachers cover them, and which rooms each teacher may use. Input is
//! assumed resolved (valid ids, rooms pre-filtered by eligibility) but
//! not trusted on hour totals — the task builder clamps those.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Class (group of students) identifier.
pub type ClassId = u32;
/// Subject identifier.
pub type SubjectId = u32;
/// Teacher identifier.
pub type TeacherId = u32;

/// One (class, subject) teaching obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    /// Class receiving the lessons.
    pub class_id: ClassId,
    /// Subject being taught.
    pub subject_id: SubjectId,
    /// Authoritative cap on weekly hours for this (class, subject) pair.
    pub total_hours_per_week: u32,
    /// Whether two or more teachers split the class into parallel subgroups.
    pub has_subgroups: bool,
    /// Teachers covering the obligation, with per-teacher loads.
    pub teachers: Vec<TeacherLoad>,
}

/// A teacher's share of a requirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherLoad {
    /// Teacher identifier.
    pub teacher_id: TeacherId,
    /// Weekly hours this teacher contributes. May exceed the requirement
    /// total in raw data; the builder clamps it.
    pub hours_per_week: u32,
    /// Candidate rooms, ordered by ascending priority (best first).
    pub candidate_rooms: Vec<RoomOption>,
}

/// A room a teacher may use, with scheduling attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomOption {
    /// Room name (unique within the school).
    pub name: String,
    /// Selection priority; lower is preferred.
    pub priority: u32,
    /// How many classes the room holds simultaneously.
    pub max_concurrent_classes: u32,
    /// Room admits only subgroup lessons.
    pub subgroups_only: bool,
    /// Room is reserved for a single subject, if set.
    pub exclusive_subject: Option<SubjectId>,
}

/// Scheduling attributes of a room, keyed by name in [`RoomDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// How many classes the room holds simultaneously.
    pub max_concurrent_classes: u32,
    /// Room admits only subgroup lessons.
    pub subgroups_only: bool,
    /// Room is reserved for a single subject, if set.
    pub exclusive_subject: Option<SubjectId>,
}

/// Room attributes by name, derived from the requirements' candidate
/// rooms. The first occurrence of a name wins.
pub type RoomDirectory = HashMap<String, RoomInfo>;

impl Requirement {
    /// Creates a requirement with no teachers.
    pub fn new(class_id: ClassId, subject_id: SubjectId, total_hours_per_week: u32) -> Self {
        Self {
            class_id,
            subject_id,
            total_hours_per_week,
            has_subgroups: false,
            teachers: Vec::new(),
        }
    }

    /// Marks the requirement as split into parallel subgroups.
    pub fn with_subgroups(mut self) -> Self {
        self.has_subgroups = true;
        self
    }

    /// Adds a teacher load.
    pub fn with_teacher(mut self, teacher: TeacherLoad) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// Sum of raw (unclamped) teacher hours.
    pub fn raw_teacher_hours(&self) -> u32 {
        self.teachers.iter().map(|t| t.hours_per_week).sum()
    }
}

impl TeacherLoad {
    /// Creates a teacher load with no rooms.
    pub fn new(teacher_id: TeacherId, hours_per_week: u32) -> Self {
        Self {
            teacher_id,
            hours_per_week,
            candidate_rooms: Vec::new(),
        }
    }

    /// Adds a candidate room.
    pub fn with_room(mut self, room: RoomOption) -> Self {
        self.candidate_rooms.push(room);
        self
    }

    /// Best-priority candidate room, if any.
    pub fn preferred_room(&self) -> Option<&RoomOption> {
        self.candidate_rooms.iter().min_by_key(|r| r.priority)
    }
}

impl RoomOption {
    /// Creates a single-class room with the given name and priority.
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            max_concurrent_classes: 1,
            subgroups_only: false,
            exclusive_subject: None,
        }
    }

    /// Sets the concurrent-class capacity.
    pub fn with_capacity(mut self, max_concurrent_classes: u32) -> Self {
        self.max_concurrent_classes = max_concurrent_classes;
        self
    }

    /// Restricts the room to subgroup lessons.
    pub fn subgroups_only(mut self) -> Self {
        self.subgroups_only = true;
        self
    }

    /// Reserves the room for one subject.
    pub fn exclusive_to(mut self, subject_id: SubjectId) -> Self {
        self.exclusive_subject = Some(subject_id);
        self
    }

    /// The scheduling attributes of this option.
    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            max_concurrent_classes: self.max_concurrent_classes,
            subgroups_only: self.subgroups_only,
            exclusive_subject: self.exclusive_subject,
        }
    }
}
