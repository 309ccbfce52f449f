//! Placement: the evolving assignment of tasks to slots.
//!
//! The placement is the central structure threaded through all pipeline
//! stages. It stores per-cell task lists keyed by (class, slot) and
//! maintains typed occupancy indices — teacher-per-slot and
//! room-load-per-slot counters — so feasibility checks never rescan the
//! whole mapping. Legality of an insertion is the rule set's concern;
//! the placement itself is mechanical bookkeeping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ClassId, Slot, SubjectId, Task, TeacherId};

/// A flattened placed lesson, used for outbound suggestions and inbound
/// pre-existing assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedLesson {
    /// Day of week, zero-based.
    pub day: u8,
    /// Lesson number, starting at 1.
    pub lesson: u8,
    /// Class receiving the lesson.
    pub class_id: ClassId,
    /// Subject taught.
    pub subject_id: SubjectId,
    /// Teacher delivering the lesson.
    pub teacher_id: TeacherId,
    /// Room occupied.
    pub room: String,
    /// Whether the lesson covers a subgroup.
    pub is_subgroup: bool,
}

impl PlacedLesson {
    /// Builds the flattened form of a placed task.
    pub fn from_task(task: &Task, slot: Slot) -> Self {
        Self {
            day: slot.day,
            lesson: slot.lesson,
            class_id: task.class_id,
            subject_id: task.subject_id,
            teacher_id: task.teacher_id,
            room: task.room.clone(),
            is_subgroup: task.is_subgroup,
        }
    }

    /// The slot this lesson occupies.
    pub fn slot(&self) -> Slot {
        Slot::new(self.day, self.lesson)
    }

    /// Rebuilds a task carrying the given id.
    pub fn to_task(&self, id: usize) -> Task {
        Task {
            id,
            class_id: self.class_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            room: self.room.clone(),
            is_subgroup: self.is_subgroup,
        }
    }
}

/// Mapping `(class, slot) → tasks` with occupancy indices.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    cells: HashMap<(ClassId, Slot), Vec<Task>>,
    teacher_busy: HashMap<(TeacherId, Slot), u32>,
    room_load: HashMap<Slot, HashMap<String, u32>>,
}

impl Placement {
    /// Creates an empty placement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a task in a cell and updates the occupancy indices.
    pub fn place(&mut self, task: Task, slot: Slot) {
        *self
            .teacher_busy
            .entry((task.teacher_id, slot))
            .or_insert(0) += 1;
        *self
            .room_load
            .entry(slot)
            .or_default()
            .entry(task.room.clone())
            .or_insert(0) += 1;
        self.cells.entry((task.class_id, slot)).or_default().push(task);
    }

    /// Removes a whole cell, returning its tasks and releasing their
    /// occupancy.
    pub fn clear_cell(&mut self, class_id: ClassId, slot: Slot) -> Vec<Task> {
        let tasks = self.cells.remove(&(class_id, slot)).unwrap_or_default();
        for task in &tasks {
            if let Some(count) = self.teacher_busy.get_mut(&(task.teacher_id, slot)) {
                *count -= 1;
                if *count == 0 {
                    self.teacher_busy.remove(&(task.teacher_id, slot));
                }
            }
            if let Some(rooms) = self.room_load.get_mut(&slot) {
                if let Some(count) = rooms.get_mut(&task.room) {
                    *count -= 1;
                    if *count == 0 {
                        rooms.remove(&task.room);
                    }
                }
            }
        }
        tasks
    }

    /// Whether a teacher already has a lesson in the slot.
    pub fn teacher_busy(&self, teacher_id: TeacherId, slot: Slot) -> bool {
        self.teacher_busy.contains_key(&(teacher_id, slot))
    }

    /// Slots a teacher occupies, in no particular order.
    pub fn teacher_slots(&self, teacher_id: TeacherId) -> Vec<Slot> {
        self.teacher_busy
            .keys()
            .filter(|(t, _)| *t == teacher_id)
            .map(|(_, slot)| *slot)
            .collect()
    }

    /// How many classes currently occupy the room in the slot.
    pub fn room_load(&self, room: &str, slot: Slot) -> u32 {
        self.room_load
            .get(&slot)
            .and_then(|rooms| rooms.get(room))
            .copied()
            .unwrap_or(0)
    }

    /// Tasks in a cell; empty when the cell is free.
    pub fn cell(&self, class_id: ClassId, slot: Slot) -> &[Task] {
        self.cells
            .get(&(class_id, slot))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Occupied cell keys, sorted for deterministic iteration.
    pub fn occupied_cells(&self) -> Vec<(ClassId, Slot)> {
        let mut keys: Vec<_> = self.cells.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Iterates cells and their tasks in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&(ClassId, Slot), &Vec<Task>)> {
        self.cells.iter()
    }

    /// Classes present in the placement, sorted.
    pub fn classes(&self) -> Vec<ClassId> {
        let mut ids: Vec<_> = self.cells.keys().map(|(c, _)| *c).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Occupied lesson numbers of a class on a day, sorted.
    pub fn lessons_for(&self, class_id: ClassId, day: u8) -> Vec<u8> {
        let mut lessons: Vec<_> = self
            .cells
            .iter()
            .filter(|((c, slot), tasks)| *c == class_id && slot.day == day && !tasks.is_empty())
            .map(|((_, slot), _)| slot.lesson)
            .collect();
        lessons.sort_unstable();
        lessons
    }

    /// Lesson numbers where a subject appears for a class on a day, sorted.
    pub fn subject_lessons(&self, class_id: ClassId, day: u8, subject_id: SubjectId) -> Vec<u8> {
        let mut lessons: Vec<_> = self
            .cells
            .iter()
            .filter(|((c, slot), tasks)| {
                *c == class_id && slot.day == day && tasks.iter().any(|t| t.subject_id == subject_id)
            })
            .map(|((_, slot), _)| slot.lesson)
            .collect();
        lessons.sort_unstable();
        lessons
    }

    /// Total number of placed lessons.
    pub fn lesson_count(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Flattens the placement into sorted [`PlacedLesson`] entries.
    pub fn to_lessons(&self) -> Vec<PlacedLesson> {
        let mut lessons = Vec::with_capacity(self.lesson_count());
        for ((_, slot), tasks) in &self.cells {
            for task in tasks {
                lessons.push(PlacedLesson::from_task(task, *slot));
            }
        }
        lessons.sort_by_key(|l| (l.day, l.lesson, l.class_id, l.subject_id, l.teacher_id));
        lessons
    }
}
