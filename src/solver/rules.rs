//! Shared hard-constraint checks and day ordering.
//!
//! Greedy placement, LNS rebuild, and the exact-stage decode all admit
//! a task into a slot under the same rules: teacher exclusivity, room
//! capacity, class-cell subject compatibility, and the
//! max-two-consecutive limit. The category day cap and the
//! category-aware day ordering are soft — they reorder or skip days but
//! never make a placement illegal.

use std::collections::HashMap;

use crate::models::{Placement, RoomDirectory, Slot, SlotGrid, SubjectId, Task};

/// Soft cap on lessons of one category per class per day.
pub const MAX_CATEGORY_PER_DAY: u32 = 3;

/// Shared context for placement checks.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The week's slot grid.
    pub grid: &'a SlotGrid,
    /// Room attributes by name.
    pub rooms: &'a RoomDirectory,
    /// Cross-subject pairs allowed to share a class cell.
    pub subgroup_pairs: &'a [(SubjectId, SubjectId)],
    /// Subject categories for soft balancing; absent entries disable it.
    pub categories: &'a HashMap<SubjectId, String>,
}

impl RuleContext<'_> {
    /// Whether the task may legally occupy the slot.
    pub fn admits(&self, placement: &Placement, task: &Task, slot: Slot) -> bool {
        if placement.teacher_busy(task.teacher_id, slot) {
            return false;
        }

        let capacity = self
            .rooms
            .get(&task.room)
            .map(|r| r.max_concurrent_classes)
            .unwrap_or(1);
        if placement.room_load(&task.room, slot) >= capacity {
            return false;
        }

        if !self.cell_accepts(task, placement.cell(task.class_id, slot)) {
            return false;
        }

        !self.creates_triple(placement, task, slot)
    }

    /// Class-cell subject compatibility.
    ///
    /// A cell holds one subject, except for explicitly allowed subgroup
    /// pairs; two whole-class lessons of different subjects never
    /// coexist, and a cell never holds more than two distinct subjects.
    pub fn cell_accepts(&self, task: &Task, existing: &[Task]) -> bool {
        if existing.is_empty() {
            return true;
        }

        let mut subjects: Vec<SubjectId> = existing.iter().map(|t| t.subject_id).collect();
        subjects.sort_unstable();
        subjects.dedup();

        if subjects.contains(&task.subject_id) {
            // Parallel lessons of one subject; teacher exclusivity rules
            // out the degenerate same-teacher case elsewhere.
            return true;
        }

        if subjects.len() >= 2 {
            return false;
        }

        let existing_has_whole = existing.iter().any(|t| !t.is_subgroup);
        if !task.is_subgroup && existing_has_whole {
            return false;
        }

        subjects.iter().any(|&resident| {
            self.subgroup_pairs.iter().any(|&(a, b)| {
                (task.subject_id == a && resident == b) || (task.subject_id == b && resident == a)
            })
        })
    }

    /// Whether placing the task would create three consecutive lessons
    /// of its subject for its class on the slot's day.
    pub fn creates_triple(&self, placement: &Placement, task: &Task, slot: Slot) -> bool {
        let mut lessons = placement.subject_lessons(task.class_id, slot.day, task.subject_id);
        if !lessons.contains(&slot.lesson) {
            lessons.push(slot.lesson);
            lessons.sort_unstable();
        }
        lessons
            .windows(3)
            .any(|w| w[2] == w[0] + 2)
    }

    /// Category of a subject, if configured.
    pub fn category_of(&self, subject_id: SubjectId) -> Option<&str> {
        self.categories.get(&subject_id).map(String::as_str)
    }

    /// Lessons of the given category a class already has on a day.
    pub fn category_day_count(&self, placement: &Placement, class_id: u32, day: u8, category: &str) -> u32 {
        placement
            .iter()
            .filter(|((c, slot), _)| *c == class_id && slot.day == day)
            .flat_map(|(_, tasks)| tasks.iter())
            .filter(|t| self.category_of(t.subject_id) == Some(category))
            .count() as u32
    }

    /// Whether the task's category has reached the per-day cap.
    pub fn category_day_full(&self, placement: &Placement, task: &Task, day: u8) -> bool {
        match self.category_of(task.subject_id) {
            Some(category) => {
                self.category_day_count(placement, task.class_id, day, category)
                    >= MAX_CATEGORY_PER_DAY
            }
            None => false,
        }
    }

    /// Days ordered by category-balance preference.
    ///
    /// Days that do not yet hold the task's category come first, days
    /// already holding two or more come last; ties keep day order.
    pub fn day_order(&self, placement: &Placement, task: &Task) -> Vec<u8> {
        let mut days: Vec<(u8, i32)> = (0..self.grid.days())
            .map(|day| {
                let priority = match self.category_of(task.subject_id) {
                    Some(category) => {
                        let count =
                            self.category_day_count(placement, task.class_id, day, category);
                        if count == 0 {
                            -100
                        } else if count >= 2 {
                            100
                        } else {
                            count as i32 * 10
                        }
                    }
                    None => 0,
                };
                (day, priority)
            })
            .collect();
        days.sort_by_key(|&(_, priority)| priority);
        days.into_iter().map(|(day, _)| day).collect()
    }
}
