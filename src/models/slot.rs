//! Slot grid: the week's scheduling positions.
//!
//! A slot is a (day, lesson-number) position. The grid owns per-day
//! lesson counts and the mapping between slots and flat slot indices
//! used by the exact-refinement stage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SolveError;

/// A (day, lesson) scheduling position.
///
/// Days are zero-based; lesson numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    /// Day of week, `0..days`.
    pub day: u8,
    /// Lesson number within the day, `1..=lessons_on(day)`.
    pub lesson: u8,
}

impl Slot {
    /// Creates a slot.
    pub fn new(day: u8, lesson: u8) -> Self {
        Self { day, lesson }
    }
}

/// Per-day lesson counts with flat-index arithmetic.
///
/// Built once per run from the caller's schedule settings; days absent
/// from the settings use the default lesson count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    lessons_per_day: Vec<u8>,
    cumulative: Vec<usize>,
}

impl SlotGrid {
    /// Builds a grid of `days` days.
    ///
    /// `settings` maps a zero-based day to its lesson count; missing
    /// days fall back to `default_lessons`.
    ///
    /// # Errors
    /// Rejects empty grids, zero lesson counts, and settings referring
    /// to days outside `0..days`.
    pub fn new(days: u8, default_lessons: u8, settings: &HashMap<u8, u8>) -> Result<Self, SolveError> {
        if days == 0 {
            return Err(SolveError::InvalidSettings {
                reason: "schedule has zero days".into(),
            });
        }
        if default_lessons == 0 {
            return Err(SolveError::InvalidSettings {
                reason: "default lesson count is zero".into(),
            });
        }
        if let Some(day) = settings.keys().find(|d| **d >= days) {
            return Err(SolveError::InvalidSettings {
                reason: format!("settings refer to day {day} outside 0..{days}"),
            });
        }
        if let Some((day, _)) = settings.iter().find(|(_, count)| **count == 0) {
            return Err(SolveError::InvalidSettings {
                reason: format!("day {day} has zero lessons"),
            });
        }

        let lessons_per_day: Vec<u8> = (0..days)
            .map(|d| settings.get(&d).copied().unwrap_or(default_lessons))
            .collect();
        let mut cumulative = Vec::with_capacity(days as usize + 1);
        cumulative.push(0);
        for &count in &lessons_per_day {
            cumulative.push(cumulative.last().unwrap() + count as usize);
        }

        Ok(Self {
            lessons_per_day,
            cumulative,
        })
    }

    /// Number of days.
    pub fn days(&self) -> u8 {
        self.lessons_per_day.len() as u8
    }

    /// Lessons on the given day.
    pub fn lessons_on(&self, day: u8) -> u8 {
        self.lessons_per_day[day as usize]
    }

    /// Total slot count across the week.
    pub fn total_slots(&self) -> usize {
        *self.cumulative.last().unwrap()
    }

    /// Flat index of a slot.
    pub fn index_of(&self, slot: Slot) -> usize {
        self.cumulative[slot.day as usize] + slot.lesson as usize - 1
    }

    /// Slot at a flat index.
    pub fn slot_at(&self, index: usize) -> Slot {
        let day = self
            .cumulative
            .windows(2)
            .position(|w| w[0] <= index && index < w[1])
            .expect("slot index within grid");
        Slot::new(day as u8, (index - self.cumulative[day]) as u8 + 1)
    }

    /// Flat index range covered by a day.
    pub fn day_range(&self, day: u8) -> std::ops::Range<usize> {
        self.cumulative[day as usize]..self.cumulative[day as usize + 1]
    }

    /// Whether the slot lies within the grid.
    pub fn contains(&self, slot: Slot) -> bool {
        slot.day < self.days() && slot.lesson >= 1 && slot.lesson <= self.lessons_on(slot.day)
    }

    /// Iterates the slots of a day in lesson order.
    pub fn iter_day(&self, day: u8) -> impl Iterator<Item = Slot> + '_ {
        (1..=self.lessons_on(day)).map(move |lesson| Slot::new(day, lesson))
    }
}
