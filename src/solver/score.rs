//! Soft-quality scoring of placements.
//!
//! A pure, deterministic measure shared by the greedy stage (via day
//! ordering), the LNS acceptance criterion, and post-hoc reporting.
//! Lower is better; zero means no gaps, no consecutive-run violations,
//! and no category imbalance.
//!
//! Weights: +1000 per class-day with a gap, +5000 per same-subject
//! three-in-a-row (a safety net — the hard rules prevent it), −10 per
//! adjacent same-subject lesson pair in pairs mode, +50 per lesson of
//! category excess beyond three per class-day, −5 per distinct day a
//! category appears on per class. The sum is clamped at zero.

use std::collections::HashMap;

use crate::models::{ClassId, Placement, SlotGrid, SubjectId};

use super::LessonMode;

/// Computes the soft score of a placement. Pure and deterministic.
pub fn soft_score(
    placement: &Placement,
    grid: &SlotGrid,
    categories: &HashMap<SubjectId, String>,
    mode: LessonMode,
) -> i64 {
    let mut score: i64 = 0;

    score += 1000 * count_windows(placement, grid) as i64;

    let subject_days = subject_day_lessons(placement);
    for lessons in subject_days.values() {
        score += 5000 * triple_runs(lessons) as i64;
        if mode == LessonMode::Pairs {
            score -= 10 * adjacent_pairs(lessons) as i64;
        }
    }

    if !categories.is_empty() {
        // Per (class, day, category) counts and per (class, category) day spread.
        let mut day_counts: HashMap<(ClassId, u8, &str), u32> = HashMap::new();
        let mut spread: HashMap<(ClassId, &str), Vec<u8>> = HashMap::new();
        for ((class_id, slot), tasks) in placement.iter() {
            for task in tasks {
                if let Some(category) = categories.get(&task.subject_id) {
                    *day_counts
                        .entry((*class_id, slot.day, category.as_str()))
                        .or_insert(0) += 1;
                    let days = spread.entry((*class_id, category.as_str())).or_default();
                    if !days.contains(&slot.day) {
                        days.push(slot.day);
                    }
                }
            }
        }
        for count in day_counts.values() {
            if *count > 3 {
                score += 50 * (*count as i64 - 3);
            }
        }
        for days in spread.values() {
            score -= 5 * days.len() as i64;
        }
    }

    score.max(0)
}

/// Number of (class, day) pairs whose occupied lessons are not contiguous.
pub fn count_windows(placement: &Placement, grid: &SlotGrid) -> usize {
    let mut windows = 0;
    for class_id in placement.classes() {
        for day in 0..grid.days() {
            let lessons = placement.lessons_for(class_id, day);
            if lessons.len() > 1 {
                let span = (lessons[lessons.len() - 1] - lessons[0] + 1) as usize;
                if span > lessons.len() {
                    windows += 1;
                }
            }
        }
    }
    windows
}

/// Number of adjacent same-subject lesson pairs across the placement.
///
/// Returns zero in single mode, where pairing carries no reward.
pub fn count_pairs(placement: &Placement, mode: LessonMode) -> usize {
    if mode != LessonMode::Pairs {
        return 0;
    }
    subject_day_lessons(placement)
        .values()
        .map(|lessons| adjacent_pairs(lessons))
        .sum()
}

/// Sorted, deduplicated lesson numbers per (class, day, subject).
fn subject_day_lessons(placement: &Placement) -> HashMap<(ClassId, u8, SubjectId), Vec<u8>> {
    let mut map: HashMap<(ClassId, u8, SubjectId), Vec<u8>> = HashMap::new();
    for ((class_id, slot), tasks) in placement.iter() {
        for task in tasks {
            let lessons = map
                .entry((*class_id, slot.day, task.subject_id))
                .or_default();
            if !lessons.contains(&slot.lesson) {
                lessons.push(slot.lesson);
            }
        }
    }
    for lessons in map.values_mut() {
        lessons.sort_unstable();
    }
    map
}

fn triple_runs(lessons: &[u8]) -> usize {
    lessons.windows(3).filter(|w| w[2] == w[0] + 2).count()
}

fn adjacent_pairs(lessons: &[u8]) -> usize {
    lessons.windows(2).filter(|w| w[1] == w[0] + 1).count()
}
