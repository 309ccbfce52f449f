//! Greedy placement stage.
//!
//! Places as many tasks as possible under the hard rules, visiting the
//! hardest tasks first: subgroup lessons, then subjects with many
//! hours. Days are tried in category-balance order; a day already
//! holding three lessons of the task's category is skipped rather than
//! rejected. Tasks that exhaust every day and slot are returned for the
//! exact-refinement stage — infeasibility never raises here.

use std::collections::HashMap;

use log::info;

use crate::models::{Placement, Task};

use super::rules::RuleContext;

/// Places tasks greedily, returning those that could not be placed.
pub fn place_tasks(ctx: &RuleContext<'_>, tasks: &[Task], placement: &mut Placement) -> Vec<Task> {
    let mut subject_hours: HashMap<(u32, u32), usize> = HashMap::new();
    for task in tasks {
        *subject_hours
            .entry((task.class_id, task.subject_id))
            .or_insert(0) += 1;
    }

    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|t| {
        std::cmp::Reverse((
            t.is_subgroup,
            subject_hours[&(t.class_id, t.subject_id)],
        ))
    });

    let mut remaining = Vec::new();
    for task in ordered {
        if !try_place(ctx, task, placement) {
            remaining.push(task.clone());
        }
    }

    info!(
        "greedy stage placed {} of {} lessons",
        tasks.len() - remaining.len(),
        tasks.len()
    );
    remaining
}

fn try_place(ctx: &RuleContext<'_>, task: &Task, placement: &mut Placement) -> bool {
    for day in ctx.day_order(placement, task) {
        if ctx.category_day_full(placement, task, day) {
            continue;
        }
        for slot in ctx.grid.iter_day(day) {
            if ctx.admits(placement, task, slot) {
                placement.place(task.clone(), slot);
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomDirectory, RoomInfo, Slot, SlotGrid};

    fn grid(days: u8, lessons: u8) -> SlotGrid {
        SlotGrid::new(days, lessons, &HashMap::new()).unwrap()
    }

    fn rooms(names: &[&str]) -> RoomDirectory {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    RoomInfo {
                        max_concurrent_classes: 1,
                        subgroups_only: false,
                        exclusive_subject: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_places_all_when_feasible() {
        let grid = grid(1, 6);
        let rooms = rooms(&["101", "102"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        let tasks = vec![
            Task::new(0, 10, 1, 1, "101"),
            Task::new(1, 10, 2, 2, "102"),
            Task::new(2, 11, 1, 1, "101"),
        ];
        let mut placement = Placement::new();
        let remaining = place_tasks(&ctx, &tasks, &mut placement);

        assert!(remaining.is_empty());
        assert_eq!(placement.lesson_count(), 3);
    }

    #[test]
    fn test_teacher_contention_leaves_remainder() {
        // One teacher, two classes, 8 combined hours against 6 slots.
        let grid = grid(1, 6);
        let rooms = rooms(&["101"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        let mut tasks = Vec::new();
        for i in 0..4 {
            tasks.push(Task::new(i, 10, 1, 7, "101"));
        }
        for i in 4..8 {
            tasks.push(Task::new(i, 11, 2, 7, "101"));
        }

        let mut placement = Placement::new();
        let remaining = place_tasks(&ctx, &tasks, &mut placement);

        assert_eq!(placement.lesson_count(), 6);
        assert_eq!(remaining.len(), 2);
        // No slot holds the teacher twice.
        for slot in grid.iter_day(0) {
            let busy = placement.cell(10, slot).len() + placement.cell(11, slot).len();
            assert!(busy <= 1);
        }
    }

    #[test]
    fn test_parallel_subgroups_share_slots() {
        // Two subgroup teachers, two hours each: both pairs should land
        // in exactly two distinct slots.
        let grid = grid(1, 6);
        let rooms = rooms(&["101", "102"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        let tasks = vec![
            Task::new(0, 10, 1, 1, "101").subgroup(),
            Task::new(1, 10, 1, 1, "101").subgroup(),
            Task::new(2, 10, 1, 2, "102").subgroup(),
            Task::new(3, 10, 1, 2, "102").subgroup(),
        ];
        let mut placement = Placement::new();
        let remaining = place_tasks(&ctx, &tasks, &mut placement);

        assert!(remaining.is_empty());
        let occupied: Vec<_> = grid
            .iter_day(0)
            .filter(|&slot| !placement.cell(10, slot).is_empty())
            .collect();
        assert_eq!(occupied.len(), 2);
        for slot in occupied {
            assert_eq!(placement.cell(10, slot).len(), 2);
        }
    }

    #[test]
    fn test_max_two_consecutive_per_subject() {
        let grid = grid(1, 6);
        let rooms = rooms(&["101"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        let tasks: Vec<_> = (0..4).map(|i| Task::new(i, 10, 1, 1, "101")).collect();
        let mut placement = Placement::new();
        let remaining = place_tasks(&ctx, &tasks, &mut placement);

        assert!(remaining.is_empty());
        let lessons = placement.subject_lessons(10, 0, 1);
        assert_eq!(lessons.len(), 4);
        assert!(!lessons.windows(3).any(|w| w[2] == w[0] + 2));
    }

    #[test]
    fn test_category_cap_skips_day_then_uses_next() {
        let grid = grid(2, 6);
        let rooms = rooms(&["101", "102", "103", "104"]);
        let categories: HashMap<u32, String> =
            (1..=4).map(|s| (s, "sci".to_string())).collect();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        // Four one-hour subjects of one category for one class: the
        // balance ordering spreads them across both days instead of
        // stacking day 0.
        let tasks: Vec<_> = (0..4)
            .map(|i| Task::new(i, 10, i as u32 + 1, i as u32 + 1, format!("10{}", i + 1)))
            .collect();
        let mut placement = Placement::new();
        let remaining = place_tasks(&ctx, &tasks, &mut placement);

        assert!(remaining.is_empty());
        for day in 0..2 {
            let count = placement.lessons_for(10, day).len();
            assert!(count <= 3, "day {day} holds {count} lessons of one category");
        }
    }

    #[test]
    fn test_subgroups_ordered_first() {
        let grid = grid(1, 2);
        let rooms = rooms(&["101", "102"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        // One whole-class hour and a subgroup pair compete for two slots;
        // the subgroup pair must be seated first and in parallel.
        let tasks = vec![
            Task::new(0, 10, 9, 9, "101"),
            Task::new(1, 10, 1, 1, "101").subgroup(),
            Task::new(2, 10, 1, 2, "102").subgroup(),
        ];
        let mut placement = Placement::new();
        let remaining = place_tasks(&ctx, &tasks, &mut placement);

        assert!(remaining.is_empty());
        assert_eq!(placement.lesson_count(), 3);
        // Subgroups share one slot, the whole-class lesson takes the other.
        let first = placement.cell(10, Slot::new(0, 1));
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|t| t.is_subgroup));
    }
}
