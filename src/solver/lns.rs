//! Large-neighborhood search stage.
//!
//! Destroys a random fifth of the occupied cells each iteration and
//! rebuilds the freed lessons with the shared rule set, keeping the
//! result whenever the soft score does not get worse and reverting to
//! the best-known placement otherwise. An iteration whose rebuild
//! cannot seat every freed lesson is abandoned outright, so the number
//! of placed lessons never decreases here. Cells holding pre-existing
//! assignments are never destroyed.

use std::collections::HashSet;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::models::{Placement, Task, TaskId};
use crate::progress::{report, ProgressSink};

use super::rules::RuleContext;
use super::score::soft_score;
use super::LessonMode;

/// LNS stage configuration.
#[derive(Debug, Clone)]
pub struct LnsConfig {
    /// Iteration cap; cancellation is checked only between iterations.
    pub iterations: usize,
    /// Fraction of occupied cells destroyed per iteration.
    pub destroy_fraction: f64,
    /// RNG seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for LnsConfig {
    fn default() -> Self {
        Self {
            iterations: 800,
            destroy_fraction: 0.2,
            seed: None,
        }
    }
}

/// Iteratively improves a placement's soft score.
///
/// Progress is reported every 5 % of iterations, interpolating the
/// 70–95 % band of the pipeline. Terminates early when the score
/// reaches its lower bound of zero.
pub fn improve(
    ctx: &RuleContext<'_>,
    placement: Placement,
    mode: LessonMode,
    config: &LnsConfig,
    protected: &HashSet<TaskId>,
    progress: &mut dyn ProgressSink,
) -> Placement {
    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let mut current = placement;
    let mut best = current.clone();
    let mut best_score = soft_score(&current, ctx.grid, ctx.categories, mode);
    info!("lns stage: initial score {best_score}");

    let report_every = (config.iterations / 20).max(1);
    for iteration in 0..config.iterations {
        if iteration % report_every == 0 {
            let percent = 70 + (iteration * 25 / config.iterations.max(1)) as u8;
            report(
                progress,
                percent,
                format!(
                    "optimizing schedule: iteration {iteration}/{}, score {best_score}",
                    config.iterations
                ),
            );
        }
        if best_score == 0 {
            break;
        }

        let destroyable: Vec<_> = current
            .occupied_cells()
            .into_iter()
            .filter(|&(class_id, slot)| {
                current
                    .cell(class_id, slot)
                    .iter()
                    .all(|t| !protected.contains(&t.id))
            })
            .collect();
        if destroyable.is_empty() {
            break;
        }

        let count = ((destroyable.len() as f64 * config.destroy_fraction).round() as usize)
            .clamp(1, destroyable.len());
        let picked = rand::seq::index::sample(&mut rng, destroyable.len(), count);

        let mut freed: Vec<Task> = Vec::new();
        for i in picked.iter() {
            let (class_id, slot) = destroyable[i];
            freed.extend(current.clear_cell(class_id, slot));
        }

        let rebuilt = freed
            .iter()
            .all(|task| reinsert(ctx, &mut current, task));
        if !rebuilt {
            current = best.clone();
            continue;
        }

        let score = soft_score(&current, ctx.grid, ctx.categories, mode);
        if score <= best_score {
            if score < best_score {
                debug!("lns iteration {iteration}: improved {best_score} -> {score}");
                best = current.clone();
                best_score = score;
            }
        } else {
            current = best.clone();
        }
    }

    info!("lns stage: final score {best_score}");
    best
}

/// Re-inserts a freed task at the first legal slot in category-aware
/// day order. The category day cap is honoured on the first pass and
/// relaxed on the second; it is a preference, not a hard rule.
fn reinsert(ctx: &RuleContext<'_>, placement: &mut Placement, task: &Task) -> bool {
    for pass in 0..2 {
        for day in ctx.day_order(placement, task) {
            if pass == 0 && ctx.category_day_full(placement, task, day) {
                continue;
            }
            for slot in ctx.grid.iter_day(day) {
                if ctx.admits(placement, task, slot) {
                    placement.place(task.clone(), slot);
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomDirectory, RoomInfo, Slot, SlotGrid};
    use crate::progress::NullProgress;
    use std::collections::HashMap;

    fn grid() -> SlotGrid {
        SlotGrid::new(5, 6, &HashMap::new()).unwrap()
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

    fn config(iterations: usize) -> LnsConfig {
        LnsConfig {
            iterations,
            seed: Some(42),
            ..LnsConfig::default()
        }
    }

    #[test]
    fn test_closes_a_gap() {
        let grid = grid();
        let rooms = rooms(&["101", "102"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        // Lessons at 1 and 3: one window.
        let mut placement = Placement::new();
        placement.place(Task::new(0, 10, 1, 1, "101"), Slot::new(0, 1));
        placement.place(Task::new(1, 10, 2, 2, "102"), Slot::new(0, 3));
        assert_eq!(soft_score(&placement, &grid, &categories, LessonMode::Single), 1000);

        let best = improve(
            &ctx,
            placement,
            LessonMode::Single,
            &config(100),
            &HashSet::new(),
            &mut NullProgress,
        );

        assert_eq!(best.lesson_count(), 2);
        assert_eq!(soft_score(&best, &grid, &categories, LessonMode::Single), 0);
    }

    #[test]
    fn test_acceptance_is_monotonic() {
        let grid = grid();
        let rooms = rooms(&["101", "102", "103"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        let mut placement = Placement::new();
        placement.place(Task::new(0, 10, 1, 1, "101"), Slot::new(0, 1));
        placement.place(Task::new(1, 10, 2, 2, "102"), Slot::new(0, 4));
        placement.place(Task::new(2, 11, 3, 3, "103"), Slot::new(1, 2));
        placement.place(Task::new(3, 11, 1, 1, "101"), Slot::new(1, 5));

        let initial = soft_score(&placement, &grid, &categories, LessonMode::Pairs);
        let mut scores = Vec::new();
        for iterations in [1, 5, 25, 100] {
            let best = improve(
                &ctx,
                placement.clone(),
                LessonMode::Pairs,
                &config(iterations),
                &HashSet::new(),
                &mut NullProgress,
            );
            scores.push(soft_score(&best, &grid, &categories, LessonMode::Pairs));
        }

        // Longer runs of the same seeded search never end up worse.
        assert!(scores[0] <= initial);
        assert!(scores.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_never_loses_lessons() {
        let grid = grid();
        let rooms = rooms(&["101", "102"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        let mut placement = Placement::new();
        for i in 0..4u32 {
            placement.place(
                Task::new(i as usize, 10, i + 1, i + 1, "101"),
                Slot::new(0, i as u8 + 1),
            );
            placement.place(
                Task::new(4 + i as usize, 11, i + 1, i + 5, "102"),
                Slot::new(0, i as u8 + 1),
            );
        }
        let before = placement.lesson_count();

        let best = improve(
            &ctx,
            placement,
            LessonMode::Pairs,
            &config(50),
            &HashSet::new(),
            &mut NullProgress,
        );
        assert_eq!(best.lesson_count(), before);
    }

    #[test]
    fn test_protected_cells_stay_put() {
        let grid = grid();
        let rooms = rooms(&["101", "102"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        let mut placement = Placement::new();
        placement.place(Task::new(99, 10, 1, 1, "101"), Slot::new(0, 5));
        placement.place(Task::new(0, 10, 2, 2, "102"), Slot::new(0, 1));
        placement.place(Task::new(1, 10, 3, 3, "102"), Slot::new(0, 3));

        let protected = HashSet::from([99]);
        let best = improve(
            &ctx,
            placement,
            LessonMode::Single,
            &config(100),
            &protected,
            &mut NullProgress,
        );

        let fixed = best.cell(10, Slot::new(0, 5));
        assert_eq!(fixed.len(), 1);
        assert_eq!(fixed[0].id, 99);
    }

    #[test]
    fn test_zero_iterations_returns_input() {
        let grid = grid();
        let rooms = rooms(&["101"]);
        let categories = HashMap::new();
        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &[],
            categories: &categories,
        };

        let mut placement = Placement::new();
        placement.place(Task::new(0, 10, 1, 1, "101"), Slot::new(0, 2));

        let best = improve(
            &ctx,
            placement.clone(),
            LessonMode::Single,
            &config(0),
            &HashSet::new(),
            &mut NullProgress,
        );
        assert_eq!(best.occupied_cells(), placement.occupied_cells());
    }
}
