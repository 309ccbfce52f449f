//! Exact refinement stage.
//!
//! Builds a constraint model for the tasks the greedy stage could not
//! place and hands it to a [`CpSolver`] backend under a wall-clock
//! budget. Slots consumed by the partial placement are carved out of
//! the variable domains; the window and exclusivity rules of the
//! greedy stage reappear as constraints. A timeout is not a failure:
//! whatever assignment the backend returns is merged, and tasks it
//! could not seat stay unplaced.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info, warn};

use crate::cp::{CpModel, CpSolver, SolveStatus, SolverConfig, VarId};
use crate::models::{ClassId, Placement, Slot, SubjectId, Task};

use super::rules::RuleContext;

/// Result of the refinement stage.
#[derive(Debug, Clone, Copy)]
pub struct ExactOutcome {
    /// Lessons merged into the placement.
    pub placed: usize,
    /// Backend status.
    pub status: SolveStatus,
}

/// Builds the refinement model and merges the backend's assignment.
pub fn refine<S: CpSolver>(
    ctx: &RuleContext<'_>,
    remaining: &[Task],
    placement: &mut Placement,
    solver: &S,
    budget: Duration,
) -> ExactOutcome {
    if remaining.is_empty() {
        return ExactOutcome {
            placed: 0,
            status: SolveStatus::Optimal,
        };
    }

    let (model, vars) = build_model(ctx, remaining, placement);
    let config = SolverConfig { time_limit: budget };
    info!(
        "exact stage: {} tasks, {} constraints, budget {:?}",
        remaining.len(),
        model.constraint_count(),
        budget
    );

    let solution = solver.solve(&model, &config);
    if !solution.is_solution_found() {
        warn!("exact stage found no assignment (status {:?})", solution.status);
        return ExactOutcome {
            placed: 0,
            status: solution.status,
        };
    }

    let mut placed = 0;
    for (task, &var) in remaining.iter().zip(&vars) {
        let Some(index) = solution.value(var) else {
            continue;
        };
        let slot = ctx.grid.slot_at(index as usize);
        // The model leaves room capacity and cross-subject cell rules
        // to this post-check, as they bind across already-merged tasks.
        if ctx.admits(placement, task, slot) {
            placement.place(task.clone(), slot);
            placed += 1;
        } else {
            debug!("exact stage: task {} rejected at {:?} on merge", task.id, slot);
        }
    }

    info!("exact stage placed {placed} of {} lessons", remaining.len());
    ExactOutcome {
        placed,
        status: solution.status,
    }
}

/// Translates remaining tasks + partial placement into a [`CpModel`].
///
/// Returns the model and the variable of each task, index-aligned with
/// `remaining`.
pub fn build_model(
    ctx: &RuleContext<'_>,
    remaining: &[Task],
    placement: &Placement,
) -> (CpModel, Vec<VarId>) {
    let grid = ctx.grid;
    let total = grid.total_slots();
    let mut model = CpModel::new("refinement");

    // Slots blocked per class by the partial placement: a whole-class
    // lesson blocks everything, a subgroup-only cell blocks whole-class
    // tasks.
    let mut whole_cells: HashMap<ClassId, Vec<usize>> = HashMap::new();
    let mut subgroup_cells: HashMap<ClassId, Vec<usize>> = HashMap::new();
    for ((class_id, slot), tasks) in placement.iter() {
        if tasks.is_empty() {
            continue;
        }
        let index = grid.index_of(*slot);
        if tasks.iter().any(|t| !t.is_subgroup) {
            whole_cells.entry(*class_id).or_default().push(index);
        } else {
            subgroup_cells.entry(*class_id).or_default().push(index);
        }
    }

    let vars: Vec<VarId> = remaining
        .iter()
        .map(|task| {
            let domain: Vec<i32> = (0..total)
                .filter(|&index| {
                    let slot = grid.slot_at(index);
                    if placement.teacher_busy(task.teacher_id, slot) {
                        return false;
                    }
                    if let Some(blocked) = whole_cells.get(&task.class_id) {
                        if blocked.contains(&index) {
                            return false;
                        }
                    }
                    if !task.is_subgroup {
                        if let Some(blocked) = subgroup_cells.get(&task.class_id) {
                            if blocked.contains(&index) {
                                return false;
                            }
                        }
                    }
                    true
                })
                .map(|index| index as i32)
                .collect();
            model.add_var(format!("task{}", task.id), domain)
        })
        .collect();

    // Teacher exclusivity across the remaining tasks.
    let mut by_teacher: HashMap<u32, Vec<VarId>> = HashMap::new();
    for (task, &var) in remaining.iter().zip(&vars) {
        by_teacher.entry(task.teacher_id).or_default().push(var);
    }
    for teacher_vars in by_teacher.into_values() {
        model.add_all_different(teacher_vars);
    }

    // Class-cell exclusivity: whole-class tasks clash with everything
    // in their class; subgroup tasks clash only with whole-class ones.
    let mut by_class: HashMap<ClassId, Vec<usize>> = HashMap::new();
    for (i, task) in remaining.iter().enumerate() {
        by_class.entry(task.class_id).or_default().push(i);
    }
    for indices in by_class.values() {
        for (a, &i) in indices.iter().enumerate() {
            for &j in &indices[a + 1..] {
                if !remaining[i].is_subgroup || !remaining[j].is_subgroup {
                    model.add_not_equal(vars[i], vars[j]);
                }
            }
        }
    }

    // Per (class, subject, day): at most two lessons in any three
    // consecutive slots, counting slots already fixed by the partial
    // placement against the limit.
    let mut by_class_subject: HashMap<(ClassId, SubjectId), Vec<usize>> = HashMap::new();
    for (i, task) in remaining.iter().enumerate() {
        by_class_subject
            .entry((task.class_id, task.subject_id))
            .or_default()
            .push(i);
    }
    for (&(class_id, subject_id), indices) in &by_class_subject {
        let group: Vec<VarId> = indices.iter().map(|&i| vars[i]).collect();
        for day in 0..grid.days() {
            let range = grid.day_range(day);
            let fixed: Vec<usize> = placement
                .subject_lessons(class_id, day, subject_id)
                .into_iter()
                .map(|lesson| grid.index_of(Slot::new(day, lesson)))
                .collect();
            for start in range.clone() {
                if start + 2 >= range.end {
                    break;
                }
                let window = [start, start + 1, start + 2];
                let preoccupied = window.iter().filter(|i| fixed.contains(i)).count() as u32;
                let limit = 2u32.saturating_sub(preoccupied);
                if group.len() as u32 <= limit {
                    continue;
                }
                model.add_at_most_within(
                    group.clone(),
                    window.iter().map(|&i| i as i32).collect(),
                    limit,
                );
            }
        }
    }

    // Objective: parallel subgroup pairs are worth +1, category excess
    // beyond three per class-day costs 10 per lesson.
    for indices in by_class_subject.values() {
        let subgroups: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| remaining[i].is_subgroup)
            .collect();
        for (a, &i) in subgroups.iter().enumerate() {
            for &j in &subgroups[a + 1..] {
                if remaining[i].teacher_id != remaining[j].teacher_id {
                    model.add_equality_bonus(vars[i], vars[j], 1);
                }
            }
        }
    }

    let mut by_class_category: HashMap<(ClassId, &str), Vec<VarId>> = HashMap::new();
    for (i, task) in remaining.iter().enumerate() {
        if let Some(category) = ctx.category_of(task.subject_id) {
            by_class_category
                .entry((task.class_id, category))
                .or_default()
                .push(vars[i]);
        }
    }
    for group in by_class_category.into_values() {
        if group.len() <= 3 {
            continue;
        }
        for day in 0..grid.days() {
            let day_values: Vec<i32> = grid.day_range(day).map(|i| i as i32).collect();
            model.add_excess_penalty(group.clone(), day_values, 3, -10);
        }
    }

    (model, vars)
}
