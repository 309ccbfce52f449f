//! Task builder: expands requirements into atomic lesson tasks.
//!
//! Each requirement/teacher pair yields one [`Task`] per weekly hour,
//! with the teacher's hours clamped so the requirement's
//! `total_hours_per_week` is never exceeded regardless of what the raw
//! data claims. The builder fails softly: malformed entries contribute
//! zero tasks and a warning, never an error.

use log::{debug, warn};

use crate::models::{Requirement, RoomDirectory, Task, TaskId};

/// Result of task expansion.
#[derive(Debug, Clone, Default)]
pub struct TaskBuildOutput {
    /// One task per placeable lesson-hour.
    pub tasks: Vec<Task>,
    /// Room attributes collected from the requirements' candidate rooms.
    pub rooms: RoomDirectory,
    /// Data-integrity notices (clamped hours, empty requirements).
    pub warnings: Vec<String>,
}

/// Expands requirements into tasks, applying the hour-capping safety
/// checks.
///
/// Tasks are numbered sequentially from zero; the ordering follows the
/// input requirements, so ids are stable across identical runs.
pub fn build_tasks(requirements: &[Requirement]) -> TaskBuildOutput {
    let mut out = TaskBuildOutput::default();
    let mut next_id: TaskId = 0;

    for req in requirements {
        if req.teachers.is_empty() {
            out.warnings.push(format!(
                "class {}, subject {}: no teachers assigned, nothing scheduled",
                req.class_id, req.subject_id
            ));
            continue;
        }

        let mut emitted: u32 = 0;
        for teacher in &req.teachers {
            // Room attributes are registered even for teachers that end
            // up contributing no hours; other teachers may share the room.
            for room in &teacher.candidate_rooms {
                out.rooms.entry(room.name.clone()).or_insert_with(|| room.info());
            }

            if teacher.hours_per_week == 0 {
                debug!(
                    "teacher {} has no hours for class {}, subject {}",
                    teacher.teacher_id, req.class_id, req.subject_id
                );
                continue;
            }

            if emitted >= req.total_hours_per_week {
                warn!(
                    "class {}, subject {}: weekly limit {} reached, skipping teacher {}",
                    req.class_id, req.subject_id, req.total_hours_per_week, teacher.teacher_id
                );
                out.warnings.push(format!(
                    "class {}, subject {}: weekly limit of {} hours reached, remaining teacher hours skipped",
                    req.class_id, req.subject_id, req.total_hours_per_week
                ));
                break;
            }

            let hours = teacher.hours_per_week.min(req.total_hours_per_week - emitted);
            if hours < teacher.hours_per_week {
                out.warnings.push(format!(
                    "class {}, subject {}: clamped teacher {} from {} to {} hours to fit the weekly total of {}",
                    req.class_id,
                    req.subject_id,
                    teacher.teacher_id,
                    teacher.hours_per_week,
                    hours,
                    req.total_hours_per_week
                ));
            }

            let Some(room) = teacher.preferred_room() else {
                out.warnings.push(format!(
                    "class {}, subject {}: teacher {} has no candidate room, {} hours skipped",
                    req.class_id, req.subject_id, teacher.teacher_id, hours
                ));
                continue;
            };

            for _ in 0..hours {
                let mut task = Task::new(
                    next_id,
                    req.class_id,
                    req.subject_id,
                    teacher.teacher_id,
                    room.name.clone(),
                );
                if req.has_subgroups {
                    task = task.subgroup();
                }
                out.tasks.push(task);
                next_id += 1;
            }
            emitted += hours;
        }

        if emitted == 0 {
            out.warnings.push(format!(
                "class {}, subject {}: no usable teacher hours, nothing scheduled",
                req.class_id, req.subject_id
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomOption, TeacherLoad};

    fn room(name: &str) -> RoomOption {
        RoomOption::new(name, 1)
    }

    #[test]
    fn test_one_task_per_hour() {
        let req = Requirement::new(10, 1, 4)
            .with_teacher(TeacherLoad::new(1, 4).with_room(room("101")));
        let out = build_tasks(&[req]);

        assert_eq!(out.tasks.len(), 4);
        assert!(out.warnings.is_empty());
        assert!(out.tasks.iter().all(|t| t.room == "101" && !t.is_subgroup));
        assert_eq!(out.tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_overloaded_teacher_clamped() {
        // 30 claimed hours against a weekly total of 4.
        let req = Requirement::new(10, 1, 4)
            .with_teacher(TeacherLoad::new(7, 30).with_room(room("101")));
        let out = build_tasks(&[req]);

        assert_eq!(out.tasks.len(), 4);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("clamped teacher 7 from 30 to 4"));
    }

    #[test]
    fn test_budget_spans_teachers() {
        let req = Requirement::new(10, 1, 3)
            .with_teacher(TeacherLoad::new(1, 2).with_room(room("101")))
            .with_teacher(TeacherLoad::new(2, 2).with_room(room("102")))
            .with_teacher(TeacherLoad::new(3, 2).with_room(room("103")));
        let out = build_tasks(&[req]);

        // 2 + 1 (clamped), teacher 3 skipped entirely.
        assert_eq!(out.tasks.len(), 3);
        assert_eq!(out.tasks.iter().filter(|t| t.teacher_id == 1).count(), 2);
        assert_eq!(out.tasks.iter().filter(|t| t.teacher_id == 2).count(), 1);
        assert!(out.tasks.iter().all(|t| t.teacher_id != 3));
    }

    #[test]
    fn test_no_teachers_warns() {
        let out = build_tasks(&[Requirement::new(10, 1, 2)]);
        assert!(out.tasks.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("no teachers"));
    }

    #[test]
    fn test_zero_hours_only_warns_once() {
        let req = Requirement::new(10, 1, 2).with_teacher(TeacherLoad::new(1, 0).with_room(room("101")));
        let out = build_tasks(&[req]);
        assert!(out.tasks.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("no usable teacher hours"));
    }

    #[test]
    fn test_subgroup_flag_copied() {
        let req = Requirement::new(10, 1, 2)
            .with_subgroups()
            .with_teacher(TeacherLoad::new(1, 1).with_room(room("101")))
            .with_teacher(TeacherLoad::new(2, 1).with_room(room("102")));
        let out = build_tasks(&[req]);
        assert_eq!(out.tasks.len(), 2);
        assert!(out.tasks.iter().all(|t| t.is_subgroup));
    }

    #[test]
    fn test_room_directory_first_occurrence_wins() {
        let reqs = vec![
            Requirement::new(10, 1, 1)
                .with_teacher(TeacherLoad::new(1, 1).with_room(room("101").with_capacity(2))),
            Requirement::new(11, 2, 1)
                .with_teacher(TeacherLoad::new(2, 1).with_room(room("101").with_capacity(5))),
        ];
        let out = build_tasks(&reqs);
        assert_eq!(out.rooms["101"].max_concurrent_classes, 2);
    }

    #[test]
    fn test_missing_room_skips_hours() {
        let req = Requirement::new(10, 1, 2).with_teacher(TeacherLoad::new(1, 2));
        let out = build_tasks(&[req]);
        assert!(out.tasks.is_empty());
        assert!(out.warnings.iter().any(|w| w.contains("no candidate room")));
    }
}
