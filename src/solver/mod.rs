//! The hybrid solving pipeline.
//!
//! Three stages run strictly in sequence over one shared [`Placement`]:
//!
//! 1. **Greedy** — fast rule-driven placement of most lessons.
//! 2. **Exact refinement** — a constraint model for the leftovers,
//!    solved by a [`CpSolver`] backend under a wall-clock budget.
//! 3. **LNS** — destroy-and-rebuild polishing of the soft score.
//!
//! The pipeline degrades gracefully: lessons that cannot be placed stay
//! unplaced and surface as warnings, and the result is always a
//! `(suggestions, warnings, summary)` triple. Only configuration-class
//! problems return an error.
//!
//! [`SolverStrategy`] is the seam for alternative solving strategies;
//! [`HybridSolver`] is the canonical implementation.

pub mod exact;
pub mod greedy;
pub mod lns;
pub mod rules;
pub mod score;

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use log::info;
use serde::{Deserialize, Serialize};

use crate::builder::build_tasks;
use crate::cp::{CpSolver, SimpleCpSolver, SolveStatus};
use crate::error::SolveError;
use crate::models::{PlacedLesson, Placement, Requirement, SlotGrid, SubjectId, TaskId};
use crate::progress::{report, ProgressSink};
use crate::validation::validate_input;

use lns::LnsConfig;
use rules::RuleContext;

/// How lessons of one subject should be laid out within a day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonMode {
    /// Prefer adjacent two-lesson blocks of one subject.
    #[default]
    Pairs,
    /// No pairing preference.
    Single,
}

/// Everything the pipeline consumes for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveInput {
    /// Teaching obligations, already resolved.
    pub requirements: Vec<Requirement>,
    /// Per-day lesson counts (zero-based day → count); missing days use
    /// the configured default.
    pub schedule_settings: HashMap<u8, u8>,
    /// Subject categories for soft balancing; absent entries disable it.
    pub subject_categories: HashMap<SubjectId, String>,
    /// Pre-existing assignments to respect as already occupied.
    pub existing: Vec<PlacedLesson>,
    /// Cross-subject pairs allowed to share a class cell.
    pub subgroup_pairs: Vec<(SubjectId, SubjectId)>,
}

impl SolveInput {
    /// Creates an input from requirements.
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self {
            requirements,
            ..Self::default()
        }
    }

    /// Sets per-day lesson counts.
    pub fn with_settings(mut self, settings: HashMap<u8, u8>) -> Self {
        self.schedule_settings = settings;
        self
    }

    /// Sets subject categories.
    pub fn with_categories(mut self, categories: HashMap<SubjectId, String>) -> Self {
        self.subject_categories = categories;
        self
    }

    /// Sets pre-existing assignments.
    pub fn with_existing(mut self, existing: Vec<PlacedLesson>) -> Self {
        self.existing = existing;
        self
    }

    /// Sets allowed subgroup pairs.
    pub fn with_subgroup_pairs(mut self, pairs: Vec<(SubjectId, SubjectId)>) -> Self {
        self.subgroup_pairs = pairs;
        self
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Days in the scheduling week.
    pub days: u8,
    /// Lesson count for days absent from the settings.
    pub default_lessons: u8,
    /// Overall budget for the exact stage; 10 s are reserved for LNS
    /// and at least 5 s are always granted.
    pub exact_time_limit: Duration,
    /// LNS iteration cap.
    pub lns_iterations: usize,
    /// Pairing preference for the soft score.
    pub lesson_mode: LessonMode,
    /// RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            days: 5,
            default_lessons: 6,
            exact_time_limit: Duration::from_secs(45),
            lns_iterations: 800,
            lesson_mode: LessonMode::default(),
            seed: None,
        }
    }
}

impl SolveOptions {
    /// Sets the number of days.
    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    /// Sets the default lesson count.
    pub fn with_default_lessons(mut self, lessons: u8) -> Self {
        self.default_lessons = lessons;
        self
    }

    /// Sets the exact-stage time budget.
    pub fn with_exact_time_limit(mut self, limit: Duration) -> Self {
        self.exact_time_limit = limit;
        self
    }

    /// Sets the LNS iteration cap.
    pub fn with_lns_iterations(mut self, iterations: usize) -> Self {
        self.lns_iterations = iterations;
        self
    }

    /// Sets the lesson mode.
    pub fn with_lesson_mode(mut self, mode: LessonMode) -> Self {
        self.lesson_mode = mode;
        self
    }

    /// Seeds the LNS random generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// The pipeline's result triple.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// Newly placed lessons, sorted by (day, lesson, class).
    pub suggestions: Vec<PlacedLesson>,
    /// Human-readable notices: clamps, unplaced counts, leftover gaps.
    pub warnings: Vec<String>,
    /// One-line run summary.
    pub summary: String,
}

/// A timetabling strategy.
///
/// Alternative solvers (pure greedy, pure exact, evolutionary) can
/// implement this seam; the hybrid pipeline is the canonical one.
pub trait SolverStrategy {
    /// Strategy name for diagnostics.
    fn name(&self) -> &'static str;

    /// Runs the strategy over the input.
    fn solve(
        &self,
        input: &SolveInput,
        progress: &mut dyn ProgressSink,
    ) -> Result<SolveOutcome, SolveError>;
}

/// The canonical greedy → exact → LNS pipeline.
///
/// # Example
///
/// ```
/// use timetable_engine::models::{Requirement, RoomOption, TeacherLoad};
/// use timetable_engine::progress::NullProgress;
/// use timetable_engine::solver::{HybridSolver, SolveInput, SolveOptions, SolverStrategy};
///
/// let requirements = vec![Requirement::new(10, 1, 2)
///     .with_teacher(TeacherLoad::new(1, 2).with_room(RoomOption::new("101", 1)))];
/// let input = SolveInput::new(requirements);
/// let solver = HybridSolver::new().with_options(SolveOptions::default().with_seed(1));
///
/// let outcome = solver.solve(&input, &mut NullProgress).unwrap();
/// assert_eq!(outcome.suggestions.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct HybridSolver<S: CpSolver = SimpleCpSolver> {
    options: SolveOptions,
    backend: S,
}

impl HybridSolver<SimpleCpSolver> {
    /// Creates the pipeline with default options and the reference
    /// exact backend.
    pub fn new() -> Self {
        Self {
            options: SolveOptions::default(),
            backend: SimpleCpSolver::new(),
        }
    }
}

impl Default for HybridSolver<SimpleCpSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CpSolver> HybridSolver<S> {
    /// Sets the options.
    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Swaps the exact-stage backend.
    pub fn with_backend<T: CpSolver>(self, backend: T) -> HybridSolver<T> {
        HybridSolver {
            options: self.options,
            backend,
        }
    }
}

impl<S: CpSolver> SolverStrategy for HybridSolver<S> {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn solve(
        &self,
        input: &SolveInput,
        progress: &mut dyn ProgressSink,
    ) -> Result<SolveOutcome, SolveError> {
        let start = Instant::now();

        validate_input(&input.requirements, &input.subgroup_pairs)
            .map_err(SolveError::InvalidInput)?;
        let grid = SlotGrid::new(
            self.options.days,
            self.options.default_lessons,
            &input.schedule_settings,
        )?;
        report(progress, 5, "validating input");

        let build = build_tasks(&input.requirements);
        let tasks = build.tasks;
        let rooms = build.rooms;
        let mut warnings = build.warnings;

        if tasks.is_empty() {
            warnings.push("no lessons to place".into());
            report(progress, 100, "done");
            return Ok(SolveOutcome {
                suggestions: Vec::new(),
                warnings,
                summary: "hybrid pipeline: no lessons to place".into(),
            });
        }

        // Seed pre-existing assignments; they are never moved.
        let mut placement = Placement::new();
        let mut protected: HashSet<TaskId> = HashSet::new();
        for (i, lesson) in input.existing.iter().enumerate() {
            let slot = lesson.slot();
            if grid.contains(slot) {
                let id = tasks.len() + i;
                placement.place(lesson.to_task(id), slot);
                protected.insert(id);
            } else {
                warnings.push(format!(
                    "existing assignment for class {} at day {}, lesson {} lies outside the grid and was ignored",
                    lesson.class_id, lesson.day, lesson.lesson
                ));
            }
        }

        let ctx = RuleContext {
            grid: &grid,
            rooms: &rooms,
            subgroup_pairs: &input.subgroup_pairs,
            categories: &input.subject_categories,
        };

        report(progress, 10, "greedy placement");
        let remaining = greedy::place_tasks(&ctx, &tasks, &mut placement);

        if !remaining.is_empty() {
            report(
                progress,
                40,
                format!("exact refinement of {} lessons", remaining.len()),
            );
            let budget = std::cmp::max(
                Duration::from_secs(5),
                self.options
                    .exact_time_limit
                    .saturating_sub(Duration::from_secs(10)),
            );
            let outcome = exact::refine(&ctx, &remaining, &mut placement, &self.backend, budget);
            if !matches!(outcome.status, SolveStatus::Optimal | SolveStatus::Feasible) {
                warnings.push(format!(
                    "exact stage found no assignment for {} lessons",
                    remaining.len()
                ));
            }
        }

        report(progress, 70, "optimizing schedule");
        let lns_config = LnsConfig {
            iterations: self.options.lns_iterations,
            seed: self.options.seed,
            ..LnsConfig::default()
        };
        let placement = lns::improve(
            &ctx,
            placement,
            self.options.lesson_mode,
            &lns_config,
            &protected,
            progress,
        );

        let mut suggestions: Vec<PlacedLesson> = Vec::new();
        for ((_, slot), cell_tasks) in placement.iter() {
            for task in cell_tasks {
                if !protected.contains(&task.id) {
                    suggestions.push(PlacedLesson::from_task(task, *slot));
                }
            }
        }
        suggestions.sort_by_key(|l| (l.day, l.lesson, l.class_id, l.subject_id, l.teacher_id));

        let placed = suggestions.len();
        let total = tasks.len();
        let windows = score::count_windows(&placement, &grid);
        let pairs = score::count_pairs(&placement, self.options.lesson_mode);

        if placed < total {
            warnings.push(format!("placed {placed} of {total} lessons"));
        }
        if windows > 0 {
            warnings.push(format!("{windows} gap(s) remain in class schedules"));
        }

        let mut summary = format!("hybrid pipeline: placed {placed} of {total} lessons");
        if placed == total && windows == 0 {
            summary.push_str(" (full placement, no gaps)");
        }
        if self.options.lesson_mode == LessonMode::Pairs && pairs > 0 {
            summary.push_str(&format!(", {pairs} paired lessons"));
        }
        summary.push_str(&format!(", elapsed {:.1}s", start.elapsed().as_secs_f64()));
        info!("{summary}");

        report(progress, 100, "done");
        Ok(SolveOutcome {
            suggestions,
            warnings,
            summary,
        })
    }
}
