//! Hybrid school timetabling engine.
//!
//! Assigns weekly lesson slots to (class, subject, teacher) obligations
//! under hard conflict rules — no double-booking of teachers, rooms, or
//! classes — and soft quality goals: gap-free class days, category
//! balance, paired lessons, parallel subgroups.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Requirement`, `Task`, `Slot`,
//!   `SlotGrid`, `Placement`, `PlacedLesson`
//! - **`builder`**: Requirement → task expansion with hour clamping
//! - **`validation`**: Input integrity checks (duplicates, missing rooms)
//! - **`solver`**: The greedy → exact → LNS pipeline behind
//!   `SolverStrategy`
//! - **`cp`**: Finite-domain constraint model and the pluggable
//!   `CpSolver` backend seam
//! - **`progress`**: Explicit progress callbacks, no global state
//!
//! # Pipeline
//!
//! Greedy placement seats most lessons fast; an exact constraint stage
//! refines the leftovers within a time budget; large-neighborhood
//! search polishes the soft score. Partial results are first-class: the
//! pipeline returns a `(suggestions, warnings, summary)` triple and
//! only aborts on configuration errors.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Pisinger & Ropke (2010), "Large Neighborhood Search" in Handbook
//!   of Metaheuristics
//! - Schaerf (1999), "A Survey of Automated Timetabling"

pub mod builder;
pub mod cp;
pub mod error;
pub mod models;
pub mod progress;
pub mod solver;
pub mod validation;

pub use error::SolveError;
pub use solver::{
    HybridSolver, LessonMode, SolveInput, SolveOptions, SolveOutcome, SolverStrategy,
};
