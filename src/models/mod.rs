//! Timetabling domain models.
//!
//! Pure data types for the scheduling pipeline: requirements as given
//! by the caller, tasks derived from them, the slot grid, and the
//! placement under construction. No scheduling logic lives here; the
//! solver stages own that.

mod placement;
mod requirement;
mod slot;
mod task;

pub use placement::{PlacedLesson, Placement};
pub use requirement::{
    ClassId, Requirement, RoomDirectory, RoomInfo, RoomOption, SubjectId, TeacherId, TeacherLoad,
};
pub use slot::{Slot, SlotGrid};
pub use task::{Task, TaskId};
