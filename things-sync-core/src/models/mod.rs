//! Kind-specific field sets for every entity mirrored from the history log.

mod area;
mod checklist;
mod tag;
mod task;
pub mod wire;

pub use area::{Area, AreaFields};
pub use checklist::{ChecklistItem, ChecklistItemFields};
pub use tag::{Tag, TagFields};
pub use task::{Destination, Note, Status, Task, TaskFields, TaskType};
