//! Things Sync Core Library
//!
//! Local mirror of a Things Cloud history log: dual-state entities, the delta
//! codec, the history applier and the commit protocol.

pub mod client;
pub mod codec;
pub mod entity;
pub mod entity_id;
pub mod error;
pub mod history;
pub mod models;
pub mod snapshot;
pub mod store;
pub mod transport;

pub use client::{RefreshSummary, ThingsClient};
pub use codec::Payload;
pub use entity::{Entity, EntityKind, Schema};
pub use entity_id::{EntityId, EntityIdError};
pub use error::{ApplyError, CodecError, ModelError, SyncError, TransportError};
pub use history::{HistoryItem, HistoryPage, OperationKind};
pub use models::{
    Area, AreaFields, ChecklistItem, ChecklistItemFields, Destination, Note, Status, Tag,
    TagFields, Task, TaskFields, TaskType,
};
pub use snapshot::{Snapshot, SnapshotError, SnapshotStorage};
pub use store::{EntityRef, EntityStore, Stored};
pub use transport::{CommitAck, CommitRequest, HistoryBatch, HistoryTransport};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
