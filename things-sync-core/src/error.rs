//! Error types for the sync engine.

use thiserror::Error;

use crate::entity::EntityKind;
use crate::entity_id::EntityId;
use crate::models::{Status, TaskType};

/// Invariant violations raised by entity operations.
///
/// These are caller bugs: nothing here is retried or recovered from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("item already has {0} status")]
    StatusUnchanged(Status),

    #[error("destination can only be changed for a task, not a {0}")]
    DestinationNotAllowed(TaskType),

    #[error("cannot assign {0} as its own project")]
    SelfProject(EntityId),

    #[error("{0} is not a project")]
    NotAProject(EntityId),

    #[error("{0} is not an area")]
    NotAnArea(EntityId),

    #[error("only a task can be converted to a project, not a {0}")]
    NotATask(TaskType),

    #[error("item is already trashed")]
    AlreadyTrashed,

    #[error("item is not trashed")]
    NotTrashed,
}

/// Errors from encoding or applying payloads.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("{0} was already created on the server, encode it as an edit")]
    AlreadySynced(EntityId),

    #[error("{0} was never created on the server, encode it as a create")]
    NeverSynced(EntityId),

    #[error("no changes found for {0}")]
    NoChanges(EntityId),

    #[error("payload for {kind} does not match its schema: {source}")]
    Schema {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from folding a history operation into the store.
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("duplicate create for {0}")]
    DuplicateCreate(EntityId),

    #[error("referenced entity not found: {0}")]
    NotFound(EntityId),

    #[error("unknown entity type {tag:?} for {id}")]
    UnknownEntityType { id: EntityId, tag: String },

    #[error("cannot apply operation to {id}: {source}")]
    Payload {
        id: EntityId,
        #[source]
        source: CodecError,
    },
}

impl ApplyError {
    /// Id of the entity the failed operation referenced.
    pub fn entity_id(&self) -> &EntityId {
        match self {
            ApplyError::DuplicateCreate(id)
            | ApplyError::NotFound(id)
            | ApplyError::UnknownEntityType { id, .. }
            | ApplyError::Payload { id, .. } => id,
        }
    }
}

/// Failures reported by a history transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The server refused the commit, usually because the ancestor is stale.
    #[error("commit rejected: {0}")]
    Rejected(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Errors surfaced by the session facade.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("history offset {offset}: {source}")]
    Apply {
        offset: u64,
        #[source]
        source: ApplyError,
    },

    #[error("entity not found: {0}")]
    NotFound(EntityId),

    #[error("{0} is already in the store")]
    AlreadyExists(EntityId),

    /// Stale ancestor or similar; refresh and retry with a fresh delta.
    #[error("commit rejected by server ({reason}); refresh and retry")]
    Rejected { reason: String },

    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rejected(reason) => SyncError::Rejected { reason },
            other => SyncError::Transport(other),
        }
    }
}

impl SyncError {
    /// True for "does not exist", as opposed to any other failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SyncError::NotFound(_)
                | SyncError::Apply {
                    source: ApplyError::NotFound(_),
                    ..
                }
        )
    }

    /// True when the caller should refresh before retrying.
    pub fn needs_refresh(&self) -> bool {
        matches!(self, SyncError::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_maps_to_refresh_hint() {
        let err = SyncError::from(TransportError::Rejected("stale ancestor".into()));
        assert!(err.needs_refresh());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("stale ancestor"));
    }

    #[test]
    fn test_transport_failures_stay_distinct() {
        let err = SyncError::from(TransportError::Status {
            status: 500,
            body: "boom".into(),
        });
        assert!(matches!(err, SyncError::Transport(_)));
        assert!(!err.needs_refresh());
        assert_eq!(err.to_string(), "server returned status 500: boom");
    }

    #[test]
    fn test_not_found_detection() {
        let id = EntityId::parse("missing").unwrap();
        assert!(SyncError::NotFound(id.clone()).is_not_found());

        let apply = SyncError::Apply {
            offset: 3,
            source: ApplyError::NotFound(id.clone()),
        };
        assert!(apply.is_not_found());

        let dup = SyncError::Apply {
            offset: 3,
            source: ApplyError::DuplicateCreate(id),
        };
        assert!(!dup.is_not_found());
    }

    #[test]
    fn test_model_error_display() {
        assert_eq!(
            ModelError::StatusUnchanged(Status::Complete).to_string(),
            "item already has complete status"
        );
        assert_eq!(ModelError::AlreadyTrashed.to_string(), "item is already trashed");
    }
}
