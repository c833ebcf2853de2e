//! The unit of synchronization: an id plus a dual state.
//!
//! Every entity carries its current field values (`working`) and the last
//! payload the server acknowledged for it (`synced`). `synced == None` means
//! the entity has never been created remotely.

use std::fmt;
use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entity_id::EntityId;

/// The closed set of entity kinds mirrored from the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Tasks, projects and headings (`Task6`).
    Task,
    ChecklistItem,
    Tag,
    Area,
}

impl EntityKind {
    /// Resolve a wire entity-type tag. Every known schema version is accepted.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Task6" => Some(EntityKind::Task),
            "ChecklistItem3" => Some(EntityKind::ChecklistItem),
            "Tag3" | "Tag4" => Some(EntityKind::Tag),
            "Area2" | "Area3" => Some(EntityKind::Area),
            _ => None,
        }
    }

    /// The tag written on outgoing operations.
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Task => "Task6",
            EntityKind::ChecklistItem => "ChecklistItem3",
            EntityKind::Tag => "Tag3",
            EntityKind::Area => "Area2",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Task => write!(f, "task"),
            EntityKind::ChecklistItem => write!(f, "checklist item"),
            EntityKind::Tag => write!(f, "tag"),
            EntityKind::Area => write!(f, "area"),
        }
    }
}

/// A kind-specific field set, serialized field-for-field into the wire payload.
pub trait Schema:
    Clone + PartialEq + Default + fmt::Debug + Serialize + DeserializeOwned
{
    const KIND: EntityKind;

    /// Wire key of the modification time, stamped into every commit.
    const MODIFIED_KEY: Option<&'static str> = None;

    /// Wire key of the trash flag. Deletes on kinds without one become tombstones.
    const TRASH_KEY: Option<&'static str> = None;

    /// Display title, used for lookups by name.
    fn title(&self) -> &str;

    /// Position within its list.
    fn index(&self) -> i64;
}

/// One synchronizable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity<S> {
    id: EntityId,
    synced: Option<S>,
    working: S,
    /// Set when the server log deletes a kind that has no trash field.
    #[serde(default)]
    deleted: bool,
}

impl<S: Schema> Entity<S> {
    /// Creates a new, never-synced entity with a fresh id.
    pub fn new(fields: S) -> Self {
        Self::with_id(EntityId::new(), fields)
    }

    /// Creates a never-synced entity with an explicit id.
    pub fn with_id(id: EntityId, fields: S) -> Self {
        Self {
            id,
            synced: None,
            working: fields,
            deleted: false,
        }
    }

    /// Creates an entity exactly as the server knows it.
    pub fn from_remote(id: EntityId, fields: S) -> Self {
        Self {
            id,
            synced: Some(fields.clone()),
            working: fields,
            deleted: false,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn kind(&self) -> EntityKind {
        S::KIND
    }

    /// Current local field values.
    pub fn fields(&self) -> &S {
        &self.working
    }

    /// Last state acknowledged by the server, if any.
    pub fn synced(&self) -> Option<&S> {
        self.synced.as_ref()
    }

    pub fn is_synced(&self) -> bool {
        self.synced.is_some()
    }

    /// True when the working state differs from the acknowledged one,
    /// including entities that were never created remotely.
    pub fn has_local_changes(&self) -> bool {
        self.synced.as_ref() != Some(&self.working)
    }

    /// True once the server log deleted this entity.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn fields_mut(&mut self) -> &mut S {
        &mut self.working
    }

    /// Replaces both states at once.
    pub(crate) fn replace_state(&mut self, working: S, synced: Option<S>) {
        self.working = working;
        self.synced = synced;
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl<S> Deref for Entity<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.working
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TagFields, TaskFields};

    #[test]
    fn test_kind_tags() {
        assert_eq!(EntityKind::from_tag("Task6"), Some(EntityKind::Task));
        assert_eq!(EntityKind::from_tag("Tag4"), Some(EntityKind::Tag));
        assert_eq!(EntityKind::from_tag("Area3"), Some(EntityKind::Area));
        assert_eq!(
            EntityKind::from_tag("ChecklistItem3"),
            Some(EntityKind::ChecklistItem)
        );
        assert_eq!(EntityKind::from_tag("Settings5"), None);
        assert_eq!(EntityKind::from_tag(""), None);
        assert_eq!(EntityKind::Tag.tag(), "Tag3");
        assert_eq!(EntityKind::Area.tag(), "Area2");
    }

    #[test]
    fn test_new_entity_is_unsynced() {
        let entity = Entity::new(TaskFields::titled("Buy milk"));
        assert!(!entity.is_synced());
        assert!(entity.has_local_changes());
        assert_eq!(entity.title, "Buy milk");
        assert_eq!(entity.kind(), EntityKind::Task);
    }

    #[test]
    fn test_remote_entity_starts_clean() {
        let id = EntityId::new();
        let entity = Entity::from_remote(id.clone(), TagFields::titled("Work"));
        assert_eq!(entity.id(), &id);
        assert!(entity.is_synced());
        assert!(!entity.has_local_changes());
        assert_eq!(entity.synced(), Some(entity.fields()));
    }
}
