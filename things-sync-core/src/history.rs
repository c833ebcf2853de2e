//! History log wire format and the applier that folds it into the store.
//!
//! Each log item is a single-key map `{id: {t, e, p}}`. Items are applied in
//! the order received; nothing is reordered, batched or skipped.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::codec::{self, Payload};
use crate::entity::EntityKind;
use crate::entity_id::EntityId;
use crate::error::{ApplyError, CodecError, SyncError};
use crate::models::{AreaFields, ChecklistItemFields, TagFields, TaskFields};
use crate::store::{EntityStore, Stored};

/// Operation type (`t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OperationKind {
    Create,
    Edit,
    Delete,
}

impl From<OperationKind> for u8 {
    fn from(kind: OperationKind) -> u8 {
        match kind {
            OperationKind::Create => 0,
            OperationKind::Edit => 1,
            OperationKind::Delete => 2,
        }
    }
}

impl TryFrom<u8> for OperationKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OperationKind::Create),
            1 => Ok(OperationKind::Edit),
            2 => Ok(OperationKind::Delete),
            other => Err(format!("unknown operation type: {}", other)),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Create => write!(f, "create"),
            OperationKind::Edit => write!(f, "edit"),
            OperationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Value side of a history item map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationBody {
    t: OperationKind,
    #[serde(default)]
    e: String,
    #[serde(default)]
    p: Payload,
}

/// One operation in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<EntityId, OperationBody>",
    into = "BTreeMap<EntityId, OperationBody>"
)]
pub struct HistoryItem {
    pub id: EntityId,
    pub kind: OperationKind,
    /// Wire entity-type tag (`e`). Empty on some deletes.
    pub entity_type: String,
    pub payload: Payload,
}

impl TryFrom<BTreeMap<EntityId, OperationBody>> for HistoryItem {
    type Error = String;

    fn try_from(map: BTreeMap<EntityId, OperationBody>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!(
                "history item must have exactly one entity, found {}",
                map.len()
            ));
        }
        let (id, body) = map
            .into_iter()
            .next()
            .ok_or_else(|| "empty history item".to_string())?;
        Ok(Self {
            id,
            kind: body.t,
            entity_type: body.e,
            payload: body.p,
        })
    }
}

impl From<HistoryItem> for BTreeMap<EntityId, OperationBody> {
    fn from(item: HistoryItem) -> Self {
        let body = OperationBody {
            t: item.kind,
            e: item.entity_type,
            p: item.payload,
        };
        BTreeMap::from([(item.id, body)])
    }
}

impl HistoryItem {
    pub fn create(id: EntityId, kind: EntityKind, payload: Payload) -> Self {
        Self {
            id,
            kind: OperationKind::Create,
            entity_type: kind.tag().to_string(),
            payload,
        }
    }

    pub fn edit(id: EntityId, kind: EntityKind, payload: Payload) -> Self {
        Self {
            id,
            kind: OperationKind::Edit,
            entity_type: kind.tag().to_string(),
            payload,
        }
    }

    pub fn delete(id: EntityId) -> Self {
        Self {
            id,
            kind: OperationKind::Delete,
            entity_type: String::new(),
            payload: Payload::new(),
        }
    }

    /// The wire value of this item alone, `{id: {t, e, p}}`.
    pub fn to_wire(&self) -> (String, Value) {
        let mut body = serde_json::Map::new();
        body.insert("t".to_string(), Value::from(u8::from(self.kind)));
        body.insert("e".to_string(), Value::from(self.entity_type.clone()));
        body.insert("p".to_string(), Value::Object(self.payload.clone()));
        (self.id.to_string(), Value::Object(body))
    }
}

/// One page of `GET .../items?start-index=N`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HistoryPage {
    pub items: Vec<HistoryItem>,
    pub current_item_index: u64,
    #[serde(default)]
    pub schema: Value,
    #[serde(default)]
    pub start_total_content_size: Value,
    #[serde(default)]
    pub end_total_content_size: Value,
    #[serde(default)]
    pub latest_total_content_size: Value,
}

/// Resolves which collection an operation targets.
fn resolve_kind(store: &EntityStore, item: &HistoryItem) -> Result<EntityKind, ApplyError> {
    if item.entity_type.is_empty() {
        return match (store.kind_of(&item.id), item.kind) {
            (Some(kind), _) => Ok(kind),
            // Untagged creates are tasks.
            (None, OperationKind::Create) => Ok(EntityKind::Task),
            (None, _) => Err(ApplyError::NotFound(item.id.clone())),
        };
    }
    EntityKind::from_tag(&item.entity_type).ok_or_else(|| ApplyError::UnknownEntityType {
        id: item.id.clone(),
        tag: item.entity_type.clone(),
    })
}

/// Folds one operation into the store. On error the store is unchanged.
pub fn apply(store: &mut EntityStore, item: &HistoryItem) -> Result<(), ApplyError> {
    let kind = resolve_kind(store, item)?;
    debug!(id = %item.id, op = %item.kind, %kind, "applying history item");
    match kind {
        EntityKind::Task => apply_as::<TaskFields>(store, item),
        EntityKind::ChecklistItem => apply_as::<ChecklistItemFields>(store, item),
        EntityKind::Tag => apply_as::<TagFields>(store, item),
        EntityKind::Area => apply_as::<AreaFields>(store, item),
    }
}

fn apply_as<S: Stored>(store: &mut EntityStore, item: &HistoryItem) -> Result<(), ApplyError> {
    let payload_error = |source: CodecError| ApplyError::Payload {
        id: item.id.clone(),
        source,
    };

    if item.kind == OperationKind::Create {
        // Our own create whose commit reply was lost.
        if let Some(entity) = store.entity_mut::<S>(&item.id) {
            if !entity.is_synced() {
                codec::adopt_remote_create(entity, &item.payload).map_err(payload_error)?;
                debug!(id = %item.id, kind = %S::KIND, "create matched a local entity");
                return Ok(());
            }
        }
        if store.contains(&item.id) {
            return Err(ApplyError::DuplicateCreate(item.id.clone()));
        }
        let entity = codec::decode_create::<S>(item.id.clone(), item.payload.clone())
            .map_err(payload_error)?;
        return store.insert(entity);
    }

    let entity = store
        .entity_mut::<S>(&item.id)
        .ok_or_else(|| ApplyError::NotFound(item.id.clone()))?;

    match (item.kind, S::TRASH_KEY) {
        (OperationKind::Delete, Some(trash_key)) => {
            let mut payload = item.payload.clone();
            payload.insert(trash_key.to_string(), Value::Bool(true));
            codec::apply_edit(entity, &payload).map_err(payload_error)
        }
        (OperationKind::Delete, None) => {
            if !item.payload.is_empty() {
                codec::apply_edit(entity, &item.payload).map_err(payload_error)?;
            }
            entity.mark_deleted();
            Ok(())
        }
        _ => codec::apply_edit(entity, &item.payload).map_err(payload_error),
    }
}

/// Applies items in order, the first at offset `start`.
///
/// Stops at the first failure. Earlier items stay applied, and the error
/// carries the offset of the failing item, which is where a retry resumes.
pub fn apply_all(
    store: &mut EntityStore,
    start: u64,
    items: &[HistoryItem],
) -> Result<usize, SyncError> {
    for (i, item) in items.iter().enumerate() {
        let offset = start + i as u64;
        apply(store, item).map_err(|source| SyncError::Apply { offset, source })?;
    }
    Ok(items.len())
}
