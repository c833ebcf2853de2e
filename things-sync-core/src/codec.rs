//! Delta codec: full payloads for creates, minimal field diffs for edits.
//!
//! Payloads are JSON maps keyed by the compact wire names. Field equality is
//! by value on the serialized form, so an edit never carries a key whose value
//! the server already holds.

use serde_json::{Map, Value};
use tracing::debug;

use crate::entity::{Entity, Schema};
use crate::entity_id::EntityId;
use crate::error::CodecError;

/// One wire payload (`p`).
pub type Payload = Map<String, Value>;

fn schema_error<S: Schema>(source: serde_json::Error) -> CodecError {
    CodecError::Schema {
        kind: S::KIND,
        source,
    }
}

/// Serializes every field of a schema, defaults included.
pub fn to_payload<S: Schema>(fields: &S) -> Result<Payload, CodecError> {
    match serde_json::to_value(fields).map_err(schema_error::<S>)? {
        Value::Object(map) => Ok(map),
        other => Err(schema_error::<S>(serde::ser::Error::custom(format!(
            "expected an object, got {}",
            other
        )))),
    }
}

/// Decodes a payload into a schema. Missing keys take their defaults.
pub fn from_payload<S: Schema>(payload: Payload) -> Result<S, CodecError> {
    serde_json::from_value(Value::Object(payload)).map_err(schema_error::<S>)
}

/// Keys of `current` whose value differs from `base`.
pub fn diff(base: &Payload, current: &Payload) -> Payload {
    current
        .iter()
        .filter(|(key, value)| base.get(key.as_str()) != Some(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Overwrites the keys present in `changes`, leaving the rest alone.
pub fn merge(target: &mut Payload, changes: &Payload) {
    for (key, value) in changes {
        target.insert(key.clone(), value.clone());
    }
}

/// Full payload for an entity the server has never seen.
pub fn encode_create<S: Schema>(entity: &Entity<S>) -> Result<Payload, CodecError> {
    if entity.is_synced() {
        return Err(CodecError::AlreadySynced(entity.id().clone()));
    }
    let payload = to_payload(entity.fields())?;
    debug!(id = %entity.id(), kind = %S::KIND, keys = payload.len(), "encoded create");
    Ok(payload)
}

/// Changed fields of a synced entity. An empty diff is an error.
pub fn encode_edit<S: Schema>(entity: &Entity<S>) -> Result<Payload, CodecError> {
    let synced = entity
        .synced()
        .ok_or_else(|| CodecError::NeverSynced(entity.id().clone()))?;
    let base = to_payload(synced)?;
    let current = to_payload(entity.fields())?;
    let changes = diff(&base, &current);
    if changes.is_empty() {
        return Err(CodecError::NoChanges(entity.id().clone()));
    }
    let keys: Vec<&String> = changes.keys().collect();
    debug!(id = %entity.id(), kind = %S::KIND, ?keys, "encoded edit");
    Ok(changes)
}

/// Builds a synced entity from a create payload.
pub fn decode_create<S: Schema>(id: EntityId, payload: Payload) -> Result<Entity<S>, CodecError> {
    let fields = from_payload(payload)?;
    Ok(Entity::from_remote(id, fields))
}

/// Writes `payload` into both the working and the synced state.
///
/// The entity is untouched if either merged state fails to decode.
pub fn apply_edit<S: Schema>(entity: &mut Entity<S>, payload: &Payload) -> Result<(), CodecError> {
    let mut working = to_payload(entity.fields())?;
    merge(&mut working, payload);
    let working: S = from_payload(working)?;

    let synced = match entity.synced() {
        Some(synced) => {
            let mut synced = to_payload(synced)?;
            merge(&mut synced, payload);
            from_payload(synced)?
        }
        None => working.clone(),
    };

    entity.replace_state(working, Some(synced));
    Ok(())
}

/// Records that the server accepted a create carrying exactly `payload`.
pub fn acknowledge_create<S: Schema>(
    entity: &mut Entity<S>,
    payload: &Payload,
) -> Result<(), CodecError> {
    let fields: S = from_payload(payload.clone())?;
    entity.replace_state(fields.clone(), Some(fields));
    Ok(())
}

/// Takes a create read back from the log as the acknowledgement of a local
/// create whose reply never arrived.
///
/// The server's fields become the synced state. Local changes made since
/// the create was sent stay in the working state, except the modification
/// stamp, which the server copy carries.
pub fn adopt_remote_create<S: Schema>(
    entity: &mut Entity<S>,
    payload: &Payload,
) -> Result<(), CodecError> {
    if entity.is_synced() {
        return Err(CodecError::AlreadySynced(entity.id().clone()));
    }
    let synced: S = from_payload(payload.clone())?;
    let server = to_payload(&synced)?;

    let mut local = diff(&server, &to_payload(entity.fields())?);
    if let Some(key) = S::MODIFIED_KEY {
        local.remove(key);
    }
    let mut working = server;
    merge(&mut working, &local);
    let working: S = from_payload(working)?;

    debug!(id = %entity.id(), kind = %S::KIND, kept = local.len(), "adopted remote create");
    entity.replace_state(working, Some(synced));
    Ok(())
}
