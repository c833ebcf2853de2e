use serde::{Deserialize, Serialize};
use std::fmt;

use super::wire;
use crate::entity::{Entity, EntityKind, Schema};
use crate::entity_id::EntityId;

pub type Tag = Entity<TagFields>;

/// `Tag3`/`Tag4` fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagFields {
    #[serde(rename = "tt")]
    pub title: String,
    #[serde(rename = "pn", with = "wire::parent_ref")]
    pub parent: Option<EntityId>,
    /// Keyboard shortcut, empty when unset.
    #[serde(rename = "sn", with = "wire::string_or_null")]
    pub short_name: String,
    #[serde(rename = "ix")]
    pub index: i64,
}

impl TagFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Schema for TagFields {
    const KIND: EntityKind = EntityKind::Tag;

    fn title(&self) -> &str {
        &self.title
    }

    fn index(&self) -> i64 {
        self.index
    }
}

impl Entity<TagFields> {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields_mut().title = title.into();
    }

    pub fn set_parent(&mut self, parent: Option<EntityId>) {
        self.fields_mut().parent = parent;
    }

    pub fn set_short_name(&mut self, short_name: impl Into<String>) {
        self.fields_mut().short_name = short_name.into();
    }
}

impl fmt::Display for Entity<TagFields> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.title, self.id())?;
        if let Some(parent) = &self.parent {
            write!(f, " under {}", parent)?;
        }
        Ok(())
    }
}
