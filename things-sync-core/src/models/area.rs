use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, EntityKind, Schema};
use crate::entity_id::EntityId;

pub type Area = Entity<AreaFields>;

/// `Area2`/`Area3` fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaFields {
    #[serde(rename = "tt")]
    pub title: String,
    #[serde(rename = "ix")]
    pub index: i64,
    #[serde(rename = "tg")]
    pub tags: Vec<EntityId>,
}

impl AreaFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Schema for AreaFields {
    const KIND: EntityKind = EntityKind::Area;

    fn title(&self) -> &str {
        &self.title
    }

    fn index(&self) -> i64 {
        self.index
    }
}

impl Entity<AreaFields> {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields_mut().title = title.into();
    }

    pub fn set_tags(&mut self, tags: Vec<EntityId>) {
        self.fields_mut().tags = tags;
    }
}

impl fmt::Display for Entity<AreaFields> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id())
    }
}
