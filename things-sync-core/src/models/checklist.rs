use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::wire;
use super::Status;
use crate::entity::{Entity, EntityKind, Schema};
use crate::entity_id::EntityId;
use crate::error::ModelError;

pub type ChecklistItem = Entity<ChecklistItemFields>;

/// `ChecklistItem3` fields. A checklist item belongs to the tasks in `ts`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecklistItemFields {
    #[serde(rename = "tt")]
    pub title: String,
    #[serde(rename = "ss")]
    pub status: Status,
    #[serde(rename = "ix")]
    pub index: i64,
    #[serde(rename = "cd", with = "wire::timestamp_float")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(rename = "md", with = "wire::timestamp_float")]
    pub modification_date: Option<DateTime<Utc>>,
    #[serde(rename = "ts")]
    pub tasks: Vec<EntityId>,
}

impl ChecklistItemFields {
    pub fn new(task: &EntityId, title: impl Into<String>) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        Self {
            title: title.into(),
            creation_date: Some(now),
            modification_date: Some(now),
            tasks: vec![task.clone()],
            ..Self::default()
        }
    }

    pub fn belongs_to(&self, task: &EntityId) -> bool {
        self.tasks.contains(task)
    }
}

impl Schema for ChecklistItemFields {
    const KIND: EntityKind = EntityKind::ChecklistItem;
    const MODIFIED_KEY: Option<&'static str> = Some("md");

    fn title(&self) -> &str {
        &self.title
    }

    fn index(&self) -> i64 {
        self.index
    }
}

impl Entity<ChecklistItemFields> {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields_mut().title = title.into();
    }

    pub fn set_status(&mut self, status: Status) -> Result<(), ModelError> {
        if self.status == status {
            return Err(ModelError::StatusUnchanged(status));
        }
        self.fields_mut().status = status;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), ModelError> {
        self.set_status(Status::Complete)
    }

    pub fn reopen(&mut self) -> Result<(), ModelError> {
        self.set_status(Status::Todo)
    }
}

impl fmt::Display for Entity<ChecklistItemFields> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.status == Status::Todo { "[ ]" } else { "[x]" };
        write!(f, "  {} {} ({})", mark, self.title, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_and_reopen() {
        let task = EntityId::new();
        let mut item = ChecklistItem::new(ChecklistItemFields::new(&task, "Eggs"));
        assert!(item.belongs_to(&task));

        item.complete().unwrap();
        assert_eq!(item.status, Status::Complete);
        assert_eq!(
            item.complete(),
            Err(ModelError::StatusUnchanged(Status::Complete))
        );
        item.reopen().unwrap();
        assert_eq!(item.status, Status::Todo);
    }

    #[test]
    fn test_wire_keys() {
        let task = EntityId::parse("task1").unwrap();
        let fields = ChecklistItemFields::new(&task, "Eggs");
        let value = serde_json::to_value(&fields).unwrap();
        assert_eq!(value["tt"], "Eggs");
        assert_eq!(value["ts"], json!(["task1"]));
        assert_eq!(value["ss"], 0);
    }
}
