use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use super::wire;
use crate::entity::{Entity, EntityKind, Schema};
use crate::entity_id::EntityId;
use crate::error::ModelError;

/// A task, project or heading (`Task6`).
pub type Task = Entity<TaskFields>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    #[default]
    Todo,
    Cancelled,
    Complete,
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        match status {
            Status::Todo => 0,
            Status::Cancelled => 2,
            Status::Complete => 3,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Todo),
            2 => Ok(Status::Cancelled),
            3 => Ok(Status::Complete),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Todo => write!(f, "todo"),
            Status::Cancelled => write!(f, "cancelled"),
            Status::Complete => write!(f, "complete"),
        }
    }
}

/// Which top-level list a task lives in. Today and Evening are Anytime
/// tasks scheduled for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Destination {
    #[default]
    Inbox,
    Anytime,
    Someday,
}

impl From<Destination> for u8 {
    fn from(destination: Destination) -> u8 {
        match destination {
            Destination::Inbox => 0,
            Destination::Anytime => 1,
            Destination::Someday => 2,
        }
    }
}

impl TryFrom<u8> for Destination {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Destination::Inbox),
            1 => Ok(Destination::Anytime),
            2 => Ok(Destination::Someday),
            other => Err(format!("unknown destination: {}", other)),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Inbox => write!(f, "inbox"),
            Destination::Anytime => write!(f, "anytime"),
            Destination::Someday => write!(f, "someday"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskType {
    #[default]
    Task,
    Project,
    Heading,
}

impl From<TaskType> for u8 {
    fn from(task_type: TaskType) -> u8 {
        match task_type {
            TaskType::Task => 0,
            TaskType::Project => 1,
            TaskType::Heading => 2,
        }
    }
}

impl TryFrom<u8> for TaskType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TaskType::Task),
            1 => Ok(TaskType::Project),
            2 => Ok(TaskType::Heading),
            other => Err(format!("unknown task type: {}", other)),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Task => write!(f, "task"),
            TaskType::Project => write!(f, "project"),
            TaskType::Heading => write!(f, "heading"),
        }
    }
}

/// Rich-text note attached to a task (`nt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    #[serde(rename = "_t")]
    pub format: String,
    #[serde(rename = "ch")]
    pub checksum: i64,
    #[serde(rename = "v")]
    pub value: String,
    pub t: i64,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            format: "tx".to_string(),
            checksum: 0,
            value: String::new(),
            t: 1,
        }
    }
}

/// Full `Task6` field set.
///
/// Recurrence and alarm bookkeeping is carried through verbatim so that
/// creates stay complete and edits never clobber it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFields {
    #[serde(rename = "ix")]
    pub index: i64,
    #[serde(rename = "tt")]
    pub title: String,
    #[serde(rename = "ss")]
    pub status: Status,
    #[serde(rename = "st")]
    pub destination: Destination,
    #[serde(rename = "cd", with = "wire::timestamp_float")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(rename = "md", with = "wire::timestamp_float")]
    pub modification_date: Option<DateTime<Utc>>,
    #[serde(rename = "sr", with = "wire::day")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(rename = "tir", with = "wire::day")]
    pub today_index_reference_date: Option<NaiveDate>,
    #[serde(rename = "sp", with = "wire::timestamp_secs")]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(rename = "dd", with = "wire::day")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "tr")]
    pub trashed: bool,
    #[serde(rename = "icp")]
    pub instance_creation_paused: bool,
    #[serde(rename = "pr")]
    pub projects: Vec<EntityId>,
    #[serde(rename = "ar")]
    pub areas: Vec<EntityId>,
    #[serde(rename = "sb", with = "wire::bool_bit")]
    pub evening: bool,
    #[serde(rename = "tg")]
    pub tags: Vec<EntityId>,
    #[serde(rename = "tp")]
    pub task_type: TaskType,
    #[serde(rename = "dds", with = "wire::day")]
    pub due_date_suppression_date: Option<NaiveDate>,
    #[serde(rename = "rt")]
    pub repeating_template: Vec<EntityId>,
    #[serde(rename = "rmd")]
    pub repeater_migration_date: Value,
    #[serde(rename = "dl")]
    pub delegate: Vec<Value>,
    #[serde(rename = "do")]
    pub due_date_offset: i64,
    #[serde(rename = "lai", with = "wire::timestamp_secs")]
    pub last_alarm_interaction_date: Option<DateTime<Utc>>,
    #[serde(rename = "agr")]
    pub headings: Vec<EntityId>,
    #[serde(rename = "lt")]
    pub leaves_tombstone: bool,
    #[serde(rename = "icc")]
    pub instance_creation_count: i64,
    #[serde(rename = "ti")]
    pub today_index: i64,
    /// Reminder time, in seconds after midnight.
    #[serde(rename = "ato")]
    pub reminder: Option<i64>,
    #[serde(rename = "icsd", with = "wire::day")]
    pub instance_creation_start_date: Option<NaiveDate>,
    #[serde(rename = "rp")]
    pub repeater: Value,
    #[serde(rename = "acrd", with = "wire::day")]
    pub after_completion_reference_date: Option<NaiveDate>,
    #[serde(rename = "rr")]
    pub recurrence_rule: Value,
    #[serde(rename = "nt")]
    pub note: Note,
    #[serde(rename = "xx")]
    pub xx: Value,
}

impl Default for TaskFields {
    fn default() -> Self {
        Self {
            index: 0,
            title: String::new(),
            status: Status::Todo,
            destination: Destination::Inbox,
            creation_date: None,
            modification_date: None,
            scheduled_date: None,
            today_index_reference_date: None,
            completion_date: None,
            due_date: None,
            trashed: false,
            instance_creation_paused: false,
            projects: Vec::new(),
            areas: Vec::new(),
            evening: false,
            tags: Vec::new(),
            task_type: TaskType::Task,
            due_date_suppression_date: None,
            repeating_template: Vec::new(),
            repeater_migration_date: Value::Null,
            delegate: Vec::new(),
            due_date_offset: 0,
            last_alarm_interaction_date: None,
            headings: Vec::new(),
            leaves_tombstone: false,
            instance_creation_count: 0,
            today_index: 0,
            reminder: None,
            instance_creation_start_date: None,
            repeater: Value::Null,
            after_completion_reference_date: None,
            recurrence_rule: Value::Null,
            note: Note::default(),
            xx: json!({ "sn": {}, "_t": "oo" }),
        }
    }
}

impl TaskFields {
    /// A fresh inbox task created now.
    pub fn titled(title: impl Into<String>) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        Self {
            title: title.into(),
            creation_date: Some(now),
            modification_date: Some(now),
            ..Self::default()
        }
    }

    /// A fresh project created now. Projects never live in the inbox.
    pub fn project(title: impl Into<String>) -> Self {
        Self {
            task_type: TaskType::Project,
            destination: Destination::Anytime,
            instance_creation_paused: true,
            ..Self::titled(title)
        }
    }

    pub fn project_id(&self) -> Option<&EntityId> {
        self.projects.first()
    }

    pub fn area_id(&self) -> Option<&EntityId> {
        self.areas.first()
    }

    pub fn heading_id(&self) -> Option<&EntityId> {
        self.headings.first()
    }

    pub fn notes(&self) -> &str {
        &self.note.value
    }

    pub fn is_task(&self) -> bool {
        self.task_type == TaskType::Task
    }

    pub fn is_project(&self) -> bool {
        self.task_type == TaskType::Project
    }

    /// Not trashed and still to do.
    pub fn is_active(&self) -> bool {
        !self.trashed && self.status == Status::Todo
    }

    /// Anytime task scheduled for `today`.
    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.destination == Destination::Anytime && self.scheduled_date == Some(today)
    }

    pub fn is_evening(&self, today: NaiveDate) -> bool {
        self.is_today(today) && self.evening
    }

    pub fn has_recurrence(&self) -> bool {
        match &self.recurrence_rule {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }
}

impl Schema for TaskFields {
    const KIND: EntityKind = EntityKind::Task;
    const MODIFIED_KEY: Option<&'static str> = Some("md");
    const TRASH_KEY: Option<&'static str> = Some("tr");

    fn title(&self) -> &str {
        &self.title
    }

    fn index(&self) -> i64 {
        self.index
    }
}

impl Entity<TaskFields> {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields_mut().title = title.into();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.fields_mut().note.value = notes.into();
    }

    pub fn set_index(&mut self, index: i64) {
        self.fields_mut().index = index;
    }

    pub fn set_due_date(&mut self, due: Option<NaiveDate>) {
        self.fields_mut().due_date = due;
    }

    pub fn set_reminder(&mut self, seconds_after_midnight: Option<i64>) {
        self.fields_mut().reminder = seconds_after_midnight;
    }

    pub fn set_tags(&mut self, tags: Vec<EntityId>) {
        self.fields_mut().tags = tags;
    }

    /// Adds a tag unless it is already present.
    pub fn add_tag(&mut self, tag: EntityId) {
        let tags = &mut self.fields_mut().tags;
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    pub fn remove_tag(&mut self, tag: &EntityId) {
        self.fields_mut().tags.retain(|t| t != tag);
    }

    /// Moves to a new status, stamping or clearing the completion date.
    pub fn set_status(&mut self, status: Status) -> Result<(), ModelError> {
        if self.status == status {
            return Err(ModelError::StatusUnchanged(status));
        }
        let fields = self.fields_mut();
        fields.status = status;
        fields.completion_date = match status {
            Status::Todo => None,
            Status::Complete | Status::Cancelled => Some(Utc::now().trunc_subsecs(0)),
        };
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), ModelError> {
        self.set_status(Status::Complete)
    }

    pub fn cancel(&mut self) -> Result<(), ModelError> {
        self.set_status(Status::Cancelled)
    }

    pub fn reopen(&mut self) -> Result<(), ModelError> {
        self.set_status(Status::Todo)
    }

    /// Only plain tasks have a destination of their own.
    pub fn set_destination(&mut self, destination: Destination) -> Result<(), ModelError> {
        if !self.is_task() {
            return Err(ModelError::DestinationNotAllowed(self.task_type));
        }
        self.fields_mut().destination = destination;
        Ok(())
    }

    pub fn move_to_inbox(&mut self) -> Result<(), ModelError> {
        self.set_destination(Destination::Inbox)?;
        self.clear_schedule();
        Ok(())
    }

    pub fn move_to_anytime(&mut self) -> Result<(), ModelError> {
        self.set_destination(Destination::Anytime)?;
        self.clear_schedule();
        Ok(())
    }

    pub fn move_to_someday(&mut self) -> Result<(), ModelError> {
        self.set_destination(Destination::Someday)?;
        self.clear_schedule();
        Ok(())
    }

    /// Schedules for a specific day in Anytime.
    pub fn schedule_on(&mut self, day: NaiveDate) -> Result<(), ModelError> {
        self.set_destination(Destination::Anytime)?;
        let fields = self.fields_mut();
        fields.scheduled_date = Some(day);
        fields.today_index_reference_date = Some(day);
        fields.evening = false;
        Ok(())
    }

    pub fn schedule_today(&mut self, today: NaiveDate) -> Result<(), ModelError> {
        self.schedule_on(today)
    }

    pub fn schedule_evening(&mut self, today: NaiveDate) -> Result<(), ModelError> {
        self.schedule_on(today)?;
        self.fields_mut().evening = true;
        Ok(())
    }

    fn clear_schedule(&mut self) {
        let fields = self.fields_mut();
        fields.scheduled_date = None;
        fields.today_index_reference_date = None;
        fields.evening = false;
    }

    /// Assigns a project (clearing the area) or detaches from it with `None`.
    /// An inbox task moves to Anytime once it has a parent.
    pub fn move_to_project(&mut self, project: Option<&EntityId>) -> Result<(), ModelError> {
        let Some(project) = project else {
            self.fields_mut().projects.clear();
            return Ok(());
        };
        if project == self.id() {
            return Err(ModelError::SelfProject(project.clone()));
        }
        let fields = self.fields_mut();
        fields.projects = vec![project.clone()];
        fields.areas.clear();
        self.leave_inbox();
        Ok(())
    }

    /// Assigns an area (clearing the project) or detaches from it with `None`.
    pub fn move_to_area(&mut self, area: Option<&EntityId>) {
        let Some(area) = area else {
            self.fields_mut().areas.clear();
            return;
        };
        let fields = self.fields_mut();
        fields.areas = vec![area.clone()];
        fields.projects.clear();
        self.leave_inbox();
    }

    fn leave_inbox(&mut self) {
        if self.is_task() && self.destination == Destination::Inbox {
            self.fields_mut().destination = Destination::Anytime;
        }
    }

    pub fn trash(&mut self) -> Result<(), ModelError> {
        if self.trashed {
            return Err(ModelError::AlreadyTrashed);
        }
        self.fields_mut().trashed = true;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<(), ModelError> {
        if !self.trashed {
            return Err(ModelError::NotTrashed);
        }
        self.fields_mut().trashed = false;
        Ok(())
    }

    pub fn convert_to_project(&mut self) -> Result<(), ModelError> {
        if !self.is_task() {
            return Err(ModelError::NotATask(self.task_type));
        }
        let fields = self.fields_mut();
        fields.task_type = TaskType::Project;
        fields.instance_creation_paused = true;
        if fields.destination == Destination::Inbox {
            fields.destination = Destination::Anytime;
        }
        Ok(())
    }
}

impl fmt::Display for Entity<TaskFields> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.status {
            Status::Todo => "[ ]",
            Status::Complete => "[x]",
            Status::Cancelled => "[-]",
        };
        write!(f, "{} {} ({})", mark, self.title, self.id())?;
        if self.is_project() {
            write!(f, " project")?;
        }
        if let Some(day) = self.scheduled_date {
            write!(f, " scheduled {}", day)?;
        }
        if let Some(day) = self.due_date {
            write!(f, " due {}", day)?;
        }
        if self.trashed {
            write!(f, " trashed")?;
        }
        Ok(())
    }
}
