use chrono::{Local, NaiveDate};
use clap::Args;
use std::str::FromStr;
use things_sync_core::{
    EntityId, EntityRef, EntityStore, HistoryTransport, ModelError, Task, TaskFields,
    ThingsClient,
};

use super::{entity_json, OutputFormat};

/// Where a new task goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum When {
    Inbox,
    Today,
    Evening,
    Anytime,
    Someday,
    On(NaiveDate),
}

impl FromStr for When {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inbox" => Ok(When::Inbox),
            "today" => Ok(When::Today),
            "evening" | "tonight" => Ok(When::Evening),
            "anytime" => Ok(When::Anytime),
            "someday" => Ok(When::Someday),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(When::On)
                .map_err(|_| {
                    format!(
                        "Invalid value '{}': expected today, evening, anytime, someday, \
                         inbox or YYYY-MM-DD",
                        s
                    )
                }),
        }
    }
}

impl When {
    pub fn apply(self, task: &mut Task, today: NaiveDate) -> Result<(), ModelError> {
        match self {
            When::Inbox => task.move_to_inbox(),
            When::Today => task.schedule_today(today),
            When::Evening => task.schedule_evening(today),
            When::Anytime => task.move_to_anytime(),
            When::Someday => task.move_to_someday(),
            When::On(day) => task.schedule_on(day),
        }
    }
}

/// Create a new task
#[derive(Args)]
pub struct AddCommand {
    /// Title of the task
    title: String,

    /// today, evening, anytime, someday, inbox or a date (YYYY-MM-DD)
    #[arg(long)]
    when: Option<When>,

    /// Notes
    #[arg(long)]
    notes: Option<String>,

    /// Project ID
    #[arg(long, value_name = "ID", conflicts_with = "area")]
    project: Option<String>,

    /// Area ID
    #[arg(long, value_name = "ID")]
    area: Option<String>,

    /// Tag title (can be repeated)
    #[arg(long = "tag", value_name = "TITLE")]
    tags: Vec<String>,
}

impl AddCommand {
    /// Builds the task locally. It is sent when the session finishes.
    pub fn run<T: HistoryTransport>(
        &self,
        client: &mut ThingsClient<T>,
    ) -> Result<EntityId, Box<dyn std::error::Error>> {
        let task = self.build(client.store())?;
        let id = client.insert(task)?;

        if let Some(project) = &self.project {
            client.move_task_to_project(&id, Some(&EntityId::parse(project)?))?;
        }
        if let Some(area) = &self.area {
            client.move_task_to_area(&id, Some(&EntityId::parse(area)?))?;
        }
        // After the parent, which moves inbox tasks to Anytime.
        if let (Some(when), Some(task)) = (self.when, client.task_mut(&id)) {
            when.apply(task, Local::now().date_naive())?;
        }

        if let Some(task) = client.task(&id) {
            println!("Created {}", task);
        }
        Ok(id)
    }

    fn build(&self, store: &EntityStore) -> Result<Task, Box<dyn std::error::Error>> {
        let mut task = Task::new(TaskFields::titled(self.title.clone()));
        if let Some(notes) = &self.notes {
            task.set_notes(notes.clone());
        }
        for title in &self.tags {
            let tag = store
                .find_tag(title)
                .ok_or_else(|| format!("No tag named '{}'", title))?;
            task.add_tag(tag.id().clone());
        }
        Ok(task)
    }
}

/// Show an entity's details
#[derive(Args)]
pub struct ShowCommand {
    /// Entity ID
    id: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ShowCommand {
    pub fn run(&self, store: &EntityStore) -> Result<(), Box<dyn std::error::Error>> {
        let id = EntityId::parse(&self.id)?;
        let entity = store
            .get(&id)
            .ok_or_else(|| format!("Nothing found with ID '{}'", id))?;

        if let OutputFormat::Json = self.format {
            let value = match entity {
                EntityRef::Task(e) => entity_json(e)?,
                EntityRef::ChecklistItem(e) => entity_json(e)?,
                EntityRef::Tag(e) => entity_json(e)?,
                EntityRef::Area(e) => entity_json(e)?,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        println!("{}", entity);
        if entity.has_local_changes() {
            println!("  (not yet synced)");
        }
        if let EntityRef::Task(task) = entity {
            print_task_details(store, task);
        }
        Ok(())
    }
}

fn print_task_details(store: &EntityStore, task: &Task) {
    println!("  type: {}", task.task_type);
    println!("  status: {}", task.status);
    println!("  list: {}", task.destination);
    if let Some(day) = task.scheduled_date {
        println!("  when: {}{}", day, if task.evening { " (evening)" } else { "" });
    }
    if let Some(due) = task.due_date {
        println!("  deadline: {}", due);
    }
    if let Some(project) = task.project_id().and_then(|id| store.task(id)) {
        println!("  project: {}", project.title);
    }
    if let Some(area) = task.area_id().and_then(|id| store.area(id)) {
        println!("  area: {}", area.title);
    }
    let tags: Vec<&str> = task
        .tags
        .iter()
        .filter_map(|id| store.tag(id))
        .map(|tag| tag.title.as_str())
        .collect();
    if !tags.is_empty() {
        println!("  tags: {}", tags.join(", "));
    }
    if task.trashed {
        println!("  in trash");
    }
    if !task.notes().is_empty() {
        println!();
        for line in task.notes().lines() {
            println!("  {}", line);
        }
    }
    let checklist = store.checklist_for(task.id());
    if !checklist.is_empty() {
        println!();
        for item in checklist {
            println!("  {}", item);
        }
    }
}

/// State changes that take a single task ID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskAction {
    Complete,
    Cancel,
    Reopen,
    Trash,
    Restore,
}

#[derive(Args)]
pub struct TaskActionCommand {
    /// Task ID
    id: String,
}

impl TaskActionCommand {
    pub fn run(
        &self,
        action: TaskAction,
        store: &mut EntityStore,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let id = EntityId::parse(&self.id)?;
        let task = store
            .task_mut(&id)
            .ok_or_else(|| format!("No task with ID '{}'", id))?;
        match action {
            TaskAction::Complete => task.complete()?,
            TaskAction::Cancel => task.cancel()?,
            TaskAction::Reopen => task.reopen()?,
            TaskAction::Trash => task.trash()?,
            TaskAction::Restore => task.restore()?,
        }
        println!("{}", task);
        Ok(())
    }
}
