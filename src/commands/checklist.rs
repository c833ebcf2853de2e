use clap::{Args, Subcommand};
use things_sync_core::{
    ChecklistItem, ChecklistItemFields, EntityId, EntityStore, HistoryTransport, ThingsClient,
};

#[derive(Args)]
pub struct ChecklistCommand {
    #[command(subcommand)]
    pub command: ChecklistSubcommand,
}

#[derive(Subcommand)]
pub enum ChecklistSubcommand {
    /// Add a checklist item to a task
    Add {
        /// Task ID
        task_id: String,

        /// Title of the item
        title: String,
    },

    /// Check off a checklist item
    Complete {
        /// Checklist item ID
        id: String,
    },
}

impl ChecklistCommand {
    pub fn run<T: HistoryTransport>(
        &self,
        client: &mut ThingsClient<T>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ChecklistSubcommand::Add { task_id, title } => {
                let item = build_item(client.store(), task_id, title)?;
                println!("Created {}", item);
                client.insert(item)?;
            }
            ChecklistSubcommand::Complete { id } => {
                complete_item(client.store_mut(), id)?;
            }
        }
        Ok(())
    }
}

fn build_item(
    store: &EntityStore,
    task_id: &str,
    title: &str,
) -> Result<ChecklistItem, Box<dyn std::error::Error>> {
    let task_id = EntityId::parse(task_id)?;
    if store.task(&task_id).is_none() {
        return Err(format!("No task with ID '{}'", task_id).into());
    }
    let mut fields = ChecklistItemFields::new(&task_id, title);
    fields.index = store.checklist_for(&task_id).len() as i64;
    Ok(ChecklistItem::new(fields))
}

fn complete_item(store: &mut EntityStore, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id = EntityId::parse(id)?;
    let item = store
        .checklist_item_mut(&id)
        .ok_or_else(|| format!("No checklist item with ID '{}'", id))?;
    item.complete()?;
    println!("{}", item);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use things_sync_core::{Status, Task, TaskFields};

    #[test]
    fn test_items_are_appended_in_order() {
        let mut store = EntityStore::new();
        let task = Task::new(TaskFields::titled("Pack"));
        let task_id = task.id().clone();
        store.insert(task).unwrap();

        let first = build_item(&store, task_id.as_str(), "Passport").unwrap();
        store.insert(first).unwrap();
        let second = build_item(&store, task_id.as_str(), "Charger").unwrap();
        assert_eq!(second.index, 1);
        let second_id = second.id().clone();
        store.insert(second).unwrap();

        complete_item(&mut store, second_id.as_str()).unwrap();
        assert_eq!(
            store.checklist_item(&second_id).unwrap().status,
            Status::Complete
        );
    }

    #[test]
    fn test_item_needs_existing_task() {
        let store = EntityStore::new();
        assert!(build_item(&store, "ghost", "Anything").is_err());
    }
}
