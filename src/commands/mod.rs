mod checklist;
mod config_cmd;
mod list;
mod sync_cmd;
mod tag;
mod task;

use clap::ValueEnum;
use serde_json::Value;
use std::fmt;
use things_sync_core::{Entity, Schema};

pub use checklist::ChecklistCommand;
pub use config_cmd::ConfigCommand;
pub use list::ListCommand;
pub use sync_cmd::SyncCommand;
pub use tag::{AreaCommand, TagCommand};
pub use task::{AddCommand, ShowCommand, TaskAction, TaskActionCommand};

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Wire fields of an entity plus its id, for JSON output.
pub fn entity_json<S: Schema>(entity: &Entity<S>) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(entity.fields())?;
    if let Value::Object(map) = &mut value {
        map.insert("id".to_string(), Value::String(entity.id().to_string()));
        map.insert("kind".to_string(), Value::String(entity.kind().to_string()));
    }
    Ok(value)
}

/// One line per entity, or a JSON array.
pub fn print_entities<S: Schema>(
    entities: &[&Entity<S>],
    format: OutputFormat,
) -> Result<(), serde_json::Error>
where
    Entity<S>: fmt::Display,
{
    match format {
        OutputFormat::Json => {
            let values = entities
                .iter()
                .map(|e| entity_json(e))
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        OutputFormat::Text => {
            if entities.is_empty() {
                println!("Nothing here.");
            }
            for entity in entities {
                println!("{}", entity);
            }
        }
    }
    Ok(())
}
