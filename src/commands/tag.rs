use clap::{Args, Subcommand};
use things_sync_core::{
    Area, AreaFields, EntityId, EntityStore, HistoryTransport, Tag, TagFields, ThingsClient,
};

#[derive(Args)]
pub struct TagCommand {
    #[command(subcommand)]
    pub command: TagSubcommand,
}

#[derive(Subcommand)]
pub enum TagSubcommand {
    /// Create a new tag
    Create {
        /// Title of the tag
        title: String,

        /// Parent tag ID
        #[arg(long, value_name = "ID")]
        parent: Option<String>,
    },
}

impl TagCommand {
    pub fn run<T: HistoryTransport>(
        &self,
        client: &mut ThingsClient<T>,
    ) -> Result<EntityId, Box<dyn std::error::Error>> {
        match &self.command {
            TagSubcommand::Create { title, parent } => {
                let tag = build_tag(client.store(), title, parent.as_deref())?;
                println!("Created {}", tag);
                Ok(client.insert(tag)?)
            }
        }
    }
}

fn build_tag(
    store: &EntityStore,
    title: &str,
    parent: Option<&str>,
) -> Result<Tag, Box<dyn std::error::Error>> {
    if store.find_tag(title).is_some() {
        return Err(format!("A tag named '{}' already exists", title).into());
    }
    let mut tag = Tag::new(TagFields::titled(title));
    if let Some(parent) = parent {
        let parent = EntityId::parse(parent)?;
        if store.tag(&parent).is_none() {
            return Err(format!("No tag with ID '{}'", parent).into());
        }
        tag.set_parent(Some(parent));
    }
    Ok(tag)
}

#[derive(Args)]
pub struct AreaCommand {
    #[command(subcommand)]
    pub command: AreaSubcommand,
}

#[derive(Subcommand)]
pub enum AreaSubcommand {
    /// Create a new area
    Create {
        /// Title of the area
        title: String,
    },
}

impl AreaCommand {
    pub fn run<T: HistoryTransport>(
        &self,
        client: &mut ThingsClient<T>,
    ) -> Result<EntityId, Box<dyn std::error::Error>> {
        match &self.command {
            AreaSubcommand::Create { title } => {
                let area = Area::new(AreaFields::titled(title.clone()));
                println!("Created {}", area);
                Ok(client.insert(area)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tag_with_parent() {
        let mut store = EntityStore::new();
        let parent = Tag::new(TagFields::titled("Errands"));
        let parent_id = parent.id().clone();
        store.insert(parent).unwrap();

        let tag = build_tag(&store, "Hardware store", Some(parent_id.as_str())).unwrap();
        assert_eq!(tag.title, "Hardware store");
        assert_eq!(tag.parent, Some(parent_id));
    }

    #[test]
    fn test_build_tag_rejects_duplicates_and_unknown_parent() {
        let mut store = EntityStore::new();
        store.insert(Tag::new(TagFields::titled("Work"))).unwrap();

        assert!(build_tag(&store, "work", None).is_err());
        assert!(build_tag(&store, "Home", Some("nope")).is_err());
        assert!(build_tag(&store, "Home", None).is_ok());
    }
}
