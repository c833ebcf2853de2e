use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use things_sync_core::{EntityId, EntityStore, Task};

use super::{print_entities, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum, Default)]
pub enum View {
    #[default]
    Inbox,
    Today,
    Anytime,
    Someday,
    Upcoming,
    Projects,
    Completed,
    Trash,
    Tags,
    Areas,
}

/// List tasks in a view, or all tags or areas
#[derive(Args)]
pub struct ListCommand {
    /// Which list to show
    #[arg(value_enum, default_value = "inbox")]
    view: View,

    /// Only tasks in this project
    #[arg(long, value_name = "ID")]
    project: Option<String>,

    /// Only tasks with this tag
    #[arg(long, value_name = "TITLE")]
    tag: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ListCommand {
    pub fn run(&self, store: &EntityStore) -> Result<(), Box<dyn std::error::Error>> {
        match self.view {
            View::Tags | View::Areas if self.project.is_some() || self.tag.is_some() => {
                return Err("--project and --tag only apply to task lists".into())
            }
            View::Tags => print_entities(&store.tags(), self.format)?,
            View::Areas => print_entities(&store.areas(), self.format)?,
            _ => {
                let tasks = self.tasks(store, Local::now().date_naive())?;
                print_entities(&tasks, self.format)?;
            }
        }
        Ok(())
    }

    /// Tasks of the chosen view narrowed by the `--project`/`--tag` filters.
    fn tasks<'a>(
        &self,
        store: &'a EntityStore,
        today: NaiveDate,
    ) -> Result<Vec<&'a Task>, Box<dyn std::error::Error>> {
        let mut tasks = match self.view {
            View::Inbox => store.inbox(),
            View::Today => store.today(today),
            View::Anytime => store.anytime(today),
            View::Someday => store.someday(),
            View::Upcoming => store.upcoming(today),
            View::Projects => store.projects(),
            View::Completed => store.completed(),
            View::Trash => store.trashed(),
            View::Tags | View::Areas => {
                return Err("--project and --tag only apply to task lists".into())
            }
        };

        if let Some(project) = &self.project {
            let project = EntityId::parse(project)?;
            tasks.retain(|t| t.project_id() == Some(&project));
        }
        if let Some(title) = &self.tag {
            let tag = store
                .find_tag(title)
                .ok_or_else(|| format!("No tag named '{}'", title))?;
            tasks.retain(|t| t.tags.contains(tag.id()));
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use things_sync_core::{Tag, TagFields, TaskFields};

    fn list(view: View, project: Option<&str>, tag: Option<&str>) -> ListCommand {
        ListCommand {
            view,
            project: project.map(String::from),
            tag: tag.map(String::from),
            format: OutputFormat::Text,
        }
    }

    fn titles(tasks: Vec<&Task>) -> Vec<&str> {
        tasks.into_iter().map(|t| t.title.as_str()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 9).unwrap()
    }

    #[test]
    fn test_tag_filter_narrows_view() {
        let mut store = EntityStore::new();
        let work = Tag::new(TagFields::titled("Work"));
        let work_id = work.id().clone();
        store.insert(work).unwrap();

        let mut report = Task::new(TaskFields::titled("Report"));
        report.add_tag(work_id);
        store.insert(report).unwrap();
        store.insert(Task::new(TaskFields::titled("Groceries"))).unwrap();

        let all = list(View::Inbox, None, None).tasks(&store, today()).unwrap();
        assert_eq!(all.len(), 2);

        let work = list(View::Inbox, None, Some("Work"))
            .tasks(&store, today())
            .unwrap();
        assert_eq!(titles(work), vec!["Report"]);

        assert!(list(View::Inbox, None, Some("Missing"))
            .tasks(&store, today())
            .is_err());
    }

    #[test]
    fn test_project_filter() {
        let mut store = EntityStore::new();
        let project = Task::new(TaskFields::project("Launch"));
        let project_id = project.id().clone();
        store.insert(project).unwrap();

        let mut child = Task::new(TaskFields::titled("Write copy"));
        child.move_to_project(Some(&project_id)).unwrap();
        store.insert(child).unwrap();
        store.insert(Task::new(TaskFields::titled("Loose"))).unwrap();

        let tasks = list(View::Anytime, Some(project_id.as_str()), None)
            .tasks(&store, today())
            .unwrap();
        assert_eq!(titles(tasks), vec!["Write copy"]);
    }

    #[test]
    fn test_filters_rejected_for_tag_and_area_lists() {
        let store = EntityStore::new();
        assert!(list(View::Tags, None, Some("Work")).run(&store).is_err());
        assert!(list(View::Areas, Some("abc"), None).run(&store).is_err());
        assert!(list(View::Areas, None, None).run(&store).is_ok());
    }
}
