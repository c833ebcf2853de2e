//! In-memory mirror of every entity, with recomputed query views.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind, Schema};
use crate::entity_id::EntityId;
use crate::error::ApplyError;
use crate::models::{
    Area, AreaFields, ChecklistItem, ChecklistItemFields, Destination, Status, Tag, TagFields,
    Task, TaskFields, TaskType,
};

/// Entities of one kind, keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "S: Schema")]
pub struct Collection<S> {
    entities: BTreeMap<EntityId, Entity<S>>,
}

impl<S> Default for Collection<S> {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
        }
    }
}

impl<S: Schema> Collection<S> {
    pub fn get(&self, id: &EntityId) -> Option<&Entity<S>> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity<S>> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every entity, tombstones included.
    pub fn iter(&self) -> impl Iterator<Item = &Entity<S>> {
        self.entities.values()
    }

    fn insert(&mut self, entity: Entity<S>) {
        self.entities.insert(entity.id().clone(), entity);
    }
}

/// Links a schema to its collection inside [`EntityStore`].
pub trait Stored: Schema {
    fn collection(store: &EntityStore) -> &Collection<Self>;
    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self>;
    fn wrap(entity: &Entity<Self>) -> EntityRef<'_>;
}

impl Stored for TaskFields {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.tasks
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.tasks
    }

    fn wrap(entity: &Entity<Self>) -> EntityRef<'_> {
        EntityRef::Task(entity)
    }
}

impl Stored for ChecklistItemFields {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.checklist_items
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.checklist_items
    }

    fn wrap(entity: &Entity<Self>) -> EntityRef<'_> {
        EntityRef::ChecklistItem(entity)
    }
}

impl Stored for TagFields {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.tags
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.tags
    }

    fn wrap(entity: &Entity<Self>) -> EntityRef<'_> {
        EntityRef::Tag(entity)
    }
}

impl Stored for AreaFields {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.areas
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.areas
    }

    fn wrap(entity: &Entity<Self>) -> EntityRef<'_> {
        EntityRef::Area(entity)
    }
}

/// Borrowed view of an entity of any kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Task(&'a Task),
    ChecklistItem(&'a ChecklistItem),
    Tag(&'a Tag),
    Area(&'a Area),
}

impl<'a> EntityRef<'a> {
    pub fn id(&self) -> &'a EntityId {
        match *self {
            EntityRef::Task(e) => e.id(),
            EntityRef::ChecklistItem(e) => e.id(),
            EntityRef::Tag(e) => e.id(),
            EntityRef::Area(e) => e.id(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Task(_) => EntityKind::Task,
            EntityRef::ChecklistItem(_) => EntityKind::ChecklistItem,
            EntityRef::Tag(_) => EntityKind::Tag,
            EntityRef::Area(_) => EntityKind::Area,
        }
    }

    pub fn title(&self) -> &'a str {
        match *self {
            EntityRef::Task(e) => &e.fields().title,
            EntityRef::ChecklistItem(e) => &e.fields().title,
            EntityRef::Tag(e) => &e.fields().title,
            EntityRef::Area(e) => &e.fields().title,
        }
    }

    pub fn as_task(&self) -> Option<&'a Task> {
        match *self {
            EntityRef::Task(task) => Some(task),
            _ => None,
        }
    }

    /// Not trashed, not finished, not deleted.
    pub fn is_active(&self) -> bool {
        match self {
            EntityRef::Task(e) => !e.is_deleted() && e.is_active(),
            EntityRef::ChecklistItem(e) => !e.is_deleted() && e.status == Status::Todo,
            EntityRef::Tag(e) => !e.is_deleted(),
            EntityRef::Area(e) => !e.is_deleted(),
        }
    }

    pub fn has_local_changes(&self) -> bool {
        match self {
            EntityRef::Task(e) => e.has_local_changes(),
            EntityRef::ChecklistItem(e) => e.has_local_changes(),
            EntityRef::Tag(e) => e.has_local_changes(),
            EntityRef::Area(e) => e.has_local_changes(),
        }
    }
}

impl fmt::Display for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Task(e) => fmt::Display::fmt(e, f),
            EntityRef::ChecklistItem(e) => fmt::Display::fmt(e, f),
            EntityRef::Tag(e) => fmt::Display::fmt(e, f),
            EntityRef::Area(e) => fmt::Display::fmt(e, f),
        }
    }
}

/// Every mirrored entity, one collection per kind.
///
/// Views never mutate and never cache: each call filters the current state
/// and sorts by `ix`, then id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStore {
    #[serde(default)]
    tasks: Collection<TaskFields>,
    #[serde(default)]
    checklist_items: Collection<ChecklistItemFields>,
    #[serde(default)]
    tags: Collection<TagFields>,
    #[serde(default)]
    areas: Collection<AreaFields>,
}

fn sorted<S: Schema>(mut items: Vec<&Entity<S>>) -> Vec<&Entity<S>> {
    items.sort_by(|a, b| a.index().cmp(&b.index()).then_with(|| a.id().cmp(b.id())));
    items
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len() + self.checklist_items.len() + self.tags.len() + self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn collection<S: Stored>(&self) -> &Collection<S> {
        S::collection(self)
    }

    /// Point lookup across all kinds. Unknown ids are `None`, not an error.
    pub fn get(&self, id: &EntityId) -> Option<EntityRef<'_>> {
        self.tasks
            .get(id)
            .map(EntityRef::Task)
            .or_else(|| self.checklist_items.get(id).map(EntityRef::ChecklistItem))
            .or_else(|| self.tags.get(id).map(EntityRef::Tag))
            .or_else(|| self.areas.get(id).map(EntityRef::Area))
    }

    pub fn kind_of(&self, id: &EntityId) -> Option<EntityKind> {
        self.get(id).map(|entity| entity.kind())
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn entity<S: Stored>(&self, id: &EntityId) -> Option<&Entity<S>> {
        S::collection(self).get(id)
    }

    pub fn entity_mut<S: Stored>(&mut self, id: &EntityId) -> Option<&mut Entity<S>> {
        S::collection_mut(self).get_mut(id)
    }

    pub fn task(&self, id: &EntityId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn task_mut(&mut self, id: &EntityId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub fn checklist_item(&self, id: &EntityId) -> Option<&ChecklistItem> {
        self.checklist_items.get(id)
    }

    pub fn checklist_item_mut(&mut self, id: &EntityId) -> Option<&mut ChecklistItem> {
        self.checklist_items.get_mut(id)
    }

    pub fn tag(&self, id: &EntityId) -> Option<&Tag> {
        self.tags.get(id)
    }

    pub fn tag_mut(&mut self, id: &EntityId) -> Option<&mut Tag> {
        self.tags.get_mut(id)
    }

    pub fn area(&self, id: &EntityId) -> Option<&Area> {
        self.areas.get(id)
    }

    pub fn area_mut(&mut self, id: &EntityId) -> Option<&mut Area> {
        self.areas.get_mut(id)
    }

    /// Adds an entity. Ids are unique across every kind.
    pub fn insert<S: Stored>(&mut self, entity: Entity<S>) -> Result<(), ApplyError> {
        if self.contains(entity.id()) {
            return Err(ApplyError::DuplicateCreate(entity.id().clone()));
        }
        S::collection_mut(self).insert(entity);
        Ok(())
    }

    /// Ids of entities whose working state has not been acknowledged yet,
    /// in the order they can be committed.
    ///
    /// Creates come before edits. Within each group, entities that others
    /// refer to come first: tags (top level, then nested), areas, projects,
    /// headings, tasks, then checklist items.
    pub fn pending(&self) -> Vec<EntityId> {
        let mut pending: Vec<(bool, u8, &EntityId)> = Vec::new();
        for tag in self.tags.iter().filter(|e| e.has_local_changes()) {
            let rank = if tag.parent.is_some() { 1 } else { 0 };
            pending.push((tag.is_synced(), rank, tag.id()));
        }
        for area in self.areas.iter().filter(|e| e.has_local_changes()) {
            pending.push((area.is_synced(), 2, area.id()));
        }
        for task in self.tasks.iter().filter(|e| e.has_local_changes()) {
            let rank = match task.task_type {
                TaskType::Project => 3,
                TaskType::Heading => 4,
                TaskType::Task => 5,
            };
            pending.push((task.is_synced(), rank, task.id()));
        }
        for item in self.checklist_items.iter().filter(|e| e.has_local_changes()) {
            pending.push((item.is_synced(), 6, item.id()));
        }
        pending.sort();
        pending.into_iter().map(|(_, _, id)| id.clone()).collect()
    }

    fn tasks_where(&self, predicate: impl Fn(&TaskFields) -> bool) -> Vec<&Task> {
        sorted(self.tasks.iter().filter(|t| predicate(t.fields())).collect())
    }

    /// Not trashed, still to do, of type Task.
    fn is_open_task(task: &TaskFields) -> bool {
        task.is_active() && task.task_type == TaskType::Task
    }

    /// Entities of one kind that are neither trashed, finished nor deleted.
    pub fn active<S: Stored>(&self) -> Vec<&Entity<S>> {
        sorted(
            S::collection(self)
                .iter()
                .filter(|e| !e.is_deleted() && S::wrap(e).is_active())
                .collect(),
        )
    }

    /// Open tasks with the given destination.
    pub fn by_destination(&self, destination: Destination) -> Vec<&Task> {
        self.tasks_where(|t| Self::is_open_task(t) && t.destination == destination)
    }

    pub fn inbox(&self) -> Vec<&Task> {
        self.by_destination(Destination::Inbox)
    }

    /// Open Anytime tasks scheduled for `today`, evening ones included.
    pub fn today(&self, today: NaiveDate) -> Vec<&Task> {
        self.tasks_where(|t| Self::is_open_task(t) && t.is_today(today))
    }

    /// Open Anytime tasks not in [`EntityStore::today`].
    pub fn anytime(&self, today: NaiveDate) -> Vec<&Task> {
        self.tasks_where(|t| {
            Self::is_open_task(t) && t.destination == Destination::Anytime && !t.is_today(today)
        })
    }

    pub fn someday(&self) -> Vec<&Task> {
        self.by_destination(Destination::Someday)
    }

    /// Open, non-repeating tasks scheduled after `today`.
    pub fn upcoming(&self, today: NaiveDate) -> Vec<&Task> {
        self.tasks_where(|t| {
            Self::is_open_task(t)
                && !t.has_recurrence()
                && t.scheduled_date.is_some_and(|day| day > today)
        })
    }

    /// Active projects.
    pub fn projects(&self) -> Vec<&Task> {
        self.tasks_where(|t| t.is_active() && t.task_type == TaskType::Project)
    }

    /// Open tasks in a project.
    pub fn by_project(&self, project: &EntityId) -> Vec<&Task> {
        self.tasks_where(|t| Self::is_open_task(t) && t.project_id() == Some(project))
    }

    /// Open tasks and active projects in an area.
    pub fn by_area(&self, area: &EntityId) -> Vec<&Task> {
        self.tasks_where(|t| {
            t.is_active() && t.task_type != TaskType::Heading && t.area_id() == Some(area)
        })
    }

    pub fn by_tag(&self, tag: &EntityId) -> Vec<&Task> {
        self.tasks_where(|t| !t.trashed && t.tags.contains(tag))
    }

    /// Non-trashed tasks carrying the tag titled `title`, ignoring case.
    /// Empty when no such tag exists.
    pub fn tagged(&self, title: &str) -> Vec<&Task> {
        match self.find_tag(title) {
            Some(tag) => self.by_tag(tag.id()),
            None => Vec::new(),
        }
    }

    /// Completed, not trashed.
    pub fn completed(&self) -> Vec<&Task> {
        self.tasks_where(|t| t.status == Status::Complete && !t.trashed)
    }

    pub fn completed_since(&self, since: DateTime<Utc>) -> Vec<&Task> {
        self.tasks_where(|t| {
            t.status == Status::Complete
                && !t.trashed
                && t.completion_date.is_some_and(|done| done >= since)
        })
    }

    /// Every trashed task, whatever its status.
    pub fn trashed(&self) -> Vec<&Task> {
        self.tasks_where(|t| t.trashed)
    }

    /// Non-trashed tasks of type Task, any status.
    pub fn all_tasks(&self) -> Vec<&Task> {
        self.tasks_where(|t| !t.trashed && t.task_type == TaskType::Task)
    }

    /// Case-insensitive substring match over titles and notes.
    pub fn search(&self, query: &str) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.tasks_where(|t| {
            !t.trashed
                && (t.title.to_lowercase().contains(&needle)
                    || t.notes().to_lowercase().contains(&needle))
        })
    }

    pub fn tags(&self) -> Vec<&Tag> {
        self.active::<TagFields>()
    }

    pub fn areas(&self) -> Vec<&Area> {
        self.active::<AreaFields>()
    }

    /// Checklist of a task, finished items included.
    pub fn checklist_for(&self, task: &EntityId) -> Vec<&ChecklistItem> {
        sorted(
            self.checklist_items
                .iter()
                .filter(|item| !item.is_deleted() && item.belongs_to(task))
                .collect(),
        )
    }

    pub fn find_tag(&self, title: &str) -> Option<&Tag> {
        self.tags()
            .into_iter()
            .find(|tag| tag.title.to_lowercase() == title.to_lowercase())
    }

    pub fn find_area(&self, title: &str) -> Option<&Area> {
        self.areas()
            .into_iter()
            .find(|area| area.title.to_lowercase() == title.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add_task(store: &mut EntityStore, fields: TaskFields) -> EntityId {
        let task = Task::new(fields);
        let id = task.id().clone();
        store.insert(task).unwrap();
        id
    }

    #[test]
    fn test_inbox_then_trash() {
        let mut store = EntityStore::new();
        let id = add_task(&mut store, TaskFields::titled("Buy milk"));

        let inbox: Vec<&EntityId> = store.inbox().into_iter().map(|t| t.id()).collect();
        assert_eq!(inbox, vec![&id]);

        store.task_mut(&id).unwrap().trash().unwrap();
        assert!(store.by_destination(Destination::Inbox).is_empty());
        let trashed: Vec<&EntityId> = store.trashed().into_iter().map(|t| t.id()).collect();
        assert_eq!(trashed, vec![&id]);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let store = EntityStore::new();
        assert!(store.get(&EntityId::new()).is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_id_across_kinds() {
        let mut store = EntityStore::new();
        let id = EntityId::new();
        store
            .insert(Task::with_id(id.clone(), TaskFields::titled("Task")))
            .unwrap();
        let result = store.insert(Tag::with_id(id.clone(), TagFields::titled("Tag")));
        assert!(matches!(result, Err(ApplyError::DuplicateCreate(dup)) if dup == id));
        assert_eq!(store.kind_of(&id), Some(EntityKind::Task));
    }

    #[test]
    fn test_today_and_anytime_are_complementary() {
        let today = day(2024, 12, 9);
        let mut store = EntityStore::new();
        let now = add_task(&mut store, TaskFields::titled("Now"));
        store.task_mut(&now).unwrap().schedule_today(today).unwrap();
        let later = add_task(&mut store, TaskFields::titled("Later"));
        store.task_mut(&later).unwrap().move_to_anytime().unwrap();
        let tomorrow = add_task(&mut store, TaskFields::titled("Tomorrow"));
        store
            .task_mut(&tomorrow)
            .unwrap()
            .schedule_on(day(2024, 12, 10))
            .unwrap();

        let today_ids: Vec<&EntityId> = store.today(today).into_iter().map(|t| t.id()).collect();
        assert_eq!(today_ids, vec![&now]);

        let anytime = store.anytime(today);
        assert_eq!(anytime.len(), 2);
        assert!(anytime.iter().all(|t| t.id() != &now));

        let upcoming: Vec<&EntityId> = store.upcoming(today).into_iter().map(|t| t.id()).collect();
        assert_eq!(upcoming, vec![&tomorrow]);
    }

    #[test]
    fn test_views_order_by_index_then_id() {
        let mut store = EntityStore::new();
        let second = add_task(
            &mut store,
            TaskFields {
                index: 20,
                ..TaskFields::titled("B")
            },
        );
        let first = add_task(
            &mut store,
            TaskFields {
                index: -5,
                ..TaskFields::titled("A")
            },
        );
        let titles: Vec<&str> = store.inbox().into_iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_project_views() {
        let mut store = EntityStore::new();
        let project = add_task(&mut store, TaskFields::project("Launch"));
        let child = add_task(&mut store, TaskFields::titled("Write post"));
        store
            .task_mut(&child)
            .unwrap()
            .move_to_project(Some(&project))
            .unwrap();
        add_task(&mut store, TaskFields::titled("Unrelated"));

        assert_eq!(store.projects().len(), 1);
        let children: Vec<&EntityId> = store
            .by_project(&project)
            .into_iter()
            .map(|t| t.id())
            .collect();
        assert_eq!(children, vec![&child]);
        assert!(store.inbox().iter().all(|t| t.id() != &project));
    }

    #[test]
    fn test_completed_excludes_trashed() {
        let mut store = EntityStore::new();
        let done = add_task(&mut store, TaskFields::titled("Done"));
        store.task_mut(&done).unwrap().complete().unwrap();
        let gone = add_task(&mut store, TaskFields::titled("Gone"));
        {
            let task = store.task_mut(&gone).unwrap();
            task.complete().unwrap();
            task.trash().unwrap();
        }

        let completed: Vec<&EntityId> = store.completed().into_iter().map(|t| t.id()).collect();
        assert_eq!(completed, vec![&done]);
        assert_eq!(store.trashed().len(), 1);
        assert_eq!(store.all_tasks().len(), 1);
        assert!(store.inbox().is_empty());
    }

    #[test]
    fn test_tagged_by_title() {
        let mut store = EntityStore::new();
        let work = Tag::new(TagFields::titled("Work"));
        let work_id = work.id().clone();
        store.insert(work).unwrap();
        store.insert(Tag::new(TagFields::titled("Personal"))).unwrap();

        let task = add_task(&mut store, TaskFields::titled("Report"));
        store.task_mut(&task).unwrap().add_tag(work_id);

        assert_eq!(store.tagged("work").len(), 1);
        assert!(store.tagged("Personal").is_empty());
        assert!(store.tagged("Missing").is_empty());
    }

    #[test]
    fn test_search_matches_title_and_notes() {
        let mut store = EntityStore::new();
        let id = add_task(&mut store, TaskFields::titled("Call plumber"));
        store.task_mut(&id).unwrap().set_notes("Ask about the LEAK");
        add_task(&mut store, TaskFields::titled("Other"));

        assert_eq!(store.search("PLUMBER").len(), 1);
        assert_eq!(store.search("leak").len(), 1);
        assert!(store.search("nothing").is_empty());
    }

    #[test]
    fn test_checklist_for_task() {
        let mut store = EntityStore::new();
        let task = add_task(&mut store, TaskFields::titled("Groceries"));
        store
            .insert(ChecklistItem::new(ChecklistItemFields {
                index: 2,
                ..ChecklistItemFields::new(&task, "Bread")
            }))
            .unwrap();
        store
            .insert(ChecklistItem::new(ChecklistItemFields {
                index: 1,
                ..ChecklistItemFields::new(&task, "Eggs")
            }))
            .unwrap();

        let titles: Vec<&str> = store
            .checklist_for(&task)
            .into_iter()
            .map(|item| item.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Eggs", "Bread"]);
    }

    #[test]
    fn test_pending_lists_unsynced_entities() {
        let mut store = EntityStore::new();
        let id = add_task(&mut store, TaskFields::titled("New"));
        assert_eq!(store.pending(), vec![id]);
    }

    #[test]
    fn test_pending_puts_referenced_creates_first() {
        let mut store = EntityStore::new();

        let synced_id = EntityId::parse("aaaSynced").unwrap();
        let mut synced = Task::from_remote(synced_id.clone(), TaskFields::titled("Old"));
        synced.set_title("Renamed");
        store.insert(synced).unwrap();

        let task_id = EntityId::parse("zzzTask").unwrap();
        store
            .insert(Task::with_id(task_id.clone(), TaskFields::titled("Pack")))
            .unwrap();
        let item_id = EntityId::parse("aaaItem").unwrap();
        store
            .insert(ChecklistItem::with_id(
                item_id.clone(),
                ChecklistItemFields::new(&task_id, "Passport"),
            ))
            .unwrap();
        let project_id = EntityId::parse("yyyProject").unwrap();
        store
            .insert(Task::with_id(project_id.clone(), TaskFields::project("Trip")))
            .unwrap();
        let area_id = EntityId::parse("xxxArea").unwrap();
        store
            .insert(Area::with_id(area_id.clone(), AreaFields::titled("Travel")))
            .unwrap();
        let child_tag_id = EntityId::parse("bbbChild").unwrap();
        let parent_tag_id = EntityId::parse("cccParent").unwrap();
        let mut child_tag = Tag::with_id(child_tag_id.clone(), TagFields::titled("Abroad"));
        child_tag.set_parent(Some(parent_tag_id.clone()));
        store.insert(child_tag).unwrap();
        store
            .insert(Tag::with_id(parent_tag_id.clone(), TagFields::titled("Away")))
            .unwrap();

        assert_eq!(
            store.pending(),
            vec![
                parent_tag_id,
                child_tag_id,
                area_id,
                project_id,
                task_id,
                item_id,
                synced_id,
            ]
        );
    }

    #[test]
    fn test_by_area_skips_trashed_and_headings() {
        let mut store = EntityStore::new();
        let area = Area::new(AreaFields::titled("Home"));
        let area_id = area.id().clone();
        store.insert(area).unwrap();

        let kept = add_task(&mut store, TaskFields::titled("Fix sink"));
        store.task_mut(&kept).unwrap().move_to_area(Some(&area_id));
        let project = add_task(&mut store, TaskFields::project("Renovate"));
        store.task_mut(&project).unwrap().move_to_area(Some(&area_id));
        let trashed = add_task(&mut store, TaskFields::titled("Old chore"));
        {
            let task = store.task_mut(&trashed).unwrap();
            task.move_to_area(Some(&area_id));
            task.trash().unwrap();
        }
        add_task(&mut store, TaskFields::titled("Elsewhere"));

        let mut ids: Vec<&EntityId> = store
            .by_area(&area_id)
            .into_iter()
            .map(|t| t.id())
            .collect();
        ids.sort();
        let mut expected = vec![&kept, &project];
        expected.sort();
        assert_eq!(ids, expected);

        assert_eq!(store.find_area("home").unwrap().id(), &area_id);
        assert!(store.find_area("Office").is_none());
    }

    #[test]
    fn test_completed_since_includes_boundary() {
        let at = |secs: i64| DateTime::from_timestamp(secs, 0).unwrap();
        let mut store = EntityStore::new();
        let before = add_task(
            &mut store,
            TaskFields {
                status: Status::Complete,
                completion_date: Some(at(1_733_745_599)),
                ..TaskFields::titled("Before")
            },
        );
        let boundary = add_task(
            &mut store,
            TaskFields {
                status: Status::Complete,
                completion_date: Some(at(1_733_745_600)),
                ..TaskFields::titled("Boundary")
            },
        );
        add_task(
            &mut store,
            TaskFields {
                status: Status::Cancelled,
                completion_date: Some(at(1_733_800_000)),
                ..TaskFields::titled("Cancelled")
            },
        );

        let since: Vec<&EntityId> = store
            .completed_since(at(1_733_745_600))
            .into_iter()
            .map(|t| t.id())
            .collect();
        assert_eq!(since, vec![&boundary]);
        assert_eq!(store.completed_since(at(0)).len(), 2);
        assert!(store.completed().iter().any(|t| t.id() == &before));
    }
}
