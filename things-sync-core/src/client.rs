//! Session facade tying the store, the codec and a transport together.
//!
//! A session owns one cursor. Reads see only what the last refresh pulled in;
//! nothing refreshes automatically.

use chrono::{DateTime, Local, NaiveDate, SubsecRound, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codec;
use crate::entity::{Entity, EntityKind};
use crate::entity_id::EntityId;
use crate::error::{ModelError, SyncError};
use crate::history::{self, HistoryItem};
use crate::models::{
    wire, Area, AreaFields, ChecklistItem, ChecklistItemFields, Destination, Tag, TagFields, Task,
    TaskFields,
};
use crate::snapshot::Snapshot;
use crate::store::{EntityRef, EntityStore, Stored};
use crate::transport::{CommitRequest, HistoryTransport};

/// Outcome of a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Operations folded into the store.
    pub applied: usize,
    /// Cursor after the refresh.
    pub cursor: u64,
}

/// One client session against an account's history log.
#[derive(Debug)]
pub struct ThingsClient<T> {
    transport: T,
    store: EntityStore,
    cursor: u64,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl<T: HistoryTransport> ThingsClient<T> {
    /// Starts a session at the server's current head with an empty store.
    pub async fn connect(mut transport: T) -> Result<Self, SyncError> {
        let cursor = transport.head_index().await?;
        info!(cursor, "connected");
        Ok(Self::with_cursor(transport, cursor, EntityStore::new()))
    }

    /// Resumes a session from a known cursor and mirror.
    pub fn with_cursor(transport: T, cursor: u64, store: EntityStore) -> Self {
        Self {
            transport,
            store,
            cursor,
        }
    }

    pub fn from_snapshot(transport: T, snapshot: Snapshot) -> Self {
        Self::with_cursor(transport, snapshot.cursor, snapshot.store)
    }

    /// Ends the session, handing back the transport.
    pub fn close(self) -> T {
        debug!(cursor = self.cursor, "session closed");
        self.transport
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.cursor, self.store.clone())
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Pulls in every operation after the cursor.
    pub async fn update(&mut self) -> Result<RefreshSummary, SyncError> {
        self.refresh().await
    }

    /// Fetches and applies pages until the cursor reaches the end of the log.
    ///
    /// If an operation fails to apply, the cursor stops right before it and
    /// the error is returned; everything before it stays applied.
    pub async fn refresh(&mut self) -> Result<RefreshSummary, SyncError> {
        let mut applied = 0;
        loop {
            let since = self.cursor;
            let batch = self.transport.fetch_history(since).await?;
            let fetched = batch.operations.len();
            debug!(since, fetched, end_of_log = batch.end_of_log, "fetched history");

            match history::apply_all(&mut self.store, since, &batch.operations) {
                Ok(count) => applied += count,
                Err(err) => {
                    if let SyncError::Apply { offset, .. } = &err {
                        self.cursor = *offset;
                    }
                    warn!(cursor = self.cursor, error = %err, "refresh stopped");
                    return Err(err);
                }
            }

            self.cursor = self.cursor.max(batch.next_offset);
            if fetched == 0 || self.cursor >= batch.end_of_log {
                break;
            }
        }
        info!(applied, cursor = self.cursor, "refreshed");
        Ok(RefreshSummary {
            applied,
            cursor: self.cursor,
        })
    }

    /// Adds a new local entity. It reaches the server on its first commit.
    pub fn insert<S: Stored>(&mut self, entity: Entity<S>) -> Result<EntityId, SyncError> {
        let id = entity.id().clone();
        self.store
            .insert(entity)
            .map_err(|err| SyncError::AlreadyExists(err.entity_id().clone()))?;
        Ok(id)
    }

    /// Sends the entity's pending changes and returns the new head index.
    ///
    /// Nothing local changes unless the server acknowledges the commit.
    pub async fn commit(&mut self, id: &EntityId) -> Result<u64, SyncError> {
        let kind = self
            .store
            .kind_of(id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;
        match kind {
            EntityKind::Task => self.commit_as::<TaskFields>(id).await,
            EntityKind::ChecklistItem => self.commit_as::<ChecklistItemFields>(id).await,
            EntityKind::Tag => self.commit_as::<TagFields>(id).await,
            EntityKind::Area => self.commit_as::<AreaFields>(id).await,
        }
    }

    async fn commit_as<S: Stored>(&mut self, id: &EntityId) -> Result<u64, SyncError> {
        let entity = self
            .store
            .entity::<S>(id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;
        let created = !entity.is_synced();
        let mut payload = if created {
            codec::encode_create(entity)?
        } else {
            codec::encode_edit(entity)?
        };
        if let Some(key) = S::MODIFIED_KEY {
            let now = Utc::now().trunc_subsecs(6);
            payload.insert(key.to_string(), Value::from(wire::timestamp_float::to_secs(now)));
        }

        let item = if created {
            HistoryItem::create(id.clone(), S::KIND, payload.clone())
        } else {
            HistoryItem::edit(id.clone(), S::KIND, payload.clone())
        };
        let request = CommitRequest::new(self.cursor, item);
        debug!(%id, ancestor = self.cursor, created, "sending commit");

        let ack = match self.transport.send_commit(&request).await {
            Ok(ack) => ack,
            Err(err) => {
                warn!(%id, ancestor = self.cursor, error = %err, "commit failed");
                return Err(err.into());
            }
        };

        let entity = self
            .store
            .entity_mut::<S>(id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;
        if created {
            codec::acknowledge_create(entity, &payload)?;
        } else {
            codec::apply_edit(entity, &payload)?;
        }
        self.cursor = self.cursor.max(ack.server_head_index);
        info!(%id, cursor = self.cursor, "committed");
        Ok(ack.server_head_index)
    }

    /// Commits every entity with unacknowledged changes, stopping at the
    /// first failure.
    pub async fn commit_pending(&mut self) -> Result<usize, SyncError> {
        let pending = self.store.pending();
        for id in &pending {
            self.commit(id).await?;
        }
        Ok(pending.len())
    }

    /// Puts a task into a project, or takes it out with `None`.
    pub fn move_task_to_project(
        &mut self,
        task: &EntityId,
        project: Option<&EntityId>,
    ) -> Result<(), SyncError> {
        if let Some(project) = project {
            match self.store.task(project) {
                Some(target) if target.is_project() => {}
                Some(_) => return Err(ModelError::NotAProject(project.clone()).into()),
                None if self.store.contains(project) => {
                    return Err(ModelError::NotAProject(project.clone()).into())
                }
                None => return Err(SyncError::NotFound(project.clone())),
            }
        }
        let task = self
            .store
            .task_mut(task)
            .ok_or_else(|| SyncError::NotFound(task.clone()))?;
        task.move_to_project(project)?;
        Ok(())
    }

    /// Puts a task into an area, or takes it out with `None`.
    pub fn move_task_to_area(
        &mut self,
        task: &EntityId,
        area: Option<&EntityId>,
    ) -> Result<(), SyncError> {
        if let Some(area) = area {
            if self.store.area(area).is_none() {
                return Err(if self.store.contains(area) {
                    ModelError::NotAnArea(area.clone()).into()
                } else {
                    SyncError::NotFound(area.clone())
                });
            }
        }
        let task = self
            .store
            .task_mut(task)
            .ok_or_else(|| SyncError::NotFound(task.clone()))?;
        task.move_to_area(area);
        Ok(())
    }

    pub fn get(&self, id: &EntityId) -> Option<EntityRef<'_>> {
        self.store.get(id)
    }

    pub fn task(&self, id: &EntityId) -> Option<&Task> {
        self.store.task(id)
    }

    pub fn task_mut(&mut self, id: &EntityId) -> Option<&mut Task> {
        self.store.task_mut(id)
    }

    pub fn by_destination(&self, destination: Destination) -> Vec<&Task> {
        self.store.by_destination(destination)
    }

    pub fn inbox(&self) -> Vec<&Task> {
        self.store.inbox()
    }

    pub fn today(&self) -> Vec<&Task> {
        self.store.today(local_today())
    }

    pub fn anytime(&self) -> Vec<&Task> {
        self.store.anytime(local_today())
    }

    pub fn someday(&self) -> Vec<&Task> {
        self.store.someday()
    }

    pub fn upcoming(&self) -> Vec<&Task> {
        self.store.upcoming(local_today())
    }

    pub fn projects(&self) -> Vec<&Task> {
        self.store.projects()
    }

    pub fn by_project(&self, project: &EntityId) -> Vec<&Task> {
        self.store.by_project(project)
    }

    pub fn by_area(&self, area: &EntityId) -> Vec<&Task> {
        self.store.by_area(area)
    }

    pub fn by_tag(&self, title: &str) -> Vec<&Task> {
        self.store.tagged(title)
    }

    pub fn completed(&self) -> Vec<&Task> {
        self.store.completed()
    }

    pub fn completed_since(&self, since: DateTime<Utc>) -> Vec<&Task> {
        self.store.completed_since(since)
    }

    pub fn trashed(&self) -> Vec<&Task> {
        self.store.trashed()
    }

    pub fn all_tasks(&self) -> Vec<&Task> {
        self.store.all_tasks()
    }

    pub fn search(&self, query: &str) -> Vec<&Task> {
        self.store.search(query)
    }

    pub fn tags(&self) -> Vec<&Tag> {
        self.store.tags()
    }

    pub fn areas(&self) -> Vec<&Area> {
        self.store.areas()
    }

    pub fn checklist_for(&self, task: &EntityId) -> Vec<&ChecklistItem> {
        self.store.checklist_for(task)
    }
}
