use things_sync_core::{
    HistoryTransport, RefreshSummary, Snapshot, SnapshotError, SnapshotStorage, SyncError,
    ThingsClient, TransportError,
};
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::sync::HttpTransport;

/// A client session backed by the on-disk snapshot.
///
/// Opening loads the snapshot (or starts from an empty mirror at cursor 0)
/// and refreshes. Finishing commits whatever is pending and saves the
/// snapshot, even when a commit fails, so local edits are never lost.
pub struct Session<T = HttpTransport> {
    client: ThingsClient<T>,
    storage: SnapshotStorage,
    refreshed: RefreshSummary,
}

impl Session<HttpTransport> {
    pub async fn open(config: &Config) -> Result<Self, SessionError> {
        let history_key = config.require_history_key()?;
        let transport = HttpTransport::new(&config.api_base.value, history_key, config.timeout())?;
        debug!(url = transport.history_url(), "opening session");
        let storage = SnapshotStorage::new(config.data_dir.value.clone());
        Self::open_with(transport, storage).await
    }
}

impl<T: HistoryTransport> Session<T> {
    pub async fn open_with(transport: T, storage: SnapshotStorage) -> Result<Self, SessionError> {
        let snapshot = match storage.load()? {
            Some(snapshot) => snapshot,
            None => {
                info!(path = %storage.path().display(), "no snapshot, replaying full history");
                Snapshot::default()
            }
        };
        let mut client = ThingsClient::from_snapshot(transport, snapshot);

        let refreshed = match client.refresh().await {
            Ok(summary) => summary,
            Err(err) => {
                // Keep whatever was applied before the failure.
                storage.save(&client.snapshot())?;
                return Err(err.into());
            }
        };
        storage.save(&client.snapshot())?;

        Ok(Self {
            client,
            storage,
            refreshed,
        })
    }

    pub fn client(&self) -> &ThingsClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ThingsClient<T> {
        &mut self.client
    }

    /// Result of the refresh done on open.
    pub fn refreshed(&self) -> RefreshSummary {
        self.refreshed
    }

    /// Commits pending entities and saves the snapshot. Returns how many
    /// entities were committed.
    pub async fn finish(mut self) -> Result<usize, SessionError> {
        let committed = self.client.commit_pending().await;
        self.storage.save(&self.client.snapshot())?;
        match committed {
            Ok(count) => {
                info!(count, cursor = self.client.cursor(), "session finished");
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "pending changes kept for the next run");
                Err(err.into())
            }
        }
    }
}

/// Errors from opening or finishing a session.
#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    Transport(TransportError),
    Snapshot(SnapshotError),
    Sync(SyncError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Config(e) => write!(f, "{}", e),
            SessionError::Transport(e) => write!(f, "{}", e),
            SessionError::Snapshot(e) => write!(f, "{}", e),
            SessionError::Sync(e) if e.needs_refresh() => {
                write!(f, "{} (run `things sync` and try again)", e)
            }
            SessionError::Sync(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Config(e) => Some(e),
            SessionError::Transport(e) => Some(e),
            SessionError::Snapshot(e) => Some(e),
            SessionError::Sync(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        SessionError::Config(e)
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        SessionError::Transport(e)
    }
}

impl From<SnapshotError> for SessionError {
    fn from(e: SnapshotError) -> Self {
        SessionError::Snapshot(e)
    }
}

impl From<SyncError> for SessionError {
    fn from(e: SyncError) -> Self {
        SessionError::Sync(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use things_sync_core::{
        CommitAck, CommitRequest, EntityId, EntityKind, HistoryBatch, HistoryItem, Task,
        TaskFields,
    };

    #[derive(Default)]
    struct MemoryLog {
        items: Vec<HistoryItem>,
        reject_commits: bool,
    }

    impl HistoryTransport for MemoryLog {
        async fn head_index(&mut self) -> Result<u64, TransportError> {
            Ok(self.items.len() as u64)
        }

        async fn fetch_history(&mut self, since: u64) -> Result<HistoryBatch, TransportError> {
            let start = (since as usize).min(self.items.len());
            Ok(HistoryBatch {
                operations: self.items[start..].to_vec(),
                next_offset: self.items.len() as u64,
                end_of_log: self.items.len() as u64,
            })
        }

        async fn send_commit(
            &mut self,
            request: &CommitRequest,
        ) -> Result<CommitAck, TransportError> {
            if self.reject_commits {
                return Err(TransportError::Rejected("stale ancestor".to_string()));
            }
            self.items.extend(request.items.iter().cloned());
            Ok(CommitAck {
                server_head_index: self.items.len() as u64,
            })
        }
    }

    fn remote_task(id: &str, title: &str) -> HistoryItem {
        HistoryItem::create(
            EntityId::parse(id).unwrap(),
            EntityKind::Task,
            json!({ "tt": title }).as_object().cloned().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_open_without_snapshot_replays_and_saves() {
        let temp = TempDir::new().unwrap();
        let storage = SnapshotStorage::new(temp.path().to_path_buf());
        let log = MemoryLog {
            items: vec![remote_task("a", "One"), remote_task("b", "Two")],
            ..MemoryLog::default()
        };

        let session = Session::open_with(log, storage.clone()).await.unwrap();
        assert_eq!(session.refreshed().applied, 2);
        assert_eq!(session.client().cursor(), 2);

        let saved = storage.load().unwrap().unwrap();
        assert_eq!(saved.cursor, 2);
        assert_eq!(saved.store.all_tasks().len(), 2);
    }

    #[tokio::test]
    async fn test_finish_commits_and_persists_cursor() {
        let temp = TempDir::new().unwrap();
        let storage = SnapshotStorage::new(temp.path().to_path_buf());

        let mut session = Session::open_with(MemoryLog::default(), storage.clone())
            .await
            .unwrap();
        session
            .client_mut()
            .insert(Task::new(TaskFields::titled("Write report")))
            .unwrap();
        assert_eq!(session.finish().await.unwrap(), 1);

        let saved = storage.load().unwrap().unwrap();
        assert_eq!(saved.cursor, 1);
        assert!(saved.store.pending().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_commit_keeps_local_edit_on_disk() {
        let temp = TempDir::new().unwrap();
        let storage = SnapshotStorage::new(temp.path().to_path_buf());
        let log = MemoryLog {
            reject_commits: true,
            ..MemoryLog::default()
        };

        let mut session = Session::open_with(log, storage.clone()).await.unwrap();
        let id = session
            .client_mut()
            .insert(Task::new(TaskFields::titled("Offline")))
            .unwrap();
        let err = session.finish().await.unwrap_err();
        assert!(matches!(err, SessionError::Sync(ref e) if e.needs_refresh()));
        assert!(err.to_string().contains("things sync"));

        let saved = storage.load().unwrap().unwrap();
        assert_eq!(saved.store.pending(), vec![id]);
    }
}
