//! Sync CLI command: pull the history log and push pending local edits.

use clap::{Args, Subcommand};
use things_sync_core::{HistoryTransport, SnapshotError, SnapshotStorage};
use tracing::warn;

use crate::config::Config;
use crate::sync::Session;

/// Sync with Things Cloud
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,

    /// Discard the local snapshot, unsynced edits included, and replay
    /// the whole history
    #[arg(long)]
    reset: bool,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show the cursor and pending local changes without committing
    Status,
}

impl SyncCommand {
    /// Runs before the session opens, so a reset replays from cursor 0.
    pub fn prepare(&self, config: &Config) -> Result<(), SnapshotError> {
        if self.reset {
            let storage = SnapshotStorage::new(config.data_dir.value.clone());
            warn!(path = %storage.path().display(), "discarding local snapshot");
            storage.clear()?;
        }
        Ok(())
    }

    pub async fn run<T: HistoryTransport>(
        &self,
        session: Session<T>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => Self::sync(session).await,
            Some(SyncSubcommand::Status) => {
                Self::status(&session);
                Ok(())
            }
        }
    }

    async fn sync<T: HistoryTransport>(
        session: Session<T>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let refreshed = session.refreshed();
        println!(
            "  ✓ pulled {} change{}",
            refreshed.applied,
            if refreshed.applied == 1 { "" } else { "s" }
        );

        let committed = session.finish().await?;
        println!(
            "  ✓ pushed {} change{}",
            committed,
            if committed == 1 { "" } else { "s" }
        );

        println!();
        if refreshed.applied == 0 && committed == 0 {
            println!("Already up to date.");
        } else {
            println!("Sync complete.");
        }
        Ok(())
    }

    fn status<T: HistoryTransport>(session: &Session<T>) {
        let client = session.client();
        let pending = client.store().pending();

        println!("Sync Status");
        println!("===========");
        println!();
        println!("Cursor:   {}", client.cursor());
        println!("Entities: {}", client.store().len());
        println!("Pending:  {}", pending.len());
        for id in &pending {
            if let Some(entity) = client.get(id) {
                println!("  {}", entity);
            }
        }
    }
}
