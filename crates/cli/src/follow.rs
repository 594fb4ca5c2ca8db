use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use fleetwatch_core::{
    journal::{is_journal_file, latest_journal},
    ingest_line, FleetStore, Ingested, JournalReader, JsonFleetFile,
};

/// Follows the newest journal in a directory and feeds its lines to the store.
pub struct JournalFollower {
    dir: PathBuf,
    store: FleetStore,
    repository: Arc<JsonFleetFile>,
}

impl JournalFollower {
    pub fn new(dir: &Path, store: FleetStore, repository: Arc<JsonFleetFile>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            store,
            repository,
        }
    }

    /// Replay the newest journal, then apply lines as the game appends them.
    pub async fn run(self) -> Result<()> {
        let mut reader = match latest_journal(&self.dir)? {
            Some(path) => {
                let mut reader = JournalReader::new(path);
                self.ingest(&mut reader, true).await;
                Some(reader)
            }
            None => None,
        };

        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(move |result| {
            if notify_tx.send(result).is_err() {
                debug!("Journal watcher receiver dropped");
            }
        })
        .context("failed to create journal watcher")?;
        watcher
            .watch(&self.dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", self.dir.display()))?;
        info!(dir = %self.dir.display(), "Following journal directory");

        while let Some(notification) = notify_rx.recv().await {
            let event = match notification {
                Ok(event) => event,
                Err(err) => {
                    warn!(%err, "Journal watcher error");
                    continue;
                }
            };
            if !touches_journal(&event) {
                continue;
            }
            if let Some(latest) = latest_journal(&self.dir)? {
                if reader.as_ref().map(|r| r.path()) != Some(latest.as_path()) {
                    info!(path = %latest.display(), "Switching to new journal");
                    reader = Some(JournalReader::new(latest));
                }
            }
            if let Some(reader) = reader.as_mut() {
                self.ingest(reader, false).await;
            }
        }
        Ok(())
    }

    /// Apply every new line, persisting once if live play changed anything.
    async fn ingest(&self, reader: &mut JournalReader, replay: bool) {
        let lines = match reader.read_lines().await {
            Ok(lines) => lines,
            Err(err) => {
                warn!(?err, "Failed to read journal");
                return;
            }
        };
        let mut changed = false;
        for line in &lines {
            if let Ingested::Applied(applied) = ingest_line(&self.store, line, replay) {
                changed |= applied.is_change();
            }
        }
        if replay {
            info!(path = %reader.path().display(), lines = lines.len(), "Replayed journal");
        }
        if changed && !replay {
            if let Err(err) = self.store.persist_with(self.repository.as_ref()) {
                warn!(?err, "Failed to persist fleet");
            }
        }
    }
}

fn touches_journal(event: &Event) -> bool {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return false;
    }
    event.paths.iter().any(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_journal_file)
    })
}
