use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::config::{ConfigError, FetchConfig};
use crate::event::{EventSink, FailureReason, FetchEvent, FetchOutcome, SkipReason};
use crate::storage;
use crate::task::FetchTarget;
use crate::transport::Transport;

/// Counts of task outcomes for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl FetchSummary {
    pub fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Downloaded { .. } => self.downloaded += 1,
            FetchOutcome::Skipped(_) => self.skipped += 1,
            FetchOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.downloaded + self.skipped + self.failed
    }
}

/// Conditions that stop a run. Per-task failures never end up here.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid fetch configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("storage root {} is not writable: {source}", path.display())]
    StorageRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Sequential, paced, resumable bulk downloader.
///
/// Each task is resolved completely (skipped, downloaded, or failed) before
/// the next one starts. A non-empty file at a task's storage path counts as
/// done, so re-running the same batch only does the remaining work.
pub struct BulkFetcher<T: Transport> {
    transport: T,
    config: FetchConfig,
}

impl<T: Transport> BulkFetcher<T> {
    pub fn new(transport: T, config: FetchConfig) -> Result<Self, FetchError> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Attempt every task once, in order.
    ///
    /// Returns an error only when the storage root can't be created, or stops
    /// being writable partway through.
    pub async fn run<K>(&self, tasks: &[K], sink: &dyn EventSink) -> Result<FetchSummary, FetchError>
    where
        K: FetchTarget + Sync,
    {
        let root = &self.config.storage_root;
        storage::ensure_dir(root).map_err(|source| FetchError::StorageRoot {
            path: root.clone(),
            source,
        })?;

        info!(
            total = tasks.len(),
            root = %root.display(),
            overwrite = self.config.overwrite,
            "starting bulk fetch"
        );
        sink.emit(&FetchEvent::Started { total: tasks.len() });

        let mut summary = FetchSummary::default();

        for (index, task) in tasks.iter().enumerate() {
            let path = task.storage_path(root);
            let (outcome, requested) = self.resolve(task, &path).await;
            summary.record(&outcome);

            let storage_failed = matches!(outcome, FetchOutcome::Failed(FailureReason::Storage(_)));
            sink.emit(&outcome_event(index, task, path, outcome));

            if storage_failed && let Err(source) = storage::probe_writable(root) {
                return Err(FetchError::StorageRoot {
                    path: root.clone(),
                    source,
                });
            }

            let more_tasks = index + 1 < tasks.len();
            if requested && more_tasks && !self.config.inter_request_delay.is_zero() {
                tokio::time::sleep(self.config.inter_request_delay).await;
            }
        }

        info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "bulk fetch complete"
        );
        sink.emit(&FetchEvent::Finished { summary });

        Ok(summary)
    }

    /// Resolve one task. The flag reports whether a request went out.
    async fn resolve<K: FetchTarget>(&self, task: &K, path: &Path) -> (FetchOutcome, bool) {
        if let Some(dir) = path.parent()
            && let Err(e) = storage::ensure_dir(dir)
        {
            let reason = format!("failed to create {}: {e}", dir.display());
            return (FetchOutcome::Failed(FailureReason::Storage(reason)), false);
        }

        if !self.config.overwrite && storage::is_complete(path) {
            trace!(path = %path.display(), "already on disk");
            return (FetchOutcome::Skipped(SkipReason::AlreadyExists), false);
        }

        let locator = task.source_locator();
        debug!(%locator, "requesting");

        let response = match self.transport.get(locator, &self.config.request_headers).await {
            Ok(response) => response,
            Err(e) => {
                return (FetchOutcome::Failed(FailureReason::Transport(e.to_string())), true);
            }
        };

        if !response.is_success() {
            return (FetchOutcome::Failed(FailureReason::Status(response.status)), true);
        }

        match storage::write_atomic(path, &response.body) {
            Ok(()) => {
                let bytes = response.body.len() as u64;
                debug!(path = %path.display(), bytes, "stored");
                (FetchOutcome::Downloaded { bytes }, true)
            }
            Err(e) => {
                let reason = format!("failed to write {}: {e}", path.display());
                (FetchOutcome::Failed(FailureReason::Storage(reason)), true)
            }
        }
    }
}

fn outcome_event<K: FetchTarget>(
    index: usize,
    task: &K,
    path: PathBuf,
    outcome: FetchOutcome,
) -> FetchEvent {
    match outcome {
        FetchOutcome::Downloaded { bytes } => FetchEvent::Downloaded { index, path, bytes },
        FetchOutcome::Skipped(reason) => FetchEvent::Skipped {
            index,
            path,
            reason,
        },
        FetchOutcome::Failed(reason) => FetchEvent::Failed {
            index,
            locator: task.source_locator().to_owned(),
            path,
            reason,
        },
    }
}
