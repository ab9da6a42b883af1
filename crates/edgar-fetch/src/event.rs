use std::fmt;
use std::path::PathBuf;

use crate::fetcher::FetchSummary;

/// Why a task needed no work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The target file exists and is non-empty.
    AlreadyExists,
}

/// Why a task failed. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The remote answered with a non-2xx status.
    Status(u16),
    /// Nothing usable came back from the network.
    Transport(String),
    /// The target directory or file couldn't be written.
    Storage(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "status {code}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

/// Result of resolving one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { bytes: u64 },
    Skipped(SkipReason),
    Failed(FailureReason),
}

/// Structured progress from a bulk fetch run.
///
/// The fetcher never writes to the console itself; callers decide how to
/// present these (progress bar, log lines, or nothing).
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// Emitted once before the first task.
    Started { total: usize },
    Skipped {
        index: usize,
        path: PathBuf,
        reason: SkipReason,
    },
    Downloaded {
        index: usize,
        path: PathBuf,
        bytes: u64,
    },
    Failed {
        index: usize,
        locator: String,
        path: PathBuf,
        reason: FailureReason,
    },
    /// Emitted once after the last task.
    Finished { summary: FetchSummary },
}

impl FetchEvent {
    /// True for the per-task events (not `Started`/`Finished`).
    pub fn is_task_outcome(&self) -> bool {
        matches!(
            self,
            Self::Skipped { .. } | Self::Downloaded { .. } | Self::Failed { .. }
        )
    }
}

/// Consumer of fetch events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &FetchEvent);
}

impl<F> EventSink for F
where
    F: Fn(&FetchEvent) + Send + Sync,
{
    fn emit(&self, event: &FetchEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &FetchEvent) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn failure_reason_display() {
        assert_eq!(FailureReason::Status(503).to_string(), "status 503");
        assert_eq!(
            FailureReason::Transport("reset".into()).to_string(),
            "transport error: reset"
        );
        assert_eq!(
            FailureReason::Storage("read-only".into()).to_string(),
            "storage error: read-only"
        );
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |event: &FetchEvent| seen.lock().unwrap().push(event.clone());

        sink.emit(&FetchEvent::Started { total: 3 });

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, vec![FetchEvent::Started { total: 3 }]);
        assert!(!seen[0].is_task_outcome());
    }
}
