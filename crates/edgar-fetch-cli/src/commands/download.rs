use anyhow::{Context, Result};
use edgar_fetch::{FetchSummary, FetchTask, FilingRecord, Transport, read_filings_list};
use tracing::{info, warn};

use super::fetch_into;
use crate::config::AppConfig;

/// Download every filing on the filings list that isn't already stored.
/// `[fetch] overwrite` in the config has the same effect as `--overwrite`.
pub async fn run<T: Transport>(
    config: &AppConfig,
    transport: T,
    overwrite: bool,
) -> Result<FetchSummary> {
    let path = &config.storage.filings_list;
    let records = read_filings_list(path).with_context(|| {
        format!(
            "failed to read filings list at {} (run `edgar-fetch list` first)",
            path.display()
        )
    })?;

    let tasks = to_tasks(&records);
    info!(
        filings = tasks.len(),
        root = %config.storage.filings_dir.display(),
        "downloading filings"
    );

    fetch_into(
        config,
        transport,
        &config.storage.filings_dir,
        &tasks,
        overwrite || config.fetch.overwrite,
        "filings",
    )
    .await
}

/// Rows that can't name a storage path are dropped with a warning.
fn to_tasks(records: &[FilingRecord]) -> Vec<FetchTask> {
    records
        .iter()
        .filter_map(|record| match record.to_task() {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(cik = %record.cik, date = %record.date_filed, error = %e, "skipping unusable row");
                None
            }
        })
        .collect()
}
