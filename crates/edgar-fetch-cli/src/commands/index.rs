use anyhow::Result;
use edgar_fetch::{FetchSummary, Transport, master_index_tasks};
use tracing::info;

use super::fetch_into;
use crate::config::AppConfig;

/// Download every quarterly master index in the configured year range.
pub async fn run<T: Transport>(config: &AppConfig, transport: T) -> Result<FetchSummary> {
    let tasks = master_index_tasks(
        &config.edgar.base_url,
        config.edgar.start_year,
        config.edgar.end_year,
        config.through_quarter()?,
    )?;

    info!(
        files = tasks.len(),
        root = %config.storage.index_dir.display(),
        "fetching master indexes"
    );

    fetch_into(config, transport, &config.storage.index_dir, &tasks, false, "index").await
}
