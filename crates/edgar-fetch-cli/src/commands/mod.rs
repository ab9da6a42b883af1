pub mod download;
pub mod index;
pub mod list;

use std::path::Path;

use anyhow::{Context, Result};
use edgar_fetch::{BulkFetcher, FetchSummary, FetchTarget, Transport};

use crate::config::AppConfig;
use crate::render::ProgressRenderer;

/// Run one batch into `root` with a progress bar labelled `label`.
pub async fn fetch_into<T, K>(
    config: &AppConfig,
    transport: T,
    root: &Path,
    tasks: &[K],
    overwrite: bool,
    label: &str,
) -> Result<FetchSummary>
where
    T: Transport,
    K: FetchTarget + Sync,
{
    let fetch_config = config.fetch_config(root, overwrite)?;
    let fetcher = BulkFetcher::new(transport, fetch_config)?;
    let renderer = ProgressRenderer::new(label, config.fetch.skip_log_interval);

    fetcher
        .run(tasks, &renderer)
        .await
        .with_context(|| format!("{label} run aborted"))
}
