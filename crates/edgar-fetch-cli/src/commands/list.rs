use anyhow::{Context, Result};
use edgar_fetch::{collect_filings, write_filings_list};
use tracing::info;

use crate::config::AppConfig;

/// Parse downloaded master indexes and write the filings list. Returns the
/// number of filings written.
pub fn run(config: &AppConfig) -> Result<usize> {
    let records = collect_filings(
        &config.storage.index_dir,
        config.edgar.start_year,
        config.edgar.end_year,
        &config.edgar.base_url,
        &config.edgar.forms,
    )?;

    let path = &config.storage.filings_list;
    write_filings_list(path, &records)
        .with_context(|| format!("failed to write filings list to {}", path.display()))?;

    info!(filings = records.len(), path = %path.display(), "wrote filings list");

    Ok(records.len())
}
