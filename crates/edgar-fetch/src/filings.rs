use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::task::{FetchTask, TaskError};

/// One row of the filings list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    #[serde(rename = "CIK")]
    pub cik: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Form")]
    pub form: String,
    #[serde(rename = "Date")]
    pub date_filed: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl FilingRecord {
    /// Stored as `<cik>/<year>/<form>_<date>.txt`.
    pub fn to_task(&self) -> Result<FetchTask, TaskError> {
        FetchTask::new(&self.cik, &self.date_filed, &self.form, &self.url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FilingsError {
    #[error("failed to open filings list {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("malformed filings list row: {0}")]
    Row(#[source] csv::Error),

    #[error("failed to write filings list: {0}")]
    Write(#[source] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write records as CSV with a `CIK,Company,Form,Date,URL` header.
pub fn write_filings_list(path: &Path, records: &[FilingRecord]) -> Result<(), FilingsError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(FilingsError::Write)?;
    for record in records {
        writer.serialize(record).map_err(FilingsError::Write)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every record from a filings list. Any bad row fails the whole read.
pub fn read_filings_list(path: &Path) -> Result<Vec<FilingRecord>, FilingsError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| FilingsError::Open {
        path: path.display().to_string(),
        source,
    })?;

    reader
        .deserialize::<FilingRecord>()
        .map(|row| row.map_err(FilingsError::Row))
        .collect()
}
