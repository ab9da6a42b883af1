pub mod config;
pub mod event;
pub mod fetcher;
pub mod filings;
pub mod index;
pub mod storage;
pub mod task;
pub mod transport;

pub use config::{ConfigError, FetchConfig, DEFAULT_INTER_REQUEST_DELAY, USER_AGENT};
pub use event::{EventSink, FailureReason, FetchEvent, FetchOutcome, NullSink, SkipReason};
pub use fetcher::{BulkFetcher, FetchError, FetchSummary};
pub use filings::{FilingRecord, FilingsError, read_filings_list, write_filings_list};
pub use index::{
    DEFAULT_BASE_URL, IndexError, MasterIndexTask, Quarter, collect_filings, master_index_tasks,
    parse_master_index,
};
pub use task::{FetchTarget, FetchTask, TaskError};
pub use transport::{Transport, TransportError, TransportResponse};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
