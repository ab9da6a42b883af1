use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Header the remote service uses to identify callers.
pub const USER_AGENT: &str = "User-Agent";

/// SEC asks for at most ten requests per second.
pub const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("request headers must include a non-empty {USER_AGENT} identifying the client")]
    MissingUserAgent,

    #[error("request header {name:?} has an invalid name or value")]
    InvalidHeader { name: String },
}

/// Settings for a bulk fetch run. Fixed for the lifetime of a fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub storage_root: PathBuf,
    pub request_headers: BTreeMap<String, String>,
    pub inter_request_delay: Duration,
    pub overwrite: bool,
}

impl FetchConfig {
    /// Config with the default delay, no overwrite, and `User-Agent` set.
    pub fn new(storage_root: impl Into<PathBuf>, user_agent: impl Into<String>) -> Self {
        let mut request_headers = BTreeMap::new();
        request_headers.insert(USER_AGENT.to_owned(), user_agent.into());

        Self {
            storage_root: storage_root.into(),
            request_headers,
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
            overwrite: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    /// The configured user agent, matched case-insensitively.
    pub fn user_agent(&self) -> Option<&str> {
        self.request_headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(USER_AGENT))
            .map(|(_, value)| value.as_str())
    }

    /// Rejects a missing User-Agent, or any header that can't be sent as-is.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in &self.request_headers {
            let name_ok = !name.is_empty()
                && name.bytes().all(|b| b.is_ascii_graphic() && b != b':');
            if !name_ok || !value.bytes().all(is_header_value_byte) {
                return Err(ConfigError::InvalidHeader { name: name.clone() });
            }
        }

        match self.user_agent() {
            Some(ua) if !ua.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingUserAgent),
        }
    }
}

fn is_header_value_byte(b: u8) -> bool {
    b == b'\t' || (b >= 0x20 && b != 0x7f)
}
