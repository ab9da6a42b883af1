use std::fmt;
use std::path::{Path, PathBuf};

/// Extension used for stored filings unless a task overrides it.
pub const DEFAULT_EXTENSION: &str = "txt";

/// Something the bulk fetcher can retrieve: a remote locator plus a
/// deterministic place to keep the result.
pub trait FetchTarget {
    /// Fully-qualified address to request.
    fn source_locator(&self) -> &str;

    /// Where the retrieved body lives under `root`.
    /// Must be a pure function of the target's fields.
    fn storage_path(&self, root: &Path) -> PathBuf;
}

/// Errors raised when a task's fields can't map to a safe storage path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is not a single path component: {value:?}")]
    NotAPathComponent { field: &'static str, value: String },

    #[error("temporal key must start with a four-digit year: {0:?}")]
    MissingYear(String),
}

/// One filing (or other resource) to download.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTask {
    identifier: String,
    temporal_key: String,
    category: String,
    source_locator: String,
    extension: String,
}

impl FetchTask {
    pub fn new(
        identifier: impl Into<String>,
        temporal_key: impl Into<String>,
        category: impl Into<String>,
        source_locator: impl Into<String>,
    ) -> Result<Self, TaskError> {
        let task = Self {
            identifier: identifier.into(),
            temporal_key: temporal_key.into(),
            category: category.into(),
            source_locator: source_locator.into(),
            extension: DEFAULT_EXTENSION.to_owned(),
        };

        check_component("identifier", &task.identifier)?;
        check_component("category", &task.category)?;
        check_component("temporal key", &task.temporal_key)?;
        if task.source_locator.trim().is_empty() {
            return Err(TaskError::Empty {
                field: "source locator",
            });
        }
        year_of(&task.temporal_key)?;

        Ok(task)
    }

    /// Replace the stored file's extension (default `txt`).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Result<Self, TaskError> {
        let extension = extension.into();
        check_component("extension", &extension)?;
        self.extension = extension;
        Ok(self)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn temporal_key(&self) -> &str {
        &self.temporal_key
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The leading four-digit year of the temporal key.
    pub fn year(&self) -> &str {
        // Validated in `new`.
        &self.temporal_key[..4]
    }

    /// `<category>_<temporal_key>.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.category, self.temporal_key, self.extension)
    }
}

impl FetchTarget for FetchTask {
    fn source_locator(&self) -> &str {
        &self.source_locator
    }

    /// Layout: `<root>/<identifier>/<year>/<category>_<temporal_key>.<ext>`
    fn storage_path(&self, root: &Path) -> PathBuf {
        root.join(&self.identifier)
            .join(self.year())
            .join(self.file_name())
    }
}

impl fmt::Display for FetchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.identifier, self.category, self.temporal_key
        )
    }
}

fn check_component(field: &'static str, value: &str) -> Result<(), TaskError> {
    if value.trim().is_empty() {
        return Err(TaskError::Empty { field });
    }

    let invalid = value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0');

    if invalid {
        return Err(TaskError::NotAPathComponent {
            field,
            value: value.to_owned(),
        });
    }

    Ok(())
}

fn year_of(temporal_key: &str) -> Result<&str, TaskError> {
    match temporal_key.get(..4) {
        Some(year) if year.bytes().all(|b| b.is_ascii_digit()) => Ok(year),
        _ => Err(TaskError::MissingYear(temporal_key.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, date: &str, form: &str) -> FetchTask {
        FetchTask::new(id, date, form, "https://www.sec.gov/Archives/edgar/data/1/x.txt").unwrap()
    }

    #[test]
    fn storage_path_follows_layout() {
        let t = task("66904", "1995-03-27", "10-K");
        assert_eq!(
            t.storage_path(Path::new("/data/filings")),
            PathBuf::from("/data/filings/66904/1995/10-K_1995-03-27.txt")
        );
    }

    #[test]
    fn storage_path_is_deterministic() {
        let a = task("839947", "1997-03-31", "10-K");
        let b = task("839947", "1997-03-31", "10-K");
        let root = Path::new("root");
        assert_eq!(a.storage_path(root), b.storage_path(root));
    }

    #[test]
    fn locator_does_not_affect_path() {
        let a = FetchTask::new("1", "2001-01-02", "10-K", "https://a.example/x").unwrap();
        let b = FetchTask::new("1", "2001-01-02", "10-K", "https://b.example/y").unwrap();
        assert_eq!(a.storage_path(Path::new("r")), b.storage_path(Path::new("r")));
    }

    #[test]
    fn custom_extension() {
        let t = task("1", "2020-05-01", "10-K").with_extension("htm").unwrap();
        assert_eq!(t.file_name(), "10-K_2020-05-01.htm");
    }

    #[test]
    fn year_is_taken_from_temporal_key() {
        assert_eq!(task("1", "2010-12-31", "10-K").year(), "2010");
        assert_eq!(task("1", "2010", "10-K").year(), "2010");
    }

    #[test]
    fn rejects_temporal_key_without_year() {
        let result = FetchTask::new("1", "03-27-1995", "10-K", "https://x");
        assert!(matches!(result, Err(TaskError::MissingYear(_))));

        let result = FetchTask::new("1", "95", "10-K", "https://x");
        assert!(matches!(result, Err(TaskError::MissingYear(_))));
    }

    #[test]
    fn rejects_empty_fields() {
        assert!(matches!(
            FetchTask::new("", "1995-03-27", "10-K", "https://x"),
            Err(TaskError::Empty { field: "identifier" })
        ));
        assert!(matches!(
            FetchTask::new("1", "1995-03-27", "10-K", "  "),
            Err(TaskError::Empty { field: "source locator" })
        ));
    }

    #[test]
    fn rejects_path_escapes() {
        assert!(matches!(
            FetchTask::new("..", "1995-03-27", "10-K", "https://x"),
            Err(TaskError::NotAPathComponent { .. })
        ));
        assert!(matches!(
            FetchTask::new("1", "1995-03-27", "10-K/A/../../etc", "https://x"),
            Err(TaskError::NotAPathComponent { .. })
        ));
        assert!(task("1", "1995-03-27", "10-K").with_extension("a/b").is_err());
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(task("66904", "1995-03-27", "10-K").to_string(), "66904 10-K (1995-03-27)");
    }
}
