//! EDGAR quarterly master indexes: planning their download and turning them
//! into filing records.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::filings::FilingRecord;
use crate::task::FetchTarget;

/// Base address for both index files and the filings they reference.
pub const DEFAULT_BASE_URL: &str = "https://www.sec.gov/Archives/";

const MASTER_INDEX_FILE: &str = "master.idx";

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("start year {start} is after end year {end}")]
    YearRange { start: u16, end: u16 },

    #[error("unknown quarter {0:?} (expected 1-4, Q1-Q4 or QTR1-QTR4)")]
    UnknownQuarter(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    /// Accepts `3`, `q3`, `Q3` or `QTR3`.
    pub fn parse(s: &str) -> Result<Self, IndexError> {
        let upper = s.trim().to_ascii_uppercase();
        let digits = upper
            .strip_prefix("QTR")
            .or_else(|| upper.strip_prefix('Q'))
            .unwrap_or(&upper);

        match digits {
            "1" => Ok(Self::Q1),
            "2" => Ok(Self::Q2),
            "3" => Ok(Self::Q3),
            "4" => Ok(Self::Q4),
            _ => Err(IndexError::UnknownQuarter(s.to_owned())),
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QTR{}", self.number())
    }
}

/// Download of one quarter's `master.idx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterIndexTask {
    pub year: u16,
    pub quarter: Quarter,
    source_locator: String,
}

impl MasterIndexTask {
    pub fn new(base_url: &str, year: u16, quarter: Quarter) -> Self {
        Self {
            year,
            quarter,
            source_locator: master_index_url(base_url, year, quarter),
        }
    }
}

impl FetchTarget for MasterIndexTask {
    fn source_locator(&self) -> &str {
        &self.source_locator
    }

    fn storage_path(&self, root: &Path) -> PathBuf {
        master_index_path(root, self.year, self.quarter)
    }
}

/// `<root>/<year>/QTR<n>/master.idx`
pub fn master_index_path(root: &Path, year: u16, quarter: Quarter) -> PathBuf {
    root.join(year.to_string())
        .join(quarter.to_string())
        .join(MASTER_INDEX_FILE)
}

/// `<base>edgar/full-index/<year>/QTR<n>/master.idx`
pub fn master_index_url(base_url: &str, year: u16, quarter: Quarter) -> String {
    format!(
        "{}edgar/full-index/{year}/{quarter}/{MASTER_INDEX_FILE}",
        with_trailing_slash(base_url)
    )
}

/// One task per quarter, from Q1 of `start_year` through `through` of
/// `end_year`, in chronological order.
pub fn master_index_tasks(
    base_url: &str,
    start_year: u16,
    end_year: u16,
    through: Quarter,
) -> Result<Vec<MasterIndexTask>, IndexError> {
    if start_year > end_year {
        return Err(IndexError::YearRange {
            start: start_year,
            end: end_year,
        });
    }

    let tasks = (start_year..=end_year)
        .flat_map(|year| {
            Quarter::ALL
                .into_iter()
                .filter(move |q| year < end_year || *q <= through)
                .map(move |q| MasterIndexTask::new(base_url, year, q))
        })
        .collect();

    Ok(tasks)
}

/// Parse a `master.idx` body into filing records.
///
/// The file is Latin-1. Rows follow a dashed separator line and look like
/// `CIK|Company Name|Form Type|Date Filed|Filename`. Only rows whose form is
/// in `forms` are kept; an empty `forms` keeps every row.
pub fn parse_master_index(contents: &[u8], base_url: &str, forms: &[String]) -> Vec<FilingRecord> {
    let text = decode_latin1(contents);
    let base = with_trailing_slash(base_url);

    let has_separator = text.lines().any(is_separator);
    let mut rows = text.lines();
    if has_separator {
        rows.by_ref().find(|line| is_separator(line));
    }

    rows.filter_map(|line| {
        let parts: Vec<&str> = line.trim().split('|').collect();
        let [cik, company, form, date, filename, ..] = parts.as_slice() else {
            return None;
        };

        if cik.is_empty() || !cik.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        if !forms.is_empty() && !forms.iter().any(|f| f == form) {
            return None;
        }

        Some(FilingRecord {
            cik: (*cik).to_owned(),
            company: (*company).to_owned(),
            form: (*form).to_owned(),
            date_filed: (*date).to_owned(),
            url: format!("{base}{}", filename.trim_start_matches('/')),
        })
    })
    .collect()
}

/// Parse every downloaded master index for the year range, in year/quarter
/// order. Quarters with no index on disk are skipped.
pub fn collect_filings(
    index_root: &Path,
    start_year: u16,
    end_year: u16,
    base_url: &str,
    forms: &[String],
) -> Result<Vec<FilingRecord>, IndexError> {
    if start_year > end_year {
        return Err(IndexError::YearRange {
            start: start_year,
            end: end_year,
        });
    }

    let mut records = Vec::new();

    for year in start_year..=end_year {
        for quarter in Quarter::ALL {
            let path = master_index_path(index_root, year, quarter);
            if !path.is_file() {
                continue;
            }

            let contents =
                std::fs::read(&path).map_err(|source| IndexError::Read { path: path.clone(), source })?;
            let parsed = parse_master_index(&contents, base_url, forms);
            debug!(%year, %quarter, filings = parsed.len(), "parsed master index");
            records.extend(parsed);
        }
    }

    Ok(records)
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.bytes().all(|b| b == b'-')
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_owned()
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Description:           Master Index of EDGAR Dissemination Feed
Last Data Received:    March 31, 1995
Comments:              webmaster@sec.gov
Anonymous FTP:         ftp://ftp.sec.gov/edgar/




CIK|Company Name|Form Type|Date Filed|Filename
--------------------------------------------------------------------------------
66904|MIDDLESEX WATER CO|10-K|1995-03-27|edgar/data/66904/0000066904-95-000004.txt
839947|PRUDENTIAL-BACHE DIVERSIFIED FUTURES FUND 2 L P|10-Q|1995-02-14|edgar/data/839947/0000839947-95-000001.txt
1000045|NICHOLAS FINANCIAL INC|10-K|1995-03-30|edgar/data/1000045/0001000045-95-000010.txt
";

    fn forms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn quarter_parsing_accepts_common_spellings() {
        assert_eq!(Quarter::parse("1").unwrap(), Quarter::Q1);
        assert_eq!(Quarter::parse("q2").unwrap(), Quarter::Q2);
        assert_eq!(Quarter::parse("QTR3").unwrap(), Quarter::Q3);
        assert_eq!(Quarter::parse(" Q4 ").unwrap(), Quarter::Q4);
        assert!(Quarter::parse("5").is_err());
        assert!(Quarter::parse("QTR").is_err());
    }

    #[test]
    fn quarter_displays_as_directory_name() {
        assert_eq!(Quarter::Q1.to_string(), "QTR1");
    }

    #[test]
    fn master_index_url_and_path() {
        let task = MasterIndexTask::new("https://www.sec.gov/Archives", 1995, Quarter::Q2);
        assert_eq!(
            task.source_locator(),
            "https://www.sec.gov/Archives/edgar/full-index/1995/QTR2/master.idx"
        );
        assert_eq!(
            task.storage_path(Path::new("data/edgar")),
            PathBuf::from("data/edgar/1995/QTR2/master.idx")
        );
    }

    #[test]
    fn plans_every_quarter_in_range() {
        let tasks = master_index_tasks(DEFAULT_BASE_URL, 2010, 2011, Quarter::Q4).unwrap();
        assert_eq!(tasks.len(), 8);
        assert_eq!((tasks[0].year, tasks[0].quarter), (2010, Quarter::Q1));
        assert_eq!((tasks[7].year, tasks[7].quarter), (2011, Quarter::Q4));
    }

    #[test]
    fn final_year_stops_at_requested_quarter() {
        let tasks = master_index_tasks(DEFAULT_BASE_URL, 2024, 2025, Quarter::Q1).unwrap();
        assert_eq!(tasks.len(), 5);
        assert_eq!((tasks[4].year, tasks[4].quarter), (2025, Quarter::Q1));
    }

    #[test]
    fn single_year_range() {
        let tasks = master_index_tasks(DEFAULT_BASE_URL, 2020, 2020, Quarter::Q2).unwrap();
        let quarters: Vec<Quarter> = tasks.iter().map(|t| t.quarter).collect();
        assert_eq!(quarters, vec![Quarter::Q1, Quarter::Q2]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let result = master_index_tasks(DEFAULT_BASE_URL, 2021, 2020, Quarter::Q4);
        assert!(matches!(result, Err(IndexError::YearRange { start: 2021, end: 2020 })));
    }

    #[test]
    fn parses_rows_after_separator_filtered_by_form() {
        let records = parse_master_index(SAMPLE.as_bytes(), DEFAULT_BASE_URL, &forms(&["10-K"]));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cik, "66904");
        assert_eq!(records[0].company, "MIDDLESEX WATER CO");
        assert_eq!(records[0].form, "10-K");
        assert_eq!(records[0].date_filed, "1995-03-27");
        assert_eq!(
            records[0].url,
            "https://www.sec.gov/Archives/edgar/data/66904/0000066904-95-000004.txt"
        );
        assert_eq!(records[1].cik, "1000045");
    }

    #[test]
    fn empty_form_filter_keeps_everything() {
        let records = parse_master_index(SAMPLE.as_bytes(), DEFAULT_BASE_URL, &[]);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn header_row_is_never_a_record() {
        let without_preamble = "CIK|Company Name|Form Type|Date Filed|Filename\n\
                                1|A|10-K|2001-01-01|edgar/data/1/a.txt\n";
        let records = parse_master_index(without_preamble.as_bytes(), DEFAULT_BASE_URL, &[]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cik, "1");
    }

    #[test]
    fn latin1_company_names_survive() {
        let mut bytes = b"---\n1|CAF".to_vec();
        bytes.push(0xC9); // É in Latin-1
        bytes.extend_from_slice(b" INC|10-K|2001-01-01|edgar/data/1/a.txt\n");

        let records = parse_master_index(&bytes, DEFAULT_BASE_URL, &[]);
        assert_eq!(records[0].company, "CAFÉ INC");
    }

    #[test]
    fn malformed_rows_are_ignored() {
        let body = "---\n1|only|three\n\n2|B|10-K|2001-01-01|edgar/data/2/b.txt\n";
        let records = parse_master_index(body.as_bytes(), DEFAULT_BASE_URL, &[]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cik, "2");
    }

    #[test]
    fn collects_existing_indexes_in_order() {
        let root = tempfile::tempdir().unwrap();
        let write = |year: u16, quarter: Quarter, row: &str| {
            let path = master_index_path(root.path(), year, quarter);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, format!("---\n{row}\n")).unwrap();
        };
        write(2011, Quarter::Q1, "3|C|10-K|2011-02-01|edgar/data/3/c.txt");
        write(2010, Quarter::Q3, "2|B|10-K|2010-08-01|edgar/data/2/b.txt");
        write(2010, Quarter::Q1, "1|A|10-K|2010-02-01|edgar/data/1/a.txt");

        let records =
            collect_filings(root.path(), 2010, 2011, DEFAULT_BASE_URL, &forms(&["10-K"])).unwrap();
        let ciks: Vec<&str> = records.iter().map(|r| r.cik.as_str()).collect();
        assert_eq!(ciks, vec!["1", "2", "3"]);
    }

    #[test]
    fn collect_with_no_indexes_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let records = collect_filings(root.path(), 1994, 1995, DEFAULT_BASE_URL, &[]).unwrap();
        assert!(records.is_empty());
    }
}
