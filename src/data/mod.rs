//! Project table ingest.
//!
//! Reads the CSV written by the upstream project bot into a [`WorkingTable`].
//! Loading never fails from the caller's point of view: any read or parse
//! problem yields an empty table that still carries every expected column,
//! and the reason is logged and recorded in the [`LoadReport`].

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDateTime;
use csv::StringRecord;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::Path;

use crate::filter::distinct_executors;
use crate::logging::{log_load_failure, log_load_summary, ts_now};

mod deadline;

pub use deadline::{format_deadline, parse_deadline};

/// Synthesized impact is drawn uniformly from `IMPACT_MIN..IMPACT_MAX`.
pub const IMPACT_MIN: i64 = 1_000;
pub const IMPACT_MAX: i64 = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Id,
    Name,
    Problem,
    Initiator,
    Deadline,
    Status,
    Executor,
    Impact,
}

pub const EXPECTED_COLUMNS: [Column; 8] = [
    Column::Id,
    Column::Name,
    Column::Problem,
    Column::Initiator,
    Column::Deadline,
    Column::Status,
    Column::Executor,
    Column::Impact,
];

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Name => "Name",
            Column::Problem => "Problem",
            Column::Initiator => "Initiator",
            Column::Deadline => "Deadline",
            Column::Status => "Status",
            Column::Executor => "Executor",
            Column::Impact => "Impact",
        }
    }

    /// Case-insensitive, whitespace-tolerant header lookup.
    pub fn from_header(name: &str) -> Option<Self> {
        let name = name.trim();
        EXPECTED_COLUMNS
            .iter()
            .copied()
            .find(|c| c.header().eq_ignore_ascii_case(name))
    }
}

/// One row of the working table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub problem: String,
    pub initiator: String,
    pub deadline: NaiveDateTime,
    pub status: String,
    pub executor: String,
    pub impact: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkingTable {
    records: Vec<ProjectRecord>,
    columns: BTreeSet<Column>,
}

impl WorkingTable {
    pub fn new(records: Vec<ProjectRecord>, columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            records,
            columns: columns.into_iter().collect(),
        }
    }

    /// Zero rows, all expected columns.
    pub fn empty() -> Self {
        Self::new(Vec::new(), EXPECTED_COLUMNS)
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::header).collect()
    }

    /// New table holding the rows that match `keep`, with the same columns.
    pub fn select<F>(&self, mut keep: F) -> WorkingTable
    where
        F: FnMut(&ProjectRecord) -> bool,
    {
        WorkingTable {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
            columns: self.columns.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub path: String,
    pub hash_sha256: Option<String>,
    pub rows_read: u64,
    /// Rows excluded because the deadline was missing or unparseable
    pub rows_dropped: u64,
    pub records: u64,
    pub impact_synthesized: bool,
    pub columns: Vec<String>,
    pub error: Option<String>,
    pub loaded_at: String,
}

impl LoadReport {
    fn failed(path: String, hash_sha256: Option<String>, error: String) -> Self {
        Self {
            path,
            hash_sha256,
            rows_read: 0,
            rows_dropped: 0,
            records: 0,
            impact_synthesized: false,
            columns: EXPECTED_COLUMNS.iter().map(|c| c.header().to_string()).collect(),
            error: Some(error),
            loaded_at: ts_now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub table: WorkingTable,
    pub report: LoadReport,
}

struct ParsedTable {
    table: WorkingTable,
    rows_read: u64,
    rows_dropped: u64,
    impact_synthesized: bool,
}

/// Load the project table, synthesizing impact from the thread RNG.
pub fn load_table(path: &Path) -> LoadOutcome {
    load_table_with(path, &mut rand::thread_rng())
}

/// Load the project table, synthesizing impact (when absent) from `rng`.
pub fn load_table_with<R: Rng + ?Sized>(path: &Path, rng: &mut R) -> LoadOutcome {
    let path_str = path.display().to_string();

    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(err) => {
            let reason = if err.kind() == ErrorKind::NotFound {
                format!("file '{}' not found", path_str)
            } else {
                format!("failed to read '{}': {}", path_str, err)
            };
            log_load_failure(&path_str, &reason);
            return LoadOutcome {
                table: WorkingTable::empty(),
                report: LoadReport::failed(path_str, None, reason),
            };
        }
    };
    let hash = content_sha256(&bytes);

    match parse_table(&bytes, rng) {
        Ok(parsed) => {
            let columns = parsed.table.column_names();
            log_load_summary(
                &path_str,
                &columns,
                &distinct_executors(&parsed.table),
                parsed.table.len(),
            );
            let report = LoadReport {
                path: path_str,
                hash_sha256: Some(hash),
                rows_read: parsed.rows_read,
                rows_dropped: parsed.rows_dropped,
                records: parsed.table.len() as u64,
                impact_synthesized: parsed.impact_synthesized,
                columns: columns.iter().map(|c| c.to_string()).collect(),
                error: None,
                loaded_at: ts_now(),
            };
            LoadOutcome {
                table: parsed.table,
                report,
            }
        }
        Err(err) => {
            let reason = format!("{:#}", err);
            log_load_failure(&path_str, &reason);
            LoadOutcome {
                table: WorkingTable::empty(),
                report: LoadReport::failed(path_str, Some(hash), reason),
            }
        }
    }
}

fn parse_table<R: Rng + ?Sized>(bytes: &[u8], rng: &mut R) -> Result<ParsedTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .context("failed to read CSV header")?
        .clone();
    if headers.iter().all(|h| h.is_empty()) {
        bail!("file has no header row");
    }

    let header_map = build_header_map(&headers);
    if !header_map.contains_key(&Column::Deadline) {
        return Err(anyhow!("missing required column '{}'", Column::Deadline.header()));
    }
    let has_impact = header_map.contains_key(&Column::Impact);

    let mut records = Vec::new();
    let mut rows_read = 0u64;
    let mut rows_dropped = 0u64;

    for (idx, result) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record = result.with_context(|| format!("bad CSV record at line {}", idx + 2))?;
        rows_read += 1;

        let cell = |column: Column| {
            header_map
                .get(&column)
                .and_then(|&i| record.get(i))
                .unwrap_or("")
        };

        let Some(deadline) = parse_deadline(cell(Column::Deadline)) else {
            rows_dropped += 1;
            continue;
        };

        records.push(ProjectRecord {
            id: cell(Column::Id).to_string(),
            name: cell(Column::Name).to_string(),
            problem: cell(Column::Problem).to_string(),
            initiator: cell(Column::Initiator).to_string(),
            deadline,
            status: cell(Column::Status).to_string(),
            executor: cell(Column::Executor).to_string(),
            impact: if has_impact {
                parse_impact(cell(Column::Impact))
            } else {
                None
            },
        });
    }

    let impact_synthesized = !has_impact && !records.is_empty();
    if impact_synthesized {
        for record in &mut records {
            record.impact = Some(rng.gen_range(IMPACT_MIN..IMPACT_MAX) as f64);
        }
    }

    // Impact is always part of the working table, synthesized or empty.
    let columns = header_map
        .keys()
        .copied()
        .chain(std::iter::once(Column::Impact));

    Ok(ParsedTable {
        table: WorkingTable::new(records, columns),
        rows_read,
        rows_dropped,
        impact_synthesized,
    })
}

/// First occurrence wins when a header is repeated; unknown headers are ignored.
fn build_header_map(headers: &StringRecord) -> HashMap<Column, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        if let Some(column) = Column::from_header(name) {
            map.entry(column).or_insert(idx);
        }
    }
    map
}

fn parse_impact(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn content_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn parse(text: &str) -> ParsedTable {
        let mut rng = StdRng::seed_from_u64(7);
        parse_table(text.as_bytes(), &mut rng).unwrap()
    }

    #[test]
    fn header_lookup_ignores_case_and_padding() {
        assert_eq!(Column::from_header(" deadline "), Some(Column::Deadline));
        assert_eq!(Column::from_header("id"), Some(Column::Id));
        assert_eq!(Column::from_header("Budget"), None);
    }

    #[test]
    fn drops_rows_with_bad_deadlines() {
        let parsed = parse(
            "ID,Name,Problem,Initiator,Deadline,Status,Executor\n\
             1,Park,Ecology,Ivan,2025-05-01,Active,Anna\n\
             2,Library,Education,Olga,someday,Active,Anna\n\
             3,Shelter,Animals,Petr,,Done,Boris\n",
        );
        assert_eq!(parsed.rows_read, 3);
        assert_eq!(parsed.rows_dropped, 2);
        assert_eq!(parsed.table.len(), 1);
        assert_eq!(parsed.table.records()[0].name, "Park");
    }

    #[test]
    fn column_order_and_extra_columns_do_not_matter() {
        let parsed = parse(
            "Executor,Comment,Deadline,ID,Status\n\
             Anna,ignored,2025-01-10,42,Active\n",
        );
        let rec = &parsed.table.records()[0];
        assert_eq!(rec.id, "42");
        assert_eq!(rec.executor, "Anna");
        assert_eq!(rec.status, "Active");
        assert_eq!(rec.name, "");
        assert!(!parsed.table.has_column(Column::Name));
        assert!(parsed.table.has_column(Column::Impact));
    }

    #[test]
    fn synthesizes_impact_in_range_when_absent() {
        let parsed = parse(
            "ID,Deadline\n\
             1,2025-01-01\n\
             2,2025-01-02\n\
             3,2025-01-03\n",
        );
        assert!(parsed.impact_synthesized);
        for rec in parsed.table.records() {
            let v = rec.impact.unwrap();
            assert!(v >= IMPACT_MIN as f64 && v < IMPACT_MAX as f64);
            assert_eq!(v.fract(), 0.0);
        }
    }

    #[test]
    fn source_impact_is_authoritative() {
        let parsed = parse(
            "ID,Deadline,Impact\n\
             1,2025-01-01,12.5\n\
             2,2025-01-02,n/a\n",
        );
        assert!(!parsed.impact_synthesized);
        assert_eq!(parsed.table.records()[0].impact, Some(12.5));
        assert_eq!(parsed.table.records()[1].impact, None);
    }

    #[test]
    fn header_only_file_is_empty_without_synthesis() {
        let parsed = parse("ID,Name,Problem,Initiator,Deadline,Status,Executor\n");
        assert!(parsed.table.is_empty());
        assert!(!parsed.impact_synthesized);
        assert!(parsed.table.has_column(Column::Impact));
    }

    #[test]
    fn missing_deadline_column_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = parse_table(b"ID,Name\n1,Park\n", &mut rng).err().unwrap();
        assert!(err.to_string().contains("Deadline"));
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let parsed = parse(
            "ID,Name,Deadline\n\
             1,\"Parks, squares and yards\",2025-02-02\n",
        );
        assert_eq!(parsed.table.records()[0].name, "Parks, squares and yards");
    }

    #[test]
    fn empty_table_has_every_column() {
        let table = WorkingTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.column_names().len(), EXPECTED_COLUMNS.len());
    }

    #[test]
    fn sha256_is_hex() {
        let h = content_sha256(b"abc");
        assert_eq!(h.len(), 64);
        assert!(h.starts_with("ba7816bf"));
    }
}
