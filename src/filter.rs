//! Executor selection: dropdown options and table filtering.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::data::{Column, WorkingTable};

/// Dropdown value meaning "no filtering".
pub const ALL_SENTINEL: &str = "all";
pub const ALL_LABEL: &str = "All executors";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExecutorSelection {
    All,
    Named(String),
}

impl ExecutorSelection {
    /// `"all"` (and an absent value) select everything; anything else is an
    /// exact executor name.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some(ALL_SENTINEL) => ExecutorSelection::All,
            Some(name) => ExecutorSelection::Named(name.to_string()),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ExecutorSelection::All => ALL_SENTINEL,
            ExecutorSelection::Named(name) => name,
        }
    }
}

impl fmt::Display for ExecutorSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

impl DropdownOption {
    pub fn all() -> Self {
        Self {
            label: ALL_LABEL.to_string(),
            value: ALL_SENTINEL.to_string(),
        }
    }
}

/// Distinct non-blank executors in order of first appearance.
pub fn distinct_executors(table: &WorkingTable) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .records()
        .iter()
        .filter(|_| table.has_column(Column::Executor))
        .map(|r| r.executor.as_str())
        .filter(|e| !e.trim().is_empty())
        .filter(|e| seen.insert(*e))
        .map(str::to_string)
        .collect()
}

/// The `all` option followed by one option per distinct executor.
///
/// A source without an `Executor` column has no executors to offer.
pub fn executor_options(table: &WorkingTable) -> Result<Vec<DropdownOption>> {
    let mut options = vec![DropdownOption::all()];
    options.extend(distinct_executors(table).into_iter().map(|e| DropdownOption {
        label: e.clone(),
        value: e,
    }));
    Ok(options)
}

/// Rows for `selection`. A source without an `Executor` column is never narrowed.
pub fn filter_table(table: &WorkingTable, selection: &ExecutorSelection) -> WorkingTable {
    if !table.has_column(Column::Executor) {
        return table.clone();
    }
    match selection {
        ExecutorSelection::All => table.clone(),
        ExecutorSelection::Named(name) => table.select(|r| r.executor == *name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ProjectRecord, EXPECTED_COLUMNS};
    use chrono::NaiveDate;

    fn record(id: &str, executor: &str) -> ProjectRecord {
        ProjectRecord {
            id: id.to_string(),
            name: format!("Project {}", id),
            problem: "Ecology".to_string(),
            initiator: "Ivan".to_string(),
            deadline: NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            status: "Active".to_string(),
            executor: executor.to_string(),
            impact: Some(1500.0),
        }
    }

    fn table() -> WorkingTable {
        WorkingTable::new(
            vec![
                record("1", "Anna"),
                record("2", "Boris"),
                record("3", "Anna"),
                record("4", ""),
                record("5", "  "),
                record("6", "anna"),
            ],
            EXPECTED_COLUMNS,
        )
    }

    #[test]
    fn parse_selection() {
        assert_eq!(ExecutorSelection::parse(None), ExecutorSelection::All);
        assert_eq!(ExecutorSelection::parse(Some("all")), ExecutorSelection::All);
        assert_eq!(
            ExecutorSelection::parse(Some("Anna")),
            ExecutorSelection::Named("Anna".to_string())
        );
    }

    #[test]
    fn distinct_executors_keep_first_appearance_order() {
        assert_eq!(distinct_executors(&table()), vec!["Anna", "Boris", "anna"]);
    }

    #[test]
    fn options_start_with_sentinel() {
        let options = executor_options(&table()).unwrap();
        assert_eq!(options[0], DropdownOption::all());
        assert_eq!(options.len(), 4);
        assert_eq!(options[1].value, "Anna");
    }

    #[test]
    fn options_without_executor_column_are_sentinel_only() {
        let t = WorkingTable::new(vec![record("1", "Anna")], [Column::Id, Column::Deadline]);
        assert_eq!(executor_options(&t).unwrap(), vec![DropdownOption::all()]);
        assert!(distinct_executors(&t).is_empty());
        let empty = WorkingTable::new(Vec::new(), [Column::Id, Column::Deadline]);
        assert_eq!(executor_options(&empty).unwrap(), vec![DropdownOption::all()]);
    }

    #[test]
    fn filter_all_is_identity() {
        let t = table();
        assert_eq!(filter_table(&t, &ExecutorSelection::All), t);
    }

    #[test]
    fn filter_named_is_exact_and_case_sensitive() {
        let t = filter_table(&table(), &ExecutorSelection::Named("Anna".to_string()));
        let ids: Vec<&str> = t.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let none = filter_table(&table(), &ExecutorSelection::Named("Ann".to_string()));
        assert!(none.is_empty());
    }

    #[test]
    fn named_filter_is_skipped_without_executor_column() {
        let t = WorkingTable::new(
            vec![record("1", ""), record("2", "")],
            [Column::Id, Column::Deadline, Column::Status],
        );
        let filtered = filter_table(&t, &ExecutorSelection::Named("Anna".to_string()));
        assert_eq!(filtered, t);
    }
}
