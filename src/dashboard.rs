//! Single-owner handle to the current working table.
//!
//! Every trigger (timer tick or selection change) reloads the source file and
//! swaps the handle wholesale; tables are never mutated in place.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use crate::charts::{build_charts, ChartSet};
use crate::config::Config;
use crate::data::{load_table, load_table_with, LoadOutcome, LoadReport, WorkingTable};
use crate::filter::{executor_options, DropdownOption, ExecutorSelection, ALL_SENTINEL};
use crate::logging::{log, obj, v_str, Domain, Level, ProfileScope};

/// Payload for the executor dropdown and the diagnostic line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorOptions {
    pub options: Vec<DropdownOption>,
    pub debug: String,
    pub value: String,
}

pub struct Dashboard {
    source: PathBuf,
    impact_seed: Option<u64>,
    table: Arc<WorkingTable>,
    report: Option<LoadReport>,
}

impl Dashboard {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            impact_seed: None,
            table: Arc::new(WorkingTable::empty()),
            report: None,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.projects_csv).with_impact_seed(cfg.impact_seed)
    }

    pub fn with_impact_seed(mut self, seed: Option<u64>) -> Self {
        self.impact_seed = seed;
        self
    }

    /// Current table; the handle stays valid after later refreshes.
    pub fn table(&self) -> Arc<WorkingTable> {
        Arc::clone(&self.table)
    }

    pub fn last_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    /// Reload the source file and replace the current table.
    pub fn refresh(&mut self) -> Arc<WorkingTable> {
        let path = self.source.display().to_string();
        let _scope = ProfileScope::with_context("refresh", &[("path", v_str(&path))]);
        let LoadOutcome { table, report } = match self.impact_seed {
            Some(seed) => load_table_with(&self.source, &mut StdRng::seed_from_u64(seed)),
            None => load_table(&self.source),
        };
        self.table = Arc::new(table);
        self.report = Some(report);
        self.table()
    }

    /// Fresh load, then the dropdown options for the new table.
    ///
    /// `current` is kept as the dropdown value when it is still offered.
    pub fn refresh_executors(&mut self, current: Option<&str>) -> ExecutorOptions {
        let table = self.refresh();
        match executor_options(&table) {
            Ok(options) => {
                let value = current
                    .filter(|c| options.iter().any(|o| o.value == *c))
                    .unwrap_or(ALL_SENTINEL)
                    .to_string();
                let debug = format!(
                    "Data refreshed. Executors: {} | Projects: {}",
                    options.len() - 1,
                    table.len()
                );
                log(
                    Level::Debug,
                    Domain::Filter,
                    "executors_refreshed",
                    obj(&[
                        ("executor", v_str(&value)),
                        ("options", json!(options.len())),
                        ("records", json!(table.len())),
                    ]),
                );
                ExecutorOptions {
                    options,
                    debug,
                    value,
                }
            }
            Err(err) => {
                let debug = format!("Failed to load executors: {:#}", err);
                log(
                    Level::Warn,
                    Domain::Filter,
                    "executor_enumeration_failed",
                    obj(&[("msg", v_str(&debug))]),
                );
                ExecutorOptions {
                    options: vec![DropdownOption::all()],
                    debug,
                    value: ALL_SENTINEL.to_string(),
                }
            }
        }
    }

    /// Fresh load, then the five charts for `selection`.
    pub fn refresh_charts(&mut self, selection: &ExecutorSelection) -> ChartSet {
        let table = self.refresh();
        let _scope =
            ProfileScope::with_context("build_charts", &[("executor", v_str(selection.value()))]);
        build_charts(&table, selection)
    }
}
