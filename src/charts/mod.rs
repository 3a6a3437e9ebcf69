//! The five dashboard charts.
//!
//! [`build_charts`] always returns exactly five figures. Each builder runs in
//! isolation: an error in one replaces only that figure with a placeholder
//! carrying the error text.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::data::{format_deadline, Column, ProjectRecord, WorkingTable};
use crate::filter::{filter_table, ExecutorSelection};
use crate::logging::log_chart_fallback;

pub mod figure;

pub use figure::{Figure, Trace};
use figure::{BarTrace, BoxTrace, Layout, Marker, PieTrace, ScatterTrace};

pub const NO_DATA: &str = "No data";
pub const NO_PROBLEM_DATA: &str = "No problem category data";
/// Group label for rows whose grouping field is blank.
pub const BLANK_GROUP: &str = "(none)";

/// Plotly's default qualitative palette.
const PLOTLY_COLORS: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// ColorBrewer Set3.
const SET3_COLORS: [&str; 12] = [
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];

const SIZE_MAX_PX: f64 = 20.0;

pub const CHART_IDS: [&str; 5] = [
    "impact_timeline",
    "status_histogram",
    "problem_pie",
    "impact_box",
    "deadline_scatter",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub impact_timeline: Figure,
    pub status_histogram: Figure,
    pub problem_pie: Figure,
    pub impact_box: Figure,
    pub deadline_scatter: Figure,
}

impl ChartSet {
    fn uniform(figure: Figure) -> Self {
        Self {
            impact_timeline: figure.clone(),
            status_histogram: figure.clone(),
            problem_pie: figure.clone(),
            impact_box: figure.clone(),
            deadline_scatter: figure,
        }
    }

    /// Figures paired with their ids, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Figure)> {
        CHART_IDS.into_iter().zip([
            &self.impact_timeline,
            &self.status_histogram,
            &self.problem_pie,
            &self.impact_box,
            &self.deadline_scatter,
        ])
    }
}

pub fn build_charts(table: &WorkingTable, selection: &ExecutorSelection) -> ChartSet {
    if table.is_empty() || !table.has_column(Column::Deadline) {
        return ChartSet::uniform(Figure::placeholder(NO_DATA));
    }

    // Without an Executor column every selection shows the whole table.
    let selection = if table.has_column(Column::Executor) {
        selection.clone()
    } else {
        ExecutorSelection::All
    };
    let filtered = filter_table(table, &selection);
    if filtered.is_empty() {
        return ChartSet::uniform(Figure::placeholder(&format!(
            "No projects for: {}",
            selection
        )));
    }

    let suffix = title_suffix(&selection);
    ChartSet {
        impact_timeline: isolate(
            "impact_timeline",
            "Timeline error",
            impact_timeline(&filtered, &suffix),
        ),
        status_histogram: isolate(
            "status_histogram",
            "Histogram error",
            status_histogram(&filtered, &suffix),
        ),
        problem_pie: isolate(
            "problem_pie",
            "Pie chart error",
            problem_pie(&filtered, &suffix),
        ),
        impact_box: isolate("impact_box", "Box plot error", impact_box(&filtered, &suffix)),
        deadline_scatter: isolate(
            "deadline_scatter",
            "Scatter error",
            deadline_scatter(&filtered, &suffix),
        ),
    }
}

pub fn title_suffix(selection: &ExecutorSelection) -> String {
    match selection {
        ExecutorSelection::All => " (All executors)".to_string(),
        ExecutorSelection::Named(name) => format!(" (Executor: {})", name),
    }
}

fn isolate(chart: &str, label: &str, built: Result<Figure>) -> Figure {
    built.unwrap_or_else(|err| {
        let message = format!("{}: {:#}", label, err);
        log_chart_fallback(chart, &message);
        Figure::placeholder(&message)
    })
}

fn impact_timeline(table: &WorkingTable, suffix: &str) -> Result<Figure> {
    let mut rows: Vec<&ProjectRecord> = table
        .records()
        .iter()
        .filter(|r| r.impact.is_some())
        .collect();
    if rows.is_empty() {
        bail!("no impact values to plot");
    }
    rows.sort_by_key(|r| r.deadline);

    let groups = if table.has_column(Column::Status) {
        group_by(rows, |r| &r.status)
    } else {
        vec![("Impact".to_string(), rows)]
    };

    let data = groups
        .into_iter()
        .enumerate()
        .map(|(i, (name, rows))| {
            Trace::Scatter(ScatterTrace {
                name,
                mode: "lines+markers".to_string(),
                x: deadlines(&rows),
                y: impacts(&rows),
                marker: Some(Marker::colored(PLOTLY_COLORS[i % PLOTLY_COLORS.len()])),
                customdata: None,
                hovertemplate: None,
            })
        })
        .collect();

    Ok(Figure {
        data,
        layout: Layout::titled(
            &format!("Social impact by deadline{}", suffix),
            Some("Deadline"),
            Some("Social impact (units)"),
        ),
    })
}

fn status_histogram(table: &WorkingTable, suffix: &str) -> Result<Figure> {
    require_column(table, Column::Status)?;

    let data = group_by(table.records().iter().collect(), |r| &r.status)
        .into_iter()
        .enumerate()
        .map(|(i, (status, rows))| {
            Trace::Bar(BarTrace {
                x: vec![status.clone()],
                y: vec![rows.len() as f64],
                name: status,
                marker: Some(Marker::colored(SET3_COLORS[i % SET3_COLORS.len()])),
            })
        })
        .collect();

    Ok(Figure {
        data,
        layout: Layout::titled(
            &format!("Projects by status{}", suffix),
            Some("Project status"),
            Some("Number of projects"),
        ),
    })
}

fn problem_pie(table: &WorkingTable, suffix: &str) -> Result<Figure> {
    if !table.has_column(Column::Problem) {
        return Ok(Figure::placeholder(NO_PROBLEM_DATA));
    }
    if table.records().iter().all(|r| r.impact.is_none()) {
        bail!("no impact values to plot");
    }

    let mut labels = Vec::new();
    let mut values = Vec::new();
    for (problem, rows) in group_by(table.records().iter().collect(), |r| &r.problem) {
        labels.push(problem);
        values.push(rows.iter().filter_map(|r| r.impact).sum::<f64>());
    }

    Ok(Figure {
        data: vec![Trace::Pie(PieTrace {
            labels,
            values,
            textposition: "inside".to_string(),
            textinfo: "percent+label".to_string(),
        })],
        layout: Layout::titled(&format!("Problem share of social impact{}", suffix), None, None),
    })
}

fn impact_box(table: &WorkingTable, suffix: &str) -> Result<Figure> {
    require_column(table, Column::Status)?;
    let rows: Vec<&ProjectRecord> = table
        .records()
        .iter()
        .filter(|r| r.impact.is_some())
        .collect();
    if rows.is_empty() {
        bail!("no impact values to plot");
    }

    let data = group_by(rows, |r| &r.status)
        .into_iter()
        .enumerate()
        .map(|(i, (name, rows))| {
            Trace::Box(BoxTrace {
                name,
                y: impacts(&rows),
                marker: Some(Marker::colored(PLOTLY_COLORS[i % PLOTLY_COLORS.len()])),
            })
        })
        .collect();

    Ok(Figure {
        data,
        layout: Layout::titled(
            &format!("Social impact spread by status{}", suffix),
            Some("Status"),
            Some("Social impact"),
        ),
    })
}

fn deadline_scatter(table: &WorkingTable, suffix: &str) -> Result<Figure> {
    if !table.has_column(Column::Problem) {
        return Ok(Figure::placeholder(NO_DATA));
    }
    let rows: Vec<&ProjectRecord> = table
        .records()
        .iter()
        .filter(|r| r.impact.is_some())
        .collect();
    if rows.is_empty() {
        bail!("no impact values to plot");
    }
    if let Some(bad) = rows.iter().filter_map(|r| r.impact).find(|v| *v < 0.0) {
        bail!("marker size requires non-negative impact, got {}", bad);
    }

    let max = rows.iter().filter_map(|r| r.impact).fold(0.0_f64, f64::max);
    let sizeref = if max > 0.0 {
        2.0 * max / (SIZE_MAX_PX * SIZE_MAX_PX)
    } else {
        1.0
    };

    let data = group_by(rows, |r| &r.problem)
        .into_iter()
        .enumerate()
        .map(|(i, (name, rows))| {
            let y = impacts(&rows);
            Trace::Scatter(ScatterTrace {
                name,
                mode: "markers".to_string(),
                x: deadlines(&rows),
                marker: Some(Marker {
                    color: Some(PLOTLY_COLORS[i % PLOTLY_COLORS.len()].to_string()),
                    size: Some(y.clone()),
                    sizemode: Some("area".to_string()),
                    sizeref: Some(sizeref),
                }),
                y,
                customdata: Some(
                    rows.iter()
                        .map(|r| vec![r.name.clone(), r.executor.clone(), r.initiator.clone()])
                        .collect(),
                ),
                hovertemplate: Some(
                    "Name=%{customdata[0]}<br>Executor=%{customdata[1]}<br>\
                     Initiator=%{customdata[2]}<br>Deadline=%{x}<br>Impact=%{y}<extra></extra>"
                        .to_string(),
                ),
            })
        })
        .collect();

    Ok(Figure {
        data,
        layout: Layout::titled(
            &format!("Deadlines vs social impact{}", suffix),
            Some("Deadline"),
            Some("Social impact"),
        ),
    })
}

fn require_column(table: &WorkingTable, column: Column) -> Result<()> {
    if !table.has_column(column) {
        bail!("column '{}' is missing", column.header());
    }
    Ok(())
}

/// Groups rows by a text key, keeping first-appearance order of the keys.
fn group_by<'a, F>(rows: Vec<&'a ProjectRecord>, key: F) -> Vec<(String, Vec<&'a ProjectRecord>)>
where
    F: Fn(&ProjectRecord) -> &String,
{
    let mut groups: Vec<(String, Vec<&'a ProjectRecord>)> = Vec::new();
    for row in rows {
        let raw = key(row).trim();
        let label = if raw.is_empty() { BLANK_GROUP } else { raw };
        match groups.iter_mut().find(|(name, _)| name.as_str() == label) {
            Some((_, members)) => members.push(row),
            None => groups.push((label.to_string(), vec![row])),
        }
    }
    groups
}

fn deadlines(rows: &[&ProjectRecord]) -> Vec<String> {
    rows.iter().map(|r| format_deadline(&r.deadline)).collect()
}

fn impacts(rows: &[&ProjectRecord]) -> Vec<f64> {
    rows.iter().filter_map(|r| r.impact).collect()
}
