//! Chart and table derivation from raw metric rows.
//!
//! Pure functions only. Parsing is total: a cell that is not a number counts
//! as `0`, and a missing year row yields a zero-filled series of the same
//! length as the other one.

use crate::api::payload::RawMetricRow;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

const MONTHS: [(&str, &str); 12] = [
    ("jan", "january"),
    ("feb", "february"),
    ("mar", "march"),
    ("apr", "april"),
    ("may", "may"),
    ("jun", "june"),
    ("jul", "july"),
    ("aug", "august"),
    ("sep", "september"),
    ("oct", "october"),
    ("nov", "november"),
    ("dec", "december"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Year label, e.g. "2025".
    pub name: String,
    pub data: Vec<f64>,
}

/// Which chart the graph popup shows first. Both are always built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesMode {
    #[default]
    Monthly,
    Cumulative,
}

/// Two-year chart data: index 0 is the prior year, index 1 the current year.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSeries {
    pub monthly: [ChartSeries; 2],
    pub cumulative: [ChartSeries; 2],
    pub mode: SeriesMode,
}

impl GraphSeries {
    pub fn active(&self) -> &[ChartSeries; 2] {
        match self.mode {
            SeriesMode::Monthly => &self.monthly,
            SeriesMode::Cumulative => &self.cumulative,
        }
    }

    pub fn to_payload(&self) -> GraphPayload {
        GraphPayload {
            is_close: false,
            monthly_data_for_graph: self.monthly[0].data.clone(),
            monthly_data_ext: self.monthly[1].data.clone(),
            monthly_data_cumulative: self.cumulative[0].data.clone(),
            monthly_data_ext_cumulative: self.cumulative[1].data.clone(),
        }
    }
}

/// What the graph popup hands back to its owner. `closed()` is the explicit
/// reset so consumers can tell "closed" from "no data yet".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
    pub is_close: bool,
    pub monthly_data_for_graph: Vec<f64>,
    pub monthly_data_ext: Vec<f64>,
    pub monthly_data_cumulative: Vec<f64>,
    pub monthly_data_ext_cumulative: Vec<f64>,
}

impl GraphPayload {
    pub fn closed() -> Self {
        Self {
            is_close: true,
            monthly_data_for_graph: Vec::new(),
            monthly_data_ext: Vec::new(),
            monthly_data_cumulative: Vec::new(),
            monthly_data_ext_cumulative: Vec::new(),
        }
    }
}

/// Build the monthly and cumulative series for the two most recent years in
/// `rows`.
pub fn build_series(rows: &[RawMetricRow], mode: SeriesMode) -> GraphSeries {
    build_series_for_year(rows, mode, chrono::Local::now().year())
}

pub(crate) fn build_series_for_year(
    rows: &[RawMetricRow],
    mode: SeriesMode,
    current_year: i32,
) -> GraphSeries {
    let ([prior_name, current_name], [prior_row, current_row]) = pick_years(rows, current_year);
    let columns = month_columns(prior_row.into_iter().chain(current_row));

    let prior = values_for(prior_row, &columns);
    let current = values_for(current_row, &columns);

    GraphSeries {
        cumulative: [
            ChartSeries {
                name: prior_name.clone(),
                data: running_sum(&prior),
            },
            ChartSeries {
                name: current_name.clone(),
                data: running_sum(&current),
            },
        ],
        monthly: [
            ChartSeries {
                name: prior_name,
                data: prior,
            },
            ChartSeries {
                name: current_name,
                data: current,
            },
        ],
        mode,
    }
}

/// `c[0] = m[0]`, `c[i] = c[i-1] + m[i]`.
pub fn running_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |total, value| {
            *total += value;
            Some(*total)
        })
        .collect()
}

type YearPick<'a> = ([String; 2], [Option<&'a RawMetricRow>; 2]);

fn pick_years(rows: &[RawMetricRow], current_year: i32) -> YearPick<'_> {
    let mut years: Vec<&str> = rows.iter().filter_map(|r| r.year.as_deref()).collect();
    years.sort_unstable();
    years.dedup();

    if let Some(&latest) = years.last() {
        let row_for = |year: &str| rows.iter().find(|r| r.year.as_deref() == Some(year));
        let prior = match years.len() {
            1 => latest
                .parse::<i32>()
                .map(|y| (y - 1).to_string())
                .unwrap_or_default(),
            n => years[n - 2].to_string(),
        };
        let prior_row = row_for(&prior);
        return ([prior, latest.to_string()], [prior_row, row_for(latest)]);
    }

    // No year fields: first row is the prior year, second the current one
    (
        [(current_year - 1).to_string(), current_year.to_string()],
        [rows.first(), rows.get(1)],
    )
}

fn month_index(field: &str) -> Option<usize> {
    let field = field.trim().to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|(short, long)| field == *short || field == *long)
}

/// Month columns in calendar order, or every value column in payload order
/// when the rows carry no month-named fields.
fn month_columns<'a>(rows: impl Iterator<Item = &'a RawMetricRow> + Clone) -> Vec<String> {
    let mut months: Vec<(usize, String)> = Vec::new();
    let mut others: Vec<String> = Vec::new();

    for row in rows {
        for (name, _) in &row.values {
            match month_index(name) {
                Some(index) => {
                    if !months.iter().any(|(i, _)| *i == index) {
                        months.push((index, name.clone()));
                    }
                }
                None => {
                    if !others.contains(name) {
                        others.push(name.clone());
                    }
                }
            }
        }
    }

    if months.is_empty() {
        return others;
    }
    months.sort_by_key(|(index, _)| *index);
    months.into_iter().map(|(_, name)| name).collect()
}

fn values_for(row: Option<&RawMetricRow>, columns: &[String]) -> Vec<f64> {
    columns
        .iter()
        .map(|column| {
            row.and_then(|r| {
                // Match either the exact column name or the same calendar month
                r.value(column).or_else(|| {
                    let index = month_index(column)?;
                    r.values
                        .iter()
                        .find(|(name, _)| month_index(name) == Some(index))
                        .map(|(_, value)| value)
                })
            })
            .map(|value| value.as_f64())
            .unwrap_or(0.0)
        })
        .collect()
}

/// Display-ready grid row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub kpi: String,
    /// One cell per [`TableView::columns`] entry.
    pub cells: Vec<String>,
    pub drill_down: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn build_table(rows: &[RawMetricRow]) -> TableView {
    let mut columns = Vec::new();
    collect_columns(rows, &mut columns);
    let rows = rows.iter().map(|row| table_row(row, &columns)).collect();
    TableView { columns, rows }
}

fn collect_columns(rows: &[RawMetricRow], columns: &mut Vec<String>) {
    for row in rows {
        for (name, _) in &row.values {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        collect_columns(&row.drill_down, columns);
    }
}

fn table_row(row: &RawMetricRow, columns: &[String]) -> TableRow {
    TableRow {
        kpi: row.kpi.clone(),
        cells: columns
            .iter()
            .map(|column| row.value(column).map(ToString::to_string).unwrap_or_default())
            .collect(),
        drill_down: row
            .drill_down
            .iter()
            .map(|child| table_row(child, columns))
            .collect(),
    }
}
