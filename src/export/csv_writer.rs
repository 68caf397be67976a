//! CSV shaping and the file-backed export utility.

use super::ExportError;
use crate::api::payload::RawMetricRow;
use crate::series::{TableRow, TableView, build_table};
use std::fs;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

/// Header plus records, already shaped for writing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl CsvTable {
    /// Flattens a grid: one record per row, drill-down rows follow their
    /// parent with a `Parent > Child` KPI.
    pub fn from_table(table: &TableView) -> Self {
        let mut headers = Vec::with_capacity(table.columns.len() + 1);
        headers.push("KPI".to_string());
        headers.extend(table.columns.iter().cloned());

        let mut records = Vec::new();
        for row in &table.rows {
            push_records(row, None, &mut records);
        }
        Self { headers, records }
    }

    pub fn from_rows(rows: &[RawMetricRow]) -> Self {
        Self::from_table(&build_table(rows))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn push_records(row: &TableRow, parent: Option<&str>, records: &mut Vec<Vec<String>>) {
    let kpi = match parent {
        Some(parent) => format!("{} > {}", parent, row.kpi),
        None => row.kpi.clone(),
    };
    let mut record = Vec::with_capacity(row.cells.len() + 1);
    record.push(kpi.clone());
    record.extend(row.cells.iter().cloned());
    records.push(record);

    for child in &row.drill_down {
        push_records(child, Some(&kpi), records);
    }
}

/// The CSV-writing collaborator. Rows arrive shaped; the writer only writes.
#[cfg_attr(test, automock)]
pub trait CsvExporter: Send + Sync {
    fn export_to_csv(&self, table: &CsvTable, filename: &str) -> Result<PathBuf, ExportError>;
}

/// Writes exports as files under one output directory.
#[derive(Debug, Clone)]
pub struct FileCsvExporter {
    output_dir: PathBuf,
}

impl FileCsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl CsvExporter for FileCsvExporter {
    fn export_to_csv(&self, table: &CsvTable, filename: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(sanitize_filename(filename));

        let mut writer = csv::WriterBuilder::new().flexible(false).from_path(&path)?;
        writer.write_record(&table.headers)?;
        for record in &table.records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

/// Keeps a filename inside the output directory and makes it end in `.csv`.
pub fn sanitize_filename(filename: &str) -> String {
    let mut name: String = filename
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();
    name = name.trim_start_matches('.').to_string();
    if name.is_empty() {
        name = "export".to_string();
    }
    if !name.to_ascii_lowercase().ends_with(".csv") {
        name.push_str(".csv");
    }
    name
}
