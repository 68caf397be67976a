//! CLI command messaging system
//!
//! Consistent console output for the one-shot commands: tagged status lines
//! plus a plain-text rendering of the metrics grid.

use crate::series::{TableRow, TableView};

/// Print CLI command info message
pub fn print_info(title: &str, details: &str) {
    print!("\x1b[1;33m[INFO]\x1b[0m {}", title);
    if !details.is_empty() {
        println!("\t {}", details);
    } else {
        println!();
    }
}

/// Print CLI command warn message
pub fn print_warn(title: &str, details: &str) {
    print!("\x1b[1;91m[WARN]\x1b[0m {}", title);
    if !details.is_empty() {
        println!("\t {}", details);
    } else {
        println!();
    }
}

/// Print CLI command error to stderr
pub fn print_error(title: &str, details: Option<&str>) {
    eprintln!("\x1b[1;31m[ERROR]\x1b[0m {}", title);
    if let Some(details) = details {
        eprintln!("\x1b[1;31m[ERROR]\x1b[0m Details: {}", details);
    }
}

/// Print CLI command success
pub fn print_success(title: &str, details: &str) {
    print!("\x1b[1;32m[SUCCESS]\x1b[0m {}", title);
    if !details.is_empty() {
        println!("\t {}", details);
    } else {
        println!();
    }
}

pub fn print_table(table: &TableView) {
    println!("{}", render_table(table));
}

/// Aligned text grid. Drill-down rows are indented under their parent.
pub fn render_table(table: &TableView) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    let mut header = vec!["KPI".to_string()];
    header.extend(table.columns.iter().cloned());
    lines.push(header);
    for row in &table.rows {
        push_lines(row, 0, &mut lines);
    }

    let mut widths = vec![0; header_len(&lines)];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    lines
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn header_len(lines: &[Vec<String>]) -> usize {
    lines.first().map(Vec::len).unwrap_or(0)
}

fn push_lines(row: &TableRow, depth: usize, lines: &mut Vec<Vec<String>>) {
    let mut line = vec![format!("{}{}", "  ".repeat(depth), row.kpi)];
    line.extend(row.cells.iter().cloned());
    lines.push(line);
    for child in &row.drill_down {
        push_lines(child, depth + 1, lines);
    }
}

/// Macro for print_cmd_info! usage
#[macro_export]
macro_rules! print_cmd_info {
    ($title:expr, $($details:tt)*) => {
        $crate::cli_messages::print_info($title, &format!($($details)*))
    };
}

/// Macro for print_cmd_warn! usage
#[macro_export]
macro_rules! print_cmd_warn {
    ($title:expr, $($details:tt)*) => {
        $crate::cli_messages::print_warn($title, &format!($($details)*))
    };
}

/// Macro for CLI errors
#[macro_export]
macro_rules! print_cmd_error {
    ($title:expr) => {
        $crate::cli_messages::print_error($title, None)
    };
    ($title:expr, $details:expr) => {
        $crate::cli_messages::print_error($title, Some($details))
    };
}

/// Macro for CLI success messages
#[macro_export]
macro_rules! print_cmd_success {
    ($title:expr, $($details:tt)*) => {
        $crate::cli_messages::print_success($title, &format!($($details)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kpi: &str, cells: &[&str], drill_down: Vec<TableRow>) -> TableRow {
        TableRow {
            kpi: kpi.to_string(),
            cells: cells.iter().map(|c| c.to_string()).collect(),
            drill_down,
        }
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = TableView {
            columns: vec!["2024".to_string(), "2025".to_string()],
            rows: vec![
                row("Commits", &["120", "98"], vec![row("Team A", &["60", "40"], vec![])]),
                row("Lead Time", &["2d", "1.5d"], vec![]),
            ],
        };
        let expected = [
            "KPI        2024  2025",
            "Commits    120   98",
            "  Team A   60    40",
            "Lead Time  2d    1.5d",
        ]
        .join("\n");
        assert_eq!(render_table(&table), expected);
    }

    #[test]
    fn test_render_empty_table_keeps_header() {
        assert_eq!(render_table(&TableView::default()), "KPI");
    }
}
