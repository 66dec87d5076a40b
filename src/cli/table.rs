//! Table formatting utilities for CLI list commands
//!
//! List commands build [`TableRow`]s of typed [`CellValue`]s and hand them to
//! a [`TableFormatter`], which renders aligned text, CSV, Markdown or bare ids.

use chrono::{DateTime, Local, NaiveDate, Utc};
use console::{style, StyledObject};
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{qty, truncate_str};
use crate::cli::OutputFormat;

/// Colour a status word by what it means for the operator
pub fn status_style(word: &str) -> StyledObject<&str> {
    match word {
        "ok" | "active" | "completed" | "compliant" | "matched" | "approved" | "received"
        | "on_file" | "info" => style(word).green(),
        "low" | "expiring" | "warning" | "restricted" | "conditional" | "pending" | "draft"
        | "sent" | "partial" | "uploading" | "scanning" | "backorder" | "needs_attention"
        | "pending_review" => style(word).yellow(),
        "critical" | "out_of_stock" | "expired" | "failed" | "error" | "prohibited"
        | "discrepancy" | "rejected" | "disputed" | "missing" | "non_compliant" => {
            style(word).red().bold()
        }
        _ => style(word).dim(),
    }
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Entity ID (truncated and cyan in text output)
    Id(String),
    Text(String),
    /// Status word with colour coding
    Status(String),
    /// Quantity without trailing zeros
    Qty(f64),
    /// Two-decimal amount
    Money(f64),
    Int(i64),
    Date(DateTime<Utc>),
    Day(NaiveDate),
    Empty,
}

impl CellValue {
    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Empty,
        }
    }

    pub fn opt_money(value: Option<f64>) -> Self {
        value.map_or(CellValue::Empty, CellValue::Money)
    }

    /// Plain value, no colour or truncation
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) | CellValue::Status(s) => s.clone(),
            CellValue::Qty(v) => qty(*v),
            CellValue::Money(v) => format!("{:.2}", v),
            CellValue::Int(n) => n.to_string(),
            CellValue::Date(dt) => dt.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            CellValue::Day(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Empty => String::new(),
        }
    }

    fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => id.len().min(16),
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }

    /// Padded, coloured text for terminal output
    pub fn format_text(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                let display = if id.len() > 16 {
                    format!("{}...", &id[..13])
                } else {
                    id.clone()
                };
                format!("{:<width$}", style(display).cyan(), width = width)
            }
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width.saturating_sub(2)), width = width)
            }
            CellValue::Status(s) => format!("{:<width$}", status_style(s), width = width),
            CellValue::Qty(_) | CellValue::Money(_) | CellValue::Int(_) => {
                format!("{:>width$}", self.raw(), width = width)
            }
            CellValue::Date(_) | CellValue::Day(_) => {
                format!("{:<width$}", self.raw(), width = width)
            }
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Markdown cell with pipes escaped
    pub fn format_md(&self) -> String {
        match self {
            CellValue::Empty => "-".to_string(),
            other => other.raw().replace('|', "\\|"),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub full_id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(full_id: impl Into<String>) -> Self {
        Self {
            full_id: full_id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Output rows in the specified format. YAML and JSON are handled by the
    /// caller; here they fall back to text.
    pub fn output(&self, rows: Vec<TableRow>, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Csv => self.output_csv(&rows),
            OutputFormat::Md => {
                self.output_md(&rows);
                Ok(())
            }
            OutputFormat::Id => {
                for row in &rows {
                    println!("{}", row.full_id);
                }
                Ok(())
            }
            _ => {
                self.output_text(&rows);
                Ok(())
            }
        }
    }

    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header.len().max(content.saturating_add(2)).min(col.width)
            })
            .collect()
    }

    fn output_text(&self, rows: &[TableRow]) {
        let widths = self.widths(rows);
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        println!("{}", header.join(" "));
        let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        println!("{}", "-".repeat(total));

        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(v) => v.format_text(*w),
                    None => CellValue::Empty.format_text(*w),
                })
                .collect();
            println!("{}", cells.join(" "));
        }

        if self.show_summary {
            println!();
            println!("{} {}(s) found.", style(rows.len()).cyan(), self.entity_name);
        }
    }

    fn output_csv(&self, rows: &[TableRow]) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(std::io::stdout());
        wtr.write_record(self.columns.iter().map(|c| c.key))
            .into_diagnostic()?;
        for row in rows {
            wtr.write_record(
                self.columns
                    .iter()
                    .map(|c| row.get(c.key).map(CellValue::raw).unwrap_or_default()),
            )
            .into_diagnostic()?;
        }
        wtr.flush().into_diagnostic()
    }

    fn output_md(&self, rows: &[TableRow]) {
        println!("{}", self.markdown(rows));
    }

    fn markdown(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(
                self.columns
                    .iter()
                    .map(|c| row.get(c.key).map(CellValue::format_md).unwrap_or_else(|| "-".to_string())),
            );
        }
        let mut table = builder.build();
        table.with(Style::markdown());
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("sku", "SKU", 16),
        ColumnDef::new("status", "STATUS", 14),
        ColumnDef::new("qty", "ON HAND", 10),
    ];

    #[test]
    fn test_raw_values() {
        assert_eq!(CellValue::Qty(12.5).raw(), "12.5");
        assert_eq!(CellValue::Money(3.0).raw(), "3.00");
        assert_eq!(CellValue::opt_text(Some("")).raw(), "");
        assert_eq!(CellValue::Empty.format_md(), "-");
    }

    #[test]
    fn test_md_escapes_pipes() {
        assert_eq!(CellValue::Text("a|b".into()).format_md(), "a\\|b");
    }

    #[test]
    fn test_table_row_builder() {
        let row = TableRow::new("INV-123")
            .cell("sku", CellValue::Text("KELP-01".into()))
            .cell("status", CellValue::Status("low".into()));
        assert_eq!(row.full_id, "INV-123");
        assert!(row.get("sku").is_some());
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_markdown_has_header_and_rows() {
        let rows = vec![TableRow::new("INV-1")
            .cell("sku", CellValue::Text("KELP-01".into()))
            .cell("qty", CellValue::Qty(40.0))];
        let md = TableFormatter::new(COLUMNS, "item").markdown(&rows);
        assert!(md.contains("| SKU"));
        assert!(md.contains("KELP-01"));
        assert!(md.contains("40"));
    }

    #[test]
    fn test_widths_capped() {
        let rows = vec![TableRow::new("INV-1").cell("sku", CellValue::Text("X".repeat(40)))];
        let widths = TableFormatter::new(COLUMNS, "item").widths(&rows);
        assert_eq!(widths[0], 16);
        assert_eq!(widths[1], "STATUS".len());
    }
}
