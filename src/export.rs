//! Text and CSV renderings of the results table.
//!
//! Both formats read cached cell text in the current visual row order, so an
//! export always matches what the table shows.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::columns::ColumnDescriptor;
use crate::format::pad;
use crate::models::AnalysisSummary;
use crate::table::ResultTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported export file type: {}", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportFormat {
    /// Choose the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt") => Ok(ExportFormat::Text),
            Some("csv") => Ok(ExportFormat::Csv),
            _ => Err(ExportError::UnsupportedExtension(path.to_path_buf())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Render the table as CSV: `#` comment lines with run statistics, a quoted
/// header row, then one CRLF-terminated line per visible row.
pub fn render_csv(
    columns: &[ColumnDescriptor],
    table: &ResultTable,
    order: &[usize],
    summary: &AnalysisSummary,
) -> Vec<u8> {
    let mut output = String::new();

    for line in summary.lines() {
        output.push_str("# ");
        output.push_str(&line);
        output.push_str("\r\n");
    }

    let header: Vec<String> = columns.iter().map(|c| quote(c.name)).collect();
    output.push_str(&header.join(","));
    output.push_str("\r\n");

    for &row in order {
        let fields: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(ci, column)| {
                let text = table.cell(ci, row);
                if column.right_aligned() {
                    text.to_string()
                } else {
                    quote(text)
                }
            })
            .collect();
        output.push_str(&fields.join(","));
        output.push_str("\r\n");
    }

    output.into_bytes()
}

/// Render the table as fixed-width text: run statistics, a header line, a
/// dash separator sized to each column, then the rows. Numbers are
/// right-aligned, text left-aligned.
pub fn render_text(
    columns: &[ColumnDescriptor],
    table: &ResultTable,
    order: &[usize],
    summary: &AnalysisSummary,
) -> Vec<u8> {
    let widths = table.widths();
    let mut output = String::new();

    for line in summary.lines() {
        output.push_str(&line);
        output.push('\n');
    }
    output.push('\n');

    let header: Vec<&str> = columns.iter().map(|column| column.name).collect();
    push_cells(&mut output, columns, widths, &header);

    let separator: Vec<String> = widths.iter().map(|&width| "-".repeat(width)).collect();
    output.push_str(&separator.join("  "));
    output.push('\n');

    for &row in order {
        push_cells(&mut output, columns, widths, &table.row(row));
    }

    output.into_bytes()
}

pub fn render(
    format: ExportFormat,
    columns: &[ColumnDescriptor],
    table: &ResultTable,
    order: &[usize],
    summary: &AnalysisSummary,
) -> Vec<u8> {
    match format {
        ExportFormat::Text => render_text(columns, table, order, summary),
        ExportFormat::Csv => render_csv(columns, table, order, summary),
    }
}

/// Render in the format implied by `path` and write it there.
pub fn write_export(
    path: &Path,
    columns: &[ColumnDescriptor],
    table: &ResultTable,
    order: &[usize],
    summary: &AnalysisSummary,
) -> Result<ExportFormat, ExportError> {
    let format = ExportFormat::from_path(path)?;
    let content = render(format, columns, table, order, summary);
    std::fs::write(path, content).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format)
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Append one fixed-width line. A left-aligned last column is not padded,
/// so the line carries no trailing padding while cell text stays intact.
fn push_cells(output: &mut String, columns: &[ColumnDescriptor], widths: &[usize], texts: &[&str]) {
    let last = columns.len().saturating_sub(1);
    let cells: Vec<String> = columns
        .iter()
        .zip(widths)
        .zip(texts)
        .enumerate()
        .map(|(ci, ((column, &width), text))| {
            if ci == last && !column.right_aligned() {
                text.to_string()
            } else {
                pad(text, width, column.right_aligned())
            }
        })
        .collect();
    output.push_str(&cells.join("  "));
    output.push('\n');
}
