//! Cached cell text for the results grid.

use crate::columns::ColumnDescriptor;
use crate::format::text_width;
use crate::models::ResultRecord;

/// Per-column display text, positionally aligned with record storage order.
///
/// This is the single source of truth for both on-screen cells and exported
/// text. It never reflects the visual sort order; callers pass a row
/// permutation when they need one.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    cells: Vec<Vec<String>>,
    widths: Vec<usize>,
    rows: usize,
}

impl ResultTable {
    /// Build the cache for `columns` over `records`.
    pub fn build(columns: &[ColumnDescriptor], records: &[ResultRecord]) -> Self {
        let cells: Vec<Vec<String>> = columns
            .iter()
            .map(|column| {
                records
                    .iter()
                    .enumerate()
                    .map(|(position, record)| column.text_of(position, record))
                    .collect()
            })
            .collect();

        let widths = columns
            .iter()
            .zip(&cells)
            .map(|(column, texts)| {
                texts
                    .iter()
                    .map(|text| text_width(text))
                    .fold(text_width(column.name), usize::max)
            })
            .collect();

        Self {
            cells,
            widths,
            rows: records.len(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.cells.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Cached text of one cell, addressed by storage position.
    pub fn cell(&self, column: usize, row: usize) -> &str {
        &self.cells[column][row]
    }

    /// Cached texts of one row, in column order.
    pub fn row(&self, row: usize) -> Vec<&str> {
        self.cells.iter().map(|column| column[row].as_str()).collect()
    }

    /// Character width needed by each column: the longest of its header
    /// and every cached cell.
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }
}
