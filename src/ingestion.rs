use crate::config::HeaderLocator;
use crate::error::{Result, SectionParseError};
use crate::normalize::normalize_column_name;
use crate::schema::{CellValue, RawRow};
use log::debug;
use std::collections::HashMap;

/// Finds the first grid row whose cell in the locator column matches.
///
/// This is the only fatal condition of a parse: without a header row the
/// input is not a report of the expected shape.
pub fn locate_header_row(grid: &[Vec<CellValue>], locator: &HeaderLocator) -> Result<usize> {
    grid.iter()
        .position(|row| {
            row.get(locator.column)
                .map(|cell| locator.matcher.matches(&cell.as_text()))
                .unwrap_or(false)
        })
        .ok_or_else(|| SectionParseError::HeaderRowNotFound {
            column: locator.column,
            pattern: locator.matcher.describe(),
        })
}

/// Rows below the header row, keyed by normalized column name.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl Table {
    pub fn from_grid(grid: &[Vec<CellValue>], locator: &HeaderLocator) -> Result<Self> {
        let header_idx = locate_header_row(grid, locator)?;
        debug!("Header row located at grid row {}", header_idx);
        Ok(Self::from_header_row(grid, header_idx))
    }

    /// Uses `grid[header_idx]` as column names. Fully blank rows and columns
    /// below the header are dropped.
    pub fn from_header_row(grid: &[Vec<CellValue>], header_idx: usize) -> Self {
        let empty: &[CellValue] = &[];
        let header = grid.get(header_idx).map(Vec::as_slice).unwrap_or(empty);
        let body: Vec<&Vec<CellValue>> = grid
            .iter()
            .skip(header_idx + 1)
            .filter(|row| row.iter().any(|cell| !cell.is_blank()))
            .collect();

        let width = body
            .iter()
            .map(|row| row.len())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let kept: Vec<usize> = (0..width)
            .filter(|&col| {
                body.iter()
                    .any(|row| row.get(col).map(|cell| !cell.is_blank()).unwrap_or(false))
            })
            .collect();

        let mut seen: HashMap<String, usize> = HashMap::new();
        let columns: Vec<String> = kept
            .iter()
            .map(|&col| {
                let raw = header
                    .get(col)
                    .map(|cell| normalize_column_name(&cell.as_text()))
                    .unwrap_or_default();
                let name = if raw.is_empty() {
                    format!("unnamed_{}", col)
                } else {
                    raw
                };

                let count = seen.entry(name.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    name
                } else {
                    format!("{}_{}", name, *count - 1)
                }
            })
            .collect();

        let rows = body
            .iter()
            .map(|row| {
                kept.iter()
                    .zip(&columns)
                    .map(|(&col, name)| (name.clone(), row.get(col).cloned().unwrap_or_default()))
                    .collect::<RawRow>()
            })
            .collect();

        Self { columns, rows }
    }

    /// Wraps rows that were already keyed by column name.
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RawRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
