//! Tabular aggregates and their textual rendering.
//!
//! A [`Table`] is the common shape every aggregate is converted into before
//! it reaches the report. Rendering prefers a markdown grid; if the table
//! cannot be expressed as one, it falls back to a `|`-delimited form that
//! keeps every cell value. The outcome is reported as a [`RenderedTable`]
//! so callers and tests can tell which path was taken.

use std::fmt;
use tabled::builder::Builder;
use tabled::settings::Style;
use thiserror::Error;
use tracing::warn;

/// Delimiter of the fallback rendering.
pub const FALLBACK_DELIMITER: u8 = b'|';

/// Reasons the markdown rendering can fail.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table has no columns")]
    NoColumns,

    #[error("row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cell at row {row}, column {column} spans multiple lines")]
    MultilineCell { row: usize, column: usize },

    #[error("delimited rendering failed: {0}")]
    Delimited(String),
}

/// A rendered table, tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedTable {
    /// Preferred markdown grid.
    Markdown(String),
    /// Delimiter-separated fallback.
    Delimited(String),
}

impl RenderedTable {
    pub fn as_str(&self) -> &str {
        match self {
            RenderedTable::Markdown(s) | RenderedTable::Delimited(s) => s,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RenderedTable::Delimited(_))
    }
}

impl fmt::Display for RenderedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled grid of string cells.
///
/// The first header entry names the index column; each row starts with its
/// index label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given header.
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row: an index label followed by the cells.
    pub fn push_row<I, S>(&mut self, label: impl Into<String>, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row = vec![label.into()];
        row.extend(cells.into_iter().map(Into::into));
        self.rows.push(row);
    }

    /// Every cell value in row-major order, header first.
    #[cfg(test)]
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.header
            .iter()
            .chain(self.rows.iter().flatten())
            .map(String::as_str)
    }

    /// Check that the table can be drawn as a markdown grid.
    fn check_markdown(&self) -> Result<(), TableError> {
        if self.header.is_empty() {
            return Err(TableError::NoColumns);
        }
        for (row, cells) in self.rows.iter().enumerate() {
            if cells.len() != self.header.len() {
                return Err(TableError::RaggedRow {
                    row,
                    expected: self.header.len(),
                    found: cells.len(),
                });
            }
            if let Some(column) = cells.iter().position(|c| c.contains(['\n', '\r'])) {
                return Err(TableError::MultilineCell { row, column });
            }
        }
        Ok(())
    }

    /// Preferred rendering as a markdown grid.
    pub fn to_markdown(&self) -> Result<String, TableError> {
        self.check_markdown()?;

        let mut builder = Builder::default();
        builder.push_record(self.header.iter().map(|c| escape_pipes(c)));
        for row in &self.rows {
            builder.push_record(row.iter().map(|c| escape_pipes(c)));
        }

        let mut table = builder.build();
        table.with(Style::markdown());
        Ok(table.to_string())
    }

    /// Fallback rendering: one line per row, cells separated by `|`.
    ///
    /// Ragged rows and multi-line cells are kept as-is (quoted when needed).
    pub fn to_delimited(&self) -> Result<String, TableError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(FALLBACK_DELIMITER)
            .flexible(true)
            .from_writer(Vec::new());

        writer
            .write_record(&self.header)
            .map_err(|e| TableError::Delimited(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| TableError::Delimited(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| TableError::Delimited(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| TableError::Delimited(e.to_string()))
    }

    /// Render, falling back to the delimited form if markdown fails.
    pub fn render(&self) -> Result<RenderedTable, TableError> {
        match self.to_markdown() {
            Ok(markdown) => Ok(RenderedTable::Markdown(markdown)),
            Err(e) => {
                warn!("Markdown table rendering failed ({}), using delimited form", e);
                self.to_delimited().map(RenderedTable::Delimited)
            }
        }
    }
}

fn escape_pipes(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// Format a statistic for a table cell.
///
/// Integral values print without decimals, others with up to four, and
/// undefined values as `NaN`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{:.0}", value);
    }
    let s = format!("{:.4}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
