//! # AstroImageJ measurement tables
//!
//! Reads the tab-separated photometry tables produced by AstroImageJ into
//! named numeric columns. Only the columns the pipeline consumes are given
//! any meaning (`Source_Radius`, `JD_UTC`, `EXPTIME`/`EXPOSURE`); everything
//! else is carried as plain numbers and ignored.
//!
//! Cells that are empty or non-numeric become NaN, so downstream statistics
//! can skip them without losing row alignment.

use camino::Utf8Path;

use crate::errors::Sg1Error;

/// Per-row exposure duration may live in either of these columns; the first
/// one present wins.
pub const EXPOSURE_COLUMNS: [&str; 2] = ["EXPTIME", "EXPOSURE"];

/// One measurement table held column-major.
#[derive(Debug, Clone)]
pub struct MeasurementTable {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
    row_count: usize,
}

impl MeasurementTable {
    /// Read a tab-separated table with a single header row.
    pub fn read(path: &Utf8Path) -> Result<Self, Sg1Error> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        let mut row_count = 0;
        for record in reader.records() {
            let record = record?;
            for (i, column) in columns.iter_mut().enumerate() {
                let value = record
                    .get(i)
                    .and_then(|cell| cell.trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN);
                column.push(value);
            }
            row_count += 1;
        }

        Ok(MeasurementTable {
            headers,
            columns,
            row_count,
        })
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Column values by header name, `None` when the column does not exist.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// The per-row exposure column, trying [`EXPOSURE_COLUMNS`] in order.
    pub fn exposure_column(&self) -> Option<&[f64]> {
        EXPOSURE_COLUMNS.iter().find_map(|name| self.column(name))
    }

    #[cfg(test)]
    pub(crate) fn from_columns(columns: Vec<(&str, Vec<f64>)>) -> Self {
        let row_count = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        MeasurementTable {
            headers: columns.iter().map(|(n, _)| n.to_string()).collect(),
            columns: columns.into_iter().map(|(_, v)| v).collect(),
            row_count,
        }
    }
}
