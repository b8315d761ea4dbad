//! CSV ingest with complete-case filtering.
//!
//! The analysis reads one wide table of county-period rows. Only the columns a
//! run asks for are parsed; every other column is ignored.
//!
//! - Header names are trimmed, BOM-stripped and lower-cased before matching.
//! - A row with an empty / `NA` / `NaN` cell in any requested column is
//!   dropped (complete-case analysis) and counted.
//! - A row with a non-numeric cell in a requested column is dropped and
//!   reported as a `RowError`.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use log::{debug, warn};

use crate::domain::Dataset;
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the complete-case dataset plus accounting.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Rows dropped for a missing value in a requested column.
    pub rows_incomplete: usize,
    pub row_errors: Vec<RowError>,
}

/// Load the requested columns of a CSV file.
///
/// Column names in the returned dataset are the normalized (lower-case)
/// versions of `columns`.
pub fn load_dataset(path: &Path, columns: &[String]) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let mut wanted: Vec<(String, usize)> = Vec::with_capacity(columns.len());
    for name in columns {
        let key = normalize_header_name(name);
        if wanted.iter().any(|(k, _)| *k == key) {
            continue;
        }
        let idx = *header_map
            .get(&key)
            .ok_or_else(|| AppError::new(2, format!("Missing required column: `{key}`")))?;
        wanted.push((key, idx));
    }

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); wanted.len()];
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_incomplete = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &wanted) {
            Ok(Some(row)) => {
                for (col, v) in values.iter_mut().zip(row) {
                    col.push(v);
                }
            }
            Ok(None) => rows_incomplete += 1,
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = values.first().map_or(0, Vec::len);
    if rows_incomplete > 0 {
        warn!("Dropped {rows_incomplete} of {rows_read} rows with missing values (complete-case filter)");
    }
    if !row_errors.is_empty() {
        warn!("Skipped {} rows with unparseable values", row_errors.len());
    }
    if rows_used == 0 {
        return Err(AppError::new(
            3,
            "No complete rows remain after filtering.",
        ));
    }
    debug!("Loaded {rows_used} rows x {} columns from '{}'", wanted.len(), path.display());

    let dataset = Dataset::new(
        wanted
            .into_iter()
            .map(|(name, _)| name)
            .zip(values)
            .collect::<Vec<(String, Vec<f64>)>>(),
    )?;

    Ok(IngestedData {
        dataset,
        rows_read,
        rows_used,
        rows_incomplete,
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan")
}

/// `Ok(None)` for an incomplete row.
fn parse_row(record: &StringRecord, wanted: &[(String, usize)]) -> Result<Option<Vec<f64>>, String> {
    let mut row = Vec::with_capacity(wanted.len());
    let mut incomplete = false;
    for (name, idx) in wanted {
        let raw = record.get(*idx).unwrap_or("");
        if is_missing(raw) {
            incomplete = true;
            continue;
        }
        let v: f64 = raw
            .parse()
            .map_err(|_| format!("Invalid number in `{name}`: '{raw}'"))?;
        if !v.is_finite() {
            incomplete = true;
            continue;
        }
        row.push(v);
    }
    Ok(if incomplete { None } else { Some(row) })
}
