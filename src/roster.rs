//! Roster import pipeline: CSV decode → header reconciliation → per-row insert.
//!
//! The whole file is decoded before anything is written, so a malformed CSV
//! leaves the store untouched. After that each row is inserted on its own;
//! a rejected row is recorded in the [`ImportSummary`] and the import moves
//! on. The summary reports how many rows were actually committed.

use serde::Serialize;
use sqlx::SqlitePool;
use std::io::Read;
use std::path::Path;

use crate::error::ScoutResult;
use crate::players;
use crate::reconcile::{reconcile_row, RawRow};

/// A row that could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// 1-based data row number (the header line is not counted).
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Data rows decoded from the file, blank rows included.
    pub rows_read: usize,
    /// Rows committed to the store.
    pub inserted: usize,
    /// Rows with no value in any column; not inserted.
    pub skipped: usize,
    pub failed: Vec<RowFailure>,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!("Uploaded {} players", self.inserted)
    }
}

/// Decode CSV text into header-keyed rows.
///
/// The first record is the header. Short records yield only the columns
/// they have; cells beyond the header width are dropped.
pub fn read_rows<R: Read>(reader: R) -> ScoutResult<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Import every row of a CSV stream into the `players` table.
pub async fn import_roster<R: Read>(pool: &SqlitePool, reader: R) -> ScoutResult<ImportSummary> {
    let rows = read_rows(reader)?;

    let mut summary = ImportSummary {
        rows_read: rows.len(),
        ..Default::default()
    };

    let mut row_numbers = Vec::with_capacity(rows.len());
    let mut batch = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if row.is_empty() {
            summary.skipped += 1;
            continue;
        }
        row_numbers.push(i + 1);
        batch.push(reconcile_row(row));
    }

    let outcomes = players::insert_batch(pool, &batch).await;
    for (row, outcome) in row_numbers.into_iter().zip(outcomes) {
        match outcome {
            Ok(_) => summary.inserted += 1,
            Err(e) => summary.failed.push(RowFailure {
                row,
                reason: e.to_string(),
            }),
        }
    }

    log::info!(
        "roster import: {} rows read, {} inserted, {} skipped, {} failed",
        summary.rows_read,
        summary.inserted,
        summary.skipped,
        summary.failed.len()
    );
    Ok(summary)
}

/// Import a CSV file from disk.
///
/// With `remove` set the file is deleted afterwards, whether or not the
/// import succeeded. A failed delete is logged and otherwise ignored.
pub async fn import_file(pool: &SqlitePool, path: &Path, remove: bool) -> ScoutResult<ImportSummary> {
    let result = match tokio::fs::read(path).await {
        Ok(bytes) => import_roster(pool, bytes.as_slice()).await,
        Err(e) => Err(e.into()),
    };

    if remove {
        if let Err(e) = tokio::fs::remove_file(path).await {
            log::warn!("could not delete uploaded file {}: {}", path.display(), e);
        }
    }

    result
}
