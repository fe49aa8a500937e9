//! Batch encode and decode over mask directories and RLE tables.

use log::{error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::{apply_batch, DispatchPolicy};
use crate::error::{Error, Result};
use crate::io::{list_mask_files, mask_output_path, read_mask, write_mask};
use crate::rle;
use crate::table::{read_table, write_records, TableColumns, TableRow};
use crate::types::{BinaryMask, ProcessingStats, RunLengthRecord};
use crate::utils::{dir_display_name, ensure_output_directory};

/// Outcome of one batch: successful outputs in input order plus per-item failures.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub outputs: Vec<T>,
    /// `(index, error)` where `index` is the item's position in the batch input
    pub failures: Vec<(usize, Error)>,
    pub stats: ProcessingStats,
}

impl<T> BatchReport<T> {
    fn new() -> Self {
        Self {
            outputs: Vec::new(),
            failures: Vec::new(),
            stats: ProcessingStats::new(),
        }
    }

    fn record(&mut self, index: usize, result: Result<T>) {
        self.stats.increment_total();
        match result {
            Ok(output) => {
                self.stats.increment_succeeded();
                self.outputs.push(output);
            }
            Err(e) => {
                self.stats.increment_failed();
                self.failures.push((index, e));
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Default table location for a mask directory: `rle_of_<dir name>.csv` in the working directory
pub fn default_encode_output(dirname: &Path) -> PathBuf {
    let resolved = fs::canonicalize(dirname).unwrap_or_else(|_| dirname.to_path_buf());
    PathBuf::from(format!("rle_of_{}.csv", dir_display_name(&resolved)))
}

/// Default mask directory for a table: `masks_of_<table stem>` beside the table
pub fn default_decode_output(table: &Path) -> PathBuf {
    let stem = table
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    table
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("masks_of_{}", stem))
}

/// Encode every recognized mask file in `dirname`, in file name order.
///
/// Files outside the recognized extension set are skipped and counted. Unreadable
/// files are reported as failures without affecting the rest of the batch.
pub fn encode_directory(
    dirname: &Path,
    policy: &DispatchPolicy,
) -> Result<BatchReport<RunLengthRecord>> {
    let listing = list_mask_files(dirname)?;
    info!(
        "Found {} mask file(s) in {}",
        listing.masks.len(),
        dirname.display()
    );

    let results = apply_batch(listing.masks.clone(), policy, "Encode", |path| {
        encode_file(&path)
    })?;

    let mut report = BatchReport::new();
    for path in &listing.unsupported {
        warn!("Skipping unsupported file {}", path.display());
        report.stats.increment_skipped_unsupported();
    }
    for (index, result) in results.into_iter().enumerate() {
        report.record(index, result);
    }
    log_failures(&report, |index| listing.masks[index].display().to_string());
    Ok(report)
}

fn encode_file(path: &Path) -> Result<RunLengthRecord> {
    let mask = read_mask(path)?;
    let image_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::UnsupportedFile(path.to_path_buf()))?;
    Ok(RunLengthRecord {
        image_name,
        rle: rle::encode(&mask),
        shape: mask.shape(),
    })
}

/// Encode a mask directory and persist the records as a CSV table at `output`.
pub fn run_encode_batch(
    dirname: &Path,
    output: &Path,
    policy: &DispatchPolicy,
) -> Result<BatchReport<RunLengthRecord>> {
    let report = encode_directory(dirname, policy)?;
    write_records(output, &report.outputs)?;
    info!(
        "Wrote {} record(s) to {}",
        report.outputs.len(),
        output.display()
    );
    report.stats.print_summary();
    Ok(report)
}

/// Decode one table row into a mask; rows without an annotation become empty masks.
pub fn decode_row(row: &TableRow) -> Result<BinaryMask> {
    Ok(rle::decode(row.rle.as_deref().unwrap_or_default(), row.shape)?)
}

/// Rebuild mask images from a table and write them under `output_dir`.
///
/// A missing column aborts before any mask is written. Unparseable rows, malformed
/// encodings and write failures are collected per row.
pub fn run_decode_batch(
    table: &Path,
    columns: &TableColumns,
    output_dir: &Path,
    policy: &DispatchPolicy,
) -> Result<BatchReport<PathBuf>> {
    let rows = read_table(table, columns)?;
    info!("Read {} row(s) from {}", rows.len(), table.display());
    ensure_output_directory(output_dir)?;

    let mut report = BatchReport::new();
    let mut names = vec![String::new(); rows.len()];
    let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
    let mut pending = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                report.record(index, Err(e));
                continue;
            }
        };
        names[index] = row.image_name.clone();

        // The first row naming an output file owns it
        let path = mask_output_path(output_dir, &row.image_name);
        if let Some(&first_row) = claimed.get(&path) {
            report.record(index, Err(Error::DuplicateOutput { path, first_row }));
            continue;
        }
        claimed.insert(path.clone(), index);
        pending.push((index, row, path));
    }

    let indices: Vec<usize> = pending.iter().map(|(index, _, _)| *index).collect();
    let results = apply_batch(pending, policy, "Decode", |(_, row, path)| {
        let mask = decode_row(&row)?;
        write_mask(&mask, &path)?;
        Ok::<_, Error>(path)
    })?;
    for (index, result) in indices.into_iter().zip(results) {
        report.record(index, result);
    }
    report.failures.sort_by_key(|(index, _)| *index);

    log_failures(&report, |index| format!("row {} ({})", index, names[index]));
    info!(
        "Wrote {} mask(s) to {}",
        report.outputs.len(),
        output_dir.display()
    );
    report.stats.print_summary();
    Ok(report)
}

fn log_failures<T>(report: &BatchReport<T>, describe: impl Fn(usize) -> String) {
    for (index, e) in &report.failures {
        error!("Failed to process {}: {}", describe(*index), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encode_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let masks_dir = temp_dir.path().join("train_masks");
        fs::create_dir(&masks_dir).unwrap();

        assert_eq!(
            default_encode_output(&masks_dir),
            PathBuf::from("rle_of_train_masks.csv")
        );
        assert_eq!(
            default_encode_output(&masks_dir.join("..").join("train_masks")),
            PathBuf::from("rle_of_train_masks.csv")
        );
        assert_eq!(
            default_encode_output(Path::new("missing/val_masks")),
            PathBuf::from("rle_of_val_masks.csv")
        );
    }

    #[test]
    fn test_default_decode_output() {
        assert_eq!(
            default_decode_output(Path::new("data/rle_of_masks.csv")),
            Path::new("data").join("masks_of_rle_of_masks")
        );
        assert_eq!(
            default_decode_output(Path::new("labels.csv")),
            PathBuf::from("masks_of_labels")
        );
    }
}
