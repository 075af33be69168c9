// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file, one row per report.
//
// Why log metrics to CSV?
//   - Easy to open in a spreadsheet
//   - Can plot learning curves to diagnose training issues
//   - Provides a permanent record of each training run
//
// Rows are any serde-serialisable struct; the csv crate takes
// the column names from the field names. Two row types are
// logged by this tool:
//
//   EvalRow  (classify)   loop,train_loss,train_accuracy,test_loss,test_accuracy
//   LossRow  (translate)  step,average_loss,elapsed_secs
//
// The file is opened in append mode, so a resumed run keeps
// adding to the same log. The header is only written when the
// file is new.
//
// Reference: csv crate documentation (Writer::serialize)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

/// One evaluation report of the image classifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalRow {
    pub loop_index: usize,
    pub train_loss: f64,
    /// Percent, 0..=100
    pub train_accuracy: f64,
    pub test_loss: f64,
    /// Percent, 0..=100
    pub test_accuracy: f64,
}

/// One loss report of the translator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossRow {
    pub step: usize,
    pub average_loss: f64,
    pub elapsed_secs: f64,
}

/// Appends serialisable rows to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
    writer: csv::Writer<File>,
}

impl MetricsLogger {
    /// Open (or create) `{dir}/{file_name}` for appending.
    pub fn new(dir: &Path, file_name: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        let csv_path = dir.join(file_name);

        let is_new = fs::metadata(&csv_path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&csv_path)
            .with_context(|| format!("Cannot open metrics file '{}'", csv_path.display()))?;

        let writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        if is_new {
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path, writer })
    }

    /// Append one row and flush it to disk
    pub fn log<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.writer
            .serialize(row)
            .with_context(|| format!("Cannot write to '{}'", self.csv_path.display()))?;
        self.writer.flush()?;
        Ok(())
    }
}
