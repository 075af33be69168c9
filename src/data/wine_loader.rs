// ============================================================
// Layer 4 — Wine CSV Loader
// ============================================================
// Loads the wine quality table using the csv crate.
//
// File layout (semicolon separated, one header row):
//   "fixed acidity";"volatile acidity";...;"alcohol";"quality"
//   7.4;0.7;0;1.9;0.076;11;34;0.9978;3.51;0.56;9.4;5
//
// Every column must parse as a number. The last column is the
// quality score, all columns before it are features.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{ensure, Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::sample::WineSample;
use crate::domain::traits::DatasetSource;

/// Loads every row of a `;`-delimited wine CSV file.
pub struct WineCsvLoader {
    path: PathBuf,
}

impl WineCsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for WineCsvLoader {
    type Item = WineSample;

    fn load_all(&self) -> Result<Vec<WineSample>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open wine data '{}'", self.path.display()))?;

        let mut samples = Vec::new();
        for (index, record) in reader.records().enumerate() {
            // +2: one for the header row, one for 1-based line numbers
            let line = index + 2;
            let record = record
                .with_context(|| format!("Malformed CSV record on line {line}"))?;
            samples.push(parse_record(&record, line, &self.path)?);
        }

        tracing::info!(
            "Loaded {} wine samples from '{}'",
            samples.len(),
            self.path.display()
        );
        Ok(samples)
    }
}

/// Convert one CSV record into a WineSample
fn parse_record(record: &csv::StringRecord, line: usize, path: &Path) -> Result<WineSample> {
    let values = record
        .iter()
        .map(|field| {
            field.trim().parse::<f64>().with_context(|| {
                format!("Non-numeric value '{field}' on line {line} of '{}'", path.display())
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    ensure!(
        values.len() >= 2,
        "Line {line} has {} columns; need at least one feature and a quality score",
        values.len()
    );

    let (features, quality) = values.split_at(values.len() - 1);
    Ok(WineSample::new(features.to_vec(), quality[0]))
}
