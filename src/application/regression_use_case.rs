// ============================================================
// Layer 2 — Regression Use Case
// ============================================================
// Fits a least-absolute-deviation line to the wine quality data:
//
//   Step 1: Load the ';'-delimited CSV     (Layer 4 - data)
//   Step 2: Split first N rows / the rest  (Layer 4 - data)
//   Step 3: Solve the LP on the train rows (Layer 5 - ml)
//   Step 4: Score both splits              (Layer 5 - ml)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{splitter::split_at_count, wine_loader::WineCsvLoader};
use crate::domain::traits::DatasetSource;
use crate::ml::lad::{evaluate, fit_lad, ErrorSummary, LadFit};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressConfig {
    pub data_path: String,
    pub train_samples: usize,
}

impl Default for RegressConfig {
    fn default() -> Self {
        Self {
            data_path: "winequality-red.csv".to_string(),
            train_samples: 1500,
        }
    }
}

/// Everything the CLI prints after a fit
#[derive(Debug, Clone)]
pub struct RegressionReport {
    pub fit: LadFit,
    pub train: ErrorSummary,
    pub test: Option<ErrorSummary>,
}

pub struct RegressUseCase {
    config: RegressConfig,
}

impl RegressUseCase {
    pub fn new(config: RegressConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RegressionReport> {
        let cfg = &self.config;

        // ── Step 1: Load ─────────────────────────────────────────────────────
        let samples = WineCsvLoader::new(&cfg.data_path).load_all()?;
        tracing::info!("Loaded {} rows from '{}'", samples.len(), cfg.data_path);

        // ── Step 2: Split ────────────────────────────────────────────────────
        let (train, test) = split_at_count(samples, cfg.train_samples)?;

        // ── Step 3: Solve ────────────────────────────────────────────────────
        let fit = fit_lad(&train)?;
        tracing::info!("LP solved, optimal value {:.6}", fit.objective);

        // ── Step 4: Score ────────────────────────────────────────────────────
        let train_summary = evaluate(&fit, &train)?;
        let test_summary = if test.is_empty() {
            tracing::warn!("No rows left for the test split");
            None
        } else {
            Some(evaluate(&fit, &test)?)
        };

        Ok(RegressionReport { fit, train: train_summary, test: test_summary })
    }
}
