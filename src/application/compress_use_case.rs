// ============================================================
// Layer 2 — Compression Use Case
// ============================================================
// Compresses one image with a truncated SVD:
//
//   Step 1: Read + convert to 8-bit grayscale   (Layer 4 - data)
//   Step 2: Write original_image.png            (Layer 4 - data)
//   Step 3: Rank of the pixel matrix            (Layer 5 - ml)
//   Step 4: Rank-k reconstruction               (Layer 5 - ml)
//   Step 5: Write rank_<k>_approx_image.png     (Layer 4 - data)

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::image_io::{load_grayscale, save_grayscale};
use crate::ml::low_rank::{
    image_to_matrix, matrix_to_image, numerical_rank, rank_k_approximation, storage_ratio,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressConfig {
    pub image_path: String,
    pub output_dir: String,
    pub rank: usize,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            image_path: "image.jpg".to_string(),
            output_dir: ".".to_string(),
            rank: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub rows: usize,
    pub cols: usize,
    pub original_rank: usize,
    /// The rank actually used, after clamping
    pub k: usize,
    pub approx_rank: usize,
    pub storage_ratio: f64,
    pub original_path: PathBuf,
    pub approx_path: PathBuf,
}

pub struct CompressUseCase {
    config: CompressConfig,
}

impl CompressUseCase {
    pub fn new(config: CompressConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<CompressionReport> {
        let cfg = &self.config;
        ensure!(cfg.rank > 0, "Rank k must be at least 1");

        let out_dir = PathBuf::from(&cfg.output_dir);
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Cannot create '{}'", out_dir.display()))?;

        // ── Step 1-2: Grayscale original ─────────────────────────────────────
        let gray = load_grayscale(Path::new(&cfg.image_path))?;
        let original_path = out_dir.join("original_image.png");
        save_grayscale(&gray, &original_path)?;

        // ── Step 3: Rank ─────────────────────────────────────────────────────
        let matrix = image_to_matrix(&gray);
        let (rows, cols) = matrix.shape();
        let original_rank = numerical_rank(&matrix);

        // ── Step 4: Rank-k approximation ─────────────────────────────────────
        let max_k = rows.min(cols);
        let k = if cfg.rank > max_k {
            tracing::warn!("Rank {} exceeds min(rows, cols) = {max_k}; using {max_k}", cfg.rank);
            max_k
        } else {
            cfg.rank
        };
        let approx = rank_k_approximation(&matrix, k)?;
        let approx_rank = numerical_rank(&approx);

        let ratio = storage_ratio(rows, cols, k);
        tracing::info!("Rank-{k} factors need {:.1}% of the original storage", ratio * 100.0);

        // ── Step 5: Write the approximation ──────────────────────────────────
        let approx_path = out_dir.join(format!("rank_{k}_approx_image.png"));
        save_grayscale(&matrix_to_image(&approx), &approx_path)?;

        Ok(CompressionReport {
            rows,
            cols,
            original_rank,
            k,
            approx_rank,
            storage_ratio: ratio,
            original_path,
            approx_path,
        })
    }
}
