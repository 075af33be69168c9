// ============================================================
// Layer 5 — Least Absolute Deviation Regression
// ============================================================
// Fits  quality ≈ a · features + b  by minimising the mean
// absolute error, written as a linear program:
//
//   minimise    (1/n) Σ z_i
//   subject to  y_i - a·x_i - b <=  z_i      for every row i
//               y_i - a·x_i - b >= -z_i
//               z_i >= 0,  a and b free
//
// At the optimum z_i = |y_i - a·x_i - b|, so the objective is
// exactly the mean absolute training error.
//
// The simplex work is done by the `minilp` crate.

use anyhow::{anyhow, ensure, Result};
use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem};

use crate::domain::sample::WineSample;

/// Solved regression coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct LadFit {
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Optimal objective value (mean absolute training error)
    pub objective: f64,
}

impl LadFit {
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .map(|(a, x)| a * x)
            .sum::<f64>()
            + self.intercept
    }
}

/// Build and solve the LAD linear program over `samples`.
pub fn fit_lad(samples: &[WineSample]) -> Result<LadFit> {
    ensure!(!samples.is_empty(), "Cannot fit a regression to zero samples");
    let n_features = samples[0].features.len();
    ensure!(
        samples.iter().all(|s| s.features.len() == n_features),
        "All samples must have {n_features} features"
    );

    let n = samples.len() as f64;
    let free = (f64::NEG_INFINITY, f64::INFINITY);

    let mut problem = Problem::new(OptimizationDirection::Minimize);
    let a: Vec<_> = (0..n_features).map(|_| problem.add_var(0.0, free)).collect();
    let b = problem.add_var(0.0, free);

    for sample in samples {
        let z = problem.add_var(1.0 / n, (0.0, f64::INFINITY));

        // a·x + b + z >= y   ⇔   y - a·x - b <= z
        let mut upper = LinearExpr::empty();
        // a·x + b - z <= y   ⇔   y - a·x - b >= -z
        let mut lower = LinearExpr::empty();
        for (&var, &x) in a.iter().zip(&sample.features) {
            upper.add(var, x);
            lower.add(var, x);
        }
        upper.add(b, 1.0);
        lower.add(b, 1.0);
        upper.add(z, 1.0);
        lower.add(z, -1.0);

        problem.add_constraint(upper, ComparisonOp::Ge, sample.quality);
        problem.add_constraint(lower, ComparisonOp::Le, sample.quality);
    }

    tracing::debug!(
        "Solving LP with {} variables and {} constraints",
        n_features + 1 + samples.len(),
        2 * samples.len()
    );
    let solution = problem
        .solve()
        .map_err(|e| anyhow!("Linear program could not be solved: {e}"))?;

    Ok(LadFit {
        weights: a.iter().map(|&v| solution[v]).collect(),
        intercept: solution[b],
        objective: solution.objective(),
    })
}

// ─── Error Summary ────────────────────────────────────────────────────────────
/// Average absolute and percent error of a fit over one split.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSummary {
    pub mean_abs: f64,
    /// None when every target in the split is zero
    pub mean_pct: Option<f64>,
    /// Rows left out of the percent error because their target is zero
    pub zero_targets: usize,
}

pub fn evaluate(fit: &LadFit, samples: &[WineSample]) -> Result<ErrorSummary> {
    ensure!(!samples.is_empty(), "Cannot evaluate on an empty split");

    let mut abs_sum = 0.0;
    let mut pct_sum = 0.0;
    let mut pct_rows = 0usize;
    for s in samples {
        let dist = (s.quality - fit.predict(&s.features)).abs();
        abs_sum += dist;
        if s.quality != 0.0 {
            pct_sum += dist / s.quality;
            pct_rows += 1;
        }
    }

    let zero_targets = samples.len() - pct_rows;
    if zero_targets > 0 {
        tracing::warn!("{zero_targets} rows have a zero target; left out of the percent error");
    }

    Ok(ErrorSummary {
        mean_abs: abs_sum / samples.len() as f64,
        mean_pct: (pct_rows > 0).then(|| pct_sum / pct_rows as f64 * 100.0),
        zero_targets,
    })
}
