// ============================================================
// Layer 5 — Low-Rank Image Approximation
// ============================================================
// Compresses a grayscale image by truncating its singular value
// decomposition:
//
//   A = U Σ Vᵀ   →   A_k = Σ_{i<k} σ_i · u_i · v_iᵀ
//
// Only the k largest singular triplets are kept, so A_k needs
// k·(rows + cols + 1) numbers instead of rows·cols.
//
// The decomposition itself comes from `nalgebra`.
//
// Reference: Eckart–Young theorem (best rank-k approximation)

use anyhow::{ensure, Result};
use image::{GrayImage, Luma};
use nalgebra::DMatrix;

/// Pixel intensities as a rows × cols matrix (rows = image height)
pub fn image_to_matrix(img: &GrayImage) -> DMatrix<f64> {
    let (width, height) = img.dimensions();
    DMatrix::from_fn(height as usize, width as usize, |r, c| {
        img.get_pixel(c as u32, r as u32)[0] as f64
    })
}

/// Matrix back to 8-bit pixels, rounding and clamping to 0..=255
pub fn matrix_to_image(m: &DMatrix<f64>) -> GrayImage {
    GrayImage::from_fn(m.ncols() as u32, m.nrows() as u32, |x, y| {
        let v = m[(y as usize, x as usize)].round().clamp(0.0, 255.0);
        Luma([v as u8])
    })
}

/// Number of singular values above max(σ) · max(rows, cols) · ε
pub fn numerical_rank(m: &DMatrix<f64>) -> usize {
    if m.is_empty() {
        return 0;
    }
    let singular = m.singular_values();
    let max = singular.iter().cloned().fold(0.0, f64::max);
    let tol = max * m.nrows().max(m.ncols()) as f64 * f64::EPSILON;
    singular.iter().filter(|&&s| s > tol).count()
}

/// Best rank-`k` approximation of `m`. `k` must be in 1..=min(rows, cols).
pub fn rank_k_approximation(m: &DMatrix<f64>, k: usize) -> Result<DMatrix<f64>> {
    let max_k = m.nrows().min(m.ncols());
    ensure!(k > 0, "Rank k must be at least 1");
    ensure!(k <= max_k, "Rank k = {k} exceeds min(rows, cols) = {max_k}");

    let svd = m.clone().svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        anyhow::bail!("SVD did not return singular vectors");
    };

    // Largest singular values first
    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));

    let mut approx = DMatrix::<f64>::zeros(m.nrows(), m.ncols());
    for &i in order.iter().take(k) {
        approx += (u.column(i) * v_t.row(i)) * svd.singular_values[i];
    }
    Ok(approx)
}

/// Fraction of the original storage the rank-k factors need
pub fn storage_ratio(rows: usize, cols: usize, k: usize) -> f64 {
    (k * (rows + cols + 1)) as f64 / (rows * cols) as f64
}
