// ============================================================
// Layer 5 — Batch-Moment Normalisation
// ============================================================
// Normalises every feature with the mean and (biased) variance
// of the current batch:
//
//   y = (x - mean_batch(x)) / sqrt(var_batch(x) + 1e-12)
//
// Statistics are taken over the batch axis (dim 0) only, so a
// conv activation [B, C, H, W] gets separate moments for every
// (c, h, w) position. There is no learned scale or offset and
// no running average: the same formula is used for training and
// evaluation. A batch of one therefore normalises to all zeros.

use burn::prelude::*;

pub const NORM_EPSILON: f64 = 1e-12;

pub fn batch_moments_norm<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    let mean = x.clone().mean_dim(0);
    let var = x.clone().var_bias(0);
    (x - mean) / var.add_scalar(NORM_EPSILON).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_columns_get_zero_mean_unit_variance() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 10.0, 3.0, 20.0, 5.0, 60.0], [3, 2]),
            &device,
        );
        let y = batch_moments_norm(x);
        assert_eq!(y.dims(), [3, 2]);

        let mean = y.clone().mean_dim(0).into_data().to_vec::<f32>().unwrap();
        let var = y.var_bias(0).into_data().to_vec::<f32>().unwrap();
        assert!(mean.iter().all(|m| m.abs() < 1e-5));
        assert!(var.iter().all(|v| (v - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_four_dim_shape_is_kept() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([2, 3, 4, 4], &device);
        let y = batch_moments_norm(x);
        assert_eq!(y.dims(), [2, 3, 4, 4]);
        // Constant input: zero deviation everywhere
        let values = y.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.abs() < 1e-6));
    }
}
