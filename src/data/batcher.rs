// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<LabeledImage>
// into device tensors.
//
// How batching works here:
//   Input:  Vec of N LabeledImages, each 3*32*32 u8 pixels
//   Output: ImageBatch with
//             images [N, 3, 32, 32]  floats in [0, 1]
//             labels [N]             ints in 0..10
//
//   We flatten all pixels into one long Vec, scale by 1/255,
//   then reshape. Pixels are already channel-major so no
//   transpose is needed.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §8 (Vectors)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::cifar::{CHANNELS, IMAGE_SIZE, PIXELS_PER_IMAGE};
use crate::domain::sample::LabeledImage;

// ─── ImageBatch ───────────────────────────────────────────────────────────────
/// A batch of images ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Normalised pixels — shape: [batch_size, 3, 32, 32]
    pub images: Tensor<B, 4>,

    /// Ground truth labels — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on the
/// correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack raw channel-major pixel buffers into [N, 3, 32, 32].
    /// Also used for single-image prediction where there is no label.
    pub fn pixels_to_tensor(&self, images: &[&[u8]]) -> Tensor<B, 4> {
        let batch_size = images.len();
        let flat: Vec<f32> = images
            .iter()
            .flat_map(|px| px.iter().map(|&p| p as f32 / 255.0))
            .collect();
        debug_assert_eq!(flat.len(), batch_size * PIXELS_PER_IMAGE);

        Tensor::<B, 4>::from_data(
            TensorData::new(flat, [batch_size, CHANNELS, IMAGE_SIZE, IMAGE_SIZE]),
            &self.device,
        )
    }
}

impl<B: Backend> Batcher<LabeledImage, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<LabeledImage>) -> ImageBatch<B> {
        let pixels: Vec<&[u8]> = items.iter().map(|s| s.pixels.as_slice()).collect();
        let images = self.pixels_to_tensor(&pixels);

        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_scaling() {
        let device = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(device);
        let items = vec![
            LabeledImage::new(vec![255; PIXELS_PER_IMAGE], 1),
            LabeledImage::new(vec![0; PIXELS_PER_IMAGE], 7),
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 3, 32, 32]);
        assert_eq!(batch.labels.dims(), [2]);

        let pixels = batch.images.into_data().to_vec::<f32>().unwrap();
        // Reshape preserves element count
        assert_eq!(pixels.len(), 2 * PIXELS_PER_IMAGE);
        assert!(pixels[..PIXELS_PER_IMAGE].iter().all(|&p| (p - 1.0).abs() < 1e-6));
        assert!(pixels[PIXELS_PER_IMAGE..].iter().all(|&p| p == 0.0));

        let labels = batch.labels.into_data().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![1, 7]);
    }
}
