// ============================================================
// Layer 4 — Image Files
// ============================================================
// Thin wrappers over the `image` crate for the two places the
// tool touches ordinary image files:
//
//   compress  → read any PNG/JPEG as 8-bit grayscale, write PNGs
//   classify  → read one RGB image to feed the trained network
//
// The format is chosen from the file extension on both read
// and write, so "rank_50_approx_image.png" is always a PNG.

use anyhow::{Context, Result};
use image::{imageops::FilterType, GrayImage};
use std::path::Path;

use crate::data::cifar::{CHANNELS, IMAGE_SIZE};

/// Read an image and convert it to 8-bit grayscale
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let img = image::open(path)
        .with_context(|| format!("Cannot read image '{}'", path.display()))?;
    Ok(img.to_luma8())
}

/// Write a grayscale image, format inferred from the extension
pub fn save_grayscale(img: &GrayImage, path: &Path) -> Result<()> {
    img.save(path)
        .with_context(|| format!("Cannot write image '{}'", path.display()))?;
    tracing::debug!("Wrote {}x{} image to '{}'", img.width(), img.height(), path.display());
    Ok(())
}

/// Read an RGB image as channel-major CIFAR pixels.
///
/// Images that are not 32x32 are resized first; the network
/// only accepts the resolution it was trained on.
pub fn load_cifar_pixels(path: &Path) -> Result<Vec<u8>> {
    let img = image::open(path)
        .with_context(|| format!("Cannot read image '{}'", path.display()))?
        .to_rgb8();

    let side = IMAGE_SIZE as u32;
    let img = if img.dimensions() != (side, side) {
        tracing::info!(
            "Resizing '{}' from {}x{} to {side}x{side}",
            path.display(),
            img.width(),
            img.height()
        );
        image::imageops::resize(&img, side, side, FilterType::Triangle)
    } else {
        img
    };

    Ok(interleaved_to_planar(img.as_raw(), CHANNELS))
}

/// RGBRGBRGB... → RRR...GGG...BBB...
fn interleaved_to_planar(raw: &[u8], channels: usize) -> Vec<u8> {
    let plane = raw.len() / channels;
    let mut out = vec![0u8; raw.len()];
    for (i, px) in raw.chunks_exact(channels).enumerate() {
        for (c, &value) in px.iter().enumerate() {
            out[c * plane + i] = value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_interleaved_to_planar() {
        let raw = [1, 2, 3, 4, 5, 6];
        assert_eq!(interleaved_to_planar(&raw, 3), vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_grayscale_round_trip_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let img = GrayImage::from_fn(4, 3, |x, y| image::Luma([(x * 10 + y) as u8]));
        save_grayscale(&img, &path).unwrap();
        let back = load_grayscale(&path).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_cifar_pixels_are_resized_and_planar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(64, 48, Rgb([255, 0, 0])).save(&path).unwrap();

        let pixels = load_cifar_pixels(&path).unwrap();
        assert_eq!(pixels.len(), CHANNELS * IMAGE_SIZE * IMAGE_SIZE);
        let plane = IMAGE_SIZE * IMAGE_SIZE;
        assert!(pixels[..plane].iter().all(|&p| p == 255));
        assert!(pixels[plane..].iter().all(|&p| p == 0));
    }
}
