//! Image preprocessing for the ImageNet-pretrained backbone.
//!
//! The backbone expects:
//! - Input size: `image_size × image_size` (224 by default), bilinear resize
//! - Normalization: per-channel `(pixel/255 - mean) / std` with ImageNet statistics
//! - Channel order: RGB
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// ImageNet per-channel mean.
const NORM_MEAN: [f32; CHANNELS] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation.
const NORM_STD: [f32; CHANNELS] = [0.229, 0.224, 0.225];

/// Preprocess an image for backbone inference.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let resized = image.resize_exact(
        image_size,
        image_size,
        image::imageops::FilterType::Triangle,
    );
    let rgb = resized.to_rgb8();

    let size = image_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));

    for (i, pixel) in rgb.as_raw().chunks_exact(CHANNELS).enumerate() {
        let y = i / size;
        let x = i % size;
        for (c, &val) in pixel.iter().enumerate() {
            tensor[[0, c, y, x]] = (val as f32 / 255.0 - NORM_MEAN[c]) / NORM_STD[c];
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_preprocess_shape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&img, 224);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_imagenet_normalization() {
        // White: (1.0 - mean) / std per channel
        let img =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255])));
        let tensor = preprocess(&img, 4);
        for c in 0..CHANNELS {
            let expected = (1.0 - NORM_MEAN[c]) / NORM_STD[c];
            assert!((tensor[[0, c, 1, 1]] - expected).abs() < 1e-4);
        }

        // Black: -mean / std per channel
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([0, 0, 0])));
        let tensor = preprocess(&img, 4);
        for c in 0..CHANNELS {
            let expected = -NORM_MEAN[c] / NORM_STD[c];
            assert!((tensor[[0, c, 2, 3]] - expected).abs() < 1e-4);
        }
    }
}
