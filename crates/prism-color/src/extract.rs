//! Representative color extraction

use image::RgbImage;

use crate::{ColorError, ColorMode, Result};

const KMEANS_CLUSTERS: usize = 5;
const KMEANS_MAX_ITER: usize = 10;

/// One extracted color plus its derived brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSample {
    pub rgb: (u8, u8, u8),
    /// 0-100, from the mean channel value
    pub brightness: u8,
}

impl ColorSample {
    fn new(rgb: (u8, u8, u8)) -> Self {
        let (r, g, b) = rgb;
        let mean = (r as f32 + g as f32 + b as f32) / 3.0;
        let brightness = (mean / 255.0 * 100.0).round() as u8;
        Self { rgb, brightness }
    }
}

/// Decode artwork bytes and derive a representative color for `mode`.
pub fn extract(bytes: &[u8], mode: ColorMode) -> Result<ColorSample> {
    let image = image::load_from_memory(bytes)?;
    let rgb = image.to_rgb8();

    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(ColorError::EmptyImage);
    }

    let color = match mode {
        ColorMode::Prominent => prominent_color(&rgb),
        ColorMode::Average => average_color(&rgb),
    };

    Ok(ColorSample::new(color))
}

/// Mean of every pixel, equivalent to downsampling the image to 1x1.
fn average_color(image: &RgbImage) -> (u8, u8, u8) {
    let mut sums = [0u64; 3];
    let mut count = 0u64;

    for pixel in image.pixels() {
        sums[0] += pixel[0] as u64;
        sums[1] += pixel[1] as u64;
        sums[2] += pixel[2] as u64;
        count += 1;
    }

    (
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    )
}

/// Palette quantization via k-means over every pixel; the centroid of the
/// most populated cluster wins.
fn prominent_color(image: &RgbImage) -> (u8, u8, u8) {
    let samples: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();

    let k = KMEANS_CLUSTERS.min(samples.len()).max(1);
    let mut clusters = kmeans_clusters(&samples, k, KMEANS_MAX_ITER);
    clusters.sort_by_key(|cluster| std::cmp::Reverse(cluster.count));

    let centroid = clusters[0].centroid;
    (
        centroid[0].clamp(0.0, 255.0).round() as u8,
        centroid[1].clamp(0.0, 255.0).round() as u8,
        centroid[2].clamp(0.0, 255.0).round() as u8,
    )
}

#[derive(Clone, Copy)]
struct Cluster {
    centroid: [f32; 3],
    count: usize,
}

fn squared_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

fn kmeans_clusters(samples: &[[f32; 3]], k: usize, max_iter: usize) -> Vec<Cluster> {
    // Seed centroids evenly across the sample list.
    let mut centroids = Vec::with_capacity(k);
    for i in 0..k {
        let idx = ((i * samples.len()) / k).min(samples.len() - 1);
        centroids.push(samples[idx]);
    }

    let mut assignments = vec![0usize; samples.len()];

    for iter in 0..max_iter {
        let mut sums = vec![[0f32; 3]; k];
        let mut counts = vec![0usize; k];

        for (sample_idx, sample) in samples.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f32::MAX;
            for (centroid_idx, centroid) in centroids.iter().enumerate() {
                let dist = squared_distance(sample, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = centroid_idx;
                }
            }

            assignments[sample_idx] = best;
            for channel in 0..3 {
                sums[best][channel] += sample[channel];
            }
            counts[best] += 1;
        }

        let mut changed = false;
        for i in 0..k {
            if counts[i] == 0 {
                centroids[i] = samples[(i + iter) % samples.len()];
                changed = true;
                continue;
            }
            let new_centroid = [
                sums[i][0] / counts[i] as f32,
                sums[i][1] / counts[i] as f32,
                sums[i][2] / counts[i] as f32,
            ];
            if squared_distance(&centroids[i], &new_centroid) > 1e-2 {
                changed = true;
            }
            centroids[i] = new_centroid;
        }

        if !changed {
            break;
        }
    }

    let mut counts = vec![0usize; k];
    for &assignment in &assignments {
        counts[assignment] += 1;
    }

    centroids
        .into_iter()
        .enumerate()
        .map(|(idx, centroid)| Cluster {
            centroid,
            count: counts[idx],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(image: RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_average_solid_image() {
        let bytes = png_bytes(RgbImage::from_pixel(2, 2, Rgb([100, 150, 200])));
        let sample = extract(&bytes, ColorMode::Average).unwrap();

        assert_eq!(sample.rgb, (100, 150, 200));
        // round(((100 + 150 + 200) / 3) / 255 * 100) = 59
        assert_eq!(sample.brightness, 59);
    }

    #[test]
    fn test_prominent_solid_image() {
        let bytes = png_bytes(RgbImage::from_pixel(4, 4, Rgb([10, 200, 30])));
        let sample = extract(&bytes, ColorMode::Prominent).unwrap();

        assert_eq!(sample.rgb, (10, 200, 30));
    }

    #[test]
    fn test_prominent_prefers_majority_color() {
        // 12 red pixels, 4 blue pixels: red must win.
        let mut image = RgbImage::from_pixel(4, 4, Rgb([200, 30, 30]));
        for x in 0..4 {
            image.put_pixel(x, 3, Rgb([30, 30, 200]));
        }
        let sample = extract(&png_bytes(image), ColorMode::Prominent).unwrap();

        assert_eq!(sample.rgb, (200, 30, 30));
    }

    #[test]
    fn test_brightness_bounds() {
        let white = png_bytes(RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])));
        let black = png_bytes(RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])));

        assert_eq!(extract(&white, ColorMode::Average).unwrap().brightness, 100);
        assert_eq!(extract(&black, ColorMode::Average).unwrap().brightness, 0);
    }

    #[test]
    fn test_undecodable_bytes() {
        let result = extract(b"definitely not an image", ColorMode::Average);
        assert!(matches!(result, Err(ColorError::Decode(_))));
    }
}
