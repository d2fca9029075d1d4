//! Grayscale pixel statistics over face crops.
//!
//! All functions operate on `f32` luma arrays in the 0..255 range so the
//! empirical normalization constants (Laplacian variance, stddev) keep the
//! same scale as 8-bit pixel data.

use ndarray::{Array2, ArrayView2};

use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// ITU-R BT.601 luma weights.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Extracts a grayscale crop for `region`, clipped to the frame.
///
/// Returns `None` when nothing remains after clipping — the caller treats
/// that as "no face", not as an error.
pub fn luma_crop(frame: &Frame, region: FaceRegion) -> Option<Array2<f32>> {
    let clipped = region.clipped(frame.width(), frame.height())?;
    let src = frame.as_ndarray();
    let h = clipped.height() as usize;
    let w = clipped.width() as usize;

    let mut gray = Array2::<f32>::zeros((h, w));
    for y in 0..h {
        let sy = (clipped.y1 as usize) + y;
        for x in 0..w {
            let sx = (clipped.x1 as usize) + x;
            gray[[y, x]] = if frame.channels() >= 3 {
                LUMA_R * src[[sy, sx, 0]] as f32
                    + LUMA_G * src[[sy, sx, 1]] as f32
                    + LUMA_B * src[[sy, sx, 2]] as f32
            } else {
                src[[sy, sx, 0]] as f32
            };
        }
    }
    Some(gray)
}

pub fn mean(gray: &ArrayView2<f32>) -> f64 {
    if gray.is_empty() {
        return 0.0;
    }
    gray.iter().map(|&v| v as f64).sum::<f64>() / gray.len() as f64
}

/// Population standard deviation of the crop intensities.
pub fn std_dev(gray: &ArrayView2<f32>) -> f64 {
    if gray.is_empty() {
        return 0.0;
    }
    let m = mean(gray);
    let var = gray
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum::<f64>()
        / gray.len() as f64;
    var.sqrt()
}

/// Variance of the 4-neighbor Laplacian response over the crop interior.
///
/// High-frequency energy correlates with focus. Crops smaller than 3x3
/// have no interior and report 0 (maximally blurry).
pub fn laplacian_variance(gray: &ArrayView2<f32>) -> f64 {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let n = (h - 2) * (w - 2);
    let mut responses = Vec::with_capacity(n);
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let lap = gray[[y - 1, x]] as f64
                + gray[[y + 1, x]] as f64
                + gray[[y, x - 1]] as f64
                + gray[[y, x + 1]] as f64
                - 4.0 * gray[[y, x]] as f64;
            responses.push(lap);
        }
    }

    let m = responses.iter().sum::<f64>() / n as f64;
    responses.iter().map(|r| (r - m) * (r - m)).sum::<f64>() / n as f64
}
