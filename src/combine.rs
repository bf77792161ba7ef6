//! Multi-channel combination
//!
//! Reduces per-channel reconstructed images to one magnitude image by
//! root-sum-of-squares: composite = sqrt(sum_ch |img_ch|^2). A single channel
//! reduces to its own magnitude.

use crate::grid::ComplexGrid;
use crate::utils::simd_ops::{accumulate_norm_sqr, sqrt_inplace};

/// Root-sum-of-squares composite of every channel of `images`
///
/// # Returns
/// Real, non-negative image of `rows * cols` samples
pub fn root_sum_of_squares(images: &ComplexGrid) -> Vec<f64> {
    if images.channels() == 1 {
        return images.channel(0).iter().map(|z| z.norm()).collect();
    }

    let mut acc = vec![0.0; images.plane_len()];
    for ch in 0..images.channels() {
        accumulate_norm_sqr(&mut acc, images.channel(ch));
    }
    sqrt_inplace(&mut acc);
    acc
}

/// Magnitude image of every channel
pub fn channel_magnitudes(images: &ComplexGrid) -> Vec<Vec<f64>> {
    (0..images.channels())
        .map(|ch| images.channel(ch).iter().map(|z| z.norm()).collect())
        .collect()
}
