//! Hamming apodization
//!
//! Tapers the periphery of k-space along the phase-encode direction to
//! reduce Gibbs ringing. Each line is scaled by the Hamming coefficient of
//! its row, which depends only on the distance from the DC row, so windowed
//! k-space of a real image stays Hermitian.

use std::f64::consts::PI;

use crate::grid::ComplexGrid;

/// Hamming coefficients for `n` lines, centred on the DC line `n/2`
///
/// Line `r` gets `0.54 + 0.46*cos(pi*d/half)` with `d = r - n/2` and `half`
/// the larger distance to an edge, so both edges taper toward 0.08 and lines
/// at the same distance from DC share a weight. Odd `n` matches numpy.hamming.
pub fn hamming_window(n: usize) -> Vec<f64> {
    let center = n / 2;
    let half = center.max(n.saturating_sub(center + 1));
    if half == 0 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|r| {
            let d = r as f64 - center as f64;
            0.54 + 0.46 * (PI * d / half as f64).cos()
        })
        .collect()
}

/// Scale every line of every channel by its row's Hamming coefficient
pub fn apply_hamming(grid: &mut ComplexGrid) {
    let window = hamming_window(grid.rows());
    for ch in 0..grid.channels() {
        for (r, &w) in window.iter().enumerate() {
            for z in grid.row_mut(ch, r) {
                *z *= w;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_hamming_window_values() {
        let w = hamming_window(5);
        assert_abs_diff_eq!(w[0], 0.08, epsilon = 1e-12);
        assert_abs_diff_eq!(w[2], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[4], 0.08, epsilon = 1e-12);
        assert_abs_diff_eq!(w[1], w[3], epsilon = 1e-12);
        assert_eq!(hamming_window(1), vec![1.0]);
        assert!(hamming_window(0).is_empty());
    }

    #[test]
    fn test_hamming_symmetric_about_dc() {
        for n in [2usize, 4, 7, 8, 16] {
            let w = hamming_window(n);
            let c = n / 2;
            assert_abs_diff_eq!(w[c], 1.0, epsilon = 1e-12);
            for d in 1..=c.min(n - 1 - c) {
                assert_abs_diff_eq!(w[c - d], w[c + d], epsilon = 1e-12);
            }
            // Edge furthest from DC tapers fully
            assert_abs_diff_eq!(w[0], 0.08, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_hamming_keeps_conjugate_symmetry() {
        use crate::fft;
        use crate::modifiers::partial_fourier;

        for &(rows, cols) in &[(8, 8), (7, 6), (10, 5)] {
            let pixels: Vec<f64> = (0..rows * cols).map(|i| ((i * 5 + 3) % 13) as f64).collect();
            let mut windowed = fft::forward(&ComplexGrid::from_real(&pixels, rows, cols).unwrap());
            apply_hamming(&mut windowed);

            let mut restored = windowed.clone();
            partial_fourier(&mut restored, 0.0, false).unwrap();
            for (a, b) in windowed.as_slice().iter().zip(restored.as_slice()) {
                assert!((*a - *b).norm() < 1e-9, "{}x{}: {} vs {}", rows, cols, a, b);
            }
        }
    }

    #[test]
    fn test_apply_hamming_rows_only() {
        let mut grid = ComplexGrid::from_real(&vec![2.0; 15], 5, 3).unwrap();
        apply_hamming(&mut grid);
        let w = hamming_window(5);
        for r in 0..5 {
            for c in 0..3 {
                assert_abs_diff_eq!(grid.get(r, c, 0).unwrap().re, 2.0 * w[r], epsilon = 1e-12);
            }
        }
    }
}
