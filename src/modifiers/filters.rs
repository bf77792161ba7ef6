//! Circular k-space filters
//!
//! The radius is a percentage of half the k-space diagonal, measured from the
//! DC sample at (rows/2, cols/2). Masks are binary: samples are either kept
//! untouched (magnitude and phase) or zeroed.

use num_complex::Complex64;

use super::check_percent;
use crate::error::Result;
use crate::grid::ComplexGrid;

/// Mask radius in samples for a percentage of half the diagonal
pub fn filter_radius(rows: usize, cols: usize, percentage: f64) -> f64 {
    (rows as f64).hypot(cols as f64) / 2.0 * percentage / 100.0
}

/// Zero samples inside (`inside == true`) or outside the centered disk
fn zero_by_disk(grid: &mut ComplexGrid, radius: f64, inside: bool) {
    let (rows, cols) = (grid.rows(), grid.cols());
    let (cr, cc) = ((rows / 2) as f64, (cols / 2) as f64);
    let r_squared = radius * radius;
    let zero = Complex64::new(0.0, 0.0);

    for ch in 0..grid.channels() {
        for r in 0..rows {
            let dy = r as f64 - cr;
            let line = grid.row_mut(ch, r);
            for (c, z) in line.iter_mut().enumerate() {
                let dx = c as f64 - cc;
                let in_disk = dx * dx + dy * dy <= r_squared;
                if in_disk == inside {
                    *z = zero;
                }
            }
        }
    }
}

/// High-pass filter: remove the low spatial frequencies at the center
///
/// # Arguments
/// * `grid` - Working k-space, modified in place
/// * `percentage` - Radius of the removed disk (0 = off)
pub fn high_pass(grid: &mut ComplexGrid, percentage: f64) -> Result<()> {
    check_percent("high_pass", percentage)?;
    if percentage > 0.0 {
        let radius = filter_radius(grid.rows(), grid.cols(), percentage);
        zero_by_disk(grid, radius, true);
    }
    Ok(())
}

/// Low-pass filter: keep only the central disk
///
/// # Arguments
/// * `grid` - Working k-space, modified in place
/// * `percentage` - Radius of the kept disk (100 = off)
pub fn low_pass(grid: &mut ComplexGrid, percentage: f64) -> Result<()> {
    check_percent("low_pass", percentage)?;
    if percentage < 100.0 {
        let radius = filter_radius(grid.rows(), grid.cols(), percentage);
        zero_by_disk(grid, radius, false);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(rows: usize, cols: usize) -> ComplexGrid {
        ComplexGrid::from_real(&vec![1.0; rows * cols], rows, cols).unwrap()
    }

    fn count_nonzero(grid: &ComplexGrid) -> usize {
        grid.as_slice().iter().filter(|z| z.norm() > 0.0).count()
    }

    #[test]
    fn test_low_pass_zero_radius_keeps_dc() {
        let mut g = ones(8, 8);
        low_pass(&mut g, 0.0).unwrap();
        assert_eq!(count_nonzero(&g), 1);
        assert_eq!(g.get(4, 4, 0).unwrap().re, 1.0);
    }

    #[test]
    fn test_high_pass_full_radius_removes_all() {
        let mut g = ones(8, 6);
        high_pass(&mut g, 100.0).unwrap();
        assert_eq!(count_nonzero(&g), 0);
    }

    #[test]
    fn test_filters_complementary() {
        let mut hp = ones(16, 16);
        let mut lp = ones(16, 16);
        high_pass(&mut hp, 30.0).unwrap();
        low_pass(&mut lp, 30.0).unwrap();
        assert_eq!(count_nonzero(&hp) + count_nonzero(&lp), 256);
    }

    #[test]
    fn test_filters_preserve_phase() {
        let data = (0..64).map(|i| Complex64::from_polar(1.0, i as f64 * 0.1)).collect();
        let original = ComplexGrid::from_vec(8, 8, 1, data).unwrap();
        let mut g = original.clone();
        high_pass(&mut g, 20.0).unwrap();
        for (a, b) in original.as_slice().iter().zip(g.as_slice()) {
            assert!(b.norm() == 0.0 || a == b);
        }
    }

    #[test]
    fn test_filter_passthrough_and_validation() {
        let mut g = ones(4, 4);
        high_pass(&mut g, 0.0).unwrap();
        low_pass(&mut g, 100.0).unwrap();
        assert_eq!(count_nonzero(&g), 16);
        assert!(high_pass(&mut g, -1.0).is_err());
        assert!(low_pass(&mut g, 101.0).is_err());
    }
}
