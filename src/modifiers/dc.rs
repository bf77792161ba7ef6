//! DC signal attenuation

use num_complex::Complex64;

use super::check_percent;
use crate::error::Result;
use crate::grid::ComplexGrid;

/// Index of the highest-magnitude sample in a plane (first one on ties)
pub fn peak_index(plane: &[Complex64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, z) in plane.iter().enumerate() {
        let m = z.norm_sqr();
        if best.map_or(true, |(_, b)| m > b) {
            best = Some((i, m));
        }
    }
    best.map(|(i, _)| i)
}

/// Scale the strongest sample of each channel by `1 - percentage/100`
///
/// For k-space of a natural image that sample is the DC term at the center.
pub fn decrease_dc(grid: &mut ComplexGrid, percentage: f64) -> Result<()> {
    check_percent("decrease_dc", percentage)?;
    if percentage <= 0.0 {
        return Ok(());
    }
    let factor = 1.0 - percentage / 100.0;
    for plane in grid.planes_mut() {
        if let Some(i) = peak_index(plane) {
            plane[i] *= factor;
        }
    }
    Ok(())
}
