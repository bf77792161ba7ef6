//! K-space undersampling
//!
//! Keeps every Nth phase-encode line counted outward from the center line,
//! the sampling pattern parallel imaging builds on. Skipped lines are either
//! zeroed in place, or dropped and the remaining lines packed together, which
//! shows the reduced field of view (and its aliasing) directly.

use num_complex::Complex64;

use crate::error::{KspaceError, Result};
use crate::grid::ComplexGrid;
use crate::params::MAX_UNDERSAMPLE;

/// Rows kept for acceleration `factor`, ascending
pub fn undersampled_lines(rows: usize, factor: usize) -> Vec<usize> {
    let factor = factor.max(1);
    let mid = rows / 2;
    let below = (0..=mid).rev().step_by(factor);
    let above = (mid..rows).step_by(factor).skip(1);
    let mut kept: Vec<usize> = below.chain(above).collect();
    kept.sort_unstable();
    kept
}

/// Undersample by `factor`
///
/// # Arguments
/// * `grid` - Working k-space; replaced by a shorter grid when `compress` is set
/// * `factor` - Acceleration factor (1 = off, up to 16)
/// * `compress` - Drop skipped lines instead of zeroing them
pub fn undersample(grid: &mut ComplexGrid, factor: usize, compress: bool) -> Result<()> {
    if !(1..=MAX_UNDERSAMPLE).contains(&factor) {
        return Err(KspaceError::invalid(
            "undersample",
            format!("factor must be within 1..={}, got {}", MAX_UNDERSAMPLE, factor),
        ));
    }
    if factor == 1 {
        return Ok(());
    }

    let kept = undersampled_lines(grid.rows(), factor);
    if compress {
        *grid = grid.select_rows(&kept)?;
        return Ok(());
    }

    let mut keep = vec![false; grid.rows()];
    for &r in &kept {
        keep[r] = true;
    }
    let zero = Complex64::new(0.0, 0.0);
    for ch in 0..grid.channels() {
        for r in (0..keep.len()).filter(|&r| !keep[r]) {
            grid.row_mut(ch, r).fill(zero);
        }
    }
    Ok(())
}
