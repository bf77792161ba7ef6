//! K-space truncation schemes
//!
//! Partial Fourier drops lines from one edge and optionally restores them by
//! conjugate symmetry; scan percentage crops both edges symmetrically. Only
//! one of the two is active at a time (enforced by the parameter table).

use num_complex::Complex64;

use super::check_percent;
use crate::error::Result;
use crate::grid::{idx3d, ComplexGrid};

/// Point reflection of index `i` through the sample holding DC (`n/2`)
#[inline]
fn mirror(i: usize, n: usize) -> usize {
    (2 * (n / 2) + n - i) % n
}

/// Number of lines partial Fourier removes from the bottom edge
///
/// The percentage scales the removable part of the lower half, so the top
/// half and the center line are always kept.
pub fn partial_fourier_lines(rows: usize, percentage: f64) -> usize {
    let removable = (rows as f64 / 2.0 - 1.0).max(0.0);
    ((1.0 - percentage / 100.0) * removable).round() as usize
}

/// Partial Fourier (half scan)
///
/// # Arguments
/// * `grid` - Working k-space, modified in place
/// * `percentage` - Acquired share of the removable half (100 = off)
/// * `zero_fill` - Leave removed lines at zero instead of using conjugate symmetry
///
/// Without zero-fill each removed sample `k[r, c]` becomes
/// `conj(k[mirror(r), mirror(c)])`.
pub fn partial_fourier(grid: &mut ComplexGrid, percentage: f64, zero_fill: bool) -> Result<()> {
    check_percent("partial_fourier", percentage)?;
    if percentage >= 100.0 {
        return Ok(());
    }

    let (rows, cols) = (grid.rows(), grid.cols());
    let skip = partial_fourier_lines(rows, percentage);
    if skip == 0 {
        return Ok(());
    }
    let first = rows - skip;

    for ch in 0..grid.channels() {
        if zero_fill {
            for r in first..rows {
                grid.row_mut(ch, r).fill(Complex64::new(0.0, 0.0));
            }
            continue;
        }

        let plane = grid.channel(ch);
        let mut replacement = Vec::with_capacity(skip * cols);
        for r in first..rows {
            let mr = mirror(r, rows);
            for c in 0..cols {
                replacement.push(plane[idx3d(mr, mirror(c, cols), 0, rows, cols)].conj());
            }
        }
        for (i, r) in (first..rows).enumerate() {
            grid.row_mut(ch, r).copy_from_slice(&replacement[i * cols..(i + 1) * cols]);
        }
    }
    Ok(())
}

/// Number of lines scan percentage removes from each edge
pub fn scan_percentage_lines(rows: usize, percentage: f64) -> usize {
    (((1.0 - percentage / 100.0) * rows as f64 / 2.0).round() as usize).min(rows / 2 + rows % 2)
}

/// Reduced scan percentage: zero an equal band of lines at the top and bottom
///
/// 256 lines at 50% keep the central 128 and zero 64 on each side.
pub fn scan_percentage(grid: &mut ComplexGrid, percentage: f64) -> Result<()> {
    check_percent("scan_percentage", percentage)?;
    if percentage >= 100.0 {
        return Ok(());
    }

    let rows = grid.rows();
    let n = scan_percentage_lines(rows, percentage);
    if n == 0 {
        return Ok(());
    }
    let zero = Complex64::new(0.0, 0.0);
    for ch in 0..grid.channels() {
        for r in (0..n).chain(rows.saturating_sub(n)..rows) {
            grid.row_mut(ch, r).fill(zero);
        }
    }
    Ok(())
}
