//! Centered 2D FFT using rustfft
//!
//! K-space is kept with the zero-frequency sample at the geometric center of
//! the grid (row `rows/2`, column `cols/2`), so both directions wrap the raw
//! transform in shifts:
//!
//! - forward: `fftshift(fft2(ifftshift(x)))`
//! - inverse: `fftshift(ifft2(ifftshift(k)))`, scaled by 1/(rows*cols)
//!
//! With these conventions `inverse(forward(x)) == x` for odd and even sizes.

use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;

use crate::grid::ComplexGrid;

/// FFT workspace that caches plans and scratch buffers for one grid size
pub struct Fft2dWorkspace {
    rows: usize,
    cols: usize,
    // Forward FFT plans
    fft_row: Arc<dyn Fft<f64>>,
    fft_col: Arc<dyn Fft<f64>>,
    // Inverse FFT plans
    ifft_row: Arc<dyn Fft<f64>>,
    ifft_col: Arc<dyn Fft<f64>>,
    // Scratch buffers
    scratch_row: Vec<Complex64>,
    scratch_col: Vec<Complex64>,
    buffer_col: Vec<Complex64>,
    shifted: Vec<Complex64>,
}

impl Fft2dWorkspace {
    /// Create a new FFT workspace for `rows x cols` planes
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut planner = FftPlanner::new();

        // Row transforms run along a row, i.e. over `cols` samples
        let fft_row = planner.plan_fft(cols, FftDirection::Forward);
        let fft_col = planner.plan_fft(rows, FftDirection::Forward);

        let ifft_row = planner.plan_fft(cols, FftDirection::Inverse);
        let ifft_col = planner.plan_fft(rows, FftDirection::Inverse);

        let zero = Complex64::new(0.0, 0.0);
        let scratch_row = vec![zero; fft_row.get_inplace_scratch_len().max(ifft_row.get_inplace_scratch_len())];
        let scratch_col = vec![zero; fft_col.get_inplace_scratch_len().max(ifft_col.get_inplace_scratch_len())];

        Self {
            rows,
            cols,
            fft_row,
            fft_col,
            ifft_row,
            ifft_col,
            scratch_row,
            scratch_col,
            buffer_col: vec![zero; rows],
            shifted: vec![zero; rows * cols],
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// In-place forward 2D FFT of one plane (no shifts, no scaling)
    pub fn fft2d(&mut self, plane: &mut [Complex64]) {
        let (rows, cols) = (self.rows, self.cols);
        debug_assert_eq!(plane.len(), rows * cols);

        // Transform along rows (contiguous)
        for line in plane.chunks_exact_mut(cols) {
            self.fft_row.process_with_scratch(line, &mut self.scratch_row);
        }

        // Transform along columns (stride cols)
        for c in 0..cols {
            for r in 0..rows {
                self.buffer_col[r] = plane[r * cols + c];
            }
            self.fft_col.process_with_scratch(&mut self.buffer_col, &mut self.scratch_col);
            for r in 0..rows {
                plane[r * cols + c] = self.buffer_col[r];
            }
        }
    }

    /// In-place inverse 2D FFT of one plane (with 1/N normalization, no shifts)
    pub fn ifft2d(&mut self, plane: &mut [Complex64]) {
        let (rows, cols) = (self.rows, self.cols);
        debug_assert_eq!(plane.len(), rows * cols);
        let n_total = (rows * cols) as f64;

        for line in plane.chunks_exact_mut(cols) {
            self.ifft_row.process_with_scratch(line, &mut self.scratch_row);
        }

        for c in 0..cols {
            for r in 0..rows {
                self.buffer_col[r] = plane[r * cols + c];
            }
            self.ifft_col.process_with_scratch(&mut self.buffer_col, &mut self.scratch_col);
            for r in 0..rows {
                plane[r * cols + c] = self.buffer_col[r];
            }
        }

        // Normalize by 1/N (numpy convention)
        for val in plane.iter_mut() {
            *val /= n_total;
        }
    }

    /// Centered forward transform of one plane: image -> k-space
    pub fn forward_centered(&mut self, plane: &mut [Complex64]) {
        self.shift(plane, Shift::Inverse);
        self.fft2d(plane);
        self.shift(plane, Shift::Forward);
    }

    /// Centered inverse transform of one plane: k-space -> image
    pub fn inverse_centered(&mut self, plane: &mut [Complex64]) {
        self.shift(plane, Shift::Inverse);
        self.ifft2d(plane);
        self.shift(plane, Shift::Forward);
    }

    fn shift(&mut self, plane: &mut [Complex64], kind: Shift) {
        let (rows, cols) = (self.rows, self.cols);
        let (dr, dc) = match kind {
            Shift::Forward => (rows / 2, cols / 2),
            Shift::Inverse => (rows - rows / 2, cols - cols / 2),
        };
        self.shifted.copy_from_slice(plane);
        for r in 0..rows {
            let tr = (r + dr) % rows;
            for c in 0..cols {
                let tc = (c + dc) % cols;
                plane[tr * cols + tc] = self.shifted[r * cols + c];
            }
        }
    }

    /// Centered forward transform of every channel of `grid`
    pub fn forward(&mut self, grid: &ComplexGrid) -> ComplexGrid {
        let mut out = grid.clone();
        self.forward_inplace(&mut out);
        out
    }

    /// Centered inverse transform of every channel of `grid`
    pub fn inverse(&mut self, grid: &ComplexGrid) -> ComplexGrid {
        let mut out = grid.clone();
        self.inverse_inplace(&mut out);
        out
    }

    pub fn forward_inplace(&mut self, grid: &mut ComplexGrid) {
        debug_assert_eq!((grid.rows(), grid.cols()), self.dims());
        for plane in grid.planes_mut() {
            self.forward_centered(plane);
        }
    }

    pub fn inverse_inplace(&mut self, grid: &mut ComplexGrid) {
        debug_assert_eq!((grid.rows(), grid.cols()), self.dims());
        for plane in grid.planes_mut() {
            self.inverse_centered(plane);
        }
    }
}

#[derive(Clone, Copy)]
enum Shift {
    /// numpy.fft.fftshift
    Forward,
    /// numpy.fft.ifftshift
    Inverse,
}

/// Centered forward transform (image -> k-space), planning a fresh workspace
pub fn forward(grid: &ComplexGrid) -> ComplexGrid {
    Fft2dWorkspace::new(grid.rows(), grid.cols()).forward(grid)
}

/// Centered inverse transform (k-space -> image), planning a fresh workspace
pub fn inverse(grid: &ComplexGrid) -> ComplexGrid {
    Fft2dWorkspace::new(grid.rows(), grid.cols()).inverse(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(rows: usize, cols: usize) -> ComplexGrid {
        let data = (0..rows * cols)
            .map(|i| Complex64::new(i as f64, (i % 3) as f64 - 1.0))
            .collect();
        ComplexGrid::from_vec(rows, cols, 1, data).unwrap()
    }

    #[test]
    fn test_fft_ifft_roundtrip() {
        for &(rows, cols) in &[(4, 4), (5, 7), (8, 3), (1, 6)] {
            let original = ramp(rows, cols);
            let restored = inverse(&forward(&original));

            for (i, (orig, result)) in original.as_slice().iter().zip(restored.as_slice()).enumerate() {
                assert!(
                    (*orig - *result).norm() < 1e-9,
                    "Mismatch at index {} for {}x{}: expected {}, got {}",
                    i, rows, cols, orig, result
                );
            }
        }
    }

    #[test]
    fn test_dc_only_kspace_gives_uniform_image() {
        let mut k = ComplexGrid::zeros(4, 4, 1).unwrap();
        k.set(2, 2, 0, Complex64::new(1.0, 0.0)).unwrap();

        let img = inverse(&k);
        for z in img.as_slice() {
            assert!((z.re - 1.0 / 16.0).abs() < 1e-12, "Expected uniform 1/16, got {}", z);
            assert!(z.im.abs() < 1e-12);
        }
    }

    #[test]
    fn test_forward_centers_dc() {
        // A constant image has all its energy at the k-space center
        for &(rows, cols) in &[(4, 4), (5, 5), (6, 3)] {
            let img = ComplexGrid::from_real(&vec![1.0; rows * cols], rows, cols).unwrap();
            let k = forward(&img);
            let center = k.get(rows / 2, cols / 2, 0).unwrap();
            assert!((center.re - (rows * cols) as f64).abs() < 1e-9);
            let rest: f64 = k.magnitude().iter().sum::<f64>() - center.norm();
            assert!(rest.abs() < 1e-9, "Energy leaked off center: {}", rest);
        }
    }

    #[test]
    fn test_per_channel_transform() {
        let mut planes = Vec::new();
        for ch in 0..3 {
            planes.push((0..16).map(|i| Complex64::new((i * (ch + 1)) as f64, 0.0)).collect());
        }
        let grid = ComplexGrid::from_channels(4, 4, planes).unwrap();
        let k = forward(&grid);

        // Channel 2 is three times channel 0, so its spectrum is too
        for (a, b) in k.channel(0).iter().zip(k.channel(2)) {
            assert!((*a * 3.0 - *b).norm() < 1e-9);
        }
    }
}
