//! Complex sample grids
//!
//! A `ComplexGrid` holds one or more equally sized 2-D planes of complex
//! samples (one plane per receive channel). Planes are stored back to back in
//! row-major order: index = col + row*cols + channel*rows*cols.

use num_complex::Complex64;

use crate::error::{KspaceError, Result};

/// Index into a channel-stacked grid (row-major, column fastest)
#[inline(always)]
pub fn idx3d(row: usize, col: usize, channel: usize, rows: usize, cols: usize) -> usize {
    col + row * cols + channel * rows * cols
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexGrid {
    rows: usize,
    cols: usize,
    channels: usize,
    data: Vec<Complex64>,
}

impl ComplexGrid {
    /// Create a zero-filled grid
    pub fn zeros(rows: usize, cols: usize, channels: usize) -> Result<Self> {
        check_dims(rows, cols, channels)?;
        Ok(Self {
            rows,
            cols,
            channels,
            data: vec![Complex64::new(0.0, 0.0); rows * cols * channels],
        })
    }

    /// Build a grid from already stacked samples (`channels * rows * cols` long)
    pub fn from_vec(rows: usize, cols: usize, channels: usize, data: Vec<Complex64>) -> Result<Self> {
        check_dims(rows, cols, channels)?;
        if data.len() != rows * cols * channels {
            return Err(KspaceError::UnsupportedShape(format!(
                "expected {} samples for {}x{}x{}, got {}",
                rows * cols * channels,
                channels,
                rows,
                cols,
                data.len()
            )));
        }
        Ok(Self { rows, cols, channels, data })
    }

    /// Build a multi-channel grid from one sample plane per channel
    ///
    /// Every plane must hold exactly `rows * cols` samples.
    pub fn from_channels(rows: usize, cols: usize, planes: Vec<Vec<Complex64>>) -> Result<Self> {
        let channels = planes.len();
        check_dims(rows, cols, channels)?;

        let mut data = Vec::with_capacity(rows * cols * channels);
        for (ch, plane) in planes.into_iter().enumerate() {
            if plane.len() != rows * cols {
                return Err(KspaceError::UnsupportedShape(format!(
                    "channel {} has {} samples, expected {}x{}",
                    ch,
                    plane.len(),
                    rows,
                    cols
                )));
            }
            data.extend(plane);
        }
        Ok(Self { rows, cols, channels, data })
    }

    /// Build a grid from interleaved `[re, im, re, im, ...]` values
    pub fn from_interleaved(values: &[f64], rows: usize, cols: usize, channels: usize) -> Result<Self> {
        if values.len() % 2 != 0 {
            return Err(KspaceError::UnsupportedShape(format!(
                "interleaved data needs an even number of values, got {}",
                values.len()
            )));
        }
        let data = values
            .chunks_exact(2)
            .map(|pair| Complex64::new(pair[0], pair[1]))
            .collect();
        Self::from_vec(rows, cols, channels, data)
    }

    /// Build a single-channel grid from real pixel intensities
    pub fn from_real(pixels: &[f64], rows: usize, cols: usize) -> Result<Self> {
        let data = pixels.iter().map(|&p| Complex64::new(p, 0.0)).collect();
        Self::from_vec(rows, cols, 1, data)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// (channels, rows, cols)
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels, self.rows, self.cols)
    }

    #[inline]
    pub fn plane_len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    /// Samples of one channel plane
    ///
    /// Panics if `channel >= channels()`; callers iterate `0..channels()`.
    pub fn channel(&self, channel: usize) -> &[Complex64] {
        let n = self.plane_len();
        &self.data[channel * n..(channel + 1) * n]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [Complex64] {
        let n = self.plane_len();
        &mut self.data[channel * n..(channel + 1) * n]
    }

    /// Iterate mutable channel planes
    pub fn planes_mut(&mut self) -> std::slice::ChunksExactMut<'_, Complex64> {
        let n = self.plane_len();
        self.data.chunks_exact_mut(n)
    }

    /// One row of one channel plane
    pub fn row_mut(&mut self, channel: usize, row: usize) -> &mut [Complex64] {
        let start = idx3d(row, 0, channel, self.rows, self.cols);
        let cols = self.cols;
        &mut self.data[start..start + cols]
    }

    fn check(&self, row: usize, col: usize, channel: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(KspaceError::OutOfBounds {
                row: row as i64,
                col: col as i64,
                rows: self.rows,
                cols: self.cols,
            });
        }
        if channel >= self.channels {
            return Err(KspaceError::invalid(
                "channel",
                format!("channel {} of {}", channel, self.channels),
            ));
        }
        Ok(idx3d(row, col, channel, self.rows, self.cols))
    }

    pub fn get(&self, row: usize, col: usize, channel: usize) -> Result<Complex64> {
        let idx = self.check(row, col, channel)?;
        Ok(self.data[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, channel: usize, value: Complex64) -> Result<()> {
        let idx = self.check(row, col, channel)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Magnitude of every sample, channel planes stacked
    pub fn magnitude(&self) -> Vec<f64> {
        self.data.iter().map(|z| z.norm()).collect()
    }

    /// Phase (argument) of every sample, channel planes stacked
    pub fn phase(&self) -> Vec<f64> {
        self.data.iter().map(|z| z.arg()).collect()
    }

    /// Display-compressed magnitude `ln(1 + scale*|z|)`
    pub fn log_magnitude(&self, scale: f64) -> Vec<f64> {
        self.data.iter().map(|z| (z.norm() * scale).ln_1p()).collect()
    }

    /// Copy with every sample multiplied by a real factor
    pub fn scaled_by(&self, factor: f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            channels: self.channels,
            data: self.data.iter().map(|&z| z * factor).collect(),
        }
    }

    /// Add `value` at (row, col) on every channel
    pub fn add_at(&mut self, row: usize, col: usize, value: Complex64) -> Result<()> {
        self.check(row, col, 0)?;
        for ch in 0..self.channels {
            self.data[idx3d(row, col, ch, self.rows, self.cols)] += value;
        }
        Ok(())
    }

    /// Zero every sample with `dr² + dc² <= radius²` on every channel
    ///
    /// The disk is clipped at the grid edges; only its center must lie inside.
    pub fn zero_disk(&mut self, row: usize, col: usize, radius: f64) -> Result<()> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(KspaceError::invalid(
                "radius",
                format!("must be a non-negative number, got {}", radius),
            ));
        }
        self.check(row, col, 0)?;

        // Nothing beyond the larger dimension can be reached
        let reach = radius.floor().min(self.rows.max(self.cols) as f64) as usize;
        let r_squared = radius * radius;
        let r0 = row.saturating_sub(reach);
        let r1 = row.saturating_add(reach).min(self.rows - 1);
        let c0 = col.saturating_sub(reach);
        let c1 = col.saturating_add(reach).min(self.cols - 1);
        let zero = Complex64::new(0.0, 0.0);

        for r in r0..=r1 {
            let dr = r as f64 - row as f64;
            for c in c0..=c1 {
                let dc = c as f64 - col as f64;
                if dr * dr + dc * dc <= r_squared {
                    for ch in 0..self.channels {
                        self.data[idx3d(r, c, ch, self.rows, self.cols)] = zero;
                    }
                }
            }
        }
        Ok(())
    }

    /// New grid made of the given rows (in the given order) of every channel
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self> {
        if rows.is_empty() {
            return Err(KspaceError::UnsupportedShape("row selection is empty".to_string()));
        }
        let mut data = Vec::with_capacity(rows.len() * self.cols * self.channels);
        for ch in 0..self.channels {
            for &r in rows {
                if r >= self.rows {
                    return Err(KspaceError::OutOfBounds {
                        row: r as i64,
                        col: 0,
                        rows: self.rows,
                        cols: self.cols,
                    });
                }
                let start = idx3d(r, 0, ch, self.rows, self.cols);
                data.extend_from_slice(&self.data[start..start + self.cols]);
            }
        }
        Ok(Self {
            rows: rows.len(),
            cols: self.cols,
            channels: self.channels,
            data,
        })
    }

    /// Number of rows (summed over channels) holding at least one non-zero sample
    pub fn nonzero_rows(&self) -> usize {
        self.data
            .chunks_exact(self.cols)
            .filter(|line| line.iter().any(|z| z.norm_sqr() > 0.0))
            .count()
    }
}

fn check_dims(rows: usize, cols: usize, channels: usize) -> Result<()> {
    if rows == 0 || cols == 0 || channels == 0 {
        return Err(KspaceError::UnsupportedShape(format!(
            "dimensions must be non-zero, got {}x{}x{}",
            channels, rows, cols
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_validation() {
        assert!(matches!(
            ComplexGrid::zeros(0, 4, 1),
            Err(KspaceError::UnsupportedShape(_))
        ));
        let planes = vec![vec![Complex64::new(1.0, 0.0); 16], vec![Complex64::new(1.0, 0.0); 15]];
        assert!(matches!(
            ComplexGrid::from_channels(4, 4, planes),
            Err(KspaceError::UnsupportedShape(_))
        ));
        assert!(ComplexGrid::from_interleaved(&[1.0, 2.0, 3.0], 1, 1, 1).is_err());
    }

    #[test]
    fn test_get_set_bounds() {
        let mut g = ComplexGrid::zeros(3, 5, 2).unwrap();
        g.set(2, 4, 1, Complex64::new(1.0, -1.0)).unwrap();
        assert_eq!(g.get(2, 4, 1).unwrap(), Complex64::new(1.0, -1.0));
        assert_eq!(g.get(2, 4, 0).unwrap(), Complex64::new(0.0, 0.0));
        assert!(matches!(g.get(3, 0, 0), Err(KspaceError::OutOfBounds { .. })));
        assert!(matches!(g.set(0, 5, 0, Complex64::new(0.0, 0.0)), Err(KspaceError::OutOfBounds { .. })));
    }

    #[test]
    fn test_add_at_all_channels() {
        let mut g = ComplexGrid::zeros(4, 4, 2).unwrap();
        g.add_at(1, 2, Complex64::new(10.0, 0.0)).unwrap();
        g.add_at(1, 2, Complex64::new(0.0, 1.0)).unwrap();
        for ch in 0..2 {
            assert_eq!(g.get(1, 2, ch).unwrap(), Complex64::new(10.0, 1.0));
        }
    }

    #[test]
    fn test_zero_disk_clipped() {
        let mut g = ComplexGrid::from_real(&vec![1.0; 25], 5, 5).unwrap();
        g.zero_disk(0, 0, 1.0).unwrap();
        // (0,0), (0,1), (1,0) inside; (1,1) at distance sqrt(2) outside
        assert_eq!(g.get(0, 0, 0).unwrap().re, 0.0);
        assert_eq!(g.get(0, 1, 0).unwrap().re, 0.0);
        assert_eq!(g.get(1, 0, 0).unwrap().re, 0.0);
        assert_eq!(g.get(1, 1, 0).unwrap().re, 1.0);

        assert!(matches!(g.zero_disk(0, 0, -1.0), Err(KspaceError::InvalidParameter { .. })));
        assert!(matches!(g.zero_disk(5, 0, 1.0), Err(KspaceError::OutOfBounds { .. })));
    }

    #[test]
    fn test_zero_disk_huge_radius_covers_grid() {
        let mut g = ComplexGrid::from_real(&vec![1.0; 25], 5, 5).unwrap();
        g.zero_disk(2, 2, 1e300).unwrap();
        assert_eq!(g.nonzero_rows(), 0);

        let mut g = ComplexGrid::from_real(&vec![1.0; 12], 3, 4).unwrap();
        g.zero_disk(2, 3, f64::MAX).unwrap();
        assert!(g.as_slice().iter().all(|z| z.norm() == 0.0));
    }

    #[test]
    fn test_log_magnitude_and_scaling() {
        let g = ComplexGrid::from_vec(1, 2, 1, vec![Complex64::new(3.0, 4.0), Complex64::new(0.0, 0.0)]).unwrap();
        assert_eq!(g.magnitude(), vec![5.0, 0.0]);
        let lm = g.log_magnitude(1.0);
        assert!((lm[0] - 6.0f64.ln()).abs() < 1e-12);
        assert_eq!(lm[1], 0.0);
        let s = g.scaled_by(2.0);
        assert_eq!(s.get(0, 0, 0).unwrap(), Complex64::new(6.0, 8.0));
    }

    #[test]
    fn test_select_rows() {
        let pixels: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let g = ComplexGrid::from_real(&pixels, 4, 3).unwrap();
        let s = g.select_rows(&[1, 3]).unwrap();
        assert_eq!(s.rows(), 2);
        assert_eq!(s.get(0, 0, 0).unwrap().re, 3.0);
        assert_eq!(s.get(1, 2, 0).unwrap().re, 11.0);
    }
}
