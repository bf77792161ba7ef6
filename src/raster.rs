//! Output rasters
//!
//! Real, non-negative intensity images handed to the renderer. Each carries
//! its own value range; windowing and gamma happen downstream.

#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

impl Raster {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        let (min, max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let (min, max) = if data.is_empty() { (0.0, 0.0) } else { (min, max) };
        Self { rows, cols, data, min, max }
    }

    /// Stretch [min, max] to 0..=255 for 8-bit display and export
    ///
    /// A flat raster maps to all zeros.
    pub fn to_u8(&self) -> Vec<u8> {
        let range = self.max - self.min;
        if range.is_nan() || range <= 0.0 {
            return vec![0; self.data.len()];
        }
        self.data
            .iter()
            .map(|&v| ((v - self.min) / range * 255.0).floor().clamp(0.0, 255.0) as u8)
            .collect()
    }
}
