//! K-space modifiers
//!
//! Each modifier works in place on a working copy of k-space and validates
//! its own argument, failing with `InvalidParameter` rather than clamping:
//! - `edits`: user-placed spikes (additive) and patches (zeroed disks)
//! - `window`: Hamming apodization along the phase-encode direction
//! - `truncation`: partial Fourier (zero-fill or conjugate symmetry) and scan percentage
//! - `filters`: circular high-pass and low-pass masks
//! - `noise`: complex Gaussian noise at a target SNR
//! - `undersample`: every Nth line from the center, optionally compressed
//! - `dc`: attenuation of the strongest sample

pub mod edits;
pub mod window;
pub mod truncation;
pub mod filters;
pub mod noise;
pub mod undersample;
pub mod dc;

pub use edits::*;
pub use window::*;
pub use truncation::*;
pub use filters::*;
pub use noise::*;
pub use undersample::*;
pub use dc::*;

use crate::error::{KspaceError, Result};

/// Reject percentages outside 0..=100 (and NaN)
pub(crate) fn check_percent(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(KspaceError::invalid(name, format!("must be within 0..=100, got {}", value)));
    }
    Ok(())
}
