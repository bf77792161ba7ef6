//! Gaussian noise injection
//!
//! Simulates an acquisition at a given SNR, with SNR [dB] = 20*log10(S/N),
//! S the mean k-space magnitude and N the noise standard deviation. Real and
//! imaginary parts receive independent noise. The generator is seeded so a
//! given (k-space, SNR, seed) always yields the same noisy data.

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::{KspaceError, Result};
use crate::grid::ComplexGrid;
use crate::params::{MIN_SNR, NOISE_OFF_SNR};

/// Noise standard deviation for a mean signal level and target SNR
#[inline]
pub fn noise_std(mean_signal: f64, snr_db: f64) -> f64 {
    mean_signal / 10f64.powf(snr_db / 20.0)
}

/// Add complex Gaussian noise at `snr_db`
///
/// # Arguments
/// * `grid` - Working k-space, modified in place
/// * `snr_db` - Target SNR; `NOISE_OFF_SNR` disables the stage
/// * `seed` - Noise realisation
///
/// # Returns
/// The standard deviation used (0 when disabled). An all-zero or non-finite
/// signal has no defined SNR and yields `NumericalDegenerate`, leaving the
/// grid untouched.
pub fn add_noise(grid: &mut ComplexGrid, snr_db: f64, seed: u64) -> Result<f64> {
    if !snr_db.is_finite() || !(MIN_SNR..=NOISE_OFF_SNR).contains(&snr_db) {
        return Err(KspaceError::invalid(
            "noise_snr",
            format!("must be within {}..={}, got {}", MIN_SNR, NOISE_OFF_SNR, snr_db),
        ));
    }
    if snr_db >= NOISE_OFF_SNR {
        return Ok(0.0);
    }

    let samples = grid.as_slice();
    let mean_signal = samples.iter().map(|z| z.norm()).sum::<f64>() / samples.len() as f64;
    if !mean_signal.is_finite() || mean_signal <= 0.0 {
        return Err(KspaceError::NumericalDegenerate(format!(
            "mean signal is {}, SNR undefined",
            mean_signal
        )));
    }

    let std = noise_std(mean_signal, snr_db);
    let mut rng = StdRng::seed_from_u64(seed);
    for z in grid.as_mut_slice() {
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        *z += Complex64::new(re * std, im * std);
    }
    Ok(std)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones(n: usize) -> ComplexGrid {
        ComplexGrid::from_real(&vec![1.0; n * n], n, n).unwrap()
    }

    #[test]
    fn test_noise_deterministic_per_seed() {
        let mut a = ones(16);
        let mut b = ones(16);
        let mut c = ones(16);
        add_noise(&mut a, 0.0, 7).unwrap();
        add_noise(&mut b, 0.0, 7).unwrap();
        add_noise(&mut c, 0.0, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_noise_level_matches_snr() {
        let mut g = ones(128);
        let std = add_noise(&mut g, 20.0, 1).unwrap();
        assert!((std - 0.1).abs() < 1e-12);

        let n = g.as_slice().len() as f64;
        let var_re = g.as_slice().iter().map(|z| (z.re - 1.0).powi(2)).sum::<f64>() / n;
        let var_im = g.as_slice().iter().map(|z| z.im.powi(2)).sum::<f64>() / n;
        assert!((var_re.sqrt() - 0.1).abs() < 0.005, "re std {}", var_re.sqrt());
        assert!((var_im.sqrt() - 0.1).abs() < 0.005, "im std {}", var_im.sqrt());
    }

    #[test]
    fn test_noise_off_and_degenerate() {
        let mut g = ones(4);
        assert_eq!(add_noise(&mut g, NOISE_OFF_SNR, 1).unwrap(), 0.0);
        assert_eq!(g, ones(4));

        let mut z = ComplexGrid::zeros(4, 4, 1).unwrap();
        assert!(matches!(add_noise(&mut z, 10.0, 1), Err(KspaceError::NumericalDegenerate(_))));
        assert_eq!(z, ComplexGrid::zeros(4, 4, 1).unwrap());

        assert!(matches!(add_noise(&mut g, 31.0, 1), Err(KspaceError::InvalidParameter { .. })));
    }
}
