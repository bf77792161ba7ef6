//! SIMD-accelerated operations for reconstruction
//!
//! Vectorized kernels for the per-pixel work after the inverse transform
//! (squared magnitudes, root-sum-of-squares). When the `simd` feature is
//! enabled they use 256-bit `f64x4` lanes from `wide`, which lower to
//! SSE/AVX/NEON natively and to WASM SIMD in the browser build.
//!
//! All operations have scalar fallbacks when SIMD is disabled.

use num_complex::Complex64;

#[cfg(feature = "simd")]
use wide::f64x4;

/// SIMD lane width (4 for f64x4)
#[cfg(feature = "simd")]
pub const SIMD_WIDTH: usize = 4;

#[cfg(not(feature = "simd"))]
pub const SIMD_WIDTH: usize = 1;

// ============================================================================
// Squared Magnitude Accumulation
// ============================================================================

/// Accumulate acc[i] += |z[i]|^2
#[cfg(feature = "simd")]
#[inline]
pub fn accumulate_norm_sqr(acc: &mut [f64], z: &[Complex64]) {
    debug_assert_eq!(acc.len(), z.len());
    let n = acc.len();
    let chunks = n / SIMD_WIDTH;
    let remainder = n % SIMD_WIDTH;

    for i in 0..chunks {
        let idx = i * SIMD_WIDTH;
        let s = &z[idx..idx + SIMD_WIDTH];
        let re = f64x4::new([s[0].re, s[1].re, s[2].re, s[3].re]);
        let im = f64x4::new([s[0].im, s[1].im, s[2].im, s[3].im]);
        let va = f64x4::new([acc[idx], acc[idx + 1], acc[idx + 2], acc[idx + 3]]);
        let result = va + re * re + im * im;
        acc[idx..idx + SIMD_WIDTH].copy_from_slice(&result.to_array());
    }

    let start = chunks * SIMD_WIDTH;
    for i in 0..remainder {
        acc[start + i] += z[start + i].norm_sqr();
    }
}

#[cfg(not(feature = "simd"))]
#[inline]
pub fn accumulate_norm_sqr(acc: &mut [f64], z: &[Complex64]) {
    debug_assert_eq!(acc.len(), z.len());
    for (a, v) in acc.iter_mut().zip(z.iter()) {
        *a += v.norm_sqr();
    }
}

// ============================================================================
// Element-wise Square Root
// ============================================================================

/// a[i] = sqrt(a[i])
#[cfg(feature = "simd")]
#[inline]
pub fn sqrt_inplace(a: &mut [f64]) {
    let n = a.len();
    let chunks = n / SIMD_WIDTH;
    let remainder = n % SIMD_WIDTH;

    for i in 0..chunks {
        let idx = i * SIMD_WIDTH;
        let va = f64x4::new([a[idx], a[idx + 1], a[idx + 2], a[idx + 3]]);
        a[idx..idx + SIMD_WIDTH].copy_from_slice(&va.sqrt().to_array());
    }

    let start = chunks * SIMD_WIDTH;
    for i in 0..remainder {
        a[start + i] = a[start + i].sqrt();
    }
}

#[cfg(not(feature = "simd"))]
#[inline]
pub fn sqrt_inplace(a: &mut [f64]) {
    for v in a.iter_mut() {
        *v = v.sqrt();
    }
}
