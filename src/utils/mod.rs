//! Utility functions for reconstruction
//!
//! - SIMD-accelerated operations (optional, with `simd` feature)

pub mod simd_ops;
