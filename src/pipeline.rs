//! Reconstruction pipeline
//!
//! Pure reconstruction of one parameter snapshot: the working k-space is
//! rebuilt from the raw data on every call, run through the modifier chain
//! in a fixed order, inverse transformed per channel and combined.
//!
//! Order: edits, acquisition mask, Hamming, partial Fourier, scan
//! percentage, high-pass, low-pass, noise, undersampling, DC attenuation.

use std::sync::Arc;

use log::{debug, warn};

use crate::acquisition::apply_acquisition;
use crate::combine::{channel_magnitudes, root_sum_of_squares};
use crate::error::{KspaceError, Result};
use crate::fft::Fft2dWorkspace;
use crate::grid::ComplexGrid;
use crate::modifiers::{
    add_noise, apply_edits, apply_hamming, decrease_dc, high_pass, low_pass, partial_fourier,
    scan_percentage, undersample, EditList,
};
use crate::params::ModifierParameters;
use crate::raster::Raster;

/// Everything a reconstruction depends on, captured atomically
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub raw: Arc<ComplexGrid>,
    pub edits: EditList,
    pub params: ModifierParameters,
    /// Channel shown in the k-space raster
    pub display_channel: usize,
    pub generation: u64,
}

/// The two rasters of one recompute
#[derive(Clone, Debug, PartialEq)]
pub struct Reconstruction {
    /// ln(1 + |k| * 10^kspace_scale) of the displayed channel
    pub kspace: Raster,
    /// Composite magnitude image
    pub image: Raster,
    /// Per-channel magnitude images (empty for single-channel data)
    pub channel_images: Vec<Raster>,
    /// Session generation the snapshot was taken at
    pub generation: u64,
}

/// Run the k-space modifier chain on a fresh copy of `raw`
///
/// # Returns
/// The working k-space. Its row count shrinks when compressed undersampling
/// is active.
pub fn apply_modifiers(raw: &ComplexGrid, edits: &EditList, params: &ModifierParameters) -> Result<ComplexGrid> {
    let mut k = raw.clone();

    if !edits.is_empty() {
        apply_edits(&mut k, edits)?;
        debug!("edits: {} spikes, {} patches", edits.spikes().count(), edits.patches().count());
    }

    if params.filling < 100.0 {
        apply_acquisition(&mut k, params.filling, params.filling_mode)?;
        debug!("acquisition: {:.1}% ({:?})", params.filling, params.filling_mode);
    }

    if params.hamming {
        apply_hamming(&mut k);
        debug!("hamming window applied");
    }

    partial_fourier(&mut k, params.partial_fourier, params.zero_fill)?;
    scan_percentage(&mut k, params.scan_percentage)?;
    high_pass(&mut k, params.high_pass)?;
    low_pass(&mut k, params.low_pass)?;

    match add_noise(&mut k, params.noise_snr, params.noise_seed) {
        Ok(std) if std > 0.0 => debug!("noise: snr={:.1}dB std={:.4e}", params.noise_snr, std),
        Ok(_) => {}
        Err(KspaceError::NumericalDegenerate(reason)) => warn!("noise skipped: {}", reason),
        Err(e) => return Err(e),
    }

    undersample(&mut k, params.undersample, params.compress)?;
    decrease_dc(&mut k, params.decrease_dc)?;

    Ok(k)
}

/// Reconstruct both rasters for a snapshot with a one-off transform plan
pub fn reconstruct(snapshot: &Snapshot) -> Result<Reconstruction> {
    reconstruct_with(snapshot, &mut None)
}

/// Reconstruct both rasters, reusing the transform plan in `workspace`
///
/// The workspace is replanned only when the working k-space shape differs
/// from the cached one (new data, or compressed undersampling toggled).
pub fn reconstruct_with(snapshot: &Snapshot, workspace: &mut Option<Fft2dWorkspace>) -> Result<Reconstruction> {
    let raw = snapshot.raw.as_ref();
    let params = &snapshot.params;
    if snapshot.display_channel >= raw.channels() {
        return Err(KspaceError::invalid(
            "channel",
            format!("channel {} of {}", snapshot.display_channel, raw.channels()),
        ));
    }

    let mut k = apply_modifiers(raw, &snapshot.edits, params)?;
    let (rows, cols) = (k.rows(), k.cols());

    let scale = params.kspace_display_factor();
    let kspace_view: Vec<f64> = k
        .channel(snapshot.display_channel)
        .iter()
        .map(|z| (z.norm() * scale).ln_1p())
        .collect();
    let kspace = Raster::new(rows, cols, kspace_view);

    if workspace.as_ref().map_or(true, |ws| ws.dims() != (rows, cols)) {
        debug!("planning {}x{} transform", rows, cols);
        *workspace = Some(Fft2dWorkspace::new(rows, cols));
    }
    workspace
        .get_or_insert_with(|| Fft2dWorkspace::new(rows, cols))
        .inverse_inplace(&mut k);

    let image = Raster::new(rows, cols, root_sum_of_squares(&k));
    let channel_images = if k.channels() > 1 {
        channel_magnitudes(&k)
            .into_iter()
            .map(|m| Raster::new(rows, cols, m))
            .collect()
    } else {
        Vec::new()
    };

    debug!(
        "reconstructed {}x{}x{} (generation {}), image range [{:.4e}, {:.4e}]",
        k.channels(), rows, cols, snapshot.generation, image.min, image.max
    );

    Ok(Reconstruction {
        kspace,
        image,
        channel_images,
        generation: snapshot.generation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft;
    use crate::params::Parameter;
    use num_complex::Complex64;

    fn snapshot(raw: ComplexGrid) -> Snapshot {
        Snapshot {
            raw: Arc::new(raw),
            edits: EditList::new(),
            params: ModifierParameters::default(),
            display_channel: 0,
            generation: 0,
        }
    }

    fn phantom(rows: usize, cols: usize) -> ComplexGrid {
        // Box plus an irregular texture so no k-space line is exactly zero
        let mut pixels: Vec<f64> = (0..rows * cols).map(|i| ((i * 37 + 11) % 17) as f64 * 0.1).collect();
        for r in rows / 4..3 * rows / 4 {
            for c in cols / 4..3 * cols / 4 {
                pixels[r * cols + c] += 1.0 + ((r + c) % 3) as f64;
            }
        }
        fft::forward(&ComplexGrid::from_real(&pixels, rows, cols).unwrap())
    }

    fn dc_only() -> ComplexGrid {
        let mut k = ComplexGrid::zeros(4, 4, 1).unwrap();
        k.set(2, 2, 0, Complex64::new(1.0, 0.0)).unwrap();
        k
    }

    #[test]
    fn test_default_parameters_reproduce_image() {
        let rows = 8;
        let mut pixels = vec![0.0; 64];
        pixels[3 * 8 + 4] = 2.0;
        pixels[5 * 8 + 1] = 1.0;
        let k = fft::forward(&ComplexGrid::from_real(&pixels, rows, rows).unwrap());

        let rec = reconstruct(&snapshot(k)).unwrap();
        for (a, b) in rec.image.data.iter().zip(&pixels) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(rec.channel_images.is_empty());
    }

    #[test]
    fn test_recompute_is_bit_identical() {
        let mut snap = snapshot(phantom(16, 16));
        snap.params.set(Parameter::NoiseSnr, 5.0).unwrap();
        snap.params.set(Parameter::Hamming, true).unwrap();
        snap.params.set(Parameter::Filling, 70.0).unwrap();
        snap.edits.add_spike(1, 1, 50.0, 16, 16).unwrap();

        let a = reconstruct(&snap).unwrap();
        let b = reconstruct(&snap).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dc_only_uniform_image() {
        let rec = reconstruct(&snapshot(dc_only())).unwrap();
        for &v in &rec.image.data {
            assert!((v - 1.0 / 16.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_spike_contribution_is_linear() {
        let base = snapshot(dc_only());
        let mut spiked = base.clone();
        spiked.edits.add_spike(0, 0, 10.0, 4, 4).unwrap();

        let k_base = apply_modifiers(&base.raw, &base.edits, &base.params).unwrap();
        let k_spiked = apply_modifiers(&spiked.raw, &spiked.edits, &spiked.params).unwrap();
        let img_base = fft::inverse(&k_base);
        let img_spiked = fft::inverse(&k_spiked);

        let mut spike_only = ComplexGrid::zeros(4, 4, 1).unwrap();
        spike_only.set(0, 0, 0, Complex64::new(10.0, 0.0)).unwrap();
        let img_spike = fft::inverse(&spike_only);

        let mut differs = false;
        for i in 0..16 {
            let diff = img_spiked.as_slice()[i] - img_base.as_slice()[i];
            assert!((diff - img_spike.as_slice()[i]).norm() < 1e-12);
            differs |= diff.norm() > 1e-6;
        }
        assert!(differs);

        let rec_base = reconstruct(&base).unwrap();
        let rec_spiked = reconstruct(&spiked).unwrap();
        assert_ne!(rec_base.image, rec_spiked.image);
    }

    #[test]
    fn test_low_pass_zero_keeps_dc_only_image() {
        let base = reconstruct(&snapshot(dc_only())).unwrap();
        let mut snap = snapshot(dc_only());
        snap.params.set(Parameter::LowPass, 0.0).unwrap();
        let filtered = reconstruct(&snap).unwrap();
        assert_eq!(base.image, filtered.image);
    }

    #[test]
    fn test_full_high_pass_blanks_image() {
        let mut snap = snapshot(dc_only());
        snap.params.set(Parameter::HighPass, 100.0).unwrap();
        let rec = reconstruct(&snap).unwrap();
        assert!(rec.image.max < 1e-12);
    }

    #[test]
    fn test_undersample_compress_shrinks_output() {
        let mut snap = snapshot(phantom(16, 16));
        snap.params.set(Parameter::Undersample, 2.0).unwrap();

        let k = apply_modifiers(&snap.raw, &snap.edits, &snap.params).unwrap();
        assert_eq!(k.rows(), 16);
        assert_eq!(k.nonzero_rows(), 8);

        snap.params.set(Parameter::Compress, true).unwrap();
        let rec = reconstruct(&snap).unwrap();
        assert_eq!((rec.image.rows, rec.image.cols), (8, 16));
        assert_eq!((rec.kspace.rows, rec.kspace.cols), (8, 16));
    }

    #[test]
    fn test_degenerate_noise_is_skipped() {
        let mut snap = snapshot(ComplexGrid::zeros(4, 4, 1).unwrap());
        snap.params.set(Parameter::NoiseSnr, 0.0).unwrap();
        let rec = reconstruct(&snap).unwrap();
        assert!(rec.image.data.iter().all(|v| v.is_finite() && *v == 0.0));
    }

    #[test]
    fn test_multichannel_rss_and_display_channel() {
        let a = phantom(8, 8);
        let b = a.scaled_by(2.0);
        let planes = vec![a.channel(0).to_vec(), b.channel(0).to_vec()];
        let raw = ComplexGrid::from_channels(8, 8, planes).unwrap();

        let mut snap = snapshot(raw);
        let rec = reconstruct(&snap).unwrap();
        assert_eq!(rec.channel_images.len(), 2);
        for ((&comp, &m0), &m1) in rec
            .image
            .data
            .iter()
            .zip(&rec.channel_images[0].data)
            .zip(&rec.channel_images[1].data)
        {
            assert!((comp - (m0 * m0 + m1 * m1).sqrt()).abs() < 1e-9);
            assert!((m1 - 2.0 * m0).abs() < 1e-9);
        }

        snap.display_channel = 1;
        let rec1 = reconstruct(&snap).unwrap();
        assert!(rec1.kspace.max > rec.kspace.max);

        snap.display_channel = 2;
        assert!(reconstruct(&snap).is_err());
    }

    #[test]
    fn test_workspace_reused_until_shape_changes() {
        let mut snap = snapshot(phantom(16, 16));
        let mut workspace = None;

        let first = reconstruct_with(&snap, &mut workspace).unwrap();
        assert_eq!(workspace.as_ref().map(|ws| ws.dims()), Some((16, 16)));
        assert_eq!(first, reconstruct(&snap).unwrap());

        snap.params.set(Parameter::Undersample, 2.0).unwrap();
        snap.params.set(Parameter::Compress, true).unwrap();
        let compressed = reconstruct_with(&snap, &mut workspace).unwrap();
        assert_eq!(workspace.as_ref().map(|ws| ws.dims()), Some((8, 16)));
        assert_eq!(compressed, reconstruct(&snap).unwrap());

        snap.params.set(Parameter::Compress, false).unwrap();
        let restored = reconstruct_with(&snap, &mut workspace).unwrap();
        assert_eq!(workspace.as_ref().map(|ws| ws.dims()), Some((16, 16)));
        assert_eq!(restored, reconstruct(&snap).unwrap());
    }

    #[test]
    fn test_kspace_raster_uses_display_scale() {
        let mut snap = snapshot(dc_only());
        snap.params.set(Parameter::KspaceScale, 0.0).unwrap();
        let rec = reconstruct(&snap).unwrap();
        assert!((rec.kspace.max - 2f64.ln()).abs() < 1e-12);
        assert_eq!(rec.kspace.min, 0.0);
    }
}
