//! K-space explorer core: WebAssembly-accelerated MR reconstruction
//!
//! This crate owns raw complex k-space data, applies an ordered chain of
//! reversible modifiers to it and reconstructs the k-space and image rasters
//! for a browser front-end.
//!
//! # Modules
//! - `grid`: Channel-stacked complex sample grid
//! - `fft`: Centered 2D FFT using rustfft
//! - `modifiers`: Edits, windowing, truncation, filters, noise, undersampling, DC
//! - `acquisition`: Fill-order traversals, acquisition masks, playback
//! - `params`: Validated modifier parameter table
//! - `combine`: Root-sum-of-squares channel combination
//! - `pipeline`: Snapshot reconstruction
//! - `session`: Thread-safe interactive session
//! - `utils`: SIMD kernels

// Core modules
pub mod error;
pub mod fft;
pub mod grid;
pub mod raster;

// Algorithm modules
pub mod acquisition;
pub mod combine;
pub mod modifiers;
pub mod params;
pub mod pipeline;
pub mod utils;

// Session
pub mod session;

pub use acquisition::{Acquisition, FillMode, PlaybackState, Traversal};
pub use error::KspaceError;
pub use grid::ComplexGrid;
pub use params::{ModifierParameters, Parameter, ParameterValue};
pub use pipeline::{Reconstruction, Snapshot};
pub use raster::Raster;
pub use session::Session;

use log::info;
use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logger
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // A second init (module re-instantiation) is harmless
    let _ = console_log::init_with_level(log::Level::Info);
}

fn to_js(err: KspaceError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ============================================================================
// WASM Exports: Session
// ============================================================================

/// Browser handle on one k-space session
#[wasm_bindgen]
pub struct KspaceExplorer {
    session: Session,
    /// Most recent reconstruction, served to per-channel views
    last: parking_lot::Mutex<Option<Reconstruction>>,
}

#[wasm_bindgen]
impl KspaceExplorer {
    /// Create from raw k-space
    ///
    /// # Arguments
    /// * `interleaved` - Float64Array of `[re, im, ...]` pairs, (channels * rows * cols) samples
    /// * `rows`, `cols`, `channels` - Grid dimensions
    #[wasm_bindgen(constructor)]
    pub fn new(interleaved: &[f64], rows: usize, cols: usize, channels: usize) -> Result<KspaceExplorer, JsValue> {
        let raw = ComplexGrid::from_interleaved(interleaved, rows, cols, channels).map_err(to_js)?;
        Ok(KspaceExplorer::wrap(Session::new(raw)))
    }

    /// Create from a real-valued image (row-major, rows * cols)
    #[wasm_bindgen(js_name = fromImage)]
    pub fn from_image(pixels: &[f64], rows: usize, cols: usize) -> Result<KspaceExplorer, JsValue> {
        let session = Session::from_image(pixels, rows, cols).map_err(to_js)?;
        Ok(KspaceExplorer::wrap(session))
    }

    #[wasm_bindgen(js_name = loadRawKspace)]
    pub fn load_raw_kspace(&self, interleaved: &[f64], rows: usize, cols: usize, channels: usize) -> Result<(), JsValue> {
        let raw = ComplexGrid::from_interleaved(interleaved, rows, cols, channels).map_err(to_js)?;
        self.session.load_raw_kspace(raw);
        Ok(())
    }

    #[wasm_bindgen(js_name = loadImage)]
    pub fn load_image(&self, pixels: &[f64], rows: usize, cols: usize) -> Result<(), JsValue> {
        self.session.load_image(pixels, rows, cols).map_err(to_js)
    }

    /// [channels, rows, cols] of the loaded data
    pub fn shape(&self) -> Vec<u32> {
        let (channels, rows, cols) = self.session.shape();
        vec![channels as u32, rows as u32, cols as u32]
    }

    /// Set a parameter by name; booleans as 0/1, fill mode as 0/1/2
    #[wasm_bindgen(js_name = setParameter)]
    pub fn set_parameter(&self, name: &str, value: f64) -> Result<(), JsValue> {
        self.session.set_parameter_by_name(name, value).map_err(to_js)
    }

    /// Whether the control for `name` is currently usable
    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self, name: &str) -> Result<bool, JsValue> {
        let param: Parameter = name.parse().map_err(to_js)?;
        Ok(self.session.parameters().is_enabled(param))
    }

    #[wasm_bindgen(js_name = reseedNoise)]
    pub fn reseed_noise(&self) {
        self.session.reseed_noise();
    }

    #[wasm_bindgen(js_name = selectChannel)]
    pub fn select_channel(&self, channel: usize) -> Result<(), JsValue> {
        self.session.select_channel(channel).map_err(to_js)
    }

    // Edits

    #[wasm_bindgen(js_name = addSpike)]
    pub fn add_spike(&self, row: i32, col: i32, amplitude: f64) -> Result<(), JsValue> {
        self.session.add_spike(row as i64, col as i64, amplitude).map_err(to_js)
    }

    #[wasm_bindgen(js_name = undoSpike)]
    pub fn undo_spike(&self) -> bool {
        self.session.undo_spike().is_some()
    }

    #[wasm_bindgen(js_name = clearSpikes)]
    pub fn clear_spikes(&self) {
        self.session.clear_spikes();
    }

    #[wasm_bindgen(js_name = addPatch)]
    pub fn add_patch(&self, row: i32, col: i32, radius: f64) -> Result<(), JsValue> {
        self.session.add_patch(row as i64, col as i64, radius).map_err(to_js)
    }

    #[wasm_bindgen(js_name = undoPatch)]
    pub fn undo_patch(&self) -> bool {
        self.session.undo_patch().is_some()
    }

    #[wasm_bindgen(js_name = clearPatches)]
    pub fn clear_patches(&self) {
        self.session.clear_patches();
    }

    // Acquisition playback

    pub fn play(&self) {
        self.session.play();
    }

    pub fn pause(&self) {
        self.session.pause();
    }

    #[wasm_bindgen(js_name = resetAcquisition)]
    pub fn reset_acquisition(&self) {
        self.session.reset_acquisition();
    }

    /// Advance the fill animation; returns the new percentage
    #[wasm_bindgen(js_name = advanceAcquisition)]
    pub fn advance_acquisition(&self, delta: f64) -> Result<f64, JsValue> {
        self.session.advance_acquisition(delta).map_err(to_js)
    }

    #[wasm_bindgen(js_name = isFilling)]
    pub fn is_filling(&self) -> bool {
        self.session.playback_state() == PlaybackState::Filling
    }

    // Reconstruction

    pub fn generation(&self) -> f64 {
        self.session.generation() as f64
    }

    /// Reconstruct both rasters
    ///
    /// Returns a JS object with: kspace (Uint8Array), image (Uint8Array),
    /// channelImages (array of Uint8Array, empty for single-channel data),
    /// rows, cols, kspaceMin, kspaceMax, imageMin, imageMax, generation
    pub fn recompute(&self) -> Result<js_sys::Object, JsValue> {
        let result = self.session.recompute().map_err(to_js)?;
        let obj = js_sys::Object::new();

        let kspace = js_sys::Uint8Array::from(result.kspace.to_u8().as_slice());
        js_sys::Reflect::set(&obj, &"kspace".into(), &kspace)?;
        let image = js_sys::Uint8Array::from(result.image.to_u8().as_slice());
        js_sys::Reflect::set(&obj, &"image".into(), &image)?;

        let channel_images = js_sys::Array::new();
        for raster in &result.channel_images {
            channel_images.push(&js_sys::Uint8Array::from(raster.to_u8().as_slice()));
        }
        js_sys::Reflect::set(&obj, &"channelImages".into(), &channel_images)?;

        js_sys::Reflect::set(&obj, &"rows".into(), &JsValue::from(result.image.rows as u32))?;
        js_sys::Reflect::set(&obj, &"cols".into(), &JsValue::from(result.image.cols as u32))?;
        js_sys::Reflect::set(&obj, &"kspaceMin".into(), &JsValue::from(result.kspace.min))?;
        js_sys::Reflect::set(&obj, &"kspaceMax".into(), &JsValue::from(result.kspace.max))?;
        js_sys::Reflect::set(&obj, &"imageMin".into(), &JsValue::from(result.image.min))?;
        js_sys::Reflect::set(&obj, &"imageMax".into(), &JsValue::from(result.image.max))?;
        js_sys::Reflect::set(&obj, &"generation".into(), &JsValue::from(result.generation as f64))?;

        info!(
            "recompute: {}x{}, image [{:.3e}, {:.3e}]",
            result.image.rows, result.image.cols, result.image.min, result.image.max
        );

        *self.last.lock() = Some(result);
        Ok(obj)
    }

    /// Magnitude image of one channel as Float64Array (empty for single-channel data)
    ///
    /// Served from the last reconstruction; recomputes only when that one is stale.
    #[wasm_bindgen(js_name = channelImage)]
    pub fn channel_image(&self, channel: usize) -> Result<Vec<f64>, JsValue> {
        Ok(self.cached_channel(channel).map_err(to_js)?.unwrap_or_default())
    }
}

impl KspaceExplorer {
    fn wrap(session: Session) -> Self {
        Self {
            session,
            last: parking_lot::Mutex::new(None),
        }
    }

    fn cached_channel(&self, channel: usize) -> std::result::Result<Option<Vec<f64>>, KspaceError> {
        let mut last = self.last.lock();
        let stale = last.as_ref().map_or(true, |r| !self.session.is_current(r));
        if stale {
            *last = Some(self.session.recompute()?);
        }
        Ok(last
            .as_ref()
            .and_then(|r| r.channel_images.get(channel))
            .map(|r| r.data.clone()))
    }
}

// ============================================================================
// WASM Exports: Utilities
// ============================================================================

/// Get version string
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Names of all modifier parameters, in chain order
#[wasm_bindgen]
pub fn parameter_names() -> Vec<String> {
    Parameter::ALL.iter().map(|p| p.name().to_string()).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let version = get_version();
        assert!(!version.is_empty());
    }

    fn two_channel_explorer() -> KspaceExplorer {
        let mut raw = ComplexGrid::zeros(4, 4, 2).unwrap();
        raw.set(2, 2, 0, num_complex::Complex64::new(16.0, 0.0)).unwrap();
        raw.set(2, 2, 1, num_complex::Complex64::new(32.0, 0.0)).unwrap();
        KspaceExplorer::wrap(Session::new(raw))
    }

    #[test]
    fn test_channel_views_reuse_last_reconstruction() {
        let explorer = two_channel_explorer();
        let first = explorer.cached_channel(0).unwrap().unwrap();
        assert!(first.iter().all(|&v| (v - 1.0).abs() < 1e-12));
        let generation = explorer.last.lock().as_ref().map(|r| r.generation);

        let second = explorer.cached_channel(1).unwrap().unwrap();
        assert!(second.iter().all(|&v| (v - 2.0).abs() < 1e-12));
        assert_eq!(explorer.last.lock().as_ref().map(|r| r.generation), generation);
        assert_eq!(explorer.cached_channel(2).unwrap(), None);
    }

    #[test]
    fn test_channel_views_refresh_after_mutation() {
        let explorer = two_channel_explorer();
        explorer.cached_channel(0).unwrap();

        explorer.session.set_parameter(Parameter::HighPass, 100.0).unwrap();
        let blanked = explorer.cached_channel(0).unwrap().unwrap();
        assert!(blanked.iter().all(|&v| v == 0.0));
        let last = explorer.last.lock();
        assert!(last.as_ref().map_or(false, |r| explorer.session.is_current(r)));
    }

    #[test]
    fn test_parameter_names_parse_back() {
        for name in parameter_names() {
            assert!(name.parse::<Parameter>().is_ok(), "{}", name);
        }
    }
}
