//! Interactive session
//!
//! Owns the raw k-space and everything the user changes on top of it. State
//! lives behind one lock and is snapshotted for each recompute, so UI events
//! can keep mutating while a reconstruction runs. Recomputes themselves are
//! serialised through a second lock.

use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;

use crate::acquisition::{Acquisition, PlaybackState};
use crate::error::{KspaceError, Result};
use crate::fft::{self, Fft2dWorkspace};
use crate::grid::ComplexGrid;
use crate::modifiers::{EditList, Patch, Spike};
use crate::params::{ModifierParameters, Parameter, ParameterValue};
use crate::pipeline::{reconstruct_with, Reconstruction, Snapshot};

struct SessionState {
    raw: Arc<ComplexGrid>,
    edits: EditList,
    params: ModifierParameters,
    display_channel: usize,
    acquisition: Acquisition,
    generation: u64,
}

impl SessionState {
    fn new(raw: ComplexGrid) -> Self {
        Self {
            raw: Arc::new(raw),
            edits: EditList::new(),
            params: ModifierParameters::default(),
            display_channel: 0,
            acquisition: Acquisition::default(),
            generation: 0,
        }
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Mirror the playback percentage into the filling parameter
    fn sync_filling(&mut self) {
        self.params.filling = self.acquisition.percentage();
    }
}

pub struct Session {
    state: Mutex<SessionState>,
    /// Held for the duration of a recompute; caches the transform plan
    compute: Mutex<Option<Fft2dWorkspace>>,
}

impl Session {
    pub fn new(raw: ComplexGrid) -> Self {
        info!("session: {}x{}x{} k-space", raw.channels(), raw.rows(), raw.cols());
        Self {
            state: Mutex::new(SessionState::new(raw)),
            compute: Mutex::new(None),
        }
    }

    /// Start a session from a real-valued image
    pub fn from_image(pixels: &[f64], rows: usize, cols: usize) -> Result<Self> {
        let image = ComplexGrid::from_real(pixels, rows, cols)?;
        Ok(Self::new(fft::forward(&image)))
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace the raw data and reset edits, parameters and acquisition
    pub fn load_raw_kspace(&self, raw: ComplexGrid) {
        info!("load: {}x{}x{} k-space", raw.channels(), raw.rows(), raw.cols());
        let mut state = self.state.lock();
        let generation = state.generation;
        *state = SessionState::new(raw);
        state.generation = generation;
        state.touch();
    }

    /// Forward-transform a real image and load it as raw k-space
    ///
    /// A shape error leaves the current session untouched.
    pub fn load_image(&self, pixels: &[f64], rows: usize, cols: usize) -> Result<()> {
        let image = ComplexGrid::from_real(pixels, rows, cols)?;
        self.load_raw_kspace(fft::forward(&image));
        Ok(())
    }

    /// (channels, rows, cols) of the raw data
    pub fn shape(&self) -> (usize, usize, usize) {
        self.state.lock().raw.shape()
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    pub fn set_parameter(&self, param: Parameter, value: impl Into<ParameterValue>) -> Result<()> {
        let value = value.into();
        let mut state = self.state.lock();
        state.params.set(param, value)?;
        if param == Parameter::Filling {
            let filling = state.params.filling;
            state.acquisition.seek(filling)?;
        }
        state.touch();
        debug!("set {} = {:?}", param, value);
        Ok(())
    }

    pub fn set_parameter_by_name(&self, name: &str, value: f64) -> Result<()> {
        let mut state = self.state.lock();
        state.params.set_by_name(name, value)?;
        if name == Parameter::Filling.name() {
            let filling = state.params.filling;
            state.acquisition.seek(filling)?;
        }
        state.touch();
        debug!("set {} = {}", name, value);
        Ok(())
    }

    pub fn parameters(&self) -> ModifierParameters {
        self.state.lock().params.clone()
    }

    /// New noise realisation at the current SNR
    pub fn reseed_noise(&self) {
        let mut state = self.state.lock();
        state.params.reseed_noise();
        state.touch();
    }

    /// Choose which channel the k-space raster shows
    pub fn select_channel(&self, channel: usize) -> Result<()> {
        let mut state = self.state.lock();
        let channels = state.raw.channels();
        if channel >= channels {
            return Err(KspaceError::invalid(
                "channel",
                format!("channel {} of {}", channel, channels),
            ));
        }
        state.display_channel = channel;
        state.touch();
        Ok(())
    }

    pub fn display_channel(&self) -> usize {
        self.state.lock().display_channel
    }

    // ========================================================================
    // Edits
    // ========================================================================

    pub fn add_spike(&self, row: i64, col: i64, amplitude: f64) -> Result<()> {
        let mut state = self.state.lock();
        let (rows, cols) = (state.raw.rows(), state.raw.cols());
        state.edits.add_spike(row, col, amplitude, rows, cols)?;
        state.touch();
        Ok(())
    }

    pub fn undo_spike(&self) -> Option<Spike> {
        let mut state = self.state.lock();
        let spike = state.edits.undo_spike();
        if spike.is_some() {
            state.touch();
        }
        spike
    }

    pub fn clear_spikes(&self) {
        let mut state = self.state.lock();
        state.edits.clear_spikes();
        state.touch();
    }

    pub fn add_patch(&self, row: i64, col: i64, radius: f64) -> Result<()> {
        let mut state = self.state.lock();
        let (rows, cols) = (state.raw.rows(), state.raw.cols());
        state.edits.add_patch(row, col, radius, rows, cols)?;
        state.touch();
        Ok(())
    }

    pub fn undo_patch(&self) -> Option<Patch> {
        let mut state = self.state.lock();
        let patch = state.edits.undo_patch();
        if patch.is_some() {
            state.touch();
        }
        patch
    }

    pub fn clear_patches(&self) {
        let mut state = self.state.lock();
        state.edits.clear_patches();
        state.touch();
    }

    pub fn edits(&self) -> EditList {
        self.state.lock().edits.clone()
    }

    // ========================================================================
    // Acquisition playback
    // ========================================================================

    pub fn play(&self) {
        let mut state = self.state.lock();
        state.acquisition.play();
        state.sync_filling();
        state.touch();
    }

    pub fn pause(&self) {
        let mut state = self.state.lock();
        state.acquisition.pause();
        state.touch();
    }

    pub fn reset_acquisition(&self) {
        let mut state = self.state.lock();
        state.acquisition.reset();
        state.sync_filling();
        state.touch();
    }

    /// One animation tick; returns the new fill percentage
    pub fn advance_acquisition(&self, delta: f64) -> Result<f64> {
        let mut state = self.state.lock();
        let before = state.acquisition.percentage();
        let percentage = state.acquisition.advance(delta)?;
        if percentage != before {
            state.sync_filling();
            state.touch();
        }
        Ok(percentage)
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state.lock().acquisition.state()
    }

    // ========================================================================
    // Recompute
    // ========================================================================

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            raw: Arc::clone(&state.raw),
            edits: state.edits.clone(),
            params: state.params.clone(),
            display_channel: state.display_channel,
            generation: state.generation,
        }
    }

    /// Reconstruct the current state, waiting for any recompute in flight
    pub fn recompute(&self) -> Result<Reconstruction> {
        let mut workspace = self.compute.lock();
        reconstruct_with(&self.snapshot(), &mut workspace)
    }

    /// Reconstruct unless another recompute is already running
    ///
    /// Returns `None` when the call was coalesced into the running one.
    pub fn try_recompute(&self) -> Option<Result<Reconstruction>> {
        let mut workspace = self.compute.try_lock()?;
        Some(reconstruct_with(&self.snapshot(), &mut workspace))
    }

    /// Whether `result` still reflects the latest state
    pub fn is_current(&self, result: &Reconstruction) -> bool {
        result.generation == self.generation()
    }
}
