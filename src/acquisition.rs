//! Acquisition simulation
//!
//! Simulates k-space being filled progressively during a scan. A fill order
//! (a [`Traversal`]) fixes the sequence in which phase-encode lines are read
//! and the readout direction of each line; the fill percentage says how many
//! samples along that sequence have been acquired so far. Everything not yet
//! acquired is zeroed before the other modifiers run.
//!
//! Playback timing lives in the UI. The core only exposes the mask as a pure
//! function of the percentage, plus the small play/pause/reset state machine
//! in [`Acquisition`].

use num_complex::Complex64;

use crate::error::{KspaceError, Result};
use crate::grid::ComplexGrid;

/// Line traversal strategy of a fill mode
pub trait Traversal: Send + Sync {
    /// Phase-encode line indices in acquisition order (a permutation of `0..rows`)
    fn line_order(&self, rows: usize) -> Vec<usize>;

    /// Whether the line acquired at `position` in the order is read right to left
    fn reversed(&self, _position: usize) -> bool {
        false
    }
}

/// Top to bottom, every line left to right
pub struct LinearTraversal;

impl Traversal for LinearTraversal {
    fn line_order(&self, rows: usize) -> Vec<usize> {
        (0..rows).collect()
    }
}

/// Center line first, then alternating one line above and one below
///
/// Order is `c, c-1, c+1, c-2, c+2, ...` with `c = rows/2`; once one side
/// runs out the remaining side continues alone.
pub struct CentricTraversal;

impl Traversal for CentricTraversal {
    fn line_order(&self, rows: usize) -> Vec<usize> {
        let c = rows / 2;
        let mut order = Vec::with_capacity(rows);
        if rows == 0 {
            return order;
        }
        order.push(c);
        for k in 1..rows {
            if k <= c {
                order.push(c - k);
            }
            if c + k < rows {
                order.push(c + k);
            }
            if order.len() == rows {
                break;
            }
        }
        order
    }
}

/// Single-shot blipped EPI: top to bottom, alternating readout direction
///
/// Even positions are read left to right, odd positions right to left, so
/// the trajectory zig-zags through k-space.
pub struct EpiBlippedTraversal;

impl Traversal for EpiBlippedTraversal {
    fn line_order(&self, rows: usize) -> Vec<usize> {
        (0..rows).collect()
    }

    fn reversed(&self, position: usize) -> bool {
        position % 2 == 1
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillMode {
    #[default]
    Linear,
    Centric,
    EpiBlipped,
}

impl FillMode {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(FillMode::Linear),
            1 => Some(FillMode::Centric),
            2 => Some(FillMode::EpiBlipped),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            FillMode::Linear => 0,
            FillMode::Centric => 1,
            FillMode::EpiBlipped => 2,
        }
    }

    pub fn traversal(&self) -> &'static dyn Traversal {
        match self {
            FillMode::Linear => &LinearTraversal,
            FillMode::Centric => &CentricTraversal,
            FillMode::EpiBlipped => &EpiBlippedTraversal,
        }
    }
}

/// The line currently being read out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartialLine {
    pub row: usize,
    /// Samples already acquired on this line
    pub samples: usize,
    /// Readout runs right to left
    pub reversed: bool,
}

/// Which parts of k-space have been acquired
#[derive(Clone, Debug, PartialEq)]
pub struct AcquisitionMask {
    /// Fully acquired phase-encode lines
    pub lines: Vec<bool>,
    pub partial: Option<PartialLine>,
}

impl AcquisitionMask {
    pub fn acquired_lines(&self) -> usize {
        self.lines.iter().filter(|&&l| l).count()
    }

    pub fn is_acquired(&self, row: usize, col: usize, cols: usize) -> bool {
        if self.lines.get(row).copied().unwrap_or(false) {
            return true;
        }
        match self.partial {
            Some(p) if p.row == row => {
                if p.reversed {
                    col >= cols - p.samples
                } else {
                    col < p.samples
                }
            }
            _ => false,
        }
    }

    /// Zero every sample that has not been acquired, on every channel
    pub fn apply(&self, grid: &mut ComplexGrid) {
        let (rows, cols) = (grid.rows(), grid.cols());
        let zero = Complex64::new(0.0, 0.0);
        for ch in 0..grid.channels() {
            for r in 0..rows {
                if self.lines.get(r).copied().unwrap_or(false) {
                    continue;
                }
                let line = grid.row_mut(ch, r);
                match self.partial {
                    Some(p) if p.row == r => {
                        let kept = if p.reversed {
                            cols - p.samples..cols
                        } else {
                            0..p.samples
                        };
                        for (c, z) in line.iter_mut().enumerate() {
                            if !kept.contains(&c) {
                                *z = zero;
                            }
                        }
                    }
                    _ => line.fill(zero),
                }
            }
        }
    }
}

/// Compute the acquisition mask for a fill percentage
///
/// # Arguments
/// * `rows`, `cols` - K-space dimensions
/// * `fill` - Acquisition progress in percent (0-100)
/// * `traversal` - Fill order
///
/// # Returns
/// Mask covering `floor(rows*cols*fill/100)` samples along the traversal
pub fn acquisition_mask(rows: usize, cols: usize, fill: f64, traversal: &dyn Traversal) -> Result<AcquisitionMask> {
    if !fill.is_finite() || !(0.0..=100.0).contains(&fill) {
        return Err(KspaceError::invalid("filling", format!("must be within 0..=100, got {}", fill)));
    }

    let total = rows * cols;
    let acquired = ((total as f64 * fill / 100.0).floor() as usize).min(total);
    let full_lines = if cols == 0 { 0 } else { acquired / cols };
    let remainder = if cols == 0 { 0 } else { acquired % cols };

    let order = traversal.line_order(rows);
    let mut lines = vec![false; rows];
    for &row in order.iter().take(full_lines) {
        lines[row] = true;
    }

    let partial = if remainder > 0 {
        order.get(full_lines).map(|&row| PartialLine {
            row,
            samples: remainder,
            reversed: traversal.reversed(full_lines),
        })
    } else {
        None
    };

    Ok(AcquisitionMask { lines, partial })
}

/// Zero the not-yet-acquired part of `grid`
///
/// A complete acquisition (100%) leaves the grid untouched.
pub fn apply_acquisition(grid: &mut ComplexGrid, fill: f64, mode: FillMode) -> Result<()> {
    let mask = acquisition_mask(grid.rows(), grid.cols(), fill, mode.traversal())?;
    if mask.acquired_lines() < grid.rows() {
        mask.apply(grid);
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not animating; the percentage stays where it is
    #[default]
    Idle,
    /// The UI timer is advancing the percentage toward 100
    Filling,
}

/// Play/pause/reset state of the acquisition animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Acquisition {
    state: PlaybackState,
    percentage: f64,
}

impl Default for Acquisition {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            percentage: 100.0,
        }
    }
}

impl Acquisition {
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Start filling from the current percentage, or from 0 if already complete
    pub fn play(&mut self) {
        if self.percentage >= 100.0 {
            self.percentage = 0.0;
        }
        self.state = PlaybackState::Filling;
    }

    /// Freeze the percentage
    pub fn pause(&mut self) {
        self.state = PlaybackState::Idle;
    }

    /// Cancel any animation and go back to an empty k-space
    pub fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.percentage = 0.0;
    }

    /// Jump to a percentage (slider drag) without changing the playback state
    pub fn seek(&mut self, percentage: f64) -> Result<()> {
        if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
            return Err(KspaceError::invalid(
                "filling",
                format!("must be within 0..=100, got {}", percentage),
            ));
        }
        self.percentage = percentage;
        Ok(())
    }

    /// Advance by one animation step; ignored while idle
    ///
    /// Returns the new percentage. Reaching 100 stops the animation.
    pub fn advance(&mut self, delta: f64) -> Result<f64> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(KspaceError::invalid(
                "filling",
                format!("step must be a non-negative number, got {}", delta),
            ));
        }
        if self.state == PlaybackState::Filling {
            self.percentage = (self.percentage + delta).min(100.0);
            if self.percentage >= 100.0 {
                self.state = PlaybackState::Idle;
            }
        }
        Ok(self.percentage)
    }
}
