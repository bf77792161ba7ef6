//! Spike and patch edits
//!
//! Spikes superimpose a real amplitude on one sample; patches zero a disk of
//! samples. Both are kept in their own undoable list, and every edit carries
//! a sequence number so replay follows the order the user placed them in.

use num_complex::Complex64;

use crate::error::{KspaceError, Result};
use crate::grid::ComplexGrid;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spike {
    pub row: usize,
    pub col: usize,
    pub amplitude: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Patch {
    pub row: usize,
    pub col: usize,
    pub radius: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Edit {
    Spike(Spike),
    Patch(Patch),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditList {
    spikes: Vec<(u64, Spike)>,
    patches: Vec<(u64, Patch)>,
    next_seq: u64,
}

/// Bounds-check a UI coordinate against a `rows x cols` grid
fn locate(row: i64, col: i64, rows: usize, cols: usize) -> Result<(usize, usize)> {
    if row < 0 || col < 0 || row as u64 >= rows as u64 || col as u64 >= cols as u64 {
        return Err(KspaceError::OutOfBounds { row, col, rows, cols });
    }
    Ok((row as usize, col as usize))
}

impl EditList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a spike at (row, col) of a `rows x cols` grid
    pub fn add_spike(&mut self, row: i64, col: i64, amplitude: f64, rows: usize, cols: usize) -> Result<()> {
        if !amplitude.is_finite() {
            return Err(KspaceError::invalid("amplitude", format!("must be finite, got {}", amplitude)));
        }
        let (row, col) = locate(row, col, rows, cols)?;
        self.spikes.push((self.next_seq, Spike { row, col, amplitude }));
        self.next_seq += 1;
        Ok(())
    }

    /// Record a patch centered at (row, col) of a `rows x cols` grid
    pub fn add_patch(&mut self, row: i64, col: i64, radius: f64, rows: usize, cols: usize) -> Result<()> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(KspaceError::invalid("radius", format!("must be a non-negative number, got {}", radius)));
        }
        let (row, col) = locate(row, col, rows, cols)?;
        self.patches.push((self.next_seq, Patch { row, col, radius }));
        self.next_seq += 1;
        Ok(())
    }

    /// Remove the most recent spike, returning it
    pub fn undo_spike(&mut self) -> Option<Spike> {
        self.spikes.pop().map(|(_, s)| s)
    }

    pub fn undo_patch(&mut self) -> Option<Patch> {
        self.patches.pop().map(|(_, p)| p)
    }

    pub fn clear_spikes(&mut self) {
        self.spikes.clear();
    }

    pub fn clear_patches(&mut self) {
        self.patches.clear();
    }

    pub fn spikes(&self) -> impl Iterator<Item = &Spike> {
        self.spikes.iter().map(|(_, s)| s)
    }

    pub fn patches(&self) -> impl Iterator<Item = &Patch> {
        self.patches.iter().map(|(_, p)| p)
    }

    pub fn is_empty(&self) -> bool {
        self.spikes.is_empty() && self.patches.is_empty()
    }

    /// All edits in insertion order
    pub fn in_order(&self) -> Vec<Edit> {
        let mut merged: Vec<(u64, Edit)> = self
            .spikes
            .iter()
            .map(|&(seq, s)| (seq, Edit::Spike(s)))
            .chain(self.patches.iter().map(|&(seq, p)| (seq, Edit::Patch(p))))
            .collect();
        merged.sort_by_key(|&(seq, _)| seq);
        merged.into_iter().map(|(_, e)| e).collect()
    }
}

/// Replay every edit onto `grid` in insertion order
pub fn apply_edits(grid: &mut ComplexGrid, edits: &EditList) -> Result<()> {
    for edit in edits.in_order() {
        match edit {
            Edit::Spike(s) => grid.add_at(s.row, s.col, Complex64::new(s.amplitude, 0.0))?,
            Edit::Patch(p) => grid.zero_disk(p.row, p.col, p.radius)?,
        }
    }
    Ok(())
}
