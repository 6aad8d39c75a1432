//! Correspondence between storage axes and coordinate system axes.
//!
//! System axes are ordered as the reverse of storage axes: the last
//! non-missing system axis is storage axis 0. Missing system axes have no
//! storage counterpart and are skipped when numbering storage axes.

use crate::error::{CubeError, Result};

/// One step of a traversal over the system axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSlot {
    /// System axis with no storage counterpart.
    Missing { system: usize },
    /// System axis backed by a storage axis.
    Present { system: usize, storage: usize },
}

/// Bijection between non-missing system axes and storage axes.
///
/// Immutable once built; derived state is recomputed only by building a new
/// correspondence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisCorrespondence {
    missing: Vec<bool>,
    /// `storage_to_system[s]` is the system axis behind storage axis `s`.
    storage_to_system: Vec<usize>,
}

impl AxisCorrespondence {
    /// Derive the correspondence for a storage array of rank `storage_rank`.
    ///
    /// Fails with `RankMismatch` when the number of non-missing flags is not
    /// the storage rank.
    pub fn new(storage_rank: usize, missing: Vec<bool>) -> Result<Self> {
        let non_missing = missing.iter().filter(|&&m| !m).count();
        if non_missing != storage_rank {
            return Err(CubeError::RankMismatch {
                storage_rank,
                non_missing,
            });
        }
        let storage_to_system = (0..missing.len()).rev().filter(|&sys| !missing[sys]).collect();
        Ok(Self {
            missing,
            storage_to_system,
        })
    }

    /// Correspondence with no missing axes.
    pub fn all_present(rank: usize) -> Self {
        Self {
            missing: vec![false; rank],
            storage_to_system: (0..rank).rev().collect(),
        }
    }

    pub fn system_axis_count(&self) -> usize {
        self.missing.len()
    }

    pub fn storage_rank(&self) -> usize {
        self.storage_to_system.len()
    }

    pub fn missing_flags(&self) -> &[bool] {
        &self.missing
    }

    pub fn missing_count(&self) -> usize {
        self.system_axis_count() - self.storage_rank()
    }

    pub fn is_missing(&self, system: usize) -> bool {
        self.missing.get(system).copied().unwrap_or(false)
    }

    /// System axis behind a storage axis.
    pub fn system_axis(&self, storage: usize) -> Option<usize> {
        self.storage_to_system.get(storage).copied()
    }

    /// Storage axis backed by a system axis, or `None` if it is missing.
    pub fn storage_axis(&self, system: usize) -> Option<usize> {
        if system >= self.missing.len() || self.missing[system] {
            return None;
        }
        // Storage axes count the non-missing system axes above this one
        Some(
            self.missing[system + 1..]
                .iter()
                .filter(|&&m| !m)
                .count(),
        )
    }

    /// Traverse the system axes last-to-first, yielding storage axes in
    /// increasing order as they are consumed.
    pub fn slots(&self) -> impl Iterator<Item = AxisSlot> + '_ {
        let mut next_storage = 0;
        (0..self.missing.len()).rev().map(move |system| {
            if self.missing[system] {
                AxisSlot::Missing { system }
            } else {
                let storage = next_storage;
                next_storage += 1;
                AxisSlot::Present { system, storage }
            }
        })
    }

    /// The correspondence after `storage` is removed from the array: its
    /// system axis becomes missing and higher storage axes shift down.
    pub fn without_storage_axis(&self, storage: usize) -> Result<Self> {
        let system = self.system_axis(storage).ok_or(CubeError::AxisOutOfRange {
            axis: storage,
            rank: self.storage_rank(),
        })?;
        let mut missing = self.missing.clone();
        missing[system] = true;
        Self::new(self.storage_rank() - 1, missing)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
