//! Aligned axis declarations across collection members.
//!
//! Aligned axes pair one storage axis of every member per aligned position.
//! Callers may write the declaration three ways; all normalize to the
//! per-member form held by [`AlignedAxes`]:
//!
//! ```text
//! 2                      one axis, same index in every member
//! [0, 2]                 several axes, same indices in every member
//! [[0, 2], [1, 2], ...]  explicit indices per member
//! ```
//!
//! The two shorthand forms require members of equal rank. Members of
//! differing rank must be declared per member.

use std::collections::BTreeSet;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CubeError, Result};
use crate::storage::Dimensioned;

/// An aligned axes declaration as written by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignedAxesSpec {
    /// One aligned axis with the same index in every member.
    Single(usize),
    /// The same axis indices in every member.
    Shared(Vec<usize>),
    /// One list of axis indices per member, in member order.
    PerMember(Vec<Vec<usize>>),
}

impl From<usize> for AlignedAxesSpec {
    fn from(axis: usize) -> Self {
        Self::Single(axis)
    }
}

impl From<Vec<usize>> for AlignedAxesSpec {
    fn from(axes: Vec<usize>) -> Self {
        Self::Shared(axes)
    }
}

impl From<Vec<Vec<usize>>> for AlignedAxesSpec {
    fn from(axes: Vec<Vec<usize>>) -> Self {
        Self::PerMember(axes)
    }
}

/// Untyped aligned axes input, as decoded from JSON or JavaScript.
///
/// Anything that is not a non-negative int, a list of them, or a list of
/// lists of them decodes as `Other` and is rejected on conversion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AlignedAxesInput {
    Single(usize),
    Shared(Vec<usize>),
    PerMember(Vec<Vec<usize>>),
    Other(IgnoredAny),
}

impl TryFrom<AlignedAxesInput> for AlignedAxesSpec {
    type Error = CubeError;

    fn try_from(input: AlignedAxesInput) -> Result<Self> {
        match input {
            AlignedAxesInput::Single(axis) => Ok(Self::Single(axis)),
            AlignedAxesInput::Shared(axes) => Ok(Self::Shared(axes)),
            AlignedAxesInput::PerMember(axes) => Ok(Self::PerMember(axes)),
            AlignedAxesInput::Other(_) => Err(CubeError::UnsupportedAxisType),
        }
    }
}

/// Canonical aligned axes: one equal-length list of storage axes per member.
///
/// Entry `j` of every member's list names the member axis at aligned
/// position `j`. Values are never modified; dropping positions builds a new
/// value through [`update_aligned_axes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<usize>>", into = "Vec<Vec<usize>>")]
pub struct AlignedAxes(Vec<Vec<usize>>);

impl AlignedAxes {
    /// Wrap per-member lists, checking they are non-empty and of equal length.
    ///
    /// No member shapes are consulted; use [`normalize`] to validate against
    /// actual members.
    pub fn new(per_member: Vec<Vec<usize>>) -> Result<Self> {
        let Some(first) = per_member.first() else {
            return Err(CubeError::EmptyCollection);
        };
        if first.is_empty() {
            return Err(CubeError::UnsupportedAxisType);
        }
        let expected = first.len();
        if let Some((member, axes)) = per_member
            .iter()
            .enumerate()
            .find(|(_, axes)| axes.len() != expected)
        {
            return Err(CubeError::AlignmentLengthMismatch {
                member,
                expected,
                found: axes.len(),
            });
        }
        Ok(Self(per_member))
    }

    /// Number of members covered.
    pub fn member_count(&self) -> usize {
        self.0.len()
    }

    /// Number of aligned positions.
    pub fn aligned_count(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    /// Aligned storage axes of one member.
    pub fn member(&self, index: usize) -> Option<&[usize]> {
        self.0.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.0.iter().map(Vec::as_slice)
    }

    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.0
    }
}

impl TryFrom<Vec<Vec<usize>>> for AlignedAxes {
    type Error = CubeError;

    fn try_from(per_member: Vec<Vec<usize>>) -> Result<Self> {
        Self::new(per_member)
    }
}

impl From<AlignedAxes> for Vec<Vec<usize>> {
    fn from(aligned: AlignedAxes) -> Self {
        aligned.0
    }
}

/// Normalize and validate an aligned axes declaration against `members`.
///
/// # Errors
///
/// Checks run in this order and stop at the first failure:
///
/// - `EmptyCollection` if there are no members
/// - `AlignmentMemberCountMismatch` if a per-member declaration does not
///   have one list per member
/// - `AmbiguousAlignmentShorthand` if a shorthand is used for members of
///   differing rank
/// - `UnsupportedAxisType` if no axis is named
/// - `AlignmentAxisOutOfRange` if an axis index is not below its member's rank
/// - `AlignmentLengthMismatch` if per-member lists differ in length
/// - `AlignmentExtentMismatch` if the designated axes at some position do not
///   all have the same extent
pub fn normalize<M: Dimensioned>(members: &[M], spec: &AlignedAxesSpec) -> Result<AlignedAxes> {
    if members.is_empty() {
        return Err(CubeError::EmptyCollection);
    }

    let per_member = match spec {
        AlignedAxesSpec::Single(axis) => {
            check_equal_ranks(members)?;
            vec![vec![*axis]; members.len()]
        }
        AlignedAxesSpec::Shared(axes) => {
            check_equal_ranks(members)?;
            vec![axes.clone(); members.len()]
        }
        AlignedAxesSpec::PerMember(per_member) => {
            if per_member.len() != members.len() {
                return Err(CubeError::AlignmentMemberCountMismatch {
                    expected: members.len(),
                    found: per_member.len(),
                });
            }
            per_member.clone()
        }
    };

    if per_member[0].is_empty() {
        return Err(CubeError::UnsupportedAxisType);
    }

    for (member, (axes, data)) in per_member.iter().zip(members).enumerate() {
        let rank = data.rank();
        if let Some(&axis) = axes.iter().find(|&&axis| axis >= rank) {
            return Err(CubeError::AlignmentAxisOutOfRange { member, axis, rank });
        }
    }

    let aligned = AlignedAxes::new(per_member)?;

    for position in 0..aligned.aligned_count() {
        let extents: Vec<usize> = aligned
            .iter()
            .zip(members)
            .map(|(axes, data)| data.shape()[axes[position]])
            .collect();
        let pairwise = extents.windows(2).all(|pair| pair[0] == pair[1]);
        let distinct: BTreeSet<usize> = extents.iter().copied().collect();
        debug_assert_eq!(pairwise, distinct.len() == 1);
        if !pairwise || distinct.len() != 1 {
            return Err(CubeError::AlignmentExtentMismatch { position, extents });
        }
    }

    debug!(
        members = aligned.member_count(),
        aligned = aligned.aligned_count(),
        "Normalized aligned axes"
    );

    Ok(aligned)
}

fn check_equal_ranks<M: Dimensioned>(members: &[M]) -> Result<()> {
    let ranks: Vec<usize> = members.iter().map(Dimensioned::rank).collect();
    if ranks.windows(2).any(|pair| pair[0] != pair[1]) {
        return Err(CubeError::AmbiguousAlignmentShorthand { ranks });
    }
    Ok(())
}

/// Rebuild aligned axes after the axes at `drop` positions were removed from
/// every member.
///
/// Positions are handled in ascending order. Each removal
/// renumbers the member's higher axes down by one, and pending positions
/// above the removed one shift down with the shrunken list.
///
/// Returns `None` when every aligned position is dropped.
///
/// # Errors
///
/// - `DropPositionOutOfRange` if a position is not below the aligned count
/// - `DuplicateDropPosition` if a position is listed twice
pub fn update_aligned_axes(aligned: &AlignedAxes, drop: &[usize]) -> Result<Option<AlignedAxes>> {
    if drop.is_empty() {
        return Ok(Some(aligned.clone()));
    }

    let count = aligned.aligned_count();
    let mut positions = drop.to_vec();
    positions.sort_unstable();
    if let Some(&position) = positions.iter().find(|&&p| p >= count) {
        return Err(CubeError::DropPositionOutOfRange {
            position,
            aligned: count,
        });
    }
    if let Some(pair) = positions.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(CubeError::DuplicateDropPosition(pair[0]));
    }
    if positions.len() == count {
        debug!(dropped = count, "Dropped every aligned position");
        return Ok(None);
    }

    let per_member = aligned
        .iter()
        .map(|axes| {
            let mut axes = axes.to_vec();
            let mut pending = positions.clone();
            for i in 0..pending.len() {
                let position = pending[i];
                let removed = axes.remove(position);
                for axis in axes.iter_mut().filter(|axis| **axis > removed) {
                    *axis -= 1;
                }
                for later in pending[i + 1..].iter_mut().filter(|p| **p > position) {
                    *later -= 1;
                }
            }
            axes
        })
        .collect();

    debug!(
        dropped = ?positions,
        remaining = count - positions.len(),
        "Updated aligned axes"
    );

    Ok(Some(AlignedAxes(per_member)))
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Members of rank `rank` whose aligned axes are a random permutation
    /// prefix of `0..rank`.
    fn aligned_strategy() -> impl Strategy<Value = AlignedAxes> {
        (2usize..=5, 1usize..=4).prop_flat_map(|(rank, members)| {
            let member = Just((0..rank).collect::<Vec<_>>()).prop_shuffle();
            (prop::collection::vec(member, members), 1..=rank).prop_map(|(perms, k)| {
                AlignedAxes::new(perms.into_iter().map(|p| p[..k].to_vec()).collect()).unwrap()
            })
        })
    }

    proptest! {
        /// Property: the updated tuples shrink by the number of dropped
        /// positions and stay within the shrunken rank.
        #[test]
        fn prop_update_shrinks(aligned in aligned_strategy(), seed in any::<u64>()) {
            let count = aligned.aligned_count();
            let drop = vec![(seed as usize) % count];

            match update_aligned_axes(&aligned, &drop).unwrap() {
                None => prop_assert_eq!(count, 1),
                Some(updated) => {
                    prop_assert_eq!(updated.aligned_count(), count - 1);
                    prop_assert_eq!(updated.member_count(), aligned.member_count());
                    for (before, after) in aligned.iter().zip(updated.iter()) {
                        let removed = before[drop[0]];
                        let expected: Vec<usize> = before
                            .iter()
                            .filter(|&&a| a != removed)
                            .map(|&a| if a > removed { a - 1 } else { a })
                            .collect();
                        prop_assert_eq!(after, &expected[..]);
                    }
                }
            }
        }

        /// Property: dropping positions one call at a time matches dropping
        /// them in a single call.
        #[test]
        fn prop_update_composes(aligned in aligned_strategy()) {
            let count = aligned.aligned_count();
            prop_assume!(count >= 3);

            let at_once = update_aligned_axes(&aligned, &[0, 2]).unwrap();
            let stepwise = update_aligned_axes(&aligned, &[2])
                .unwrap()
                .and_then(|a| update_aligned_axes(&a, &[0]).unwrap());
            prop_assert_eq!(at_once, stepwise);
        }
    }
}
