//! Error types for cube, coordinate and collection operations.

use thiserror::Error;

use crate::units::UnitError;

/// Errors that can occur while building or querying cubes and collections.
///
/// Every operation fails fast with one of these; no partially updated state
/// is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CubeError {
    /// Non-missing system axes do not match the storage rank.
    #[error("storage rank {storage_rank} does not match {non_missing} non-missing coordinate axes")]
    RankMismatch {
        /// Rank of the storage array.
        storage_rank: usize,
        /// Number of system axes not flagged as missing.
        non_missing: usize,
    },

    /// Missing-axis flags do not cover every system axis.
    #[error("expected {expected} missing-axis flags, got {found}")]
    MissingAxisCount {
        /// Number of system axes in the transform.
        expected: usize,
        /// Number of flags supplied.
        found: usize,
    },

    /// Wrong number of coordinate values for the storage rank.
    #[error("expected {expected} coordinate values, got {found}")]
    ArgumentCount {
        /// Storage rank.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },

    /// A value buffer does not match the extent it describes.
    #[error("'{name}' has {found} values but its shape holds {expected}")]
    ShapeMismatch {
        /// Buffer or coordinate name.
        name: String,
        /// Number of values required by the bound axes.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },

    /// An extra coordinate is bound to no axes, or to one axis twice.
    #[error("extra coordinate '{name}' must be bound to distinct storage axes, got {axes:?}")]
    InvalidAxisBinding {
        /// Coordinate name.
        name: String,
        /// Storage axes as supplied.
        axes: Vec<usize>,
    },

    /// Two extra coordinates share a name.
    #[error("extra coordinate '{0}' is defined more than once")]
    DuplicateExtraCoordinate(String),

    /// A storage axis index exceeds the rank.
    #[error("axis {axis} out of range for rank {rank}")]
    AxisOutOfRange {
        /// Requested axis.
        axis: usize,
        /// Storage rank.
        rank: usize,
    },

    /// An axis order is not a permutation of every axis.
    #[error("axis order {order:?} is not a permutation of {rank} axes")]
    InvalidPermutation {
        /// Requested order.
        order: Vec<usize>,
        /// Number of axes.
        rank: usize,
    },

    /// A pixel origin other than 0 or 1.
    #[error("pixel origin must be 0 or 1, got {0}")]
    InvalidOrigin(u8),

    /// An integer index exceeds an axis extent.
    #[error("index {index} out of bounds for axis {axis} with extent {extent}")]
    IndexOutOfBounds {
        /// Storage axis.
        axis: usize,
        /// Requested index.
        index: usize,
        /// Extent of the axis.
        extent: usize,
    },

    /// An aligned axis index is not below the member's rank.
    #[error("aligned axis {axis} out of range for member {member} with rank {rank}")]
    AlignmentAxisOutOfRange {
        /// Position of the member in the collection.
        member: usize,
        /// Offending axis index.
        axis: usize,
        /// Rank of the member.
        rank: usize,
    },

    /// Per-member aligned axis tuples differ in length.
    #[error("member {member} declares {found} aligned axes, expected {expected}")]
    AlignmentLengthMismatch {
        /// Position of the member in the collection.
        member: usize,
        /// Length of the first member's tuple.
        expected: usize,
        /// Length of this member's tuple.
        found: usize,
    },

    /// Aligned axes at one position have different extents.
    #[error("aligned axes at position {position} have differing extents {extents:?}")]
    AlignmentExtentMismatch {
        /// Aligned position.
        position: usize,
        /// Extent of the designated axis of every member, in member order.
        extents: Vec<usize>,
    },

    /// Per-member specification does not have one entry per member.
    #[error("aligned axes must have one entry per member: expected {expected}, got {found}")]
    AlignmentMemberCountMismatch {
        /// Number of members.
        expected: usize,
        /// Number of per-member entries supplied.
        found: usize,
    },

    /// A shorthand declaration was given for members of differing rank.
    #[error("shorthand aligned axes require members of equal rank, got ranks {ranks:?}")]
    AmbiguousAlignmentShorthand {
        /// Rank of every member, in member order.
        ranks: Vec<usize>,
    },

    /// The aligned axes specification has an unsupported shape.
    #[error("aligned axes must be an int, a list of ints, or a list of lists of ints")]
    UnsupportedAxisType,

    /// Alignment requested on a collection with no members.
    #[error("cannot align axes of an empty collection")]
    EmptyCollection,

    /// A drop position is listed more than once.
    #[error("drop position {0} is listed more than once")]
    DuplicateDropPosition(usize),

    /// A drop position does not refer to an aligned position.
    #[error("drop position {position} out of range for {aligned} aligned axes")]
    DropPositionOutOfRange {
        /// Requested position.
        position: usize,
        /// Number of aligned positions.
        aligned: usize,
    },

    /// Two collection members share a key.
    #[error("collection key '{0}' is used more than once")]
    DuplicateKey(String),

    /// No collection member has the requested key.
    #[error("no collection member with key '{0}'")]
    UnknownKey(String),

    /// The collection has no aligned axes.
    #[error("collection has no aligned axes")]
    NotAligned,

    /// The transform provider rejected the request.
    #[error("transform error: {0}")]
    Transform(String),

    /// Unit conversion failed.
    #[error(transparent)]
    Unit(#[from] UnitError),
}

impl CubeError {
    /// Creates a transform error.
    #[must_use]
    pub fn transform(reason: impl Into<String>) -> Self {
        Self::Transform(reason.into())
    }

    /// Creates an argument count error.
    #[must_use]
    pub const fn argument_count(expected: usize, found: usize) -> Self {
        Self::ArgumentCount { expected, found }
    }
}

/// Result type for cube operations.
pub type Result<T> = std::result::Result<T, CubeError>;
