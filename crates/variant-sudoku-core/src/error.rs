//! Errors raised while constructing or querying grid primitives.

/// Errors produced by [`crate::GridShape`], cell-id parsing, and
/// [`crate::CellExclusions`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CoreError {
    /// A cell-id string (e.g. `"R1C1"`) did not match the expected format.
    #[display("malformed cell id: {_0:?}")]
    MalformedCellId(String),

    /// A row or column index was outside the grid's bounds.
    #[display("cell coordinate out of range: row={row}, col={col}, shape={rows}x{cols}")]
    CellOutOfRange {
        /// The offending row.
        row: usize,
        /// The offending column.
        col: usize,
        /// The shape's row count.
        rows: usize,
        /// The shape's column count.
        cols: usize,
    },

    /// `box_width * box_height != num_values`, so boxes cannot be derived.
    #[display(
        "box dimensions {box_width}x{box_height} are inconsistent with num_values={num_values}"
    )]
    InconsistentBoxDimensions {
        /// Requested box width.
        box_width: usize,
        /// Requested box height.
        box_height: usize,
        /// The shape's value count.
        num_values: usize,
    },

    /// A write was attempted on a [`crate::CellExclusions`] after it had
    /// already been sealed by a read. This is a programmer error: sealing
    /// discipline must be respected by callers.
    #[display("CellExclusions was mutated after sealing")]
    MutationAfterSeal,
}
