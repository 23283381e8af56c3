//! Error type shared by both engines.
//!
//! Request contradictions (matrix shape, fixed-position conflicts, capacity)
//! are detected before any placement happens. Placement-time infeasibility is
//! reported through the same enum so callers can degrade gracefully, e.g. by
//! retrying with a larger grid.

use crate::geometry::CellRect;

/// Every way a layout invocation can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("grid dimensions must be positive and addressable (got {width}x{height})")]
    InvalidGrid { width: usize, height: usize },

    #[error("at least one real department is required")]
    NoDepartments,

    #[error("{matrix} matrix must have {expected} rows over real departments (got {found})")]
    MatrixRowCount {
        matrix: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{matrix} matrix row {row} must have {expected} entries (got {found})")]
    MatrixRowLength {
        matrix: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("department '{name}' has neither width×height nor a positive area")]
    MissingFootprint { name: String },

    #[error("department '{name}' is fixed, locked or void but has no x/y position")]
    MissingPosition { name: String },

    #[error("fixed department '{name}' at {rect:?} lies outside the grid")]
    FixedOutOfBounds { name: String, rect: CellRect },

    #[error("obstacle #{index} at {rect:?} lies outside the grid")]
    ObstacleOutOfBounds { index: usize, rect: CellRect },

    #[error("fixed placement '{first}' overlaps '{second}'")]
    FixedOverlap { first: String, second: String },

    #[error("Cells required ({required}) exceed grid capacity ({capacity})")]
    CapacityExceeded { required: usize, capacity: usize },

    #[error("Cannot place seed department '{name}'")]
    SeedUnplaceable { name: String },

    #[error("grid exhausted while placing '{name}' ({remaining} cells still required)")]
    GridExhausted { name: String, remaining: usize },

    #[error("department '{name}' would need more than {limit} fragments ({remaining} cells left)")]
    FragmentLimit {
        name: String,
        limit: usize,
        remaining: usize,
    },

    #[error("deadline exceeded after {steps} placement steps")]
    DeadlineExceeded { steps: usize },

    #[error("no free slot for: {}", names.join(", "))]
    PackingFailed { names: Vec<String> },
}

impl LayoutError {
    /// True for request contradictions rejected before any placement attempt.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LayoutError::InvalidGrid { .. }
                | LayoutError::NoDepartments
                | LayoutError::MatrixRowCount { .. }
                | LayoutError::MatrixRowLength { .. }
                | LayoutError::MissingFootprint { .. }
                | LayoutError::MissingPosition { .. }
                | LayoutError::FixedOutOfBounds { .. }
                | LayoutError::ObstacleOutOfBounds { .. }
                | LayoutError::FixedOverlap { .. }
                | LayoutError::CapacityExceeded { .. }
        )
    }
}
