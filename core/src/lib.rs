#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bubble Burst engine.
//!
//! This crate defines the vocabulary that connects the authoritative bubble
//! matrix to its consumers. The matrix owns all mutable state; consumers pull
//! [`TaskKind`]-tagged tasks from it, drive each task's visual transition, and
//! observe [`MatrixEvent`] values emitted at batch granularity. Contract
//! breaches surface as [`MatrixError`] values and are never retried.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier assigned to a bubble.
///
/// Identity, not position, is what group membership and undo bookkeeping key
/// on; a bubble keeps its identifier for the lifetime of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BubbleId(u32);

impl BubbleId {
    /// Creates a new bubble identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// The kind of a bubble, fixed at creation.
///
/// Two bubbles belong to the same group only when their kinds match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BubbleKind {
    /// Blue bubble.
    Azure,
    /// Red bubble.
    Crimson,
    /// Green bubble.
    Emerald,
    /// Yellow bubble.
    Amber,
    /// Purple bubble.
    Violet,
}

impl BubbleKind {
    /// Every bubble kind, in canonical order.
    pub const ALL: [BubbleKind; 5] = [
        BubbleKind::Azure,
        BubbleKind::Crimson,
        BubbleKind::Emerald,
        BubbleKind::Amber,
        BubbleKind::Violet,
    ];
}

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    row: u32,
    column: u32,
}

impl GridCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

/// Dimensions of the bubble matrix measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDims {
    rows: u32,
    columns: u32,
}

impl GridDims {
    /// Creates a new dimension descriptor with explicit row and column counts.
    #[must_use]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Number of rows contained in the matrix.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns contained in the matrix.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Total number of cells contained in the matrix.
    #[must_use]
    pub const fn cell_count(&self) -> u64 {
        self.rows as u64 * self.columns as u64
    }

    /// Reports whether the provided coordinate lies inside the matrix.
    #[must_use]
    pub const fn contains(&self, coord: GridCoord) -> bool {
        coord.row() < self.rows && coord.column() < self.columns
    }
}

/// The discrete state transitions a burst or undo decomposes into.
///
/// Tasks of one batch execute strictly in the order `Burst`, `MoveDown`,
/// `MoveRight` for a forward burst and in the reverse order for an undo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Removal of a discovered bubble group from the matrix.
    Burst,
    /// Vertical collapse of the columns the burst touched.
    MoveDown,
    /// Horizontal compaction of partially filled rows toward the right edge.
    MoveRight,
}

/// Notifications emitted by the matrix at batch granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixEvent {
    /// A batch of tasks was published; the consumer should drain the pending
    /// queue until it is empty.
    TasksAvailable,
    /// No bubble has a same-kind neighbor left; the game is over.
    GameEnded,
}

/// Contract violations raised by the matrix's mutating operations.
///
/// These signal a collaborator protocol breach and must never be retried or
/// swallowed. Legal degenerate cases (empty group, undo with an empty stack,
/// gravity passes that move nothing) are ordinary control flow and do not
/// appear here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// A mutating operation was attempted while a task batch was in flight.
    #[error("operation requires an idle matrix")]
    NotIdle,
    /// Matrix dimensions must both be at least one.
    #[error("matrix dimensions must each be at least 1, got {rows}x{columns}")]
    InvalidDimensions {
        /// Row count supplied by the caller.
        rows: u32,
        /// Column count supplied by the caller.
        columns: u32,
    },
    /// A placement named a coordinate outside the matrix.
    #[error("coordinate ({row}, {column}) lies outside the matrix")]
    OutOfBounds {
        /// Row index supplied by the caller.
        row: u32,
        /// Column index supplied by the caller.
        column: u32,
    },
    /// A placement named a cell that already holds a bubble.
    #[error("cell ({row}, {column}) is already occupied")]
    CellOccupied {
        /// Row index supplied by the caller.
        row: u32,
        /// Column index supplied by the caller.
        column: u32,
    },
}
