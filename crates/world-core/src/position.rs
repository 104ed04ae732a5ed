//! Grid addressing. Every algorithm in the crate speaks `Position { row, col }`;
//! nothing takes bare `(x, y)` tuples, so row/col swaps cannot creep in at
//! call sites.

use serde::{Deserialize, Serialize};

/// A cell address on a `width × height` grid. `row` is the y axis
/// (0 at the top), `col` is the x axis (0 at the left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Linear row-major index on a grid of the given width.
    #[inline]
    pub fn index(&self, width: usize) -> usize {
        self.row * width + self.col
    }

    /// The 4-connected neighbours that fall inside the grid, in fixed
    /// N, S, W, E order. Iteration order matters for tie-breaking in the
    /// pathfinder and erosion, so it is part of the contract.
    pub fn neighbours4(&self, width: usize, height: usize) -> Vec<Position> {
        let mut out = Vec::with_capacity(4);
        if self.row > 0 {
            out.push(Position::new(self.row - 1, self.col));
        }
        if self.row + 1 < height {
            out.push(Position::new(self.row + 1, self.col));
        }
        if self.col > 0 {
            out.push(Position::new(self.row, self.col - 1));
        }
        if self.col + 1 < width {
            out.push(Position::new(self.row, self.col + 1));
        }
        out
    }

    /// The 8-connected neighbours inside the grid, row-major order.
    pub fn neighbours8(&self, width: usize, height: usize) -> Vec<Position> {
        let mut out = Vec::with_capacity(8);
        let r0 = self.row.saturating_sub(1);
        let c0 = self.col.saturating_sub(1);
        let r1 = (self.row + 1).min(height - 1);
        let c1 = (self.col + 1).min(width - 1);
        for row in r0..=r1 {
            for col in c0..=c1 {
                if row != self.row || col != self.col {
                    out.push(Position::new(row, col));
                }
            }
        }
        out
    }

    /// Manhattan distance to another cell, ignoring wraparound.
    pub fn manhattan(&self, other: &Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Chebyshev (chessboard) distance to another cell.
    pub fn chebyshev(&self, other: &Position) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// Horizontal-wrap-aware column distance on a grid of the given width.
    pub fn wrapped_col_distance(&self, other: &Position, width: usize) -> usize {
        let d = self.col.abs_diff(other.col);
        d.min(width - d)
    }
}
