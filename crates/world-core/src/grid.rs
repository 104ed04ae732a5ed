//! Row-major 2D grid, the backing store for every layer.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};
use crate::position::Position;

/// A `width × height` grid stored row-major. Values use f64 for scalar
/// layers; categorical layers instantiate with their own cell type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with the given value.
    pub fn filled(width: usize, height: usize, fill: T) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Wrap a flat row-major vector. The length must be `width × height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(WorldError::InvalidParameter(format!(
                "flat array of length {} cannot back a {width}x{height} grid",
                data.len()
            )));
        }
        Ok(Self { data, width, height })
    }
}

impl<T> Grid<T> {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, p: Position) -> &T {
        &self.data[p.index(self.width)]
    }

    #[inline]
    pub fn set(&mut self, p: Position, val: T) {
        self.data[p.index(self.width)] = val;
    }

    /// Whether both dimensions match another grid's.
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Iterate all cell positions in row-major order. Dimensions are copied
    /// out, so the iterator does not hold a borrow of the grid and cells can
    /// be written during iteration.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |row| (0..w).map(move |col| Position::new(row, col)))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: Copy> Grid<T> {
    #[inline]
    pub fn at(&self, p: Position) -> T {
        self.data[p.index(self.width)]
    }

    /// Roll the grid contents by the given offsets, wrapping at both edges
    /// (used to re-centre land before the seam is fixed).
    pub fn rolled(&self, row_shift: usize, col_shift: usize) -> Grid<T> {
        let mut out = self.clone();
        for p in self.positions() {
            let dst = Position::new(
                (p.row + row_shift) % self.height,
                (p.col + col_shift) % self.width,
            );
            out.set(dst, self.at(p));
        }
        out
    }
}

impl Grid<f64> {
    pub fn min_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Rescale all values linearly into `[lo, hi]`. A constant grid maps to `lo`.
    pub fn normalize(&mut self, lo: f64, hi: f64) {
        let min = self.min_value();
        let max = self.max_value();
        let range = max - min;
        if range <= 0.0 {
            for v in &mut self.data {
                *v = lo;
            }
            return;
        }
        for v in &mut self.data {
            *v = lo + (*v - min) / range * (hi - lo);
        }
    }
}
