//! A* shortest-cost path over a 4-connected grid.
//!
//! Cost of entering a cell is its weight (elevation for erosion routing);
//! the heuristic is Manhattan distance, admissible for non-negative weights.
//! Erosion calls this when local steepest descent dead-ends and a lower cell
//! was found further out.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::grid::Grid;
use crate::position::Position;

/// Hard cap on node expansions. Exceeding it means "no path", which callers
/// treat as a terminated river, never as a failure.
pub const MAX_EXPANSIONS: usize = 100_000;

/// f-score wrapper so f64 costs can live in the binary heap. Total order
/// via `total_cmp`; ties resolved by insertion sequence, keeping the search
/// deterministic for a fixed grid.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Score(f64, usize);

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

pub struct GridPathfinder<'a> {
    weights: &'a Grid<f64>,
}

impl<'a> GridPathfinder<'a> {
    pub fn new(weights: &'a Grid<f64>) -> Self {
        Self { weights }
    }

    /// Ordered cell list from `source` to `destination` inclusive, or `None`
    /// when the destination is unreachable within the expansion cap.
    pub fn find(&self, source: Position, destination: Position) -> Option<Vec<Position>> {
        let width = self.weights.width();
        let height = self.weights.height();
        let n = width * height;
        if n == 0 {
            return None;
        }
        if source == destination {
            return Some(vec![source]);
        }

        let mut g_score = vec![f64::INFINITY; n];
        let mut came_from: Vec<Option<usize>> = vec![None; n];
        let mut closed = vec![false; n];
        let mut open: BinaryHeap<Reverse<(Score, usize)>> = BinaryHeap::new();

        let src = source.index(width);
        g_score[src] = 0.0;
        let mut sequence = 0usize;
        open.push(Reverse((
            Score(source.manhattan(&destination) as f64, sequence),
            src,
        )));

        let mut expansions = 0usize;
        while let Some(Reverse((_, idx))) = open.pop() {
            if closed[idx] {
                // Stale heap entry superseded by a cheaper relaxation.
                continue;
            }
            closed[idx] = true;
            let current = Position::new(idx / width, idx % width);
            if current == destination {
                return Some(self.reconstruct(&came_from, idx, width));
            }

            expansions += 1;
            if expansions > MAX_EXPANSIONS {
                return None;
            }

            for next in current.neighbours4(width, height) {
                let ni = next.index(width);
                if closed[ni] {
                    continue;
                }
                let tentative = g_score[idx] + self.weights.at(next).max(0.0);
                if tentative < g_score[ni] {
                    g_score[ni] = tentative;
                    came_from[ni] = Some(idx);
                    sequence += 1;
                    let f = tentative + next.manhattan(&destination) as f64;
                    open.push(Reverse((Score(f, sequence), ni)));
                }
            }
        }
        None
    }

    fn reconstruct(&self, came_from: &[Option<usize>], goal: usize, width: usize) -> Vec<Position> {
        let mut path = Vec::new();
        let mut idx = goal;
        loop {
            path.push(Position::new(idx / width, idx % width));
            match came_from[idx] {
                Some(prev) => idx = prev,
                None => break,
            }
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIGH: f64 = 1000.0;

    /// A single low-cost corridor through a 5×5
    /// wall of high weights must be followed exactly.
    #[test]
    fn follows_the_cheap_corridor() {
        let mut w = Grid::filled(5, 5, HIGH);
        // Corridor: down col 0, then along row 4.
        for row in 0..5 {
            w.set(Position::new(row, 0), 1.0);
        }
        for col in 0..5 {
            w.set(Position::new(4, col), 1.0);
        }
        let pf = GridPathfinder::new(&w);
        let path = pf
            .find(Position::new(0, 0), Position::new(4, 4))
            .expect("corridor must be reachable");

        assert_eq!(path.first(), Some(&Position::new(0, 0)));
        assert_eq!(path.last(), Some(&Position::new(4, 4)));
        assert_eq!(path.len(), 9, "corridor is the unique 8-step route");
        for p in &path {
            assert_eq!(w.at(*p), 1.0, "path must stay on the corridor, left at {p:?}");
        }
    }

    #[test]
    fn adjacent_steps_only() {
        let w = Grid::filled(6, 6, 1.0);
        let pf = GridPathfinder::new(&w);
        let path = pf.find(Position::new(1, 1), Position::new(4, 5)).unwrap();
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(&pair[1]), 1, "non-adjacent step {pair:?}");
        }
    }

    #[test]
    fn trivial_path_is_the_source_itself() {
        let w = Grid::filled(3, 3, 1.0);
        let pf = GridPathfinder::new(&w);
        assert_eq!(
            pf.find(Position::new(1, 1), Position::new(1, 1)),
            Some(vec![Position::new(1, 1)])
        );
    }

    /// An impassable wall (infinite weight) splits the
    /// grid, so no path exists.
    #[test]
    fn infinite_wall_blocks_the_search() {
        let mut w = Grid::filled(5, 5, 1.0);
        for row in 0..5 {
            w.set(Position::new(row, 2), f64::INFINITY);
        }
        let pf = GridPathfinder::new(&w);
        assert!(
            pf.find(Position::new(2, 0), Position::new(2, 4)).is_none(),
            "wall at col 2 must be impassable"
        );
    }

    #[test]
    fn empty_grid_has_no_path() {
        let w: Grid<f64> = Grid::filled(0, 0, 0.0);
        let pf = GridPathfinder::new(&w);
        assert!(pf.find(Position::new(0, 0), Position::new(0, 0)).is_none());
    }
}
