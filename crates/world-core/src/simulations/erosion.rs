//! River erosion: trace rivers from mountain sources down to the sea,
//! carve valleys along them, and record lakes where the terrain gives a
//! river nowhere lower to go.
//!
//! Per-river life cycle: seeding (accumulate rainfall along steepest
//! descent until a mountain cell crosses the flow threshold), flowing
//! (steepest descent; merge into an existing river; fall back to an
//! expanding-radius search routed by A* when the local slope dead-ends,
//! with explicit two-leg routing across the map seam), then carving
//! (monotonic cleanup plus a distance-decayed valley).

use std::collections::HashSet;

use rand::rngs::StdRng;

use crate::error::Result;
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::pathfind::GridPathfinder;
use crate::position::Position;
use crate::simulations::Simulation;
use crate::world::{layers, World};

/// Accumulated rainfall at which a mountain cell may seed a river.
const RIVER_THRESHOLD: f64 = 0.02;
/// No two sources within this radius (stops clustered duplicate rivers).
const SOURCE_SUPPRESSION_RADIUS: usize = 9;
/// Cap on the expanding lower-elevation search; past it the river ends as
/// a lake.
const MAX_SEARCH_RADIUS: usize = 40;
/// Valley carving factor by Chebyshev distance from the river cell:
/// adjacent cells are pulled hard toward the river bed, the next ring
/// gently, everything further is untouched.
const CARVE_NEAR: f64 = 0.2;
const CARVE_FAR: f64 = 0.6;

pub struct ErosionSimulation;

/// Where a traced river ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outlet {
    Ocean,
    Merged,
    Lake,
}

struct ErosionEngine {
    elevation: Grid<f64>,
    ocean: Grid<bool>,
    precipitation: Grid<f64>,
    mountain_level: f64,
    river_map: Grid<f64>,
    lake_map: Grid<f64>,
    /// Cells belonging to any already-traced river, for merging.
    river_cells: HashSet<Position>,
}

impl ErosionEngine {
    fn new(
        elevation: Grid<f64>,
        ocean: Grid<bool>,
        precipitation: Grid<f64>,
        mountain_level: f64,
    ) -> Self {
        let width = elevation.width();
        let height = elevation.height();
        Self {
            elevation,
            ocean,
            precipitation,
            mountain_level,
            river_map: Grid::filled(width, height, 0.0),
            lake_map: Grid::filled(width, height, 0.0),
            river_cells: HashSet::new(),
        }
    }

    fn width(&self) -> usize {
        self.elevation.width()
    }

    fn height(&self) -> usize {
        self.elevation.height()
    }

    fn is_mountain(&self, p: Position) -> bool {
        self.elevation.at(p) > self.mountain_level
    }

    /// Steepest-descent 4-neighbour, or `None` on a local minimum.
    fn quick_path(&self, p: Position) -> Option<Position> {
        let mut best: Option<(Position, f64)> = None;
        for n in p.neighbours4(self.width(), self.height()) {
            let e = self.elevation.at(n);
            if e < self.elevation.at(p) && best.map_or(true, |(_, be)| e < be) {
                best = Some((n, e));
            }
        }
        best.map(|(n, _)| n)
    }

    /// Per-cell flow direction map (steepest local descent).
    fn find_water_flow(&self) -> Grid<Option<Position>> {
        let mut path = Grid::filled(self.width(), self.height(), None);
        for p in self.elevation.positions() {
            path.set(p, self.quick_path(p));
        }
        path
    }

    /// Accumulate rainfall along the flow-direction map; a cell becomes a
    /// river source when its accumulated flow crosses the threshold while
    /// it sits on a mountain, unless an existing source is within the
    /// suppression radius.
    fn find_river_sources(&self, water_path: &Grid<Option<Position>>) -> Vec<Position> {
        let mut water_flow = Grid::filled(self.width(), self.height(), 0.0f64);
        let mut sources: Vec<Position> = Vec::new();
        let step_cap = self.width() * self.height();

        for start in self.elevation.positions() {
            let rainfall = self.precipitation.at(start);
            let mut current = start;
            let mut steps = 0usize;
            loop {
                water_flow.set(current, water_flow.at(current) + rainfall);
                if water_flow.at(current) >= RIVER_THRESHOLD
                    && self.is_mountain(current)
                    && !sources
                        .iter()
                        .any(|s| s.chebyshev(&current) <= SOURCE_SUPPRESSION_RADIUS)
                {
                    sources.push(current);
                    break;
                }
                if self.ocean.at(current) {
                    break;
                }
                match water_path.at(current) {
                    Some(next) => current = next,
                    None => break,
                }
                steps += 1;
                if steps > step_cap {
                    break;
                }
            }
        }
        sources
    }

    /// Lowest strictly-lower cell within an expanding ring search, with
    /// horizontal and vertical wraparound. Returns the target plus whether
    /// the shorter route crosses each seam.
    fn find_lower_elevation(&self, p: Position) -> Option<(Position, bool, bool)> {
        let width = self.width();
        let height = self.height();
        let current = self.elevation.at(p);
        let mut best: Option<(Position, f64, bool, bool)> = None;

        for radius in 1..=MAX_SEARCH_RADIUS {
            let r = radius as isize;
            for dr in -r..=r {
                for dc in -r..=r {
                    if dr.abs() != r && dc.abs() != r {
                        continue; // ring only; inner cells were already seen
                    }
                    let raw_row = p.row as isize + dr;
                    let raw_col = p.col as isize + dc;
                    let wrap_row = raw_row < 0 || raw_row >= height as isize;
                    let wrap_col = raw_col < 0 || raw_col >= width as isize;
                    let row = raw_row.rem_euclid(height as isize) as usize;
                    let col = raw_col.rem_euclid(width as isize) as usize;
                    let q = Position::new(row, col);
                    let e = self.elevation.at(q);
                    if e < current && best.map_or(true, |(_, be, _, _)| e < be) {
                        best = Some((q, e, wrap_row, wrap_col));
                    }
                }
            }
            if best.is_some() {
                break;
            }
        }
        best.map(|(q, _, wr, wc)| (q, wr, wc))
    }

    /// Route from `from` to `to` with A*, splitting into two legs per
    /// wrapped axis: to the near edge, then from the far edge onward.
    fn route(&self, from: Position, to: Position, wrap_row: bool, wrap_col: bool) -> Option<Vec<Position>> {
        let width = self.width();
        let height = self.height();
        let pf = GridPathfinder::new(&self.elevation);

        if !wrap_row && !wrap_col {
            return pf.find(from, to);
        }

        // Crossing point: keep the non-wrapping coordinate, jump the
        // wrapping one through the nearer edge.
        let mut mid_exit = from;
        let mut mid_entry = to;
        if wrap_col {
            if from.col >= width / 2 {
                mid_exit = Position::new(from.row, width - 1);
                mid_entry = Position::new(from.row, 0);
            } else {
                mid_exit = Position::new(from.row, 0);
                mid_entry = Position::new(from.row, width - 1);
            }
        }
        if wrap_row {
            if from.row >= height / 2 {
                mid_exit = Position::new(height - 1, mid_exit.col);
                mid_entry = Position::new(0, mid_entry.col);
            } else {
                mid_exit = Position::new(0, mid_exit.col);
                mid_entry = Position::new(height - 1, mid_entry.col);
            }
        }

        let first = pf.find(from, mid_exit)?;
        let second = pf.find(mid_entry, to)?;
        let mut path = first;
        path.extend(second);
        Some(path)
    }

    /// Trace one river from a source. Returns the ordered path and how it
    /// ended.
    fn river_flow(&self, source: Position) -> (Vec<Position>, Outlet) {
        let mut path = vec![source];
        let mut current = source;
        let mut visited: HashSet<Position> = HashSet::new();
        visited.insert(source);

        loop {
            if self.ocean.at(current) {
                return (path, Outlet::Ocean);
            }
            // Merge into an already-traced river through any neighbour.
            if let Some(&n) = current
                .neighbours4(self.width(), self.height())
                .iter()
                .find(|n| self.river_cells.contains(*n))
            {
                path.push(n);
                return (path, Outlet::Merged);
            }

            let next = match self.quick_path(current) {
                Some(n) => Some(vec![n]),
                None => match self.find_lower_elevation(current) {
                    Some((target, wrap_row, wrap_col)) => self
                        .route(current, target, wrap_row, wrap_col)
                        .map(|p| p.into_iter().skip(1).collect::<Vec<_>>()),
                    None => None,
                },
            };

            match next {
                Some(segment) if !segment.is_empty() => {
                    for q in segment {
                        // A wrap-routed segment can brush cells it already
                        // holds; dropping them guards against ping-ponging
                        // across the seam forever.
                        if !visited.insert(q) {
                            return (path, Outlet::Lake);
                        }
                        path.push(q);
                        current = q;
                        if self.ocean.at(current) {
                            return (path, Outlet::Ocean);
                        }
                    }
                }
                _ => return (path, Outlet::Lake),
            }
        }
    }

    /// Enforce monotonically non-increasing elevation from source to
    /// outlet: any uphill step is flattened down to the running minimum.
    fn clean_up_flow(&mut self, path: &[Position]) {
        let mut ceiling = f64::INFINITY;
        for &p in path {
            let e = self.elevation.at(p);
            if e <= ceiling {
                ceiling = e;
            } else {
                self.elevation.set(p, ceiling);
            }
        }
    }

    /// Carve a valley around every river cell, strength decaying with
    /// Chebyshev distance. Channel cells (this river's own path and any
    /// earlier river) are never carved: a winding river can bring late,
    /// low cells within carving range of its own upstream cells, and
    /// pulling those down would re-break the cleaned profile.
    fn river_erosion(&mut self, path: &[Position]) {
        let width = self.width();
        let height = self.height();
        let channel: HashSet<Position> = path.iter().copied().collect();
        for &p in path {
            let bed = self.elevation.at(p);
            let r0 = p.row.saturating_sub(2);
            let r1 = (p.row + 2).min(height - 1);
            let c0 = p.col.saturating_sub(2);
            let c1 = (p.col + 2).min(width - 1);
            for row in r0..=r1 {
                for col in c0..=c1 {
                    let q = Position::new(row, col);
                    if channel.contains(&q) || self.river_cells.contains(&q) {
                        continue;
                    }
                    let e = self.elevation.at(q);
                    if e <= bed {
                        continue;
                    }
                    let factor = match p.chebyshev(&q) {
                        0 | 1 => CARVE_NEAR,
                        _ => CARVE_FAR,
                    };
                    self.elevation.set(q, bed + (e - bed) * factor);
                }
            }
        }
    }

    /// Accumulate flow along the path into the river map (or the lake map
    /// for an unresolved outlet). Flow picks up each cell's rainfall and is
    /// clamped non-negative against dry-cell drift.
    fn accumulate(&mut self, path: &[Position], outlet: Outlet) {
        let mut flow = 0.0f64;
        for &p in path {
            flow = (flow + self.precipitation.at(p).max(0.0)).max(0.0);
            flow += self.river_map.at(p); // upstream contribution at merges
            self.river_map.set(p, flow);
        }
        if outlet == Outlet::Lake {
            if let Some(&last) = path.last() {
                self.lake_map.set(last, self.lake_map.at(last) + flow);
            }
        }
    }

    fn run(&mut self) {
        let water_path = self.find_water_flow();
        let sources = self.find_river_sources(&water_path);
        for source in sources {
            let (path, outlet) = self.river_flow(source);
            self.clean_up_flow(&path);
            self.river_erosion(&path);
            self.accumulate(&path, outlet);
            self.river_cells.extend(path.iter().copied());
        }
    }
}

impl Simulation for ErosionSimulation {
    fn name(&self) -> &'static str {
        "erosion"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_erosion()
            && world.has_layer(layers::PRECIPITATION)
            && !world.has_layer(layers::RIVER_MAP)
    }

    fn execute(&self, world: &mut World, _rng: &mut StdRng) -> Result<()> {
        let elevation_layer = world.require_layer("erosion", layers::ELEVATION)?;
        let elevation = elevation_layer.as_float(layers::ELEVATION)?.clone();
        let mountain_level = elevation_layer
            .thresholds
            .as_ref()
            .and_then(|t| t.iter().rev().find_map(|(_, b)| *b))
            .unwrap_or(f64::INFINITY);
        let ocean = world.ocean()?.clone();
        let precipitation = world.float_layer(layers::PRECIPITATION)?.clone();

        let mut engine = ErosionEngine::new(elevation, ocean, precipitation, mountain_level);
        engine.run();

        world.replace_float_data(layers::ELEVATION, engine.elevation)?;
        world.set_layer(
            layers::RIVER_MAP,
            Layer::plain(LayerData::Float(engine.river_map)),
        )?;
        world.set_layer(
            layers::LAKE_MAP,
            Layer::plain(LayerData::Float(engine.lake_map)),
        )?;
        Ok(())
    }
}
