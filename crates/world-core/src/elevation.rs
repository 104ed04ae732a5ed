//! Elevation post-processing: everything between the raw heightmap-source
//! output and a world with a settled coastline.
//!
//! Order matters: land is centred first (so the map seam cuts as little
//! land as possible), then noise is injected, then the border band is
//! attenuated into guaranteed ocean, then the ocean mask is flooded from
//! the borders, shallow seas are smoothed, and finally the elevation
//! bands are derived.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::Result;
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::noisefield::NoiseField;
use crate::position::Position;
use crate::simulations::Simulation;
use crate::threshold::find_threshold_f;
use crate::world::{layers, World};

const NOISE_OCTAVES: u32 = 8;
/// Attenuation factors by ring distance to the nearest land (coast first).
const COAST_DEPTH_FACTORS: [f64; 4] = [0.3, 0.5, 0.7, 0.9];
const DEPTH_SMOOTHING_PASSES: usize = 10;

/// Roll the grid so the row and column with the minimal elevation sum sit
/// at the border. Minimizes the land cut by the map seam. Plates move with
/// the elevation so the two stay registered.
pub fn center_land(elevation: &mut Grid<f64>, plates: &mut Grid<u16>) {
    let width = elevation.width();
    let height = elevation.height();

    let mut row_sums = vec![0.0f64; height];
    let mut col_sums = vec![0.0f64; width];
    for p in elevation.positions() {
        let v = elevation.at(p);
        row_sums[p.row] += v;
        col_sums[p.col] += v;
    }

    let min_row = min_index(&row_sums);
    let min_col = min_index(&col_sums);
    // Shift so the minimal row/col land on the border (index 0).
    let row_shift = (height - min_row) % height;
    let col_shift = (width - min_col) % width;
    *elevation = elevation.rolled(row_shift, col_shift);
    *plates = plates.rolled(row_shift, col_shift);
}

fn min_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v < values[best] {
            best = i;
        }
    }
    best
}

/// Add seeded coherent noise, blended across the horizontal seam.
pub fn add_noise_to_elevation(elevation: &mut Grid<f64>, seed: u32) {
    let width = elevation.width();
    let border = width / 4;
    let freq_div = 16.0 * NOISE_OCTAVES as f64 / 2.0;
    let nf = NoiseField::new(seed, NOISE_OCTAVES);
    for p in elevation.positions() {
        let n = nf.sample_seamless(p.col, p.row, width, border, freq_div);
        elevation.set(p, elevation.at(p) + n);
    }
}

/// Width of the forced-ocean border band.
pub fn ocean_border_width(width: usize, height: usize) -> usize {
    30.min((width.min(height) / 5).max(1))
}

/// Linearly attenuate elevation toward zero within the border band, which
/// guarantees a navigable ocean ring once the mask is flooded.
pub fn place_oceans_at_map_borders(elevation: &mut Grid<f64>) {
    let width = elevation.width();
    let height = elevation.height();
    let border = ocean_border_width(width, height);

    let mut attenuate = |p: Position, i: usize| {
        let v = elevation.at(p) * i as f64 / border as f64;
        elevation.set(p, v);
    };

    for i in 0..border {
        for row in 0..height {
            attenuate(Position::new(row, i), i);
            attenuate(Position::new(row, width - i - 1), i);
        }
        for col in 0..width {
            attenuate(Position::new(i, col), i);
            attenuate(Position::new(height - i - 1, col), i);
        }
    }
}

/// Flood-fill the ocean mask: BFS from every border cell at or below sea
/// level, spreading 8-connected through cells at or below sea level.
pub fn fill_ocean(elevation: &Grid<f64>, sea_level: f64) -> Grid<bool> {
    let width = elevation.width();
    let height = elevation.height();
    let mut ocean = Grid::filled(width, height, false);
    let mut queue: VecDeque<Position> = VecDeque::new();

    let mut try_seed = |p: Position, ocean: &mut Grid<bool>, queue: &mut VecDeque<Position>| {
        if !ocean.at(p) && elevation.at(p) <= sea_level {
            ocean.set(p, true);
            queue.push_back(p);
        }
    };

    for col in 0..width {
        try_seed(Position::new(0, col), &mut ocean, &mut queue);
        try_seed(Position::new(height - 1, col), &mut ocean, &mut queue);
    }
    for row in 0..height {
        try_seed(Position::new(row, 0), &mut ocean, &mut queue);
        try_seed(Position::new(row, width - 1), &mut ocean, &mut queue);
    }

    while let Some(p) = queue.pop_front() {
        for n in p.neighbours8(width, height) {
            if !ocean.at(n) && elevation.at(n) <= sea_level {
                ocean.set(n, true);
                queue.push_back(n);
            }
        }
    }
    ocean
}

/// Flatten noise in shallow sub-surface ocean cells by compressing their
/// deviation from a midpoint, the underwater analogue of erosion smoothing.
pub fn harmonize_ocean(ocean: &Grid<bool>, elevation: &mut Grid<f64>, ocean_level: f64) {
    let shallow_sea = ocean_level * 0.85;
    let midpoint = shallow_sea / 2.0;
    for p in elevation.positions() {
        if ocean.at(p) && elevation.at(p) < shallow_sea {
            let v = midpoint + (elevation.at(p) - midpoint) / 5.0;
            elevation.set(p, v);
        }
    }
}

/// Normalized sea-depth layer: depth below sea level, attenuated near the
/// coast, box-smoothed, and rescaled to [0, 1].
pub fn sea_depth(elevation: &Grid<f64>, ocean: &Grid<bool>, sea_level: f64) -> Grid<f64> {
    let width = elevation.width();
    let height = elevation.height();
    let mut depth = Grid::filled(width, height, 0.0f64);

    for p in depth.positions() {
        if !ocean.at(p) {
            continue;
        }
        let mut d = (sea_level - elevation.at(p)).max(0.0);
        // Attenuate by ring distance to the nearest land cell.
        'rings: for (ring, factor) in COAST_DEPTH_FACTORS.iter().enumerate() {
            let radius = ring + 1;
            let r0 = p.row.saturating_sub(radius);
            let r1 = (p.row + radius).min(height - 1);
            let c0 = p.col.saturating_sub(radius);
            let c1 = (p.col + radius).min(width - 1);
            for row in r0..=r1 {
                for col in c0..=c1 {
                    if !ocean.at(Position::new(row, col)) {
                        d *= factor;
                        break 'rings;
                    }
                }
            }
        }
        depth.set(p, d);
    }

    for _ in 0..DEPTH_SMOOTHING_PASSES {
        depth = box_smooth_ocean(&depth, ocean);
    }
    depth.normalize(0.0, 1.0);
    depth
}

/// One 3×3 mean pass over ocean cells; land cells stay untouched.
fn box_smooth_ocean(depth: &Grid<f64>, ocean: &Grid<bool>) -> Grid<f64> {
    let width = depth.width();
    let height = depth.height();
    let mut out = depth.clone();
    for p in depth.positions() {
        if !ocean.at(p) {
            continue;
        }
        let mut sum = depth.at(p);
        let mut count = 1.0;
        for n in p.neighbours8(width, height) {
            sum += depth.at(n);
            count += 1.0;
        }
        out.set(p, sum / count);
    }
    out
}

/// Land-only elevation bands: top 10 % of land is hill, top 3 % mountain.
pub fn elevation_thresholds(
    elevation: &Grid<f64>,
    ocean: &Grid<bool>,
    sea_level: f64,
) -> Result<Vec<(String, Option<f64>)>> {
    // Degenerate worlds (little or no land) can collapse the cutoffs; the
    // nudge keeps the band sequence strictly increasing.
    let hill = find_threshold_f(elevation, 0.10, Some(ocean))?.max(sea_level + 1.0e-6);
    let mountain = find_threshold_f(elevation, 0.03, Some(ocean))?.max(hill + 1.0e-6);
    Ok(vec![
        ("sea".to_string(), Some(sea_level)),
        ("plain".to_string(), Some(hill)),
        ("hill".to_string(), Some(mountain)),
        ("mountain".to_string(), None),
    ])
}

// ── Stage ─────────────────────────────────────────────────────────────────────

/// The stage wrapper running the whole post-processing chain.
pub struct ElevationPostProcessor;

impl Simulation for ElevationPostProcessor {
    fn name(&self) -> &'static str {
        "elevation"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.has_layer(layers::ELEVATION) && !world.has_layer(layers::OCEAN)
    }

    fn execute(&self, world: &mut World, rng: &mut StdRng) -> Result<()> {
        let sea_level = world.params().ocean_level;
        let mut elevation = world.elevation()?.clone();
        let mut plates = match &world.require_layer("elevation", layers::PLATES)?.data {
            LayerData::Int(g) => g.clone(),
            _ => Grid::filled(world.width(), world.height(), 0u16),
        };

        center_land(&mut elevation, &mut plates);
        add_noise_to_elevation(&mut elevation, rng.gen::<u32>());
        place_oceans_at_map_borders(&mut elevation);

        let ocean = fill_ocean(&elevation, sea_level);
        harmonize_ocean(&ocean, &mut elevation, sea_level);
        let depth = sea_depth(&elevation, &ocean, sea_level);
        let bands = elevation_thresholds(&elevation, &ocean, sea_level)?;

        world.set_layer(
            layers::ELEVATION,
            Layer::with_thresholds(layers::ELEVATION, LayerData::Float(elevation), bands)?,
        )?;
        world.set_layer(layers::PLATES, Layer::plain(LayerData::Int(plates)))?;
        world.set_layer(layers::OCEAN, Layer::plain(LayerData::Bool(ocean)))?;
        world.set_layer(layers::SEA_DEPTH, Layer::plain(LayerData::Float(depth)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_land_moves_min_row_and_col_to_border() {
        // Put all the mass in the centre; the emptiest row/col go to index 0.
        let mut e = Grid::filled(8, 8, 1.0);
        for col in 0..8 {
            e.set(Position::new(3, col), 0.0);
        }
        for row in 0..8 {
            e.set(Position::new(row, 5), 0.0);
        }
        let mut plates = Grid::filled(8, 8, 0u16);
        center_land(&mut e, &mut plates);

        let row0_sum: f64 = (0..8).map(|c| e.at(Position::new(0, c))).sum();
        let col0_sum: f64 = (0..8).map(|r| e.at(Position::new(r, 0))).sum();
        for row in 0..8 {
            let s: f64 = (0..8).map(|c| e.at(Position::new(row, c))).sum();
            assert!(row0_sum <= s, "row 0 must carry the minimal sum");
        }
        for col in 0..8 {
            let s: f64 = (0..8).map(|r| e.at(Position::new(r, col))).sum();
            assert!(col0_sum <= s, "col 0 must carry the minimal sum");
        }
    }

    #[test]
    fn border_attenuation_zeroes_the_outermost_ring() {
        let mut e = Grid::filled(20, 20, 5.0);
        place_oceans_at_map_borders(&mut e);
        for i in 0..20 {
            assert_eq!(e.at(Position::new(0, i)), 0.0);
            assert_eq!(e.at(Position::new(19, i)), 0.0);
            assert_eq!(e.at(Position::new(i, 0)), 0.0);
            assert_eq!(e.at(Position::new(i, 19)), 0.0);
        }
        // Interior must be untouched.
        assert_eq!(e.at(Position::new(10, 10)), 5.0);
    }

    #[test]
    fn flood_fill_respects_landlocked_depressions() {
        // A below-sea-level basin walled off from the border must stay land.
        let mut e = Grid::filled(9, 9, 0.0);
        for row in 2..7 {
            for col in 2..7 {
                e.set(Position::new(row, col), 5.0);
            }
        }
        e.set(Position::new(4, 4), 0.0); // landlocked depression
        let ocean = fill_ocean(&e, 1.0);
        assert!(ocean.at(Position::new(0, 0)), "border cell must flood");
        assert!(
            !ocean.at(Position::new(4, 4)),
            "walled depression must not flood"
        );
    }

    #[test]
    fn border_cells_at_or_below_sea_level_always_flood() {
        let e = Grid::filled(12, 6, 0.5);
        let ocean = fill_ocean(&e, 1.0);
        for col in 0..12 {
            assert!(ocean.at(Position::new(0, col)));
            assert!(ocean.at(Position::new(5, col)));
        }
    }

    #[test]
    fn harmonize_compresses_shallow_cells_toward_midpoint() {
        let mut e = Grid::filled(4, 4, 0.1);
        let ocean = Grid::filled(4, 4, true);
        harmonize_ocean(&ocean, &mut e, 1.0);
        let midpoint = 0.425;
        let v = e.at(Position::new(0, 0));
        assert!(
            (v - midpoint).abs() < (0.1f64 - midpoint).abs(),
            "deviation must shrink: {v}"
        );
    }

    #[test]
    fn elevation_bands_are_ordered() {
        let mut e = Grid::filled(16, 16, 0.0);
        for p in e.positions() {
            e.set(p, (p.row * 16 + p.col) as f64 / 25.0);
        }
        let ocean = fill_ocean(&e, 1.0);
        let bands = elevation_thresholds(&e, &ocean, 1.0).unwrap();
        assert_eq!(bands.len(), 4);
        let hill = bands[1].1.unwrap();
        let mountain = bands[2].1.unwrap();
        assert!(hill < mountain, "hill {hill} must sit below mountain {mountain}");
        assert!(bands[3].1.is_none(), "mountain band is open-ended");
    }

    #[test]
    fn sea_depth_is_normalized_and_zero_on_land() {
        let mut e = Grid::filled(10, 10, 2.0);
        for col in 0..10 {
            for row in 0..3 {
                e.set(Position::new(row, col), 0.0);
            }
        }
        let ocean = fill_ocean(&e, 1.0);
        let depth = sea_depth(&e, &ocean, 1.0);
        assert!(depth.min_value() >= 0.0 && depth.max_value() <= 1.0);
        for p in depth.positions() {
            if !ocean.at(p) {
                assert_eq!(depth.at(p), 0.0, "land cell {p:?} must have zero depth");
            }
        }
    }
}
