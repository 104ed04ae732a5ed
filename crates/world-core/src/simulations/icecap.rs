//! Icecap: probabilistic sea ice over cold ocean.
//!
//! Only ocean colder than a fraction of the polar band boundary can freeze.
//! The freeze chance ramps linearly across a window below that threshold and
//! is raised by already-solid neighbours, so caps grow contiguously instead
//! of speckling.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{Result, WorldError};
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::position::Position;
use crate::simulations::Simulation;
use crate::world::{layers, World};

/// Fraction of the polar temperature boundary below which ice is possible.
const MAX_FREEZE_FRACTION: f64 = 0.60;
/// Fraction of the freeze threshold over which the chance ramps from 0 to 1.
const FREEZE_CHANCE_WINDOW: f64 = 0.2;
/// How strongly solid (land or frozen) neighbours raise the chance.
const NEIGHBOUR_INFLUENCE: f64 = 0.5;

pub struct IcecapSimulation;

/// Ice thickness per cell; zero everywhere ice did not form. Cells are
/// visited in row-major order so the north and west neighbours are already
/// decided when a cell rolls its freeze trial.
pub fn compute_icecap(
    temperature: &Grid<f64>,
    ocean: &Grid<bool>,
    polar_threshold: f64,
    rng: &mut StdRng,
) -> Grid<f64> {
    let freeze_threshold = polar_threshold * MAX_FREEZE_FRACTION;
    let ramp = freeze_threshold * FREEZE_CHANCE_WINDOW;
    let mut icecap = Grid::filled(temperature.width(), temperature.height(), 0.0f64);

    for p in temperature.positions() {
        if !ocean.at(p) {
            continue;
        }
        let t = temperature.at(p);
        if t >= freeze_threshold {
            continue;
        }
        let mut chance = if ramp <= 0.0 || t <= freeze_threshold - ramp {
            1.0
        } else {
            (freeze_threshold - t) / ramp
        };

        // Already-decided neighbours (north and west) that are solid.
        let mut solid = 0usize;
        let mut seen = 0usize;
        if p.row > 0 {
            let n = Position::new(p.row - 1, p.col);
            seen += 1;
            if !ocean.at(n) || icecap.at(n) > 0.0 {
                solid += 1;
            }
        }
        if p.col > 0 {
            let w = Position::new(p.row, p.col - 1);
            seen += 1;
            if !ocean.at(w) || icecap.at(w) > 0.0 {
                solid += 1;
            }
        }
        if seen > 0 {
            chance += solid as f64 / seen as f64 * NEIGHBOUR_INFLUENCE;
        }

        if rng.gen::<f64>() < chance.min(1.0) {
            icecap.set(p, freeze_threshold - t);
        }
    }
    icecap
}

impl Simulation for IcecapSimulation {
    fn name(&self) -> &'static str {
        "icecap"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_biome()
            && world.has_layer(layers::OCEAN)
            && world.has_layer(layers::TEMPERATURE)
            && !world.has_layer(layers::ICECAP)
    }

    fn execute(&self, world: &mut World, rng: &mut StdRng) -> Result<()> {
        let layer = world.require_layer("icecap", layers::TEMPERATURE)?;
        let polar_threshold = layer
            .thresholds
            .as_ref()
            .and_then(|t| t.first())
            .and_then(|(_, bound)| *bound)
            .ok_or(WorldError::MissingLayer {
                stage: "icecap",
                layer: "temperature thresholds",
            })?;
        let temperature = layer.as_float(layers::TEMPERATURE)?;
        let icecap = compute_icecap(temperature, world.ocean()?, polar_threshold, rng);
        world.set_layer(layers::ICECAP, Layer::plain(LayerData::Float(icecap)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn warm_ocean_never_freezes() {
        let temperature = Grid::filled(8, 8, 0.9f64);
        let ocean = Grid::filled(8, 8, true);
        let ice = compute_icecap(&temperature, &ocean, 1.0, &mut StdRng::seed_from_u64(3));
        assert!(ice.iter().all(|&v| v == 0.0), "0.9 is above the 0.6 freeze threshold");
    }

    #[test]
    fn deep_cold_always_freezes_with_proportional_thickness() {
        // Far below the ramp window the chance is exactly 1.
        let temperature = Grid::filled(6, 6, 0.05f64);
        let ocean = Grid::filled(6, 6, true);
        let ice = compute_icecap(&temperature, &ocean, 1.0, &mut StdRng::seed_from_u64(3));
        let expected = 0.6 - 0.05;
        for p in ice.positions() {
            approx::assert_abs_diff_eq!(ice.at(p), expected, epsilon = 1.0e-12);
        }
    }

    #[test]
    fn land_stays_ice_free() {
        let temperature = Grid::filled(6, 6, 0.0f64);
        let mut ocean = Grid::filled(6, 6, true);
        ocean.set(Position::new(2, 2), false);
        let ice = compute_icecap(&temperature, &ocean, 1.0, &mut StdRng::seed_from_u64(3));
        assert_eq!(ice.at(Position::new(2, 2)), 0.0, "land cells carry no ice");
    }

    #[test]
    fn same_seed_same_cap() {
        let mut temperature = Grid::filled(16, 16, 0.0f64);
        for p in temperature.positions() {
            temperature.set(p, p.index(16) as f64 / 255.0 * 0.7);
        }
        let ocean = Grid::filled(16, 16, true);
        let a = compute_icecap(&temperature, &ocean, 1.0, &mut StdRng::seed_from_u64(11));
        let b = compute_icecap(&temperature, &ocean, 1.0, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
