//! Watermap: accumulated flow volume per land cell.
//!
//! Every land cell with positive precipitation spawns a droplet that runs
//! downhill, splitting proportionally to the elevation drop toward each
//! lower neighbour. Implemented as an explicit work stack so the
//! termination condition (branch flow below epsilon) is auditable.

use rand::rngs::StdRng;

use crate::error::Result;
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::position::Position;
use crate::simulations::Simulation;
use crate::threshold::find_threshold_f;
use crate::world::{layers, World};

/// Branches carrying less than this stop distributing.
const FLOW_EPSILON: f64 = 0.05;

pub struct WatermapSimulation;

/// Distribute one droplet of quantity `q` from `start` over the watermap.
///
/// A cell with lower neighbours passes its whole quantity on, each share
/// recorded at the receiving neighbour; only a cell with nowhere lower to
/// send water pools it in place. Shares below the epsilon are still
/// delivered, they just stop spreading further.
pub fn droplet(
    elevation: &Grid<f64>,
    ocean: &Grid<bool>,
    start: Position,
    q: f64,
    watermap: &mut Grid<f64>,
) {
    let width = elevation.width();
    let height = elevation.height();
    let mut stack: Vec<(Position, f64)> = vec![(start, q)];

    while let Some((p, q)) = stack.pop() {
        if q < 0.0 || ocean.at(p) {
            continue;
        }
        let here = elevation.at(p) + watermap.at(p);

        // Lower neighbours weighted by their (elevation + accumulated
        // water) drop.
        let mut drops: Vec<(Position, f64)> = Vec::with_capacity(4);
        let mut total_drop = 0.0;
        for n in p.neighbours4(width, height) {
            let level = elevation.at(n) + watermap.at(n);
            if level < here {
                let d = here - level;
                drops.push((n, d));
                total_drop += d;
            }
        }

        if drops.is_empty() || total_drop <= 0.0 {
            // Local pool: the quantity stays here.
            watermap.set(p, watermap.at(p) + q);
            continue;
        }
        for (n, d) in drops {
            let share = q * d / total_drop;
            if ocean.at(n) {
                continue; // flow into the sea leaves the map
            }
            watermap.set(n, watermap.at(n) + share);
            if share > FLOW_EPSILON {
                stack.push((n, share));
            }
        }
    }
}

/// Full accumulation grid: one droplet per rainy land cell.
pub fn compute_watermap(
    elevation: &Grid<f64>,
    ocean: &Grid<bool>,
    precipitation: &Grid<f64>,
) -> Grid<f64> {
    let mut watermap = Grid::filled(elevation.width(), elevation.height(), 0.0f64);
    for p in elevation.positions() {
        let rain = precipitation.at(p);
        if !ocean.at(p) && rain > 0.0 {
            droplet(elevation, ocean, p, rain, &mut watermap);
        }
    }
    watermap
}

impl Simulation for WatermapSimulation {
    fn name(&self) -> &'static str {
        "watermap"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_erosion()
            && world.has_layer(layers::PRECIPITATION)
            && !world.has_layer(layers::WATERMAP)
    }

    fn execute(&self, world: &mut World, _rng: &mut StdRng) -> Result<()> {
        let elevation = world.elevation()?;
        let ocean = world.ocean()?;
        let precipitation = world.float_layer(layers::PRECIPITATION)?;
        let watermap = compute_watermap(elevation, ocean, precipitation);

        let creek = find_threshold_f(&watermap, 0.05, Some(ocean))?;
        let mut river = find_threshold_f(&watermap, 0.02, Some(ocean))?;
        let mut main_river = find_threshold_f(&watermap, 0.007, Some(ocean))?;
        // Flat watermaps can collapse the cutoffs; keep the bands ordered.
        if river <= creek {
            river = creek + 1.0e-9;
        }
        if main_river <= river {
            main_river = river + 1.0e-9;
        }

        world.set_layer(
            layers::WATERMAP,
            Layer::with_thresholds(
                layers::WATERMAP,
                LayerData::Float(watermap),
                vec![
                    ("creek".to_string(), Some(creek)),
                    ("river".to_string(), Some(river)),
                    ("main river".to_string(), Some(main_river)),
                    ("torrent".to_string(), None),
                ],
            )?,
        )?;
        Ok(())
    }
}
