//! Humidity: precipitation and irrigation combined, binned into seven
//! skewed quantiles. The spacing is deliberately uneven, piling cutoffs at
//! the extremes so the resulting biome distribution matches observation
//! rather than a uniform spread.

use std::collections::BTreeMap;

use rand::rngs::StdRng;

use crate::error::Result;
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::simulations::Simulation;
use crate::threshold::find_threshold_f;
use crate::world::{layers, World};

const PRECIPITATION_WEIGHT: f64 = 1.0;
const IRRIGATION_WEIGHT: f64 = 3.0;

/// Percentile label and the fraction of land cells above each cutoff,
/// driest label first.
const QUANTILES: [(&str, f64); 7] = [
    ("12", 0.941),
    ("25", 0.778),
    ("37", 0.507),
    ("50", 0.236),
    ("62", 0.073),
    ("75", 0.014),
    ("87", 0.002),
];

pub struct HumiditySimulation;

pub fn combine(precipitation: &Grid<f64>, irrigation: &Grid<f64>) -> Grid<f64> {
    let mut out = Grid::filled(precipitation.width(), precipitation.height(), 0.0f64);
    for p in out.positions() {
        out.set(
            p,
            precipitation.at(p) * PRECIPITATION_WEIGHT + irrigation.at(p) * IRRIGATION_WEIGHT,
        );
    }
    out
}

pub fn humidity_quantiles(field: &Grid<f64>, ocean: &Grid<bool>) -> Result<BTreeMap<String, f64>> {
    let mut out = BTreeMap::new();
    let mut floor = f64::NEG_INFINITY;
    for (label, fraction) in QUANTILES {
        let mut q = find_threshold_f(field, fraction, Some(ocean))?;
        // Quantiles must stay ordered even on degenerate fields.
        if q <= floor {
            q = floor + 1.0e-9;
        }
        floor = q;
        out.insert(label.to_string(), q);
    }
    Ok(out)
}

impl Simulation for HumiditySimulation {
    fn name(&self) -> &'static str {
        "humidity"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_erosion()
            && world.has_layer(layers::PRECIPITATION)
            && world.has_layer(layers::IRRIGATION)
            && !world.has_layer(layers::HUMIDITY)
    }

    fn execute(&self, world: &mut World, _rng: &mut StdRng) -> Result<()> {
        let precipitation = world.float_layer(layers::PRECIPITATION)?;
        let irrigation = world.float_layer(layers::IRRIGATION)?;
        let field = combine(precipitation, irrigation);
        let quantiles = humidity_quantiles(&field, world.ocean()?)?;
        world.set_layer(
            layers::HUMIDITY,
            Layer::with_quantiles(LayerData::Float(field), quantiles),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn irrigation_outweighs_precipitation_three_to_one() {
        let mut p = Grid::filled(2, 1, 0.0f64);
        let mut i = Grid::filled(2, 1, 0.0f64);
        p.set(Position::new(0, 0), 1.0);
        i.set(Position::new(0, 1), 1.0);
        let h = combine(&p, &i);
        assert_eq!(h.at(Position::new(0, 0)), 1.0);
        assert_eq!(h.at(Position::new(0, 1)), 3.0);
    }

    #[test]
    fn quantiles_are_ordered_driest_to_wettest() {
        let mut field = Grid::filled(32, 32, 0.0f64);
        for p in field.positions() {
            field.set(p, (p.index(32) as f64 / 1023.0) * 2.0 - 1.0);
        }
        let ocean = Grid::filled(32, 32, false);
        let q = humidity_quantiles(&field, &ocean).unwrap();
        assert_eq!(q.len(), 7);
        let order = ["12", "25", "37", "50", "62", "75", "87"];
        for w in order.windows(2) {
            assert!(
                q[w[0]] < q[w[1]],
                "quantile {} ({}) must lie below {} ({})",
                w[0],
                q[w[0]],
                w[1],
                q[w[1]]
            );
        }
    }

    #[test]
    fn extreme_quantile_captures_a_sliver() {
        let mut field = Grid::filled(64, 64, 0.0f64);
        for p in field.positions() {
            field.set(p, p.index(64) as f64);
        }
        let ocean = Grid::filled(64, 64, false);
        let q = humidity_quantiles(&field, &ocean).unwrap();
        let above = field.iter().filter(|&&v| v > q["87"]).count();
        let total = 64 * 64;
        // 0.2% of 4096 ≈ 8 cells.
        assert!(
            above <= 16,
            "only a sliver ({above} of {total}) may exceed the 87 quantile"
        );
    }
}
