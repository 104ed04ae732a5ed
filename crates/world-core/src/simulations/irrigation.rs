//! Irrigation: the watermap diffused outward, so land near rivers reads as
//! wetter than land the same distance from nothing.

use rand::rngs::StdRng;

use crate::error::Result;
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::position::Position;
use crate::simulations::Simulation;
use crate::world::{layers, World};

const RADIUS: usize = 10;

pub struct IrrigationSimulation;

/// Spread every land cell's watermap value within `RADIUS`, weighted by
/// `1 / (ln(d + 1) + 1)` of the Euclidean distance.
pub fn compute_irrigation(watermap: &Grid<f64>, ocean: &Grid<bool>) -> Grid<f64> {
    let width = watermap.width();
    let height = watermap.height();
    let mut irrigation = Grid::filled(width, height, 0.0f64);

    for p in watermap.positions() {
        if ocean.at(p) {
            continue;
        }
        let w = watermap.at(p);
        if w == 0.0 {
            continue;
        }
        let r0 = p.row.saturating_sub(RADIUS);
        let r1 = (p.row + RADIUS).min(height - 1);
        let c0 = p.col.saturating_sub(RADIUS);
        let c1 = (p.col + RADIUS).min(width - 1);
        for row in r0..=r1 {
            for col in c0..=c1 {
                let q = Position::new(row, col);
                let dr = p.row.abs_diff(row) as f64;
                let dc = p.col.abs_diff(col) as f64;
                let dist = (dr * dr + dc * dc).sqrt();
                if dist > RADIUS as f64 {
                    continue;
                }
                let share = w / (dist.ln_1p() + 1.0);
                irrigation.set(q, irrigation.at(q) + share);
            }
        }
    }
    irrigation
}

impl Simulation for IrrigationSimulation {
    fn name(&self) -> &'static str {
        "irrigation"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_erosion()
            && world.has_layer(layers::WATERMAP)
            && !world.has_layer(layers::IRRIGATION)
    }

    fn execute(&self, world: &mut World, _rng: &mut StdRng) -> Result<()> {
        let watermap = world.float_layer(layers::WATERMAP)?;
        let ocean = world.ocean()?;
        let irrigation = compute_irrigation(watermap, ocean);
        world.set_layer(layers::IRRIGATION, Layer::plain(LayerData::Float(irrigation)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_source_decays_with_distance() {
        let mut wm = Grid::filled(25, 25, 0.0f64);
        wm.set(Position::new(12, 12), 1.0);
        let ocean = Grid::filled(25, 25, false);
        let irr = compute_irrigation(&wm, &ocean);

        let centre = irr.at(Position::new(12, 12));
        let near = irr.at(Position::new(12, 13));
        let far = irr.at(Position::new(12, 20));
        assert_eq!(centre, 1.0, "distance 0 keeps the full weight");
        assert!(near < centre && near > 0.0);
        assert!(far < near, "weight must decay with distance");
        assert_eq!(
            irr.at(Position::new(12, 23)),
            0.0,
            "outside the radius nothing arrives"
        );
    }

    #[test]
    fn ocean_sources_are_ignored() {
        let mut wm = Grid::filled(9, 9, 0.0f64);
        wm.set(Position::new(4, 4), 5.0);
        let mut ocean = Grid::filled(9, 9, false);
        ocean.set(Position::new(4, 4), true);
        let irr = compute_irrigation(&wm, &ocean);
        assert!(irr.iter().all(|&v| v == 0.0), "ocean watermap must not spread");
    }

    #[test]
    fn weight_formula_matches_log_curve() {
        let mut wm = Grid::filled(9, 9, 0.0f64);
        wm.set(Position::new(4, 4), 2.0);
        let ocean = Grid::filled(9, 9, false);
        let irr = compute_irrigation(&wm, &ocean);
        let d = 3.0f64;
        let expected = 2.0 / (d.ln_1p() + 1.0);
        approx::assert_abs_diff_eq!(irr.at(Position::new(4, 7)), expected, epsilon = 1.0e-12);
    }
}
