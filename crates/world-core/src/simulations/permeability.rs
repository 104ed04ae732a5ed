//! Permeability: an independent seeded noise field with no terrain
//! coupling. Downstream consumers read the low/med/high bands.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::Result;
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::noisefield::NoiseField;
use crate::simulations::Simulation;
use crate::threshold::find_threshold_f;
use crate::world::{layers, World};

const OCTAVES: u32 = 6;

pub struct PermeabilitySimulation;

pub fn permeability_field(width: usize, height: usize, rng: &mut StdRng) -> Grid<f64> {
    let freq_div = 64.0 * OCTAVES as f64 / 2.0;
    let nf = NoiseField::new(rng.gen::<u32>(), OCTAVES);
    let mut out = Grid::filled(width, height, 0.0f64);
    for p in out.positions() {
        out.set(p, nf.sample(p.col as f64 / freq_div, p.row as f64 / freq_div));
    }
    out.normalize(-1.0, 1.0);
    out
}

impl Simulation for PermeabilitySimulation {
    fn name(&self) -> &'static str {
        "permeability"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_erosion()
            && world.has_layer(layers::OCEAN)
            && !world.has_layer(layers::PERMEABILITY)
    }

    fn execute(&self, world: &mut World, rng: &mut StdRng) -> Result<()> {
        let field = permeability_field(world.width(), world.height(), rng);
        let ocean = world.ocean()?;
        let low = find_threshold_f(&field, 0.75, Some(ocean))?;
        let mut med = find_threshold_f(&field, 0.25, Some(ocean))?;
        if med <= low {
            med = low + 1.0e-9;
        }
        world.set_layer(
            layers::PERMEABILITY,
            Layer::with_thresholds(
                layers::PERMEABILITY,
                LayerData::Float(field),
                vec![
                    ("low".to_string(), Some(low)),
                    ("med".to_string(), Some(med)),
                    ("hig".to_string(), None),
                ],
            )?,
        )?;
        Ok(())
    }
}
