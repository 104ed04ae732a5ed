//! Precipitation simulation.
//!
//! Seam-blended octave noise renormalized to [-1, 1], then reshaped by a
//! gamma curve of normalized temperature: hot regions keep a flatter,
//! less-suppressed curve, cold regions get their rainfall compressed.
//! Output is renormalized to [-1, 1] after reshaping.

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
const CURVE_GAMMA: f64 = 1.25;
const CURVE_BONUS: f64 = 0.2;

pub struct PrecipitationSimulation;

/// Raw seam-blended noise field in [-1, 1].
pub fn base_noise(width: usize, height: usize, rng: &mut StdRng) -> Grid<f64> {
    let border = width / 4;
    let freq_div = 16.0 * OCTAVES as f64 / 2.0;
    let nf = NoiseField::new(rng.gen::<u32>(), OCTAVES);

    let mut out = Grid::filled(width, height, 0.0f64);
    for p in out.positions() {
        out.set(p, nf.sample_seamless(p.col, p.row, width, border, freq_div));
    }
    out.normalize(-1.0, 1.0);
    out
}

/// Reshape rainfall by temperature: multiply by a gamma curve of the
/// temperature percentile, with a floor bonus so cold deserts still see
/// occasional rain.
pub fn shape_by_temperature(precipitation: &mut Grid<f64>, temperature: &Grid<f64>) {
    let t_min = temperature.min_value();
    let t_range = (temperature.max_value() - t_min).max(f64::MIN_POSITIVE);
    for p in precipitation.positions() {
        let t_norm = (temperature.at(p) - t_min) / t_range;
        let curve = t_norm.powf(CURVE_GAMMA) * (1.0 - CURVE_BONUS) + CURVE_BONUS;
        precipitation.set(p, precipitation.at(p) * curve);
    }
    precipitation.normalize(-1.0, 1.0);
}

pub fn precipitation_thresholds(
    field: &Grid<f64>,
    ocean: &Grid<bool>,
) -> Result<Vec<(String, Option<f64>)>> {
    let low = find_threshold_f(field, 0.75, Some(ocean))?;
    let mut med = find_threshold_f(field, 0.30, Some(ocean))?;
    if med <= low {
        med = low + 1.0e-9;
    }
    Ok(vec![
        ("low".to_string(), Some(low)),
        ("med".to_string(), Some(med)),
        ("hig".to_string(), None),
    ])
}

impl Simulation for PrecipitationSimulation {
    fn name(&self) -> &'static str {
        "precipitation"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_precipitations()
            && world.has_layer(layers::TEMPERATURE)
            && !world.has_layer(layers::PRECIPITATION)
    }

    fn execute(&self, world: &mut World, rng: &mut StdRng) -> Result<()> {
        let temperature = world.float_layer(layers::TEMPERATURE)?;
        let mut field = base_noise(world.width(), world.height(), rng);
        shape_by_temperature(&mut field, temperature);

        let ocean = world.ocean()?;
        let bands = precipitation_thresholds(&field, ocean)?;
        world.set_layer(
            layers::PRECIPITATION,
            Layer::with_thresholds(layers::PRECIPITATION, LayerData::Float(field), bands)?,
        )?;
        Ok(())
    }
}
