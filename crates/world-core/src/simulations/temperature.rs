//! Temperature simulation.
//!
//! A triangular latitude factor (peak at an axial-tilt-shifted equator)
//! dominates, coherent noise perturbs it, and a quadratic altitude penalty
//! cools everything above the mountain threshold. Noise is blended across
//! the horizontal seam.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::Result;
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::noisefield::NoiseField;
use crate::simulations::Simulation;
use crate::threshold::find_threshold_f;
use crate::world::{layers, World};

const OCTAVES: u32 = 8;
/// Fractions of cells warmer than each band's upper bound, coldest first.
const BAND_FRACTIONS: [(&str, f64); 6] = [
    ("polar", 0.874),
    ("alpine", 0.765),
    ("boreal", 0.594),
    ("cool", 0.439),
    ("warm", 0.366),
    ("subtropical", 0.124),
];
/// Floor for the altitude multiplier, so peaks stay finitely cold.
const MIN_ALTITUDE_FACTOR: f64 = 0.033;

pub struct TemperatureSimulation;

/// Triangular falloff from the shifted equator: 1 at `axial_tilt`, 0 at the
/// poles of the shifted frame.
fn latitude_factor(y_scaled: f64, axial_tilt: f64) -> f64 {
    let d = (y_scaled - axial_tilt).abs();
    (1.0 - d / 0.5).max(0.0)
}

pub fn temperature_field(
    elevation: &Grid<f64>,
    mountain_level: f64,
    rng: &mut StdRng,
) -> Grid<f64> {
    let width = elevation.width();
    let height = elevation.height();
    let border = width / 4;
    let freq_div = 16.0 * OCTAVES as f64 / 2.0;

    let nf = NoiseField::new(rng.gen::<u32>(), OCTAVES);
    // Hotter or colder runs: squared normal-ish draw around 1.
    let distance_to_sun = {
        let d: f64 = 1.0 + (rng.gen::<f64>() - 0.5) * 0.24;
        (d * d).max(0.1)
    };
    let axial_tilt: f64 = (rng.gen::<f64>() - 0.5) * 0.4;

    let max_elevation = elevation.max_value();
    let mut out = Grid::filled(width, height, 0.0f64);
    for p in out.positions() {
        let y_scaled = p.row as f64 / height as f64 - 0.5;
        let lat = latitude_factor(y_scaled, axial_tilt);
        let n = nf.sample_seamless(p.col, p.row, width, border, freq_div);
        let mut t = (lat * 12.0 + n) / 13.0 / distance_to_sun;

        let e = elevation.at(p);
        if e > mountain_level && max_elevation > mountain_level {
            let altitude_factor = ((max_elevation - e) / (max_elevation - mountain_level))
                .clamp(MIN_ALTITUDE_FACTOR, 1.0);
            t *= altitude_factor * altitude_factor;
        }
        out.set(p, t);
    }
    out
}

pub fn temperature_thresholds(field: &Grid<f64>) -> Result<Vec<(String, Option<f64>)>> {
    let mut bands = Vec::with_capacity(7);
    let mut floor = f64::NEG_INFINITY;
    for (label, fraction) in BAND_FRACTIONS {
        let mut t = find_threshold_f(field, fraction, None)?;
        if t <= floor {
            t = floor + 1.0e-9;
        }
        floor = t;
        bands.push((label.to_string(), Some(t)));
    }
    bands.push(("tropical".to_string(), None));
    Ok(bands)
}

impl Simulation for TemperatureSimulation {
    fn name(&self) -> &'static str {
        "temperature"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_precipitations()
            && world.has_layer(layers::OCEAN)
            && !world.has_layer(layers::TEMPERATURE)
    }

    fn execute(&self, world: &mut World, rng: &mut StdRng) -> Result<()> {
        let elevation_layer = world.require_layer("temperature", layers::ELEVATION)?;
        let elevation = elevation_layer.as_float(layers::ELEVATION)?;
        // Mountain band bound: last closed threshold of the elevation layer.
        let mountain_level = elevation_layer
            .thresholds
            .as_ref()
            .and_then(|t| t.iter().rev().find_map(|(_, b)| *b))
            .unwrap_or(f64::INFINITY);

        let field = temperature_field(elevation, mountain_level, rng);
        let bands = temperature_thresholds(&field)?;
        world.set_layer(
            layers::TEMPERATURE,
            Layer::with_thresholds(layers::TEMPERATURE, LayerData::Float(field), bands)?,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use rand::SeedableRng;

    #[test]
    fn latitude_factor_peaks_at_shifted_equator() {
        assert_eq!(latitude_factor(0.1, 0.1), 1.0);
        assert!(latitude_factor(0.5, 0.0) < 1.0e-12);
        assert!(latitude_factor(-0.2, 0.1) < latitude_factor(0.0, 0.1));
    }

    #[test]
    fn equator_warmer_than_poles_on_flat_terrain() {
        let elevation = Grid::filled(32, 33, 0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let t = temperature_field(&elevation, 10.0, &mut rng);
        // Average a band around the centre so the axial-tilt shift cannot
        // move the peak out of the sample.
        let mut eq_mean = 0.0;
        let mut pole_mean = 0.0;
        for col in 0..32 {
            for row in 12..=20 {
                eq_mean += t.at(Position::new(row, col)) / 9.0;
            }
            pole_mean += t.at(Position::new(0, col));
        }
        assert!(
            eq_mean > pole_mean,
            "equator {eq_mean} should out-heat pole {pole_mean}"
        );
    }

    #[test]
    fn mountains_are_colder_than_their_latitude() {
        let mut elevation = Grid::filled(16, 16, 0.0);
        elevation.set(Position::new(8, 8), 10.0);
        let mut rng = StdRng::seed_from_u64(5);
        let with_peak = temperature_field(&elevation, 5.0, &mut rng);

        let flat = Grid::filled(16, 16, 0.0);
        let mut rng = StdRng::seed_from_u64(5);
        let without_peak = temperature_field(&flat, 5.0, &mut rng);

        let p = Position::new(8, 8);
        assert!(
            with_peak.at(p) < without_peak.at(p),
            "altitude penalty must cool the peak"
        );
    }

    #[test]
    fn thresholds_are_seven_increasing_bands() {
        let mut field = Grid::filled(32, 32, 0.0);
        for p in field.positions() {
            field.set(p, (p.row as f64 / 31.0) - 0.5);
        }
        let bands = temperature_thresholds(&field).unwrap();
        assert_eq!(bands.len(), 7);
        assert_eq!(bands[0].0, "polar");
        assert_eq!(bands[6].0, "tropical");
        assert!(bands[6].1.is_none());
        for w in bands.windows(2) {
            if let (Some(a), Some(b)) = (w[0].1, w[1].1) {
                assert!(a < b, "bands must increase: {a} !< {b}");
            }
        }
    }

    #[test]
    fn same_rng_state_reproduces_field() {
        let elevation = Grid::filled(24, 12, 1.0);
        let a = temperature_field(&elevation, 5.0, &mut StdRng::seed_from_u64(9));
        let b = temperature_field(&elevation, 5.0, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
