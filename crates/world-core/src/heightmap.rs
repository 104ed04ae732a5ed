//! Heightmap source contract.
//!
//! The plate-tectonics engine is an external collaborator: all the pipeline
//! needs from it is a flat elevation array and a flat plate-index array.
//! `NoiseHeightmapSource` is the built-in stand-in (octave fBm elevation,
//! nearest-seed-point plate regions) so generation, tooling, and tests run
//! without the external engine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::grid::Grid;
use crate::noisefield::NoiseField;
use crate::position::Position;

/// Raw output of a heightmap source, row-major, length `width × height`.
pub struct HeightmapOutput {
    pub elevation: Vec<f64>,
    pub plates: Vec<u16>,
}

pub trait HeightmapSource {
    fn generate(
        &self,
        seed: u64,
        width: usize,
        height: usize,
        plate_count: u16,
    ) -> Result<HeightmapOutput>;
}

/// Built-in noise-backed source. Elevation spans [0, 20] so the default
/// ocean level (1.0) floods roughly the lowest twentieth of the range
/// before border attenuation.
pub struct NoiseHeightmapSource {
    pub octaves: u32,
}

impl Default for NoiseHeightmapSource {
    fn default() -> Self {
        Self { octaves: 6 }
    }
}

impl HeightmapSource for NoiseHeightmapSource {
    fn generate(
        &self,
        seed: u64,
        width: usize,
        height: usize,
        plate_count: u16,
    ) -> Result<HeightmapOutput> {
        let mut rng = StdRng::seed_from_u64(seed);
        let nf = NoiseField::new(rng.gen::<u32>(), self.octaves);
        let freq_div = (width.max(height) as f64 / 4.0).max(1.0);

        let mut elevation = Grid::filled(width, height, 0.0f64);
        for p in elevation.positions() {
            elevation.set(
                p,
                nf.sample(p.col as f64 / freq_div, p.row as f64 / freq_div),
            );
        }
        elevation.normalize(0.0, 20.0);

        // Plate regions: nearest seeded centre, column distance wrapping at
        // the horizontal seam like the elevation noise does.
        let centres: Vec<Position> = (0..plate_count)
            .map(|_| Position::new(rng.gen_range(0..height), rng.gen_range(0..width)))
            .collect();
        let mut plates = Grid::filled(width, height, 0u16);
        for p in plates.positions() {
            let mut best = 0u16;
            let mut best_d = usize::MAX;
            for (i, c) in centres.iter().enumerate() {
                let d = p.row.abs_diff(c.row) + p.wrapped_col_distance(c, width);
                if d < best_d {
                    best_d = d;
                    best = i as u16;
                }
            }
            plates.set(p, best);
        }

        Ok(HeightmapOutput {
            elevation: elevation.as_slice().to_vec(),
            plates: plates.as_slice().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_lengths_match_grid() {
        let out = NoiseHeightmapSource::default()
            .generate(3, 32, 16, 5)
            .unwrap();
        assert_eq!(out.elevation.len(), 32 * 16);
        assert_eq!(out.plates.len(), 32 * 16);
    }

    #[test]
    fn same_seed_reproduces() {
        let src = NoiseHeightmapSource::default();
        let a = src.generate(11, 24, 12, 4).unwrap();
        let b = src.generate(11, 24, 12, 4).unwrap();
        assert_eq!(a.elevation, b.elevation);
        assert_eq!(a.plates, b.plates);
    }

    #[test]
    fn every_plate_index_is_in_range() {
        let out = NoiseHeightmapSource::default()
            .generate(5, 40, 20, 7)
            .unwrap();
        assert!(out.plates.iter().all(|&p| p < 7));
    }
}
