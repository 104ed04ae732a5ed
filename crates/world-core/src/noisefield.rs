//! Seeded coherent-noise field.
//!
//! Octave-summed Perlin (amplitude halves, frequency doubles per octave),
//! plus a seam-aware variant: near the left border the sample is blended
//! with its horizontally-wrapped counterpart so fields stay continuous
//! where the map wraps around.

use noise::{NoiseFn, Perlin};

pub struct NoiseField {
    octaves: u32,
    noise: Perlin,
}

impl NoiseField {
    pub fn new(seed: u32, octaves: u32) -> Self {
        Self {
            octaves,
            noise: Perlin::new(seed),
        }
    }

    /// Evaluate the octave sum at `(x, y)` in noise-space.
    /// Returns roughly ±2 for 6-8 octaves; callers normalize per-field.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0f64;
        let mut amp = 1.0f64;
        let mut freq = 1.0f64;
        for _ in 0..self.octaves {
            value += amp * self.noise.get([x * freq, y * freq]);
            amp *= 0.5;
            freq *= 2.0;
        }
        value
    }

    /// Sample at grid cell `(col, row)` scaled by `1/freq_div`, blending
    /// across the horizontal seam.
    ///
    /// Within `border` columns of the left edge the value is the weighted
    /// mean of the local sample and the sample taken `width` columns to the
    /// right (the wrapped continuation), weights proportional to the
    /// distance from the edge. The right edge needs no treatment because
    /// the left-edge blend already interpolates toward it.
    pub fn sample_seamless(
        &self,
        col: usize,
        row: usize,
        width: usize,
        border: usize,
        freq_div: f64,
    ) -> f64 {
        let x = col as f64 / freq_div;
        let y = row as f64 / freq_div;
        let n = self.sample(x, y);
        if border == 0 || col > border {
            return n;
        }
        let xw = (col + width) as f64 / freq_div;
        let wrapped = self.sample(xw, y);
        let t = col as f64 / border as f64;
        n * t + wrapped * (1.0 - t)
    }
}
