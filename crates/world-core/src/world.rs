//! The World: a named multi-layer grid plus generation parameters and the
//! per-stage sub-seed table.

use std::collections::BTreeMap;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::biome::{Biome, HumidityLevel, TemperatureLevel};
use crate::error::{Result, WorldError};
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::position::Position;

// ── Layer names ───────────────────────────────────────────────────────────────

pub mod layers {
    pub const ELEVATION: &str = "elevation";
    pub const PLATES: &str = "plates";
    pub const OCEAN: &str = "ocean";
    pub const SEA_DEPTH: &str = "sea_depth";
    pub const TEMPERATURE: &str = "temperature";
    pub const PRECIPITATION: &str = "precipitation";
    pub const RIVER_MAP: &str = "river_map";
    pub const LAKE_MAP: &str = "lake_map";
    pub const WATERMAP: &str = "watermap";
    pub const IRRIGATION: &str = "irrigation";
    pub const HUMIDITY: &str = "humidity";
    pub const PERMEABILITY: &str = "permeability";
    pub const BIOME: &str = "biome";
    pub const ICECAP: &str = "icecap";
}

// ── Generation step ───────────────────────────────────────────────────────────

/// How far the pipeline runs: bare plates, up to precipitation, or the full
/// stage list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Plates,
    Precipitations,
    Full,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Plates => "plates",
            Step::Precipitations => "precipitations",
            Step::Full => "full",
        }
    }

    pub fn include_precipitations(&self) -> bool {
        !matches!(self, Step::Plates)
    }

    pub fn include_erosion(&self) -> bool {
        matches!(self, Step::Full)
    }

    pub fn include_biome(&self) -> bool {
        matches!(self, Step::Full)
    }
}

impl FromStr for Step {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plates" => Ok(Step::Plates),
            "precipitations" => Ok(Step::Precipitations),
            "full" => Ok(Step::Full),
            other => Err(WorldError::InvalidParameter(format!(
                "unknown generation step '{other}'"
            ))),
        }
    }
}

// ── Parameters and sub-seeds ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub plate_count: u16,
    /// Elevation at and below which border-connected cells flood as ocean.
    pub ocean_level: f64,
    pub step: Step,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            plate_count: 10,
            ocean_level: 1.0,
            step: Step::Full,
        }
    }
}

/// Stage names in sub-seed assignment order. The array below is drawn once;
/// adding a stage means appending here, so existing stages keep their seeds.
const STAGE_NAMES: [&str; 10] = [
    "elevation",
    "temperature",
    "precipitation",
    "erosion",
    "watermap",
    "irrigation",
    "humidity",
    "permeability",
    "biome",
    "icecap",
];

const SUB_SEED_SLOTS: usize = 16;

/// Fixed-size table of per-stage seeds, drawn once from the master seed.
/// Each stage owns one slot; unrelated stages can never perturb each
/// other's random sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSeeds {
    seeds: Vec<u64>,
}

impl SubSeeds {
    pub fn derive(master: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(master);
        let seeds = (0..SUB_SEED_SLOTS).map(|_| rng.gen::<u64>()).collect();
        Self { seeds }
    }

    /// Seed for the named stage. Unknown names are a programming error and
    /// panic rather than silently aliasing another stage's slot.
    pub fn for_stage(&self, stage: &str) -> u64 {
        let slot = STAGE_NAMES
            .iter()
            .position(|&n| n == stage)
            .unwrap_or_else(|| panic!("stage '{stage}' has no sub-seed slot"));
        self.seeds[slot]
    }

    /// A ready-to-use generator for the named stage.
    pub fn rng_for(&self, stage: &str) -> StdRng {
        StdRng::seed_from_u64(self.for_stage(stage))
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    name: String,
    width: usize,
    height: usize,
    seed: u64,
    params: GenerationParams,
    sub_seeds: SubSeeds,
    layers: BTreeMap<String, Layer>,
}

impl World {
    /// Create a world from the raw heightmap-source output: elevation and
    /// plate-index grids. Both must match `width × height`.
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        seed: u64,
        params: GenerationParams,
        elevation: Grid<f64>,
        plates: Grid<u16>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidParameter(format!(
                "world dimensions {width}x{height} must be positive"
            )));
        }
        if params.plate_count == 0 {
            return Err(WorldError::InvalidParameter(
                "plate count must be positive".to_string(),
            ));
        }
        let mut world = Self {
            name: name.into(),
            width,
            height,
            seed,
            params,
            sub_seeds: SubSeeds::derive(seed),
            layers: BTreeMap::new(),
        };
        world.set_layer(layers::ELEVATION, Layer::plain(LayerData::Float(elevation)))?;
        world.set_layer(layers::PLATES, Layer::plain(LayerData::Int(plates)))?;
        Ok(world)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn sub_seeds(&self) -> &SubSeeds {
        &self.sub_seeds
    }

    // ── Layer management ─────────────────────────────────────────────────────

    /// Install (or replace) a layer. Shape is validated against the world.
    pub fn set_layer(&mut self, name: &str, layer: Layer) -> Result<()> {
        let (gw, gh) = (layer.data.width(), layer.data.height());
        if gw != self.width || gh != self.height {
            return Err(WorldError::ShapeMismatch {
                layer: name.to_string(),
                got_width: gw,
                got_height: gh,
                want_width: self.width,
                want_height: self.height,
            });
        }
        self.layers.insert(name.to_string(), layer);
        Ok(())
    }

    /// Replace the float data of an existing layer, keeping its thresholds
    /// and quantiles (erosion re-carves elevation without re-banding it).
    pub fn replace_float_data(&mut self, name: &str, data: Grid<f64>) -> Result<()> {
        if data.width() != self.width || data.height() != self.height {
            return Err(WorldError::ShapeMismatch {
                layer: name.to_string(),
                got_width: data.width(),
                got_height: data.height(),
                want_width: self.width,
                want_height: self.height,
            });
        }
        match self.layers.get_mut(name) {
            Some(layer) => {
                layer.as_float(name)?;
                layer.data = LayerData::Float(data);
                Ok(())
            }
            None => Err(WorldError::InvalidParameter(format!(
                "cannot replace data of missing layer '{name}'"
            ))),
        }
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn require_layer(&self, stage: &'static str, name: &'static str) -> Result<&Layer> {
        self.layers
            .get(name)
            .ok_or(WorldError::MissingLayer { stage, layer: name })
    }

    // ── Typed layer accessors ────────────────────────────────────────────────

    pub fn elevation(&self) -> Result<&Grid<f64>> {
        self.require_layer("query", layers::ELEVATION)?
            .as_float(layers::ELEVATION)
    }

    pub fn ocean(&self) -> Result<&Grid<bool>> {
        self.require_layer("query", layers::OCEAN)?
            .as_bool(layers::OCEAN)
    }

    pub fn float_layer(&self, name: &'static str) -> Result<&Grid<f64>> {
        self.require_layer("query", name)?.as_float(name)
    }

    // ── Cell queries ─────────────────────────────────────────────────────────

    pub fn elevation_at(&self, p: Position) -> Result<f64> {
        Ok(self.elevation()?.at(p))
    }

    pub fn is_ocean(&self, p: Position) -> Result<bool> {
        Ok(self.ocean()?.at(p))
    }

    pub fn is_land(&self, p: Position) -> Result<bool> {
        Ok(!self.ocean()?.at(p))
    }

    /// Elevation band index: 0 sea, 1 plain, 2 hill, 3 mountain.
    fn elevation_band(&self, p: Position) -> Result<usize> {
        let layer = self.require_layer("query", layers::ELEVATION)?;
        let v = layer.as_float(layers::ELEVATION)?.at(p);
        layer.band_index(v).ok_or(WorldError::MissingLayer {
            stage: "query",
            layer: "elevation thresholds",
        })
    }

    pub fn is_hill(&self, p: Position) -> Result<bool> {
        Ok(self.elevation_band(p)? == 2)
    }

    pub fn is_mountain(&self, p: Position) -> Result<bool> {
        Ok(self.elevation_band(p)? == 3)
    }

    pub fn temperature_at(&self, p: Position) -> Result<f64> {
        Ok(self.float_layer(layers::TEMPERATURE)?.at(p))
    }

    pub fn precipitation_at(&self, p: Position) -> Result<f64> {
        Ok(self.float_layer(layers::PRECIPITATION)?.at(p))
    }

    pub fn watermap_at(&self, p: Position) -> Result<f64> {
        Ok(self.float_layer(layers::WATERMAP)?.at(p))
    }

    pub fn humidity_at(&self, p: Position) -> Result<f64> {
        Ok(self.float_layer(layers::HUMIDITY)?.at(p))
    }

    pub fn biome_at(&self, p: Position) -> Result<Biome> {
        Ok(self
            .require_layer("query", layers::BIOME)?
            .as_biome(layers::BIOME)?
            .at(p))
    }

    /// Temperature band of a cell, from the banded temperature layer.
    pub fn temperature_level(&self, p: Position) -> Result<TemperatureLevel> {
        let layer = self.require_layer("query", layers::TEMPERATURE)?;
        let v = layer.as_float(layers::TEMPERATURE)?.at(p);
        let idx = layer.band_index(v).ok_or(WorldError::MissingLayer {
            stage: "query",
            layer: "temperature thresholds",
        })?;
        Ok(TemperatureLevel::ALL[idx.min(TemperatureLevel::ALL.len() - 1)])
    }

    /// Humidity band of a cell, from the quantile table. Quantile labels run
    /// 12 → 87 from driest cutoff to wettest.
    pub fn humidity_level(&self, p: Position) -> Result<HumidityLevel> {
        let layer = self.require_layer("query", layers::HUMIDITY)?;
        let v = layer.as_float(layers::HUMIDITY)?.at(p);
        const LABELS: [&str; 7] = ["12", "25", "37", "50", "62", "75", "87"];
        for (i, label) in LABELS.iter().enumerate() {
            let q = layer.quantile(label).ok_or(WorldError::MissingLayer {
                stage: "query",
                layer: "humidity quantiles",
            })?;
            if v < q {
                return Ok(HumidityLevel::ALL[i]);
            }
        }
        Ok(HumidityLevel::Superhumid)
    }
}
