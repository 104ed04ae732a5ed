//! world-core: seed-deterministic procedural planet generation.
//!
//! A master seed and a heightmap source go in; a multi-layer `World` comes
//! out: elevation bands, ocean and sea depth, temperature, precipitation,
//! carved rivers and lakes, watermap, irrigation, humidity, permeability,
//! biomes, and sea ice. Every stage draws from its own sub-seed, so worlds
//! are reproducible bit-for-bit per seed.

pub mod biome;
pub mod elevation;
pub mod error;
pub mod grid;
pub mod heightmap;
pub mod layer;
pub mod noisefield;
pub mod pathfind;
pub mod pipeline;
pub mod position;
pub mod serialization;
pub mod simulations;
pub mod threshold;
pub mod world;

pub use biome::{classify, Biome, HumidityLevel, TemperatureLevel};
pub use error::{Result, WorldError};
pub use grid::Grid;
pub use heightmap::{HeightmapOutput, HeightmapSource, NoiseHeightmapSource};
pub use layer::{Layer, LayerData};
pub use pipeline::{PipelineReport, WorldGenerationPipeline};
pub use position::Position;
pub use world::{layers, GenerationParams, Step, SubSeeds, World};
