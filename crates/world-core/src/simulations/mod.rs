//! Simulation stages. Each stage is a self-contained "is this applicable /
//! run it" unit operating on the shared World; the pipeline owns ordering
//! and hands every stage a generator built from its own sub-seed.

pub mod biome;
pub mod erosion;
pub mod humidity;
pub mod icecap;
pub mod irrigation;
pub mod permeability;
pub mod precipitation;
pub mod temperature;
pub mod watermap;

use rand::rngs::StdRng;

use crate::error::Result;
use crate::world::World;

/// One generation stage.
///
/// `is_applicable` is the only sanctioned way to skip work: it must return
/// false when a prerequisite layer is missing or the stage already ran.
/// `execute` either completes and installs its layers, or returns an error
/// that aborts the pipeline.
pub trait Simulation {
    /// Stage name; also the sub-seed slot key.
    fn name(&self) -> &'static str;

    fn is_applicable(&self, world: &World) -> bool;

    fn execute(&self, world: &mut World, rng: &mut StdRng) -> Result<()>;
}

/// Orchestrator-side stage bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Done,
    Skipped,
}
