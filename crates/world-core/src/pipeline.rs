//! The generation pipeline: heightmap source in, finished World out.
//!
//! Stages run in a fixed order and each draws its randomness from its own
//! sub-seed slot, so the same master seed always produces the same world
//! regardless of which stages a given step skips.

use crate::elevation::ElevationPostProcessor;
use crate::error::{Result, WorldError};
use crate::grid::Grid;
use crate::heightmap::HeightmapSource;
use crate::simulations::biome::BiomeSimulation;
use crate::simulations::erosion::ErosionSimulation;
use crate::simulations::humidity::HumiditySimulation;
use crate::simulations::icecap::IcecapSimulation;
use crate::simulations::irrigation::IrrigationSimulation;
use crate::simulations::permeability::PermeabilitySimulation;
use crate::simulations::precipitation::PrecipitationSimulation;
use crate::simulations::temperature::TemperatureSimulation;
use crate::simulations::watermap::WatermapSimulation;
use crate::simulations::{Simulation, StageState};
use crate::world::{GenerationParams, World};

/// Outcome of one pipeline run: the world plus per-stage bookkeeping.
pub struct PipelineReport {
    pub world: World,
    pub stages: Vec<(&'static str, StageState)>,
}

pub struct WorldGenerationPipeline<S: HeightmapSource> {
    source: S,
}

/// Run the given stages in order against a world. Every stage starts
/// `Pending`; a stage becomes `Done` once it has executed, `Skipped` when
/// not applicable. On the first stage error the remaining entries stay
/// `Pending` and the run aborts.
fn run_stage_list(
    world: &mut World,
    stage_list: &[Box<dyn Simulation>],
) -> (Vec<(&'static str, StageState)>, Result<()>) {
    let mut states: Vec<(&'static str, StageState)> = stage_list
        .iter()
        .map(|s| (s.name(), StageState::Pending))
        .collect();
    for (slot, stage) in stage_list.iter().enumerate() {
        if stage.is_applicable(world) {
            let mut rng = world.sub_seeds().rng_for(stage.name());
            if let Err(e) = stage.execute(world, &mut rng) {
                return (
                    states,
                    Err(WorldError::Stage {
                        stage: stage.name(),
                        source: Box::new(e),
                    }),
                );
            }
            states[slot].1 = StageState::Done;
        } else {
            states[slot].1 = StageState::Skipped;
        }
    }
    (states, Ok(()))
}

impl<S: HeightmapSource> WorldGenerationPipeline<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Precipitation consumes temperature (its gamma curve is shaped by
    /// it), so temperature runs first even though neither depends on the
    /// other's randomness.
    fn stages() -> Vec<Box<dyn Simulation>> {
        vec![
            Box::new(ElevationPostProcessor),
            Box::new(TemperatureSimulation),
            Box::new(PrecipitationSimulation),
            Box::new(ErosionSimulation),
            Box::new(WatermapSimulation),
            Box::new(IrrigationSimulation),
            Box::new(HumiditySimulation),
            Box::new(PermeabilitySimulation),
            Box::new(BiomeSimulation),
            Box::new(IcecapSimulation),
        ]
    }

    /// Generate a world: query the heightmap source, then run every
    /// applicable stage. The first stage error aborts the run.
    pub fn generate(
        &self,
        name: impl Into<String>,
        seed: u64,
        width: usize,
        height: usize,
        params: GenerationParams,
    ) -> Result<PipelineReport> {
        let raw = self.source.generate(seed, width, height, params.plate_count)?;
        let elevation = Grid::from_vec(width, height, raw.elevation)?;
        let plates = Grid::from_vec(width, height, raw.plates)?;
        let mut world = World::new(name, width, height, seed, params, elevation, plates)?;

        let (stages, outcome) = run_stage_list(&mut world, &Self::stages());
        outcome?;
        Ok(PipelineReport { world, stages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap::NoiseHeightmapSource;
    use crate::world::{layers, Step};
    use rand::rngs::StdRng;

    fn run(step: Step, seed: u64) -> PipelineReport {
        let params = GenerationParams {
            step,
            ..Default::default()
        };
        WorldGenerationPipeline::new(NoiseHeightmapSource::default())
            .generate("t", seed, 48, 24, params)
            .unwrap()
    }

    #[test]
    fn full_run_installs_every_layer() {
        let report = run(Step::Full, 1);
        for name in [
            layers::ELEVATION,
            layers::PLATES,
            layers::OCEAN,
            layers::SEA_DEPTH,
            layers::TEMPERATURE,
            layers::PRECIPITATION,
            layers::RIVER_MAP,
            layers::LAKE_MAP,
            layers::WATERMAP,
            layers::IRRIGATION,
            layers::HUMIDITY,
            layers::PERMEABILITY,
            layers::BIOME,
            layers::ICECAP,
        ] {
            assert!(report.world.has_layer(name), "missing layer '{name}'");
        }
        assert!(report
            .stages
            .iter()
            .all(|&(_, s)| s == StageState::Done));
    }

    #[test]
    fn plates_step_stops_after_elevation() {
        let report = run(Step::Plates, 1);
        assert!(report.world.has_layer(layers::OCEAN));
        assert!(!report.world.has_layer(layers::TEMPERATURE));
        assert!(!report.world.has_layer(layers::BIOME));
        let skipped = report
            .stages
            .iter()
            .filter(|&&(_, s)| s == StageState::Skipped)
            .count();
        assert_eq!(skipped, 9, "only elevation post-processing runs");
    }

    #[test]
    fn precipitations_step_stops_before_erosion() {
        let report = run(Step::Precipitations, 1);
        assert!(report.world.has_layer(layers::PRECIPITATION));
        assert!(!report.world.has_layer(layers::RIVER_MAP));
        assert!(!report.world.has_layer(layers::HUMIDITY));
    }

    #[test]
    fn same_seed_is_bit_identical() {
        let a = run(Step::Full, 42);
        let b = run(Step::Full, 42);
        let ja = serde_json::to_string(&a.world).unwrap();
        let jb = serde_json::to_string(&b.world).unwrap();
        assert_eq!(ja, jb, "generation must be deterministic per seed");
    }

    #[test]
    fn failed_stage_leaves_the_rest_pending() {
        // Occupies the erosion sub-seed slot and always fails.
        struct FailingStage;
        impl Simulation for FailingStage {
            fn name(&self) -> &'static str {
                "erosion"
            }
            fn is_applicable(&self, _world: &World) -> bool {
                true
            }
            fn execute(&self, _world: &mut World, _rng: &mut StdRng) -> Result<()> {
                Err(WorldError::InvalidParameter("forced failure".to_string()))
            }
        }

        let (width, height, seed) = (16, 8, 3);
        let params = GenerationParams::default();
        let raw = NoiseHeightmapSource::default()
            .generate(seed, width, height, params.plate_count)
            .unwrap();
        let elevation = Grid::from_vec(width, height, raw.elevation).unwrap();
        let plates = Grid::from_vec(width, height, raw.plates).unwrap();
        let mut world = World::new("t", width, height, seed, params, elevation, plates).unwrap();

        let list: Vec<Box<dyn Simulation>> =
            vec![Box::new(FailingStage), Box::new(ElevationPostProcessor)];
        let (states, outcome) = run_stage_list(&mut world, &list);
        assert!(outcome.is_err(), "a failing stage must abort the run");
        assert_eq!(
            states[0].1,
            StageState::Pending,
            "the failed stage never completed"
        );
        assert_eq!(
            states[1].1,
            StageState::Pending,
            "stages after a failure are not reached"
        );
    }

    #[test]
    fn different_seeds_diverge() {
        let a = run(Step::Full, 1);
        let b = run(Step::Full, 2);
        let ea: Vec<f64> = a.world.elevation().unwrap().iter().copied().collect();
        let eb: Vec<f64> = b.world.elevation().unwrap().iter().copied().collect();
        assert_ne!(ea, eb);
    }
}
