//! Biome stage: applies the life-zone table to every cell. No randomness;
//! the output is a pure function of the banded temperature and humidity
//! layers and the ocean mask.

use rand::rngs::StdRng;

use crate::biome::{classify, Biome};
use crate::error::Result;
use crate::grid::Grid;
use crate::layer::{Layer, LayerData};
use crate::simulations::Simulation;
use crate::world::{layers, World};

pub struct BiomeSimulation;

impl Simulation for BiomeSimulation {
    fn name(&self) -> &'static str {
        "biome"
    }

    fn is_applicable(&self, world: &World) -> bool {
        world.params().step.include_biome()
            && world.has_layer(layers::TEMPERATURE)
            && world.has_layer(layers::HUMIDITY)
            && !world.has_layer(layers::BIOME)
    }

    fn execute(&self, world: &mut World, _rng: &mut StdRng) -> Result<()> {
        let mut biomes = Grid::filled(world.width(), world.height(), Biome::Ocean);
        for p in biomes.positions() {
            if world.is_ocean(p)? {
                continue;
            }
            let t = world.temperature_level(p)?;
            let h = world.humidity_level(p)?;
            biomes.set(p, classify(t, h));
        }
        world.set_layer(layers::BIOME, Layer::plain(LayerData::Biome(biomes)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::world::GenerationParams;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    /// A 2×1 world: ocean on the left, warm humid land on the right.
    fn two_cell_world() -> World {
        let elevation = Grid::filled(2, 1, 2.0f64);
        let plates = Grid::filled(2, 1, 0u16);
        let mut world =
            World::new("b", 2, 1, 5, GenerationParams::default(), elevation, plates).unwrap();

        let mut ocean = Grid::filled(2, 1, false);
        ocean.set(Position::new(0, 0), true);
        world
            .set_layer(layers::OCEAN, Layer::plain(LayerData::Bool(ocean)))
            .unwrap();

        // One flat temperature band per cell: both land in "warm".
        let temperature = Grid::filled(2, 1, 0.5f64);
        world
            .set_layer(
                layers::TEMPERATURE,
                Layer::with_thresholds(
                    layers::TEMPERATURE,
                    LayerData::Float(temperature),
                    vec![
                        ("polar".to_string(), Some(0.1)),
                        ("alpine".to_string(), Some(0.2)),
                        ("boreal".to_string(), Some(0.3)),
                        ("cool".to_string(), Some(0.4)),
                        ("warm".to_string(), Some(0.6)),
                        ("subtropical".to_string(), Some(0.8)),
                        ("tropical".to_string(), None),
                    ],
                )
                .unwrap(),
            )
            .unwrap();

        let humidity = Grid::filled(2, 1, 10.0f64);
        let quantiles: BTreeMap<String, f64> = [
            ("12", 1.0),
            ("25", 2.0),
            ("37", 3.0),
            ("50", 4.0),
            ("62", 5.0),
            ("75", 6.0),
            ("87", 7.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        world
            .set_layer(
                layers::HUMIDITY,
                Layer::with_quantiles(LayerData::Float(humidity), quantiles),
            )
            .unwrap();
        world
    }

    #[test]
    fn ocean_cells_classify_as_ocean() {
        let mut world = two_cell_world();
        BiomeSimulation
            .execute(&mut world, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(world.biome_at(Position::new(0, 0)).unwrap(), Biome::Ocean);
    }

    #[test]
    fn land_cells_follow_the_table() {
        let mut world = two_cell_world();
        BiomeSimulation
            .execute(&mut world, &mut StdRng::seed_from_u64(0))
            .unwrap();
        // Warm band, humidity above every quantile → superhumid.
        assert_eq!(
            world.biome_at(Position::new(0, 1)).unwrap(),
            classify(
                crate::biome::TemperatureLevel::Warm,
                crate::biome::HumidityLevel::Superhumid
            )
        );
    }

    #[test]
    fn runs_once_only() {
        let mut world = two_cell_world();
        let sim = BiomeSimulation;
        assert!(sim.is_applicable(&world));
        sim.execute(&mut world, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(!sim.is_applicable(&world), "a finished stage must not rerun");
    }
}
