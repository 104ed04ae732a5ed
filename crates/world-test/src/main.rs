/// Offline world-generation harness: run the full pipeline for a seed,
/// print per-layer statistics, and optionally save the result (binary via
/// the versioned save format, or JSON).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use world_core::{
    layers, serialization, GenerationParams, LayerData, NoiseHeightmapSource, Step, World,
    WorldGenerationPipeline,
};

#[derive(Parser, Debug)]
#[command(name = "world-test", about = "World generation harness")]
struct Args {
    /// Master seed; the same seed always reproduces the same world.
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// World name.
    #[arg(short, long, default_value = "world")]
    name: String,

    #[arg(long, default_value_t = 128)]
    width: usize,

    #[arg(long, default_value_t = 64)]
    height: usize,

    /// How far to generate: plates, precipitations, or full.
    #[arg(long, default_value = "full")]
    step: String,

    #[arg(long, default_value_t = 10)]
    plates: u16,

    #[arg(long, default_value_t = 1.0)]
    ocean_level: f64,

    /// Write the world to this path (binary save format).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a JSON export to this path.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Load a previously saved world instead of generating one.
    #[arg(long, conflicts_with = "output")]
    load: Option<PathBuf>,
}

fn layer_summary(world: &World, name: &str) -> String {
    let Some(layer) = world.layer(name) else {
        return format!("  {name:<14} (absent)");
    };
    match &layer.data {
        LayerData::Float(g) => {
            let n = g.as_slice().len().max(1) as f64;
            let mean: f64 = g.iter().sum::<f64>() / n;
            format!(
                "  {name:<14} float  min {:>10.4}  max {:>10.4}  mean {:>10.4}",
                g.min_value(),
                g.max_value(),
                mean
            )
        }
        LayerData::Bool(g) => {
            let set = g.iter().filter(|&&b| b).count();
            format!("  {name:<14} bool   {set} of {} set", g.as_slice().len())
        }
        LayerData::Int(g) => {
            let max = g.iter().copied().max().unwrap_or(0);
            format!("  {name:<14} int    max index {max}")
        }
        LayerData::Biome(g) => {
            let distinct: std::collections::BTreeSet<&str> =
                g.iter().map(|b| b.name()).collect();
            format!("  {name:<14} biome  {} distinct", distinct.len())
        }
    }
}

fn print_world(world: &World) {
    println!(
        "world '{}': {}x{}, seed {}",
        world.name(),
        world.width(),
        world.height(),
        world.seed()
    );
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
        println!("{}", layer_summary(world, name));
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let world = if let Some(path) = &args.load {
        serialization::load_world(path)
            .with_context(|| format!("loading world from {}", path.display()))?
    } else {
        let step: Step = args.step.parse()?;
        let params = GenerationParams {
            plate_count: args.plates,
            ocean_level: args.ocean_level,
            step,
        };
        let report = WorldGenerationPipeline::new(NoiseHeightmapSource::default())
            .generate(&args.name, args.seed, args.width, args.height, params)
            .context("world generation failed")?;
        for (stage, state) in &report.stages {
            eprintln!("stage {stage:<14} {state:?}");
        }
        report.world
    };

    print_world(&world);

    if let Some(path) = &args.output {
        serialization::save_world(&world, path)
            .with_context(|| format!("saving world to {}", path.display()))?;
        println!("saved to {}", path.display());
    }
    if let Some(path) = &args.json {
        let json = serialization::to_json(&world)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("exported JSON to {}", path.display());
    }
    Ok(())
}
