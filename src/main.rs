use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gravsim::models::scenarios::SCENARIO_STAR_SYSTEM;
use gravsim::{Engine, SimConfig, SimMode};
use log::info;
use nalgebra::Vector3;

/// Headless run of a built-in scenario.
#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long, default_value = SCENARIO_STAR_SYSTEM)]
    scenario: String,
    /// Number of frames to advance.
    #[arg(short = 'n', long, default_value_t = 600)]
    steps: u64,
    /// JSON file with SimConfig overrides.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Spawn this many random bodies before running.
    #[arg(long, default_value_t = 0)]
    spawn: usize,
    #[arg(long)]
    planar: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_ref())?;
    if args.planar {
        config.mode = SimMode::Planar;
    }
    let mut engine = Engine::new_builtin(&args.scenario, config)?;

    for k in 0..args.spawn {
        // spread spawn points so no two land on the same spot
        let angle = k as f64 * 2.399_963;
        let r = 60.0 + 15.0 * k as f64;
        let index = engine.spawn_at(Vector3::new(r * angle.cos(), r * angle.sin(), 0.0))?;
        info!("spawned body {}", index);
    }

    for _ in 0..args.steps {
        engine.tick()?;
    }

    let sim = engine.simulator();
    println!("t = {:.3}, frames = {}", sim.time(), sim.frame());
    println!("energy = {:.6e}", sim.total_energy());
    for (i, s) in sim.state_matrix().iter().enumerate() {
        println!("body {:>2}: [x,y,z,vx,vy,vz] = {:?}", i, s);
    }
    Ok(())
}
