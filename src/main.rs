#![forbid(unsafe_code)]

mod synth;

use std::error::Error;
use std::path::PathBuf;
use std::thread;

use clap::Parser;
use crossbeam_channel::unbounded;
use tessera_config::{TerrainConfig, load_config_from_path};
use tessera_control::ControlTextureBaker;
use tessera_geom::Vec3;
use tessera_ground::{GroundAdjustmentEngine, GroundSet, HeightfieldGround, TriangleGround};
use tessera_runtime::{CancelFlag, Progress, convert_terrain, convert_terrain_parallel};
use tessera_scatter::{ScatterEngine, ScatterOutcome};

const COLLISION_LAYER: u32 = 0;
const FIELD_LAYER: u32 = 1;

#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Chunk a heightfield into LOD meshes, bake its control texture, scatter detail, and ground props")]
struct Args {
    /// Terrain config (TOML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Heightfield samples per edge
    #[arg(short, long, default_value = "257")]
    resolution: usize,

    /// World width and length
    #[arg(long, default_value = "512.0")]
    world_size: f32,

    /// World height of a normalized sample of 1.0
    #[arg(long, default_value = "64.0")]
    height_scale: f32,

    /// Noise seed for the synthetic heightfield
    #[arg(short, long, default_value = "1337")]
    seed: i32,

    /// Mesh chunks on a worker pool
    #[arg(long)]
    parallel: bool,

    /// Worker threads with --parallel (0 = all cores)
    #[arg(long, default_value = "0")]
    threads: usize,

    /// Blend-map and density-map resolution
    #[arg(long, default_value = "128")]
    map_resolution: usize,

    /// Props to drop onto the terrain
    #[arg(long, default_value = "24")]
    props: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => TerrainConfig::default(),
    };
    let size = Vec3::new(args.world_size, args.height_scale, args.world_size);
    let hf = synth::heightfield(args.resolution, size, args.seed)?;
    log::info!(
        "heightfield {}x{} over {}x{} (height {})",
        args.resolution,
        args.resolution,
        size.x,
        size.z,
        size.y
    );

    let cancel = CancelFlag::new();
    let (tx, rx) = unbounded::<Progress>();
    let listener = thread::Builder::new()
        .name("tessera-progress".into())
        .spawn(move || {
            for ev in rx.iter() {
                match ev {
                    Progress::ChunkDone { cx, cy, done, total } => {
                        log::debug!("chunk ({}, {}) done [{}/{}]", cx, cy, done, total)
                    }
                    other => log::trace!("{:?}", other),
                }
            }
        })?;
    let terrain = if args.parallel {
        convert_terrain_parallel(&hf, &cfg, args.threads, &cancel, Some(&tx))?
    } else {
        convert_terrain(&hf, &cfg, &cancel, Some(&tx))?
    };
    drop(tx);
    if listener.join().is_err() {
        log::warn!("progress listener panicked");
    }
    let levels: Vec<String> = terrain
        .levels
        .iter()
        .map(|l| format!("{}@{:.3}", l.resolution, l.transition_height))
        .collect();
    log::info!(
        "terrain: {} chunks, {} meshes, levels [{}]",
        terrain.len(),
        terrain.mesh_count(),
        levels.join(", ")
    );

    let maps = synth::blend_maps(&hf, args.map_resolution);
    let bake = ControlTextureBaker::from_config(&cfg.control).bake(&maps)?;
    let mut usage = [0usize; 4];
    for y in 0..bake.texture.resolution {
        for x in 0..bake.texture.resolution {
            usage[bake.texture.dominant_layer(x, y)] += 1;
        }
    }
    log::info!(
        "control texture {}x{}: dominant texels sand={} grass={} rock={} snow={} ({} warnings)",
        bake.texture.resolution,
        bake.texture.resolution,
        usage[0],
        usage[1],
        usage[2],
        usage[3],
        bake.warnings.len()
    );

    let prototypes = synth::prototypes(&hf, args.map_resolution)?;
    let mut scatter = ScatterEngine::new(cfg.scatter.clone());
    match scatter.run(&hf, &prototypes, || cancel.is_cancelled())? {
        ScatterOutcome::Completed(report) => {
            for (proto, n) in prototypes.iter().zip(&report.per_prototype) {
                log::info!("scatter `{}`: {} instances", proto.name, n);
            }
            if report.suppress_source {
                log::info!("density sources would be cleared by the host");
            }
        }
        ScatterOutcome::Cancelled { patches_visited } => {
            log::info!("scatter cancelled after {} patches", patches_visited)
        }
    }

    let (mut scene, props) = synth::props(args.props, size, args.seed as u64);
    let ground = GroundSet::new()
        .with(TriangleGround::from_meshes(terrain.collision_meshes(), COLLISION_LAYER))
        .with(HeightfieldGround::new(&hf, Vec3::ZERO, FIELD_LAYER));
    let engine = GroundAdjustmentEngine::from_config(&cfg.ground);
    let report = engine.adjust_batch(&mut scene, &props, &ground, || cancel.is_cancelled());
    log::info!(
        "grounded {} of {} props ({} aligned, {} failed)",
        report.adjusted.len(),
        props.len(),
        report.adjusted.iter().filter(|r| r.aligned).count(),
        report.failed.len()
    );
    for f in &report.failed {
        log::warn!("{}", f);
    }
    Ok(())
}
