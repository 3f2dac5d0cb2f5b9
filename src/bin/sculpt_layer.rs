//! Sculpt Layer Demo
//!
//! Run with: `cargo run --bin sculpt-layer -- [config.json] [grid_size]`
//!
//! Builds a flat grid terrain, a circular curve mask over its middle and a
//! sculpted copy of the terrain with a raised plateau, then evaluates a
//! sculpt layer twice and prints what moved. The second evaluation reuses
//! the cached region.
//!
//! Set `RUST_LOG=debug` to see cache and region decisions.

use std::path::Path;
use std::process::ExitCode;

use glam::{Vec2, Vec3};
use terrain_tools_engine::geometry::{CircleCurve, MeshQuery, PolyMesh};
use terrain_tools_engine::layer::{Plug, SculptLayerNode};
use terrain_tools_engine::{Result, SculptLayerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ============================================================================
// SCENARIO
// ============================================================================

const DEFAULT_GRID_SIZE: usize = 10;
const MASK_RADIUS: f32 = 3.0;
const PLATEAU_RADIUS: f32 = 2.0;
const PLATEAU_HEIGHT: f32 = 2.0;

/// Terrain copy with every vertex within `radius` (horizontally) of `centre`
/// raised by `height`.
fn raised_plateau(terrain: &PolyMesh, centre: Vec3, radius: f32, height: f32) -> Result<PolyMesh> {
    let centre = Vec2::new(centre.x, centre.z);
    let positions = terrain
        .positions()
        .iter()
        .map(|&p| {
            if Vec2::new(p.x, p.z).distance(centre) <= radius {
                p + Vec3::Y * height
            } else {
                p
            }
        })
        .collect();
    terrain.with_positions(positions)
}

fn run(config: SculptLayerConfig, grid_size: usize) -> Result<()> {
    let half = grid_size as f32 * 0.5;
    let centre = Vec3::new(half, 0.0, half);

    let terrain = PolyMesh::grid(grid_size, grid_size, 1.0, Vec3::ZERO);
    let sculpted = raised_plateau(&terrain, centre, PLATEAU_RADIUS, PLATEAU_HEIGHT)?;
    let mask = CircleCurve::horizontal(centre, MASK_RADIUS);
    info!(
        vertices = terrain.vertex_count(),
        faces = terrain.face_count(),
        "scenario built"
    );

    let mut node = SculptLayerNode::with_config("demo", config);
    let inputs = node.inputs().terrain(&terrain).curve_mask(&mask).sculpted_mesh(&sculpted);

    for pass in 1..=2 {
        let output = node.compute(Plug::OutMesh, &inputs)?;
        let max_lift = output
            .positions
            .iter()
            .zip(terrain.positions())
            .map(|(after, before)| after.y - before.y)
            .fold(0.0_f32, f32::max);

        println!("Pass {pass}:");
        println!("  region vertices: {}", output.region_vertices);
        println!("  moved:           {}", output.stats.moved);
        println!("  missed:          {}", output.stats.missed);
        println!("  max lift:        {max_lift:.3}");
        match output.recomputed {
            Some(reason) => println!("  region:          recomputed ({reason:?})"),
            None => println!("  region:          reused from cache"),
        }
    }

    let positions = node.output().map(|o| o.positions.clone()).unwrap_or_default();
    let deformed = terrain.with_positions(positions)?;
    println!("Output mesh: {} vertices, {} faces", deformed.vertex_count(), deformed.face_count());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, size_arg) = match args.first() {
        Some(first) if first.ends_with(".json") => (Some(first.as_str()), args.get(1)),
        _ => (None, args.first()),
    };

    let config = match config_path {
        Some(path) => match SculptLayerConfig::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                error!("failed to load {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SculptLayerConfig {
            curve_offset: 1.0,
            ..Default::default()
        },
    };

    let grid_size = match size_arg.map(|s| s.parse::<usize>()) {
        Some(Ok(size)) if size > 0 => size,
        Some(_) => {
            error!("grid size must be a positive integer");
            return ExitCode::FAILURE;
        }
        None => DEFAULT_GRID_SIZE,
    };

    match run(config, grid_size) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("sculpt layer failed: {e}");
            ExitCode::FAILURE
        }
    }
}
