//! # Subtile Demo
//!
//! Builds a small world, walks a region of it into a line mesh and
//! round-trips it through frames.
//!
//! Usage: `subtile_demo [world.toml]`

use subtile::core::{Bounds, WorldConfig};
use subtile::{LineMesh, PlacementRequest, World};

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         SUBTILE WORLD DEMO                                       ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    println!("Error: Could not read {}: {}", path, e);
                    return;
                }
            };
            match WorldConfig::from_toml_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    println!("Error: {}", e);
                    return;
                }
            }
        }
        None => WorldConfig::default(),
    };

    let mut world = match World::with_config("universe", config) {
        Ok(world) => world,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    if let Err(e) = world.place(&PlacementRequest::new(0, 2.0, -1.0, 0.0)) {
        println!("Error: Placement failed: {}", e);
        return;
    }

    let mut mesh = LineMesh::new();
    let region = Bounds::new(0, -2.0, -2.0, 0, 2.0, 2.0);
    if let Err(e) = world.visit_bounded(&region, &mut mesh) {
        println!("Error: Traversal failed: {}", e);
        return;
    }

    println!("World:     {}", world.guid());
    println!("Islands:   {}", world.islands().len());
    println!("Materials: {}", world.materials().live_count());
    println!("Mesh:      {} vertices, {} lines", mesh.vertices().len(), mesh.line_count());

    let frames = match world.pack() {
        Ok(frames) => frames,
        Err(e) => {
            println!("Error: Pack failed: {}", e);
            return;
        }
    };
    let bytes: usize = frames.iter().map(|frame| frame.len()).sum();
    println!("Packed:    {} frames, {} bytes", frames.len(), bytes);
}
