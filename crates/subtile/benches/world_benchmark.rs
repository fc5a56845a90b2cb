//! # World Benchmark
//!
//! Placement throughput and traversal cost over a populated world.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use subtile::core::{Bounds, Label, WorldConfig};
use subtile::{LineMesh, NullObserver, PlacementRequest, World};

const TILE_COUNT: usize = 2_000;

fn requests(count: usize, seed: u64) -> Vec<PlacementRequest> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let labels = ["stone", "sand", "water", "glass"].map(|name| Label::new(name).unwrap_or_default());

    (0..count)
        .map(|_| {
            let x = rng.gen_range(-16.0f32..16.0);
            let y = rng.gen_range(-16.0f32..16.0);
            let label = labels[rng.gen_range(0..labels.len())];
            PlacementRequest::new(rng.gen_range(0..2), x, y, 0.0).with_label(label)
        })
        .collect()
}

fn populated(requests: &[PlacementRequest]) -> World<NullObserver> {
    let mut world = World::with_observer("bench", WorldConfig::default(), NullObserver)
        .unwrap_or_else(|e| panic!("{e}"));
    for request in requests {
        let _ = world.place(request);
    }
    world
}

// =============================================================================
// PLACEMENT
// =============================================================================

fn bench_place(c: &mut Criterion) {
    let requests = requests(TILE_COUNT, 1);

    c.bench_function("place_2k_tiles", |b| {
        b.iter(|| black_box(populated(&requests).islands().len()));
    });
}

// =============================================================================
// TRAVERSAL
// =============================================================================

fn bench_visit(c: &mut Criterion) {
    let world = populated(&requests(TILE_COUNT, 2));
    let mut mesh = LineMesh::new();

    c.bench_function("visit_full", |b| {
        b.iter(|| {
            mesh.reset();
            let _ = world.visit(&mut mesh);
            black_box(mesh.line_count())
        });
    });

    let region = Bounds::new(0, -4.0, -4.0, 0, 4.0, 4.0);
    c.bench_function("visit_bounded_8x8", |b| {
        b.iter(|| {
            mesh.reset();
            let _ = world.visit_bounded(black_box(&region), &mut mesh);
            black_box(mesh.line_count())
        });
    });
}

// =============================================================================
// PERSISTENCE
// =============================================================================

fn bench_pack(c: &mut Criterion) {
    let world = populated(&requests(TILE_COUNT, 3));

    c.bench_function("pack_world", |b| {
        b.iter(|| black_box(world.pack().map(|frames| frames.len())));
    });
}

criterion_group!(benches, bench_place, bench_visit, bench_pack);
criterion_main!(benches);
