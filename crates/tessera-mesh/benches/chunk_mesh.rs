use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use tessera_config::Lod;
use tessera_field::{ChunkPlanner, Heightfield};
use tessera_geom::Vec3;
use tessera_mesh::{ChunkMeshBuilder, LodResolutionPlanner, build_lod_chain, plan_levels};

fn make_field(r: usize) -> Heightfield {
    Heightfield::from_fn(r, Vec3::new(1000.0, 200.0, 1000.0), |x, y| {
        let fx = x as f32 * 0.05;
        let fy = y as f32 * 0.07;
        0.5 + 0.25 * fx.sin() * fy.cos()
    })
    .unwrap()
}

fn bench_build_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_chunk_mesh");
    let hf = make_field(513);
    let rect = ChunkPlanner::new(513, 4).unwrap().rect(1, 1);
    let builder = ChunkMeshBuilder::default();
    for res in [32usize, 64, 128] {
        group.bench_function(format!("res_{res}"), |b| {
            b.iter(|| black_box(builder.build(&hf, &rect, res).unwrap()))
        });
    }
    group.finish();
}

fn bench_lod_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_lod_chain");
    group.measurement_time(Duration::from_secs(5));
    let hf = make_field(513);
    let planner = LodResolutionPlanner::new(128, 4, 1.0).unwrap();
    let levels = plan_levels(&planner, &Lod::default());
    let rect = ChunkPlanner::new(513, 4).unwrap().rect(0, 0);
    let builder = ChunkMeshBuilder::default();
    group.bench_function("base_128_x4", |b| {
        b.iter(|| black_box(build_lod_chain(&hf, &rect, &levels, &builder, true).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_build_chunk, bench_lod_chain);
criterion_main!(benches);
