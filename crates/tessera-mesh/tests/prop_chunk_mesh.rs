use proptest::prelude::*;
use tessera_config::Sampling;
use tessera_field::{ChunkPlanner, Heightfield, HeightfieldSampler};
use tessera_geom::Vec3;
use tessera_mesh::ChunkMeshBuilder;

fn field(r: usize, sx: f32, sz: f32, seed: u32) -> Heightfield {
    Heightfield::from_fn(r, Vec3::new(sx, 25.0, sz), |x, y| {
        let h = (x as u32).wrapping_mul(0x9E37_79B9) ^ (y as u32).wrapping_mul(0x85EB_CA6B) ^ seed;
        (h % 1000) as f32 / 999.0
    })
    .unwrap()
}

fn setup() -> impl Strategy<Value = (usize, usize, usize, f32, f32, u32)> {
    (3usize..=97)
        .prop_flat_map(|r| (Just(r), 1usize..=(r - 1).min(6), 1usize..=24, 1.0f32..500.0, 1.0f32..500.0, any::<u32>()))
}

proptest! {
    // Shared boundary vertices get identical UVs and world positions from both chunks
    #[test]
    fn uv_continuous_across_x_boundary((r, c, res, sx, sz, seed) in setup()) {
        prop_assume!(c >= 2);
        let hf = field(r, sx, sz, seed);
        let p = ChunkPlanner::new(r, c).unwrap();
        let b = ChunkMeshBuilder::default();
        let left = b.build(&hf, &p.rect(0, 0), res).unwrap();
        let right = b.build(&hf, &p.rect(1, 0), res).unwrap();
        for y in 0..=res {
            let a = left.grid_index(res, y);
            let d = right.grid_index(0, y);
            prop_assert_eq!(left.tex_coord(a), right.tex_coord(d));
            prop_assert_eq!(left.position(a).y, right.position(d).y);
            let wa = left.world_position(a);
            let wd = right.world_position(d);
            prop_assert!((wa.x - wd.x).abs() <= 1e-3 * sx.max(1.0));
        }
    }

    // Same along z, in bilinear mode as well
    #[test]
    fn uv_continuous_across_z_boundary((r, c, res, sx, sz, seed) in setup(), bilinear in any::<bool>()) {
        prop_assume!(c >= 2);
        let hf = field(r, sx, sz, seed);
        let p = ChunkPlanner::new(r, c).unwrap();
        let mode = if bilinear { Sampling::Bilinear } else { Sampling::Nearest };
        let b = ChunkMeshBuilder::new(mode);
        let low = b.build(&hf, &p.rect(0, 0), res).unwrap();
        let high = b.build(&hf, &p.rect(0, 1), res).unwrap();
        for x in 0..=res {
            prop_assert_eq!(low.tex_coord(low.grid_index(x, res)), high.tex_coord(high.grid_index(x, 0)));
        }
    }

    // Index buffer: two triangles per cell, every index in range, UVs in [0,1]
    #[test]
    fn buffers_are_well_formed((r, c, res, sx, sz, seed) in setup()) {
        let hf = field(r, sx, sz, seed);
        let p = ChunkPlanner::new(r, c).unwrap();
        for rect in p.rects() {
            let m = ChunkMeshBuilder::default().build(&hf, &rect, res).unwrap();
            prop_assert_eq!(m.vertex_count(), (res + 1) * (res + 1));
            prop_assert_eq!(m.triangle_count(), res * res * 2);
            prop_assert!(m.idx.iter().all(|&i| (i as usize) < m.vertex_count()));
            for i in 0..m.vertex_count() {
                let (u, v) = m.tex_coord(i);
                prop_assert!((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v));
                prop_assert!(m.position(i).y >= 0.0 && m.position(i).y <= hf.size().y);
                prop_assert!((m.normal(i).length() - 1.0).abs() < 1e-3);
            }
        }
    }
}
