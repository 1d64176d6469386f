//! Procedural stand-ins for the host's heightfield, blend maps, prototypes and props.

use std::sync::Arc;

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera_control::BlendMaps;
use tessera_field::{FieldError, Heightfield, HeightfieldSampler};
use tessera_geom::{Quat, Transform, Vec3};
use tessera_ground::{NodeId, Scene};
use tessera_scatter::{DensityLayer, Prototype, RenderableRef, ScatterError};

pub fn heightfield(resolution: usize, size: Vec3, seed: i32) -> Result<Heightfield, FieldError> {
    let mut terrain = FastNoiseLite::with_seed(seed);
    terrain.set_noise_type(Some(NoiseType::OpenSimplex2));
    terrain.set_fractal_type(Some(FractalType::FBm));
    terrain.set_fractal_octaves(Some(5));
    terrain.set_frequency(Some(0.004));
    let step = size.x / resolution.saturating_sub(1).max(1) as f32;
    Heightfield::from_fn(resolution, size, |x, y| {
        let h = terrain.get_noise_2d(x as f32 * step, y as f32 * step);
        ((h + 1.0) * 0.5).clamp(0.0, 1.0)
    })
}

#[inline]
fn smoothstep(e0: f32, e1: f32, x: f32) -> f32 {
    let t = ((x - e0) / (e1 - e0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Sand, grass, rock and snow weights from height and slope.
pub fn blend_maps(hf: &Heightfield, res: usize) -> BlendMaps {
    let size = hf.size();
    let n = res * res;
    let (mut sand, mut grass, mut rock, mut snow) =
        (Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n));
    for y in 0..res {
        for x in 0..res {
            let u = (x as f32 + 0.5) / res as f32;
            let v = (y as f32 + 0.5) / res as f32;
            let h = hf.interpolated_height(u, v);
            let slope = hf.normal_at_world(u * size.x, v * size.z).angle_between(Vec3::UP).to_degrees();
            let r = smoothstep(25.0, 40.0, slope);
            let s = smoothstep(0.7, 0.8, h) * (1.0 - r);
            let d = (1.0 - smoothstep(0.3, 0.36, h)) * (1.0 - r);
            let g = (1.0 - r - s - d).max(0.0);
            sand.push(d);
            grass.push(g);
            rock.push(r);
            snow.push(s);
        }
    }
    BlendMaps::new(res, res)
        .with_layer("sand", sand)
        .with_layer("grass", grass)
        .with_layer("rock", rock)
        .with_layer("snow", snow)
}

/// Grass on gentle mid-height ground, shrubs on the lower slopes.
pub fn prototypes(hf: &Heightfield, res: usize) -> Result<Vec<Prototype>, ScatterError> {
    let size = hf.size();
    let sample = |x: usize, y: usize| {
        let u = (x as f32 + 0.5) / res as f32;
        let v = (y as f32 + 0.5) / res as f32;
        let h = hf.interpolated_height(u, v);
        let slope = hf.normal_at_world(u * size.x, v * size.z).angle_between(Vec3::UP).to_degrees();
        (h, slope)
    };
    let grass = DensityLayer::from_fn(res, res, |x, y| {
        let (h, slope) = sample(x, y);
        if (0.36..0.7).contains(&h) && slope < 25.0 { 800 } else { 0 }
    })?;
    let shrubs = DensityLayer::from_fn(res, res, |x, y| {
        let (h, slope) = sample(x, y);
        if h < 0.55 && slope < 35.0 { 150 } else { 0 }
    })?;
    Ok(vec![
        Prototype::new("grass", grass, Some(RenderableRef("detail/grass_tuft".into()))).with_width(0.6, 1.4),
        Prototype::new("shrub", shrubs, Some(RenderableRef("detail/shrub".into())))
            .with_width(0.8, 1.6)
            .with_height(0.9, 2.2),
    ])
}

fn box_vertices(half: Vec3) -> Arc<[Vec3]> {
    let mut v = Vec::with_capacity(8);
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                v.push(Vec3::new(sx * half.x, sy * half.y, sz * half.z));
            }
        }
    }
    v.into()
}

/// Props hovering above the terrain: crates with one mesh, and trees with a
/// two-level LOD group whose coarse level hangs lower than the detailed one.
pub fn props(count: usize, size: Vec3, seed: u64) -> (Scene, Vec<NodeId>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut scene = Scene::new();
    let mut roots = Vec::with_capacity(count);
    for i in 0..count {
        let pos = Vec3::new(
            rng.gen_range(0.05f32..0.95) * size.x,
            size.y + rng.gen_range(5.0f32..40.0),
            rng.gen_range(0.05f32..0.95) * size.z,
        );
        let local = Transform {
            position: pos,
            rotation: Quat::from_rotation_y(rng.gen_range(0.0f32..360.0).to_radians()),
            scale: Vec3::ONE,
        };
        let root = if i % 3 == 0 {
            let root = scene.add_root(format!("tree_{i}"), local);
            let lod0 = scene.add_child(root, "lod0", Transform::from_position(Vec3::new(0.0, 3.0, 0.0)));
            let lod1 = scene.add_child(root, "lod1", Transform::from_position(Vec3::new(0.0, 2.5, 0.0)));
            if let (Some(lod0), Some(lod1)) = (lod0, lod1) {
                scene.set_mesh(lod0, box_vertices(Vec3::new(0.4, 3.0, 0.4)));
                scene.set_mesh(lod1, box_vertices(Vec3::new(0.5, 3.0, 0.5)));
                scene.set_lod_group(root, vec![vec![lod0], vec![lod1]]);
            }
            root
        } else {
            let root = scene.add_root(format!("crate_{i}"), local);
            scene.set_mesh(root, box_vertices(Vec3::splat(0.5)));
            root
        };
        roots.push(root);
    }
    (scene, roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_field_is_normalized() {
        let hf = heightfield(65, Vec3::new(128.0, 32.0, 128.0), 7).unwrap();
        assert!(hf.samples().iter().all(|h| (0.0..=1.0).contains(h)));
    }

    #[test]
    fn blend_weights_stay_in_unit_range() {
        let hf = heightfield(33, Vec3::new(64.0, 16.0, 64.0), 3).unwrap();
        let maps = blend_maps(&hf, 16);
        assert_eq!(maps.layers.len(), 4);
        for l in &maps.layers {
            assert!(l.weights.iter().all(|w| (0.0..=1.0).contains(w)));
        }
    }

    #[test]
    fn props_are_roots_above_the_field() {
        let (scene, ids) = props(6, Vec3::new(64.0, 16.0, 64.0), 9);
        assert_eq!(ids.len(), 6);
        for id in ids {
            let node = scene.get(id).unwrap();
            assert!(node.parent.is_none());
            assert!(scene.lowest_world_vertex(id).unwrap().y > 16.0);
        }
    }
}
