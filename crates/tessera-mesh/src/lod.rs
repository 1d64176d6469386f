use std::time::Instant;

use tessera_config::{Chunks, Lod};
use tessera_field::{ChunkRect, FieldError, HeightfieldSampler};

use crate::chunk::ChunkMeshBuilder;
use crate::mesh_build::MeshBuffer;

const MIN_LOD_RESOLUTION: usize = 4;

/// Per-level vertex resolutions for a LOD chain.
#[derive(Clone, Copy, Debug)]
pub struct LodResolutionPlanner {
    base: usize,
    count: usize,
    strength: f32,
}

impl LodResolutionPlanner {
    pub fn new(base: usize, count: usize, strength: f32) -> Result<Self, FieldError> {
        if base == 0 {
            return Err(FieldError::ZeroResolution);
        }
        Ok(Self {
            base,
            count: count.max(1),
            strength,
        })
    }

    pub fn from_config(chunks: &Chunks, lod: &Lod) -> Result<Self, FieldError> {
        Self::new(chunks.base_resolution as usize, lod.count as usize, lod.strength)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Resolution of `level`; level 0 is the base resolution untouched.
    ///
    /// Deeper levels divide the base by `(2^level)^strength`, round, floor at 4
    /// and bump odd results to even. Each level is capped by the previous one,
    /// rounded down to even; only bases below 4 can leave an odd level.
    pub fn resolution(&self, level: usize) -> usize {
        let mut prev = self.base;
        for k in 1..=level {
            prev = self.scaled(k).min(even_cap(prev));
        }
        prev
    }

    fn scaled(&self, level: usize) -> usize {
        let factor = 2f64.powi(level as i32).powf(f64::from(self.strength));
        let mut res = ((self.base as f64 / factor).round() as usize).max(MIN_LOD_RESOLUTION);
        if res % 2 == 1 {
            res += 1;
        }
        res
    }

    pub fn resolutions(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.count);
        let mut prev = self.base;
        out.push(prev);
        for k in 1..self.count {
            prev = self.scaled(k).min(even_cap(prev));
            out.push(prev);
        }
        out
    }
}

/// Largest even value not above `prev`, unless that drops below the floor.
#[inline]
fn even_cap(prev: usize) -> usize {
    let even = prev - prev % 2;
    if even >= MIN_LOD_RESOLUTION { even } else { prev }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodLevel {
    pub level: usize,
    pub resolution: usize,
    /// Screen-relative height below which the next level takes over.
    pub transition_height: f32,
}

/// Pairs each planned resolution with its transition height.
pub fn plan_levels(planner: &LodResolutionPlanner, lod: &Lod) -> Vec<LodLevel> {
    let heights = Lod {
        count: planner.count() as u32,
        ..lod.clone()
    }
    .resolved_transition_heights();
    planner
        .resolutions()
        .into_iter()
        .zip(heights)
        .enumerate()
        .map(|(level, (resolution, transition_height))| LodLevel {
            level,
            resolution,
            transition_height,
        })
        .collect()
}

/// Every LOD mesh of one chunk, highest detail first.
#[derive(Clone, Debug)]
pub struct LodChain {
    pub chunk: ChunkRect,
    pub levels: Vec<LodLevel>,
    pub meshes: Vec<MeshBuffer>,
}

impl LodChain {
    /// The LOD0 mesh when it was built as a collision shape.
    pub fn collision_mesh(&self) -> Option<&MeshBuffer> {
        self.meshes.first().filter(|m| m.collision)
    }
}

/// Meshes one (chunk, level) unit; only LOD0 may carry the collision flag.
pub fn build_lod_level<S: HeightfieldSampler + ?Sized>(
    sampler: &S,
    rect: &ChunkRect,
    level: &LodLevel,
    builder: &ChunkMeshBuilder,
    collision: bool,
) -> Result<MeshBuffer, FieldError> {
    let mut mesh = builder.build(sampler, rect, level.resolution)?;
    mesh.lod = level.level;
    mesh.collision = collision && level.level == 0;
    Ok(mesh)
}

/// Meshes one chunk at every planned level.
pub fn build_lod_chain<S: HeightfieldSampler + ?Sized>(
    sampler: &S,
    rect: &ChunkRect,
    levels: &[LodLevel],
    builder: &ChunkMeshBuilder,
    collision: bool,
) -> Result<LodChain, FieldError> {
    let t0 = Instant::now();
    let mut meshes = Vec::with_capacity(levels.len());
    for lvl in levels {
        meshes.push(build_lod_level(sampler, rect, lvl, builder, collision)?);
    }
    log::debug!(
        target: "perf",
        "ms={} lod_chain chunk=({}, {}) levels={}",
        t0.elapsed().as_millis(),
        rect.cx,
        rect.cy,
        levels.len()
    );
    Ok(LodChain {
        chunk: *rect,
        levels: levels.to_vec(),
        meshes,
    })
}
