use tessera_config::{Chunks, Sampling};
use tessera_field::{ChunkRect, FieldError, HeightfieldSampler, validate_sampler};
use tessera_geom::Vec3;

use crate::mesh_build::MeshBuffer;

/// Resamples one chunk of a heightfield into a regular vertex grid.
///
/// Holds no state between calls; the same builder can mesh any chunk at any
/// resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkMeshBuilder {
    pub sampling: Sampling,
}

impl ChunkMeshBuilder {
    pub fn new(sampling: Sampling) -> Self {
        Self { sampling }
    }

    pub fn from_config(cfg: &Chunks) -> Self {
        Self::new(cfg.sampling)
    }

    /// Builds a `(res + 1) x (res + 1)` vertex grid over `rect`.
    pub fn build<S: HeightfieldSampler + ?Sized>(
        &self,
        sampler: &S,
        rect: &ChunkRect,
        res: usize,
    ) -> Result<MeshBuffer, FieldError> {
        validate_sampler(sampler)?;
        if res == 0 {
            return Err(FieldError::ZeroResolution);
        }
        let r = sampler.resolution();
        let last = r - 1;
        let lastf = last as f32;
        let size = sampler.size();
        let origin = rect.world_origin(r, size);
        let (chunk_w, chunk_l) = rect.world_extent(r, size);
        let step_x = chunk_w / res as f32;
        let step_z = chunk_l / res as f32;

        let mut mesh = MeshBuffer::with_grid(*rect, res, origin);
        for y in 0..=res {
            let ty = y as f32 / res as f32;
            let sy = rect.start_y as f32 + ty * rect.height as f32;
            let iy = (sy.floor() as usize).min(last);
            let world_z = sy / lastf * size.z;
            for x in 0..=res {
                let tx = x as f32 / res as f32;
                let sx = rect.start_x as f32 + tx * rect.width as f32;
                let ix = (sx.floor() as usize).min(last);
                let world_x = sx / lastf * size.x;
                let (h, n) = match self.sampling {
                    Sampling::Nearest => (sampler.height(ix, iy), sampler.sample_normal(ix, iy)),
                    Sampling::Bilinear => (
                        sampler.interpolated_height(sx / lastf, sy / lastf),
                        sampler.normal_at_world(world_x, world_z),
                    ),
                };
                let p = Vec3::new(x as f32 * step_x, h * size.y, y as f32 * step_z);
                // UVs come from the shared sample coordinate, not the chunk-local one.
                mesh.push_vertex(p, n, world_x / size.x, world_z / size.z);
            }
        }

        let stride = (res + 1) as u32;
        for y in 0..res as u32 {
            for x in 0..res as u32 {
                let tl = y * stride + x;
                let bl = tl + stride;
                mesh.push_cell(tl, bl, tl + 1, bl + 1);
            }
        }
        Ok(mesh)
    }
}
