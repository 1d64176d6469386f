use tessera_field::ChunkRect;
use tessera_geom::{Aabb, Vec3};

/// Vertex and index data for one (chunk, LOD) pair.
///
/// Positions are local to `origin`; UVs span the whole heightfield so the
/// control texture maps continuously across chunk borders.
#[derive(Clone, Debug)]
pub struct MeshBuffer {
    pub chunk: ChunkRect,
    pub lod: usize,
    /// Cells per edge; the vertex grid is `(resolution + 1)^2`.
    pub resolution: usize,
    pub origin: Vec3,
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
    /// Local-space bounds of `pos`.
    pub bounds: Aabb,
    /// Only ever set on LOD0.
    pub collision: bool,
}

impl MeshBuffer {
    pub(crate) fn with_grid(chunk: ChunkRect, resolution: usize, origin: Vec3) -> Self {
        let verts = (resolution + 1) * (resolution + 1);
        Self {
            chunk,
            lod: 0,
            resolution,
            origin,
            pos: Vec::with_capacity(verts * 3),
            norm: Vec::with_capacity(verts * 3),
            uv: Vec::with_capacity(verts * 2),
            idx: Vec::with_capacity(resolution * resolution * 6),
            bounds: Aabb::EMPTY,
            collision: false,
        }
    }

    #[inline]
    pub(crate) fn push_vertex(&mut self, p: Vec3, n: Vec3, u: f32, v: f32) {
        self.pos.extend_from_slice(&[p.x, p.y, p.z]);
        self.norm.extend_from_slice(&[n.x, n.y, n.z]);
        self.uv.extend_from_slice(&[u, v]);
        self.bounds.extend(p);
    }

    /// Appends the two triangles of one grid cell.
    #[inline]
    pub(crate) fn push_cell(&mut self, tl: u32, bl: u32, tr: u32, br: u32) {
        self.idx.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos[i * 3], self.pos[i * 3 + 1], self.pos[i * 3 + 2])
    }

    #[inline]
    pub fn world_position(&self, i: usize) -> Vec3 {
        self.origin + self.position(i)
    }

    #[inline]
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::new(self.norm[i * 3], self.norm[i * 3 + 1], self.norm[i * 3 + 2])
    }

    #[inline]
    pub fn tex_coord(&self, i: usize) -> (f32, f32) {
        (self.uv[i * 2], self.uv[i * 2 + 1])
    }

    /// Index of grid vertex `(x, y)`.
    #[inline]
    pub fn grid_index(&self, x: usize, y: usize) -> usize {
        y * (self.resolution + 1) + x
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.idx.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// World-space bounds.
    pub fn world_bounds(&self) -> Aabb {
        Aabb::new(self.bounds.min + self.origin, self.bounds.max + self.origin)
    }
}
