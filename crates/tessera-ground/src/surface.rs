use tessera_field::HeightfieldSampler;
use tessera_geom::{Aabb, Vec3};
use tessera_mesh::MeshBuffer;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    pub point: Vec3,
    /// Unit normal facing back along the probe.
    pub normal: Vec3,
    pub distance: f32,
}

/// Something a probe can land on.
pub trait GroundSurface {
    /// Layer index in `0..32`; matched against a bit mask.
    fn layer(&self) -> u32;

    /// First hit along `dir` from `origin` within `max_dist`.
    fn probe(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<GroundHit>;
}

/// Mask bit for `layer`; layers past 31 match nothing.
#[inline]
pub fn layer_bit(layer: u32) -> u32 {
    1u32.checked_shl(layer).unwrap_or(0)
}

/// Heightfield placed in the world with its sample `(0, 0)` at `origin`.
#[derive(Clone, Debug)]
pub struct HeightfieldGround<S> {
    pub sampler: S,
    pub origin: Vec3,
    pub layer: u32,
}

const MARCH_REFINE_STEPS: usize = 12;

impl<S: HeightfieldSampler> HeightfieldGround<S> {
    pub fn new(sampler: S, origin: Vec3, layer: u32) -> Self {
        Self {
            sampler,
            origin,
            layer,
        }
    }

    /// World height under `(x, z)`; `None` off the field.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let size = self.sampler.size();
        let lx = x - self.origin.x;
        let lz = z - self.origin.z;
        if !(0.0..=size.x).contains(&lx) || !(0.0..=size.z).contains(&lz) {
            return None;
        }
        Some(self.origin.y + self.sampler.height_at_world(lx, lz))
    }

    fn hit_at(&self, p: Vec3, origin: Vec3) -> GroundHit {
        let n = self
            .sampler
            .normal_at_world(p.x - self.origin.x, p.z - self.origin.z);
        GroundHit {
            point: p,
            normal: n,
            distance: (p - origin).length(),
        }
    }

    fn probe_vertical(&self, origin: Vec3, max_dist: f32) -> Option<GroundHit> {
        let h = self.height_at(origin.x, origin.z)?;
        let d = origin.y - h;
        if !(0.0..=max_dist).contains(&d) {
            return None;
        }
        Some(self.hit_at(Vec3::new(origin.x, h, origin.z), origin))
    }

    /// Marches half a cell at a time, then bisects the first crossing.
    fn probe_marched(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<GroundHit> {
        let size = self.sampler.size();
        let cells = self.sampler.resolution().saturating_sub(1).max(1) as f32;
        let step = (size.x.min(size.z) / cells * 0.5).max(1e-3);
        let above = |t: f32| -> Option<bool> {
            let p = origin + dir * t;
            self.height_at(p.x, p.z).map(|h| p.y >= h)
        };
        let mut prev_t = 0.0f32;
        let mut prev_above = above(0.0);
        let mut t = 0.0f32;
        while t < max_dist {
            t = (t + step).min(max_dist);
            let cur = above(t);
            if let (Some(true), Some(false)) = (prev_above, cur) {
                let (mut lo, mut hi) = (prev_t, t);
                for _ in 0..MARCH_REFINE_STEPS {
                    let mid = 0.5 * (lo + hi);
                    if above(mid) == Some(true) {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                let p = origin + dir * hi;
                let h = self.height_at(p.x, p.z)?;
                return Some(self.hit_at(Vec3::new(p.x, h, p.z), origin));
            }
            prev_t = t;
            prev_above = cur;
        }
        None
    }
}

impl<S: HeightfieldSampler> GroundSurface for HeightfieldGround<S> {
    fn layer(&self) -> u32 {
        self.layer
    }

    fn probe(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<GroundHit> {
        let d = dir.normalized();
        if d.length() == 0.0 {
            return None;
        }
        if d.x.abs() < 1e-6 && d.z.abs() < 1e-6 {
            if d.y < 0.0 {
                return self.probe_vertical(origin, max_dist);
            }
            return None;
        }
        self.probe_marched(origin, d, max_dist)
    }
}

/// Triangle soup in world space, typically the LOD0 collision meshes.
#[derive(Clone, Debug)]
pub struct TriangleGround {
    triangles: Vec<[Vec3; 3]>,
    bounds: Aabb,
    pub layer: u32,
}

impl TriangleGround {
    pub fn from_triangles(triangles: Vec<[Vec3; 3]>, layer: u32) -> Self {
        let bounds = Aabb::from_points(triangles.iter().flatten().copied());
        Self {
            triangles,
            bounds,
            layer,
        }
    }

    /// Collects every mesh flagged for collision; other meshes are ignored.
    pub fn from_meshes<'a>(meshes: impl IntoIterator<Item = &'a MeshBuffer>, layer: u32) -> Self {
        let mut triangles = Vec::new();
        for m in meshes.into_iter().filter(|m| m.collision) {
            for [a, b, c] in m.triangles() {
                triangles.push([
                    m.world_position(a as usize),
                    m.world_position(b as usize),
                    m.world_position(c as usize),
                ]);
            }
        }
        Self::from_triangles(triangles, layer)
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// Möller-Trumbore; returns `t` for a two-sided hit.
#[inline]
fn ray_triangle(origin: Vec3, dir: Vec3, tri: &[Vec3; 3]) -> Option<f32> {
    const EPS: f32 = 1e-7;
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    (t >= 0.0).then_some(t)
}

impl GroundSurface for TriangleGround {
    fn layer(&self) -> u32 {
        self.layer
    }

    fn probe(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<GroundHit> {
        let d = dir.normalized();
        if d.length() == 0.0 || self.triangles.is_empty() {
            return None;
        }
        self.bounds.ray_entry(origin, d, max_dist)?;
        let mut best: Option<(f32, &[Vec3; 3])> = None;
        for tri in &self.triangles {
            let Some(t) = ray_triangle(origin, d, tri) else {
                continue;
            };
            if t <= max_dist && best.is_none_or(|(b, _)| t < b) {
                best = Some((t, tri));
            }
        }
        let (t, tri) = best?;
        let mut n = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalized();
        if n.dot(d) > 0.0 {
            n = -n;
        }
        Some(GroundHit {
            point: origin + d * t,
            normal: n,
            distance: t,
        })
    }
}

/// Every surface a probe may land on; the nearest masked-in hit wins.
#[derive(Default)]
pub struct GroundSet<'a> {
    surfaces: Vec<Box<dyn GroundSurface + 'a>>,
}

impl<'a> GroundSet<'a> {
    pub fn new() -> Self {
        Self {
            surfaces: Vec::new(),
        }
    }

    pub fn with(mut self, surface: impl GroundSurface + 'a) -> Self {
        self.push(surface);
        self
    }

    pub fn push(&mut self, surface: impl GroundSurface + 'a) {
        self.surfaces.push(Box::new(surface));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn probe(&self, origin: Vec3, dir: Vec3, max_dist: f32, mask: u32) -> Option<GroundHit> {
        self.surfaces
            .iter()
            .filter(|s| mask & layer_bit(s.layer()) != 0)
            .filter_map(|s| s.probe(origin, dir, max_dist))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
