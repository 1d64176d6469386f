//! Heightfield sampling and seam-free chunk planning.
#![forbid(unsafe_code)]

mod error;
mod planner;

pub use error::FieldError;
pub use planner::{ChunkPlanner, ChunkRect};

use tessera_geom::Vec3;

/// Read-only access to a square grid of normalized heights.
///
/// Sample `(x, y)` maps to world `(x, z)`; heights are in `[0, 1]` and scale by
/// `size().y` to world units.
pub trait HeightfieldSampler {
    /// Samples per edge.
    fn resolution(&self) -> usize;

    /// World extent: width (x), vertical scale (y), length (z).
    fn size(&self) -> Vec3;

    /// Raw normalized height at an integer sample index.
    fn height(&self, x: usize, y: usize) -> f32;

    /// Bilinear normalized height at `(u, v)` in `[0, 1]^2` (clamped).
    fn interpolated_height(&self, u: f32, v: f32) -> f32 {
        let last = self.resolution().saturating_sub(1);
        if last == 0 {
            return self.height(0, 0);
        }
        let fx = u.clamp(0.0, 1.0) * last as f32;
        let fy = v.clamp(0.0, 1.0) * last as f32;
        let x0 = (fx.floor() as usize).min(last);
        let y0 = (fy.floor() as usize).min(last);
        let x1 = (x0 + 1).min(last);
        let y1 = (y0 + 1).min(last);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;
        let h00 = self.height(x0, y0);
        let h10 = self.height(x1, y0);
        let h01 = self.height(x0, y1);
        let h11 = self.height(x1, y1);
        let a = h00 + (h10 - h00) * tx;
        let b = h01 + (h11 - h01) * tx;
        a + (b - a) * ty
    }

    /// World-space height at world `(x, z)`.
    fn height_at_world(&self, x: f32, z: f32) -> f32 {
        let size = self.size();
        self.interpolated_height(x / size.x, z / size.z) * size.y
    }

    /// World-space unit normal at an integer sample, from central differences.
    fn sample_normal(&self, x: usize, y: usize) -> Vec3 {
        let last = self.resolution().saturating_sub(1);
        if last == 0 {
            return Vec3::UP;
        }
        let size = self.size();
        let x0 = x.saturating_sub(1);
        let x1 = (x + 1).min(last);
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(last);
        let dx = (x1 - x0) as f32 * size.x / last as f32;
        let dz = (y1 - y0) as f32 * size.z / last as f32;
        let dhdx = (self.height(x1, y) - self.height(x0, y)) * size.y / dx;
        let dhdz = (self.height(x, y1) - self.height(x, y0)) * size.y / dz;
        Vec3::new(-dhdx, 1.0, -dhdz).normalized()
    }

    /// World-space unit normal at world `(x, z)` from the interpolated surface.
    fn normal_at_world(&self, x: f32, z: f32) -> Vec3 {
        let last = self.resolution().saturating_sub(1).max(1) as f32;
        let size = self.size();
        let ex = size.x / last;
        let ez = size.z / last;
        let dhdx = (self.height_at_world(x + ex, z) - self.height_at_world(x - ex, z)) / (2.0 * ex);
        let dhdz = (self.height_at_world(x, z + ez) - self.height_at_world(x, z - ez)) / (2.0 * ez);
        Vec3::new(-dhdx, 1.0, -dhdz).normalized()
    }
}

impl<T: HeightfieldSampler + ?Sized> HeightfieldSampler for &T {
    fn resolution(&self) -> usize {
        (**self).resolution()
    }
    fn size(&self) -> Vec3 {
        (**self).size()
    }
    fn height(&self, x: usize, y: usize) -> f32 {
        (**self).height(x, y)
    }
    fn interpolated_height(&self, u: f32, v: f32) -> f32 {
        (**self).interpolated_height(u, v)
    }
}

/// In-memory heightfield, row-major (`y * resolution + x`).
#[derive(Clone, Debug)]
pub struct Heightfield {
    resolution: usize,
    size: Vec3,
    heights: Vec<f32>,
}

impl Heightfield {
    /// Builds from row-major samples; values are clamped into `[0, 1]`.
    pub fn from_samples(resolution: usize, size: Vec3, heights: Vec<f32>) -> Result<Self, FieldError> {
        if heights.is_empty() {
            return Err(FieldError::EmptyHeightfield);
        }
        if resolution < 2 {
            return Err(FieldError::ResolutionTooSmall(resolution));
        }
        let expect = resolution * resolution;
        if heights.len() != expect {
            return Err(FieldError::SampleCountMismatch {
                expected: expect,
                got: heights.len(),
            });
        }
        if !(size.x > 0.0 && size.z > 0.0) || !size.is_finite() {
            return Err(FieldError::DegenerateSize);
        }
        let heights = heights
            .into_iter()
            .map(|h| if h.is_finite() { h.clamp(0.0, 1.0) } else { 0.0 })
            .collect();
        Ok(Self {
            resolution,
            size,
            heights,
        })
    }

    pub fn from_fn(
        resolution: usize,
        size: Vec3,
        mut f: impl FnMut(usize, usize) -> f32,
    ) -> Result<Self, FieldError> {
        let mut heights = Vec::with_capacity(resolution * resolution);
        for y in 0..resolution {
            for x in 0..resolution {
                heights.push(f(x, y));
            }
        }
        Self::from_samples(resolution, size, heights)
    }

    /// Constant-height field.
    pub fn flat(resolution: usize, size: Vec3, h: f32) -> Result<Self, FieldError> {
        Self::from_fn(resolution, size, |_, _| h)
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.resolution + x
    }

    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.heights
    }
}

impl HeightfieldSampler for Heightfield {
    #[inline]
    fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    fn size(&self) -> Vec3 {
        self.size
    }

    #[inline]
    fn height(&self, x: usize, y: usize) -> f32 {
        let last = self.resolution - 1;
        self.heights[self.idx(x.min(last), y.min(last))]
    }
}

/// Rejects samplers that cannot produce a mesh.
pub fn validate_sampler<S: HeightfieldSampler + ?Sized>(sampler: &S) -> Result<(), FieldError> {
    let r = sampler.resolution();
    if r == 0 {
        return Err(FieldError::EmptyHeightfield);
    }
    if r < 2 {
        return Err(FieldError::ResolutionTooSmall(r));
    }
    let size = sampler.size();
    if !(size.x > 0.0 && size.z > 0.0) || !size.is_finite() {
        return Err(FieldError::DegenerateSize);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Heightfield {
        // Height rises linearly with x: h = x / 4
        Heightfield::from_fn(5, Vec3::new(8.0, 10.0, 8.0), |x, _| x as f32 / 4.0).unwrap()
    }

    #[test]
    fn interpolation_hits_samples_and_midpoints() {
        let hf = ramp();
        assert_eq!(hf.interpolated_height(0.0, 0.0), 0.0);
        assert_eq!(hf.interpolated_height(1.0, 1.0), 1.0);
        assert!((hf.interpolated_height(0.125, 0.5) - 0.125).abs() < 1e-6);
        // Clamped outside [0,1]
        assert_eq!(hf.interpolated_height(2.0, -1.0), 1.0);
    }

    #[test]
    fn world_height_scales_vertically() {
        let hf = ramp();
        assert!((hf.height_at_world(4.0, 3.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn ramp_normal_leans_against_slope() {
        let hf = ramp();
        let n = hf.sample_normal(2, 2);
        // slope: 10 units rise over 8 units run
        let expected = Vec3::new(-1.25, 1.0, 0.0).normalized();
        assert!((n - expected).length() < 1e-5);
        let nw = hf.normal_at_world(4.0, 4.0);
        assert!((nw - expected).length() < 1e-4);
    }

    #[test]
    fn degenerate_inputs_fail() {
        let size = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(
            Heightfield::from_samples(0, size, vec![]).unwrap_err(),
            FieldError::EmptyHeightfield
        );
        assert_eq!(
            Heightfield::from_samples(1, size, vec![0.0]).unwrap_err(),
            FieldError::ResolutionTooSmall(1)
        );
        assert_eq!(
            Heightfield::from_samples(3, size, vec![0.0; 8]).unwrap_err(),
            FieldError::SampleCountMismatch { expected: 9, got: 8 }
        );
        assert_eq!(
            Heightfield::flat(3, Vec3::new(0.0, 1.0, 1.0), 0.0).unwrap_err(),
            FieldError::DegenerateSize
        );
    }

    #[test]
    fn samples_are_clamped() {
        let hf = Heightfield::from_samples(2, Vec3::ONE, vec![-1.0, 0.5, 2.0, f32::NAN]).unwrap();
        assert_eq!(hf.samples(), &[0.0, 0.5, 1.0, 0.0]);
    }
}
