use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tessera_config::Scatter;
use tessera_field::HeightfieldSampler;
use tessera_geom::{Quat, Vec3};

use crate::density::Prototype;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatchCoord {
    pub px: usize,
    pub py: usize,
}

/// One placed decoration; immutable once a run completes.
#[derive(Clone, Debug, PartialEq)]
pub struct ScatterInstance {
    pub position: Vec3,
    pub yaw_deg: f32,
    /// Tilt about x and z in degrees.
    pub tilt_deg: (f32, f32),
    pub rotation: Quat,
    /// `(width, height, width)`.
    pub scale: Vec3,
    pub prototype: usize,
    pub patch: PatchCoord,
}

/// Seed of the private stream for one (prototype, patch) unit.
pub fn patch_seed(run_seed: u64, prototype: usize, patch: PatchCoord) -> u64 {
    let mut h = run_seed ^ 0x9E37_79B9_7F4A_7C15;
    for v in [prototype as u64, patch.px as u64, patch.py as u64] {
        h ^= v.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h = h.rotate_left(27).wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^= h >> 31;
    }
    h
}

#[inline]
fn sample_between(rng: &mut ChaCha8Rng, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo == hi { lo } else { rng.gen_range(lo..=hi) }
}

/// Places instances for one patch of one prototype.
///
/// Cells are walked row-major and each unit of raw density is one Bernoulli
/// trial; accepted candidates must clear `min_separation` against everything
/// already accepted in this patch, and the walk stops at `max_per_patch`.
pub(crate) fn scatter_patch<S: HeightfieldSampler + ?Sized>(
    sampler: &S,
    proto: &Prototype,
    proto_idx: usize,
    patch: PatchCoord,
    params: &Scatter,
    out: &mut Vec<ScatterInstance>,
) -> usize {
    let density = &proto.density;
    let ps = params.patch_size.max(1) as usize;
    let x0 = patch.px * ps;
    let y0 = patch.py * ps;
    let x1 = (x0 + ps).min(density.width());
    let y1 = (y0 + ps).min(density.height());

    let mut sum = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            sum += u64::from(density.get(x, y));
        }
    }
    let cap = params.max_per_patch as usize;
    let p = params.unit_probability();
    if sum == 0 || cap == 0 || p <= 0.0 {
        return 0;
    }

    let size = sampler.size();
    let cell_w = size.x / density.width() as f32;
    let cell_l = size.z / density.height() as f32;
    let (half_w, half_l) = (cell_w * 0.5, cell_l * 0.5);
    let tilt = params.max_tilt_deg;
    let mut rng = ChaCha8Rng::seed_from_u64(patch_seed(params.seed, proto_idx, patch));
    let mut accepted: Vec<Vec3> = Vec::new();

    'cells: for y in y0..y1 {
        for x in x0..x1 {
            let units = density.get(x, y);
            for _ in 0..units {
                if !rng.gen_bool(p) {
                    continue;
                }
                let cx = (x as f32 + 0.5) * cell_w + rng.gen_range(-half_w..=half_w);
                let cz = (y as f32 + 0.5) * cell_l + rng.gen_range(-half_l..=half_l);
                let pos = Vec3::new(cx, sampler.height_at_world(cx, cz), cz);
                if accepted
                    .iter()
                    .any(|a| a.planar_distance(pos) < params.min_separation)
                {
                    continue;
                }
                let yaw = rng.gen_range(0.0f32..360.0);
                let tx = rng.gen_range(-tilt..=tilt);
                let tz = rng.gen_range(-tilt..=tilt);
                let w = sample_between(&mut rng, proto.min_width, proto.max_width);
                let h = if proto.isotropic() {
                    w
                } else {
                    sample_between(&mut rng, proto.min_height, proto.max_height)
                };
                out.push(ScatterInstance {
                    position: pos,
                    yaw_deg: yaw,
                    tilt_deg: (tx, tz),
                    rotation: Quat::from_euler_deg(yaw, tx, tz),
                    scale: Vec3::new(w, h, w),
                    prototype: proto_idx,
                    patch,
                });
                accepted.push(pos);
                if accepted.len() >= cap {
                    break 'cells;
                }
            }
        }
    }
    accepted.len()
}
