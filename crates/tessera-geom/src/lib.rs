//! Minimal geometry types shared by the terrain crates (y-up, right-handed).
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };
    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };
    pub const DOWN: Vec3 = Vec3 {
        x: 0.0,
        y: -1.0,
        z: 0.0,
    };
    pub const X: Vec3 = Vec3 {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };
    pub const Z: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 { self / len } else { self }
    }

    /// Component-wise product.
    #[inline]
    pub fn mul_elem(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    /// Component-wise quotient; zero divisors leave the component unchanged.
    #[inline]
    pub fn div_elem(self, rhs: Vec3) -> Vec3 {
        let d = |a: f32, b: f32| if b != 0.0 { a / b } else { a };
        Vec3::new(d(self.x, rhs.x), d(self.y, rhs.y), d(self.z, rhs.z))
    }

    #[inline]
    pub fn min(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    #[inline]
    pub fn max(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    /// Distance in the horizontal (XZ) plane.
    #[inline]
    pub fn planar_distance(self, rhs: Vec3) -> f32 {
        let dx = self.x - rhs.x;
        let dz = self.z - rhs.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Angle in radians between two non-zero vectors.
    pub fn angle_between(self, rhs: Vec3) -> f32 {
        let denom = self.length() * rhs.length();
        if denom <= 0.0 {
            return 0.0;
        }
        (self.dot(rhs) / denom).clamp(-1.0, 1.0).acos()
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box; `extend` with any point makes it valid.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut b = Aabb::EMPTY;
        for p in points {
            b.extend(p);
        }
        b
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    /// Slab test; returns the entry distance along `dir` when the ray meets the box
    /// within `[0, max_dist]`.
    pub fn ray_entry(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<f32> {
        let mut t0 = 0.0f32;
        let mut t1 = max_dist;
        for (o, d, lo, hi) in [
            (origin.x, dir.x, self.min.x, self.max.x),
            (origin.y, dir.y, self.min.y, self.max.y),
            (origin.z, dir.z, self.min.z, self.max.z),
        ] {
            if d.abs() < 1e-12 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut a, mut b) = ((lo - o) * inv, (hi - o) * inv);
            if a > b {
                core::mem::swap(&mut a, &mut b);
            }
            t0 = t0.max(a);
            t1 = t1.min(b);
            if t0 > t1 {
                return None;
            }
        }
        Some(t0)
    }
}

/// Unit quaternion rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    #[inline]
    pub const fn from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about `axis` (normalized internally).
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Quat {
        let a = axis.normalized();
        let (s, c) = (angle * 0.5).sin_cos();
        Quat::from_xyzw(a.x * s, a.y * s, a.z * s, c)
    }

    #[inline]
    pub fn from_rotation_y(angle: f32) -> Quat {
        Quat::from_axis_angle(Vec3::UP, angle)
    }

    /// Yaw about +Y, then pitch about +X, then roll about +Z, all in degrees.
    pub fn from_euler_deg(yaw: f32, pitch: f32, roll: f32) -> Quat {
        Quat::from_rotation_y(yaw.to_radians())
            * Quat::from_axis_angle(Vec3::X, pitch.to_radians())
            * Quat::from_axis_angle(Vec3::Z, roll.to_radians())
    }

    /// Shortest rotation taking direction `from` onto direction `to`.
    pub fn from_rotation_arc(from: Vec3, to: Vec3) -> Quat {
        let a = from.normalized();
        let b = to.normalized();
        let d = a.dot(b);
        if d >= 1.0 - 1e-6 {
            return Quat::IDENTITY;
        }
        if d <= -1.0 + 1e-6 {
            // 180 degrees: any axis perpendicular to `a` works.
            let mut axis = Vec3::X.cross(a);
            if axis.length() < 1e-3 {
                axis = Vec3::Z.cross(a);
            }
            return Quat::from_axis_angle(axis, core::f32::consts::PI);
        }
        let c = a.cross(b);
        Quat::from_xyzw(c.x, c.y, c.z, 1.0 + d).normalized()
    }

    #[inline]
    pub fn dot(self, rhs: Quat) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    pub fn normalized(self) -> Quat {
        let len = self.dot(self).sqrt();
        if len > 0.0 {
            Quat::from_xyzw(self.x / len, self.y / len, self.z / len, self.w / len)
        } else {
            Quat::IDENTITY
        }
    }

    #[inline]
    pub fn conjugate(self) -> Quat {
        Quat::from_xyzw(-self.x, -self.y, -self.z, self.w)
    }

    #[inline]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Twist component of the swing-twist decomposition about `axis`.
    pub fn twist(self, axis: Vec3) -> Quat {
        let a = axis.normalized();
        let p = a * Vec3::new(self.x, self.y, self.z).dot(a);
        let t = Quat::from_xyzw(p.x, p.y, p.z, self.w);
        if t.dot(t) < 1e-12 {
            // Pure 180 degree swing: twist is undefined, treat as none.
            return Quat::IDENTITY;
        }
        t.normalized()
    }

    /// Heading about world-up in radians, in `(-PI, PI]`.
    pub fn yaw(self) -> f32 {
        let t = self.twist(Vec3::UP);
        wrap_angle(2.0 * t.y.atan2(t.w))
    }

    /// Rotation angle in radians between two orientations, in `[0, PI]`.
    pub fn angle_to(self, rhs: Quat) -> f32 {
        let d = self.normalized().dot(rhs.normalized()).abs().min(1.0);
        2.0 * d.acos()
    }
}

impl Mul for Quat {
    type Output = Quat;
    #[inline]
    fn mul(self, r: Quat) -> Quat {
        Quat::from_xyzw(
            self.w * r.x + self.x * r.w + self.y * r.z - self.z * r.y,
            self.w * r.y - self.x * r.z + self.y * r.w + self.z * r.x,
            self.w * r.z + self.x * r.y - self.y * r.x + self.z * r.w,
            self.w * r.w - self.x * r.x - self.y * r.y - self.z * r.z,
        )
    }
}

/// Wraps radians into `(-PI, PI]`.
#[inline]
pub fn wrap_angle(a: f32) -> f32 {
    use core::f32::consts::{PI, TAU};
    let mut r = a % TAU;
    if r <= -PI {
        r += TAU;
    } else if r > PI {
        r -= TAU;
    }
    r
}

/// Translation, rotation and (non-uniform, shear-free) scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Transform::IDENTITY
        }
    }

    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.position + self.rotation.rotate(p.mul_elem(self.scale))
    }

    /// Maps a world-space direction/offset into this transform's local space.
    #[inline]
    pub fn inverse_transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.conjugate().rotate(v).div_elem(self.scale)
    }

    #[inline]
    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        self.inverse_transform_vector(p - self.position)
    }

    /// Composes `self` (parent) with `child` expressed in the parent's space.
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalized(),
            scale: self.scale.mul_elem(child.scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn rotation_arc_maps_up_onto_target() {
        let n = Vec3::new(0.3, 0.9, -0.2).normalized();
        let q = Quat::from_rotation_arc(Vec3::UP, n);
        assert!(close(q.rotate(Vec3::UP), n));
        assert!(close(Quat::from_rotation_arc(Vec3::UP, Vec3::DOWN).rotate(Vec3::UP), Vec3::DOWN));
    }

    #[test]
    fn yaw_of_pure_heading() {
        let q = Quat::from_rotation_y(1.25);
        assert!((q.yaw() - 1.25).abs() < 1e-5);
        assert!((Quat::IDENTITY.yaw()).abs() < 1e-6);
    }

    #[test]
    fn compose_then_inverse_vector() {
        let parent = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.7),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let world = parent.compose(&child);
        let back = parent.inverse_transform_vector(world.position - parent.position);
        assert!(close(back, child.position));
    }

    #[test]
    fn aabb_ray_entry_from_above() {
        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let t = b.ray_entry(Vec3::new(0.5, 5.0, 0.5), Vec3::DOWN, 10.0);
        assert_eq!(t, Some(4.0));
        assert!(b.ray_entry(Vec3::new(2.0, 5.0, 0.5), Vec3::DOWN, 10.0).is_none());
    }
}
