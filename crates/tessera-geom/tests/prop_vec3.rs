use proptest::num::f32::NORMAL;
use proptest::prelude::*;
use proptest::strategy::Strategy;
use tessera_geom::{Aabb, Vec3};

fn approx(a: f32, b: f32, eps: f32) -> bool { (a - b).abs() <= eps }
fn vapprox(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx(a.x, b.x, eps) && approx(a.y, b.y, eps) && approx(a.z, b.z, eps)
}

fn approx_abs_rel(a: f32, b: f32, atol: f32, rtol: f32) -> bool {
    let diff = (a - b).abs();
    let scale = a.abs().max(b.abs());
    diff <= atol + rtol * scale
}

fn bounded_f32() -> impl Strategy<Value = f32> {
    NORMAL.prop_filter("bounded", |v| v.is_finite() && v.abs() <= 1e4)
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (bounded_f32(), bounded_f32(), bounded_f32())
        .prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    // Addition commutativity: a + b == b + a (element-wise)
    #[test]
    fn vec3_add_commutative(a in arb_vec3(), b in arb_vec3()) {
        prop_assert!(vapprox(a + b, b + a, 1e-5));
    }

    // Cross product is orthogonal to both operands
    #[test]
    fn vec3_cross_orthogonal(a in arb_vec3(), b in arb_vec3()) {
        let c = a.cross(b);
        let scale = a.length() * b.length() * c.length().max(1.0);
        prop_assert!(approx_abs_rel(c.dot(a), 0.0, 1e-2, 1e-4 * scale.max(1.0)));
        prop_assert!(approx_abs_rel(c.dot(b), 0.0, 1e-2, 1e-4 * scale.max(1.0)));
    }

    // Planar distance ignores the vertical component and is symmetric
    #[test]
    fn planar_distance_ignores_height(a in arb_vec3(), b in arb_vec3(), dy in bounded_f32()) {
        let lifted = Vec3::new(b.x, b.y + dy, b.z);
        prop_assert!(approx_abs_rel(a.planar_distance(b), a.planar_distance(lifted), 1e-4, 1e-5));
        prop_assert!(approx(a.planar_distance(b), b.planar_distance(a), 1e-3));
    }

    // Every point used to build a box is contained in it
    #[test]
    fn aabb_from_points_contains_all(pts in proptest::collection::vec(arb_vec3(), 1..16)) {
        let b = Aabb::from_points(pts.iter().copied());
        prop_assert!(!b.is_empty());
        for p in pts {
            prop_assert!(b.contains(p));
        }
    }
}
