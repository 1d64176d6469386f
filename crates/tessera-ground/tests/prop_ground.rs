use std::f32::consts::PI;

use proptest::prelude::*;
use tessera_config::Ground;
use tessera_geom::{Quat, Transform, Vec3, wrap_angle};
use tessera_ground::{GroundAdjustmentEngine, GroundSet, NodeId, Scene, TriangleGround};

fn plane(a: f32, b: f32) -> GroundSet<'static> {
    let p = |x: f32, z: f32| Vec3::new(x, a * x + b * z, z);
    GroundSet::new().with(TriangleGround::from_triangles(
        vec![
            [p(-60.0, -60.0), p(-60.0, 60.0), p(60.0, -60.0)],
            [p(60.0, -60.0), p(-60.0, 60.0), p(60.0, 60.0)],
        ],
        0,
    ))
}

fn rock(scene: &mut Scene, at: Vec3, rotation: Quat) -> NodeId {
    let id = scene.add_root(
        "rock",
        Transform {
            position: at,
            rotation,
            scale: Vec3::ONE,
        },
    );
    scene.set_mesh(
        id,
        vec![
            Vec3::new(-0.5, -0.3, -0.5),
            Vec3::new(0.5, -0.3, -0.5),
            Vec3::new(0.0, -0.4, 0.5),
            Vec3::new(0.0, 0.8, 0.0),
        ],
    );
    id
}

proptest! {
    // Aligning to any normal within the slope limit keeps the heading
    #[test]
    fn alignment_preserves_yaw(
        a in -1.0f32..1.0,
        b in -1.0f32..1.0,
        yaw in -PI..PI,
        tilt_x in -0.5f32..0.5,
        tilt_z in -0.5f32..0.5,
        x in -20.0f32..20.0,
        z in -20.0f32..20.0,
    ) {
        let rotation = Quat::from_rotation_y(yaw)
            * Quat::from_axis_angle(Vec3::X, tilt_x)
            * Quat::from_axis_angle(Vec3::Z, tilt_z);
        let mut scene = Scene::new();
        let id = rock(&mut scene, Vec3::new(x, 120.0, z), rotation);
        let before_yaw = scene.world_transform(id).unwrap().rotation.yaw();
        let engine = GroundAdjustmentEngine::new(Ground {
            align_to_normal: true,
            max_slope_deg: 60.0,
            ..Ground::default()
        });
        let res = engine.adjust(&mut scene, id, &plane(a, b)).unwrap();
        prop_assert!(res.aligned);
        let after = scene.world_transform(id).unwrap().rotation;
        prop_assert!(wrap_angle(after.yaw() - before_yaw).abs() < 1e-3);
        prop_assert!((after.rotate(Vec3::UP) - res.normal).length() < 1e-3);
    }

    // A probe that finds nothing leaves every node's transform as it was
    #[test]
    fn miss_is_a_no_op(
        x in 100.0f32..500.0,
        y in -50.0f32..50.0,
        yaw in -PI..PI,
        lift in any::<bool>(),
        align in any::<bool>(),
    ) {
        let mut scene = Scene::new();
        let id = rock(&mut scene, Vec3::new(x, y, 0.0), Quat::from_rotation_y(yaw));
        let child = scene
            .add_child(id, "moss", Transform::from_position(Vec3::new(0.0, 0.5, 0.0)))
            .unwrap();
        let before: Vec<Transform> = [id, child].iter().map(|n| scene.get(*n).unwrap().local).collect();
        let engine = GroundAdjustmentEngine::new(Ground {
            lift,
            align_to_normal: align,
            ..Ground::default()
        });
        prop_assert!(engine.adjust(&mut scene, id, &plane(0.0, 0.0)).is_err());
        let after: Vec<Transform> = [id, child].iter().map(|n| scene.get(*n).unwrap().local).collect();
        prop_assert_eq!(before, after);
    }

    // The lowest vertex rests exactly `sink_offset` below the contact point
    #[test]
    fn contact_sits_at_sink_depth(
        a in -0.5f32..0.5,
        height in 1.0f32..80.0,
        sink in 0.0f32..2.0,
        yaw in -PI..PI,
    ) {
        let mut scene = Scene::new();
        let id = rock(&mut scene, Vec3::new(3.0, height, -2.0), Quat::from_rotation_y(yaw));
        let engine = GroundAdjustmentEngine::new(Ground { sink_offset: sink, ..Ground::default() });
        let ground = plane(a, 0.0);
        let res = engine.adjust(&mut scene, id, &ground).unwrap();
        let low = scene.lowest_world_vertex(id).unwrap();
        prop_assert!((low - (res.hit + Vec3::DOWN * sink)).length() < 1e-3);
    }
}
