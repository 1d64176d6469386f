use std::fmt;
use std::time::Instant;

use tessera_config::Ground;
use tessera_geom::{Quat, Transform, Vec3};

use crate::scene::{NodeId, Scene};
use crate::surface::GroundSet;

#[derive(Clone, Debug, PartialEq)]
pub enum GroundFailure {
    /// Nothing under the object within reach; the transform was left alone.
    ProbeMiss { node: NodeId, origin: Vec3 },
    UnknownNode(NodeId),
}

impl GroundFailure {
    pub fn node(&self) -> NodeId {
        match self {
            GroundFailure::ProbeMiss { node, .. } | GroundFailure::UnknownNode(node) => *node,
        }
    }
}

impl fmt::Display for GroundFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroundFailure::ProbeMiss { node, origin } => write!(
                f,
                "node {} found no ground below ({:.3}, {:.3}, {:.3})",
                node.0, origin.x, origin.y, origin.z
            ),
            GroundFailure::UnknownNode(node) => write!(f, "node {} is not in the scene", node.0),
        }
    }
}

impl std::error::Error for GroundFailure {}

/// What one probe found and what it did to the object.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundProbeResult {
    pub node: NodeId,
    /// World-space lowest contact vertex (the pivot when there is no mesh).
    pub lowest: Vec3,
    pub hit: Vec3,
    pub normal: Vec3,
    /// Angle between the hit normal and world-up, in degrees.
    pub slope_deg: f32,
    pub translation: Vec3,
    pub aligned: bool,
    pub before: Transform,
    pub after: Transform,
}

#[derive(Clone, Debug, Default)]
pub struct GroundBatchReport {
    pub adjusted: Vec<GroundProbeResult>,
    pub failed: Vec<GroundFailure>,
    /// Objects after the cancel point were not visited.
    pub cancelled: bool,
}

/// Drops scene objects onto a `GroundSet` and optionally tilts them to the slope.
#[derive(Clone, Debug)]
pub struct GroundAdjustmentEngine {
    params: Ground,
}

impl GroundAdjustmentEngine {
    pub fn new(params: Ground) -> Self {
        Self { params }
    }

    pub fn from_config(cfg: &Ground) -> Self {
        Self::new(cfg.clone())
    }

    #[inline]
    pub fn params(&self) -> &Ground {
        &self.params
    }

    /// Computes the adjustment without touching the scene.
    pub fn probe(&self, scene: &Scene, id: NodeId, ground: &GroundSet<'_>) -> Result<GroundProbeResult, GroundFailure> {
        let before = scene
            .world_transform(id)
            .ok_or(GroundFailure::UnknownNode(id))?;
        let lowest = scene.lowest_world_vertex(id).unwrap_or(before.position);
        // lift is applied to the probe only, so a miss leaves the object where it was
        let lift = if self.params.lift {
            self.params.lift_offset.max(0.0)
        } else {
            0.0
        };
        let origin = lowest + Vec3::UP * lift;
        let hit = ground
            .probe(origin, Vec3::DOWN, self.params.max_distance, self.params.layer_mask)
            .ok_or(GroundFailure::ProbeMiss { node: id, origin })?;

        let translation = hit.point + Vec3::DOWN * self.params.sink_offset - lowest;
        let slope_deg = hit.normal.angle_between(Vec3::UP).to_degrees();
        let mut after = before;
        after.position = before.position + translation;
        let aligned = self.params.align_to_normal && slope_deg <= self.params.max_slope_deg;
        if aligned {
            after.rotation = align_keeping_yaw(before.rotation, hit.normal);
        }
        Ok(GroundProbeResult {
            node: id,
            lowest,
            hit: hit.point,
            normal: hit.normal,
            slope_deg,
            translation,
            aligned,
            before,
            after,
        })
    }

    /// Moves the object (and so its whole subtree) onto the ground.
    pub fn adjust(&self, scene: &mut Scene, id: NodeId, ground: &GroundSet<'_>) -> Result<GroundProbeResult, GroundFailure> {
        let res = self.probe(scene, id, ground)?;
        scene.set_world_position(id, res.after.position);
        if res.aligned {
            scene.set_world_rotation(id, res.after.rotation);
        }
        log::debug!(
            "grounded `{}` by ({:.3}, {:.3}, {:.3}) slope={:.1}deg aligned={}",
            scene.get(id).map(|n| n.name.as_str()).unwrap_or("?"),
            res.translation.x,
            res.translation.y,
            res.translation.z,
            res.slope_deg,
            res.aligned
        );
        Ok(res)
    }

    /// Adjusts each object in order, checking `cancel` before every one.
    /// Failures are collected; already adjusted objects stay adjusted on cancel.
    pub fn adjust_batch<C: FnMut() -> bool>(
        &self,
        scene: &mut Scene,
        ids: &[NodeId],
        ground: &GroundSet<'_>,
        mut cancel: C,
    ) -> GroundBatchReport {
        let t0 = Instant::now();
        let mut report = GroundBatchReport::default();
        for &id in ids {
            if cancel() {
                report.cancelled = true;
                log::info!(
                    "ground adjustment cancelled after {} of {} objects",
                    report.adjusted.len() + report.failed.len(),
                    ids.len()
                );
                break;
            }
            match self.adjust(scene, id, ground) {
                Ok(res) => report.adjusted.push(res),
                Err(e) => {
                    log::warn!("{}", e);
                    report.failed.push(e);
                }
            }
        }
        log::info!(
            target: "perf",
            "ms={} ground_batch adjusted={} failed={}",
            t0.elapsed().as_millis(),
            report.adjusted.len(),
            report.failed.len()
        );
        report
    }
}

/// Tilts up onto `normal` while keeping the heading of `rotation`.
pub(crate) fn align_keeping_yaw(rotation: Quat, normal: Vec3) -> Quat {
    let swing = Quat::from_rotation_arc(Vec3::UP, normal);
    (swing * Quat::from_rotation_y(rotation.yaw())).normalized()
}
