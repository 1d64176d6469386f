//! Scene arena, ground surfaces, and snapping objects onto the ground.
#![forbid(unsafe_code)]

mod adjust;
mod scene;
mod surface;

pub use adjust::{GroundAdjustmentEngine, GroundBatchReport, GroundFailure, GroundProbeResult};
pub use scene::{NodeId, Scene, SceneNode};
pub use surface::{GroundHit, GroundSet, GroundSurface, HeightfieldGround, TriangleGround, layer_bit};
