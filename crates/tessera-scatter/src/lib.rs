//! Stochastic placement of decoration instances over a heightfield.
#![forbid(unsafe_code)]

mod density;
mod engine;
mod patch;

pub use density::{DensityLayer, Prototype, RenderableRef};
pub use engine::{
    ScatterEngine, ScatterError, ScatterOutcome, ScatterReport, ScatterState, SkipReason,
    SkippedPrototype,
};
pub use patch::{PatchCoord, ScatterInstance, patch_seed};
