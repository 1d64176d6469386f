//! Chunk meshing and LOD chains for heightfield terrain.
#![forbid(unsafe_code)]

mod chunk;
mod lod;
mod mesh_build;

pub use chunk::ChunkMeshBuilder;
pub use lod::{LodChain, LodLevel, LodResolutionPlanner, build_lod_chain, build_lod_level, plan_levels};
pub use mesh_build::MeshBuffer;
