//! Terrain conversion driver: chunk and LOD jobs with cooperative cancel.
#![forbid(unsafe_code)]

mod convert;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tessera_field::FieldError;

pub use convert::{TerrainOutput, convert_terrain, convert_terrain_parallel};

/// Shared cancel request, checked between units of work.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Events streamed to a host while a conversion runs.
#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    Started { chunks: usize, levels: usize },
    LevelBuilt { cx: usize, cy: usize, level: usize, resolution: usize },
    ChunkDone { cx: usize, cy: usize, done: usize, total: usize },
    Cancelled { completed: usize },
    Finished { chunks: usize, ms: u64 },
}

#[derive(Debug)]
pub enum RuntimeError {
    Field(FieldError),
    Pool(rayon::ThreadPoolBuildError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Field(e) => write!(f, "terrain input: {}", e),
            RuntimeError::Pool(e) => write!(f, "worker pool: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<FieldError> for RuntimeError {
    fn from(e: FieldError) -> Self {
        RuntimeError::Field(e)
    }
}

impl From<rayon::ThreadPoolBuildError> for RuntimeError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        RuntimeError::Pool(e)
    }
}
