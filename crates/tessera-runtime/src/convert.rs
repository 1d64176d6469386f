use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::Sender;
use hashbrown::HashMap;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tessera_config::TerrainConfig;
use tessera_field::{ChunkPlanner, ChunkRect, FieldError, HeightfieldSampler, validate_sampler};
use tessera_mesh::{
    ChunkMeshBuilder, LodChain, LodLevel, LodResolutionPlanner, MeshBuffer, build_lod_chain,
    build_lod_level, plan_levels,
};

use crate::{CancelFlag, Progress, RuntimeError};

/// Every finished chunk's LOD chain, keyed by `(cx, cy)`.
#[derive(Clone, Debug)]
pub struct TerrainOutput {
    pub chunks: HashMap<(usize, usize), LodChain>,
    pub levels: Vec<LodLevel>,
    /// Chunks per axis.
    pub chunk_count: usize,
    pub cancelled: bool,
}

impl TerrainOutput {
    #[inline]
    pub fn get(&self, cx: usize, cy: usize) -> Option<&LodChain> {
        self.chunks.get(&(cx, cy))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.len() == self.chunk_count * self.chunk_count
    }

    /// Chains in planner order (row by row).
    pub fn ordered(&self) -> Vec<&LodChain> {
        let mut v: Vec<&LodChain> = self.chunks.values().collect();
        v.sort_by_key(|c| (c.chunk.cy, c.chunk.cx));
        v
    }

    pub fn mesh_count(&self) -> usize {
        self.chunks.values().map(|c| c.meshes.len()).sum()
    }

    pub fn collision_meshes(&self) -> impl Iterator<Item = &MeshBuffer> + '_ {
        self.chunks.values().filter_map(LodChain::collision_mesh)
    }
}

struct Plan {
    chunks: ChunkPlanner,
    levels: Vec<LodLevel>,
    builder: ChunkMeshBuilder,
    collision: bool,
}

impl Plan {
    fn new<S: HeightfieldSampler + ?Sized>(sampler: &S, cfg: &TerrainConfig) -> Result<Self, FieldError> {
        validate_sampler(sampler)?;
        let chunks = ChunkPlanner::new(sampler.resolution(), cfg.chunks.count as usize)?;
        let lod = LodResolutionPlanner::from_config(&cfg.chunks, &cfg.lod)?;
        Ok(Self {
            chunks,
            levels: plan_levels(&lod, &cfg.lod),
            builder: ChunkMeshBuilder::from_config(&cfg.chunks),
            collision: cfg.chunks.collision,
        })
    }

    fn output(&self) -> TerrainOutput {
        TerrainOutput {
            chunks: HashMap::new(),
            levels: self.levels.clone(),
            chunk_count: self.chunks.count(),
            cancelled: false,
        }
    }

    #[inline]
    fn total(&self) -> usize {
        self.chunks.count() * self.chunks.count()
    }
}

#[inline]
fn emit(progress: Option<&Sender<Progress>>, event: Progress) {
    if let Some(tx) = progress {
        let _ = tx.send(event);
    }
}

/// Builds every (chunk, LOD) mesh in chunk-major order on the calling thread.
///
/// `cancel` is checked before each unit; a chunk whose chain was interrupted is
/// dropped, chunks already finished are kept.
pub fn convert_terrain<S: HeightfieldSampler + ?Sized>(
    sampler: &S,
    cfg: &TerrainConfig,
    cancel: &CancelFlag,
    progress: Option<&Sender<Progress>>,
) -> Result<TerrainOutput, FieldError> {
    let t0 = Instant::now();
    let plan = Plan::new(sampler, cfg)?;
    let total = plan.total();
    let mut out = plan.output();
    emit(
        progress,
        Progress::Started {
            chunks: total,
            levels: plan.levels.len(),
        },
    );

    'chunks: for rect in plan.chunks.rects() {
        let mut meshes = Vec::with_capacity(plan.levels.len());
        for lvl in &plan.levels {
            if cancel.is_cancelled() {
                out.cancelled = true;
                break 'chunks;
            }
            meshes.push(build_lod_level(sampler, &rect, lvl, &plan.builder, plan.collision)?);
            emit(
                progress,
                Progress::LevelBuilt {
                    cx: rect.cx,
                    cy: rect.cy,
                    level: lvl.level,
                    resolution: lvl.resolution,
                },
            );
        }
        finish_chunk(&mut out, rect, meshes, total, progress);
    }

    finish(&out, t0, progress);
    Ok(out)
}

fn finish_chunk(
    out: &mut TerrainOutput,
    rect: ChunkRect,
    meshes: Vec<MeshBuffer>,
    total: usize,
    progress: Option<&Sender<Progress>>,
) {
    out.chunks.insert(
        (rect.cx, rect.cy),
        LodChain {
            chunk: rect,
            levels: out.levels.clone(),
            meshes,
        },
    );
    emit(
        progress,
        Progress::ChunkDone {
            cx: rect.cx,
            cy: rect.cy,
            done: out.chunks.len(),
            total,
        },
    );
}

fn finish(out: &TerrainOutput, t0: Instant, progress: Option<&Sender<Progress>>) {
    let ms = t0.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
    if out.cancelled {
        log::info!("terrain conversion cancelled with {} chunks finished", out.len());
        emit(progress, Progress::Cancelled { completed: out.len() });
    } else {
        emit(progress, Progress::Finished { chunks: out.len(), ms });
    }
    log::info!(
        target: "perf",
        "ms={} convert_terrain chunks={} meshes={} cancelled={}",
        ms,
        out.len(),
        out.mesh_count(),
        out.cancelled
    );
}

/// Same output as [`convert_terrain`], one chunk per rayon task.
///
/// `threads == 0` uses the available parallelism. Cancellation is checked
/// before each chunk starts; running chunks finish.
pub fn convert_terrain_parallel<S: HeightfieldSampler + Sync + ?Sized>(
    sampler: &S,
    cfg: &TerrainConfig,
    threads: usize,
    cancel: &CancelFlag,
    progress: Option<&Sender<Progress>>,
) -> Result<TerrainOutput, RuntimeError> {
    let t0 = Instant::now();
    let plan = Plan::new(sampler, cfg)?;
    let total = plan.total();
    let workers = if threads == 0 {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
    } else {
        threads
    };
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("tessera-mesh-{i}"))
        .build()?;
    emit(
        progress,
        Progress::Started {
            chunks: total,
            levels: plan.levels.len(),
        },
    );

    let rects: Vec<ChunkRect> = plan.chunks.rects().collect();
    let done = AtomicUsize::new(0);
    let results: Vec<Option<Result<LodChain, FieldError>>> = pool.install(|| {
        rects
            .par_iter()
            .map(|rect| {
                if cancel.is_cancelled() {
                    return None;
                }
                let chain = build_lod_chain(sampler, rect, &plan.levels, &plan.builder, plan.collision);
                if chain.is_ok() {
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    emit(
                        progress,
                        Progress::ChunkDone {
                            cx: rect.cx,
                            cy: rect.cy,
                            done: n,
                            total,
                        },
                    );
                }
                Some(chain)
            })
            .collect()
    });

    let mut out = plan.output();
    for r in results {
        match r {
            Some(chain) => {
                let chain = chain?;
                out.chunks.insert((chain.chunk.cx, chain.chunk.cy), chain);
            }
            None => out.cancelled = true,
        }
    }
    log::debug!("parallel conversion used {} workers", workers);
    finish(&out, t0, progress);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use tessera_field::Heightfield;
    use tessera_geom::Vec3;

    fn hill() -> Heightfield {
        Heightfield::from_fn(33, Vec3::new(64.0, 10.0, 64.0), |x, y| {
            let dx = x as f32 - 16.0;
            let dy = y as f32 - 16.0;
            (1.0 - (dx * dx + dy * dy) / 512.0).max(0.0)
        })
        .unwrap()
    }

    fn cfg() -> TerrainConfig {
        let mut c = TerrainConfig::default();
        c.chunks.count = 2;
        c.chunks.base_resolution = 16;
        c.lod.count = 3;
        c
    }

    /// Cancels as soon as anything reads past column 20.
    struct Tripwire {
        inner: Heightfield,
        flag: CancelFlag,
    }

    impl HeightfieldSampler for Tripwire {
        fn resolution(&self) -> usize {
            self.inner.resolution()
        }
        fn size(&self) -> Vec3 {
            self.inner.size()
        }
        fn height(&self, x: usize, y: usize) -> f32 {
            if x >= 20 {
                self.flag.cancel();
            }
            self.inner.height(x, y)
        }
    }

    #[test]
    fn converts_every_chunk_and_level() {
        let (tx, rx) = unbounded();
        let out = convert_terrain(&hill(), &cfg(), &CancelFlag::new(), Some(&tx)).unwrap();
        assert!(out.is_complete());
        assert_eq!(out.len(), 4);
        assert_eq!(out.mesh_count(), 12);
        let res: Vec<usize> = out.levels.iter().map(|l| l.resolution).collect();
        assert_eq!(res, vec![16, 8, 4]);
        assert_eq!(out.collision_meshes().count(), 4);
        let chain = out.get(1, 1).unwrap();
        assert_eq!(chain.chunk.end_x(), 32);
        assert!(chain.meshes[1..].iter().all(|m| !m.collision));

        drop(tx);
        let events: Vec<Progress> = rx.iter().collect();
        assert_eq!(events.first(), Some(&Progress::Started { chunks: 4, levels: 3 }));
        assert!(matches!(events.last(), Some(Progress::Finished { chunks: 4, .. })));
        let levels = events.iter().filter(|e| matches!(e, Progress::LevelBuilt { .. })).count();
        assert_eq!(levels, 12);
    }

    #[test]
    fn cancel_keeps_finished_chunks_only() {
        let flag = CancelFlag::new();
        let sampler = Tripwire {
            inner: hill(),
            flag: flag.clone(),
        };
        let (tx, rx) = unbounded();
        let out = convert_terrain(&sampler, &cfg(), &flag, Some(&tx)).unwrap();
        assert!(out.cancelled);
        assert!(!out.is_complete());
        // chunk (1, 0) tripped the flag during its first level and was dropped
        assert_eq!(out.len(), 1);
        assert!(out.get(0, 0).is_some());
        assert_eq!(out.get(0, 0).unwrap().meshes.len(), 3);
        drop(tx);
        assert_eq!(rx.iter().last(), Some(Progress::Cancelled { completed: 1 }));
    }

    #[test]
    fn precancelled_run_builds_nothing() {
        let flag = CancelFlag::new();
        flag.cancel();
        let seq = convert_terrain(&hill(), &cfg(), &flag, None).unwrap();
        assert!(seq.cancelled && seq.is_empty());
        let par = convert_terrain_parallel(&hill(), &cfg(), 2, &flag, None).unwrap();
        assert!(par.cancelled && par.is_empty());
        flag.reset();
        assert!(convert_terrain(&hill(), &cfg(), &flag, None).unwrap().is_complete());
    }

    #[test]
    fn parallel_matches_sequential() {
        let hf = hill();
        let seq = convert_terrain(&hf, &cfg(), &CancelFlag::new(), None).unwrap();
        let par = convert_terrain_parallel(&hf, &cfg(), 3, &CancelFlag::new(), None).unwrap();
        assert!(par.is_complete());
        let ordered: Vec<(usize, usize)> = par.ordered().iter().map(|c| (c.chunk.cx, c.chunk.cy)).collect();
        assert_eq!(ordered, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        for (key, a) in &seq.chunks {
            let b = par.get(key.0, key.1).unwrap();
            for (ma, mb) in a.meshes.iter().zip(&b.meshes) {
                assert_eq!(ma.pos, mb.pos);
                assert_eq!(ma.uv, mb.uv);
                assert_eq!(ma.idx, mb.idx);
                assert_eq!(ma.collision, mb.collision);
            }
        }
    }

    #[test]
    fn degenerate_input_fails_whole_call() {
        let mut c = cfg();
        c.chunks.count = 0;
        assert_eq!(
            convert_terrain(&hill(), &c, &CancelFlag::new(), None).unwrap_err(),
            FieldError::ZeroChunkCount
        );
        let mut c = cfg();
        c.chunks.base_resolution = 0;
        assert!(matches!(
            convert_terrain_parallel(&hill(), &c, 1, &CancelFlag::new(), None),
            Err(RuntimeError::Field(FieldError::ZeroResolution))
        ));
    }
}
