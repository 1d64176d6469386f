use std::fmt;
use std::time::Instant;

use tessera_config::Scatter;
use tessera_field::{FieldError, HeightfieldSampler, validate_sampler};

use crate::density::Prototype;
use crate::patch::{PatchCoord, ScatterInstance, scatter_patch};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScatterState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScatterError {
    Field(FieldError),
    InvalidParams { field: &'static str },
    DegenerateDensity { width: usize, height: usize, len: usize },
}

impl fmt::Display for ScatterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScatterError::Field(e) => write!(f, "heightfield: {}", e),
            ScatterError::InvalidParams { field } => write!(f, "invalid scatter parameter `{}`", field),
            ScatterError::DegenerateDensity { width, height, len } => write!(
                f,
                "density grid {}x{} cannot hold {} values",
                width, height, len
            ),
        }
    }
}

impl std::error::Error for ScatterError {}

impl From<FieldError> for ScatterError {
    fn from(e: FieldError) -> Self {
        ScatterError::Field(e)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingRenderable,
    InvalidBounds,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingRenderable => write!(f, "renderable resource not found"),
            SkipReason::InvalidBounds => write!(f, "width/height bounds are not finite"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedPrototype {
    pub prototype: usize,
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Clone, Debug, Default)]
pub struct ScatterReport {
    pub instances: Vec<ScatterInstance>,
    /// Accepted instances per prototype index.
    pub per_prototype: Vec<usize>,
    pub skipped: Vec<SkippedPrototype>,
    /// Host should clear the density source; carried through, never acted on here.
    pub suppress_source: bool,
}

#[derive(Clone, Debug)]
pub enum ScatterOutcome {
    Completed(ScatterReport),
    /// Everything placed before cancellation was discarded.
    Cancelled { patches_visited: usize },
}

impl ScatterOutcome {
    pub fn instances(&self) -> &[ScatterInstance] {
        match self {
            ScatterOutcome::Completed(r) => &r.instances,
            ScatterOutcome::Cancelled { .. } => &[],
        }
    }
}

/// Runs scatter passes: prototypes outer, patches inner, cancellation
/// checked before every patch.
#[derive(Clone, Debug)]
pub struct ScatterEngine {
    params: Scatter,
    state: ScatterState,
}

/// Parameters that would break sampling; `TerrainConfig::validate` covers
/// the same ground for loaded configs.
fn check_params(p: &Scatter) -> Result<(), ScatterError> {
    if !(p.density_factor.is_finite() && p.density_factor >= 0.0) {
        return Err(ScatterError::InvalidParams { field: "density_factor" });
    }
    if !(p.min_separation.is_finite() && p.min_separation >= 0.0) {
        return Err(ScatterError::InvalidParams { field: "min_separation" });
    }
    if !(0.0..=90.0).contains(&p.max_tilt_deg) {
        return Err(ScatterError::InvalidParams { field: "max_tilt_deg" });
    }
    Ok(())
}

impl ScatterEngine {
    pub fn new(params: Scatter) -> Self {
        Self {
            params,
            state: ScatterState::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> ScatterState {
        self.state
    }

    #[inline]
    pub fn params(&self) -> &Scatter {
        &self.params
    }

    pub fn run<S, C>(
        &mut self,
        sampler: &S,
        prototypes: &[Prototype],
        mut cancel: C,
    ) -> Result<ScatterOutcome, ScatterError>
    where
        S: HeightfieldSampler + ?Sized,
        C: FnMut() -> bool,
    {
        validate_sampler(sampler)?;
        check_params(&self.params)?;
        self.state = ScatterState::Running;
        let t0 = Instant::now();

        let ps = self.params.patch_size.max(1) as usize;
        let mut report = ScatterReport {
            per_prototype: vec![0; prototypes.len()],
            suppress_source: self.params.suppress_source,
            ..ScatterReport::default()
        };
        let mut patches_visited = 0usize;

        for (pi, proto) in prototypes.iter().enumerate() {
            let skip = if proto.renderable.is_none() {
                Some(SkipReason::MissingRenderable)
            } else if !proto.bounds_are_finite() {
                Some(SkipReason::InvalidBounds)
            } else {
                None
            };
            if let Some(reason) = skip {
                log::warn!("skipping scatter prototype `{}`: {}", proto.name, reason);
                report.skipped.push(SkippedPrototype {
                    prototype: pi,
                    name: proto.name.clone(),
                    reason,
                });
                continue;
            }
            let patches_x = proto.density.width().div_ceil(ps);
            let patches_y = proto.density.height().div_ceil(ps);
            for py in 0..patches_y {
                for px in 0..patches_x {
                    if cancel() {
                        self.state = ScatterState::Cancelled;
                        log::info!(
                            "scatter cancelled after {} patches; discarding {} instances",
                            patches_visited,
                            report.instances.len()
                        );
                        return Ok(ScatterOutcome::Cancelled { patches_visited });
                    }
                    patches_visited += 1;
                    report.per_prototype[pi] += scatter_patch(
                        sampler,
                        proto,
                        pi,
                        PatchCoord { px, py },
                        &self.params,
                        &mut report.instances,
                    );
                }
            }
            log::debug!(
                "prototype `{}` placed {} instances over {}x{} patches",
                proto.name,
                report.per_prototype[pi],
                patches_x,
                patches_y
            );
        }

        self.state = ScatterState::Completed;
        log::info!(
            target: "perf",
            "ms={} scatter instances={} prototypes={} skipped={}",
            t0.elapsed().as_millis(),
            report.instances.len(),
            prototypes.len(),
            report.skipped.len()
        );
        Ok(ScatterOutcome::Completed(report))
    }
}
