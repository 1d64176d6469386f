//! Typed terrain-conversion settings loaded from TOML.
#![forbid(unsafe_code)]

use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TerrainConfig {
    #[serde(default)]
    pub chunks: Chunks,
    #[serde(default)]
    pub lod: Lod,
    #[serde(default)]
    pub control: Control,
    #[serde(default)]
    pub scatter: Scatter,
    #[serde(default)]
    pub ground: Ground,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Chunks {
    /// Chunks per axis.
    #[serde(default = "default_chunk_count")]
    pub count: u32,
    /// Vertex resolution of LOD0 (cells per chunk edge).
    #[serde(default = "default_base_resolution")]
    pub base_resolution: u32,
    /// Mark LOD0 meshes as collision-capable.
    #[serde(default = "default_collision")]
    pub collision: bool,
    #[serde(default = "default_sampling")]
    pub sampling: Sampling,
}

/// How chunk vertices read the heightfield.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
    /// Floor-and-clamp to the nearest sample.
    #[default]
    Nearest,
    Bilinear,
}

fn default_sampling() -> Sampling {
    Sampling::Nearest
}
fn default_chunk_count() -> u32 {
    4
}
fn default_base_resolution() -> u32 {
    64
}
fn default_collision() -> bool {
    true
}
impl Default for Chunks {
    fn default() -> Self {
        Self {
            count: default_chunk_count(),
            base_resolution: default_base_resolution(),
            collision: default_collision(),
            sampling: default_sampling(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Lod {
    #[serde(default = "default_lod_count")]
    pub count: u32,
    /// Exponent applied to the per-level halving factor.
    #[serde(default = "default_lod_strength")]
    pub strength: f32,
    /// Screen-relative heights at which each level hands over to the next.
    #[serde(default = "default_transition_heights")]
    pub transition_heights: Vec<f32>,
}
fn default_lod_count() -> u32 {
    3
}
fn default_lod_strength() -> f32 {
    1.0
}
fn default_transition_heights() -> Vec<f32> {
    vec![0.5, 0.25, 0.1]
}
impl Default for Lod {
    fn default() -> Self {
        Self {
            count: default_lod_count(),
            strength: default_lod_strength(),
            transition_heights: default_transition_heights(),
        }
    }
}

impl Lod {
    /// Transition height for every level, halving the last configured value
    /// for levels the list does not cover.
    pub fn resolved_transition_heights(&self) -> Vec<f32> {
        let n = self.count as usize;
        let mut out: Vec<f32> = self.transition_heights.iter().copied().take(n).collect();
        let mut last = out.last().copied().unwrap_or(1.0);
        while out.len() < n {
            last *= 0.5;
            out.push(last);
        }
        out
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Control {
    #[serde(default = "default_control_resolution")]
    pub resolution: u32,
}
fn default_control_resolution() -> u32 {
    512
}
impl Default for Control {
    fn default() -> Self {
        Self {
            resolution: default_control_resolution(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Scatter {
    /// Global density; the per-unit acceptance probability is this over 10000.
    #[serde(default = "default_density_factor")]
    pub density_factor: f32,
    #[serde(default = "default_min_separation")]
    pub min_separation: f32,
    #[serde(default = "default_max_per_patch")]
    pub max_per_patch: u32,
    /// Patch edge length in density cells.
    #[serde(default = "default_patch_size")]
    pub patch_size: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_max_tilt_deg")]
    pub max_tilt_deg: f32,
    /// Asks the host to clear the density source after a completed run.
    #[serde(default)]
    pub suppress_source: bool,
}
fn default_density_factor() -> f32 {
    1.0
}
fn default_min_separation() -> f32 {
    0.5
}
fn default_max_per_patch() -> u32 {
    256
}
fn default_patch_size() -> u32 {
    16
}
fn default_max_tilt_deg() -> f32 {
    10.0
}
impl Default for Scatter {
    fn default() -> Self {
        Self {
            density_factor: default_density_factor(),
            min_separation: default_min_separation(),
            max_per_patch: default_max_per_patch(),
            patch_size: default_patch_size(),
            seed: 0,
            max_tilt_deg: default_max_tilt_deg(),
            suppress_source: false,
        }
    }
}

impl Scatter {
    /// Per-unit Bernoulli success probability.
    #[inline]
    pub fn unit_probability(&self) -> f64 {
        (f64::from(self.density_factor) / 10_000.0).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Ground {
    /// Distance pushed below the hit point along world-down.
    #[serde(default)]
    pub sink_offset: f32,
    #[serde(default = "default_max_slope_deg")]
    pub max_slope_deg: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// Start the probe above the lowest vertex.
    #[serde(default = "default_lift")]
    pub lift: bool,
    #[serde(default = "default_lift_offset")]
    pub lift_offset: f32,
    #[serde(default)]
    pub align_to_normal: bool,
    #[serde(default = "default_layer_mask")]
    pub layer_mask: u32,
}
fn default_max_slope_deg() -> f32 {
    45.0
}
fn default_max_distance() -> f32 {
    1000.0
}
fn default_lift() -> bool {
    true
}
fn default_lift_offset() -> f32 {
    10.0
}
fn default_layer_mask() -> u32 {
    u32::MAX
}
impl Default for Ground {
    fn default() -> Self {
        Self {
            sink_offset: 0.0,
            max_slope_deg: default_max_slope_deg(),
            max_distance: default_max_distance(),
            lift: default_lift(),
            lift_offset: default_lift_offset(),
            align_to_normal: false,
            layer_mask: default_layer_mask(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    OutOfRange {
        field: &'static str,
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutOfRange { field, expected } => {
                write!(f, "config field `{}` out of range: expected {}", field, expected)
            }
        }
    }
}

impl Error for ConfigError {}

fn check(ok: bool, field: &'static str, expected: &'static str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, expected })
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(self.chunks.count >= 1, "chunks.count", ">= 1")?;
        check(self.chunks.base_resolution >= 1, "chunks.base_resolution", ">= 1")?;
        check(self.lod.count >= 1, "lod.count", ">= 1")?;
        check(
            self.lod.strength.is_finite() && self.lod.strength > 0.0,
            "lod.strength",
            "> 0",
        )?;
        let heights = &self.lod.transition_heights;
        check(
            heights.iter().all(|h| *h > 0.0 && *h < 1.0),
            "lod.transition_heights",
            "values in (0, 1)",
        )?;
        check(
            heights.windows(2).all(|w| w[1] < w[0]),
            "lod.transition_heights",
            "strictly decreasing",
        )?;
        check(self.control.resolution >= 1, "control.resolution", ">= 1")?;
        check(
            self.scatter.density_factor.is_finite() && self.scatter.density_factor >= 0.0,
            "scatter.density_factor",
            ">= 0",
        )?;
        check(
            self.scatter.min_separation.is_finite() && self.scatter.min_separation >= 0.0,
            "scatter.min_separation",
            ">= 0",
        )?;
        check(self.scatter.patch_size >= 1, "scatter.patch_size", ">= 1")?;
        check(
            (0.0..=90.0).contains(&self.scatter.max_tilt_deg),
            "scatter.max_tilt_deg",
            "[0, 90]",
        )?;
        check(
            (0.0..=90.0).contains(&self.ground.max_slope_deg),
            "ground.max_slope_deg",
            "[0, 90]",
        )?;
        check(
            self.ground.max_distance.is_finite() && self.ground.max_distance > 0.0,
            "ground.max_distance",
            "> 0",
        )?;
        check(
            self.ground.lift_offset.is_finite() && self.ground.lift_offset >= 0.0,
            "ground.lift_offset",
            ">= 0",
        )?;
        check(self.ground.sink_offset.is_finite(), "ground.sink_offset", "finite")?;
        Ok(())
    }
}

pub fn load_config_from_str(s: &str) -> Result<TerrainConfig, Box<dyn Error>> {
    let cfg: TerrainConfig = toml::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    load_config_from_str(&s)
}
