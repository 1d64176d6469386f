//! Packs per-layer blend maps into a four-channel control texture.
#![forbid(unsafe_code)]

use std::fmt;

use rayon::prelude::*;
use tessera_config::Control;

/// Channels in one control texel.
pub const CONTROL_CHANNELS: usize = 4;

/// One material layer's weights, row-major at the owning `BlendMaps` size.
#[derive(Clone, Debug)]
pub struct BlendLayer {
    pub name: String,
    pub weights: Vec<f32>,
}

/// Source blend maps; every layer shares one resolution.
#[derive(Clone, Debug)]
pub struct BlendMaps {
    pub width: usize,
    pub height: usize,
    pub layers: Vec<BlendLayer>,
}

impl BlendMaps {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    pub fn with_layer(mut self, name: impl Into<String>, weights: Vec<f32>) -> Self {
        self.layers.push(BlendLayer {
            name: name.into(),
            weights,
        });
        self
    }

    /// Weight of `layer` at source cell `(x, y)`; absent layers read as 0,
    /// except layer 0 of an empty stack which reads as 1.
    #[inline]
    pub fn weight(&self, layer: usize, x: usize, y: usize) -> f32 {
        match self.layers.get(layer) {
            Some(l) => l.weights[y * self.width + x],
            None if layer == 0 && self.layers.is_empty() => 1.0,
            None => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlError {
    ZeroResolution,
    EmptySource,
    LayerSizeMismatch {
        layer: String,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::ZeroResolution => write!(f, "control texture resolution must be at least 1"),
            ControlError::EmptySource => write!(f, "blend maps have zero width or height"),
            ControlError::LayerSizeMismatch {
                layer,
                expected,
                got,
            } => write!(
                f,
                "blend layer `{}` has {} weights, expected {}",
                layer, got, expected
            ),
        }
    }
}

impl std::error::Error for ControlError {}

/// Non-fatal issues found while baking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BakeWarning {
    /// Only the first four layers are packed.
    TooManyLayers { count: usize, ignored: Vec<String> },
}

impl fmt::Display for BakeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BakeWarning::TooManyLayers { count, ignored } => write!(
                f,
                "{} material layers present, control texture holds {}; ignoring {}",
                count,
                CONTROL_CHANNELS,
                ignored.join(", ")
            ),
        }
    }
}

/// Square RGBA weight raster.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlTexture {
    pub resolution: usize,
    pub texels: Vec<[f32; CONTROL_CHANNELS]>,
}

impl ControlTexture {
    #[inline]
    pub fn texel(&self, x: usize, y: usize) -> [f32; CONTROL_CHANNELS] {
        self.texels[y * self.resolution + x]
    }

    /// Channel with the largest weight; ties resolve to the lower index.
    pub fn dominant_layer(&self, x: usize, y: usize) -> usize {
        let t = self.texel(x, y);
        let mut best = 0;
        for c in 1..CONTROL_CHANNELS {
            if t[c] > t[best] {
                best = c;
            }
        }
        best
    }

    /// Row-major RGBA8 bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.texels
            .iter()
            .flat_map(|t| t.map(|w| (w.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct ControlBake {
    pub texture: ControlTexture,
    pub warnings: Vec<BakeWarning>,
}

#[derive(Clone, Copy, Debug)]
pub struct ControlTextureBaker {
    pub resolution: usize,
}

impl ControlTextureBaker {
    pub fn new(resolution: usize) -> Self {
        Self { resolution }
    }

    pub fn from_config(cfg: &Control) -> Self {
        Self::new(cfg.resolution as usize)
    }

    pub fn bake(&self, maps: &BlendMaps) -> Result<ControlBake, ControlError> {
        let res = self.resolution;
        if res == 0 {
            return Err(ControlError::ZeroResolution);
        }
        if maps.width == 0 || maps.height == 0 {
            return Err(ControlError::EmptySource);
        }
        let expected = maps.width * maps.height;
        for l in &maps.layers {
            if l.weights.len() != expected {
                return Err(ControlError::LayerSizeMismatch {
                    layer: l.name.clone(),
                    expected,
                    got: l.weights.len(),
                });
            }
        }

        let mut warnings = Vec::new();
        if maps.layers.len() > CONTROL_CHANNELS {
            let w = BakeWarning::TooManyLayers {
                count: maps.layers.len(),
                ignored: maps.layers[CONTROL_CHANNELS..]
                    .iter()
                    .map(|l| l.name.clone())
                    .collect(),
            };
            log::warn!("{}", w);
            warnings.push(w);
        }

        let mut texels = vec![[0.0f32; CONTROL_CHANNELS]; res * res];
        texels
            .par_chunks_mut(res)
            .enumerate()
            .for_each(|(y, row)| {
                let sy = (y * maps.height / res).min(maps.height - 1);
                for (x, out) in row.iter_mut().enumerate() {
                    let sx = (x * maps.width / res).min(maps.width - 1);
                    *out = bake_texel(maps, sx, sy);
                }
            });

        log::debug!(
            "baked {}x{} control texture from {}x{} blend maps ({} layers)",
            res,
            res,
            maps.width,
            maps.height,
            maps.layers.len().min(CONTROL_CHANNELS)
        );
        Ok(ControlBake {
            texture: ControlTexture {
                resolution: res,
                texels,
            },
            warnings,
        })
    }
}

/// Reads up to four weights from one source cell; all-zero becomes `(1,0,0,0)`.
#[inline]
fn bake_texel(maps: &BlendMaps, sx: usize, sy: usize) -> [f32; CONTROL_CHANNELS] {
    let mut t = [0.0f32; CONTROL_CHANNELS];
    for (c, w) in t.iter_mut().enumerate() {
        *w = maps.weight(c, sx, sy);
    }
    if t.iter().all(|w| *w == 0.0) {
        t[0] = 1.0;
    }
    t
}
