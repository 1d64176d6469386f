use crate::engine::ScatterError;

/// Per-prototype grid of raw density values over the heightfield's world rectangle.
#[derive(Clone, Debug)]
pub struct DensityLayer {
    width: usize,
    height: usize,
    values: Vec<u32>,
}

impl DensityLayer {
    pub fn new(width: usize, height: usize, values: Vec<u32>) -> Result<Self, ScatterError> {
        if width == 0 || height == 0 || values.len() != width * height {
            return Err(ScatterError::DegenerateDensity {
                width,
                height,
                len: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn filled(width: usize, height: usize, value: u32) -> Result<Self, ScatterError> {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> u32,
    ) -> Result<Self, ScatterError> {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self::new(width, height, values)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.values[y * self.width + x]
    }

    /// Zeroes every cell; what a host does when asked to suppress the source.
    pub fn clear(&mut self) {
        self.values.fill(0);
    }

    pub fn total(&self) -> u64 {
        self.values.iter().map(|v| u64::from(*v)).sum()
    }
}

/// Opaque handle to the prototype's mesh/material; never interpreted here.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RenderableRef(pub String);

#[derive(Clone, Debug)]
pub struct Prototype {
    pub name: String,
    pub density: DensityLayer,
    pub min_width: f32,
    pub max_width: f32,
    /// Both height bounds at zero means height follows width.
    pub min_height: f32,
    pub max_height: f32,
    /// `None` when the host could not locate the resource.
    pub renderable: Option<RenderableRef>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, density: DensityLayer, renderable: Option<RenderableRef>) -> Self {
        Self {
            name: name.into(),
            density,
            min_width: 1.0,
            max_width: 1.0,
            min_height: 0.0,
            max_height: 0.0,
            renderable,
        }
    }

    pub fn with_width(mut self, min: f32, max: f32) -> Self {
        self.min_width = min;
        self.max_width = max;
        self
    }

    pub fn with_height(mut self, min: f32, max: f32) -> Self {
        self.min_height = min;
        self.max_height = max;
        self
    }

    /// Both ranges finite, including their spans.
    pub fn bounds_are_finite(&self) -> bool {
        (self.max_width - self.min_width).is_finite()
            && (self.max_height - self.min_height).is_finite()
    }

    #[inline]
    pub fn isotropic(&self) -> bool {
        self.min_height == 0.0 && self.max_height == 0.0
    }
}
