use tessera_geom::Vec3;

use crate::FieldError;

#[inline]
fn last_index(resolution: usize) -> f32 {
    resolution.saturating_sub(1).max(1) as f32
}

/// Sample-space rectangle of one chunk; vertices span `start..=start + width`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkRect {
    pub cx: usize,
    pub cy: usize,
    pub start_x: usize,
    pub start_y: usize,
    pub width: usize,
    pub height: usize,
}

impl ChunkRect {
    #[inline]
    pub fn end_x(&self) -> usize {
        self.start_x + self.width
    }

    #[inline]
    pub fn end_y(&self) -> usize {
        self.start_y + self.height
    }

    /// World position of the chunk's first sample (y is always 0).
    pub fn world_origin(&self, resolution: usize, size: Vec3) -> Vec3 {
        let last = last_index(resolution);
        Vec3::new(
            self.start_x as f32 / last * size.x,
            0.0,
            self.start_y as f32 / last * size.z,
        )
    }

    /// World extent of the chunk in x and z.
    pub fn world_extent(&self, resolution: usize, size: Vec3) -> (f32, f32) {
        let last = last_index(resolution);
        (
            self.width as f32 / last * size.x,
            self.height as f32 / last * size.z,
        )
    }
}

/// Splits `[0, R-1]^2` into `C x C` rectangles that share their boundaries.
#[derive(Clone, Copy, Debug)]
pub struct ChunkPlanner {
    resolution: usize,
    count: usize,
}

impl ChunkPlanner {
    pub fn new(resolution: usize, count: usize) -> Result<Self, FieldError> {
        if resolution == 0 {
            return Err(FieldError::EmptyHeightfield);
        }
        if resolution < 2 {
            return Err(FieldError::ResolutionTooSmall(resolution));
        }
        if count == 0 {
            return Err(FieldError::ZeroChunkCount);
        }
        let cells = resolution - 1;
        if count > cells {
            return Err(FieldError::TooManyChunks { count, cells });
        }
        Ok(Self { resolution, count })
    }

    #[inline]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// `(start, end)` sample indices of chunk `i` along one axis.
    pub fn axis_bounds(&self, i: usize) -> (usize, usize) {
        let last = self.resolution - 1;
        let step = last as f64 / self.count as f64;
        let start = (i as f64 * step).round() as usize;
        let end = if i + 1 == self.count {
            last
        } else {
            ((i + 1) as f64 * step).round() as usize
        };
        (start, end)
    }

    pub fn rect(&self, cx: usize, cy: usize) -> ChunkRect {
        let (sx, ex) = self.axis_bounds(cx);
        let (sy, ey) = self.axis_bounds(cy);
        ChunkRect {
            cx,
            cy,
            start_x: sx,
            start_y: sy,
            width: ex - sx,
            height: ey - sy,
        }
    }

    /// All rectangles, row by row (`cy` outer).
    pub fn rects(&self) -> impl Iterator<Item = ChunkRect> + '_ {
        (0..self.count).flat_map(move |cy| (0..self.count).map(move |cx| self.rect(cx, cy)))
    }
}
