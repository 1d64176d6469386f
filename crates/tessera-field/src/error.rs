use std::fmt;

/// Degenerate input that aborts a whole conversion call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    EmptyHeightfield,
    ResolutionTooSmall(usize),
    SampleCountMismatch { expected: usize, got: usize },
    DegenerateSize,
    ZeroChunkCount,
    TooManyChunks { count: usize, cells: usize },
    ZeroResolution,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::EmptyHeightfield => write!(f, "heightfield has no samples"),
            FieldError::ResolutionTooSmall(r) => {
                write!(f, "heightfield resolution {} is below the minimum of 2", r)
            }
            FieldError::SampleCountMismatch { expected, got } => {
                write!(f, "expected {} height samples, got {}", expected, got)
            }
            FieldError::DegenerateSize => write!(f, "heightfield world size must be positive and finite"),
            FieldError::ZeroChunkCount => write!(f, "chunk count must be at least 1"),
            FieldError::TooManyChunks { count, cells } => write!(
                f,
                "{} chunks per axis exceeds the {} sample cells available",
                count, cells
            ),
            FieldError::ZeroResolution => write!(f, "mesh resolution must be at least 1"),
        }
    }
}

impl std::error::Error for FieldError {}
