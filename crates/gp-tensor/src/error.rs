use thiserror::Error;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: String, got: String },
    #[error("coordinate {coords:?} out of bounds for shape {shape:?}")]
    CoordinateOutOfBounds { coords: Vec<usize>, shape: Vec<usize> },
    #[error("stride of {stride} bytes is not a multiple of the {element_size}-byte element")]
    MisalignedStride { stride: usize, element_size: usize },
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    #[error("unsupported dtype: {0}")]
    UnsupportedDType(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TensorError>;
