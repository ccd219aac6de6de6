use thiserror::Error;

use crate::window::Window;

#[derive(Error, Debug)]
pub enum PrepackError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("window {window:?} was not carved from the configured window {configured:?}")]
    DomainMismatch { window: Window, configured: Window },
    #[error("workload writing at byte {offset} overlaps the previous workload")]
    OverlappingWorkloads { offset: usize },
    #[error("source read of element {needed} exceeds buffer of {available} elements")]
    SourceOutOfBounds { needed: usize, available: usize },
    #[error("destination write up to element {needed} exceeds buffer of {available} elements")]
    DestinationOutOfBounds { needed: usize, available: usize },
    #[error("operand mismatch: {0}")]
    OperandMismatch(String),
    #[error("tensor error: {0}")]
    Tensor(#[from] gp_tensor::TensorError),
}

pub type Result<T> = std::result::Result<T, PrepackError>;
