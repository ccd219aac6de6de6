//! `gp-tensor` - Operand descriptors and typed CPU storage for gemm-prepack.
//!
//! This crate provides:
//! - A `TensorInfo` describing shape, element type, byte strides and padding
//! - A `Tensor` pairing that metadata with CPU storage
//! - The `Element` trait mapping Rust scalars to `DType`
//! - Shape utilities
//! - Data type definitions (F32, F16, U8, I8)

pub mod dtype;
pub mod element;
pub mod error;
pub mod info;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use dtype::DType;
pub use element::Element;
pub use error::{Result, TensorError};
pub use info::TensorInfo;
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
