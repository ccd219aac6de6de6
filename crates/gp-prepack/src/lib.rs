//! `gp-prepack` - Rearranges the B operand of a GEMM into a cache-blocked,
//! strategy-specific layout.
//!
//! This crate provides:
//! - A `CpuInfo` capability descriptor and runtime `Strategy` selection
//! - Block-size policies (`CacheBlockingPolicy`, `FixedBlockSizes`)
//! - The closed-form destination size calculation
//! - A `Window` iteration domain and deterministic workload generation
//! - `PrepareBKernel`, which configures, enumerates and executes workloads
//! - Pluggable `Scheduler`s for running workloads on several threads

pub mod block_sizes;
pub mod buffer_size;
pub mod cpu;
pub mod error;
pub mod kernel;
pub mod scheduler;
pub mod strategy;
pub mod window;
pub mod workload;

pub use block_sizes::{BlockSizePolicy, BlockSizes, CacheBlockingPolicy, FixedBlockSizes};
pub use buffer_size::{required_destination_element_count, round_up};
pub use cpu::CpuInfo;
pub use error::{PrepackError, Result};
pub use kernel::{GemmParams, PrepareBKernel};
#[cfg(feature = "parallel")]
pub use scheduler::RayonScheduler;
pub use scheduler::{Scheduler, SequentialScheduler};
pub use strategy::Strategy;
pub use window::{Dimension, Window};
pub use workload::{BlockGrid, PrepareBWorkload, Workloads};
