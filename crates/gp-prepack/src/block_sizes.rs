use std::fmt::Debug;

use crate::buffer_size::round_up;
use crate::cpu::CpuInfo;
use crate::error::{PrepackError, Result};
use crate::kernel::GemmParams;
use crate::strategy::Strategy;

/// Cache blocking of the B operand: blocks are `x_block` wide along N and
/// `k_block` deep along K.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSizes {
    pub x_block: usize,
    pub k_block: usize,
}

impl BlockSizes {
    pub const fn new(x_block: usize, k_block: usize) -> Self {
        BlockSizes { x_block, k_block }
    }

    /// Check that the blocks are whole multiples of the strategy's
    /// processing granularity.
    pub fn validate(&self, strategy: &Strategy) -> Result<()> {
        if self.x_block == 0 || self.k_block == 0 {
            return Err(PrepackError::Configuration(format!(
                "block sizes must be non-zero, got x_block={} k_block={}",
                self.x_block, self.k_block
            )));
        }
        if self.x_block % strategy.out_width() != 0 {
            return Err(PrepackError::Configuration(format!(
                "x_block={} is not a multiple of {} out_width={}",
                self.x_block,
                strategy.name(),
                strategy.out_width()
            )));
        }
        if self.k_block % strategy.k_unroll() != 0 {
            return Err(PrepackError::Configuration(format!(
                "k_block={} is not a multiple of {} k_unroll={}",
                self.k_block,
                strategy.name(),
                strategy.k_unroll()
            )));
        }
        Ok(())
    }
}

/// Decides how the B operand is blocked for a given problem.
pub trait BlockSizePolicy: Send + Sync + Debug {
    /// Returns the name of this policy.
    fn name(&self) -> &str;

    /// Choose block sizes for a multiply of `params` using `strategy` on
    /// elements of `element_size` bytes.
    fn decide(
        &self,
        ci: &CpuInfo,
        strategy: &Strategy,
        element_size: usize,
        params: &GemmParams,
    ) -> BlockSizes;
}

/// Sizes blocks from the L1/L2 cache geometry.
///
/// `k_block` is chosen so that one strip of the larger kernel dimension
/// fits in half of L1. `x_block` is chosen so that `x_block` rows of
/// `k_block` elements fit in 90% of L2 next to the L1 working set. Both
/// are then spread evenly over the problem so the last block is not
/// needlessly small.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheBlockingPolicy;

impl BlockSizePolicy for CacheBlockingPolicy {
    fn name(&self) -> &str {
        "cache"
    }

    fn decide(
        &self,
        ci: &CpuInfo,
        strategy: &Strategy,
        element_size: usize,
        params: &GemmParams,
    ) -> BlockSizes {
        let element_size = element_size.max(1);
        let out_width = strategy.out_width();
        let out_height = strategy.out_height();
        let k_unroll = strategy.k_unroll();

        let mut k_block = (ci.l1_cache_size / 2) / (element_size * out_width.max(out_height));
        k_block = (k_block / k_unroll).max(1) * k_unroll;
        let num_k_blocks = params.k.div_ceil(k_block).max(1);
        k_block = round_up(params.k.div_ceil(num_k_blocks), k_unroll).max(k_unroll);

        let l1_working_set = k_block * element_size * (out_width + out_height);
        let mut x_block = ((ci.l2_cache_size * 9) / 10).saturating_sub(l1_working_set)
            / (element_size * k_block);
        x_block = (x_block / out_width).max(1) * out_width;
        let num_x_blocks = params.n.div_ceil(x_block).max(1);
        x_block = round_up(params.n.div_ceil(num_x_blocks), out_width).max(out_width);

        BlockSizes { x_block, k_block }
    }
}

/// Always returns the same block sizes.
#[derive(Debug, Clone, Copy)]
pub struct FixedBlockSizes(pub BlockSizes);

impl BlockSizePolicy for FixedBlockSizes {
    fn name(&self) -> &str {
        "fixed"
    }

    fn decide(&self, _: &CpuInfo, _: &Strategy, _: usize, _: &GemmParams) -> BlockSizes {
        self.0
    }
}
