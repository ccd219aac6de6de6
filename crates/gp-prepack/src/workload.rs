use std::ops::Range;

use crate::block_sizes::BlockSizes;
use crate::buffer_size::{required_destination_element_count, round_up};
use crate::error::{PrepackError, Result};
use crate::strategy::Strategy;
use crate::window::{Dimension, Window, WindowIter};

/// One block's worth of rearrangement.
///
/// Offsets are absolute byte offsets into the source and destination
/// buffers, so a workload can run on any thread in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrepareBWorkload {
    /// Byte offset of element (0, 0, batch) in the source.
    pub src_offset: usize,
    /// Byte offset where this block's rearranged data starts.
    pub dst_offset: usize,
    pub x0: usize,
    pub xmax: usize,
    pub k0: usize,
    pub kmax: usize,
}

impl PrepareBWorkload {
    pub fn x_range(&self) -> Range<usize> {
        self.x0..self.xmax
    }

    pub fn k_range(&self) -> Range<usize> {
        self.k0..self.kmax
    }
}

/// Geometry of the block grid laid over a B operand.
///
/// Knows where every block lands in the destination: blocks are stored
/// back to back batch by batch, K-row by K-row, and left to right along N,
/// each padded to the strategy's multiples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGrid {
    n: usize,
    k: usize,
    multis: usize,
    block_sizes: BlockSizes,
    strategy: Strategy,
    element_size: usize,
    dst_base: usize,
}

impl BlockGrid {
    /// `dst_base` is the byte offset of the destination's first element.
    ///
    /// # Panics
    /// `block_sizes` must have passed [`BlockSizes::validate`]; with a zero
    /// block size the footprint and window queries panic.
    pub fn new(
        n: usize,
        k: usize,
        multis: usize,
        block_sizes: BlockSizes,
        strategy: Strategy,
        element_size: usize,
        dst_base: usize,
    ) -> Self {
        BlockGrid {
            n,
            k,
            multis,
            block_sizes,
            strategy,
            element_size,
            dst_base,
        }
    }

    pub fn block_sizes(&self) -> BlockSizes {
        self.block_sizes
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// The full iteration domain: one point per block origin per batch.
    ///
    /// # Panics
    /// Panics if either block size is zero.
    pub fn window(&self) -> Window {
        let BlockSizes { x_block, k_block } = self.block_sizes;
        Window::new(
            Dimension::new(0, round_up(self.n, x_block), x_block),
            Dimension::new(0, round_up(self.k, k_block), k_block),
            Dimension::new(0, self.multis, 1),
        )
    }

    /// Logical end of the block starting at (`x0`, `k0`).
    pub fn block_end(&self, x0: usize, k0: usize) -> (usize, usize) {
        (
            (x0 + self.block_sizes.x_block).min(self.n),
            (k0 + self.block_sizes.k_block).min(self.k),
        )
    }

    /// Destination elements used by the block starting at (`x0`, `k0`).
    pub fn footprint(&self, x0: usize, k0: usize) -> usize {
        let (xmax, kmax) = self.block_end(x0, k0);
        self.strategy.footprint(xmax - x0, kmax - k0)
    }

    /// Destination elements used by one batch.
    pub fn batch_footprint(&self) -> usize {
        required_destination_element_count(self.n, self.k, &self.block_sizes, &self.strategy)
    }

    /// Destination elements used by all batches.
    pub fn total_footprint(&self) -> usize {
        self.batch_footprint() * self.multis
    }

    /// Byte offset in the destination of the block at (`x0`, `k0`, `multi`).
    ///
    /// Every K-row before `k0` is a full `k_block` high and every block
    /// before `x0` in its row is a full `x_block` wide, so the offset is the
    /// closed-form sum of everything before it in traversal order.
    pub fn dst_offset_of(&self, x0: usize, k0: usize, multi: usize) -> usize {
        let padded_width = round_up(self.n, self.strategy.out_width());
        let row_height = round_up(self.block_end(x0, k0).1 - k0, self.strategy.k_unroll());
        let elements = multi * self.batch_footprint() + k0 * padded_width + x0 * row_height;
        self.dst_base + elements * self.element_size
    }

    /// The block visited right after `point` in a full traversal.
    fn successor(&self, point: [usize; 3]) -> Option<[usize; 3]> {
        let [x0, k0, multi] = point;
        let window = self.window();
        if x0 + self.block_sizes.x_block < window.x().end {
            Some([x0 + self.block_sizes.x_block, k0, multi])
        } else if k0 + self.block_sizes.k_block < window.y().end {
            Some([0, k0 + self.block_sizes.k_block, multi])
        } else if multi + 1 < self.multis {
            Some([0, 0, multi + 1])
        } else {
            None
        }
    }
}

/// Generates the workloads of a window in traversal order.
///
/// The destination offset is a running total advanced by each block's
/// footprint. When the window skips blocks (a slice of the full domain) the
/// total is re-seeded from [`BlockGrid::dst_offset_of`], so every workload
/// carries the offset it would have had in a full traversal.
#[derive(Debug, Clone)]
pub struct Workloads<'a> {
    grid: &'a BlockGrid,
    src_offsets: &'a [usize],
    points: WindowIter,
    prev: Option<[usize; 3]>,
    next_dst_offset: usize,
}

impl<'a> Workloads<'a> {
    /// `src_offsets[multi]` is the source byte offset of element
    /// (0, 0, multi).
    ///
    /// # Errors
    /// Fails with `DomainMismatch` if `window` was not carved from the
    /// grid's window, or if a batch has no source offset.
    pub fn new(grid: &'a BlockGrid, window: &Window, src_offsets: &'a [usize]) -> Result<Self> {
        let configured = grid.window();
        configured.validate_sub_window(window)?;
        if window.num_iterations() > 0 && src_offsets.len() < window.z().end {
            return Err(PrepackError::DomainMismatch {
                window: *window,
                configured,
            });
        }
        Ok(Workloads {
            grid,
            src_offsets,
            points: window.iter(),
            prev: None,
            next_dst_offset: grid.dst_base,
        })
    }
}

impl Iterator for Workloads<'_> {
    type Item = PrepareBWorkload;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.points.next()?;
        let [x0, k0, multi] = point;

        let dst_offset = match self.prev {
            Some(prev) if self.grid.successor(prev) == Some(point) => self.next_dst_offset,
            _ => self.grid.dst_offset_of(x0, k0, multi),
        };
        let (xmax, kmax) = self.grid.block_end(x0, k0);

        self.next_dst_offset =
            dst_offset + self.grid.footprint(x0, k0) * self.grid.element_size;
        self.prev = Some(point);

        Some(PrepareBWorkload {
            src_offset: self.src_offsets[multi],
            dst_offset,
            x0,
            xmax,
            k0,
            kmax,
        })
    }
}
