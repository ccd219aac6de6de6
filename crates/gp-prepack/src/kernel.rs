use gp_tensor::{DType, Element, Shape, Tensor, TensorInfo};

use crate::block_sizes::{BlockSizePolicy, BlockSizes, CacheBlockingPolicy};
use crate::cpu::CpuInfo;
use crate::error::{PrepackError, Result};
use crate::scheduler::{Job, Scheduler};
use crate::strategy::Strategy;
use crate::window::Window;
use crate::workload::{BlockGrid, PrepareBWorkload, Workloads};

/// Logical dimensions of the multiply the B operand is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmParams {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

/// Bind `$t` to the Rust scalar type of `$dtype` and evaluate `$body`.
macro_rules! with_element_type {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            DType::F32 => {
                type $t = f32;
                $body
            }
            DType::F16 => {
                type $t = half::f16;
                $body
            }
            DType::U8 => {
                type $t = u8;
                $body
            }
            DType::I8 => {
                type $t = i8;
                $body
            }
        }
    };
}

/// Rearranges a B operand of shape `[N, K, batches]` (or `[K, N, batches]`
/// when transposed) into blocks laid out for a GEMM strategy.
///
/// Configuration decides the strategy and block sizes, sizes the
/// destination and fixes the iteration window. The work is then available
/// as a list of independent [`PrepareBWorkload`]s (see
/// [`create_workloads`](Self::create_workloads) and
/// [`schedule`](Self::schedule)) or can be executed directly over any
/// sub-window of the configured one (see [`run`](Self::run)).
#[derive(Debug, Clone)]
pub struct PrepareBKernel {
    src_info: TensorInfo,
    dst_info: TensorInfo,
    transpose_b: bool,
    grid: BlockGrid,
    window: Window,
    src_offsets: Vec<usize>,
}

impl PrepareBKernel {
    /// Configure with the strategy for the source dtype and cache-driven
    /// block sizes.
    ///
    /// If `dst` has no shape yet it is initialised to a 1-D operand holding
    /// the whole rearranged B (every batch). A `dst` that already has a
    /// shape is left as is.
    pub fn configure(
        src: &TensorInfo,
        dst: &mut TensorInfo,
        transpose_b: bool,
        ci: &CpuInfo,
        params: &GemmParams,
    ) -> Result<Self> {
        Self::configure_with_policy(src, dst, transpose_b, ci, params, &CacheBlockingPolicy)
    }

    /// Like [`configure`](Self::configure) with a custom block-size policy.
    pub fn configure_with_policy(
        src: &TensorInfo,
        dst: &mut TensorInfo,
        transpose_b: bool,
        ci: &CpuInfo,
        params: &GemmParams,
        policy: &dyn BlockSizePolicy,
    ) -> Result<Self> {
        let strategy = Strategy::select(src.dtype(), ci)?;
        Self::configure_with_strategy(src, dst, transpose_b, ci, params, strategy, policy)
    }

    /// Configure with an explicit strategy and block-size policy.
    ///
    /// The source is `[N, K, batches]`, or `[K, N, batches]` when
    /// `transpose_b` is set; trailing dimensions may be omitted.
    ///
    /// # Errors
    /// `Configuration` if the chosen block sizes are not multiples of the
    /// strategy's granularity. `OperandMismatch` if the source has no shape,
    /// more than three dimensions or rows closer together than their
    /// length, or if a pre-shaped destination has another dtype.
    pub fn configure_with_strategy(
        src: &TensorInfo,
        dst: &mut TensorInfo,
        transpose_b: bool,
        ci: &CpuInfo,
        params: &GemmParams,
        strategy: Strategy,
        policy: &dyn BlockSizePolicy,
    ) -> Result<Self> {
        if src.is_empty() || src.shape().ndim() > 3 {
            return Err(PrepackError::OperandMismatch(format!(
                "source operand must have 1 to 3 dimensions, got {}",
                src.shape()
            )));
        }
        // A transposed operand stores K along its innermost dimension.
        let (n, k) = if transpose_b {
            (src.dimension(1), src.dimension(0))
        } else {
            (src.dimension(0), src.dimension(1))
        };
        let multis = src.dimension(2);
        let element_size = src.element_size();
        if src.stride_in_bytes(1) < src.dimension(0) * element_size {
            return Err(PrepackError::OperandMismatch(format!(
                "source rows are {} bytes apart but hold {} elements of {} bytes",
                src.stride_in_bytes(1),
                src.dimension(0),
                element_size
            )));
        }

        let block_sizes = policy.decide(ci, &strategy, element_size, params);
        block_sizes.validate(&strategy)?;

        let required = BlockGrid::new(n, k, multis, block_sizes, strategy, element_size, 0)
            .total_footprint();
        if !dst.auto_init_if_empty(Shape::new(vec![required]), src.dtype()) {
            if dst.dtype() != src.dtype() {
                return Err(PrepackError::OperandMismatch(format!(
                    "destination is {} but source is {}",
                    dst.dtype(),
                    src.dtype()
                )));
            }
            let needed = dst.offset_first_element_in_bytes() + required * element_size;
            if dst.total_size_in_bytes() < needed {
                log::warn!(
                    "prepare_b: pre-shaped destination holds {} bytes, {} needed",
                    dst.total_size_in_bytes(),
                    needed
                );
            }
        }

        let grid = BlockGrid::new(
            n,
            k,
            multis,
            block_sizes,
            strategy,
            element_size,
            dst.offset_first_element_in_bytes(),
        );
        let window = grid.window();

        let src_offsets = if n > 0 && k > 0 {
            (0..multis)
                .map(|multi| src.offset_element_in_bytes(&[0, 0, multi]))
                .collect::<gp_tensor::Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        log::debug!(
            "prepare_b: {} ({}) n={} k={} batches={} transpose={} blocks={}x{} dst={} elements",
            strategy.name(),
            policy.name(),
            n,
            k,
            multis,
            transpose_b,
            block_sizes.x_block,
            block_sizes.k_block,
            required
        );

        Ok(PrepareBKernel {
            src_info: src.clone(),
            dst_info: dst.clone(),
            transpose_b,
            grid,
            window,
            src_offsets,
        })
    }

    pub fn block_sizes(&self) -> BlockSizes {
        self.grid.block_sizes()
    }

    pub fn strategy(&self) -> &Strategy {
        self.grid.strategy()
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    /// The configured iteration window over (N blocks, K blocks, batches).
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn transpose_b(&self) -> bool {
        self.transpose_b
    }

    /// Destination metadata as configured (after auto-sizing).
    pub fn destination_info(&self) -> &TensorInfo {
        &self.dst_info
    }

    /// Destination elements needed for one batch.
    pub fn required_destination_element_count(&self) -> usize {
        self.grid.batch_footprint()
    }

    /// Workloads of `window` in traversal order.
    ///
    /// # Errors
    /// `DomainMismatch` if `window` was not carved from the configured one.
    pub fn workloads_in(&self, window: &Window) -> Result<Workloads<'_>> {
        Workloads::new(&self.grid, window, &self.src_offsets)
    }

    /// Every workload of the configured window, in traversal order.
    pub fn create_workloads(&self) -> Result<Vec<PrepareBWorkload>> {
        Ok(self.workloads_in(&self.window)?.collect())
    }

    /// Rearrange a single block.
    pub fn transform(&self, wl: &PrepareBWorkload, src: &Tensor, dst: &mut Tensor) -> Result<()> {
        self.check_operands(src, dst)?;
        with_element_type!(self.src_info.dtype(), T => {
            self.transform_typed::<T>(wl, src.data::<T>()?, dst.data_mut::<T>()?)
        })
    }

    /// Execute every workload of `window` on the calling thread.
    ///
    /// `window` may be the configured window or any slice of it produced by
    /// [`Window::split`]; each block lands where a full traversal puts it.
    pub fn run(&self, window: &Window, src: &Tensor, dst: &mut Tensor) -> Result<()> {
        self.check_operands(src, dst)?;
        let workloads = self.workloads_in(window)?;
        with_element_type!(self.src_info.dtype(), T => {
            let input = src.data::<T>()?;
            let output = dst.data_mut::<T>()?;
            for wl in workloads {
                self.transform_typed::<T>(&wl, input, output)?;
            }
            Ok(())
        })
    }

    /// Execute `workloads` through `scheduler`, one job per workload.
    ///
    /// The destination is split into one disjoint chunk per workload, so the
    /// jobs need no synchronisation.
    ///
    /// # Errors
    /// `OverlappingWorkloads` if two workloads would write the same
    /// destination bytes.
    pub fn schedule(
        &self,
        workloads: &[PrepareBWorkload],
        src: &Tensor,
        dst: &mut Tensor,
        scheduler: &dyn Scheduler,
    ) -> Result<()> {
        self.check_operands(src, dst)?;
        with_element_type!(self.src_info.dtype(), T => {
            self.schedule_typed::<T>(workloads, src.data::<T>()?, dst.data_mut::<T>()?, scheduler)
        })
    }

    /// Enumerate the configured window and run it through `scheduler`.
    pub fn execute(&self, src: &Tensor, dst: &mut Tensor, scheduler: &dyn Scheduler) -> Result<()> {
        let workloads = self.create_workloads()?;
        log::debug!(
            "prepare_b: {} workloads on {} ({} threads)",
            workloads.len(),
            scheduler.name(),
            scheduler.num_threads()
        );
        self.schedule(&workloads, src, dst, scheduler)
    }

    fn check_operands(&self, src: &Tensor, dst: &Tensor) -> Result<()> {
        if src.info() != &self.src_info {
            return Err(PrepackError::OperandMismatch(format!(
                "source {} differs from configured {}",
                src.info().shape(),
                self.src_info.shape()
            )));
        }
        if dst.info() != &self.dst_info {
            return Err(PrepackError::OperandMismatch(format!(
                "destination {} differs from configured {}",
                dst.info().shape(),
                self.dst_info.shape()
            )));
        }
        Ok(())
    }

    fn footprint(&self, wl: &PrepareBWorkload) -> usize {
        self.strategy().footprint(wl.xmax - wl.x0, wl.kmax - wl.k0)
    }

    fn transform_typed<T: Element>(
        &self,
        wl: &PrepareBWorkload,
        src: &[T],
        dst: &mut [T],
    ) -> Result<()> {
        let start = wl.dst_offset / self.grid.element_size();
        let end = start + self.footprint(wl);
        let available = dst.len();
        let out = dst
            .get_mut(start..end)
            .ok_or(PrepackError::DestinationOutOfBounds {
                needed: end,
                available,
            })?;
        self.transform_into(wl, src, out)
    }

    /// Rearrange `wl` into `out`, which holds exactly its footprint.
    fn transform_into<T: Element>(
        &self,
        wl: &PrepareBWorkload,
        src: &[T],
        out: &mut [T],
    ) -> Result<()> {
        let element_size = self.grid.element_size();
        let first = wl.src_offset / element_size;
        let ldin = self.src_info.stride_in_bytes(1) / element_size;
        let strategy = self.strategy();

        let span = strategy.input_span(ldin, &wl.x_range(), &wl.k_range(), self.transpose_b);
        let input = src
            .get(first..first + span)
            .ok_or(PrepackError::SourceOutOfBounds {
                needed: first + span,
                available: src.len(),
            })?;
        let footprint = self.footprint(wl);
        if out.len() < footprint {
            return Err(PrepackError::DestinationOutOfBounds {
                needed: footprint,
                available: out.len(),
            });
        }

        log::trace!(
            "prepare_b: x={}..{} k={}..{} src@{} dst@{}",
            wl.x0,
            wl.xmax,
            wl.k0,
            wl.kmax,
            wl.src_offset,
            wl.dst_offset
        );
        strategy.prepare_b(
            &mut out[..footprint],
            input,
            ldin,
            wl.x_range(),
            wl.k_range(),
            self.transpose_b,
        );
        Ok(())
    }

    fn schedule_typed<T: Element>(
        &self,
        workloads: &[PrepareBWorkload],
        src: &[T],
        dst: &mut [T],
        scheduler: &dyn Scheduler,
    ) -> Result<()> {
        let element_size = self.grid.element_size();
        let mut ordered: Vec<&PrepareBWorkload> = workloads.iter().collect();
        ordered.sort_by_key(|wl| wl.dst_offset);

        let mut jobs: Vec<Job<'_>> = Vec::with_capacity(ordered.len());
        let mut rest: &mut [T] = dst;
        let mut consumed = 0;
        for wl in ordered {
            let start = wl.dst_offset / element_size;
            if start < consumed {
                return Err(PrepackError::OverlappingWorkloads {
                    offset: wl.dst_offset,
                });
            }
            let len = self.footprint(wl);
            if start + len > consumed + rest.len() {
                return Err(PrepackError::DestinationOutOfBounds {
                    needed: start + len,
                    available: consumed + rest.len(),
                });
            }
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(start - consumed);
            let (chunk, tail) = tail.split_at_mut(len);
            rest = tail;
            consumed = start + len;

            jobs.push(Box::new(move || self.transform_into(wl, src, chunk)));
        }

        scheduler.run(jobs)
    }
}
