use std::ops::Range;

use gp_tensor::{DType, Element};

use crate::buffer_size::round_up;
use crate::cpu::CpuInfo;
use crate::error::{PrepackError, Result};

/// Describes how a GEMM micro-kernel wants its B operand laid out.
///
/// `out_width` is the number of output columns the kernel produces per
/// pass, so rearranged blocks are padded to a multiple of it along N.
/// `k_unroll` is the number of consecutive K values it consumes at once
/// (4 for the 8-bit dot-product kernels), so blocks are padded to a
/// multiple of it along K.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    name: &'static str,
    out_width: usize,
    out_height: usize,
    k_unroll: usize,
}

impl Strategy {
    /// 32-bit float kernel producing 12x8 output tiles.
    pub const SGEMM_12X8: Strategy = Strategy {
        name: "sgemm_12x8",
        out_width: 12,
        out_height: 8,
        k_unroll: 1,
    };

    /// Half-precision kernel producing 24x8 output tiles.
    pub const HGEMM_24X8: Strategy = Strategy {
        name: "hgemm_24x8",
        out_width: 24,
        out_height: 8,
        k_unroll: 1,
    };

    /// Plain 8-bit kernel, 4x4 tiles consuming 16 K values per step.
    pub const GEMM_8BIT_4X4: Strategy = Strategy {
        name: "gemm_8bit_4x4",
        out_width: 4,
        out_height: 4,
        k_unroll: 16,
    };

    /// 8-bit dot-product kernel, 12x8 tiles consuming 4 K values per step.
    pub const GEMM_8BIT_DOT_12X8: Strategy = Strategy {
        name: "gemm_8bit_dot_12x8",
        out_width: 12,
        out_height: 8,
        k_unroll: 4,
    };

    /// Build an arbitrary strategy descriptor.
    ///
    /// # Errors
    /// Fails if any multiple is zero.
    pub fn custom(
        name: &'static str,
        out_width: usize,
        out_height: usize,
        k_unroll: usize,
    ) -> Result<Self> {
        if out_width == 0 || out_height == 0 || k_unroll == 0 {
            return Err(PrepackError::Configuration(format!(
                "strategy {name}: out_width, out_height and k_unroll must be non-zero"
            )));
        }
        Ok(Strategy {
            name,
            out_width,
            out_height,
            k_unroll,
        })
    }

    /// Pick the strategy for `dtype` on the CPU described by `ci`.
    ///
    /// # Errors
    /// `Configuration` for f16 on a CPU without half-precision vector
    /// arithmetic, which has no kernel to prepare for.
    pub fn select(dtype: DType, ci: &CpuInfo) -> Result<Self> {
        match dtype {
            DType::F32 => Ok(Strategy::SGEMM_12X8),
            DType::F16 if ci.has_fp16 => Ok(Strategy::HGEMM_24X8),
            DType::F16 => Err(PrepackError::Configuration(
                "f16 operands need a CPU with fp16 vector arithmetic".to_string(),
            )),
            DType::U8 | DType::I8 if ci.has_dotprod => Ok(Strategy::GEMM_8BIT_DOT_12X8),
            DType::U8 | DType::I8 => Ok(Strategy::GEMM_8BIT_4X4),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn out_width(&self) -> usize {
        self.out_width
    }

    pub fn out_height(&self) -> usize {
        self.out_height
    }

    pub fn k_unroll(&self) -> usize {
        self.k_unroll
    }

    /// Number of destination elements a `width` x `height` block occupies.
    pub fn footprint(&self, width: usize, height: usize) -> usize {
        round_up(width, self.out_width) * round_up(height, self.k_unroll)
    }

    /// One past the highest source element index `prepare_b` reads for the
    /// given block. Zero for an empty block.
    pub fn input_span(
        &self,
        ldin: usize,
        x: &Range<usize>,
        k: &Range<usize>,
        transpose: bool,
    ) -> usize {
        if x.is_empty() || k.is_empty() {
            return 0;
        }
        let (last_x, last_k) = (x.end - 1, k.end - 1);
        if transpose {
            last_x * ldin + last_k + 1
        } else {
            last_k * ldin + last_x + 1
        }
    }

    /// Rearrange the block `x` x `k` of `input` into `out`.
    ///
    /// `input` starts at element (0, 0) of the current batch and has `ldin`
    /// elements between consecutive rows. Without `transpose` element
    /// (x, k) is read from `input[k * ldin + x]`, with it from
    /// `input[x * ldin + k]`.
    ///
    /// The output is a sequence of panels `out_width` columns wide. Inside a
    /// panel, each group of `k_unroll` K values stores every column's group
    /// contiguously. Columns and K values past the block edge are written as
    /// zero, so exactly `footprint(x.len(), k.len())` elements are written.
    ///
    /// # Panics
    /// Panics if `out` is shorter than the footprint or `input` shorter than
    /// `input_span`.
    pub fn prepare_b<T: Element>(
        &self,
        out: &mut [T],
        input: &[T],
        ldin: usize,
        x: Range<usize>,
        k: Range<usize>,
        transpose: bool,
    ) {
        let x_size = round_up(x.len(), self.out_width);
        let k_size = round_up(k.len(), self.k_unroll);
        let zero = T::default();

        let mut idx = 0;
        for panel in (x.start..x.start + x_size).step_by(self.out_width) {
            for group in (k.start..k.start + k_size).step_by(self.k_unroll) {
                for col in panel..panel + self.out_width {
                    for kk in group..group + self.k_unroll {
                        out[idx] = if col < x.end && kk < k.end {
                            if transpose {
                                input[col * ldin + kk]
                            } else {
                                input[kk * ldin + col]
                            }
                        } else {
                            zero
                        };
                        idx += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        let plain = CpuInfo::new();
        let dot = CpuInfo::new().with_dotprod(true);
        let fp16 = CpuInfo::new().with_fp16(true);
        assert_eq!(Strategy::select(DType::F32, &plain).unwrap(), Strategy::SGEMM_12X8);
        assert_eq!(Strategy::select(DType::F16, &fp16).unwrap(), Strategy::HGEMM_24X8);
        assert_eq!(Strategy::select(DType::U8, &plain).unwrap(), Strategy::GEMM_8BIT_4X4);
        assert_eq!(
            Strategy::select(DType::I8, &dot).unwrap(),
            Strategy::GEMM_8BIT_DOT_12X8
        );
        // The float kernels do not depend on dot-product support.
        assert_eq!(Strategy::select(DType::F32, &dot).unwrap(), Strategy::SGEMM_12X8);
    }

    #[test]
    fn test_select_f16_needs_fp16() {
        let err = Strategy::select(DType::F16, &CpuInfo::new().with_dotprod(true)).unwrap_err();
        assert!(matches!(err, PrepackError::Configuration(_)), "{err}");
    }

    #[test]
    fn test_custom_rejects_zero() {
        assert!(Strategy::custom("bad", 0, 4, 1).is_err());
        assert!(Strategy::custom("bad", 4, 4, 0).is_err());
        let s = Strategy::custom("ok", 4, 2, 4).unwrap();
        assert_eq!((s.out_width(), s.out_height(), s.k_unroll()), (4, 2, 4));
        assert_eq!(s.name(), "ok");
    }

    #[test]
    fn test_footprint() {
        let s = Strategy::custom("t", 4, 4, 4).unwrap();
        assert_eq!(s.footprint(8, 8), 64);
        assert_eq!(s.footprint(2, 8), 32);
        assert_eq!(s.footprint(2, 2), 16);
    }

    #[test]
    fn test_prepare_b_panels() {
        // 3 (N) x 2 (K) source, row-major along N:
        // k=0: 1 2 3
        // k=1: 4 5 6
        let input = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let s = Strategy::custom("t", 2, 1, 1).unwrap();
        let mut out = [f32::NAN; 8];
        s.prepare_b(&mut out, &input, 3, 0..3, 0..2, false);
        assert_eq!(out, [1.0, 2.0, 4.0, 5.0, 3.0, 0.0, 6.0, 0.0]);
    }

    #[test]
    fn test_prepare_b_k_unroll() {
        // 2 (N) x 3 (K) source, k_unroll 2 pads K to 4.
        let input = [1i8, 2, 3, 4, 5, 6];
        let s = Strategy::custom("t", 2, 1, 2).unwrap();
        let mut out = [i8::MAX; 8];
        s.prepare_b(&mut out, &input, 2, 0..2, 0..3, false);
        // group k=0..2: col0 (1,3) col1 (2,4); group k=2..4: col0 (5,0) col1 (6,0)
        assert_eq!(out, [1, 3, 2, 4, 5, 0, 6, 0]);
    }

    #[test]
    fn test_prepare_b_transposed() {
        // Stored N-major: row x holds K values.
        // x=0: 1 2
        // x=1: 3 4
        let input = [1u8, 2, 3, 4];
        let s = Strategy::custom("t", 2, 1, 1).unwrap();
        let mut out = [0u8; 4];
        s.prepare_b(&mut out, &input, 2, 0..2, 0..2, true);
        assert_eq!(out, [1, 3, 2, 4]);
    }

    #[test]
    fn test_prepare_b_sub_block() {
        // 4 x 4 source, rearrange the block x in 2..4, k in 1..3.
        let input: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let s = Strategy::custom("t", 2, 1, 1).unwrap();
        let mut out = [0.0f32; 4];
        s.prepare_b(&mut out, &input, 4, 2..4, 1..3, false);
        assert_eq!(out, [6.0, 7.0, 10.0, 11.0]);
    }

    #[test]
    fn test_input_span() {
        let s = Strategy::SGEMM_12X8;
        assert_eq!(s.input_span(10, &(0..3), &(0..2), false), 13);
        assert_eq!(s.input_span(10, &(0..3), &(0..2), true), 22);
        assert_eq!(s.input_span(10, &(3..3), &(0..2), false), 0);
    }
}
