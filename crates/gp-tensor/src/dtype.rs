use std::fmt;

/// Element types an operand can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point.
    F32,
    /// 16-bit floating point (IEEE 754 half-precision, via the `half` crate).
    F16,
    /// Unsigned 8-bit integer (asymmetric quantized operands).
    U8,
    /// Signed 8-bit integer (symmetric quantized operands).
    I8,
}

impl DType {
    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
            DType::U8 | DType::I8 => 1,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "f32"),
            DType::F16 => write!(f, "f16"),
            DType::U8 => write!(f, "u8"),
            DType::I8 => write!(f, "i8"),
        }
    }
}
