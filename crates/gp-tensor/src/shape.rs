use std::fmt;

/// An operand shape, wrapping a vector of dimension sizes.
///
/// Dimension 0 is the innermost (fastest varying) axis: for a GEMM operand
/// the dims read `[x, y, z]`, i.e. `[N, K, batch]` for the B matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of dimension `i`, or 1 for dimensions beyond the rank.
    ///
    /// A 2-D matrix is a 3-D operand with a single batch.
    pub fn dim(&self, i: usize) -> usize {
        self.dims.get(i).copied().unwrap_or(1)
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Computes dense byte strides for this shape, innermost dimension first.
    ///
    /// For a shape [d0, d1, d2] and element size `e`, the strides are
    /// [e, e*d0, e*d0*d1].
    pub fn contiguous_strides(&self, element_size: usize) -> Vec<usize> {
        let mut strides = Vec::with_capacity(self.dims.len());
        let mut acc = element_size;
        for &d in &self.dims {
            strides.push(acc);
            acc *= d;
        }
        strides
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}
