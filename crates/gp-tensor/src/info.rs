use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Metadata for a strided operand: shape, element type, byte strides and
/// the byte offset of the first element inside the backing buffer.
///
/// An info with a rank-0 shape is "empty": its shape has not been decided
/// yet and may be filled in once with [`TensorInfo::auto_init_if_empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    shape: Shape,
    dtype: DType,
    strides_in_bytes: Vec<usize>,
    offset_first_element_in_bytes: usize,
}

impl TensorInfo {
    /// Create dense metadata for `shape` with no leading padding.
    pub fn new(shape: Shape, dtype: DType) -> Self {
        let strides_in_bytes = shape.contiguous_strides(dtype.size_in_bytes());
        TensorInfo {
            shape,
            dtype,
            strides_in_bytes,
            offset_first_element_in_bytes: 0,
        }
    }

    /// Create metadata whose shape is still undecided.
    pub fn empty(dtype: DType) -> Self {
        TensorInfo::new(Shape::default(), dtype)
    }

    /// Replace the byte strides, e.g. to describe padded rows.
    ///
    /// # Errors
    /// Fails if the stride count differs from the rank or a stride is not a
    /// whole number of elements.
    pub fn with_strides_in_bytes(mut self, strides: Vec<usize>) -> Result<Self> {
        if strides.len() != self.shape.ndim() {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: strides,
            });
        }
        let element_size = self.element_size();
        if let Some(&stride) = strides.iter().find(|s| *s % element_size != 0) {
            return Err(TensorError::MisalignedStride {
                stride,
                element_size,
            });
        }
        self.strides_in_bytes = strides;
        Ok(self)
    }

    /// Shift the first element `offset` bytes into the buffer.
    pub fn with_offset_first_element_in_bytes(mut self, offset: usize) -> Result<Self> {
        let element_size = self.element_size();
        if offset % element_size != 0 {
            return Err(TensorError::MisalignedStride {
                stride: offset,
                element_size,
            });
        }
        self.offset_first_element_in_bytes = offset;
        Ok(self)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn element_size(&self) -> usize {
        self.dtype.size_in_bytes()
    }

    /// True while the shape has not been set.
    pub fn is_empty(&self) -> bool {
        self.shape.ndim() == 0
    }

    /// Extent of dimension `i` (1 beyond the rank).
    pub fn dimension(&self, i: usize) -> usize {
        self.shape.dim(i)
    }

    pub fn strides_in_bytes(&self) -> &[usize] {
        &self.strides_in_bytes
    }

    /// Byte stride of dimension `i`.
    ///
    /// Dimensions beyond the rank have extent 1, so their stride is the
    /// span of the whole operand.
    pub fn stride_in_bytes(&self, i: usize) -> usize {
        match self.strides_in_bytes.get(i) {
            Some(&stride) => stride,
            None => match (self.strides_in_bytes.last(), self.shape.dims().last()) {
                (Some(&stride), Some(&dim)) => stride * dim,
                _ => self.element_size(),
            },
        }
    }

    pub fn offset_first_element_in_bytes(&self) -> usize {
        self.offset_first_element_in_bytes
    }

    /// Byte offset of the element at `coords` (innermost first), including
    /// the first-element offset.
    ///
    /// # Errors
    /// Fails if any coordinate is outside its dimension.
    pub fn offset_element_in_bytes(&self, coords: &[usize]) -> Result<usize> {
        let mut offset = self.offset_first_element_in_bytes;
        for (i, &c) in coords.iter().enumerate() {
            if c >= self.dimension(i) {
                return Err(TensorError::CoordinateOutOfBounds {
                    coords: coords.to_vec(),
                    shape: self.shape.dims().to_vec(),
                });
            }
            offset += c * self.stride_in_bytes(i);
        }
        Ok(offset)
    }

    /// Bytes a buffer must hold to back this operand.
    pub fn total_size_in_bytes(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        if self.shape.numel() == 0 {
            return self.offset_first_element_in_bytes;
        }
        let span: usize = self
            .shape
            .dims()
            .iter()
            .zip(&self.strides_in_bytes)
            .map(|(&d, &s)| (d - 1) * s)
            .sum();
        self.offset_first_element_in_bytes + span + self.element_size()
    }

    /// Elements a buffer must hold to back this operand.
    pub fn total_size_in_elements(&self) -> usize {
        self.total_size_in_bytes().div_ceil(self.element_size())
    }

    /// Set shape and dtype if no shape has been set yet.
    ///
    /// Returns true if the info was initialised by this call; an info that
    /// already has a shape is left untouched.
    pub fn auto_init_if_empty(&mut self, shape: Shape, dtype: DType) -> bool {
        if !self.is_empty() {
            return false;
        }
        *self = TensorInfo::new(shape, dtype);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_info() {
        let info = TensorInfo::new(Shape::new(vec![5, 3, 2]), DType::F32);
        assert_eq!(info.strides_in_bytes(), &[4, 20, 60]);
        assert_eq!(info.total_size_in_bytes(), 120);
        assert_eq!(info.total_size_in_elements(), 30);
        assert_eq!(info.offset_element_in_bytes(&[1, 2, 1]).unwrap(), 4 + 40 + 60);
    }

    #[test]
    fn test_padded_rows() {
        let info = TensorInfo::new(Shape::new(vec![3, 4]), DType::F16)
            .with_strides_in_bytes(vec![2, 16])
            .unwrap()
            .with_offset_first_element_in_bytes(6)
            .unwrap();
        assert_eq!(info.offset_element_in_bytes(&[0, 0]).unwrap(), 6);
        assert_eq!(info.offset_element_in_bytes(&[2, 3]).unwrap(), 6 + 4 + 48);
        // 6 + 2*2 + 3*16 + 2
        assert_eq!(info.total_size_in_bytes(), 60);
        assert_eq!(info.total_size_in_elements(), 30);
    }

    #[test]
    fn test_missing_dimensions() {
        let info = TensorInfo::new(Shape::new(vec![6, 2]), DType::U8);
        assert_eq!(info.dimension(2), 1);
        assert_eq!(info.stride_in_bytes(2), 12);
        assert_eq!(info.offset_element_in_bytes(&[0, 0, 0]).unwrap(), 0);
        assert!(info.offset_element_in_bytes(&[0, 0, 1]).is_err());
    }

    #[test]
    fn test_out_of_bounds() {
        let info = TensorInfo::new(Shape::new(vec![2, 2]), DType::F32);
        assert!(info.offset_element_in_bytes(&[2, 0]).is_err());
    }

    #[test]
    fn test_misaligned_stride() {
        let info = TensorInfo::new(Shape::new(vec![2, 2]), DType::F32);
        assert!(info.clone().with_strides_in_bytes(vec![4, 10]).is_err());
        assert!(info.clone().with_strides_in_bytes(vec![4]).is_err());
        assert!(info.with_offset_first_element_in_bytes(3).is_err());
    }

    #[test]
    fn test_auto_init_if_empty() {
        let mut info = TensorInfo::empty(DType::F32);
        assert!(info.is_empty());
        assert_eq!(info.total_size_in_bytes(), 0);
        assert!(info.auto_init_if_empty(Shape::new(vec![144]), DType::F32));
        assert_eq!(info.shape().dims(), &[144]);

        // A second call must not reshape.
        assert!(!info.auto_init_if_empty(Shape::new(vec![7]), DType::U8));
        assert_eq!(info.shape().dims(), &[144]);
        assert_eq!(info.dtype(), DType::F32);
    }

    #[test]
    fn test_zero_sized_dimension() {
        let info = TensorInfo::new(Shape::new(vec![0, 4]), DType::F32);
        assert_eq!(info.total_size_in_bytes(), 0);
    }
}
