use half::f16;

use crate::dtype::DType;
use crate::element::Element;
use crate::error::{Result, TensorError};

/// CPU-side operand storage, one variant per supported element type.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    /// 32-bit floating point storage.
    F32(Vec<f32>),
    /// 16-bit floating point storage.
    F16(Vec<f16>),
    /// Unsigned 8-bit storage.
    U8(Vec<u8>),
    /// Signed 8-bit storage.
    I8(Vec<i8>),
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            CpuStorage::F32(v) => v.len(),
            CpuStorage::F16(v) => v.len(),
            CpuStorage::U8(v) => v.len(),
            CpuStorage::I8(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the storage in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.len() * self.dtype().size_in_bytes()
    }

    /// Create zero-filled storage for the given dtype and element count.
    pub fn zeros(dtype: DType, n: usize) -> Self {
        match dtype {
            DType::F32 => CpuStorage::F32(vec![0.0; n]),
            DType::F16 => CpuStorage::F16(vec![f16::ZERO; n]),
            DType::U8 => CpuStorage::U8(vec![0; n]),
            DType::I8 => CpuStorage::I8(vec![0; n]),
        }
    }

    /// Create storage from a typed vector.
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        T::into_storage(data)
    }

    /// Returns the data as a typed slice.
    ///
    /// # Errors
    /// Returns an error if `T` does not match the stored dtype.
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        T::slice(self).ok_or_else(|| TensorError::DTypeMismatch {
            expected: T::DTYPE.to_string(),
            got: self.dtype().to_string(),
        })
    }

    /// Returns the data as a mutable typed slice.
    ///
    /// # Errors
    /// Returns an error if `T` does not match the stored dtype.
    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T]> {
        let got = self.dtype();
        T::slice_mut(self).ok_or_else(|| TensorError::DTypeMismatch {
            expected: T::DTYPE.to_string(),
            got: got.to_string(),
        })
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::F16(_) => DType::F16,
            CpuStorage::U8(_) => DType::U8,
            CpuStorage::I8(_) => DType::I8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec() {
        let s = CpuStorage::from_vec(vec![1.0f32, 2.0, 3.0]);
        assert_eq!(s.len(), 3);
        assert!(!s.is_empty());
        assert_eq!(s.size_in_bytes(), 12);
        assert_eq!(s.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zeros() {
        let s = CpuStorage::zeros(DType::F16, 5);
        assert_eq!(s.len(), 5);
        assert_eq!(s.size_in_bytes(), 10);
        assert!(s.as_slice::<f16>().unwrap().iter().all(|v| *v == f16::ZERO));

        let s = CpuStorage::zeros(DType::I8, 3);
        assert_eq!(s.as_slice::<i8>().unwrap(), &[0, 0, 0]);
    }

    #[test]
    fn test_dtype_mismatch() {
        let mut s = CpuStorage::from_vec(vec![1u8, 2]);
        assert_eq!(s.dtype(), DType::U8);
        assert!(s.as_slice::<i8>().is_err());
        assert!(s.as_mut_slice::<f32>().is_err());
    }

    #[test]
    fn test_mut_slice() {
        let mut s = CpuStorage::from_vec(vec![1i8, 2]);
        let slice = s.as_mut_slice::<i8>().unwrap();
        slice[0] = -7;
        assert_eq!(s.as_slice::<i8>().unwrap()[0], -7);
    }
}
