use crate::element::Element;
use crate::error::{Result, TensorError};
use crate::info::TensorInfo;
use crate::storage::CpuStorage;

/// An operand backed by CPU storage.
///
/// The storage is a flat element buffer; `info` describes where each
/// logical coordinate lives inside it.
#[derive(Debug, Clone)]
pub struct Tensor {
    info: TensorInfo,
    storage: CpuStorage,
}

impl Tensor {
    /// Wrap existing data in an operand described by `info`.
    ///
    /// # Errors
    /// Fails if `T` does not match the info's dtype or `data` is too short
    /// to back every coordinate of `info`.
    pub fn from_vec<T: Element>(data: Vec<T>, info: TensorInfo) -> Result<Self> {
        if T::DTYPE != info.dtype() {
            return Err(TensorError::DTypeMismatch {
                expected: info.dtype().to_string(),
                got: T::DTYPE.to_string(),
            });
        }
        let needed = info.total_size_in_bytes();
        let got = data.len() * info.element_size();
        if got < needed {
            return Err(TensorError::BufferTooSmall { needed, got });
        }
        Ok(Tensor {
            info,
            storage: CpuStorage::from_vec(data),
        })
    }

    /// Allocate a zero-filled buffer large enough for `info`.
    ///
    /// # Errors
    /// Fails if the info's shape has not been set.
    pub fn allocate(info: TensorInfo) -> Result<Self> {
        if info.is_empty() {
            return Err(TensorError::Other(
                "cannot allocate an operand with an unset shape".to_string(),
            ));
        }
        let storage = CpuStorage::zeros(info.dtype(), info.total_size_in_elements());
        Ok(Tensor { info, storage })
    }

    /// Returns the operand metadata.
    pub fn info(&self) -> &TensorInfo {
        &self.info
    }

    /// Returns the whole backing buffer as a typed slice.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        self.storage.as_slice::<T>()
    }

    /// Returns the whole backing buffer as a mutable typed slice.
    pub fn data_mut<T: Element>(&mut self) -> Result<&mut [T]> {
        self.storage.as_mut_slice::<T>()
    }

    /// Read the element at `coords`.
    pub fn get<T: Element>(&self, coords: &[usize]) -> Result<T> {
        let index = self.info.offset_element_in_bytes(coords)? / self.info.element_size();
        let data = self.data::<T>()?;
        data.get(index).copied().ok_or(TensorError::BufferTooSmall {
            needed: (index + 1) * self.info.element_size(),
            got: self.storage.size_in_bytes(),
        })
    }

    /// Returns the underlying storage reference.
    pub fn storage(&self) -> &CpuStorage {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::shape::Shape;

    #[test]
    fn test_from_vec() {
        let info = TensorInfo::new(Shape::new(vec![3, 2]), DType::F32);
        let t = Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], info).unwrap();
        assert_eq!(t.get::<f32>(&[0, 1]).unwrap(), 4.0);
        assert_eq!(t.get::<f32>(&[2, 0]).unwrap(), 3.0);
        assert!(t.get::<f32>(&[3, 0]).is_err());
    }

    #[test]
    fn test_from_vec_too_short() {
        let info = TensorInfo::new(Shape::new(vec![3, 2]), DType::F32);
        assert!(Tensor::from_vec(vec![1.0f32; 5], info).is_err());
    }

    #[test]
    fn test_from_vec_wrong_dtype() {
        let info = TensorInfo::new(Shape::new(vec![2]), DType::I8);
        assert!(Tensor::from_vec(vec![1u8, 2], info).is_err());
    }

    #[test]
    fn test_allocate_padded() {
        let info = TensorInfo::new(Shape::new(vec![3, 2]), DType::U8)
            .with_strides_in_bytes(vec![1, 8])
            .unwrap()
            .with_offset_first_element_in_bytes(4)
            .unwrap();
        let t = Tensor::allocate(info).unwrap();
        assert_eq!(t.storage().len(), 4 + 8 + 3);
        assert!(t.data::<u8>().unwrap().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_allocate_empty_fails() {
        assert!(Tensor::allocate(TensorInfo::empty(DType::F32)).is_err());
    }

    #[test]
    fn test_data_mut() {
        let info = TensorInfo::new(Shape::new(vec![2]), DType::I8);
        let mut t = Tensor::allocate(info).unwrap();
        t.data_mut::<i8>().unwrap()[1] = -3;
        assert_eq!(t.get::<i8>(&[1]).unwrap(), -3);
    }
}
