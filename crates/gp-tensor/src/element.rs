use std::fmt::Debug;

use half::f16;

use crate::dtype::DType;
use crate::storage::CpuStorage;

/// A scalar type that can live in a `CpuStorage`.
///
/// `Default::default()` is the zero used to pad rearranged blocks.
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// The dtype tag for this scalar.
    const DTYPE: DType;

    /// Borrow the storage as `&[Self]` if the variant matches.
    fn slice(storage: &CpuStorage) -> Option<&[Self]>;

    /// Borrow the storage as `&mut [Self]` if the variant matches.
    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]>;

    /// Wrap a vector in the matching storage variant.
    fn into_storage(data: Vec<Self>) -> CpuStorage;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;

            fn slice(storage: &CpuStorage) -> Option<&[Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]> {
                match storage {
                    CpuStorage::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }

            fn into_storage(data: Vec<Self>) -> CpuStorage {
                CpuStorage::$variant(data)
            }
        }
    };
}

impl_element!(f32, F32);
impl_element!(f16, F16);
impl_element!(u8, U8);
impl_element!(i8, I8);
