//! Element types for tensors crossing a pipeline edge.
//!
//! The set is closed: the exchange sizes and reinterprets exactly these three
//! floating-point formats. Anything else is rejected by the components that
//! consume a type code, carrying the offending value in their error.

use half::f16;
use serde::{Deserialize, Serialize};

/// Element type of a tensor.
///
/// Each variant maps to a fixed byte width and a concrete Rust element type
/// (see [`Element`]). The discriminant doubles as the wire/config code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DType {
    /// 32-bit IEEE 754 floating point
    Float32 = 1,
    /// 16-bit IEEE 754 floating point
    Float16 = 2,
    /// 64-bit IEEE 754 floating point
    Float64 = 3,
}

impl DType {
    /// Size in bytes of a single element of this type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use weft_tensor::DType;
    ///
    /// assert_eq!(DType::Float32.element_size(), 4);
    /// assert_eq!(DType::Float16.element_size(), 2);
    /// assert_eq!(DType::Float64.element_size(), 8);
    /// ```
    #[inline]
    pub const fn element_size(&self) -> usize {
        match self {
            DType::Float64 => 8,
            DType::Float32 => 4,
            DType::Float16 => 2,
        }
    }

    /// Human-readable name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            DType::Float32 => "float32",
            DType::Float16 => "float16",
            DType::Float64 => "float64",
        }
    }

    /// Numeric code used in edge configuration and message metadata.
    #[inline]
    pub const fn code(&self) -> u8 {
        *self as u8
    }

    /// Looks up a type by its code. Unknown codes are `None`; the caller
    /// decides how to surface them.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(DType::Float32),
            2 => Some(DType::Float16),
            3 => Some(DType::Float64),
            _ => None,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Types usable as tensor elements.
///
/// Bridges the [`DType`] tag to the concrete Rust representation, with raw
/// reinterpretation in both directions for zero-copy wire handling.
pub trait Element: Copy + Default + Send + Sync + 'static {
    /// The tag corresponding to this element type.
    const DTYPE: DType;

    /// Reinterpret bytes as a slice of this element type.
    ///
    /// # Safety
    /// The bytes must be properly aligned for this type and have a length
    /// that is a multiple of the element size.
    unsafe fn from_bytes(bytes: &[u8]) -> &[Self];

    /// Reinterpret mutable bytes as a mutable slice of this element type.
    ///
    /// # Safety
    /// The bytes must be properly aligned for this type and have a length
    /// that is a multiple of the element size.
    unsafe fn from_bytes_mut(bytes: &mut [u8]) -> &mut [Self];

    /// View a slice of this element type as raw bytes.
    fn as_bytes(slice: &[Self]) -> &[u8];
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            unsafe fn from_bytes(bytes: &[u8]) -> &[Self] {
                std::slice::from_raw_parts(
                    bytes.as_ptr() as *const Self,
                    bytes.len() / std::mem::size_of::<Self>(),
                )
            }

            unsafe fn from_bytes_mut(bytes: &mut [u8]) -> &mut [Self] {
                std::slice::from_raw_parts_mut(
                    bytes.as_mut_ptr() as *mut Self,
                    bytes.len() / std::mem::size_of::<Self>(),
                )
            }

            fn as_bytes(slice: &[Self]) -> &[u8] {
                unsafe {
                    std::slice::from_raw_parts(
                        slice.as_ptr() as *const u8,
                        slice.len() * std::mem::size_of::<Self>(),
                    )
                }
            }
        }
    };
}

impl_element!(f32, DType::Float32);
impl_element!(f16, DType::Float16);
impl_element!(f64, DType::Float64);
