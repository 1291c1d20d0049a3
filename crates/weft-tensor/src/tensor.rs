//! Tensor values moved across pipeline edges.
//!
//! A [`Tensor`] is metadata plus a contiguous row-major byte payload held in
//! [`Bytes`], so handing one to a transport or slicing one out of a fused
//! buffer never copies element data.

use bytes::Bytes;
use half::f16;

use crate::dtype::{DType, Element};

/// Shape, element type, and optional name of a tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorMeta {
    /// Shape of the tensor (e.g., `[batch, hidden]`)
    pub shape: Vec<usize>,
    /// Element type
    pub dtype: DType,
    /// Optional human-readable name, carried through ops for logging
    pub name: Option<String>,
}

impl TensorMeta {
    /// Creates metadata with the given shape and element type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use weft_tensor::{TensorMeta, DType};
    ///
    /// let meta = TensorMeta::new(vec![32, 768], DType::Float32);
    /// assert_eq!(meta.numel(), 32 * 768);
    /// assert_eq!(meta.byte_size(), 32 * 768 * 4);
    /// ```
    pub fn new(shape: Vec<usize>, dtype: DType) -> Self {
        Self {
            shape,
            dtype,
            name: None,
        }
    }

    /// Sets a name for this tensor.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Total payload size in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.numel() * self.dtype.element_size()
    }

    /// Number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}

/// A tensor with owned, contiguous row-major data.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// Tensor metadata
    pub meta: TensorMeta,
    /// Raw element data
    pub data: Bytes,
}

impl Tensor {
    /// Creates a tensor from metadata and raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if the payload length disagrees with the metadata.
    pub fn new(meta: TensorMeta, data: Bytes) -> Self {
        assert_eq!(
            data.len(),
            meta.byte_size(),
            "payload is {} bytes but {:?} {} needs {}",
            data.len(),
            meta.shape,
            meta.dtype,
            meta.byte_size()
        );
        Self { meta, data }
    }

    /// Creates a Float32 tensor from a slice of values.
    pub fn from_f32(shape: Vec<usize>, data: &[f32]) -> Self {
        Self::from_elements(shape, data)
    }

    /// Creates a Float16 tensor from a slice of values.
    pub fn from_f16(shape: Vec<usize>, data: &[f16]) -> Self {
        Self::from_elements(shape, data)
    }

    /// Creates a Float64 tensor from a slice of values.
    pub fn from_f64(shape: Vec<usize>, data: &[f64]) -> Self {
        Self::from_elements(shape, data)
    }

    /// Creates a tensor of the element type `T` from a slice of values.
    ///
    /// # Panics
    ///
    /// Panics if the slice length disagrees with the shape.
    pub fn from_elements<T: Element>(shape: Vec<usize>, data: &[T]) -> Self {
        let meta = TensorMeta::new(shape, T::DTYPE);
        assert_eq!(data.len(), meta.numel(), "element count disagrees with shape");
        Self {
            data: Bytes::copy_from_slice(T::as_bytes(data)),
            meta,
        }
    }

    /// Creates a zero-filled tensor.
    pub fn zeros(meta: TensorMeta) -> Self {
        let data = Bytes::from(vec![0u8; meta.byte_size()]);
        Self { meta, data }
    }

    /// Total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.meta.numel()
    }

    /// Total payload size in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.meta.shape
    }

    /// Element type of the tensor.
    #[inline]
    pub fn dtype(&self) -> DType {
        self.meta.dtype
    }

    /// Views the payload as a slice of `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure `T` matches the tensor's dtype.
    pub unsafe fn as_slice<T: Element>(&self) -> &[T] {
        T::from_bytes(&self.data)
    }

    /// Views the payload as f32 values.
    ///
    /// # Panics
    ///
    /// Panics if the dtype is not Float32.
    pub fn as_f32(&self) -> &[f32] {
        assert_eq!(self.meta.dtype, DType::Float32, "tensor dtype must be float32");
        unsafe { self.as_slice::<f32>() }
    }

    /// Views the payload as f16 values.
    ///
    /// # Panics
    ///
    /// Panics if the dtype is not Float16.
    pub fn as_f16(&self) -> &[f16] {
        assert_eq!(self.meta.dtype, DType::Float16, "tensor dtype must be float16");
        unsafe { self.as_slice::<f16>() }
    }

    /// Views the payload as f64 values.
    ///
    /// # Panics
    ///
    /// Panics if the dtype is not Float64.
    pub fn as_f64(&self) -> &[f64] {
        assert_eq!(self.meta.dtype, DType::Float64, "tensor dtype must be float64");
        unsafe { self.as_slice::<f64>() }
    }
}
