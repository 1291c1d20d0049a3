//! Element types and tensor values for the weft pipeline exchange.
//!
//! This crate is the shared vocabulary of the workspace: the closed set of
//! element types a pipeline edge can carry, the byte-width table for sizing
//! wire payloads and fused buffers, and a contiguous [`Tensor`] value backed
//! by [`bytes::Bytes`] for zero-copy hand-off to a transport.
//!
//! # Example
//!
//! ```rust
//! use weft_tensor::{DType, Tensor};
//!
//! let tensor = Tensor::from_f32(vec![2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(tensor.dtype(), DType::Float32);
//! assert_eq!(tensor.byte_size(), 24);
//! ```

pub mod dtype;
pub mod tensor;

pub use dtype::{DType, Element};
pub use tensor::{Tensor, TensorMeta};

/// Re-export of the half-precision float type used by [`DType::Float16`].
pub use half::f16;
