//! Mixed-precision scale-and-cast stage for pipeline batches.
//!
//! Takes N tensors of one source float type, multiplies each element by a
//! scale, and writes the result in the destination type, either as N
//! independent outputs or packed into a single fused buffer laid out by a
//! prefix sum over element counts. The supported type set is closed:
//! destinations are {Float16, Float32}, checked when the [`CastPlan`] is
//! built; sources are the same pair, checked when a batch is dispatched.
//!
//! ```rust
//! use weft_cast::{CastPlan, FusedLayout, MixedPrecisionScale};
//! use weft_tensor::{DType, Tensor};
//!
//! let op = MixedPrecisionScale::new(CastPlan::new(DType::Float16, true)?);
//! let scale = Tensor::from_f32(vec![1], &[2.0]);
//! let inputs = vec![
//!     Tensor::from_f32(vec![4], &[1.0, 2.0, 3.0, 4.0]),
//!     Tensor::from_f32(vec![6], &[0.5, 1.5, 2.5, 3.5, 4.5, 5.5]),
//! ];
//!
//! let outputs = op.run(&scale, &inputs)?;
//! assert_eq!(outputs.len(), 1);
//! assert_eq!(outputs[0].shape(), &[10]);
//!
//! // The packed regions are recomputable without running the op.
//! let layout = FusedLayout::plan(&[4, 6], DType::Float16.element_size());
//! assert_eq!(layout.byte_offset(1), 8);
//! # Ok::<(), weft_cast::CastError>(())
//! ```

pub mod error;
pub mod kernel;
pub mod layout;
pub mod op;
pub mod plan;

pub use error::CastError;
pub use kernel::{scale_cast, ScaleElem};
pub use layout::FusedLayout;
pub use op::MixedPrecisionScale;
pub use plan::CastPlan;
