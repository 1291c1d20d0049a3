//! Error taxonomy for the scale-and-cast stage.
//!
//! Destination problems are caught at plan construction, source problems at
//! the per-call dispatch. Nothing is coerced silently.

use weft_tensor::DType;

/// Errors surfaced by [`CastPlan`](crate::CastPlan) construction and
/// [`MixedPrecisionScale`](crate::MixedPrecisionScale) invocations.
#[derive(Debug, thiserror::Error)]
pub enum CastError {
    /// The destination type is outside the supported set.
    #[error("unsupported destination type: {0}")]
    UnsupportedDestination(DType),

    /// The destination type code does not name any known type.
    #[error("unsupported destination type code: {0}")]
    UnsupportedDestinationCode(u8),

    /// The source type has no wired cast path.
    #[error("unsupported source type: {0}")]
    UnsupportedSource(DType),

    /// The scale tensor must always be float32.
    #[error("scale tensor must be float32, got {0}")]
    ScaleType(DType),

    /// The scale tensor is neither a scalar nor shaped like the input.
    #[error("scale has {scale} elements, input {index} has {input}")]
    ScaleShape {
        index: usize,
        scale: usize,
        input: usize,
    },

    /// An invocation needs at least one input tensor besides the scale.
    #[error("no input tensors")]
    EmptyBatch,

    /// All inputs of one invocation must share a single source type.
    #[error("mixed source types: input 0 is {first}, input {index} is {actual}")]
    MixedSources {
        first: DType,
        index: usize,
        actual: DType,
    },
}
