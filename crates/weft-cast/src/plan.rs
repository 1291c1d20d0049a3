//! Cast configuration, validated at construction.

use weft_tensor::DType;

use crate::error::CastError;

/// Destination type and output layout of one cast stage.
///
/// The destination byte width is fixed here, once, so every later layout and
/// write decision is plain arithmetic. Destinations outside
/// {Float16, Float32} are rejected immediately: the cast paths for anything
/// else do not exist.
///
/// # Example
///
/// ```rust
/// use weft_cast::CastPlan;
/// use weft_tensor::DType;
///
/// let plan = CastPlan::new(DType::Float16, true)?;
/// assert_eq!(plan.bytes_per_output_elem(), 2);
/// assert!(CastPlan::new(DType::Float64, false).is_err());
/// # Ok::<(), weft_cast::CastError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastPlan {
    to: DType,
    fuse_outputs: bool,
    bytes_per_output_elem: usize,
}

impl CastPlan {
    /// Creates a plan casting to `to`, optionally packing all outputs into
    /// one fused buffer.
    pub fn new(to: DType, fuse_outputs: bool) -> Result<Self, CastError> {
        match to {
            DType::Float16 | DType::Float32 => Ok(Self {
                to,
                fuse_outputs,
                bytes_per_output_elem: to.element_size(),
            }),
            other => Err(CastError::UnsupportedDestination(other)),
        }
    }

    /// Creates a plan from a raw destination type code, as it appears in a
    /// serialized pipeline description.
    pub fn from_code(code: u8, fuse_outputs: bool) -> Result<Self, CastError> {
        let to = DType::from_code(code).ok_or(CastError::UnsupportedDestinationCode(code))?;
        Self::new(to, fuse_outputs)
    }

    /// Destination element type.
    #[inline]
    pub fn to(&self) -> DType {
        self.to
    }

    /// Whether outputs are packed into one contiguous buffer.
    #[inline]
    pub fn fuse_outputs(&self) -> bool {
        self.fuse_outputs
    }

    /// Byte width of one output element.
    #[inline]
    pub fn bytes_per_output_elem(&self) -> usize {
        self.bytes_per_output_elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_two_float_destinations() {
        let half = CastPlan::new(DType::Float16, false).unwrap();
        assert_eq!(half.to(), DType::Float16);
        assert_eq!(half.bytes_per_output_elem(), 2);
        assert!(!half.fuse_outputs());

        let single = CastPlan::new(DType::Float32, true).unwrap();
        assert_eq!(single.bytes_per_output_elem(), 4);
        assert!(single.fuse_outputs());
    }

    #[test]
    fn rejects_float64_destination() {
        assert!(matches!(
            CastPlan::new(DType::Float64, false),
            Err(CastError::UnsupportedDestination(DType::Float64))
        ));
    }

    #[test]
    fn rejects_unknown_destination_code() {
        assert!(matches!(
            CastPlan::from_code(17, false),
            Err(CastError::UnsupportedDestinationCode(17))
        ));
        assert_eq!(
            CastPlan::from_code(2, true).unwrap().to(),
            DType::Float16
        );
    }
}
