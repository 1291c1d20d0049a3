//! Scale-and-cast element kernels.
//!
//! Every conversion goes through f32: widen, multiply by the scale, narrow to
//! the destination. Narrowing to f16 uses the hardware-default IEEE
//! round-to-nearest-even via the `half` crate.

use half::f16;

use weft_tensor::Element;

/// Element types the scale-cast kernel can read and write.
pub trait ScaleElem: Element {
    /// Widens to f32 for the multiply.
    fn into_f32(self) -> f32;

    /// Narrows an f32 product to this type.
    fn from_f32(value: f32) -> Self;
}

impl ScaleElem for f32 {
    #[inline(always)]
    fn into_f32(self) -> f32 {
        self
    }

    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value
    }
}

impl ScaleElem for f16 {
    #[inline(always)]
    fn into_f32(self) -> f32 {
        self.to_f32()
    }

    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        f16::from_f32(value)
    }
}

/// Writes `dst[i] = cast(src[i] * scale_i)` over one region.
///
/// `scale` is either a single element, broadcast over the region, or one
/// element per source element. The caller guarantees `src` and `dst` have
/// equal lengths and that `scale` is one of the two accepted shapes.
pub fn scale_cast<S: ScaleElem, D: ScaleElem>(src: &[S], scale: &[f32], dst: &mut [D]) {
    debug_assert_eq!(src.len(), dst.len());
    match *scale {
        [s] => {
            for (out, &x) in dst.iter_mut().zip(src) {
                *out = D::from_f32(x.into_f32() * s);
            }
        }
        _ => {
            debug_assert_eq!(scale.len(), src.len());
            for ((out, &x), &s) in dst.iter_mut().zip(src).zip(scale) {
                *out = D::from_f32(x.into_f32() * s);
            }
        }
    }
}
