//! The scale-and-cast op.

use bytes::Bytes;
use half::f16;
use tracing::debug;

use weft_tensor::{DType, Element, Tensor, TensorMeta};

use crate::error::CastError;
use crate::kernel::{scale_cast, ScaleElem};
use crate::layout::FusedLayout;
use crate::plan::CastPlan;

/// Rescales a batch of tensors and casts them to the plan's destination type.
///
/// One invocation reads a float32 scale tensor and N inputs sharing a single
/// source type. It produces N independently shaped outputs, or one flat
/// buffer whose regions follow [`FusedLayout`] when the plan fuses.
/// The cast paths form a closed set over {Float32, Float16}; a source outside
/// it fails at the dispatch, an unsupported destination never gets past
/// [`CastPlan`] construction.
///
/// # Example
///
/// ```rust
/// use weft_cast::{CastPlan, MixedPrecisionScale};
/// use weft_tensor::{DType, Tensor};
///
/// let op = MixedPrecisionScale::new(CastPlan::new(DType::Float16, false)?);
/// let scale = Tensor::from_f32(vec![1], &[2.0]);
/// let inputs = vec![Tensor::from_f32(vec![2], &[1.0, 3.0])];
///
/// let outputs = op.run(&scale, &inputs)?;
/// assert_eq!(outputs[0].as_f16()[1].to_f32(), 6.0);
/// # Ok::<(), weft_cast::CastError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MixedPrecisionScale {
    plan: CastPlan,
}

impl MixedPrecisionScale {
    /// Creates the op from a validated plan.
    pub fn new(plan: CastPlan) -> Self {
        Self { plan }
    }

    /// The plan this op was built with.
    #[inline]
    pub fn plan(&self) -> &CastPlan {
        &self.plan
    }

    /// Runs one invocation over `inputs`, scaled by `scale`.
    ///
    /// `scale` must be float32 and either a single element (broadcast) or
    /// match each input's element count. With fused outputs the result is a
    /// one-element vector holding the packed buffer; otherwise one output per
    /// input, shaped like it.
    pub fn run(&self, scale: &Tensor, inputs: &[Tensor]) -> Result<Vec<Tensor>, CastError> {
        if inputs.is_empty() {
            return Err(CastError::EmptyBatch);
        }
        if scale.dtype() != DType::Float32 {
            return Err(CastError::ScaleType(scale.dtype()));
        }

        let source = inputs[0].dtype();
        for (index, input) in inputs.iter().enumerate() {
            if input.dtype() != source {
                return Err(CastError::MixedSources {
                    first: source,
                    index,
                    actual: input.dtype(),
                });
            }
            if scale.numel() != 1 && scale.numel() != input.numel() {
                return Err(CastError::ScaleShape {
                    index,
                    scale: scale.numel(),
                    input: input.numel(),
                });
            }
        }

        debug!(
            source = %source,
            to = %self.plan.to(),
            fused = self.plan.fuse_outputs(),
            inputs = inputs.len(),
            "scale-cast batch"
        );

        let scale_data = scale.as_f32();
        match (source, self.plan.to()) {
            (DType::Float32, DType::Float16) => self.run_typed::<f32, f16>(scale_data, inputs),
            (DType::Float32, DType::Float32) => self.run_typed::<f32, f32>(scale_data, inputs),
            (DType::Float16, DType::Float16) => self.run_typed::<f16, f16>(scale_data, inputs),
            (DType::Float16, DType::Float32) => self.run_typed::<f16, f32>(scale_data, inputs),
            (other, _) => Err(CastError::UnsupportedSource(other)),
        }
    }

    fn run_typed<S: ScaleElem, D: ScaleElem>(
        &self,
        scale: &[f32],
        inputs: &[Tensor],
    ) -> Result<Vec<Tensor>, CastError> {
        if self.plan.fuse_outputs() {
            let counts: Vec<usize> = inputs.iter().map(Tensor::numel).collect();
            let layout = FusedLayout::plan(&counts, self.plan.bytes_per_output_elem());

            // Regions are disjoint, so the per-input writes are independent.
            let mut fused = vec![D::default(); layout.total_elements()];
            for (index, input) in inputs.iter().enumerate() {
                // Source type was pinned by the dispatch arm.
                let src = unsafe { input.as_slice::<S>() };
                scale_cast(src, scale, &mut fused[layout.element_range(index)]);
            }

            let meta = TensorMeta::new(vec![layout.total_elements()], D::DTYPE);
            Ok(vec![Tensor::new(
                meta,
                Bytes::copy_from_slice(D::as_bytes(&fused)),
            )])
        } else {
            inputs
                .iter()
                .map(|input| {
                    let src = unsafe { input.as_slice::<S>() };
                    let mut out = vec![D::default(); input.numel()];
                    scale_cast(src, scale, &mut out);

                    let mut meta = TensorMeta::new(input.shape().to_vec(), D::DTYPE);
                    if let Some(name) = &input.meta.name {
                        meta = meta.with_name(name.clone());
                    }
                    Ok(Tensor::new(meta, Bytes::copy_from_slice(D::as_bytes(&out))))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(to: DType, fuse: bool) -> MixedPrecisionScale {
        MixedPrecisionScale::new(CastPlan::new(to, fuse).unwrap())
    }

    #[test]
    fn unfused_outputs_keep_input_shapes() {
        let scale = Tensor::from_f32(vec![1], &[2.0]);
        let inputs = vec![
            Tensor::from_f32(vec![2, 2], &[1.0, 2.0, 3.0, 4.0]),
            Tensor::from_f32(vec![3], &[0.5, 1.5, 2.5]),
        ];

        let outputs = op(DType::Float16, false).run(&scale, &inputs).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].shape(), &[2, 2]);
        assert_eq!(outputs[1].shape(), &[3]);
        let first: Vec<f32> = outputs[0].as_f16().iter().map(|v| v.to_f32()).collect();
        assert_eq!(first, [2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn fused_two_inputs_to_float16() {
        let scale = Tensor::from_f32(vec![1], &[2.0]);
        let inputs = vec![
            Tensor::from_f32(vec![4], &[1.0, 2.0, 3.0, 4.0]),
            Tensor::from_f32(vec![6], &[0.5, 1.5, 2.5, 3.5, 4.5, 5.5]),
        ];

        let fused = op(DType::Float16, true).run(&scale, &inputs).unwrap();
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].shape(), &[10]);
        assert_eq!(fused[0].byte_size(), 20);

        // Region offsets come straight from the layout: 0 and 4 * 2 bytes.
        let layout = FusedLayout::plan(&[4, 6], 2);
        assert_eq!(layout.byte_offset(0), 0);
        assert_eq!(layout.byte_offset(1), 8);

        // Each region reads back as the unfused result for that input.
        let unfused = op(DType::Float16, false).run(&scale, &inputs).unwrap();
        for index in 0..inputs.len() {
            assert_eq!(
                &fused[0].data[layout.byte_range(index)],
                &unfused[index].data[..]
            );
        }
    }

    #[test]
    fn single_input_fusion_degenerates_to_unfused() {
        let scale = Tensor::from_f32(vec![1], &[3.0]);
        let inputs = vec![Tensor::from_f32(vec![4], &[1.0, -1.0, 2.0, -2.0])];

        let fused = op(DType::Float16, true).run(&scale, &inputs).unwrap();
        let unfused = op(DType::Float16, false).run(&scale, &inputs).unwrap();

        assert_eq!(fused[0].shape(), unfused[0].shape());
        assert_eq!(fused[0].data, unfused[0].data);
    }

    #[test]
    fn identity_cast_with_unit_scale() {
        let scale = Tensor::from_f32(vec![1], &[1.0]);
        let values = [0.125f32, -7.75, 42.0, 1e-3];
        let inputs = vec![Tensor::from_f32(vec![4], &values)];

        let outputs = op(DType::Float32, false).run(&scale, &inputs).unwrap();
        assert_eq!(outputs[0].as_f32(), &values);

        let halves: Vec<f16> = values.iter().map(|&v| f16::from_f32(v)).collect();
        let inputs = vec![Tensor::from_f16(vec![4], &halves)];
        let outputs = op(DType::Float16, false).run(&scale, &inputs).unwrap();
        assert_eq!(outputs[0].as_f16(), &halves[..]);
    }

    #[test]
    fn widening_float16_to_float32() {
        let scale = Tensor::from_f32(vec![1], &[2.0]);
        let halves: Vec<f16> = [0.5f32, 1.5].iter().map(|&v| f16::from_f32(v)).collect();
        let inputs = vec![Tensor::from_f16(vec![2], &halves)];

        let outputs = op(DType::Float32, false).run(&scale, &inputs).unwrap();
        assert_eq!(outputs[0].as_f32(), &[1.0, 3.0]);
    }

    #[test]
    fn elementwise_scale_must_match_each_input() {
        let scale = Tensor::from_f32(vec![2], &[1.0, 2.0]);
        let inputs = vec![
            Tensor::from_f32(vec![2], &[1.0, 1.0]),
            Tensor::from_f32(vec![3], &[1.0, 1.0, 1.0]),
        ];

        assert!(matches!(
            op(DType::Float32, false).run(&scale, &inputs),
            Err(CastError::ScaleShape {
                index: 1,
                scale: 2,
                input: 3
            })
        ));
    }

    #[test]
    fn rejects_empty_batch_and_bad_scale_type() {
        let op = op(DType::Float16, false);

        let scale = Tensor::from_f32(vec![1], &[1.0]);
        assert!(matches!(op.run(&scale, &[]), Err(CastError::EmptyBatch)));

        let bad_scale = Tensor::from_f16(vec![1], &[f16::from_f32(1.0)]);
        let inputs = vec![Tensor::from_f32(vec![1], &[1.0])];
        assert!(matches!(
            op.run(&bad_scale, &inputs),
            Err(CastError::ScaleType(DType::Float16))
        ));
    }

    #[test]
    fn rejects_mixed_and_unsupported_sources() {
        let scale = Tensor::from_f32(vec![1], &[1.0]);
        let op = op(DType::Float32, false);

        let mixed = vec![
            Tensor::from_f32(vec![1], &[1.0]),
            Tensor::from_f16(vec![1], &[f16::from_f32(1.0)]),
        ];
        assert!(matches!(
            op.run(&scale, &mixed),
            Err(CastError::MixedSources { index: 1, .. })
        ));

        let doubles = vec![Tensor::from_f64(vec![1], &[1.0])];
        assert!(matches!(
            op.run(&scale, &doubles),
            Err(CastError::UnsupportedSource(DType::Float64))
        ));
    }
}
