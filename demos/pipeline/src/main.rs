//! Two-stage pipeline demo.
//!
//! Stage 0 produces a batch of float32 activations and ships it across a
//! tag-keyed edge; stage 1 receives the batch, then rescales and packs it
//! into one half-precision buffer.
//!
//! Run with `RUST_LOG=debug cargo run -p pipeline-demo` to watch the
//! per-message telemetry.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use weft_cast::{CastPlan, FusedLayout, MixedPrecisionScale};
use weft_exchange::{EdgePair, LocalEndpoint, LocalFabric};
use weft_tensor::{DType, Tensor};

const LOSS_SCALE: f32 = 2.0;

async fn stage0(endpoint: LocalEndpoint, pair: EdgePair) -> Result<()> {
    let batch = vec![
        Tensor::from_f32(vec![4], &[1.0, 2.0, 3.0, 4.0]),
        Tensor::from_f32(vec![6], &[0.5, 1.5, 2.5, 3.5, 4.5, 5.5]),
    ];
    info!(tensors = batch.len(), "stage 0: sending activations");
    pair.sender().send(&endpoint, &batch).await?;
    Ok(())
}

async fn stage1(endpoint: LocalEndpoint, pair: EdgePair) -> Result<()> {
    let batch = pair.receiver().recv(&endpoint).await?;
    info!(tensors = batch.len(), "stage 1: batch received");

    let op = MixedPrecisionScale::new(CastPlan::new(DType::Float16, true)?);
    let scale = Tensor::from_f32(vec![1], &[LOSS_SCALE]);
    let outputs = op.run(&scale, &batch)?;

    let counts: Vec<usize> = batch.iter().map(Tensor::numel).collect();
    let layout = FusedLayout::plan(&counts, DType::Float16.element_size());
    for index in 0..layout.len() {
        info!(
            region = index,
            byte_offset = layout.byte_offset(index),
            elements = layout.element_range(index).len(),
            "fused region"
        );
    }
    info!(
        total_elements = outputs[0].numel(),
        total_bytes = outputs[0].byte_size(),
        dtype = %outputs[0].dtype(),
        "stage 1: fused half-precision buffer ready"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let fabric = LocalFabric::new();
    let pair = EdgePair::new(0, 1, 42, vec![DType::Float32, DType::Float32])?;

    let producer = tokio::spawn(stage0(fabric.endpoint(0), pair.clone()));
    let consumer = tokio::spawn(stage1(fabric.endpoint(1), pair));

    producer.await??;
    consumer.await??;
    Ok(())
}
