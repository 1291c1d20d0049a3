//! Error taxonomy for the batch exchange.
//!
//! Configuration errors are detected at construction, desynchronization at
//! receive time. Every failure is terminal for the current invocation;
//! recovery belongs to the orchestrating pipeline, not to the ops.

use weft_tensor::DType;

use crate::transport::TransportError;
use crate::Rank;

/// Errors surfaced by edge configuration and the send/recv ops.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Transport failure, propagated unchanged.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// An edge must declare at least one tensor slot.
    #[error("element type list is empty")]
    EmptyTypeList,

    /// A configured type code is not in the supported set.
    #[error("unsupported element type code: {0}")]
    UnsupportedTypeCode(u8),

    /// Both ends of the edge name the same rank.
    #[error("edge endpoints must differ, both are rank {0}")]
    SelfLoop(Rank),

    /// The batch handed to the sender disagrees with the declared list length.
    #[error("batch has {actual} tensors but {expected} element types are declared")]
    InputCount { expected: usize, actual: usize },

    /// A tensor handed to the sender disagrees with its declared slot type.
    #[error("input {index} is {actual} but its slot declares {declared}")]
    InputType {
        index: usize,
        declared: DType,
        actual: DType,
    },

    /// The peer's batch length disagrees with the declared list length,
    /// meaning the sender and receiver configurations diverged upstream.
    #[error(
        "protocol desynchronization: {expected} element types declared, \
         peer batch carries {actual} messages"
    )]
    Desync { expected: usize, actual: usize },

    /// The transport delivered messages out of send order.
    #[error("out-of-order message: expected sequence {expected}, received {actual}")]
    OutOfOrder { expected: u32, actual: u32 },

    /// A message's element type disagrees with the declared slot type.
    #[error("message {index} carries {received} but its slot declares {declared}")]
    TypeMismatch {
        index: usize,
        declared: DType,
        received: DType,
    },

    /// A message's payload length disagrees with its own metadata.
    #[error("message {index} payload is {actual} bytes, metadata implies {expected}")]
    SizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}
