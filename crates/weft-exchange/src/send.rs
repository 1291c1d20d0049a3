//! Send side of the batch exchange.

use tracing::{debug, trace};

use weft_tensor::{DType, Tensor};

use crate::error::ExchangeError;
use crate::transport::{RawMessage, Transport};
use crate::{Rank, Tag};

/// Sends an ordered batch of tensors to a peer rank under a fixed tag.
///
/// The declared element-type list is fixed at construction; each invocation
/// validates the whole batch against it before any bytes move, so a
/// misconfigured stage fails at the source instead of poisoning the wire.
#[derive(Debug, Clone)]
pub struct BatchSender {
    peer: Rank,
    tag: Tag,
    element_types: Vec<DType>,
}

impl BatchSender {
    /// Creates a sender towards `peer` under `tag`.
    ///
    /// Fails if the type list is empty.
    pub fn new(peer: Rank, tag: Tag, element_types: Vec<DType>) -> Result<Self, ExchangeError> {
        if element_types.is_empty() {
            return Err(ExchangeError::EmptyTypeList);
        }
        Ok(Self::from_parts(peer, tag, element_types))
    }

    pub(crate) fn from_parts(peer: Rank, tag: Tag, element_types: Vec<DType>) -> Self {
        Self {
            peer,
            tag,
            element_types,
        }
    }

    /// Destination rank.
    #[inline]
    pub fn peer(&self) -> Rank {
        self.peer
    }

    /// Tag this sender stamps on every batch.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Sends one batch: exactly one message per tensor, in slot order.
    ///
    /// Message `i` carries its position, the batch length, and the tensor's
    /// type and shape, which is everything the peer needs to reconstruct the
    /// batch or to prove the edge is desynchronized.
    pub async fn send<T: Transport>(
        &self,
        transport: &T,
        batch: &[Tensor],
    ) -> Result<(), ExchangeError> {
        if batch.len() != self.element_types.len() {
            return Err(ExchangeError::InputCount {
                expected: self.element_types.len(),
                actual: batch.len(),
            });
        }
        for (index, (tensor, &declared)) in batch.iter().zip(&self.element_types).enumerate() {
            if tensor.dtype() != declared {
                return Err(ExchangeError::InputType {
                    index,
                    declared,
                    actual: tensor.dtype(),
                });
            }
        }

        for (index, tensor) in batch.iter().enumerate() {
            let message = RawMessage {
                seq: index as u32,
                batch_len: batch.len() as u32,
                dtype: tensor.dtype(),
                shape: tensor.shape().to_vec(),
                data: tensor.data.clone(),
            };
            trace!(
                peer = self.peer,
                tag = self.tag,
                seq = index,
                dtype = %tensor.dtype(),
                bytes = tensor.byte_size(),
                "sending tensor"
            );
            transport.send(self.peer, self.tag, message).await?;
        }

        debug!(
            peer = self.peer,
            tag = self.tag,
            len = batch.len(),
            "batch sent"
        );
        Ok(())
    }
}
