//! Receive side of the batch exchange.

use tracing::{debug, trace};

use weft_tensor::{DType, Tensor, TensorMeta};

use crate::error::ExchangeError;
use crate::transport::Transport;
use crate::{Rank, Tag};

/// Receives an ordered batch of tensors from a peer rank under a fixed tag.
///
/// The element-type list is fixed at construction and defines both the batch
/// length and the type used to interpret each message's bytes. Arrival order
/// is the only correspondence between wire messages and output slots, so the
/// receives run strictly one after another.
#[derive(Debug, Clone)]
pub struct BatchReceiver {
    peer: Rank,
    tag: Tag,
    element_types: Vec<DType>,
}

impl BatchReceiver {
    /// Creates a receiver listening to `peer` under `tag`.
    ///
    /// Fails if the type list is empty.
    pub fn new(peer: Rank, tag: Tag, element_types: Vec<DType>) -> Result<Self, ExchangeError> {
        if element_types.is_empty() {
            return Err(ExchangeError::EmptyTypeList);
        }
        Ok(Self::from_parts(peer, tag, element_types))
    }

    /// Creates a receiver from raw type codes, rejecting codes outside the
    /// supported set with the offending value.
    pub fn from_codes(peer: Rank, tag: Tag, codes: &[u8]) -> Result<Self, ExchangeError> {
        let element_types = codes
            .iter()
            .map(|&code| DType::from_code(code).ok_or(ExchangeError::UnsupportedTypeCode(code)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(peer, tag, element_types)
    }

    pub(crate) fn from_parts(peer: Rank, tag: Tag, element_types: Vec<DType>) -> Self {
        Self {
            peer,
            tag,
            element_types,
        }
    }

    /// Source rank.
    #[inline]
    pub fn peer(&self) -> Rank {
        self.peer
    }

    /// Tag this receiver listens under.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Number of tensors one invocation produces.
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.element_types.len()
    }

    /// Receives one batch: exactly N receives in slot order, then either all
    /// N tensors or an error and none.
    ///
    /// Each message is checked against the declared list before its bytes are
    /// adopted: the peer's batch length must match N, the sequence number
    /// must match the slot, the carried type must match the declared type,
    /// and the payload length must match the metadata. The first check that
    /// fails aborts the invocation.
    pub async fn recv<T: Transport>(&self, transport: &T) -> Result<Vec<Tensor>, ExchangeError> {
        let expected = self.element_types.len();
        let mut outputs = Vec::with_capacity(expected);

        for (index, &declared) in self.element_types.iter().enumerate() {
            let message = transport.recv(self.peer, self.tag).await?;

            if message.batch_len as usize != expected {
                return Err(ExchangeError::Desync {
                    expected,
                    actual: message.batch_len as usize,
                });
            }
            if message.seq as usize != index {
                return Err(ExchangeError::OutOfOrder {
                    expected: index as u32,
                    actual: message.seq,
                });
            }
            if message.dtype != declared {
                return Err(ExchangeError::TypeMismatch {
                    index,
                    declared,
                    received: message.dtype,
                });
            }

            let meta = TensorMeta::new(message.shape, declared);
            if message.data.len() != meta.byte_size() {
                return Err(ExchangeError::SizeMismatch {
                    index,
                    expected: meta.byte_size(),
                    actual: message.data.len(),
                });
            }

            trace!(
                peer = self.peer,
                tag = self.tag,
                seq = index,
                dtype = %declared,
                bytes = message.data.len(),
                "received tensor"
            );
            outputs.push(Tensor::new(meta, message.data));
        }

        debug!(
            peer = self.peer,
            tag = self.tag,
            len = outputs.len(),
            "batch received"
        );
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::EdgePair;
    use crate::send::BatchSender;
    use crate::transport::LocalFabric;
    use weft_tensor::f16;

    #[test]
    fn construction_rejects_unknown_code() {
        assert!(matches!(
            BatchReceiver::from_codes(0, 1, &[1, 200]),
            Err(ExchangeError::UnsupportedTypeCode(200))
        ));
        assert!(matches!(
            BatchReceiver::new(0, 1, vec![]),
            Err(ExchangeError::EmptyTypeList)
        ));
    }

    #[tokio::test]
    async fn round_trip_preserves_bits_and_order() {
        let fabric = LocalFabric::new();
        let pair = EdgePair::new(
            0,
            1,
            42,
            vec![DType::Float32, DType::Float16, DType::Float64],
        )
        .unwrap();

        let halves: Vec<f16> = [0.5f32, 1.5, -2.0].iter().map(|&v| f16::from_f32(v)).collect();
        let batch = vec![
            Tensor::from_f32(vec![2, 2], &[1.0, -2.0, 3.5, 0.25]),
            Tensor::from_f16(vec![3], &halves),
            Tensor::from_f64(vec![1], &[std::f64::consts::PI]),
        ];

        pair.sender()
            .send(&fabric.endpoint(0), &batch)
            .await
            .unwrap();
        let outputs = pair.receiver().recv(&fabric.endpoint(1)).await.unwrap();

        assert_eq!(outputs.len(), 3);
        for (sent, received) in batch.iter().zip(&outputs) {
            assert_eq!(received.shape(), sent.shape());
            assert_eq!(received.dtype(), sent.dtype());
            assert_eq!(received.data, sent.data);
        }
    }

    #[tokio::test]
    async fn round_trip_across_tasks() {
        let fabric = LocalFabric::new();
        let pair = EdgePair::new(0, 1, 9, vec![DType::Float32]).unwrap();

        let sender = pair.sender();
        let src = fabric.endpoint(0);
        let producer = tokio::spawn(async move {
            let batch = vec![Tensor::from_f32(vec![4], &[1.0, 2.0, 3.0, 4.0])];
            sender.send(&src, &batch).await
        });

        let outputs = pair.receiver().recv(&fabric.endpoint(1)).await.unwrap();
        producer.await.unwrap().unwrap();

        assert_eq!(outputs[0].as_f32(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[tokio::test]
    async fn short_batch_is_desynchronization() {
        let fabric = LocalFabric::new();

        // Mismatched configurations: the sender ships a 1-tensor batch, the
        // receiver declares two slots.
        let sender = BatchSender::new(1, 7, vec![DType::Float32]).unwrap();
        let receiver =
            BatchReceiver::new(0, 7, vec![DType::Float32, DType::Float16]).unwrap();

        let batch = vec![Tensor::from_f32(vec![2], &[1.0, 2.0])];
        sender.send(&fabric.endpoint(0), &batch).await.unwrap();

        let result = receiver.recv(&fabric.endpoint(1)).await;
        assert!(matches!(
            result,
            Err(ExchangeError::Desync {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn declared_type_mismatch_is_detected() {
        let fabric = LocalFabric::new();

        let sender = BatchSender::new(1, 8, vec![DType::Float32]).unwrap();
        let receiver = BatchReceiver::new(0, 8, vec![DType::Float16]).unwrap();

        let batch = vec![Tensor::from_f32(vec![2], &[1.0, 2.0])];
        sender.send(&fabric.endpoint(0), &batch).await.unwrap();

        assert!(matches!(
            receiver.recv(&fabric.endpoint(1)).await,
            Err(ExchangeError::TypeMismatch {
                index: 0,
                declared: DType::Float16,
                received: DType::Float32,
            })
        ));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let fabric = LocalFabric::new();
        let receiver = BatchReceiver::new(0, 5, vec![DType::Float32]).unwrap();

        fabric.endpoint(0).close(1, 5).await;

        assert!(matches!(
            receiver.recv(&fabric.endpoint(1)).await,
            Err(ExchangeError::Transport(_))
        ));
    }
}
