//! Paired edge configuration.
//!
//! Both ops of one pipeline edge are derived from a single [`EdgePair`], so
//! the two sides cannot disagree about tag, direction, or element types. The
//! pair is validated once, at pipeline-build time, rather than trusted
//! implicitly at first dispatch.

use serde::{Deserialize, Serialize};

use weft_tensor::DType;

use crate::error::ExchangeError;
use crate::recv::BatchReceiver;
use crate::send::BatchSender;
use crate::{Rank, Tag};

/// Configuration of one pipeline edge: who sends, who receives, under which
/// tag, and the ordered element types of the batch.
///
/// # Example
///
/// ```rust
/// use weft_exchange::EdgePair;
/// use weft_tensor::DType;
///
/// let pair = EdgePair::new(0, 1, 42, vec![DType::Float32, DType::Float16])?;
/// let sender = pair.sender();
/// let receiver = pair.receiver();
/// assert_eq!(receiver.expected_len(), 2);
/// # Ok::<(), weft_exchange::ExchangeError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePair {
    src: Rank,
    dst: Rank,
    tag: Tag,
    element_types: Vec<DType>,
}

impl EdgePair {
    /// Creates a validated edge configuration.
    ///
    /// Fails if the type list is empty or both endpoints name the same rank.
    pub fn new(
        src: Rank,
        dst: Rank,
        tag: Tag,
        element_types: Vec<DType>,
    ) -> Result<Self, ExchangeError> {
        if element_types.is_empty() {
            return Err(ExchangeError::EmptyTypeList);
        }
        if src == dst {
            return Err(ExchangeError::SelfLoop(src));
        }
        Ok(Self {
            src,
            dst,
            tag,
            element_types,
        })
    }

    /// Creates a validated edge configuration from raw type codes, as they
    /// appear in a serialized pipeline description.
    pub fn from_codes(src: Rank, dst: Rank, tag: Tag, codes: &[u8]) -> Result<Self, ExchangeError> {
        let element_types = codes
            .iter()
            .map(|&code| DType::from_code(code).ok_or(ExchangeError::UnsupportedTypeCode(code)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(src, dst, tag, element_types)
    }

    /// Sending rank.
    #[inline]
    pub fn src(&self) -> Rank {
        self.src
    }

    /// Receiving rank.
    #[inline]
    pub fn dst(&self) -> Rank {
        self.dst
    }

    /// Tag disambiguating this edge's batches from other traffic between the
    /// same rank pair.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Declared element types, one per batch slot, in wire order.
    #[inline]
    pub fn element_types(&self) -> &[DType] {
        &self.element_types
    }

    /// The send op for the source side of this edge.
    pub fn sender(&self) -> BatchSender {
        BatchSender::from_parts(self.dst, self.tag, self.element_types.clone())
    }

    /// The receive op for the destination side of this edge.
    pub fn receiver(&self) -> BatchReceiver {
        BatchReceiver::from_parts(self.src, self.tag, self.element_types.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_type_list() {
        assert!(matches!(
            EdgePair::new(0, 1, 1, vec![]),
            Err(ExchangeError::EmptyTypeList)
        ));
    }

    #[test]
    fn rejects_self_loop() {
        assert!(matches!(
            EdgePair::new(3, 3, 1, vec![DType::Float32]),
            Err(ExchangeError::SelfLoop(3))
        ));
    }

    #[test]
    fn rejects_unknown_code() {
        assert!(matches!(
            EdgePair::from_codes(0, 1, 1, &[1, 9]),
            Err(ExchangeError::UnsupportedTypeCode(9))
        ));
    }

    #[test]
    fn codes_resolve_in_order() {
        let pair = EdgePair::from_codes(0, 1, 5, &[1, 2, 3]).unwrap();
        assert_eq!(
            pair.element_types(),
            &[DType::Float32, DType::Float16, DType::Float64]
        );
    }

    #[test]
    fn derived_ops_agree() {
        let pair = EdgePair::new(2, 5, 11, vec![DType::Float32, DType::Float64]).unwrap();
        let sender = pair.sender();
        let receiver = pair.receiver();

        assert_eq!(sender.peer(), 5);
        assert_eq!(receiver.peer(), 2);
        assert_eq!(sender.tag(), receiver.tag());
        assert_eq!(receiver.expected_len(), 2);
    }

    #[test]
    fn serde_round_trip() {
        let pair = EdgePair::new(0, 1, 7, vec![DType::Float16]).unwrap();
        let json = serde_json::to_string(&pair).unwrap();
        let back: EdgePair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
    }
}
