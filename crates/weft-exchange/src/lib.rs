//! Tag-keyed batch tensor exchange between pipeline ranks.
//!
//! Moves an ordered batch of tensors from one logical rank to another over a
//! pluggable [`Transport`]. A numeric tag disambiguates concurrently in-flight
//! batches between the same rank pair, and an ordered element-type list,
//! fixed when the edge is configured rather than negotiated on the wire,
//! tells the receiving side how to interpret each message's bytes.
//!
//! Both ops of an edge come from one validated [`EdgePair`], so the sides
//! cannot silently disagree:
//!
//! ```rust
//! use weft_exchange::{EdgePair, LocalFabric};
//! use weft_tensor::{DType, Tensor};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), weft_exchange::ExchangeError> {
//! let fabric = LocalFabric::new();
//! let pair = EdgePair::new(0, 1, 42, vec![DType::Float32])?;
//!
//! let batch = vec![Tensor::from_f32(vec![4], &[1.0, 2.0, 3.0, 4.0])];
//! pair.sender().send(&fabric.endpoint(0), &batch).await?;
//!
//! let outputs = pair.receiver().recv(&fabric.endpoint(1)).await?;
//! assert_eq!(outputs[0].as_f32(), &[1.0, 2.0, 3.0, 4.0]);
//! # Ok(())
//! # }
//! ```
//!
//! An invocation either reconstructs the whole batch or fails with zero
//! outputs; desynchronization between the two sides of an edge is surfaced as
//! an error, never masked.

pub mod error;
pub mod pair;
pub mod recv;
pub mod send;
pub mod transport;

pub use error::ExchangeError;
pub use pair::EdgePair;
pub use recv::BatchReceiver;
pub use send::BatchSender;
pub use transport::{LocalEndpoint, LocalFabric, RawMessage, Transport, TransportError};

/// Logical identifier of a participant (compute device) in the exchange.
pub type Rank = u32;

/// Integer key disambiguating concurrent exchanges between the same rank pair.
pub type Tag = u64;
