//! Transport contract and in-process loopback fabric.
//!
//! The exchange ops are written against the [`Transport`] trait and never see
//! how bytes actually move. An implementation owns reliability, flow control,
//! timeout, and cancellation; the one guarantee the ops require is that two
//! sends from the same source to the same destination under the same tag
//! arrive in send order.
//!
//! [`LocalFabric`] is the in-process implementation the tests and demos run
//! on: one unbounded channel per `(src, dst, tag)` route, created lazily.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

use weft_tensor::DType;

use crate::{Rank, Tag};

/// One wire message: one tensor of a batch, plus the metadata the receiving
/// side needs to place and interpret it.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Position of this tensor within its batch (0-indexed).
    pub seq: u32,
    /// Total number of tensors in the sender's batch.
    pub batch_len: u32,
    /// Element type of the payload.
    pub dtype: DType,
    /// Shape of the tensor; shapes travel here, not via a separate channel.
    pub shape: Vec<usize>,
    /// Raw element data.
    pub data: Bytes,
}

impl RawMessage {
    /// Declared element count, from the shape.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Payload size the metadata implies, in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.element_count() * self.dtype.element_size()
    }
}

/// Transport failures. Opaque to the exchange ops and propagated unchanged.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The route to the peer is closed.
    #[error("route to rank {peer} under tag {tag} is closed")]
    Closed { peer: Rank, tag: Tag },
}

/// Point-to-point message transport between ranks.
///
/// Implementations must deliver messages for one `(source, destination, tag)`
/// route in send order. Reliability and wire format are theirs to decide.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends one message to `peer` under `tag`.
    async fn send(&self, peer: Rank, tag: Tag, message: RawMessage)
        -> Result<(), TransportError>;

    /// Receives the next message from `peer` under `tag`, waiting until one
    /// arrives or the route fails.
    async fn recv(&self, peer: Rank, tag: Tag) -> Result<RawMessage, TransportError>;
}

type RouteKey = (Rank, Rank, Tag);

struct Route {
    tx: Option<UnboundedSender<RawMessage>>,
    rx: Arc<Mutex<UnboundedReceiver<RawMessage>>>,
}

impl Route {
    fn open() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Some(tx),
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

#[derive(Default)]
struct Shared {
    routes: Mutex<HashMap<RouteKey, Route>>,
}

impl Shared {
    async fn route_tx(&self, key: RouteKey) -> Option<UnboundedSender<RawMessage>> {
        let mut routes = self.routes.lock().await;
        routes.entry(key).or_insert_with(Route::open).tx.clone()
    }

    async fn route_rx(&self, key: RouteKey) -> Arc<Mutex<UnboundedReceiver<RawMessage>>> {
        let mut routes = self.routes.lock().await;
        routes.entry(key).or_insert_with(Route::open).rx.clone()
    }
}

/// In-process transport fabric connecting any number of ranks.
///
/// # Example
///
/// ```rust
/// use weft_exchange::LocalFabric;
///
/// let fabric = LocalFabric::new();
/// let stage0 = fabric.endpoint(0);
/// let stage1 = fabric.endpoint(1);
/// assert_eq!(stage0.rank(), 0);
/// assert_eq!(stage1.rank(), 1);
/// ```
#[derive(Default)]
pub struct LocalFabric {
    shared: Arc<Shared>,
}

impl LocalFabric {
    /// Creates an empty fabric.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this rank's view of the fabric.
    pub fn endpoint(&self, rank: Rank) -> LocalEndpoint {
        LocalEndpoint {
            rank,
            shared: Arc::clone(&self.shared),
        }
    }
}

/// One rank's handle on a [`LocalFabric`]. Cheap to clone; clones share the
/// underlying routes.
#[derive(Clone)]
pub struct LocalEndpoint {
    rank: Rank,
    shared: Arc<Shared>,
}

impl LocalEndpoint {
    /// The rank this endpoint speaks as.
    #[inline]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Closes the outgoing route to `peer` under `tag`. Messages already in
    /// flight are still delivered; further sends and receives on the drained
    /// route fail with [`TransportError::Closed`].
    pub async fn close(&self, peer: Rank, tag: Tag) {
        let mut routes = self.shared.routes.lock().await;
        routes
            .entry((self.rank, peer, tag))
            .or_insert_with(Route::open)
            .tx = None;
    }
}

impl Transport for LocalEndpoint {
    async fn send(
        &self,
        peer: Rank,
        tag: Tag,
        message: RawMessage,
    ) -> Result<(), TransportError> {
        let tx = self
            .shared
            .route_tx((self.rank, peer, tag))
            .await
            .ok_or(TransportError::Closed { peer, tag })?;
        tx.send(message)
            .map_err(|_| TransportError::Closed { peer, tag })
    }

    async fn recv(&self, peer: Rank, tag: Tag) -> Result<RawMessage, TransportError> {
        let rx = self.shared.route_rx((peer, self.rank, tag)).await;
        let mut rx = rx.lock().await;
        rx.recv().await.ok_or(TransportError::Closed { peer, tag })
    }
}
