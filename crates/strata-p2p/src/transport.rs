use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::P2pResult;
use crate::message::Envelope;

/// Overlay address of a peer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlated send/receive of envelopes to one remote peer.
///
/// The caller opens a fresh single-use reply channel per call and the
/// transport delivers at most one reply on it. Concurrent requests, even to
/// the same peer, are independent: there is no shared request-ID table to
/// corrupt. Callers wanting bounded latency wrap the reply await in their
/// own deadline (e.g. `tokio::time::timeout`).
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Send `envelope` to `to`, routing the eventual reply to `reply`.
    async fn send(
        &self,
        to: &PeerId,
        envelope: Envelope,
        reply: oneshot::Sender<Envelope>,
    ) -> P2pResult<()>;
}

/// Server-side handle for answering one inbound exchange.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Send a response on the stream the request arrived on.
    async fn send(&self, envelope: Envelope) -> P2pResult<()>;
}
