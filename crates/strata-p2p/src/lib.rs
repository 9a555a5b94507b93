//! Peer messaging for Strata.
//!
//! Peers exchange typed [`Envelope`]s over a [`PeerTransport`]. Each
//! request opens its own single-use reply channel, and the transport
//! guarantees at most one delivered reply per channel, so there is no
//! request-ID multiplexing at this layer. Two protocols are defined here:
//! `list_datasets` (ask a peer for its dataset refs, with inline dataset
//! snapshots attached) and `profile` (ask a peer who it is).

pub mod codec;
pub mod error;
pub mod message;
pub mod node;
pub mod transport;

pub use codec::{EnvelopeCodec, MAX_MESSAGE_SIZE};
pub use error::{P2pError, P2pResult, ProtocolError, ProtocolResult};
pub use message::{headers, DatasetsListParams, Envelope, PeerProfile, MT_DATASETS, MT_PROFILE};
pub use node::{Node, LIST_MAX};
pub use transport::{PeerId, PeerTransport, ReplySink};
