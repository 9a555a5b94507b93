use thiserror::Error;

/// Wire-level errors: malformed envelopes, bodies, or frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("framing error: {0}")]
    Framing(String),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Node-level errors for peer operations.
#[derive(Debug, Error)]
pub enum P2pError {
    /// The node is not connected to the overlay network. Nothing was sent.
    #[error("not connected to p2p network")]
    NotConnected,

    #[error("send error: {0}")]
    Send(String),

    /// The reply channel closed before a response arrived.
    #[error("reply channel closed without a response")]
    ChannelClosed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Repo(#[from] strata_repo::RepoError),
}

pub type P2pResult<T> = Result<T, P2pError>;
