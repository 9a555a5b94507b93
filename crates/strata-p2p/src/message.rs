use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Message type tag for the dataset list protocol.
pub const MT_DATASETS: &str = "list_datasets";

/// Message type tag for the peer profile protocol.
pub const MT_PROFILE: &str = "profile";

/// Reserved envelope header keys and values.
pub mod headers {
    pub const PHASE: &str = "phase";
    pub const PHASE_REQUEST: &str = "request";
    pub const PHASE_RESPONSE: &str = "response";
    /// String-encoded flag marking a request that originated over the
    /// legacy RPC transport ("true" / "false").
    pub const LEGACY_RPC: &str = "legacyRPC";
}

/// One message between two peers.
///
/// Ephemeral: an envelope exists only for the duration of a single
/// request/response exchange. The body is opaque bytes whose shape depends
/// on `mtype`; this protocol uses JSON bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub mtype: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl Envelope {
    /// Build a request envelope with a JSON-encoded body.
    pub fn request<B: Serialize>(mtype: &str, body: &B) -> ProtocolResult<Self> {
        let body =
            serde_json::to_vec(body).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        let mut headers = BTreeMap::new();
        headers.insert(headers::PHASE.to_string(), headers::PHASE_REQUEST.to_string());
        Ok(Self {
            mtype: mtype.to_string(),
            headers,
            body,
        })
    }

    /// Build the response to this envelope: same type, response phase,
    /// fresh JSON body.
    pub fn response<B: Serialize>(&self, body: &B) -> ProtocolResult<Self> {
        let body =
            serde_json::to_vec(body).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        let mut headers = BTreeMap::new();
        headers.insert(
            headers::PHASE.to_string(),
            headers::PHASE_RESPONSE.to_string(),
        );
        Ok(Self {
            mtype: self.mtype.clone(),
            headers,
            body,
        })
    }

    /// Add or replace a header.
    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_string(), value.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn phase(&self) -> Option<&str> {
        self.header(headers::PHASE)
    }

    pub fn is_request(&self) -> bool {
        self.phase() == Some(headers::PHASE_REQUEST)
    }

    /// Decode the JSON body.
    pub fn decode_body<T: DeserializeOwned>(&self) -> ProtocolResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}

/// The shareable half of a peer's identity, as sent over the wire.
///
/// Carries the profile ID, peername, and hex-encoded public key; private
/// key material never leaves the owning node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerProfile {
    pub id: strata_types::ProfileId,
    pub peername: String,
    pub pubkey: String,
}

impl PeerProfile {
    /// The wire form of a local profile.
    pub fn of(profile: &strata_types::Profile) -> Self {
        Self {
            id: profile.id.clone(),
            peername: profile.peername.clone(),
            pubkey: profile.public_key().to_hex(),
        }
    }
}

/// Options for requesting a peer's dataset list.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DatasetsListParams {
    #[serde(rename = "Limit")]
    pub limit: usize,
    #[serde(rename = "Offset")]
    pub offset: usize,
    /// Whether the caller sits behind the legacy RPC transport, which
    /// cannot carry nested open-ended schema maps.
    #[serde(rename = "LegacyRPC")]
    pub legacy_rpc: bool,
}
