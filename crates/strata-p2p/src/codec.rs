use crate::error::{ProtocolError, ProtocolResult};
use crate::message::Envelope;

/// Upper bound on a single framed message.
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// Frames envelopes for the wire: `[4 bytes BE length][bincode payload]`.
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    pub fn encode(envelope: &Envelope) -> ProtocolResult<Vec<u8>> {
        let payload = bincode::serialize(envelope)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let mut buf = Vec::with_capacity(4 + payload.len());
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Decode one framed envelope. Returns the envelope and bytes consumed.
    pub fn decode(data: &[u8]) -> ProtocolResult<(Envelope, usize)> {
        if data.len() < 4 {
            return Err(ProtocolError::Framing("too short".into()));
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len == 0 {
            return Err(ProtocolError::Framing("zero-length frame".into()));
        }
        if len > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: len,
                max: MAX_MESSAGE_SIZE,
            });
        }
        let total = 4 + len;
        if data.len() < total {
            return Err(ProtocolError::Framing(format!(
                "incomplete: have {}, need {}",
                data.len(),
                total
            )));
        }
        let envelope: Envelope = bincode::deserialize(&data[4..total])
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        Ok((envelope, total))
    }
}
