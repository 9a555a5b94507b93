use std::fmt;

use serde::{Deserialize, Serialize};
use strata_crypto::{SigningKey, VerifyingKey};

use crate::error::TypeError;

/// Persistent identity of a peer.
///
/// Derived deterministically from the peer's public key with BLAKE3, so the
/// same keypair always yields the same identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId {
    hash: [u8; 32],
}

impl ProfileId {
    /// Derive a profile ID from a public key.
    pub fn derive(key: &VerifyingKey) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"strata-profile-v1:");
        hasher.update(&key.to_bytes());
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Build from a raw 32-byte hash. Prefer `derive()` outside tests.
    pub fn from_raw(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("pro:{}", hex::encode(&self.hash[..4]))
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("pro:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { hash: arr })
    }
}

impl fmt::Debug for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProfileId({})", self.short_id())
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

/// The local peer's identity: who we are and what we can sign with.
///
/// Exactly one profile is active per engine instance. Engines read it, they
/// never mutate it.
#[derive(Clone, Debug)]
pub struct Profile {
    pub id: ProfileId,
    pub peername: String,
    key: SigningKey,
}

impl Profile {
    /// Build a profile around an existing key.
    pub fn new(peername: impl Into<String>, key: SigningKey) -> Self {
        Self {
            id: ProfileId::derive(&key.public()),
            peername: peername.into(),
            key,
        }
    }

    /// Generate a profile with a fresh random keypair.
    pub fn generate(peername: impl Into<String>) -> Self {
        Self::new(peername, SigningKey::generate())
    }

    pub fn private_key(&self) -> &SigningKey {
        &self.key
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.key.public()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_derivation_is_deterministic() {
        let key = SigningKey::generate();
        let a = ProfileId::derive(&key.public());
        let b = ProfileId::derive(&key.public());
        assert_eq!(a, b);
    }

    #[test]
    fn different_keys_different_ids() {
        let a = ProfileId::derive(&SigningKey::generate().public());
        let b = ProfileId::derive(&SigningKey::generate().public());
        assert_ne!(a, b);
    }

    #[test]
    fn hex_roundtrip() {
        let id = ProfileId::from_raw([7u8; 32]);
        let parsed = ProfileId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_hex_rejects_short_input() {
        let err = ProfileId::from_hex("abcd").unwrap_err();
        assert!(matches!(err, TypeError::InvalidLength { .. }));
    }

    #[test]
    fn profile_id_matches_key() {
        let profile = Profile::generate("nora");
        assert_eq!(profile.id, ProfileId::derive(&profile.public_key()));
        assert_eq!(profile.peername, "nora");
    }
}
