//! Key material for Strata peers.
//!
//! Every peer holds an ed25519 keypair. The private half signs registry
//! interactions; the public half travels with published datasets so the
//! registry can verify them independently. Hashing for content addressing
//! lives with the stores, not here.

pub mod keys;

pub use keys::{KeyError, Signature, SigningKey, VerifyingKey};
