//! Cryptographic primitives for sigrelay.
//!
//! - **Keccak-256** for EIP-712 struct and domain hashing
//! - **secp256k1** ECDSA public-key recovery (`ecrecover` semantics)
//! - Address derivation from recovered public keys

pub mod eip712;
pub mod error;
pub mod hash;
pub mod recover;
pub mod sign;

pub use eip712::{TypedDomain, TypedMessage, TypedPayload};
pub use error::SignatureError;
pub use hash::{keccak256, keccak256_multi};
pub use recover::{normalize_v, recover_prehash, recover_signer};
pub use sign::{address_of, sign_payload};
