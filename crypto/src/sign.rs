//! secp256k1 signing of typed payloads.
//!
//! The relay never holds user keys; this is used by tests, benches and
//! operator tooling to produce signatures the verifier accepts.

use alloy_primitives::{Address, B256};
use k256::ecdsa::SigningKey;
use sigrelay_types::SignatureParts;

use crate::eip712::TypedPayload;
use crate::error::SignatureError;
use crate::recover::address_from_key;

/// Sign `payload` with a raw 32-byte private key. Returns `v` in `{27, 28}`.
pub fn sign_payload(
    payload: &TypedPayload,
    private_key: &[u8; 32],
) -> Result<SignatureParts, SignatureError> {
    let key = signing_key(private_key)?;
    let digest = payload.signing_hash();
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest.as_slice())
        .map_err(|e| SignatureError::Malformed(e.to_string()))?;
    let (r, s) = signature.split_bytes();
    Ok(SignatureParts::new(
        27 + recovery_id.to_byte(),
        B256::from_slice(r.as_slice()),
        B256::from_slice(s.as_slice()),
    ))
}

/// The account address controlled by a raw private key.
pub fn address_of(private_key: &[u8; 32]) -> Result<Address, SignatureError> {
    let key = signing_key(private_key)?;
    Ok(address_from_key(key.verifying_key()))
}

fn signing_key(private_key: &[u8; 32]) -> Result<SigningKey, SignatureError> {
    SigningKey::from_slice(private_key).map_err(|e| SignatureError::InvalidKey(e.to_string()))
}
