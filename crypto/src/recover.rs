//! secp256k1 signer recovery with `ecrecover` semantics.

use alloy_primitives::{Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sigrelay_types::SignatureParts;

use crate::eip712::TypedPayload;
use crate::error::SignatureError;
use crate::hash::keccak256;

/// Map a wallet-supplied recovery byte into `{27, 28}`.
///
/// Some wallets emit the raw recovery id (0/1); contracts expect 27/28.
pub fn normalize_v(v: u8) -> Result<u8, SignatureError> {
    match v {
        0 | 1 => Ok(v + 27),
        27 | 28 => Ok(v),
        other => Err(SignatureError::InvalidV(other)),
    }
}

/// Recover the address that signed `payload`.
pub fn recover_signer(
    payload: &TypedPayload,
    signature: &SignatureParts,
) -> Result<Address, SignatureError> {
    recover_prehash(&payload.signing_hash(), signature)
}

/// Recover the signer of a 32-byte digest.
///
/// High-`s` signatures are folded into the low half of the curve order with
/// the recovery parity flipped, which is what the EVM precompile accepts.
pub fn recover_prehash(digest: &B256, signature: &SignatureParts) -> Result<Address, SignatureError> {
    let v = normalize_v(signature.v)?;
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(signature.r.as_slice());
    bytes[32..].copy_from_slice(signature.s.as_slice());
    let sig = Signature::from_slice(&bytes).map_err(|e| SignatureError::Malformed(e.to_string()))?;

    let mut recovery_id = RecoveryId::from_byte(v - 27).ok_or(SignatureError::InvalidV(v))?;
    let sig = match sig.normalize_s() {
        Some(low) => {
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
            low
        }
        None => sig,
    };

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|_| SignatureError::Unrecoverable)?;
    Ok(address_from_key(&key))
}

/// `keccak256(uncompressed_point[1..])[12..]`
pub(crate) fn address_from_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eip712::{TypedDomain, TypedMessage};
    use crate::sign::{address_of, sign_payload};
    use alloy_primitives::U256;

    const KEY: [u8; 32] = [0x11; 32];

    fn curve_order() -> U256 {
        U256::from_str_radix(
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141",
            16,
        )
        .unwrap()
    }

    fn payload() -> TypedPayload {
        TypedPayload::new(
            TypedDomain::new("Compound", 1, Address::repeat_byte(0xc0)),
            TypedMessage::Delegation {
                delegatee: Address::repeat_byte(0xbb),
                nonce: U256::from(4u64),
                expiry: 10_000_000_000,
            },
        )
    }

    #[test]
    fn v_normalization() {
        assert_eq!(normalize_v(0), Ok(27));
        assert_eq!(normalize_v(1), Ok(28));
        assert_eq!(normalize_v(27), Ok(27));
        assert_eq!(normalize_v(28), Ok(28));
        assert_eq!(normalize_v(2), Err(SignatureError::InvalidV(2)));
        assert_eq!(normalize_v(29), Err(SignatureError::InvalidV(29)));
    }

    #[test]
    fn recovers_the_signing_address() {
        let sig = sign_payload(&payload(), &KEY).unwrap();
        assert!(sig.v == 27 || sig.v == 28);
        assert_eq!(recover_signer(&payload(), &sig).unwrap(), address_of(&KEY).unwrap());
    }

    #[test]
    fn raw_recovery_id_recovers_the_same_address() {
        let sig = sign_payload(&payload(), &KEY).unwrap();
        let raw = sig.with_v(sig.v - 27);
        assert_eq!(
            recover_signer(&payload(), &raw).unwrap(),
            recover_signer(&payload(), &sig).unwrap()
        );
    }

    #[test]
    fn high_s_recovers_the_same_address() {
        let sig = sign_payload(&payload(), &KEY).unwrap();
        let s = U256::from_be_bytes(sig.s.0);
        let high = SignatureParts::new(
            if sig.v == 27 { 28 } else { 27 },
            sig.r,
            B256::from((curve_order() - s).to_be_bytes::<32>()),
        );
        assert_eq!(recover_signer(&payload(), &high).unwrap(), address_of(&KEY).unwrap());
    }

    #[test]
    fn tampered_message_recovers_a_different_address() {
        let sig = sign_payload(&payload(), &KEY).unwrap();
        let mut other = payload();
        other.message = TypedMessage::Delegation {
            delegatee: Address::repeat_byte(0xbb),
            nonce: U256::from(5u64),
            expiry: 10_000_000_000,
        };
        let recovered = recover_signer(&other, &sig);
        assert_ne!(recovered.ok(), Some(address_of(&KEY).unwrap()));
    }

    #[test]
    fn zero_r_is_malformed() {
        let sig = SignatureParts::new(27, B256::ZERO, B256::repeat_byte(1));
        assert!(matches!(
            recover_signer(&payload(), &sig),
            Err(SignatureError::Malformed(_))
        ));
    }

    #[test]
    fn invalid_v_is_rejected_before_recovery() {
        let sig = sign_payload(&payload(), &KEY).unwrap().with_v(35);
        assert_eq!(recover_signer(&payload(), &sig), Err(SignatureError::InvalidV(35)));
    }
}
