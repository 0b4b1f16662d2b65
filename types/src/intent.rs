//! Signed intents submitted by callers, and their structural validation.
//!
//! Callers post loosely typed JSON (numbers may be JSON numbers or decimal /
//! hex strings, `v` may be `"0x1b"` or `27`). The `Raw*` types accept that
//! shape as-is; `from_raw` turns them into strongly typed intents or fails
//! with a [`ParseError`].

use std::str::FromStr;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Vote direction. Discriminants match the on-chain `support` byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Support {
    Against = 0,
    For = 1,
    Abstain = 2,
}

impl Support {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Boolean form used by ballots that predate abstention.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Against => Some(false),
            Self::For => Some(true),
            Self::Abstain => None,
        }
    }
}

impl TryFrom<u8> for Support {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Against),
            1 => Ok(Self::For),
            2 => Ok(Self::Abstain),
            other => Err(ParseError::invalid(
                "support",
                format!("{other} is not one of 0 (against), 1 (for), 2 (abstain)"),
            )),
        }
    }
}

/// A 65-byte ECDSA signature split into its components.
///
/// `v` is kept as supplied; the verifier normalises it before recovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureParts {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl SignatureParts {
    pub const LEN: usize = 65;

    pub fn new(v: u8, r: B256, s: B256) -> Self {
        Self { v, r, s }
    }

    /// Split a packed `r ‖ s ‖ v` signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() != Self::LEN {
            return Err(ParseError::invalid(
                "signature",
                format!("expected {} bytes, got {}", Self::LEN, bytes.len()),
            ));
        }
        Ok(Self {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        })
    }

    /// Pack as `r ‖ s ‖ v`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }

    pub fn with_v(self, v: u8) -> Self {
        Self { v, ..self }
    }
}

/// A request to cast a vote by signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteIntent {
    pub voter: Address,
    pub proposal_id: U256,
    pub support: Support,
    pub signature: SignatureParts,
}

/// A request to delegate voting power by signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegationIntent {
    pub delegator: Address,
    pub delegatee: Address,
    pub nonce: U256,
    pub expiry: u64,
    pub signature: SignatureParts,
}

/// Either kind of signed intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Vote(VoteIntent),
    Delegation(DelegationIntent),
}

impl Intent {
    /// The address that claims to have signed the intent.
    pub fn signer(&self) -> Address {
        match self {
            Self::Vote(v) => v.voter,
            Self::Delegation(d) => d.delegator,
        }
    }
}

/// A JSON scalar as sent by wallets and front-ends.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Bool(bool),
    Int(u64),
    Text(String),
}

/// Body of `POST /vote`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVote {
    pub address: Option<String>,
    pub proposal_id: Option<RawScalar>,
    pub support: Option<RawScalar>,
    pub v: Option<RawScalar>,
    pub r: Option<String>,
    pub s: Option<String>,
}

/// Body of `POST /delegate`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDelegation {
    pub address: Option<String>,
    pub delegatee: Option<String>,
    pub nonce: Option<RawScalar>,
    pub expiry: Option<RawScalar>,
    pub v: Option<RawScalar>,
    pub r: Option<String>,
    pub s: Option<String>,
}

impl VoteIntent {
    pub fn from_raw(raw: RawVote) -> Result<Self, ParseError> {
        let voter = parse_address("address", raw.address.as_deref())?;
        let proposal_id = scalar_u256("proposalId", required("proposalId", raw.proposal_id)?)?;
        let support = scalar_support(required("support", raw.support)?)?;
        let signature = signature_parts(raw.v, raw.r, raw.s)?;
        Ok(Self {
            voter,
            proposal_id,
            support,
            signature,
        })
    }
}

impl DelegationIntent {
    pub fn from_raw(raw: RawDelegation) -> Result<Self, ParseError> {
        let delegator = parse_address("address", raw.address.as_deref())?;
        let delegatee = parse_address("delegatee", raw.delegatee.as_deref())?;
        let nonce = scalar_u256("nonce", required("nonce", raw.nonce)?)?;
        let expiry = scalar_u256("expiry", required("expiry", raw.expiry)?)?;
        let expiry = u64::try_from(expiry)
            .map_err(|_| ParseError::invalid("expiry", "does not fit a unix timestamp"))?;
        let signature = signature_parts(raw.v, raw.r, raw.s)?;
        Ok(Self {
            delegator,
            delegatee,
            nonce,
            expiry,
            signature,
        })
    }
}

/// Parse a hex account address, `0x` prefix optional.
pub fn parse_address(field: &'static str, raw: Option<&str>) -> Result<Address, ParseError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let raw = raw.ok_or(ParseError::Missing(field))?;
    Address::from_str(raw).map_err(|e| ParseError::invalid(field, e.to_string()))
}

/// Parse a non-negative integer given in decimal or `0x` hex.
pub fn parse_u256(field: &'static str, raw: Option<&str>) -> Result<U256, ParseError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let raw = raw.ok_or(ParseError::Missing(field))?;
    scalar_u256(field, RawScalar::Text(raw.to_string()))
}

fn required(field: &'static str, value: Option<RawScalar>) -> Result<RawScalar, ParseError> {
    value.ok_or(ParseError::Missing(field))
}

fn scalar_u256(field: &'static str, value: RawScalar) -> Result<U256, ParseError> {
    match value {
        RawScalar::Int(n) => Ok(U256::from(n)),
        RawScalar::Text(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(digits) => U256::from_str_radix(digits, 16),
                None => U256::from_str_radix(s, 10),
            };
            parsed.map_err(|e| ParseError::invalid(field, e.to_string()))
        }
        RawScalar::Bool(_) => Err(ParseError::invalid(field, "expected an integer")),
    }
}

fn scalar_support(value: RawScalar) -> Result<Support, ParseError> {
    match value {
        RawScalar::Bool(true) => Ok(Support::For),
        RawScalar::Bool(false) => Ok(Support::Against),
        other => {
            let n = scalar_u256("support", other)?;
            let byte = u8::try_from(n).map_err(|_| ParseError::invalid("support", "out of range"))?;
            Support::try_from(byte)
        }
    }
}

fn scalar_v(value: RawScalar) -> Result<u8, ParseError> {
    let n = scalar_u256("v", value)?;
    u8::try_from(n).map_err(|_| ParseError::invalid("v", "must be a single byte"))
}

fn hex_word(field: &'static str, raw: Option<String>) -> Result<B256, ParseError> {
    let raw = raw.ok_or(ParseError::Missing(field))?;
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| ParseError::invalid(field, e.to_string()))?;
    if bytes.len() != 32 {
        return Err(ParseError::invalid(
            field,
            format!("expected 32 bytes, got {}", bytes.len()),
        ));
    }
    Ok(B256::from_slice(&bytes))
}

fn signature_parts(
    v: Option<RawScalar>,
    r: Option<String>,
    s: Option<String>,
) -> Result<SignatureParts, ParseError> {
    let v = scalar_v(required("v", v)?)?;
    let r = hex_word("r", r)?;
    let s = hex_word("s", s)?;
    Ok(SignatureParts { v, r, s })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x00000000000000000000000000000000000000aa";
    const WORD: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    fn raw_vote() -> RawVote {
        RawVote {
            address: Some(ADDR.into()),
            proposal_id: Some(RawScalar::Text("42".into())),
            support: Some(RawScalar::Int(1)),
            v: Some(RawScalar::Text("0x1b".into())),
            r: Some(WORD.into()),
            s: Some(WORD.into()),
        }
    }

    #[test]
    fn vote_parses_mixed_scalar_shapes() {
        let intent = VoteIntent::from_raw(raw_vote()).expect("valid vote");
        assert_eq!(intent.proposal_id, U256::from(42u64));
        assert_eq!(intent.support, Support::For);
        assert_eq!(intent.signature.v, 27);
    }

    #[test]
    fn vote_rejects_support_out_of_range() {
        let raw = RawVote {
            support: Some(RawScalar::Int(3)),
            ..raw_vote()
        };
        let err = VoteIntent::from_raw(raw).unwrap_err();
        assert!(matches!(err, ParseError::Invalid { field: "support", .. }));
    }

    #[test]
    fn boolean_support_maps_to_for_and_against() {
        let raw = RawVote {
            support: Some(RawScalar::Bool(false)),
            ..raw_vote()
        };
        assert_eq!(VoteIntent::from_raw(raw).unwrap().support, Support::Against);
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let raw = RawVote {
            r: None,
            ..raw_vote()
        };
        assert_eq!(VoteIntent::from_raw(raw).unwrap_err(), ParseError::Missing("r"));
    }

    #[test]
    fn short_r_is_rejected() {
        let raw = RawVote {
            r: Some("0x1234".into()),
            ..raw_vote()
        };
        assert!(VoteIntent::from_raw(raw).is_err());
    }

    #[test]
    fn delegation_parses_hex_nonce_and_numeric_expiry() {
        let raw = RawDelegation {
            address: Some(ADDR.into()),
            delegatee: Some("0x00000000000000000000000000000000000000bb".into()),
            nonce: Some(RawScalar::Text("0x0".into())),
            expiry: Some(RawScalar::Int(4_102_444_800)),
            v: Some(RawScalar::Int(0)),
            r: Some(WORD.into()),
            s: Some(WORD.into()),
        };
        let intent = DelegationIntent::from_raw(raw).expect("valid delegation");
        assert_eq!(intent.nonce, U256::ZERO);
        assert_eq!(intent.expiry, 4_102_444_800);
        assert_eq!(intent.signature.v, 0);
    }

    #[test]
    fn raw_body_accepts_string_and_number_fields() {
        let body = format!(
            r#"{{"address":"{ADDR}","proposalId":7,"support":"2","v":"0x1c","r":"{WORD}","s":"{WORD}"}}"#
        );
        let raw: RawVote = serde_json::from_str(&body).expect("deserializes");
        let intent = VoteIntent::from_raw(raw).unwrap();
        assert_eq!(intent.support, Support::Abstain);
        assert_eq!(intent.signature.v, 28);
    }

    #[test]
    fn packed_signature_round_trips() {
        let mut bytes = [7u8; 65];
        bytes[64] = 28;
        let parts = SignatureParts::from_bytes(&bytes).unwrap();
        assert_eq!(parts.to_bytes(), bytes);
        assert!(SignatureParts::from_bytes(&bytes[..64]).is_err());
    }

    #[test]
    fn blank_address_counts_as_missing() {
        assert_eq!(
            parse_address("address", Some("  ")),
            Err(ParseError::Missing("address"))
        );
    }
}
