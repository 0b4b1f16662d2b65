//! EIP-712 typed structured data hashing.
//!
//! Only the four message schemas the relay accepts are modelled. Each one is
//! a flat struct of static types, so `hashStruct` is the type hash followed by
//! every field left-padded to a 32-byte word.

use alloy_primitives::{Address, B256, U256};

use crate::hash::{keccak256, keccak256_multi};

const DOMAIN_TYPE: &str = "EIP712Domain(string name,uint256 chainId,address verifyingContract)";
const DOMAIN_TYPE_VERSIONED: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const DELEGATION_TYPE: &str = "Delegation(address delegatee,uint256 nonce,uint256 expiry)";
const BALLOT_BOOL_TYPE: &str = "Ballot(uint256 proposalId,bool support)";
const BALLOT_UINT8_TYPE: &str = "Ballot(uint256 proposalId,uint8 support)";
const BALLOT_EXTENDED_TYPE: &str =
    "Ballot(uint256 proposalId,uint8 support,address voter,uint256 nonce)";

/// The signing domain of a token or governor contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedDomain {
    pub name: String,
    /// Present only for contracts whose domain includes `string version`.
    pub version: Option<String>,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl TypedDomain {
    pub fn new(name: impl Into<String>, chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: name.into(),
            version: None,
            chain_id,
            verifying_contract,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn separator(&self) -> B256 {
        let name_hash = keccak256(self.name.as_bytes());
        let chain_id = U256::from(self.chain_id).to_be_bytes::<32>();
        let contract = address_word(self.verifying_contract);
        match &self.version {
            Some(version) => {
                let version_hash = keccak256(version.as_bytes());
                keccak256_multi(&[
                    keccak256(DOMAIN_TYPE_VERSIONED.as_bytes()).as_slice(),
                    name_hash.as_slice(),
                    version_hash.as_slice(),
                    &chain_id,
                    &contract,
                ])
            }
            None => keccak256_multi(&[
                keccak256(DOMAIN_TYPE.as_bytes()).as_slice(),
                name_hash.as_slice(),
                &chain_id,
                &contract,
            ]),
        }
    }
}

/// A message in one of the accepted schemas. Field order follows the type
/// string of each schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedMessage {
    /// `Delegation(address delegatee,uint256 nonce,uint256 expiry)`
    Delegation {
        delegatee: Address,
        nonce: U256,
        expiry: u64,
    },
    /// `Ballot(uint256 proposalId,bool support)`
    BallotBool { proposal_id: U256, support: bool },
    /// `Ballot(uint256 proposalId,uint8 support)`
    BallotUint8 { proposal_id: U256, support: u8 },
    /// `Ballot(uint256 proposalId,uint8 support,address voter,uint256 nonce)`
    BallotExtended {
        proposal_id: U256,
        support: u8,
        voter: Address,
        nonce: U256,
    },
}

impl TypedMessage {
    pub fn type_string(&self) -> &'static str {
        match self {
            Self::Delegation { .. } => DELEGATION_TYPE,
            Self::BallotBool { .. } => BALLOT_BOOL_TYPE,
            Self::BallotUint8 { .. } => BALLOT_UINT8_TYPE,
            Self::BallotExtended { .. } => BALLOT_EXTENDED_TYPE,
        }
    }

    pub fn type_hash(&self) -> B256 {
        keccak256(self.type_string().as_bytes())
    }

    pub fn struct_hash(&self) -> B256 {
        let type_hash = self.type_hash();
        match self {
            Self::Delegation {
                delegatee,
                nonce,
                expiry,
            } => keccak256_multi(&[
                type_hash.as_slice(),
                &address_word(*delegatee),
                &nonce.to_be_bytes::<32>(),
                &U256::from(*expiry).to_be_bytes::<32>(),
            ]),
            Self::BallotBool {
                proposal_id,
                support,
            } => keccak256_multi(&[
                type_hash.as_slice(),
                &proposal_id.to_be_bytes::<32>(),
                &U256::from(u8::from(*support)).to_be_bytes::<32>(),
            ]),
            Self::BallotUint8 {
                proposal_id,
                support,
            } => keccak256_multi(&[
                type_hash.as_slice(),
                &proposal_id.to_be_bytes::<32>(),
                &U256::from(*support).to_be_bytes::<32>(),
            ]),
            Self::BallotExtended {
                proposal_id,
                support,
                voter,
                nonce,
            } => keccak256_multi(&[
                type_hash.as_slice(),
                &proposal_id.to_be_bytes::<32>(),
                &U256::from(*support).to_be_bytes::<32>(),
                &address_word(*voter),
                &nonce.to_be_bytes::<32>(),
            ]),
        }
    }
}

/// A domain-bound message, ready to hash for signing or recovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedPayload {
    pub domain: TypedDomain,
    pub message: TypedMessage,
}

impl TypedPayload {
    pub fn new(domain: TypedDomain, message: TypedMessage) -> Self {
        Self { domain, message }
    }

    /// `keccak256(0x19 ‖ 0x01 ‖ domainSeparator ‖ hashStruct(message))`
    pub fn signing_hash(&self) -> B256 {
        keccak256_multi(&[
            b"\x19\x01",
            self.domain.separator().as_slice(),
            self.message.struct_hash().as_slice(),
        ])
    }
}

fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    fn compound_domain() -> TypedDomain {
        TypedDomain::new(
            "Compound",
            1,
            address!("c00e94cb662c3520282e6f5717214004a7f26888"),
        )
    }

    #[test]
    fn delegation_type_hash_matches_token_constant() {
        let msg = TypedMessage::Delegation {
            delegatee: Address::ZERO,
            nonce: U256::ZERO,
            expiry: 0,
        };
        assert_eq!(
            msg.type_hash(),
            b256!("e48329057bfd03d55e49b547132e39cffd9c1820ad7b9d4c5307691425d15adf")
        );
    }

    #[test]
    fn uint8_ballot_type_hash_matches_governor_constant() {
        let msg = TypedMessage::BallotUint8 {
            proposal_id: U256::ZERO,
            support: 0,
        };
        assert_eq!(
            msg.type_hash(),
            b256!("150214d74d59b7d1e90c73fc22ef3d991dd0a76b046543d4d80ab92d2a50328f")
        );
    }

    #[test]
    fn unversioned_domain_separator() {
        assert_eq!(
            compound_domain().separator(),
            b256!("97529df852bab657e1ffa498f205743fdd7e2b2dcbcc1173bacf2cd17133d278")
        );
    }

    #[test]
    fn delegation_signing_hash() {
        let payload = TypedPayload::new(
            compound_domain(),
            TypedMessage::Delegation {
                delegatee: address!("00000000000000000000000000000000000000bb"),
                nonce: U256::ZERO,
                expiry: 10_000_000_000,
            },
        );
        assert_eq!(
            payload.signing_hash(),
            b256!("7c334dde1d2bbf96ecabb1860bb77ff162009ee13539b9b7ed035657e7a1023b")
        );
    }

    #[test]
    fn bool_ballot_signing_hash() {
        let payload = TypedPayload::new(
            TypedDomain::new(
                "Compound Governor Alpha",
                1,
                address!("c0da01a04c3f3e0be433606045bb7017a7323e38"),
            ),
            TypedMessage::BallotBool {
                proposal_id: U256::from(10u64),
                support: true,
            },
        );
        assert_eq!(
            payload.signing_hash(),
            b256!("08273031a7eab951db34050b36e56ac1871b9c6eb197229c121ddda6ce1f3429")
        );
    }

    #[test]
    fn versioned_extended_ballot_signing_hash() {
        let domain = TypedDomain::new(
            "Example Governor",
            1,
            address!("00000000000000000000000000000000000000cc"),
        )
        .with_version("1");
        let payload = TypedPayload::new(
            domain,
            TypedMessage::BallotExtended {
                proposal_id: U256::from(42u64),
                support: 1,
                voter: address!("00000000000000000000000000000000000000aa"),
                nonce: U256::from(3u64),
            },
        );
        assert_eq!(
            payload.signing_hash(),
            b256!("5d131e7e7f6fa56efce14e70f6a826a0b03714eae2d9b55031740cea8e4855bf")
        );
    }

    #[test]
    fn version_changes_the_separator() {
        let plain = compound_domain();
        let versioned = compound_domain().with_version("1");
        assert_ne!(plain.separator(), versioned.separator());
    }
}
