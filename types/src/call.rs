//! ABI-encoded contract call handed to the relay.

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// A fully encoded transaction body: target contract plus calldata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCall {
    pub to: Address,
    pub data: Bytes,
}

impl EncodedCall {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
        }
    }

    /// The 4-byte function selector, if the calldata carries one.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }
}
