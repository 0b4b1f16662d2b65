//! Query filter for listing vote records.

use serde::{Deserialize, Serialize};
use sigrelay_types::{Address, SubmissionRecord, U256};

/// Conjunctive filter; `None` fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteFilter {
    pub proposal_id: Option<U256>,
    pub address: Option<Address>,
    pub executed: Option<bool>,
}

impl VoteFilter {
    pub fn by_proposal(proposal_id: U256) -> Self {
        Self {
            proposal_id: Some(proposal_id),
            ..Self::default()
        }
    }

    pub fn by_address(address: Address) -> Self {
        Self {
            address: Some(address),
            ..Self::default()
        }
    }

    pub fn executed(mut self, executed: bool) -> Self {
        self.executed = Some(executed);
        self
    }

    /// True when at least one of proposal or address is set.
    pub fn is_scoped(&self) -> bool {
        self.proposal_id.is_some() || self.address.is_some()
    }

    /// Whether `record` is a vote satisfying every set field.
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        let Some(proposal_id) = record.proposal_id() else {
            return false;
        };
        self.proposal_id.map_or(true, |p| p == proposal_id)
            && self.address.map_or(true, |a| a == record.from)
            && self.executed.map_or(true, |e| e == record.executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigrelay_types::{SignatureParts, Support, Timestamp, VoteIntent, B256};

    fn vote(from: u8, proposal: u64) -> SubmissionRecord {
        let intent = VoteIntent {
            voter: Address::repeat_byte(from),
            proposal_id: U256::from(proposal),
            support: Support::For,
            signature: SignatureParts::new(27, B256::ZERO, B256::ZERO),
        };
        SubmissionRecord::new_vote(&intent, intent.signature, Timestamp::EPOCH)
    }

    #[test]
    fn empty_filter_is_unscoped() {
        assert!(!VoteFilter::default().is_scoped());
        assert!(VoteFilter::by_address(Address::ZERO).is_scoped());
    }

    #[test]
    fn fields_are_conjunctive() {
        let filter = VoteFilter::by_proposal(U256::from(3u64)).executed(false);
        assert!(filter.matches(&vote(1, 3)));
        assert!(!filter.matches(&vote(1, 4)));
        assert!(!filter.matches(&vote(1, 3).executed_with(B256::ZERO)));
    }
}
