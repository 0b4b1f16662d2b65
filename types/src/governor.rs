//! Governor contract generations and proposal lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which generation of governor contract the relay talks to.
///
/// The generations differ in the ballot they sign, the ABI of their
/// proposal/receipt getters and whether votes carry a per-voter nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernorKind {
    /// `Ballot(uint256 proposalId,bool support)`, no abstain.
    Alpha,
    /// `Ballot(uint256 proposalId,uint8 support)`.
    Bravo,
    /// Versioned domain, ballot carries the voter and its governor nonce.
    Charlie,
}

impl GovernorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Bravo => "bravo",
            Self::Charlie => "charlie",
        }
    }

    pub fn supports_abstain(&self) -> bool {
        !matches!(self, Self::Alpha)
    }

    /// Whether ballots are bound to a per-voter nonce read from the governor.
    pub fn uses_vote_nonce(&self) -> bool {
        matches!(self, Self::Charlie)
    }

    /// Whether the governor exposes `latestProposalIds(address)`.
    pub fn tracks_latest_proposal(&self) -> bool {
        !matches!(self, Self::Charlie)
    }

    /// Map the raw `state()` return value into a [`ProposalState`].
    ///
    /// All three generations share the Compound ordering; the mapping is kept
    /// per-kind so a diverging deployment only touches this function.
    pub fn proposal_state(&self, raw: u8) -> Option<ProposalState> {
        use ProposalState::*;
        let state = match raw {
            0 => Pending,
            1 => Active,
            2 => Canceled,
            3 => Defeated,
            4 => Succeeded,
            5 => Queued,
            6 => Expired,
            7 => Executed,
            _ => return None,
        };
        Some(state)
    }
}

impl fmt::Display for GovernorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GovernorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alpha" => Ok(Self::Alpha),
            "bravo" => Ok(Self::Bravo),
            "charlie" => Ok(Self::Charlie),
            other => Err(format!("unknown governor kind '{other}'")),
        }
    }
}

/// Lifecycle state of an on-chain proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalState {
    /// Pending and Active proposals can still receive votes.
    pub fn accepts_votes(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Canceled => "Canceled",
            Self::Defeated => "Defeated",
            Self::Succeeded => "Succeeded",
            Self::Queued => "Queued",
            Self::Expired => "Expired",
            Self::Executed => "Executed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Bravo".parse::<GovernorKind>(), Ok(GovernorKind::Bravo));
        assert!("delta".parse::<GovernorKind>().is_err());
    }

    #[test]
    fn state_mapping_rejects_unknown_values() {
        let kind = GovernorKind::Charlie;
        assert_eq!(kind.proposal_state(2), Some(ProposalState::Canceled));
        assert_eq!(kind.proposal_state(8), None);
    }

    #[test]
    fn only_pending_and_active_accept_votes() {
        assert!(ProposalState::Pending.accepts_votes());
        assert!(ProposalState::Active.accepts_votes());
        assert!(!ProposalState::Canceled.accepts_votes());
        assert!(!ProposalState::Succeeded.accepts_votes());
    }
}
