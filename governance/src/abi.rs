//! Contract interfaces read and called by the relay.
//!
//! `uint96` vote counts are declared as `uint256`: the return words are
//! identical and selectors only depend on parameter types.

use alloy_sol_types::sol;

sol! {
    /// COMP-style token with checkpointed votes.
    interface CompToken {
        function balanceOf(address account) external view returns (uint256 balance);
        function delegates(address delegator) external view returns (address delegatee);
        function getCurrentVotes(address account) external view returns (uint256 votes);
        function getPriorVotes(address account, uint256 blockNumber) external view returns (uint256 votes);
        function nonces(address owner) external view returns (uint256 nonce);
        function delegateBySig(address delegatee, uint256 nonce, uint256 expiry, uint8 v, bytes32 r, bytes32 s) external;
    }

    /// ERC20Votes token paired with the charlie governor.
    interface VotesToken {
        function getVotes(address account) external view returns (uint256 votes);
        function getPastVotes(address account, uint256 timepoint) external view returns (uint256 votes);
    }

    interface GovernorAlpha {
        function proposals(uint256 proposalId) external view returns (
            uint256 id,
            address proposer,
            uint256 eta,
            uint256 startBlock,
            uint256 endBlock,
            uint256 forVotes,
            uint256 againstVotes,
            bool canceled,
            bool executed
        );
        function state(uint256 proposalId) external view returns (uint8 status);
        function getReceipt(uint256 proposalId, address voter) external view returns (bool hasVoted, bool support, uint256 votes);
        function proposalThreshold() external view returns (uint256 threshold);
        function latestProposalIds(address proposer) external view returns (uint256 proposalId);
        function castVoteBySig(uint256 proposalId, bool support, uint8 v, bytes32 r, bytes32 s) external;
    }

    interface GovernorBravo {
        function proposals(uint256 proposalId) external view returns (
            uint256 id,
            address proposer,
            uint256 eta,
            uint256 startBlock,
            uint256 endBlock,
            uint256 forVotes,
            uint256 againstVotes,
            uint256 abstainVotes,
            bool canceled,
            bool executed
        );
        function state(uint256 proposalId) external view returns (uint8 status);
        function getReceipt(uint256 proposalId, address voter) external view returns (bool hasVoted, uint8 support, uint256 votes);
        function proposalThreshold() external view returns (uint256 threshold);
        function latestProposalIds(address proposer) external view returns (uint256 proposalId);
        function castVoteBySig(uint256 proposalId, uint8 support, uint8 v, bytes32 r, bytes32 s) external;
    }

    interface GovernorCharlie {
        function state(uint256 proposalId) external view returns (uint8 status);
        function proposalSnapshot(uint256 proposalId) external view returns (uint256 timepoint);
        function proposalDeadline(uint256 proposalId) external view returns (uint256 timepoint);
        function proposalProposer(uint256 proposalId) external view returns (address proposer);
        function hasVoted(uint256 proposalId, address account) external view returns (bool voted);
        function nonces(address owner) external view returns (uint256 nonce);
        function proposalThreshold() external view returns (uint256 threshold);
        function castVoteBySig(uint256 proposalId, uint8 support, address voter, bytes signature) external returns (uint256 weight);
    }
}
