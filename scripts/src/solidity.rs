//! Definitions of Solidity functions called during the rollout

use alloy::sol;

sol! {
    interface IReferrerStorage {
        function setReferrer(address referrer) external;
    }
}

sol! {
    interface ITouchFanShares {
        function setFeeDestination(address feeDestination) external;
        function setProtocolFeePercent(uint256 feePercent) external;
        function setSubjectFeePercent(uint256 feePercent) external;
        function setReferrerFeePercent(uint256 feePercent) external;
        function setReferrerStorage(address referrerStorage) external;
        function getBuyPriceAfterFee(address sharesSubject, uint256 amount) external view returns (uint256);
        function buyShares(address sharesSubject, uint256 amount) external payable;
        function transferOwnership(address newOwner) external;
    }
}

sol! {
    interface ITFCommunityShares {
        function setFeeDestination(address feeDestination) external;
        function setProtocolFeePercent(uint256 feePercent) external;
        function setReferrerFeePercent(uint256 feePercent) external;
        function setReferrerStorage(address referrerStorage) external;
        function setManager(address manager) external;
        function setProposalFee(uint256 proposalFee) external;
        function createProposal(string proposalId) external payable;
        function updateProposalState(uint256 proposalIndex, uint256 state) external;
        function getCommunityBuyPriceAfterFee(uint256 proposalIndex, uint256 amount) external view returns (uint256);
        function buyCommunityShares(uint256 proposalIndex, uint256 amount) external payable;
        function transferOwnership(address newOwner) external;
    }
}
