//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use clap::ValueEnum;

use crate::constants::{CONTRACTS_DIR, FLAT_SOURCE_SUFFIX};

/// The contracts managed by the rollout scripts
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// The referrer registry shared by both share contracts
    ReferrerStorage,
    /// The fan shares contract
    TouchFanSharesV1,
    /// The community shares contract
    TfCommunitySharesV1,
}

impl ContractKind {
    /// The contract's name, as it appears in its artifact and in the deployments file
    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::ReferrerStorage => "ReferrerStorage",
            ContractKind::TouchFanSharesV1 => "TouchFanSharesV1",
            ContractKind::TfCommunitySharesV1 => "TFCommunitySharesV1",
        }
    }

    /// The path of the contract's flattened source, relative to the project root
    pub fn source_name(&self) -> String {
        format!("{CONTRACTS_DIR}/{}{FLAT_SOURCE_SUFFIX}", self.name())
    }

    /// The fully-qualified name used by the block explorer, e.g.
    /// `contracts/ReferrerStorage_flat.sol:ReferrerStorage`
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name(), self.name())
    }

    /// The names of the functions the rollout calls on this contract.
    ///
    /// Checked against the artifact ABI before any transaction is sent.
    pub fn required_functions(&self) -> &'static [&'static str] {
        match self {
            ContractKind::ReferrerStorage => &["setReferrer"],
            ContractKind::TouchFanSharesV1 => &[
                "setFeeDestination",
                "setProtocolFeePercent",
                "setSubjectFeePercent",
                "setReferrerFeePercent",
                "setReferrerStorage",
                "getBuyPriceAfterFee",
                "buyShares",
                "transferOwnership",
            ],
            ContractKind::TfCommunitySharesV1 => &[
                "setFeeDestination",
                "setProtocolFeePercent",
                "setReferrerFeePercent",
                "setReferrerStorage",
                "setManager",
                "setProposalFee",
                "createProposal",
                "updateProposalState",
                "getCommunityBuyPriceAfterFee",
                "buyCommunityShares",
                "transferOwnership",
            ],
        }
    }
}

impl Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
