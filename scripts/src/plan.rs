//! Construction of the ordered rollout plans.
//!
//! A plan is the full list of deployments, verifications, and contract calls a
//! rollout performs, in the order they are sent. Building it touches neither
//! the network nor the file system, so the exact sequence can be printed ahead
//! of time and checked in tests.

use std::fmt::{self, Display};

use alloy::primitives::{Address, U256};

use crate::{
    errors::ScriptError,
    params::{CommunitySharesParams, DeployParams},
    types::ContractKind,
};

/// An address a step refers to, resolved when the step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRef {
    /// A fixed address
    Literal(Address),
    /// The account signing the rollout's transactions
    Deployer,
    /// A contract deployed earlier in the run, or recorded in the deployments file
    Deployed(ContractKind),
}

impl Display for AddressRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressRef::Literal(addr) => write!(f, "{addr}"),
            AddressRef::Deployer => write!(f, "<deployer>"),
            AddressRef::Deployed(kind) => write!(f, "<{kind}>"),
        }
    }
}

/// A single step of a rollout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deploy a contract and record its address
    Deploy(ContractKind),
    /// Verify a deployed contract's source on the block explorer
    Verify(ContractKind),
    /// `ReferrerStorage.setReferrer`
    SetReferrer {
        /// The referrer to register
        referrer: AddressRef,
    },
    /// `setFeeDestination` on either shares contract
    SetFeeDestination {
        /// The contract to configure
        contract: ContractKind,
        /// The address receiving protocol fees
        destination: AddressRef,
    },
    /// `setProtocolFeePercent` on either shares contract
    SetProtocolFeePercent {
        /// The contract to configure
        contract: ContractKind,
        /// The fee, 18-decimal fixed point
        percent: U256,
    },
    /// `TouchFanSharesV1.setSubjectFeePercent`
    SetSubjectFeePercent {
        /// The fee, 18-decimal fixed point
        percent: U256,
    },
    /// `setReferrerFeePercent` on either shares contract
    SetReferrerFeePercent {
        /// The contract to configure
        contract: ContractKind,
        /// The fee, 18-decimal fixed point
        percent: U256,
    },
    /// `setReferrerStorage` on either shares contract
    SetReferrerStorage {
        /// The contract to configure
        contract: ContractKind,
        /// The referrer registry
        storage: AddressRef,
    },
    /// `TouchFanSharesV1.buyShares`, paying the quote of `getBuyPriceAfterFee`
    BuyShares {
        /// The subject whose shares are bought
        subject: AddressRef,
        /// The number of shares
        amount: U256,
    },
    /// `TFCommunitySharesV1.setManager`
    SetManager {
        /// The new manager
        manager: AddressRef,
    },
    /// `TFCommunitySharesV1.setProposalFee`
    SetProposalFee {
        /// The fee in wei
        fee: U256,
    },
    /// `TFCommunitySharesV1.createProposal`, paying the proposal fee
    CreateProposal {
        /// The off-chain proposal identifier
        external_id: String,
        /// The value sent along, the configured proposal fee
        fee: U256,
    },
    /// `TFCommunitySharesV1.updateProposalState`
    UpdateProposalState {
        /// The on-chain proposal index
        index: U256,
        /// The new state
        state: U256,
    },
    /// `TFCommunitySharesV1.buyCommunityShares`, paying the quote of
    /// `getCommunityBuyPriceAfterFee`
    BuyCommunityShares {
        /// The on-chain proposal index
        index: U256,
        /// The number of shares
        amount: U256,
    },
    /// `transferOwnership` on either shares contract
    TransferOwnership {
        /// The contract handed over
        contract: ContractKind,
        /// The new owner
        new_owner: AddressRef,
    },
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Deploy(kind) => write!(f, "deploy {kind}"),
            Step::Verify(kind) => write!(f, "verify {kind}"),
            Step::SetReferrer { referrer } => {
                write!(f, "{}.setReferrer({referrer})", ContractKind::ReferrerStorage)
            }
            Step::SetFeeDestination { contract, destination } => {
                write!(f, "{contract}.setFeeDestination({destination})")
            }
            Step::SetProtocolFeePercent { contract, percent } => {
                write!(f, "{contract}.setProtocolFeePercent({percent})")
            }
            Step::SetSubjectFeePercent { percent } => {
                write!(f, "{}.setSubjectFeePercent({percent})", ContractKind::TouchFanSharesV1)
            }
            Step::SetReferrerFeePercent { contract, percent } => {
                write!(f, "{contract}.setReferrerFeePercent({percent})")
            }
            Step::SetReferrerStorage { contract, storage } => {
                write!(f, "{contract}.setReferrerStorage({storage})")
            }
            Step::BuyShares { subject, amount } => write!(
                f,
                "{}.buyShares({subject}, {amount}) paying the quoted price",
                ContractKind::TouchFanSharesV1
            ),
            Step::SetManager { manager } => {
                write!(f, "{}.setManager({manager})", ContractKind::TfCommunitySharesV1)
            }
            Step::SetProposalFee { fee } => {
                write!(f, "{}.setProposalFee({fee})", ContractKind::TfCommunitySharesV1)
            }
            Step::CreateProposal { external_id, fee } => write!(
                f,
                "{}.createProposal(\"{external_id}\") paying {fee} wei",
                ContractKind::TfCommunitySharesV1
            ),
            Step::UpdateProposalState { index, state } => write!(
                f,
                "{}.updateProposalState({index}, {state})",
                ContractKind::TfCommunitySharesV1
            ),
            Step::BuyCommunityShares { index, amount } => write!(
                f,
                "{}.buyCommunityShares({index}, {amount}) paying the quoted price",
                ContractKind::TfCommunitySharesV1
            ),
            Step::TransferOwnership { contract, new_owner } => {
                write!(f, "{contract}.transferOwnership({new_owner})")
            }
        }
    }
}

impl Step {
    /// The contract whose artifact this step needs, if any
    pub fn artifact(&self) -> Option<ContractKind> {
        match self {
            Step::Deploy(kind) | Step::Verify(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// The full rollout: `ReferrerStorage`, then `TouchFanSharesV1`, then
/// `TFCommunitySharesV1`, each verified right after its deployment when
/// `verify` is set
pub fn full_rollout_plan(params: &DeployParams, verify: bool) -> Result<Vec<Step>, ScriptError> {
    let referrer_storage = params.referrer_storage()?;
    let fan = params.fan_shares()?;
    let storage_ref = AddressRef::Deployed(ContractKind::ReferrerStorage);

    let mut steps = Vec::new();

    // --- ReferrerStorage --- //
    steps.push(Step::Deploy(ContractKind::ReferrerStorage));
    steps.push(Step::SetReferrer {
        referrer: AddressRef::Literal(referrer_storage.referrer),
    });
    if verify {
        steps.push(Step::Verify(ContractKind::ReferrerStorage));
    }

    // --- TouchFanSharesV1 --- //
    let contract = ContractKind::TouchFanSharesV1;
    steps.push(Step::Deploy(contract));
    if verify {
        steps.push(Step::Verify(contract));
    }
    steps.extend([
        Step::SetFeeDestination {
            contract,
            destination: AddressRef::Literal(fan.fee_destination),
        },
        Step::SetProtocolFeePercent {
            contract,
            percent: fan.protocol_fee_percent,
        },
        Step::SetSubjectFeePercent {
            percent: fan.subject_fee_percent,
        },
        Step::SetReferrerFeePercent {
            contract,
            percent: fan.referrer_fee_percent,
        },
        Step::SetReferrerStorage {
            contract,
            storage: storage_ref,
        },
    ]);
    if let Some(amount) = fan.initial_buy_amount {
        steps.push(Step::BuyShares {
            subject: AddressRef::Deployer,
            amount,
        });
    }
    if let Some(new_owner) = fan.new_owner {
        steps.push(Step::TransferOwnership {
            contract,
            new_owner: AddressRef::Literal(new_owner),
        });
    }

    // --- TFCommunitySharesV1 --- //
    let community = &params.community_shares;
    let community_storage = community
        .referrer_storage
        .map(AddressRef::Literal)
        .unwrap_or(storage_ref);
    steps.extend(community_steps(community, community_storage, verify));

    Ok(steps)
}

/// The standalone community rollout: `TFCommunitySharesV1` wired to the
/// existing `ReferrerStorage` named in its parameters
pub fn community_rollout_plan(
    params: &DeployParams,
    verify: bool,
) -> Result<Vec<Step>, ScriptError> {
    let storage = params.standalone_referrer_storage()?;

    Ok(community_steps(
        &params.community_shares,
        AddressRef::Literal(storage),
        verify,
    ))
}

/// Deploy and configure `TFCommunitySharesV1`
fn community_steps(
    community: &CommunitySharesParams,
    storage: AddressRef,
    verify: bool,
) -> Vec<Step> {
    let contract = ContractKind::TfCommunitySharesV1;
    let mut steps = vec![Step::Deploy(contract)];
    if verify {
        steps.push(Step::Verify(contract));
    }

    steps.extend([
        Step::SetFeeDestination {
            contract,
            destination: AddressRef::Literal(community.fee_destination),
        },
        Step::SetProtocolFeePercent {
            contract,
            percent: community.protocol_fee_percent,
        },
        Step::SetReferrerFeePercent {
            contract,
            percent: community.referrer_fee_percent,
        },
        Step::SetReferrerStorage { contract, storage },
        Step::SetManager {
            manager: community
                .manager
                .map(AddressRef::Literal)
                .unwrap_or(AddressRef::Deployer),
        },
        Step::SetProposalFee {
            fee: community.proposal_fee,
        },
    ]);

    if let Some(proposal) = &community.proposal {
        steps.push(Step::CreateProposal {
            external_id: proposal.external_id.clone(),
            fee: community.proposal_fee,
        });
        steps.push(Step::UpdateProposalState {
            index: proposal.index,
            state: proposal.state,
        });
        if let Some(amount) = proposal.buy_amount {
            steps.push(Step::BuyCommunityShares {
                index: proposal.index,
                amount,
            });
        }
    }

    if let Some(new_owner) = community.new_owner {
        steps.push(Step::TransferOwnership {
            contract,
            new_owner: AddressRef::Literal(new_owner),
        });
    }

    steps
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, U256};

    use super::{community_rollout_plan, full_rollout_plan, AddressRef, Step};
    use crate::{errors::ScriptError, params::DeployParams, types::ContractKind};

    const FAN: ContractKind = ContractKind::TouchFanSharesV1;
    const COMMUNITY: ContractKind = ContractKind::TfCommunitySharesV1;
    const STORAGE: AddressRef = AddressRef::Deployed(ContractKind::ReferrerStorage);

    fn u(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn test_full_rollout_sequence() {
        let params = DeployParams::full_rollout().unwrap();
        let steps = full_rollout_plan(&params, true /* verify */).unwrap();

        let fee_destination =
            AddressRef::Literal(address!("CAf79DB7a1450af467539a5a18c81785B4aAb4D9"));
        let new_owner = AddressRef::Literal(address!("Ee506f213874D70DD1de66EDf32784BEB4917B87"));

        let expected = vec![
            Step::Deploy(ContractKind::ReferrerStorage),
            Step::SetReferrer {
                referrer: AddressRef::Literal(address!("Ecb6f9d167F514d7C5764751468EC7658272Be5c")),
            },
            Step::Verify(ContractKind::ReferrerStorage),
            Step::Deploy(FAN),
            Step::Verify(FAN),
            Step::SetFeeDestination {
                contract: FAN,
                destination: fee_destination,
            },
            Step::SetProtocolFeePercent {
                contract: FAN,
                percent: u(50_000_000_000_000_000),
            },
            Step::SetSubjectFeePercent {
                percent: u(40_000_000_000_000_000),
            },
            Step::SetReferrerFeePercent {
                contract: FAN,
                percent: u(10_000_000_000_000_000),
            },
            Step::SetReferrerStorage {
                contract: FAN,
                storage: STORAGE,
            },
            Step::BuyShares {
                subject: AddressRef::Deployer,
                amount: u(1_000_000),
            },
            Step::TransferOwnership {
                contract: FAN,
                new_owner,
            },
            Step::Deploy(COMMUNITY),
            Step::Verify(COMMUNITY),
            Step::SetFeeDestination {
                contract: COMMUNITY,
                destination: fee_destination,
            },
            Step::SetProtocolFeePercent {
                contract: COMMUNITY,
                percent: u(70_000_000_000_000_000),
            },
            Step::SetReferrerFeePercent {
                contract: COMMUNITY,
                percent: u(30_000_000_000_000_000),
            },
            Step::SetReferrerStorage {
                contract: COMMUNITY,
                storage: STORAGE,
            },
            Step::SetManager {
                manager: AddressRef::Deployer,
            },
            Step::SetProposalFee {
                fee: u(500_000_000_000_000),
            },
            Step::TransferOwnership {
                contract: COMMUNITY,
                new_owner,
            },
        ];

        assert_eq!(steps, expected);
    }

    #[test]
    fn test_full_rollout_without_verification() {
        let params = DeployParams::full_rollout().unwrap();
        let steps = full_rollout_plan(&params, false /* verify */).unwrap();

        assert!(!steps.iter().any(|step| matches!(step, Step::Verify(_))));
        assert_eq!(steps.len(), 18);
    }

    #[test]
    fn test_community_rollout_sequence() {
        let params = DeployParams::community_rollout().unwrap();
        let steps = community_rollout_plan(&params, false /* verify */).unwrap();

        let expected = vec![
            Step::Deploy(COMMUNITY),
            Step::SetFeeDestination {
                contract: COMMUNITY,
                destination: AddressRef::Literal(address!(
                    "444156834BC8Fc991324Bb2b5790Af0F1c57f825"
                )),
            },
            Step::SetProtocolFeePercent {
                contract: COMMUNITY,
                percent: u(70_000_000_000_000_000),
            },
            Step::SetReferrerFeePercent {
                contract: COMMUNITY,
                percent: u(30_000_000_000_000_000),
            },
            Step::SetReferrerStorage {
                contract: COMMUNITY,
                storage: AddressRef::Literal(address!("1D68ae39BF07d05d41755C6342a6F724129D9FE0")),
            },
            Step::SetManager {
                manager: AddressRef::Deployer,
            },
            Step::SetProposalFee {
                fee: u(50_000_000_000_000),
            },
            Step::CreateProposal {
                external_id: "tf_123456".to_string(),
                fee: u(50_000_000_000_000),
            },
            Step::UpdateProposalState {
                index: u(1),
                state: u(100),
            },
            Step::BuyCommunityShares {
                index: u(1),
                amount: u(1_000_000),
            },
            Step::TransferOwnership {
                contract: COMMUNITY,
                new_owner: AddressRef::Literal(address!(
                    "0eAF6Be67D7cB0ADE23f3dD8180e43ca41824226"
                )),
            },
        ];

        assert_eq!(steps, expected);
    }

    #[test]
    fn test_community_rollout_requires_existing_storage() {
        let mut params = DeployParams::community_rollout().unwrap();
        let steps = community_rollout_plan(&params, true /* verify */).unwrap();
        assert_eq!(steps[1], Step::Verify(COMMUNITY));

        params.community_shares.referrer_storage = None;
        assert!(matches!(
            community_rollout_plan(&params, true /* verify */),
            Err(ScriptError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_full_rollout_requires_fan_params() {
        let params = DeployParams::community_rollout().unwrap();
        assert!(full_rollout_plan(&params, false).is_err());
    }

    #[test]
    fn test_step_display() {
        let step = Step::CreateProposal {
            external_id: "tf_123456".to_string(),
            fee: u(50_000_000_000_000),
        };
        assert_eq!(
            step.to_string(),
            "TFCommunitySharesV1.createProposal(\"tf_123456\") paying 50000000000000 wei"
        );
        assert_eq!(
            Step::SetReferrerStorage {
                contract: FAN,
                storage: STORAGE
            }
            .to_string(),
            "TouchFanSharesV1.setReferrerStorage(<ReferrerStorage>)"
        );
    }
}
