//! Execution of rollout plans against the chain

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use alloy::{
    primitives::{utils::format_ether, Address, U256},
    sol_types::SolCall,
};
use tracing::{info, warn};

use crate::{
    artifacts::{load_artifact, Artifact},
    chain::ChainClient,
    errors::ScriptError,
    plan::{AddressRef, Step},
    solidity::{IReferrerStorage, ITFCommunityShares, ITouchFanShares},
    types::ContractKind,
    utils::{call_view, deploy_contract, read_deployed_address, send_tx, write_deployed_address},
    verify::{ExplorerVerifier, VerificationRequest},
};

/// Where the executor finds its inputs and records its outputs
#[derive(Debug, Clone)]
pub struct ExecutorPaths {
    /// The directory of compiled contract artifacts
    pub artifacts: PathBuf,
    /// The project root under which flattened sources live
    pub sources: PathBuf,
    /// The deployments file
    pub deployments: PathBuf,
}

/// Runs the steps of a plan one after the other, each transaction
/// awaited to a successful receipt before the next is sent
pub struct Executor<C> {
    /// The signing client
    client: C,
    /// The address of the signing account
    deployer: Address,
    /// Input and output locations
    paths: ExecutorPaths,
    /// The explorer verifier, if verification is enabled
    verifier: Option<ExplorerVerifier>,
    /// Loaded artifacts, by contract
    artifacts: HashMap<ContractKind, Artifact>,
    /// Contracts deployed during this run
    deployed: HashMap<ContractKind, Address>,
}

impl<C: ChainClient> Executor<C> {
    /// Create an executor
    pub fn new(
        client: C,
        deployer: Address,
        paths: ExecutorPaths,
        verifier: Option<ExplorerVerifier>,
    ) -> Self {
        Self {
            client,
            deployer,
            paths,
            verifier,
            artifacts: HashMap::new(),
            deployed: HashMap::new(),
        }
    }

    /// Load the artifacts of every contract the plan deploys or verifies,
    /// so that a broken artifact fails the run before any transaction is sent
    pub fn preflight(&mut self, steps: &[Step]) -> Result<(), ScriptError> {
        for kind in steps.iter().filter_map(Step::artifact) {
            if !self.artifacts.contains_key(&kind) {
                let artifact = load_artifact(&self.paths.artifacts, kind)?;
                self.artifacts.insert(kind, artifact);
            }
        }

        if steps.iter().any(|step| matches!(step, Step::Verify(_))) && self.verifier.is_none() {
            return Err(ScriptError::Verification(
                "plan verifies contracts but no verification URL is configured".to_string(),
            ));
        }

        Ok(())
    }

    /// Log the chain and deployer the rollout runs against
    pub async fn log_context(&self) -> Result<(), ScriptError> {
        let chain_id = self.client.chain_id().await?;
        let balance = self.client.balance(self.deployer).await?;

        info!("Chain ID: {chain_id}");
        info!("Deployer: {} ({} ETH)", self.deployer, format_ether(balance));
        if balance.is_zero() {
            warn!("Deployer has no balance, transactions will fail");
        }

        Ok(())
    }

    /// Check the plan, then run every step of it, returning the contracts deployed
    pub async fn run(
        &mut self,
        steps: &[Step],
    ) -> Result<Vec<(ContractKind, Address)>, ScriptError> {
        self.preflight(steps)?;

        let total = steps.len();
        for (i, step) in steps.iter().enumerate() {
            info!("[{}/{total}] {step}", i + 1);
            self.run_step(step).await?;
        }

        let mut deployed: Vec<_> = self.deployed.iter().map(|(k, a)| (*k, *a)).collect();
        deployed.sort_by_key(|(kind, _)| kind.name());
        Ok(deployed)
    }

    /// Run a single step
    async fn run_step(&mut self, step: &Step) -> Result<(), ScriptError> {
        match step {
            Step::Deploy(kind) => self.deploy(*kind).await,
            Step::Verify(kind) => self.verify(*kind).await,
            Step::SetReferrer { referrer } => {
                let referrer = self.resolve(referrer)?;
                let to = self.address_of(ContractKind::ReferrerStorage)?;
                self.send(to, IReferrerStorage::setReferrerCall { referrer }, U256::ZERO)
                    .await
            }
            Step::SetFeeDestination { contract, destination } => {
                let destination = self.resolve(destination)?;
                let to = self.shares_address(*contract, step)?;
                match contract {
                    ContractKind::TouchFanSharesV1 => {
                        let call = ITouchFanShares::setFeeDestinationCall {
                            feeDestination: destination,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                    _ => {
                        let call = ITFCommunityShares::setFeeDestinationCall {
                            feeDestination: destination,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                }
            }
            Step::SetProtocolFeePercent { contract, percent } => {
                let to = self.shares_address(*contract, step)?;
                let percent = *percent;
                match contract {
                    ContractKind::TouchFanSharesV1 => {
                        let call = ITouchFanShares::setProtocolFeePercentCall {
                            feePercent: percent,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                    _ => {
                        let call = ITFCommunityShares::setProtocolFeePercentCall {
                            feePercent: percent,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                }
            }
            Step::SetSubjectFeePercent { percent } => {
                let to = self.address_of(ContractKind::TouchFanSharesV1)?;
                let call = ITouchFanShares::setSubjectFeePercentCall {
                    feePercent: *percent,
                };
                self.send(to, call, U256::ZERO).await
            }
            Step::SetReferrerFeePercent { contract, percent } => {
                let to = self.shares_address(*contract, step)?;
                let percent = *percent;
                match contract {
                    ContractKind::TouchFanSharesV1 => {
                        let call = ITouchFanShares::setReferrerFeePercentCall {
                            feePercent: percent,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                    _ => {
                        let call = ITFCommunityShares::setReferrerFeePercentCall {
                            feePercent: percent,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                }
            }
            Step::SetReferrerStorage { contract, storage } => {
                let storage = self.resolve(storage)?;
                let to = self.shares_address(*contract, step)?;
                match contract {
                    ContractKind::TouchFanSharesV1 => {
                        let call = ITouchFanShares::setReferrerStorageCall {
                            referrerStorage: storage,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                    _ => {
                        let call = ITFCommunityShares::setReferrerStorageCall {
                            referrerStorage: storage,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                }
            }
            Step::BuyShares { subject, amount } => {
                let subject = self.resolve(subject)?;
                let to = self.address_of(ContractKind::TouchFanSharesV1)?;
                let quote = ITouchFanShares::getBuyPriceAfterFeeCall {
                    sharesSubject: subject,
                    amount: *amount,
                };
                let price = call_view(&self.client, to, quote).await?;
                log_quote(*amount, price);

                let call = ITouchFanShares::buySharesCall {
                    sharesSubject: subject,
                    amount: *amount,
                };
                self.send(to, call, price).await
            }
            Step::SetManager { manager } => {
                let manager = self.resolve(manager)?;
                let to = self.address_of(ContractKind::TfCommunitySharesV1)?;
                self.send(to, ITFCommunityShares::setManagerCall { manager }, U256::ZERO)
                    .await
            }
            Step::SetProposalFee { fee } => {
                let to = self.address_of(ContractKind::TfCommunitySharesV1)?;
                let call = ITFCommunityShares::setProposalFeeCall { proposalFee: *fee };
                self.send(to, call, U256::ZERO).await
            }
            Step::CreateProposal { external_id, fee } => {
                let to = self.address_of(ContractKind::TfCommunitySharesV1)?;
                let call = ITFCommunityShares::createProposalCall {
                    proposalId: external_id.clone(),
                };
                self.send(to, call, *fee).await
            }
            Step::UpdateProposalState { index, state } => {
                let to = self.address_of(ContractKind::TfCommunitySharesV1)?;
                let call = ITFCommunityShares::updateProposalStateCall {
                    proposalIndex: *index,
                    state: *state,
                };
                self.send(to, call, U256::ZERO).await
            }
            Step::BuyCommunityShares { index, amount } => {
                let to = self.address_of(ContractKind::TfCommunitySharesV1)?;
                let quote = ITFCommunityShares::getCommunityBuyPriceAfterFeeCall {
                    proposalIndex: *index,
                    amount: *amount,
                };
                let price = call_view(&self.client, to, quote).await?;
                log_quote(*amount, price);

                let call = ITFCommunityShares::buyCommunitySharesCall {
                    proposalIndex: *index,
                    amount: *amount,
                };
                self.send(to, call, price).await
            }
            Step::TransferOwnership { contract, new_owner } => {
                let new_owner = self.resolve(new_owner)?;
                let to = self.shares_address(*contract, step)?;
                match contract {
                    ContractKind::TouchFanSharesV1 => {
                        let call = ITouchFanShares::transferOwnershipCall {
                            newOwner: new_owner,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                    _ => {
                        let call = ITFCommunityShares::transferOwnershipCall {
                            newOwner: new_owner,
                        };
                        self.send(to, call, U256::ZERO).await
                    }
                }
            }
        }
    }

    /// Send a contract call and wait for it to succeed
    async fn send<T: SolCall>(&self, to: Address, call: T, value: U256) -> Result<(), ScriptError> {
        send_tx(&self.client, to, call, value).await.map(|_| ())
    }

    /// Deploy a contract and record its address
    async fn deploy(&mut self, kind: ContractKind) -> Result<(), ScriptError> {
        let bytecode = self.artifact(kind)?.bytecode.clone();
        let address = deploy_contract(&self.client, bytecode).await?;
        info!("{kind} was deployed to {address}");

        self.deployed.insert(kind, address);
        write_deployed_address(&self.paths.deployments, kind, address)
    }

    /// Verify a deployed contract's source
    async fn verify(&self, kind: ContractKind) -> Result<(), ScriptError> {
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            ScriptError::Verification("no verification URL is configured".to_string())
        })?;
        let address = self.address_of(kind)?;
        let request = VerificationRequest::for_artifact(
            self.artifact(kind)?,
            address,
            &self.paths.sources,
            verifier.settings(),
        )?;

        let id = verifier.verify(&request).await?;
        info!("{kind} source verified (verification {id})");
        Ok(())
    }

    /// The address a reference points to
    fn resolve(&self, addr: &AddressRef) -> Result<Address, ScriptError> {
        match addr {
            AddressRef::Literal(addr) => Ok(*addr),
            AddressRef::Deployer => Ok(self.deployer),
            AddressRef::Deployed(kind) => self.address_of(*kind),
        }
    }

    /// The address of a contract deployed in this run, falling back to the
    /// deployments file
    fn address_of(&self, kind: ContractKind) -> Result<Address, ScriptError> {
        if let Some(addr) = self.deployed.get(&kind) {
            return Ok(*addr);
        }

        read_deployed_address(&self.paths.deployments, kind)?
            .ok_or_else(|| ScriptError::MissingDeployment(kind.to_string()))
    }

    /// The address of one of the two shares contracts
    fn shares_address(&self, kind: ContractKind, step: &Step) -> Result<Address, ScriptError> {
        match kind {
            ContractKind::ReferrerStorage => Err(unsupported(step)),
            ContractKind::TouchFanSharesV1 | ContractKind::TfCommunitySharesV1 => {
                self.address_of(kind)
            }
        }
    }

    /// The loaded artifact of a contract
    fn artifact(&self, kind: ContractKind) -> Result<&Artifact, ScriptError> {
        self.artifacts
            .get(&kind)
            .ok_or_else(|| ScriptError::ArtifactParsing(format!("{kind} artifact not loaded")))
    }
}

/// Log the price quoted for a share purchase
fn log_quote(amount: U256, price: U256) {
    info!(
        "buying {amount} shares for {price} wei ({} ETH)",
        format_ether(price)
    );
}

/// The error for a step aimed at a contract that has no such method
fn unsupported(step: &Step) -> ScriptError {
    ScriptError::ContractInteraction(format!("unsupported step: {step}"))
}

/// Print the plan without sending anything
pub fn print_plan(steps: &[Step], deployments_path: &Path) {
    let total = steps.len();
    for (i, step) in steps.iter().enumerate() {
        info!("[{}/{total}] {step}", i + 1);
    }
    info!(
        "Dry run: nothing sent, deployments would be recorded in {}",
        deployments_path.display()
    );
}
