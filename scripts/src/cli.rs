//! Definitions of CLI arguments and commands for the rollout scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    commands::{deploy_all, deploy_community, print_rollout, verify_contract},
    constants::{
        DEFAULT_ARTIFACTS_PATH, DEFAULT_DEPLOYMENTS_PATH, DEFAULT_RPC_URL, DEFAULT_SOLC_VERSION,
        DEFAULT_SOURCES_PATH, DEFAULT_ZKSOLC_VERSION,
    },
    errors::ScriptError,
    types::ContractKind,
    verify::{CompilerSettings, ExplorerVerifier},
};

/// Deploy and configure the TouchFan share contracts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Private key of the deployer, required by every subcommand that sends
    /// transactions
    #[arg(short, long = "priv-key", env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Directory containing the compiled contract artifacts
    #[arg(long, env = "ARTIFACTS_PATH", default_value = DEFAULT_ARTIFACTS_PATH)]
    pub artifacts_path: PathBuf,

    /// Path to the file in which deployed addresses are recorded
    #[arg(short, long, env = "DEPLOYMENTS_PATH", default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: PathBuf,

    /// Explorer verification settings
    #[command(flatten)]
    pub verification: VerificationArgs,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// The rollout subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy ReferrerStorage, TouchFanSharesV1 and TFCommunitySharesV1,
    /// wire them together, buy the deployer's first shares and hand over ownership
    DeployAll(RolloutArgs),
    /// Deploy TFCommunitySharesV1 alone against an existing ReferrerStorage,
    /// seed it with a proposal and hand over ownership
    DeployCommunity(RolloutArgs),
    /// Print the steps a rollout would take, without sending anything
    Plan(PlanArgs),
    /// Verify the source of an already-deployed contract
    Verify(VerifyArgs),
}

/// Arguments shared by both rollouts
#[derive(Args)]
pub struct RolloutArgs {
    /// TOML file of rollout parameters, replacing the built-in preset
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Skip source verification even if a verification URL is configured
    #[arg(long)]
    pub no_verify: bool,
}

/// Arguments of the `plan` subcommand
#[derive(Args)]
pub struct PlanArgs {
    /// The rollout to print
    #[arg(value_enum)]
    pub rollout: Rollout,

    /// Parameters of the printed rollout
    #[command(flatten)]
    pub rollout_args: RolloutArgs,
}

/// The available rollouts
#[derive(ValueEnum, Copy, Clone, Debug)]
pub enum Rollout {
    /// The full three-contract rollout
    All,
    /// The standalone community shares rollout
    Community,
}

/// Arguments of the `verify` subcommand
#[derive(Args)]
pub struct VerifyArgs {
    /// The contract to verify
    #[arg(short, long, value_enum)]
    pub contract: ContractKind,

    /// The contract address, read from the deployments file if absent
    #[arg(short, long)]
    pub address: Option<String>,
}

/// Explorer verification settings
#[derive(Args, Clone)]
pub struct VerificationArgs {
    /// The explorer's contract verification endpoint.
    /// Verification is skipped when unset.
    #[arg(long, env = "VERIFY_URL")]
    pub verify_url: Option<String>,

    /// Project root containing the flattened sources under `contracts/`
    #[arg(long, env = "SOURCES_PATH", default_value = DEFAULT_SOURCES_PATH)]
    pub sources_path: PathBuf,

    /// The solc version the contracts were compiled with
    #[arg(long, default_value = DEFAULT_SOLC_VERSION)]
    pub solc_version: String,

    /// The zksolc version the contracts were compiled with
    #[arg(long, default_value = DEFAULT_ZKSOLC_VERSION)]
    pub zksolc_version: String,

    /// Whether the contracts were compiled without the optimizer
    #[arg(long)]
    pub no_optimization: bool,
}

impl VerificationArgs {
    /// The explorer verifier, if a verification URL is configured
    pub fn verifier(&self) -> Option<ExplorerVerifier> {
        self.verify_url.as_deref().map(|url| {
            ExplorerVerifier::new(
                url,
                CompilerSettings {
                    solc_version: self.solc_version.clone(),
                    zksolc_version: self.zksolc_version.clone(),
                    optimization_used: !self.no_optimization,
                },
            )
        })
    }
}

impl Cli {
    /// Run the selected subcommand
    pub async fn run(self) -> Result<(), ScriptError> {
        match self.command {
            Command::DeployAll(ref args) => deploy_all(args, &self).await,
            Command::DeployCommunity(ref args) => deploy_community(args, &self).await,
            Command::Plan(ref args) => print_rollout(args, &self),
            Command::Verify(ref args) => verify_contract(args, &self).await,
        }
    }
}
