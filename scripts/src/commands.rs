//! Implementations of the rollout subcommands

use std::str::FromStr;

use alloy::primitives::Address;
use tracing::info;

use crate::{
    artifacts::load_artifact,
    cli::{Cli, PlanArgs, Rollout, RolloutArgs, VerifyArgs},
    errors::ScriptError,
    executor::{print_plan, Executor, ExecutorPaths},
    params::DeployParams,
    plan::{community_rollout_plan, full_rollout_plan, Step},
    utils::{read_deployed_address, setup_client},
    verify::VerificationRequest,
};

/// Deploy and wire up all three contracts
pub async fn deploy_all(args: &RolloutArgs, cli: &Cli) -> Result<(), ScriptError> {
    info!("Running the full rollout");
    let steps = build_plan(Rollout::All, args, cli)?;
    execute(&steps, args, cli).await
}

/// Deploy and seed the community shares contract alone
pub async fn deploy_community(args: &RolloutArgs, cli: &Cli) -> Result<(), ScriptError> {
    info!("Running the community rollout");
    let steps = build_plan(Rollout::Community, args, cli)?;
    execute(&steps, args, cli).await
}

/// Print a rollout's steps without connecting to the network
pub fn print_rollout(args: &PlanArgs, cli: &Cli) -> Result<(), ScriptError> {
    let steps = build_plan(args.rollout, &args.rollout_args, cli)?;
    print_plan(&steps, &cli.deployments_path);
    Ok(())
}

/// Verify the source of a contract deployed earlier
pub async fn verify_contract(args: &VerifyArgs, cli: &Cli) -> Result<(), ScriptError> {
    let verifier = cli.verification.verifier().ok_or_else(|| {
        ScriptError::Verification("a verification URL is required (--verify-url)".to_string())
    })?;

    let address = match &args.address {
        Some(addr) => {
            Address::from_str(addr).map_err(|e| ScriptError::Verification(e.to_string()))?
        }
        None => read_deployed_address(&cli.deployments_path, args.contract)?
            .ok_or_else(|| ScriptError::MissingDeployment(args.contract.to_string()))?,
    };

    let artifact = load_artifact(&cli.artifacts_path, args.contract)?;
    let request = VerificationRequest::for_artifact(
        &artifact,
        address,
        &cli.verification.sources_path,
        verifier.settings(),
    )?;

    let id = verifier.verify(&request).await?;
    info!("{} at {address} verified (verification {id})", args.contract);
    Ok(())
}

/// Load the rollout's parameters and build its plan
fn build_plan(rollout: Rollout, args: &RolloutArgs, cli: &Cli) -> Result<Vec<Step>, ScriptError> {
    let verify = !args.no_verify && cli.verification.verify_url.is_some();

    let steps = match rollout {
        Rollout::All => {
            let params = DeployParams::load_or(args.params.as_deref(), DeployParams::full_rollout)?;
            params.validate()?;
            full_rollout_plan(&params, verify)?
        }
        Rollout::Community => {
            let params =
                DeployParams::load_or(args.params.as_deref(), DeployParams::community_rollout)?;
            params.validate_standalone_community()?;
            community_rollout_plan(&params, verify)?
        }
    };

    Ok(steps)
}

/// Connect, run the plan, and report the deployed addresses
async fn execute(steps: &[Step], args: &RolloutArgs, cli: &Cli) -> Result<(), ScriptError> {
    let priv_key = cli.priv_key.as_deref().ok_or_else(|| {
        ScriptError::ClientInitialization(
            "a private key is required (--priv-key or WALLET_PRIVATE_KEY)".to_string(),
        )
    })?;
    let (client, deployer) = setup_client(priv_key, &cli.rpc_url)?;
    let verifier = if args.no_verify {
        None
    } else {
        cli.verification.verifier()
    };

    let paths = ExecutorPaths {
        artifacts: cli.artifacts_path.clone(),
        sources: cli.verification.sources_path.clone(),
        deployments: cli.deployments_path.clone(),
    };
    let mut executor = Executor::new(client, deployer, paths, verifier);

    executor.log_context().await?;
    let deployed = executor.run(steps).await?;

    for (kind, address) in deployed {
        info!("{kind}: {address}");
    }
    info!(
        "Rollout complete, addresses recorded in {}",
        cli.deployments_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{deploy_community, print_rollout};
    use crate::{
        cli::{Cli, Command},
        errors::ScriptError,
    };

    #[test]
    fn test_plan_needs_no_private_key() {
        let cli = Cli::try_parse_from(["touchfan-deploy", "plan", "all"]).unwrap();
        match &cli.command {
            Command::Plan(args) => print_rollout(args, &cli).unwrap(),
            _ => panic!("expected plan"),
        }
    }

    #[tokio::test]
    async fn test_rollout_needs_private_key() {
        let cli = Cli::try_parse_from(["touchfan-deploy", "deploy-community"]).unwrap();
        assert!(cli.priv_key.is_none());

        match &cli.command {
            Command::DeployCommunity(args) => assert!(matches!(
                deploy_community(args, &cli).await,
                Err(ScriptError::ClientInitialization(_))
            )),
            _ => panic!("expected deploy-community"),
        }
    }
}
