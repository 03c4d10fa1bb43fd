//! Utilities for the rollout scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::SolCall,
    transports::http::reqwest::Url,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    chain::{ChainClient, TxOutcome},
    constants::DEPLOYMENTS_KEY,
    errors::ScriptError,
    types::ContractKind,
};

/// The provider type used by the scripts
pub type Client = DynProvider<Ethereum>;

/// Parse the deployer's private key
pub fn parse_signer(priv_key: &str) -> Result<PrivateKeySigner, ScriptError> {
    PrivateKeySigner::from_str(priv_key.trim())
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
}

/// Sets up a signing client for the given private key and RPC url,
/// returning it alongside the deployer address
pub fn setup_client(priv_key: &str, rpc_url: &str) -> Result<(Client, Address), ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let signer = parse_signer(priv_key)?;
    let deployer = signer.address();

    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    Ok((DynProvider::new(provider), deployer))
}

/// Deploy the given creation bytecode, waiting for the deployment to be mined,
/// and return the address of the new contract
pub async fn deploy_contract<C: ChainClient + ?Sized>(
    client: &C,
    bytecode: Bytes,
) -> Result<Address, ScriptError> {
    let tx = TransactionRequest::default().with_deploy_code(bytecode);

    let outcome = client
        .send_and_wait(tx)
        .await
        .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;
    if !outcome.success {
        return Err(ScriptError::TransactionReverted(format!(
            "deployment {:#x}",
            outcome.tx_hash
        )));
    }

    outcome.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment("receipt carries no contract address".to_string())
    })
}

/// Send a contract call, paying `value`, and wait for it to be mined successfully
pub async fn send_tx<C, T>(
    client: &C,
    to: Address,
    call: T,
    value: U256,
) -> Result<TxOutcome, ScriptError>
where
    C: ChainClient + ?Sized,
    T: SolCall,
{
    let tx = TransactionRequest::default()
        .with_to(to)
        .with_input(call.abi_encode())
        .with_value(value);
    let outcome = client.send_and_wait(tx).await?;

    debug!(
        "{} tx {:#x} mined in block {:?}",
        T::SIGNATURE,
        outcome.tx_hash,
        outcome.block_number
    );

    if !outcome.success {
        return Err(ScriptError::TransactionReverted(format!(
            "{} {:#x}",
            T::SIGNATURE,
            outcome.tx_hash
        )));
    }

    Ok(outcome)
}

/// Call a view function and decode its return value
pub async fn call_view<C, T>(client: &C, to: Address, call: T) -> Result<T::Return, ScriptError>
where
    C: ChainClient + ?Sized,
    T: SolCall,
{
    let tx = TransactionRequest::default().with_to(to).with_input(call.abi_encode());
    let output = client.read(tx).await?;

    T::abi_decode_returns(&output)
        .map_err(|e| ScriptError::ContractInteraction(format!("{}: {e}", T::SIGNATURE)))
}

/// Read the deployments file as a JSON value, or an empty object if it does not exist
fn read_deployments_json(file_path: &Path) -> Result<Value, ScriptError> {
    if !file_path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents =
        fs::read_to_string(file_path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Read the address of the given contract from the deployments file
pub fn read_deployed_address(
    file_path: &Path,
    contract: ContractKind,
) -> Result<Option<Address>, ScriptError> {
    let parsed_json = read_deployments_json(file_path)?;

    parsed_json
        .get(DEPLOYMENTS_KEY)
        .and_then(|deployments| deployments.get(contract.name()))
        .and_then(Value::as_str)
        .map(|addr| {
            Address::from_str(addr).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
        })
        .transpose()
}

/// Record the address of the given contract in the deployments file,
/// preserving every other entry
pub fn write_deployed_address(
    file_path: &Path,
    contract: ContractKind,
    address: Address,
) -> Result<(), ScriptError> {
    let mut parsed_json = read_deployments_json(file_path)?;

    let root = parsed_json.as_object_mut().ok_or_else(|| {
        ScriptError::WriteDeployments("deployments file is not a JSON object".to_string())
    })?;
    let deployments = root
        .entry(DEPLOYMENTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            ScriptError::WriteDeployments(format!("`{DEPLOYMENTS_KEY}` is not a JSON object"))
        })?;
    deployments.insert(
        contract.name().to_string(),
        Value::String(format!("{address:#x}")),
    );

    let contents = serde_json::to_string_pretty(&parsed_json)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(file_path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}
