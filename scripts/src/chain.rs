//! The chain access the rollout executor is written against

use alloy::{
    network::Ethereum,
    primitives::{Address, Bytes, TxHash, U256},
    providers::{DynProvider, Provider},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;

use crate::errors::ScriptError;

/// The outcome of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    /// The transaction hash
    pub tx_hash: TxHash,
    /// Whether the transaction succeeded
    pub success: bool,
    /// The block the transaction was mined in
    pub block_number: Option<u64>,
    /// The address of the contract created by the transaction, if any
    pub contract_address: Option<Address>,
}

/// A connection to the network the rollout runs against
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The ID of the connected chain
    async fn chain_id(&self) -> Result<u64, ScriptError>;

    /// The balance of an account, in wei
    async fn balance(&self, account: Address) -> Result<U256, ScriptError>;

    /// Execute a call against the latest block without sending it,
    /// returning its raw output
    async fn read(&self, tx: TransactionRequest) -> Result<Bytes, ScriptError>;

    /// Sign and send a transaction, then wait for it to be mined
    async fn send_and_wait(&self, tx: TransactionRequest) -> Result<TxOutcome, ScriptError>;
}

#[async_trait]
impl ChainClient for DynProvider<Ethereum> {
    async fn chain_id(&self) -> Result<u64, ScriptError> {
        self.get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
    }

    async fn balance(&self, account: Address) -> Result<U256, ScriptError> {
        self.get_balance(account)
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
    }

    async fn read(&self, tx: TransactionRequest) -> Result<Bytes, ScriptError> {
        Provider::call(self, tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }

    async fn send_and_wait(&self, tx: TransactionRequest) -> Result<TxOutcome, ScriptError> {
        let receipt = self
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(TxOutcome {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
            block_number: receipt.block_number,
            contract_address: receipt.contract_address,
        })
    }
}
