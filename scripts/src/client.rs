//! The network seam of the deploy scripts: everything the runner needs from a node

use alloy::{
    network::ReceiptResponse,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::TransactionRequest},
    transports::http::{reqwest, Http},
};
use async_trait::async_trait;

use crate::{
    config::DeploymentConfig,
    errors::{ClientError, ScriptError},
    types::DeployReceipt,
};

/// The RPC calls made while deploying a contract.
///
/// Every method except [`DeployClient::deployer`] performs a network round trip.
#[async_trait]
pub trait DeployClient {
    /// The address transactions are signed and sent from
    fn deployer(&self) -> Address;

    /// The chain ID reported by the node
    async fn chain_id(&self) -> Result<u64, ClientError>;

    /// The balance of `address`, in wei
    async fn balance(&self, address: Address) -> Result<U256, ClientError>;

    /// The next nonce of `address`
    async fn nonce(&self, address: Address) -> Result<u64, ClientError>;

    /// The gas the transaction is expected to consume
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, ClientError>;

    /// Sign and broadcast the transaction, returning its hash
    async fn broadcast(&self, tx: TransactionRequest) -> Result<TxHash, ClientError>;

    /// The receipt of a transaction, if it has been mined
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<DeployReceipt>, ClientError>;
}

/// A [`DeployClient`] talking to a JSON-RPC node over HTTP
pub struct RpcDeployClient {
    /// The signing provider
    provider: DynProvider,
    /// The address of the signer attached to the provider
    deployer: Address,
}

impl RpcDeployClient {
    /// Sets up a signing provider for the configured endpoint. Every request
    /// is bounded by the configured RPC timeout, and a timed-out request
    /// surfaces as a transport error.
    ///
    /// Performs no network access; the first request is made by the runner.
    pub fn new(config: &DeploymentConfig) -> Result<Self, ScriptError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.rpc_timeout)
            .build()
            .map_err(|e| ScriptError::Network(format!("building HTTP client: {e}")))?;

        let transport = Http::with_client(http_client, config.network.rpc_url.clone());
        let is_local = transport.guess_local();
        let provider = ProviderBuilder::new()
            .wallet(config.signer.clone())
            .connect_client(RpcClient::new(transport, is_local));

        Ok(Self {
            provider: DynProvider::new(provider),
            deployer: config.deployer(),
        })
    }
}

#[async_trait]
impl DeployClient for RpcDeployClient {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn chain_id(&self) -> Result<u64, ClientError> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn balance(&self, address: Address) -> Result<U256, ClientError> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn nonce(&self, address: Address) -> Result<u64, ClientError> {
        Ok(self.provider.get_transaction_count(address).await?)
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, ClientError> {
        Ok(self.provider.estimate_gas(tx).await?)
    }

    async fn broadcast(&self, tx: TransactionRequest) -> Result<TxHash, ClientError> {
        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<DeployReceipt>, ClientError> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;

        Ok(receipt.map(|r| DeployReceipt {
            success: r.status(),
            contract_address: r.contract_address(),
            block_number: r.block_number(),
            gas_used: r.gas_used(),
        }))
    }
}
