//! The deployment runner.
//!
//! A run moves through `validate → preflight → submit → confirm → record`. Only
//! the preflight RPC calls are retried; once the transaction has been broadcast
//! nothing is re-sent, and the wait for its receipt is bounded by the configured
//! timeout. An interrupt stops the run in any phase that touches the network.

use std::{future::Future, path::Path, time::Duration};

use alloy::{
    network::TransactionBuilder,
    primitives::{utils::format_ether, Bytes, TxHash},
    rpc::types::TransactionRequest,
};
use backon::Retryable;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    artifacts::ContractArtifact,
    client::DeployClient,
    config::{DeploymentConfig, RawDeploymentConfig, RetryConfig},
    deployments::{parse_addr_from_deployments_file, record_confirmed, record_pending},
    errors::{ClientError, ScriptError},
    types::{ContractSpec, DeployReceipt, DeploymentResult, DeploymentState, SubmittedDeployment},
};

/// Validate `raw`, connect, and deploy the contract described by `spec`.
///
/// `connect` is only invoked once the configuration is valid, so a
/// configuration error never reaches the network.
pub async fn run_deployment<C, F>(
    raw: RawDeploymentConfig,
    spec: ContractSpec,
    connect: F,
    cancel: CancellationToken,
) -> Result<DeploymentResult, ScriptError>
where
    C: DeployClient,
    F: FnOnce(&DeploymentConfig) -> Result<C, ScriptError>,
{
    let config = raw.validate()?;
    info!(
        network = %config.network.name,
        rpc_host = config.network.rpc_url.host_str().unwrap_or_default(),
        deployer = %config.deployer(),
        "loaded deployment configuration"
    );

    let client = connect(&config)?;
    DeploymentRunner::new(&config, &client, cancel)
        .run(&spec)
        .await
}

/// Print the outcome of a successful deployment to stdout
pub fn print_summary(result: &DeploymentResult) {
    if let Some(address) = result.contract_address() {
        println!("{} deployed to: {address}", result.artifact());
    }
    println!("Transaction hash: {}", result.tx_hash());
    if let Some(block) = result.block_number() {
        println!("Included in block {block}, gas used: {}", result.gas_used());
    }
}

/// A transaction ready to broadcast
struct PreparedDeployment {
    /// The contract-creation transaction
    tx: TransactionRequest,
    /// The chain the transaction targets
    chain_id: u64,
    /// The nonce the transaction is sent with
    nonce: u64,
}

/// Drives a single deployment through its lifecycle
pub struct DeploymentRunner<'a, C> {
    /// The validated configuration
    config: &'a DeploymentConfig,
    /// The node the deployment is sent through
    client: &'a C,
    /// Cancelled when the process is interrupted
    cancel: CancellationToken,
    /// Where the run currently stands
    state: DeploymentState,
}

impl<'a, C: DeployClient> DeploymentRunner<'a, C> {
    /// Create a runner in the `Unconfigured` state
    pub fn new(config: &'a DeploymentConfig, client: &'a C, cancel: CancellationToken) -> Self {
        Self {
            config,
            client,
            cancel,
            state: DeploymentState::Unconfigured,
        }
    }

    /// Deploy the contract described by `spec`. A runner is single-shot.
    pub async fn run(mut self, spec: &ContractSpec) -> Result<DeploymentResult, ScriptError> {
        let res = self.execute(spec).await;
        if let Err(e) = &res {
            debug!(error = %e, "deployment failed");
            self.transition(DeploymentState::Failed);
        }

        debug_assert!(self.state.is_terminal());
        res
    }

    /// Run every phase in order
    async fn execute(&mut self, spec: &ContractSpec) -> Result<DeploymentResult, ScriptError> {
        let deploy_code = self.validate(spec)?;
        self.transition(DeploymentState::Validated);

        let prepared = tokio::select! {
            _ = self.cancel.cancelled() => Err(ScriptError::InterruptedBeforeBroadcast),
            res = self.preflight(deploy_code) => res,
        }?;
        let submitted = self.submit(spec, prepared).await?;
        self.transition(DeploymentState::Submitted);
        self.record(|path| record_pending(path, &submitted));

        let result = self.confirm(submitted).await?;
        self.transition(DeploymentState::Confirmed);
        self.record(|path| record_confirmed(path, &result));

        Ok(result)
    }

    /// Move to `next`, which must be a forward transition
    fn transition(&mut self, next: DeploymentState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {} -> {next}",
            self.state
        );
        debug!(from = %self.state, to = %next, "deployment state changed");
        self.state = next;
    }

    // ------------
    // | Validate |
    // ------------

    /// Load the artifact and encode the constructor arguments
    fn validate(&self, spec: &ContractSpec) -> Result<Bytes, ScriptError> {
        let artifact = ContractArtifact::load(&self.config.artifacts_dir, &spec.artifact)?;
        let deploy_code = artifact.deploy_code(&spec.args)?;
        info!(
            contract = %artifact.name,
            constructor = %artifact.constructor_signature(),
            bytes = deploy_code.len(),
            "encoded deployment payload"
        );

        if let Some(path) = &self.config.deployments_path {
            if let Ok(existing) = parse_addr_from_deployments_file(path, &spec.contract_key) {
                warn!(
                    %existing,
                    key = %spec.contract_key,
                    "a deployment is already recorded, it will be replaced"
                );
            }
        }

        if self.config.explorer_api_key.is_some() {
            debug!("explorer API key is set, contract verification is left to the explorer tooling");
        }

        Ok(deploy_code)
    }

    // -------------
    // | Preflight |
    // -------------

    /// Read everything needed to build the transaction, retrying transient
    /// failures. Nothing is broadcast here.
    async fn preflight(&self, deploy_code: Bytes) -> Result<PreparedDeployment, ScriptError> {
        let client = self.client;
        let retry = &self.config.retry;
        let deployer = client.deployer();

        let chain_id = with_retry(retry, "chain ID", || client.chain_id())
            .await
            .map_err(network_error("fetching chain ID"))?;
        if let Some(expected) = self.config.network.chain_id {
            if expected != chain_id {
                return Err(ScriptError::ChainMismatch {
                    expected,
                    actual: chain_id,
                });
            }
        }

        let balance = with_retry(retry, "balance", || client.balance(deployer))
            .await
            .map_err(network_error("fetching deployer balance"))?;
        info!(%deployer, balance = %format_ether(balance), "deploying with account");
        if balance.is_zero() {
            warn!(%deployer, "deployer has no balance, the deployment will likely be rejected");
        }

        let nonce = with_retry(retry, "nonce", || client.nonce(deployer))
            .await
            .map_err(network_error("fetching deployer nonce"))?;

        let tx = TransactionRequest::default()
            .with_from(deployer)
            .with_deploy_code(deploy_code)
            .with_nonce(nonce)
            .with_chain_id(chain_id);

        let gas_limit = match self.config.gas_limit {
            Some(limit) => limit,
            None => with_retry(retry, "gas estimate", || client.estimate_gas(tx.clone()))
                .await
                .map_err(|e| match e {
                    ClientError::Transport(_) => ScriptError::Network(format!("estimating gas: {e}")),
                    _ => ScriptError::Submission(format!("gas estimation failed: {e}")),
                })?,
        };

        info!(
            chain_id,
            nonce,
            gas_limit,
            predicted_address = %deployer.create(nonce),
            "prepared deployment transaction"
        );

        Ok(PreparedDeployment {
            tx: tx.with_gas_limit(gas_limit),
            chain_id,
            nonce,
        })
    }

    // ----------
    // | Submit |
    // ----------

    /// Broadcast the transaction exactly once
    async fn submit(
        &self,
        spec: &ContractSpec,
        prepared: PreparedDeployment,
    ) -> Result<SubmittedDeployment, ScriptError> {
        if self.cancel.is_cancelled() {
            return Err(ScriptError::InterruptedBeforeBroadcast);
        }

        let deployer = self.client.deployer();
        let nonce = prepared.nonce;
        let sent = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(ScriptError::InterruptedDuringBroadcast { deployer, nonce });
            }
            sent = self.client.broadcast(prepared.tx) => sent,
        };

        let tx_hash = sent.map_err(|e| match e {
            ClientError::Transport(_) => ScriptError::Submission(format!(
                "{e}; the transaction may have reached the node, check the deployer's nonce \
                 before re-running"
            )),
            _ => ScriptError::Submission(e.to_string()),
        })?;
        info!(%tx_hash, "deployment transaction broadcast");

        Ok(SubmittedDeployment {
            artifact: spec.artifact.clone(),
            contract_key: spec.contract_key.clone(),
            tx_hash,
            deployer,
            nonce,
            chain_id: prepared.chain_id,
        })
    }

    // -----------
    // | Confirm |
    // -----------

    /// Wait for the transaction's receipt, bounded by the confirmation timeout
    async fn confirm(
        &self,
        submitted: SubmittedDeployment,
    ) -> Result<DeploymentResult, ScriptError> {
        let tx_hash = submitted.tx_hash;
        let timeout = self.config.confirmation_timeout;
        info!(%tx_hash, timeout_secs = timeout.as_secs(), "waiting for confirmation");

        let receipt = tokio::select! {
            _ = self.cancel.cancelled() => return Err(ScriptError::Interrupted(tx_hash)),
            res = tokio::time::timeout(timeout, self.wait_for_receipt(tx_hash)) => {
                res.map_err(|_| ScriptError::ConfirmationTimeout { tx_hash, timeout })?
            }
        };

        if !receipt.success {
            return Err(ScriptError::DeploymentReverted(tx_hash));
        }

        let address = receipt
            .contract_address
            .ok_or(ScriptError::MissingContractAddress(tx_hash))?;
        if address != submitted.predicted_address() {
            warn!(
                %address,
                predicted = %submitted.predicted_address(),
                "contract landed at an unexpected address"
            );
        }

        info!(
            %address,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "deployment confirmed"
        );
        Ok(submitted.confirm(receipt))
    }

    /// Poll for the receipt until it is available. Polling errors are logged
    /// and retried; the caller bounds the wait.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> DeployReceipt {
        loop {
            match self.client.receipt(tx_hash).await {
                Ok(Some(receipt)) => return receipt,
                Ok(None) => debug!(%tx_hash, "transaction not yet mined"),
                Err(e) => warn!(%tx_hash, error = %e, "failed to fetch receipt"),
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    // ----------
    // | Record |
    // ----------

    /// Update the deployments manifest, if one is configured. The transaction
    /// has already been broadcast, so failures here only warn.
    fn record(&self, write: impl FnOnce(&Path) -> Result<(), ScriptError>) {
        let Some(path) = &self.config.deployments_path else {
            return;
        };

        match write(path) {
            Ok(()) => debug!(path = %path.display(), "updated deployments manifest"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to update deployments manifest"),
        }
    }
}

/// Run a pre-broadcast RPC call, retrying transport failures with backoff
async fn with_retry<T, F, Fut>(
    retry: &RetryConfig,
    what: &'static str,
    call: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    call.retry(retry.to_backoff_builder())
        .when(ClientError::is_retryable)
        .notify(|e: &ClientError, delay: Duration| {
            warn!(error = %e, ?delay, "{what} request failed, retrying");
        })
        .await
}

/// Map a failed preflight call to a network error
fn network_error(context: &'static str) -> impl Fn(ClientError) -> ScriptError {
    move |e| ScriptError::Network(format!("{context}: {e}"))
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::PathBuf,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use alloy::primitives::{Address, U256};
    use tempfile::TempDir;

    use super::*;
    use crate::{
        artifacts::test_fixtures::{LP_LOCK_JSON, TOKEN_LOCK_JSON},
        client::{
            mock::{MockClient, Mining},
            RpcDeployClient,
        },
        config::SIGNING_KEY_FIELD,
        constants::{BASE_CHAIN_ID, LP_LOCK_CONTRACT_KEY},
        deployments::{read_history, RecordStatus},
        errors::ErrorCategory,
        types::DeployableContract,
    };

    /// The first default Anvil account
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    /// USDC on Base
    const USDC: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
    /// A fee wallet
    const FEE_WALLET: &str = "0x000000000000000000000000000000000000dEaD";

    /// An artifacts directory and manifest path in a temporary directory
    struct Workspace {
        /// Kept alive for the duration of the test
        _dir: TempDir,
        /// Configuration pointing into the temporary directory
        raw: RawDeploymentConfig,
        /// The manifest path
        manifest: PathBuf,
    }

    fn workspace() -> Workspace {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("artifacts");
        let lp_lock = artifacts.join("contracts/LPLock.sol");
        let token_lock = artifacts.join("contracts/TokenLock.sol");
        fs::create_dir_all(&lp_lock).unwrap();
        fs::create_dir_all(&token_lock).unwrap();
        fs::write(lp_lock.join("LPLock.json"), LP_LOCK_JSON).unwrap();
        fs::write(token_lock.join("TokenLock.json"), TOKEN_LOCK_JSON).unwrap();

        let manifest = dir.path().join("deployments.json");
        let raw = RawDeploymentConfig {
            rpc_url: Some("https://mainnet.base.org".to_string()),
            private_key: Some(TEST_KEY.to_string()),
            artifacts_dir: Some(artifacts),
            deployments_path: Some(manifest.clone()),
            ..Default::default()
        };

        Workspace {
            _dir: dir,
            raw,
            manifest,
        }
    }

    /// A validated config with delays short enough for tests
    fn fast_config(raw: RawDeploymentConfig) -> DeploymentConfig {
        let mut config = raw.validate().unwrap();
        config.retry.initial_delay = Duration::from_millis(1);
        config.retry.max_delay = Duration::from_millis(5);
        config.poll_interval = Duration::from_millis(5);
        config.confirmation_timeout = Duration::from_secs(5);
        config
    }

    fn lp_lock_spec() -> ContractSpec {
        ContractSpec::for_contract(
            DeployableContract::LpLock,
            vec![Some(USDC.to_string()), Some(FEE_WALLET.to_string())],
        )
    }

    fn mock_for(config: &DeploymentConfig) -> MockClient {
        MockClient::new(config.deployer(), BASE_CHAIN_ID)
    }

    #[tokio::test]
    async fn test_successful_deployment() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config).with_mining(Mining::After(2));

        let result = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap();

        let address = result.contract_address().unwrap();
        assert!(result.is_confirmed());
        assert_eq!(address, config.deployer().create(0));
        assert_eq!(address.to_string().len(), 42);
        assert!(address.to_string().starts_with("0x"));
        assert_eq!(result.tx_hash().to_string().len(), 66);
        assert_eq!(client.broadcasts(), 1);
    }

    #[tokio::test]
    async fn test_consecutive_deployments_get_distinct_addresses() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config);

        let first = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap();
        let second = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap();

        assert_ne!(first.contract_address(), second.contract_address());
        assert_ne!(first.tx_hash(), second.tx_hash());
        assert_eq!(second.nonce(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_network_calls() {
        let ws = workspace();
        let raw = RawDeploymentConfig {
            private_key: None,
            ..ws.raw.clone()
        };
        let client = MockClient::new(Address::ZERO, BASE_CHAIN_ID);
        let handle = client.clone();

        let err = run_deployment(raw, lp_lock_spec(), |_| Ok(client), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::MissingConfig(SIGNING_KEY_FIELD)));
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("signing key"));
        assert_eq!(handle.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_constructor_arg_is_named() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config);
        let spec = ContractSpec::for_contract(
            DeployableContract::LpLock,
            vec![Some(USDC.to_string()), None],
        );

        let err = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&spec)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("PLATFORM_FEE_WALLET"));
        assert_eq!(client.calls(), 0);
        assert_eq!(client.broadcasts(), 0);
    }

    #[tokio::test]
    async fn test_wrong_arity_fails_before_submission() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config);
        let spec = ContractSpec::for_artifact("LPLock", vec![USDC.to_string()]);

        let err = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&spec)
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::ConstructorArgs(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_before_broadcast() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config).with_nonce_failures(2);

        let result = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap();

        assert!(result.is_confirmed());
        assert_eq!(client.broadcasts(), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let ws = workspace();
        let mut config = fast_config(ws.raw.clone());
        config.retry.max_retries = 2;
        let client = mock_for(&config).with_nonce_failures(10);

        let err = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(client.broadcasts(), 0);
    }

    #[tokio::test]
    async fn test_failed_broadcast_is_not_retried() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config)
            .with_broadcast_error(ClientError::Transport("connection reset".to_string()));

        let err = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::Submission(_)));
        assert_eq!(client.broadcasts(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_reports_tx_hash() {
        let ws = workspace();
        let mut config = fast_config(ws.raw.clone());
        config.confirmation_timeout = Duration::from_millis(50);
        let client = mock_for(&config).with_mining(Mining::Never);

        let err = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap_err();

        let ScriptError::ConfirmationTimeout { tx_hash, .. } = &err else {
            panic!("expected a timeout, got {err}");
        };
        assert_eq!(err.category(), ErrorCategory::UnknownOutcome);
        assert!(err.to_string().contains(&tx_hash.to_string()));
        assert_eq!(client.broadcasts(), 1);
    }

    #[tokio::test]
    async fn test_reverted_deployment_fails() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config).with_mining(Mining::Reverted);

        let err = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::DeploymentReverted(_)));
        assert_eq!(err.category(), ErrorCategory::Submission);
    }

    #[tokio::test]
    async fn test_interrupt_while_waiting() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config).with_mining(Mining::Never);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let err = DeploymentRunner::new(&config, &client, cancel)
            .run(&lp_lock_spec())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::Interrupted(_)));
        assert_eq!(client.broadcasts(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_before_broadcast_sends_nothing() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = DeploymentRunner::new(&config, &client, cancel)
            .run(&lp_lock_spec())
            .await
            .unwrap_err();

        assert!(matches!(err, ScriptError::InterruptedBeforeBroadcast));
        assert_eq!(client.broadcasts(), 0);
    }

    #[tokio::test]
    async fn test_chain_mismatch_fails_before_broadcast() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = MockClient::new(config.deployer(), 1);

        let err = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScriptError::ChainMismatch {
                expected: BASE_CHAIN_ID,
                actual: 1
            }
        ));
        assert_eq!(client.broadcasts(), 0);
    }

    #[tokio::test]
    async fn test_configured_gas_limit_is_used() {
        let ws = workspace();
        let raw = RawDeploymentConfig {
            gas_limit: Some(2_000_000),
            ..ws.raw.clone()
        };
        let config = fast_config(raw);
        let client = mock_for(&config).with_balance(U256::ZERO);

        DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap();

        let tx = client.last_tx().unwrap();
        assert_eq!(tx.gas, Some(2_000_000));
        assert_eq!(tx.chain_id, Some(BASE_CHAIN_ID));
        assert_eq!(tx.nonce, Some(0));
    }

    #[tokio::test]
    async fn test_manifest_is_written() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config);

        let result = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap();

        let recorded = parse_addr_from_deployments_file(&ws.manifest, LP_LOCK_CONTRACT_KEY).unwrap();
        assert_eq!(Some(recorded), result.contract_address());

        let history = read_history(&ws.manifest).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, RecordStatus::Confirmed);
        assert_eq!(history[0].tx_hash, result.tx_hash());
    }

    #[tokio::test]
    async fn test_timed_out_deployment_stays_pending() {
        let ws = workspace();
        let mut config = fast_config(ws.raw.clone());
        config.confirmation_timeout = Duration::from_millis(30);
        let client = mock_for(&config).with_mining(Mining::Never);

        DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&lp_lock_spec())
            .await
            .unwrap_err();

        let history = read_history(&ws.manifest).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, RecordStatus::Pending);
        assert!(parse_addr_from_deployments_file(&ws.manifest, LP_LOCK_CONTRACT_KEY).is_err());
    }

    #[tokio::test]
    async fn test_constructorless_contract_deploys() {
        let ws = workspace();
        let raw = RawDeploymentConfig {
            no_manifest: true,
            ..ws.raw.clone()
        };
        let config = fast_config(raw);
        let client = mock_for(&config);
        let spec = ContractSpec::for_contract(DeployableContract::TokenLock, Vec::new());

        let result = DeploymentRunner::new(&config, &client, CancellationToken::new())
            .run(&spec)
            .await
            .unwrap();

        assert!(result.is_confirmed());
        assert!(!ws.manifest.exists());
    }

    /// Cancel `cancel` after a short delay
    fn cancel_soon(cancel: &CancellationToken) {
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });
    }

    #[tokio::test]
    async fn test_interrupt_while_preflight_is_stalled() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config).with_stalled_chain_id();
        let cancel = CancellationToken::new();
        cancel_soon(&cancel);

        let spec = lp_lock_spec();
        let run = DeploymentRunner::new(&config, &client, cancel).run(&spec);
        let err = tokio::time::timeout(Duration::from_secs(3), run)
            .await
            .expect("runner did not stop after interrupt")
            .unwrap_err();

        assert!(matches!(err, ScriptError::InterruptedBeforeBroadcast));
        assert_eq!(err.category(), ErrorCategory::Aborted);
        assert_eq!(client.broadcasts(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_while_broadcast_is_stalled() {
        let ws = workspace();
        let config = fast_config(ws.raw.clone());
        let client = mock_for(&config).with_stalled_broadcast();
        let cancel = CancellationToken::new();
        cancel_soon(&cancel);

        let spec = lp_lock_spec();
        let run = DeploymentRunner::new(&config, &client, cancel).run(&spec);
        let err = tokio::time::timeout(Duration::from_secs(3), run)
            .await
            .expect("runner did not stop after interrupt")
            .unwrap_err();

        assert!(matches!(
            err,
            ScriptError::InterruptedDuringBroadcast { nonce: 0, .. }
        ));
        assert_eq!(err.category(), ErrorCategory::UnknownOutcome);
        assert_eq!(client.broadcasts(), 1);
    }

    #[tokio::test]
    async fn test_unresponsive_node_times_out_and_is_retried() {
        // A node that accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(stream);
            }
        });

        let raw = RawDeploymentConfig {
            rpc_url: Some(format!("http://{addr}")),
            private_key: Some(TEST_KEY.to_string()),
            ..Default::default()
        };
        let mut config = fast_config(raw);
        config.rpc_timeout = Duration::from_millis(100);
        config.retry.max_retries = 2;
        let client = RpcDeployClient::new(&config).unwrap();

        let err = with_retry(&config.retry, "chain ID", || client.chain_id())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }
}
