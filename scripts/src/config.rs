//! Deployment configuration, validated once at startup and passed to the runner

use std::{path::PathBuf, str::FromStr, time::Duration};

use alloy::{
    primitives::{Address, B256},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use backon::ExponentialBuilder;

use crate::{
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_DEPLOYMENTS_PATH,
        DEFAULT_NETWORK, DEFAULT_POLL_INTERVAL, DEFAULT_RPC_TIMEOUT, DEFAULT_RETRY_INITIAL_DELAY,
        DEFAULT_RETRY_MAX_DELAY, DEFAULT_RPC_MAX_RETRIES, KNOWN_NETWORKS, PRIVATE_KEY_HEX_LEN,
    },
    errors::ScriptError,
};

/// The name under which a missing signing key is reported
pub const SIGNING_KEY_FIELD: &str = "signing key";
/// The name under which a missing RPC endpoint is reported
pub const RPC_ENDPOINT_FIELD: &str = "RPC endpoint";

/// Configuration exactly as it was provided, before any validation
#[derive(Clone, Default)]
pub struct RawDeploymentConfig {
    /// The network name
    pub network: Option<String>,
    /// The RPC endpoint URL
    pub rpc_url: Option<String>,
    /// A fallback RPC endpoint URL, used when `rpc_url` is unset
    pub fallback_rpc_url: Option<String>,
    /// The deployer's private key, with or without a `0x` prefix
    pub private_key: Option<String>,
    /// An explicit chain ID, overriding the one implied by the network name
    pub chain_id: Option<u64>,
    /// A fixed gas limit for the deployment transaction
    pub gas_limit: Option<u64>,
    /// Seconds to wait for the deployment to be mined
    pub confirmation_timeout_secs: Option<u64>,
    /// Milliseconds between receipt polls
    pub poll_interval_ms: Option<u64>,
    /// Seconds allowed for a single RPC request
    pub rpc_timeout_secs: Option<u64>,
    /// Retries allowed for each pre-broadcast RPC call
    pub max_retries: Option<u32>,
    /// The directory holding compiled artifacts
    pub artifacts_dir: Option<PathBuf>,
    /// The path of the deployments manifest
    pub deployments_path: Option<PathBuf>,
    /// Skip writing the deployments manifest
    pub no_manifest: bool,
    /// The chain explorer API key
    pub explorer_api_key: Option<String>,
}

/// The network a deployment targets
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// The network name
    pub name: String,
    /// The RPC endpoint
    pub rpc_url: Url,
    /// The chain ID the RPC endpoint must report, if known
    pub chain_id: Option<u64>,
}

/// Backoff settings for RPC calls made before the deployment is broadcast
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial delay for exponential backoff
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RPC_MAX_RETRIES,
            initial_delay: DEFAULT_RETRY_INITIAL_DELAY,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
        }
    }
}

impl RetryConfig {
    /// Creates a `backon` [`ExponentialBuilder`] from this configuration
    pub fn to_backoff_builder(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries as usize)
            .with_jitter()
    }
}

/// Validated deployment configuration
#[derive(Clone)]
pub struct DeploymentConfig {
    /// The target network
    pub network: NetworkConfig,
    /// The deployer's signer
    pub signer: PrivateKeySigner,
    /// A fixed gas limit, skipping gas estimation
    pub gas_limit: Option<u64>,
    /// How long to wait for the deployment to be mined
    pub confirmation_timeout: Duration,
    /// How often to poll for the deployment receipt
    pub poll_interval: Duration,
    /// How long a single RPC request may take
    pub rpc_timeout: Duration,
    /// Pre-broadcast retry settings
    pub retry: RetryConfig,
    /// The directory holding compiled artifacts
    pub artifacts_dir: PathBuf,
    /// The deployments manifest, if one should be written
    pub deployments_path: Option<PathBuf>,
    /// The chain explorer API key. Not used by deployment itself.
    pub explorer_api_key: Option<String>,
}

impl DeploymentConfig {
    /// The address of the deployer
    pub fn deployer(&self) -> Address {
        self.signer.address()
    }
}

impl RawDeploymentConfig {
    /// Validate the configuration, failing on the first blank or malformed field.
    ///
    /// Performs no network access.
    pub fn validate(self) -> Result<DeploymentConfig, ScriptError> {
        let private_key = non_blank(self.private_key).ok_or(ScriptError::MissingConfig(
            SIGNING_KEY_FIELD,
        ))?;
        let signer = parse_signing_key(&private_key)?;

        let rpc_url = non_blank(self.rpc_url)
            .or_else(|| non_blank(self.fallback_rpc_url))
            .ok_or(ScriptError::MissingConfig(RPC_ENDPOINT_FIELD))?;
        let rpc_url = parse_rpc_url(&rpc_url)?;

        let name = non_blank(self.network).unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        let chain_id = self.chain_id.or_else(|| known_chain_id(&name));

        let confirmation_timeout = self
            .confirmation_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT);
        if confirmation_timeout.is_zero() {
            return Err(ScriptError::InvalidConfig {
                field: "confirmation timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        let poll_interval = self
            .poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(ScriptError::InvalidConfig {
                field: "poll interval",
                reason: "must be greater than zero".to_string(),
            });
        }

        let rpc_timeout = self
            .rpc_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RPC_TIMEOUT);
        if rpc_timeout.is_zero() {
            return Err(ScriptError::InvalidConfig {
                field: "RPC timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.gas_limit == Some(0) {
            return Err(ScriptError::InvalidConfig {
                field: "gas limit",
                reason: "must be greater than zero".to_string(),
            });
        }

        let retry = RetryConfig {
            max_retries: self.max_retries.unwrap_or(DEFAULT_RPC_MAX_RETRIES),
            ..RetryConfig::default()
        };

        let deployments_path = if self.no_manifest {
            None
        } else {
            Some(
                self.deployments_path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DEPLOYMENTS_PATH)),
            )
        };

        Ok(DeploymentConfig {
            network: NetworkConfig {
                name,
                rpc_url,
                chain_id,
            },
            signer,
            gas_limit: self.gas_limit,
            confirmation_timeout,
            poll_interval,
            rpc_timeout,
            retry,
            artifacts_dir: self
                .artifacts_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR)),
            deployments_path,
            explorer_api_key: non_blank(self.explorer_api_key),
        })
    }
}

/// Parse a private key, accepting it with or without a `0x` prefix.
///
/// The key itself never appears in the returned error.
pub fn parse_signing_key(raw: &str) -> Result<PrivateKeySigner, ScriptError> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex.is_empty() {
        return Err(ScriptError::MissingConfig(SIGNING_KEY_FIELD));
    }

    if hex.len() != PRIVATE_KEY_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ScriptError::InvalidConfig {
            field: SIGNING_KEY_FIELD,
            reason: format!(
                "expected {PRIVATE_KEY_HEX_LEN} hex characters, optionally prefixed with 0x"
            ),
        });
    }

    let bytes = B256::from_str(hex).map_err(|e| ScriptError::InvalidConfig {
        field: SIGNING_KEY_FIELD,
        reason: e.to_string(),
    })?;

    PrivateKeySigner::from_bytes(&bytes).map_err(|_| ScriptError::InvalidConfig {
        field: SIGNING_KEY_FIELD,
        reason: "not a valid secp256k1 private key".to_string(),
    })
}

/// Parse an HTTP(S) RPC endpoint
pub fn parse_rpc_url(raw: &str) -> Result<Url, ScriptError> {
    let url = Url::parse(raw.trim()).map_err(|e| ScriptError::InvalidConfig {
        field: RPC_ENDPOINT_FIELD,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScriptError::InvalidConfig {
            field: RPC_ENDPOINT_FIELD,
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }

    if url.host().is_none() {
        return Err(ScriptError::InvalidConfig {
            field: RPC_ENDPOINT_FIELD,
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// The chain ID of a network known by name
pub fn known_chain_id(network: &str) -> Option<u64> {
    KNOWN_NETWORKS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(network))
        .map(|(_, chain_id)| *chain_id)
}

/// Treat whitespace-only values as unset
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
