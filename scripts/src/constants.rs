//! Constants used in the deploy scripts

use std::time::Duration;

// ------------------------
// | Environment Variables |
// ------------------------

/// The environment variable holding the deployer's private key
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// The environment variable holding the RPC endpoint URL
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";

/// The fallback environment variable holding the RPC endpoint URL
pub const BASE_RPC_URL_ENV_VAR: &str = "BASE_RPC_URL";

/// The environment variable holding the network name
pub const NETWORK_ENV_VAR: &str = "NETWORK";

/// The environment variable holding an explicit chain ID
pub const CHAIN_ID_ENV_VAR: &str = "CHAIN_ID";

/// The environment variable holding the chain explorer API key
pub const EXPLORER_API_KEY_ENV_VAR: &str = "BASESCAN_API_KEY";

/// The environment variable holding the artifacts directory
pub const ARTIFACTS_DIR_ENV_VAR: &str = "ARTIFACTS_DIR";

/// The environment variable holding the deployments manifest path
pub const DEPLOYMENTS_PATH_ENV_VAR: &str = "DEPLOYMENTS_PATH";

/// The environment variable holding a fixed gas limit
pub const GAS_LIMIT_ENV_VAR: &str = "GAS_LIMIT";

/// The environment variable holding the confirmation timeout, in seconds
pub const CONFIRMATION_TIMEOUT_ENV_VAR: &str = "CONFIRMATION_TIMEOUT_SECS";

/// The environment variable holding the receipt poll interval, in milliseconds
pub const POLL_INTERVAL_ENV_VAR: &str = "POLL_INTERVAL_MS";

/// The environment variable holding the per-request RPC timeout, in seconds
pub const RPC_TIMEOUT_ENV_VAR: &str = "RPC_TIMEOUT_SECS";

/// The environment variable holding the pre-broadcast retry count
pub const MAX_RETRIES_ENV_VAR: &str = "MAX_RETRIES";

/// The environment variable holding the USDC address on Base
pub const USDC_BASE_ADDRESS_ENV_VAR: &str = "USDC_BASE_ADDRESS";

/// The environment variable holding the platform fee wallet address
pub const PLATFORM_FEE_WALLET_ENV_VAR: &str = "PLATFORM_FEE_WALLET";

/// The environment variable holding the DEX router address
pub const ROUTER_ADDRESS_ENV_VAR: &str = "ROUTER_ADDRESS";

// ------------
// | Networks |
// ------------

/// The name of the default network
pub const DEFAULT_NETWORK: &str = "base";

/// The chain ID of Base mainnet
pub const BASE_CHAIN_ID: u64 = 8453;

/// The chain ID of Base Sepolia
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84532;

/// Networks whose chain ID is known ahead of time
pub const KNOWN_NETWORKS: [(&str, u64); 2] = [
    (DEFAULT_NETWORK, BASE_CHAIN_ID),
    ("base-sepolia", BASE_SEPOLIA_CHAIN_ID),
];

// ----------------
// | Transactions |
// ----------------

/// The number of hex characters in a secp256k1 private key
pub const PRIVATE_KEY_HEX_LEN: usize = 64;

/// The default amount of time to wait for a deployment to be mined
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// The default interval at which to poll for a deployment receipt
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The default time allowed for a single RPC request
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// The default number of retries for pre-broadcast RPC calls
pub const DEFAULT_RPC_MAX_RETRIES: u32 = 5;

/// The initial delay between pre-broadcast RPC retries
pub const DEFAULT_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(250);

/// The maximum delay between pre-broadcast RPC retries
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);

// -------------
// | Artifacts |
// -------------

/// The default directory in which compiled contract artifacts live
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The extension of a contract artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The name of the `LPLock` contract artifact
pub const LP_LOCK_ARTIFACT: &str = "LPLock";

/// The name of the `TokenLock` contract artifact
pub const TOKEN_LOCK_ARTIFACT: &str = "TokenLock";

/// The name of the `RoiToken` contract artifact
pub const ROI_TOKEN_ARTIFACT: &str = "RoiToken";

// ---------------
// | Deployments |
// ---------------

/// The default path of the deployments manifest
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The deployments key in the `deployments.json` file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The history key in the `deployments.json` file
pub const HISTORY_KEY: &str = "history";

/// The LP lock contract key in the `deployments.json` file
pub const LP_LOCK_CONTRACT_KEY: &str = "lp_lock_contract";

/// The token lock contract key in the `deployments.json` file
pub const TOKEN_LOCK_CONTRACT_KEY: &str = "token_lock_contract";

/// The ROI token contract key in the `deployments.json` file
pub const ROI_TOKEN_CONTRACT_KEY: &str = "roi_token_contract";
