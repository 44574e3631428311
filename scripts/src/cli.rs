//! Definitions of CLI arguments and commands for the deploy scripts.
//!
//! Every setting can be supplied through the environment, so a bare
//! `roi-deploy lp-lock` works once the environment is populated.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::{
    client::RpcDeployClient,
    commands::run_deployment,
    config::RawDeploymentConfig,
    constants::{
        ARTIFACTS_DIR_ENV_VAR, BASE_RPC_URL_ENV_VAR, CHAIN_ID_ENV_VAR,
        CONFIRMATION_TIMEOUT_ENV_VAR, DEPLOYMENTS_PATH_ENV_VAR, EXPLORER_API_KEY_ENV_VAR,
        GAS_LIMIT_ENV_VAR, MAX_RETRIES_ENV_VAR, NETWORK_ENV_VAR, PLATFORM_FEE_WALLET_ENV_VAR,
        POLL_INTERVAL_ENV_VAR, PRIVATE_KEY_ENV_VAR, ROUTER_ADDRESS_ENV_VAR, RPC_TIMEOUT_ENV_VAR,
        RPC_URL_ENV_VAR, USDC_BASE_ADDRESS_ENV_VAR,
    },
    errors::ScriptError,
    types::{ContractSpec, DeployableContract, DeploymentResult},
};

/// Deploy the LPLock, TokenLock and RoiToken contracts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Private key of the deployer, with or without a 0x prefix
    #[arg(long, env = PRIVATE_KEY_ENV_VAR, hide_env_values = true)]
    pub private_key: Option<String>,

    /// Network RPC URL
    #[arg(short, long, env = RPC_URL_ENV_VAR)]
    pub rpc_url: Option<String>,

    /// Network RPC URL, used when `--rpc-url` is not set
    #[arg(long, env = BASE_RPC_URL_ENV_VAR)]
    pub base_rpc_url: Option<String>,

    /// Network name; `base` and `base-sepolia` imply a chain ID
    #[arg(short, long, env = NETWORK_ENV_VAR)]
    pub network: Option<String>,

    /// The chain ID the RPC endpoint must report
    #[arg(long, env = CHAIN_ID_ENV_VAR)]
    pub chain_id: Option<u64>,

    /// Directory searched for compiled contract artifacts
    #[arg(long, env = ARTIFACTS_DIR_ENV_VAR)]
    pub artifacts_dir: Option<PathBuf>,

    /// Path of the deployments manifest
    #[arg(short, long, env = DEPLOYMENTS_PATH_ENV_VAR)]
    pub deployments_path: Option<PathBuf>,

    /// Do not read or write the deployments manifest
    #[arg(long)]
    pub no_manifest: bool,

    /// Fixed gas limit for the deployment; estimated when unset
    #[arg(long, env = GAS_LIMIT_ENV_VAR)]
    pub gas_limit: Option<u64>,

    /// Seconds to wait for the deployment to be mined
    #[arg(long, env = CONFIRMATION_TIMEOUT_ENV_VAR)]
    pub confirmation_timeout_secs: Option<u64>,

    /// Milliseconds between receipt polls
    #[arg(long, env = POLL_INTERVAL_ENV_VAR)]
    pub poll_interval_ms: Option<u64>,

    /// Seconds allowed for a single RPC request
    #[arg(long, env = RPC_TIMEOUT_ENV_VAR)]
    pub rpc_timeout_secs: Option<u64>,

    /// Retries for each RPC call made before broadcast
    #[arg(long, env = MAX_RETRIES_ENV_VAR)]
    pub max_retries: Option<u32>,

    /// Chain explorer API key. Not used for deployment.
    #[arg(long, env = EXPLORER_API_KEY_ENV_VAR, hide_env_values = true)]
    pub explorer_api_key: Option<String>,

    /// The contract to deploy
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Split the arguments into unvalidated configuration and the contract to deploy
    pub fn into_parts(self) -> (RawDeploymentConfig, ContractSpec) {
        let spec = self.command.into_spec();
        let raw = RawDeploymentConfig {
            network: self.network,
            rpc_url: self.rpc_url,
            fallback_rpc_url: self.base_rpc_url,
            private_key: self.private_key,
            chain_id: self.chain_id,
            gas_limit: self.gas_limit,
            confirmation_timeout_secs: self.confirmation_timeout_secs,
            poll_interval_ms: self.poll_interval_ms,
            rpc_timeout_secs: self.rpc_timeout_secs,
            max_retries: self.max_retries,
            artifacts_dir: self.artifacts_dir,
            deployments_path: self.deployments_path,
            no_manifest: self.no_manifest,
            explorer_api_key: self.explorer_api_key,
        };

        (raw, spec)
    }

    /// Validate the configuration and run the deployment against the configured node
    pub async fn run(self, cancel: CancellationToken) -> Result<DeploymentResult, ScriptError> {
        let (raw, spec) = self.into_parts();
        run_deployment(raw, spec, RpcDeployClient::new, cancel).await
    }
}

/// The deployable contracts
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy the LPLock contract
    LpLock(LpLockArgs),
    /// Deploy the TokenLock contract
    TokenLock,
    /// Deploy the RoiToken contract
    RoiToken(RoiTokenArgs),
    /// Deploy any artifact, passing constructor arguments positionally
    Artifact(ArtifactArgs),
}

impl Command {
    /// The contract this command deploys
    fn into_spec(self) -> ContractSpec {
        match self {
            Command::LpLock(args) => ContractSpec::for_contract(
                DeployableContract::LpLock,
                vec![args.usdc, args.fee_wallet],
            ),
            Command::TokenLock => ContractSpec::for_contract(DeployableContract::TokenLock, Vec::new()),
            Command::RoiToken(args) => {
                ContractSpec::for_contract(DeployableContract::RoiToken, vec![args.router])
            }
            Command::Artifact(args) => ContractSpec::for_artifact(&args.name, args.args),
        }
    }
}

/// Constructor arguments of the LPLock contract
#[derive(Args, Debug)]
pub struct LpLockArgs {
    /// Address of the USDC token on the target chain
    #[arg(long, env = USDC_BASE_ADDRESS_ENV_VAR)]
    pub usdc: Option<String>,

    /// Address receiving platform fees
    #[arg(long, env = PLATFORM_FEE_WALLET_ENV_VAR)]
    pub fee_wallet: Option<String>,
}

/// Constructor arguments of the RoiToken contract
#[derive(Args, Debug)]
pub struct RoiTokenArgs {
    /// Address of the DEX router
    #[arg(long, env = ROUTER_ADDRESS_ENV_VAR)]
    pub router: Option<String>,
}

/// An arbitrary artifact and its constructor arguments
#[derive(Args, Debug)]
pub struct ArtifactArgs {
    /// Name of the artifact, e.g. `LPLock`
    pub name: String,

    /// Constructor arguments, in declaration order
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, FromArgMatches};

    use super::*;
    use crate::constants::{LP_LOCK_ARTIFACT, LP_LOCK_CONTRACT_KEY, ROI_TOKEN_ARTIFACT};

    const USDC: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";
    const FEE_WALLET: &str = "0x000000000000000000000000000000000000dEaD";

    /// Drop the environment fallback of every argument, recursively
    fn without_env(cmd: clap::Command) -> clap::Command {
        let cmd = cmd.mut_args(|arg| arg.env(None::<&'static str>));
        let names: Vec<String> = cmd
            .get_subcommands()
            .map(|sub| sub.get_name().to_string())
            .collect();

        names
            .iter()
            .fold(cmd, |cmd, name| cmd.mut_subcommand(name, without_env))
    }

    /// Parse the command line alone, ignoring the process environment
    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let matches = without_env(Cli::command()).try_get_matches_from(args)?;
        Cli::from_arg_matches(&matches)
    }

    #[test]
    fn test_lp_lock_args() {
        let cli = parse(&[
            "roi-deploy",
            "--rpc-url",
            "https://mainnet.base.org",
            "--gas-limit",
            "3000000",
            "lp-lock",
            "--usdc",
            USDC,
            "--fee-wallet",
            FEE_WALLET,
        ])
        .unwrap();

        let (raw, spec) = cli.into_parts();
        assert_eq!(raw.rpc_url.as_deref(), Some("https://mainnet.base.org"));
        assert_eq!(raw.gas_limit, Some(3_000_000));
        assert_eq!(spec.artifact, LP_LOCK_ARTIFACT);
        assert_eq!(spec.contract_key, LP_LOCK_CONTRACT_KEY);
        assert_eq!(spec.args[0].value.as_deref(), Some(USDC));
        assert_eq!(spec.args[1].value.as_deref(), Some(FEE_WALLET));
    }

    #[test]
    fn test_roi_token_args() {
        let cli = parse(&["roi-deploy", "roi-token", "--router", FEE_WALLET]).unwrap();

        let (raw, spec) = cli.into_parts();
        assert_eq!(raw.private_key, None);
        assert_eq!(raw.rpc_url, None);
        assert_eq!(spec.artifact, ROI_TOKEN_ARTIFACT);
        assert_eq!(spec.args.len(), 1);
        assert_eq!(spec.args[0].name, ROUTER_ADDRESS_ENV_VAR);
    }

    #[test]
    fn test_artifact_args_are_positional() {
        let cli = parse(&[
            "roi-deploy",
            "--no-manifest",
            "artifact",
            "Vesting",
            USDC,
            "-1",
        ])
        .unwrap();

        let (raw, spec) = cli.into_parts();
        assert!(raw.no_manifest);
        assert_eq!(spec.artifact, "Vesting");
        assert_eq!(spec.contract_key, "vesting_contract");
        assert_eq!(spec.args.len(), 2);
        assert_eq!(spec.args[1].value.as_deref(), Some("-1"));
    }

    #[test]
    fn test_unknown_contract_is_rejected() {
        assert!(parse(&["roi-deploy", "staking"]).is_err());
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        assert!(parse(&["roi-deploy", "--chain-id", "base", "token-lock"]).is_err());
    }

    #[test]
    fn test_missing_lp_lock_args_are_unset() {
        let cli = parse(&["roi-deploy", "--rpc-timeout-secs", "10", "lp-lock"]).unwrap();

        let (raw, spec) = cli.into_parts();
        assert_eq!(raw.rpc_timeout_secs, Some(10));
        assert_eq!(spec.args.len(), 2);
        assert!(spec.args.iter().all(|arg| arg.value.is_none()));
    }
}
