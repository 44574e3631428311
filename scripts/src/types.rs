//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{Address, TxHash};

use crate::constants::{
    LP_LOCK_ARTIFACT, LP_LOCK_CONTRACT_KEY, PLATFORM_FEE_WALLET_ENV_VAR, ROI_TOKEN_ARTIFACT,
    ROI_TOKEN_CONTRACT_KEY, ROUTER_ADDRESS_ENV_VAR, TOKEN_LOCK_ARTIFACT, TOKEN_LOCK_CONTRACT_KEY,
    USDC_BASE_ADDRESS_ENV_VAR,
};

/// The contracts this repository knows how to deploy
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeployableContract {
    /// The LP token lock contract
    LpLock,
    /// The ERC20 token lock contract
    TokenLock,
    /// The ROI token contract
    RoiToken,
}

impl DeployableContract {
    /// The name of the compiled artifact for the contract
    pub fn artifact_name(&self) -> &'static str {
        match self {
            DeployableContract::LpLock => LP_LOCK_ARTIFACT,
            DeployableContract::TokenLock => TOKEN_LOCK_ARTIFACT,
            DeployableContract::RoiToken => ROI_TOKEN_ARTIFACT,
        }
    }

    /// The key under which the contract's address is recorded in the deployments file
    pub fn contract_key(&self) -> &'static str {
        match self {
            DeployableContract::LpLock => LP_LOCK_CONTRACT_KEY,
            DeployableContract::TokenLock => TOKEN_LOCK_CONTRACT_KEY,
            DeployableContract::RoiToken => ROI_TOKEN_CONTRACT_KEY,
        }
    }

    /// The names of the values passed to the contract's constructor, in order
    pub fn constructor_arg_names(&self) -> &'static [&'static str] {
        match self {
            DeployableContract::LpLock => &[USDC_BASE_ADDRESS_ENV_VAR, PLATFORM_FEE_WALLET_ENV_VAR],
            DeployableContract::TokenLock => &[],
            DeployableContract::RoiToken => &[ROUTER_ADDRESS_ENV_VAR],
        }
    }
}

impl Display for DeployableContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployableContract::LpLock => write!(f, "lp-lock"),
            DeployableContract::TokenLock => write!(f, "token-lock"),
            DeployableContract::RoiToken => write!(f, "roi-token"),
        }
    }
}

/// A single constructor argument, as supplied by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorArg {
    /// Where the value came from, used in error messages
    pub name: String,
    /// The raw value, if one was provided
    pub value: Option<String>,
}

impl ConstructorArg {
    /// Create an argument with a value
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Create an argument from a possibly-unset value
    pub fn optional(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The contract to deploy and the arguments to construct it with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSpec {
    /// The name of the compiled artifact
    pub artifact: String,
    /// The key under which to record the deployed address
    pub contract_key: String,
    /// The ordered constructor arguments
    pub args: Vec<ConstructorArg>,
}

impl ContractSpec {
    /// Build the spec for one of the known contracts, pairing each constructor
    /// argument name with the value provided for it
    pub fn for_contract(contract: DeployableContract, values: Vec<Option<String>>) -> Self {
        let names = contract.constructor_arg_names();
        let mut values = values.into_iter();
        let args = names
            .iter()
            .map(|name| ConstructorArg::optional(*name, values.next().flatten()))
            .collect();

        Self {
            artifact: contract.artifact_name().to_string(),
            contract_key: contract.contract_key().to_string(),
            args,
        }
    }

    /// Build the spec for an arbitrary artifact with positional arguments
    pub fn for_artifact(artifact: &str, values: Vec<String>) -> Self {
        let args = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| ConstructorArg::new(format!("argument #{i}"), v))
            .collect();

        Self {
            artifact: artifact.to_string(),
            contract_key: format!("{}_contract", artifact.to_lowercase()),
            args,
        }
    }
}

/// The lifecycle of a single deployment run.
///
/// `Unconfigured → Validated → Submitted → Confirmed | Failed`; no state may be
/// re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentState {
    /// Configuration has not been validated yet
    Unconfigured,
    /// Configuration and constructor arguments have been validated
    Validated,
    /// The deployment transaction has been broadcast
    Submitted,
    /// The deployment transaction has been mined and created a contract
    Confirmed,
    /// The run failed
    Failed,
}

impl DeploymentState {
    /// Whether the state machine may move from `self` to `next`
    pub fn can_transition_to(self, next: DeploymentState) -> bool {
        use DeploymentState::*;
        matches!(
            (self, next),
            (Unconfigured, Validated)
                | (Validated, Submitted)
                | (Submitted, Confirmed)
                | (Unconfigured | Validated | Submitted, Failed)
        )
    }

    /// Whether the run has finished
    pub fn is_terminal(self) -> bool {
        matches!(self, DeploymentState::Confirmed | DeploymentState::Failed)
    }
}

impl Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentState::Unconfigured => write!(f, "unconfigured"),
            DeploymentState::Validated => write!(f, "validated"),
            DeploymentState::Submitted => write!(f, "submitted"),
            DeploymentState::Confirmed => write!(f, "confirmed"),
            DeploymentState::Failed => write!(f, "failed"),
        }
    }
}

/// The receipt of a mined deployment transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReceipt {
    /// Whether the transaction executed successfully
    pub success: bool,
    /// The address of the created contract, if any
    pub contract_address: Option<Address>,
    /// The block the transaction was included in
    pub block_number: Option<u64>,
    /// The gas consumed by the transaction
    pub gas_used: u64,
}

/// A deployment whose transaction has been broadcast but not yet confirmed
#[derive(Debug, Clone)]
pub struct SubmittedDeployment {
    /// The name of the deployed artifact
    pub artifact: String,
    /// The key under which to record the deployed address
    pub contract_key: String,
    /// The hash of the deployment transaction
    pub tx_hash: TxHash,
    /// The account that sent the transaction
    pub deployer: Address,
    /// The nonce the transaction was sent with
    pub nonce: u64,
    /// The chain the transaction was sent to
    pub chain_id: u64,
}

impl SubmittedDeployment {
    /// The address the contract is expected to land at
    pub fn predicted_address(&self) -> Address {
        self.deployer.create(self.nonce)
    }

    /// Consume the submission with the receipt of its confirmed transaction
    pub fn confirm(self, receipt: DeployReceipt) -> DeploymentResult {
        DeploymentResult {
            submission: self,
            contract_address: receipt.contract_address,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }
    }
}

/// The outcome of a confirmed deployment. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    /// The submission this result confirms
    submission: SubmittedDeployment,
    /// The deployed contract address
    contract_address: Option<Address>,
    /// The block the deployment was included in
    block_number: Option<u64>,
    /// The gas consumed by the deployment
    gas_used: u64,
}

impl DeploymentResult {
    /// The name of the deployed artifact
    pub fn artifact(&self) -> &str {
        &self.submission.artifact
    }

    /// The key under which the deployed address is recorded
    pub fn contract_key(&self) -> &str {
        &self.submission.contract_key
    }

    /// The hash of the deployment transaction
    pub fn tx_hash(&self) -> TxHash {
        self.submission.tx_hash
    }

    /// The deployed contract address
    pub fn contract_address(&self) -> Option<Address> {
        self.contract_address
    }

    /// The account that deployed the contract
    pub fn deployer(&self) -> Address {
        self.submission.deployer
    }

    /// The nonce the deployment was sent with
    pub fn nonce(&self) -> u64 {
        self.submission.nonce
    }

    /// The chain the contract was deployed to
    pub fn chain_id(&self) -> u64 {
        self.submission.chain_id
    }

    /// The block the deployment was included in
    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    /// The gas consumed by the deployment
    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    /// Whether the deployment created a contract
    pub fn is_confirmed(&self) -> bool {
        self.contract_address.is_some()
    }
}
