//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    time::Duration,
};

use alloy::{
    primitives::{Address, TxHash},
    transports::TransportError,
};

/// The broad category an error falls into, which determines how it is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or invalid configuration, detected before any network call
    Configuration,
    /// The network could not be reached before broadcast
    Network,
    /// The transaction was rejected or failed on-chain
    Submission,
    /// The run was interrupted before anything was broadcast
    Aborted,
    /// The transaction was broadcast but its outcome is unknown
    UnknownOutcome,
    /// Local filesystem errors
    Io,
}

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// A required configuration value is blank or unset
    MissingConfig(&'static str),
    /// A configuration value is present but malformed
    InvalidConfig {
        /// The name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
    /// A constructor argument required by the contract was not provided
    MissingConstructorArg(String),
    /// The constructor arguments do not match the contract's constructor
    ConstructorArgs(String),
    /// The contract artifact could not be found
    ArtifactNotFound(String),
    /// Error parsing a Solidity compilation artifact
    ArtifactParsing(String),
    /// The RPC endpoint reports a different chain than the one configured
    ChainMismatch {
        /// The chain ID the deployment was configured for
        expected: u64,
        /// The chain ID reported by the RPC endpoint
        actual: u64,
    },
    /// A pre-broadcast RPC call failed after exhausting its retries
    Network(String),
    /// The deployment transaction was rejected
    Submission(String),
    /// The deployment transaction was mined but reverted
    DeploymentReverted(TxHash),
    /// The deployment transaction was mined but created no contract
    MissingContractAddress(TxHash),
    /// The deployment transaction was not confirmed within the deadline
    ConfirmationTimeout {
        /// The hash of the broadcast transaction
        tx_hash: TxHash,
        /// How long we waited
        timeout: Duration,
    },
    /// The process was interrupted before the transaction was broadcast
    InterruptedBeforeBroadcast,
    /// The process was interrupted while the transaction was being broadcast
    InterruptedDuringBroadcast {
        /// The account the transaction was sent from
        deployer: Address,
        /// The nonce the transaction was sent with
        nonce: u64,
    },
    /// The process was interrupted while waiting for confirmation
    Interrupted(TxHash),
    /// Error reading the `deployments.json` file
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    WriteDeployments(String),
}

impl ScriptError {
    /// The category this error falls into
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScriptError::MissingConfig(_)
            | ScriptError::InvalidConfig { .. }
            | ScriptError::MissingConstructorArg(_)
            | ScriptError::ConstructorArgs(_)
            | ScriptError::ArtifactNotFound(_)
            | ScriptError::ArtifactParsing(_)
            | ScriptError::ChainMismatch { .. } => ErrorCategory::Configuration,
            ScriptError::Network(_) => ErrorCategory::Network,
            ScriptError::Submission(_)
            | ScriptError::DeploymentReverted(_)
            | ScriptError::MissingContractAddress(_) => ErrorCategory::Submission,
            ScriptError::InterruptedBeforeBroadcast => ErrorCategory::Aborted,
            ScriptError::ConfirmationTimeout { .. }
            | ScriptError::InterruptedDuringBroadcast { .. }
            | ScriptError::Interrupted(_) => ErrorCategory::UnknownOutcome,
            ScriptError::ReadDeployments(_) | ScriptError::WriteDeployments(_) => ErrorCategory::Io,
        }
    }
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::MissingConfig(field) => {
                write!(f, "configuration error: {field} is not set")
            }
            ScriptError::InvalidConfig { field, reason } => {
                write!(f, "configuration error: invalid {field}: {reason}")
            }
            ScriptError::MissingConstructorArg(name) => {
                write!(f, "configuration error: constructor argument {name} is not set")
            }
            ScriptError::ConstructorArgs(s) => write!(f, "invalid constructor arguments: {s}"),
            ScriptError::ArtifactNotFound(s) => write!(f, "artifact not found: {s}"),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {s}"),
            ScriptError::ChainMismatch { expected, actual } => write!(
                f,
                "configuration error: expected chain ID {expected}, RPC endpoint reports {actual}"
            ),
            ScriptError::Network(s) => write!(f, "network error: {s}"),
            ScriptError::Submission(s) => write!(f, "deployment transaction rejected: {s}"),
            ScriptError::DeploymentReverted(tx_hash) => {
                write!(f, "deployment transaction {tx_hash} reverted")
            }
            ScriptError::MissingContractAddress(tx_hash) => write!(
                f,
                "deployment transaction {tx_hash} was mined but created no contract"
            ),
            ScriptError::ConfirmationTimeout { tx_hash, timeout } => write!(
                f,
                "unknown outcome: transaction {tx_hash} was not confirmed within {}s, \
                 check its status manually before re-submitting",
                timeout.as_secs()
            ),
            ScriptError::InterruptedBeforeBroadcast => {
                write!(f, "interrupted before broadcast, no transaction was sent")
            }
            ScriptError::InterruptedDuringBroadcast { deployer, nonce } => write!(
                f,
                "unknown outcome: interrupted while broadcasting, check whether nonce {nonce} \
                 of {deployer} has been used before re-submitting"
            ),
            ScriptError::Interrupted(tx_hash) => write!(
                f,
                "unknown outcome: interrupted while waiting for transaction {tx_hash}, \
                 check its status manually before re-submitting"
            ),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {s}"),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {s}"),
        }
    }
}

impl Error for ScriptError {}

/// Errors returned by a [`DeployClient`](crate::client::DeployClient)
#[derive(Debug, Clone)]
pub enum ClientError {
    /// The request never reached the node, or the connection dropped
    Transport(String),
    /// The node answered with a JSON-RPC error
    Rejected(String),
    /// Any other failure, such as an undecodable response
    Other(String),
}

impl ClientError {
    /// Whether the failed call is safe to repeat
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(s) => write!(f, "transport error: {s}"),
            ClientError::Rejected(s) => write!(f, "rpc error: {s}"),
            ClientError::Other(s) => write!(f, "{s}"),
        }
    }
}

impl Error for ClientError {}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        if let Some(payload) = err.as_error_resp() {
            ClientError::Rejected(payload.to_string())
        } else if err.is_transport_error() {
            ClientError::Transport(err.to_string())
        } else {
            ClientError::Other(err.to_string())
        }
    }
}
