//! The local deployments manifest.
//!
//! The manifest maps contract keys to their latest deployed address under
//! `deployments`, and keeps one record per deployment transaction under
//! `history`. Keys it does not know about are left untouched.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    constants::{DEPLOYMENTS_KEY, HISTORY_KEY},
    errors::ScriptError,
    types::{DeploymentResult, SubmittedDeployment},
};

/// Whether a recorded deployment has been confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Broadcast, not yet confirmed
    Pending,
    /// Mined and created a contract
    Confirmed,
}

/// A single deployment transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// The name of the deployed artifact
    pub contract: String,
    /// The hash of the deployment transaction
    pub tx_hash: TxHash,
    /// Whether the deployment has been confirmed
    pub status: RecordStatus,
    /// The deployed address, once confirmed
    pub address: Option<Address>,
    /// The address derived from the deployer and nonce
    pub predicted_address: Address,
    /// The chain the contract was deployed to
    pub chain_id: u64,
    /// The account that sent the transaction
    pub deployer: Address,
    /// The nonce the transaction was sent with
    pub nonce: u64,
    /// The block the transaction was included in
    pub block_number: Option<u64>,
}

impl From<&SubmittedDeployment> for DeploymentRecord {
    fn from(submitted: &SubmittedDeployment) -> Self {
        Self {
            contract: submitted.artifact.clone(),
            tx_hash: submitted.tx_hash,
            status: RecordStatus::Pending,
            address: None,
            predicted_address: submitted.predicted_address(),
            chain_id: submitted.chain_id,
            deployer: submitted.deployer,
            nonce: submitted.nonce,
            block_number: None,
        }
    }
}

impl From<&DeploymentResult> for DeploymentRecord {
    fn from(result: &DeploymentResult) -> Self {
        Self {
            contract: result.artifact().to_string(),
            tx_hash: result.tx_hash(),
            status: RecordStatus::Confirmed,
            address: result.contract_address(),
            predicted_address: result.deployer().create(result.nonce()),
            chain_id: result.chain_id(),
            deployer: result.deployer(),
            nonce: result.nonce(),
            block_number: result.block_number(),
        }
    }
}

/// Record a broadcast deployment as pending
pub fn record_pending(path: &Path, submitted: &SubmittedDeployment) -> Result<(), ScriptError> {
    let mut manifest = read_manifest(path)?;
    upsert_record(&mut manifest, DeploymentRecord::from(submitted))?;
    write_manifest(path, &manifest)
}

/// Record a confirmed deployment and point its contract key at the new address
pub fn record_confirmed(path: &Path, result: &DeploymentResult) -> Result<(), ScriptError> {
    let mut manifest = read_manifest(path)?;

    if let Some(address) = result.contract_address() {
        deployments_mut(&mut manifest)?.insert(
            result.contract_key().to_string(),
            Value::String(address.to_string()),
        );
    }
    upsert_record(&mut manifest, DeploymentRecord::from(result))?;

    write_manifest(path, &manifest)
}

/// Read the latest address recorded for `contract_key`
pub fn parse_addr_from_deployments_file(
    path: &Path,
    contract_key: &str,
) -> Result<Address, ScriptError> {
    let manifest = read_manifest(path)?;
    let addr = manifest
        .get(DEPLOYMENTS_KEY)
        .and_then(|d| d.get(contract_key))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ScriptError::ReadDeployments(format!("no address recorded for {contract_key}"))
        })?;

    Address::from_str(addr).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Read every deployment record in the manifest
pub fn read_history(path: &Path) -> Result<Vec<DeploymentRecord>, ScriptError> {
    let manifest = read_manifest(path)?;
    match manifest.get(HISTORY_KEY) {
        Some(history) => serde_json::from_value(history.clone())
            .map_err(|e| ScriptError::ReadDeployments(e.to_string())),
        None => Ok(Vec::new()),
    }
}

/// Read the manifest, treating a missing file as empty
fn read_manifest(path: &Path) -> Result<Map<String, Value>, ScriptError> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let contents =
        fs::read_to_string(path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
    match serde_json::from_str(&contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ScriptError::ReadDeployments(format!(
            "{} is not a JSON object",
            path.display()
        ))),
        Err(e) => Err(ScriptError::ReadDeployments(e.to_string())),
    }
}

/// Pretty-print the manifest to `path`.
///
/// The manifest is written to a sibling file and renamed over `path`, so the
/// previous contents survive a crash mid-write.
fn write_manifest(path: &Path, manifest: &Map<String, Value>) -> Result<(), ScriptError> {
    let contents = serde_json::to_string_pretty(manifest)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

    let staging = staging_path(path);
    fs::write(&staging, contents)
        .map_err(|e| ScriptError::WriteDeployments(format!("{}: {e}", staging.display())))?;

    fs::rename(&staging, path).map_err(|e| {
        let _ = fs::remove_file(&staging);
        ScriptError::WriteDeployments(format!("{}: {e}", path.display()))
    })
}

/// The file a new manifest is staged in before replacing `path`
fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.with_file_name(format!(".{file_name}.tmp"))
}

/// The `deployments` object, created if absent
fn deployments_mut(
    manifest: &mut Map<String, Value>,
) -> Result<&mut Map<String, Value>, ScriptError> {
    manifest
        .entry(DEPLOYMENTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| ScriptError::WriteDeployments(format!("`{DEPLOYMENTS_KEY}` is not an object")))
}

/// Replace the record with the same transaction hash, or append it
fn upsert_record(
    manifest: &mut Map<String, Value>,
    record: DeploymentRecord,
) -> Result<(), ScriptError> {
    let tx_hash = record.tx_hash.to_string();
    let record =
        serde_json::to_value(record).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

    let history = manifest
        .entry(HISTORY_KEY)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| ScriptError::WriteDeployments(format!("`{HISTORY_KEY}` is not an array")))?;

    let existing = history
        .iter_mut()
        .find(|r| r.get("tx_hash").and_then(Value::as_str) == Some(tx_hash.as_str()));
    match existing {
        Some(slot) => *slot = record,
        None => history.push(record),
    }

    Ok(())
}
