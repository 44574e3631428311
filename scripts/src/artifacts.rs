//! Loading compiled contract artifacts and encoding their constructor calls
//!
//! Both the Hardhat layout (`artifacts/contracts/<File>.sol/<Name>.json`, with
//! `bytecode` as a hex string) and the Foundry layout (`out/<File>.sol/<Name>.json`,
//! with `bytecode.object`) are understood.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use serde::Deserialize;

use crate::{
    constants::ARTIFACT_EXTENSION,
    errors::ScriptError,
    types::ConstructorArg,
};

/// The marker solc leaves in bytecode that still needs libraries linked in
const LIBRARY_PLACEHOLDER: &str = "__$";

/// A compiled contract: its ABI and creation bytecode
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// The contract name
    pub name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

/// The on-disk shape of an artifact file
#[derive(Deserialize)]
struct ArtifactFile {
    /// The contract name, only present in Hardhat artifacts
    #[serde(rename = "contractName", default)]
    contract_name: Option<String>,
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode
    bytecode: ArtifactBytecode,
}

/// Creation bytecode as emitted by either toolchain
#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    /// Hardhat: a bare hex string
    Hex(String),
    /// Foundry: an object holding the hex string
    Object {
        /// The hex-encoded bytecode
        object: String,
    },
}

impl ArtifactBytecode {
    /// The hex-encoded bytecode
    fn as_hex(&self) -> &str {
        match self {
            ArtifactBytecode::Hex(s) => s,
            ArtifactBytecode::Object { object } => object,
        }
    }
}

impl ContractArtifact {
    /// Parse an artifact from its JSON representation
    pub fn from_json(name: &str, json: &str) -> Result<Self, ScriptError> {
        let file: ArtifactFile = serde_json::from_str(json)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: {e}")))?;

        let hex = file.bytecode.as_hex().trim();
        if hex.contains(LIBRARY_PLACEHOLDER) {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name}: bytecode contains unlinked library placeholders"
            )));
        }

        let bytecode = Bytes::from_str(hex)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{name}: invalid bytecode: {e}")))?;
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{name}: no creation bytecode, is it abstract or an interface?"
            )));
        }

        Ok(Self {
            name: file.contract_name.unwrap_or_else(|| name.to_string()),
            abi: file.abi,
            bytecode,
        })
    }

    /// Find and parse the artifact for `name` under `artifacts_dir`
    pub fn load(artifacts_dir: &Path, name: &str) -> Result<Self, ScriptError> {
        let path = find_artifact(artifacts_dir, name)?;
        let json = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;

        Self::from_json(name, &json)
    }

    /// The constructor signature, e.g. `constructor(address,address)`
    pub fn constructor_signature(&self) -> String {
        let params = self
            .abi
            .constructor
            .as_ref()
            .map(|c| {
                c.inputs
                    .iter()
                    .map(|p| p.selector_type().into_owned())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();

        format!("constructor({params})")
    }

    /// Validate the constructor arguments against the ABI and build the
    /// contract-creation payload: bytecode followed by the encoded arguments
    pub fn deploy_code(&self, args: &[ConstructorArg]) -> Result<Bytes, ScriptError> {
        let inputs = self
            .abi
            .constructor
            .as_ref()
            .map(|c| c.inputs.as_slice())
            .unwrap_or_default();

        if inputs.len() != args.len() {
            return Err(ScriptError::ConstructorArgs(format!(
                "{} expects {} argument(s) for {}, got {}",
                self.name,
                inputs.len(),
                self.constructor_signature(),
                args.len()
            )));
        }

        let mut values = Vec::with_capacity(args.len());
        for (param, arg) in inputs.iter().zip(args) {
            let value = arg
                .value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ScriptError::MissingConstructorArg(arg.name.clone()))?;

            let ty = param
                .resolve()
                .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", self.name)))?;
            let coerced = ty.coerce_str(value).map_err(|e| {
                ScriptError::ConstructorArgs(format!(
                    "{} (`{}`): expected {}: {e}",
                    arg.name,
                    param.name,
                    ty.sol_type_name()
                ))
            })?;
            values.push(coerced);
        }

        let encoded = self.encode_constructor_args(&values)?;

        let mut code = self.bytecode.to_vec();
        code.extend_from_slice(&encoded);
        Ok(code.into())
    }

    /// ABI-encode already-typed constructor arguments
    fn encode_constructor_args(&self, values: &[DynSolValue]) -> Result<Vec<u8>, ScriptError> {
        match &self.abi.constructor {
            Some(constructor) => constructor
                .abi_encode_input(values)
                .map_err(|e| ScriptError::ConstructorArgs(format!("{}: {e}", self.name))),
            None => Ok(Vec::new()),
        }
    }
}

/// Locate `<name>.json` anywhere beneath `dir`
pub fn find_artifact(dir: &Path, name: &str) -> Result<PathBuf, ScriptError> {
    let file_name = format!("{name}.{ARTIFACT_EXTENSION}");
    let mut matches = Vec::new();
    collect_matches(dir, &file_name, &mut matches)?;

    match matches.len() {
        0 => Err(ScriptError::ArtifactNotFound(format!(
            "no {file_name} under {}",
            dir.display()
        ))),
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort();
            let found = matches
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Err(ScriptError::ArtifactParsing(format!(
                "{name} is ambiguous, found {found}"
            )))
        }
    }
}

/// Recursively collect files named `file_name`
fn collect_matches(
    dir: &Path,
    file_name: &str,
    matches: &mut Vec<PathBuf>,
) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ScriptError::ArtifactNotFound(format!("{}: {e}", dir.display())))?;

    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ArtifactNotFound(e.to_string()))?
            .path();

        if path.is_dir() {
            collect_matches(&path, file_name, matches)?;
            continue;
        }

        let is_match = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == file_name);
        if is_match {
            matches.push(path);
        }
    }

    Ok(())
}
