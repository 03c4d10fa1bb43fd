//! Loading of compiled contract artifacts

use std::{
    fs::File,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use serde::Deserialize;

use crate::{constants::ARTIFACT_EXTENSION, errors::ScriptError, types::ContractKind};

/// The fields of a Hardhat compilation artifact used by the rollout
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    /// The name of the contract
    contract_name: String,
    /// The source file the contract was compiled from
    source_name: String,
    /// The contract ABI
    abi: JsonAbi,
    /// The creation bytecode, hex encoded
    bytecode: String,
}

/// A compiled contract, ready to be deployed
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Which contract this is
    pub kind: ContractKind,
    /// The source file the contract was compiled from
    pub source_name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode
    pub bytecode: Bytes,
}

impl Artifact {
    /// The fully-qualified name of the contract, `<source>:<name>`
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.kind.name())
    }

    /// Ensure that every function the rollout calls exists in the ABI
    pub fn check_functions(&self) -> Result<(), ScriptError> {
        let missing: Vec<&str> = self
            .kind
            .required_functions()
            .iter()
            .copied()
            .filter(|name| !self.abi.functions.contains_key(*name))
            .collect();

        if !missing.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} ABI is missing functions: {}",
                self.kind,
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

/// The location of a contract's artifact under the artifacts directory,
/// `<artifacts>/contracts/<Name>_flat.sol/<Name>.json`
pub fn artifact_path(artifacts_path: &Path, kind: ContractKind) -> PathBuf {
    artifacts_path
        .join(kind.source_name())
        .join(kind.name())
        .with_extension(ARTIFACT_EXTENSION)
}

/// Load and sanity-check the artifact of the given contract
pub fn load_artifact(artifacts_path: &Path, kind: ContractKind) -> Result<Artifact, ScriptError> {
    let path = artifact_path(artifacts_path, kind);
    let file = File::open(&path)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;
    let raw: RawArtifact = serde_json::from_reader(file)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;

    if raw.contract_name != kind.name() {
        return Err(ScriptError::ArtifactParsing(format!(
            "{} contains contract {}, expected {}",
            path.display(),
            raw.contract_name,
            kind
        )));
    }

    let bytecode = Bytes::from_str(&raw.bytecode)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{kind} bytecode: {e}")))?;
    if bytecode.is_empty() {
        return Err(ScriptError::ArtifactParsing(format!(
            "{kind} has no bytecode, is it abstract?"
        )));
    }

    let artifact = Artifact {
        kind,
        source_name: raw.source_name,
        abi: raw.abi,
        bytecode,
    };
    artifact.check_functions()?;

    Ok(artifact)
}
