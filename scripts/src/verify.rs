//! Source verification against the block explorer's verification API
//!
//! A verification request is submitted once, then its status is polled until
//! the explorer either accepts or rejects the source.

use std::{fs, path::Path, time::Duration};

use alloy::primitives::Address;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    artifacts::Artifact,
    constants::{
        EMPTY_CONSTRUCTOR_ARGS, SINGLE_FILE_CODE_FORMAT, VERIFICATION_POLL_ATTEMPTS,
        VERIFICATION_POLL_INTERVAL_MS, VERIFICATION_STATUS_FAILED, VERIFICATION_STATUS_SUCCESSFUL,
    },
    errors::ScriptError,
};

/// The compiler settings the explorer recompiles the source with
#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// The solc version
    pub solc_version: String,
    /// The zksolc version
    pub zksolc_version: String,
    /// Whether the optimizer was enabled
    pub optimization_used: bool,
}

/// The body of a verification request
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    /// The address of the deployed contract
    pub contract_address: String,
    /// The flattened source code
    pub source_code: String,
    /// The format of `source_code`
    pub code_format: String,
    /// The fully-qualified contract name
    pub contract_name: String,
    /// The solc version
    pub compiler_solc_version: String,
    /// The zksolc version
    pub compiler_zksolc_version: String,
    /// Whether the optimizer was enabled
    pub optimization_used: bool,
    /// The ABI-encoded constructor arguments
    pub constructor_arguments: String,
}

/// The status of a verification request, as reported by the explorer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatus {
    /// One of `queued`, `in_progress`, `successful`, `failed`
    pub status: String,
    /// The reason for a failure
    #[serde(default)]
    pub error: Option<String>,
    /// Compiler errors hit while recompiling the source
    #[serde(default)]
    pub compilation_errors: Option<Vec<String>>,
}

impl VerificationRequest {
    /// Build the request for a deployed artifact, reading its flattened
    /// source from under `sources_path`
    pub fn for_artifact(
        artifact: &Artifact,
        address: Address,
        sources_path: &Path,
        settings: &CompilerSettings,
    ) -> Result<Self, ScriptError> {
        let source_path = sources_path.join(&artifact.source_name);
        let source_code = fs::read_to_string(&source_path)
            .map_err(|e| ScriptError::Verification(format!("{}: {e}", source_path.display())))?;

        Ok(Self {
            contract_address: format!("{address:#x}"),
            source_code,
            code_format: SINGLE_FILE_CODE_FORMAT.to_string(),
            contract_name: artifact.fully_qualified_name(),
            compiler_solc_version: settings.solc_version.clone(),
            compiler_zksolc_version: settings.zksolc_version.clone(),
            optimization_used: settings.optimization_used,
            constructor_arguments: EMPTY_CONSTRUCTOR_ARGS.to_string(),
        })
    }
}

/// A client for the explorer's verification API
#[derive(Debug, Clone)]
pub struct ExplorerVerifier {
    /// The HTTP client
    http: HttpClient,
    /// The verification endpoint
    url: String,
    /// The compiler settings submitted with every request
    settings: CompilerSettings,
    /// How many times to poll the status of a request
    poll_attempts: usize,
    /// How long to wait between polls
    poll_interval: Duration,
}

impl ExplorerVerifier {
    /// Create a verifier for the given endpoint
    pub fn new(url: &str, settings: CompilerSettings) -> Self {
        Self {
            http: HttpClient::new(),
            url: url.trim_end_matches('/').to_string(),
            settings,
            poll_attempts: VERIFICATION_POLL_ATTEMPTS,
            poll_interval: Duration::from_millis(VERIFICATION_POLL_INTERVAL_MS),
        }
    }

    /// Override the polling schedule
    pub fn with_polling(mut self, attempts: usize, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    /// The compiler settings submitted with every request
    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Submit a verification request, returning its id
    pub async fn submit(&self, request: &VerificationRequest) -> Result<u64, ScriptError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?;
        if !status.is_success() {
            return Err(ScriptError::Verification(format!(
                "explorer responded {status}: {body}"
            )));
        }

        body.trim()
            .parse::<u64>()
            .map_err(|_| ScriptError::Verification(format!("unexpected verification id: {body}")))
    }

    /// Fetch the status of a verification request
    pub async fn status(&self, id: u64) -> Result<VerificationStatus, ScriptError> {
        self.http
            .get(format!("{}/{id}", self.url))
            .send()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?
            .error_for_status()
            .map_err(|e| ScriptError::Verification(e.to_string()))?
            .json()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))
    }

    /// Submit a verification request and wait for the explorer's verdict
    pub async fn verify(&self, request: &VerificationRequest) -> Result<u64, ScriptError> {
        let id = self.submit(request).await?;
        info!(
            "Submitted verification {id} for {} at {}",
            request.contract_name, request.contract_address
        );

        let mut remaining_attempts = self.poll_attempts;
        while remaining_attempts > 0 {
            let status = self.status(id).await?;
            debug!("verification {id} status: {}", status.status);

            match status.status.as_str() {
                VERIFICATION_STATUS_SUCCESSFUL => return Ok(id),
                VERIFICATION_STATUS_FAILED => {
                    let reason = status
                        .error
                        .or_else(|| status.compilation_errors.map(|errs| errs.join("; ")))
                        .unwrap_or_else(|| "no reason given".to_string());
                    return Err(ScriptError::Verification(format!(
                        "verification {id} failed: {reason}"
                    )));
                }
                _ => {
                    tokio::time::sleep(self.poll_interval).await;
                    remaining_attempts -= 1;
                }
            }
        }

        Err(ScriptError::Verification(format!(
            "verification {id} still pending after {} polls",
            self.poll_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, time::Duration};

    use alloy::{
        json_abi::JsonAbi,
        primitives::{address, Bytes},
    };
    use httpmock::prelude::*;
    use serde_json::json;

    use super::{CompilerSettings, ExplorerVerifier, VerificationRequest};
    use crate::{artifacts::Artifact, errors::ScriptError, types::ContractKind};

    fn settings() -> CompilerSettings {
        CompilerSettings {
            solc_version: "0.8.17".to_string(),
            zksolc_version: "v1.3.13".to_string(),
            optimization_used: true,
        }
    }

    fn request() -> VerificationRequest {
        VerificationRequest {
            contract_address: "0x1d68ae39bf07d05d41755c6342a6f724129d9fe0".to_string(),
            source_code: "contract ReferrerStorage {}".to_string(),
            code_format: "solidity-single-file".to_string(),
            contract_name: "contracts/ReferrerStorage_flat.sol:ReferrerStorage".to_string(),
            compiler_solc_version: "0.8.17".to_string(),
            compiler_zksolc_version: "v1.3.13".to_string(),
            optimization_used: true,
            constructor_arguments: "0x".to_string(),
        }
    }

    #[test]
    fn test_request_for_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let kind = ContractKind::ReferrerStorage;
        fs::create_dir_all(dir.path().join("contracts")).unwrap();
        fs::write(dir.path().join(kind.source_name()), "contract ReferrerStorage {}").unwrap();

        let artifact = Artifact {
            kind,
            source_name: kind.source_name(),
            abi: JsonAbi::default(),
            bytecode: Bytes::from_static(&[0x60, 0x80]),
        };
        let address = address!("1D68ae39BF07d05d41755C6342a6F724129D9FE0");

        let req =
            VerificationRequest::for_artifact(&artifact, address, dir.path(), &settings()).unwrap();
        assert_eq!(req, request());
    }

    #[tokio::test]
    async fn test_verify_success() {
        let server = MockServer::start();
        let submit = server.mock(|when, then| {
            when.method(POST)
                .path("/contract_verification")
                .json_body_partial(r#"{"codeFormat": "solidity-single-file", "constructorArguments": "0x"}"#);
            then.status(200).body("42");
        });
        let poll = server.mock(|when, then| {
            when.method(GET).path("/contract_verification/42");
            then.status(200).json_body(json!({ "status": "successful" }));
        });

        let verifier = ExplorerVerifier::new(&server.url("/contract_verification/"), settings())
            .with_polling(3, Duration::from_millis(1));
        let id = verifier.verify(&request()).await.unwrap();

        assert_eq!(id, 42);
        submit.assert();
        poll.assert();
    }

    #[tokio::test]
    async fn test_verify_failure_reports_reason() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/contract_verification");
            then.status(200).body("7");
        });
        server.mock(|when, then| {
            when.method(GET).path("/contract_verification/7");
            then.status(200).json_body(json!({
                "status": "failed",
                "error": "bytecode mismatch"
            }));
        });

        let verifier = ExplorerVerifier::new(&server.url("/contract_verification"), settings())
            .with_polling(3, Duration::from_millis(1));

        match verifier.verify(&request()).await {
            Err(ScriptError::Verification(msg)) => assert!(msg.contains("bytecode mismatch")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_gives_up_when_pending() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/contract_verification");
            then.status(200).body("9");
        });
        let poll = server.mock(|when, then| {
            when.method(GET).path("/contract_verification/9");
            then.status(200).json_body(json!({ "status": "in_progress" }));
        });

        let verifier = ExplorerVerifier::new(&server.url("/contract_verification"), settings())
            .with_polling(2, Duration::from_millis(1));

        assert!(verifier.verify(&request()).await.is_err());
        poll.assert_hits(2);
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/contract_verification");
            then.status(400).body("contract already verified");
        });

        let verifier = ExplorerVerifier::new(&server.url("/contract_verification"), settings());
        match verifier.submit(&request()).await {
            Err(ScriptError::Verification(msg)) => assert!(msg.contains("already verified")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
