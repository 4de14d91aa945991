use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::deploy::ConstructorArgs;
use crate::errors::StepError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub contract_address: String,
    pub network: String,
    pub constructor_args: ConstructorArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub explorer_url: Option<String>,
}

/// Explorer source verification. Best-effort: callers downgrade every
/// error to a warning.
#[async_trait]
pub trait ContractVerifier: Send + Sync {
    async fn verify(&self, request: &VerificationRequest)
    -> Result<VerificationOutcome, StepError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationResponse {
    success: bool,
    #[serde(default)]
    explorer_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpContractVerifier {
    client: Client,
    url: String,
}

impl HttpContractVerifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StepError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ContractVerifier for HttpContractVerifier {
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, StepError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| StepError::Verification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StepError::Verification(format!("status {status}: {body}")));
        }

        let body: VerificationResponse = response
            .json()
            .await
            .map_err(|e| StepError::Verification(format!("invalid response: {e}")))?;
        if !body.success {
            return Err(StepError::Verification(
                body.error
                    .unwrap_or_else(|| "explorer rejected verification".to_string()),
            ));
        }

        tracing::info!(
            contract_address = %request.contract_address,
            network = %request.network,
            "contract source verified"
        );
        Ok(VerificationOutcome {
            verified: true,
            explorer_url: body.explorer_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_in_camel_case() {
        let request = VerificationRequest {
            contract_address: "0xabc".into(),
            network: "sepolia".into(),
            constructor_args: ConstructorArgs {
                name: "Camp".into(),
                symbol: "CAMP".into(),
                max_supply: 10,
                base_uri: "ipfs://X/".into(),
                commitment_root: "0x00".into(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contractAddress"], "0xabc");
        assert_eq!(json["network"], "sepolia");
        assert_eq!(json["constructorArgs"]["symbol"], "CAMP");
        assert_eq!(json["constructorArgs"]["baseURI"], "ipfs://X/");
    }

    #[test]
    fn test_response_defaults() {
        let body: VerificationResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!body.success);
        assert!(body.explorer_url.is_none());
        assert!(body.error.is_none());
    }
}
