use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::merkle;
use crate::errors::{StepError, StoreError};
use crate::progress::CampaignSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCommitment {
    pub root: String,
    pub member_count: u64,
}

/// Commitment Generation seam. Implementations must be deterministic: the
/// same identity list always yields the same root.
#[async_trait]
pub trait CommitmentService: Send + Sync {
    async fn generate(&self, campaign_id: &str) -> Result<GeneratedCommitment, StepError>;
}

/// Computes the allowlist Merkle root in-process from the campaign document.
pub struct MerkleCommitmentService {
    campaigns: Arc<dyn CampaignSource>,
}

impl MerkleCommitmentService {
    pub fn new(campaigns: Arc<dyn CampaignSource>) -> Self {
        Self { campaigns }
    }
}

#[async_trait]
impl CommitmentService for MerkleCommitmentService {
    async fn generate(&self, campaign_id: &str) -> Result<GeneratedCommitment, StepError> {
        let campaign = self
            .campaigns
            .campaign(campaign_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => StepError::Generation(format!(
                    "campaign {campaign_id} not found"
                )),
                other => StepError::Generation(format!("failed to load allowlist: {other}")),
            })?;

        let members = merkle::canonical_members(&campaign.allowlist);
        let root = merkle::root(&members).ok_or_else(|| StepError::EmptyAllowlist {
            campaign_id: campaign_id.to_string(),
        })?;

        tracing::debug!(campaign_id, members = members.len(), "computed allowlist root");
        Ok(GeneratedCommitment {
            root: merkle::to_hex(&root),
            member_count: members.len() as u64,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitmentRequest<'a> {
    campaign_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitmentResponse {
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    member_count: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Delegates generation to the portal's commitment service.
#[derive(Debug, Clone)]
pub struct HttpCommitmentService {
    client: Client,
    url: String,
}

impl HttpCommitmentService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StepError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CommitmentService for HttpCommitmentService {
    async fn generate(&self, campaign_id: &str) -> Result<GeneratedCommitment, StepError> {
        let response = self
            .client
            .post(&self.url)
            .json(&CommitmentRequest { campaign_id })
            .send()
            .await
            .map_err(|e| StepError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StepError::Generation(format!("status {status}: {body}")));
        }

        let body: CommitmentResponse = response
            .json()
            .await
            .map_err(|e| StepError::Generation(format!("invalid response: {e}")))?;
        match (body.root, body.member_count) {
            (_, Some(0)) => Err(StepError::EmptyAllowlist {
                campaign_id: campaign_id.to_string(),
            }),
            (Some(root), Some(member_count)) if !root.is_empty() => {
                Ok(GeneratedCommitment { root, member_count })
            }
            _ => Err(StepError::Generation(
                body.error
                    .unwrap_or_else(|| "response is missing root or memberCount".to_string()),
            )),
        }
    }
}
