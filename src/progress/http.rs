//! Client for the portal's progress persistence endpoint.
//!
//! - `GET  {base}/campaigns/{id}` returns the campaign document including
//!   `deploymentProgress`.
//! - `POST {base}/campaigns/{id}/deployment-progress` merges
//!   `{campaignId, progress, expectedRevision}` server-side and answers
//!   `{revision}`; `409 Conflict` carries `{revision}` of the stored record.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::{CampaignRecord, CampaignSource, DeploymentProgress, ProgressPatch, ProgressStore};
use crate::errors::StoreError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MergeRequest<'a> {
    campaign_id: &'a str,
    progress: &'a ProgressPatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_revision: Option<u64>,
}

#[derive(Deserialize)]
struct MergeResponse {
    revision: u64,
}

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url)
            .map_err(|e| StoreError::Backend(format!("invalid store URL '{base_url}': {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(StoreError::Backend(format!(
                "store URL '{base_url}' cannot carry a path"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// `{base}/campaigns/{id}[/{tail}]` with the id percent-encoded as a
    /// single path segment.
    fn campaign_url(&self, campaign_id: &str, tail: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StoreError::Backend(format!("store URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .push("campaigns")
            .push(campaign_id)
            .extend(tail);
        Ok(url)
    }
}

#[async_trait]
impl CampaignSource for HttpStore {
    async fn campaign(&self, campaign_id: &str) -> Result<CampaignRecord, StoreError> {
        let url = self.campaign_url(campaign_id, None)?;
        let response = self.client.get(url.clone()).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                campaign_id: campaign_id.to_string(),
            }),
            status if status.is_success() => Ok(response.json().await?),
            status => Err(StoreError::Backend(format!(
                "GET {url} returned {status}"
            ))),
        }
    }
}

#[async_trait]
impl ProgressStore for HttpStore {
    async fn load(&self, campaign_id: &str) -> Result<DeploymentProgress, StoreError> {
        let record = self.campaign(campaign_id).await?;
        record
            .deployment_progress
            .unwrap_or_default()
            .normalized(campaign_id)
    }

    async fn merge(
        &self,
        campaign_id: &str,
        patch: &ProgressPatch,
        expected_revision: Option<u64>,
    ) -> Result<u64, StoreError> {
        let url = self.campaign_url(campaign_id, Some("deployment-progress"))?;
        let response = self
            .client
            .post(url.clone())
            .json(&MergeRequest {
                campaign_id,
                progress: patch,
                expected_revision,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::CONFLICT => {
                let found = response
                    .json::<MergeResponse>()
                    .await
                    .map(|r| r.revision)
                    .unwrap_or_default();
                Err(StoreError::RevisionConflict {
                    campaign_id: campaign_id.to_string(),
                    expected: expected_revision.unwrap_or_default(),
                    found,
                })
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                campaign_id: campaign_id.to_string(),
            }),
            status if status.is_success() => Ok(response.json::<MergeResponse>().await?.revision),
            status => Err(StoreError::Backend(format!(
                "POST {url} returned {status}"
            ))),
        }
    }
}
