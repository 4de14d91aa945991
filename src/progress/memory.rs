use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::merge_into;
use super::{CampaignRecord, CampaignSource, DeploymentProgress, ProgressPatch, ProgressStore};
use crate::errors::StoreError;

/// In-process document store. Used by tests and when embedding the
/// orchestrator next to an existing data layer.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<String, CampaignRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a campaign document.
    pub async fn insert_campaign(&self, record: CampaignRecord) {
        self.documents
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    /// Raw stored progress, without normalization. Test helper for
    /// asserting exactly what was written.
    pub async fn raw_progress(&self, campaign_id: &str) -> Option<DeploymentProgress> {
        self.documents
            .read()
            .await
            .get(campaign_id)
            .and_then(|doc| doc.deployment_progress.clone())
    }
}

#[async_trait]
impl CampaignSource for MemoryStore {
    async fn campaign(&self, campaign_id: &str) -> Result<CampaignRecord, StoreError> {
        self.documents
            .read()
            .await
            .get(campaign_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                campaign_id: campaign_id.to_string(),
            })
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load(&self, campaign_id: &str) -> Result<DeploymentProgress, StoreError> {
        let documents = self.documents.read().await;
        let progress = documents
            .get(campaign_id)
            .and_then(|doc| doc.deployment_progress.clone())
            .unwrap_or_default();
        progress.normalized(campaign_id)
    }

    async fn merge(
        &self,
        campaign_id: &str,
        patch: &ProgressPatch,
        expected_revision: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(campaign_id)
            .ok_or_else(|| StoreError::NotFound {
                campaign_id: campaign_id.to_string(),
            })?;
        let merged = merge_into(
            campaign_id,
            document.deployment_progress.clone(),
            patch,
            expected_revision,
        )?;
        let revision = merged.revision;
        document.deployment_progress = Some(merged);
        Ok(revision)
    }
}
