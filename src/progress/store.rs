use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{DeploymentProgress, ProgressPatch};
use crate::errors::StoreError;

/// Campaign document owned by the registration/CRUD side of the portal.
///
/// The orchestrator only reads it; `deployment_progress` is the embedded
/// record written through [`ProgressStore::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: String,
    pub max_supply: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<std::path::PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Eligible identities (wallet addresses) for the allowlist commitment.
    #[serde(default)]
    pub allowlist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_progress: Option<DeploymentProgress>,
}

impl CampaignRecord {
    /// The token symbol, derived from the name when none was registered.
    pub fn token_symbol(&self) -> String {
        if let Some(symbol) = self.symbol.as_deref().map(str::trim)
            && !symbol.is_empty()
        {
            return symbol.to_uppercase();
        }
        let derived: String = self
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .take(5)
            .collect();
        if derived.is_empty() {
            "NFT".to_string()
        } else {
            derived
        }
    }
}

/// Read access to campaign documents.
#[async_trait]
pub trait CampaignSource: Send + Sync {
    async fn campaign(&self, campaign_id: &str) -> Result<CampaignRecord, StoreError>;
}

/// Read/merge access to the per-campaign progress record.
///
/// Implementations make a single `merge` atomic for one campaign. When
/// `expected_revision` is supplied and the stored revision differs, the merge
/// must be refused with [`StoreError::RevisionConflict`].
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the progress record; an absent record is `NotStarted`.
    async fn load(&self, campaign_id: &str) -> Result<DeploymentProgress, StoreError>;

    /// Shallow-merge `patch` into the stored record and return the new revision.
    async fn merge(
        &self,
        campaign_id: &str,
        patch: &ProgressPatch,
        expected_revision: Option<u64>,
    ) -> Result<u64, StoreError>;
}

/// Shared read-modify-write used by the document backends.
pub(crate) fn merge_into(
    campaign_id: &str,
    current: Option<DeploymentProgress>,
    patch: &ProgressPatch,
    expected_revision: Option<u64>,
) -> Result<DeploymentProgress, StoreError> {
    let mut progress = current.unwrap_or_default();
    if let Some(expected) = expected_revision
        && expected != progress.revision
    {
        return Err(StoreError::RevisionConflict {
            campaign_id: campaign_id.to_string(),
            expected,
            found: progress.revision,
        });
    }
    progress.apply(patch);
    progress.check_order().map_err(|reason| StoreError::Corrupt {
        campaign_id: campaign_id.to_string(),
        reason,
    })?;
    if let Some(step) = patch.current_step
        && !progress.backs(step)
    {
        return Err(StoreError::Corrupt {
            campaign_id: campaign_id.to_string(),
            reason: format!(
                "patch sets currentStep {step} but checkpoints only reach {}",
                progress.checkpointed_step()
            ),
        });
    }
    progress.revision += 1;
    Ok(progress)
}
