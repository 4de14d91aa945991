//! Per-campaign deployment progress: the checkpoint record, the patches
//! merged into it, and the stores that persist it.
//!
//! A record is a set of checkpoints filled strictly in order:
//!
//! ```text
//! notStarted ─▶ assetsPublished ─▶ commitmentGenerated ─▶ contractDeployed ─▶ complete
//!                  (assets)            (commitment)           (deployment)
//! ```
//!
//! `currentStep` is always derivable from which checkpoint fields are
//! present; [`DeploymentProgress::normalized`] enforces that on load.

pub mod file;
pub mod http;
pub mod memory;
pub mod store;

pub use file::FileStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use store::{CampaignRecord, CampaignSource, ProgressStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::StoreError;

/// Persisted position of a campaign in the deployment state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentStep {
    #[default]
    NotStarted,
    AssetsPublished,
    CommitmentGenerated,
    ContractDeployed,
    Complete,
}

impl std::fmt::Display for DeploymentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentStep::NotStarted => write!(f, "notStarted"),
            DeploymentStep::AssetsPublished => write!(f, "assetsPublished"),
            DeploymentStep::CommitmentGenerated => write!(f, "commitmentGenerated"),
            DeploymentStep::ContractDeployed => write!(f, "contractDeployed"),
            DeploymentStep::Complete => write!(f, "complete"),
        }
    }
}

/// Output of Asset Publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsCheckpoint {
    pub image_ref: String,
    pub metadata_ref: String,
    #[serde(rename = "baseURI")]
    pub base_uri: String,
    pub completed_at: DateTime<Utc>,
}

/// Output of Commitment Generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentCheckpoint {
    pub root: String,
    pub member_count: u64,
    pub completed_at: DateTime<Utc>,
}

/// Output of Contract Deployment, plus the independently-set verification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentCheckpoint {
    pub contract_address: String,
    pub tx_hash: String,
    pub network: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

/// A contract-creation transaction that was broadcast but not yet checkpointed.
///
/// Not a checkpoint: it never moves `currentStep`. It lets a resumed run
/// re-attach to the transaction instead of broadcasting a second one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDeployment {
    pub tx_hash: String,
    pub network: String,
    pub submitted_at: DateTime<Utc>,
}

/// The full progress record for one campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProgress {
    #[serde(default)]
    pub current_step: DeploymentStep,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetsCheckpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentCheckpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentCheckpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_deployment: Option<PendingDeployment>,
    /// Write counter maintained by the store; 0 for a record never written.
    #[serde(default)]
    pub revision: u64,
}

impl DeploymentProgress {
    /// Number of populated checkpoint fields (0..=3).
    pub fn checkpoint_count(&self) -> usize {
        [
            self.assets.is_some(),
            self.commitment.is_some(),
            self.deployment.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// Percentage complete for display: populated checkpoints ÷ 3.
    pub fn percent_complete(&self) -> u8 {
        (self.checkpoint_count() * 100 / 3) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.current_step == DeploymentStep::Complete
    }

    /// The highest step the present checkpoint fields justify.
    pub fn checkpointed_step(&self) -> DeploymentStep {
        if self.deployment.is_some() {
            DeploymentStep::ContractDeployed
        } else if self.commitment.is_some() {
            DeploymentStep::CommitmentGenerated
        } else if self.assets.is_some() {
            DeploymentStep::AssetsPublished
        } else {
            DeploymentStep::NotStarted
        }
    }

    /// Check the order invariant: a later checkpoint implies all earlier ones.
    pub fn check_order(&self) -> Result<(), String> {
        if self.commitment.is_some() && self.assets.is_none() {
            return Err("commitment present without assets".to_string());
        }
        if self.deployment.is_some() && self.commitment.is_none() {
            return Err("deployment present without commitment".to_string());
        }
        Ok(())
    }

    /// Whether the checkpoints present justify `step`: `Complete` needs a
    /// deployment, any other step needs its own checkpoint.
    pub fn backs(&self, step: DeploymentStep) -> bool {
        match step {
            DeploymentStep::Complete => self.deployment.is_some(),
            step => step <= self.checkpointed_step(),
        }
    }

    /// Validate the order invariant and reconcile `currentStep` with the
    /// checkpoint fields actually present.
    ///
    /// `Complete` is kept only when a deployment checkpoint exists; any other
    /// value is replaced by the step the checkpoints justify.
    pub fn normalized(mut self, campaign_id: &str) -> Result<Self, StoreError> {
        self.check_order().map_err(|reason| StoreError::Corrupt {
            campaign_id: campaign_id.to_string(),
            reason,
        })?;

        let justified = self.checkpointed_step();
        self.current_step = match self.current_step {
            DeploymentStep::Complete if self.deployment.is_some() => DeploymentStep::Complete,
            _ => justified,
        };
        Ok(self)
    }

    /// Apply a patch with shallow top-level merge semantics.
    ///
    /// `currentStep` never regresses: the stored value is the maximum of the
    /// current and supplied steps.
    pub fn apply(&mut self, patch: &ProgressPatch) {
        if let Some(step) = patch.current_step {
            self.current_step = self.current_step.max(step);
        }
        if let Some(assets) = &patch.assets {
            self.assets = Some(assets.clone());
        }
        if let Some(commitment) = &patch.commitment {
            self.commitment = Some(commitment.clone());
        }
        if let Some(deployment) = &patch.deployment {
            self.deployment = Some(deployment.clone());
        }
        if let Some(pending) = &patch.pending_deployment {
            self.pending_deployment = pending.clone();
        }
    }
}

/// A partial progress record merged into the stored one.
///
/// `pending_deployment` is tri-state: `None` leaves the stored value alone,
/// `Some(None)` clears it, `Some(Some(_))` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<DeploymentStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetsCheckpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentCheckpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentCheckpoint>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub pending_deployment: Option<Option<PendingDeployment>>,
}

impl ProgressPatch {
    pub fn assets(checkpoint: AssetsCheckpoint) -> Self {
        Self {
            current_step: Some(DeploymentStep::AssetsPublished),
            assets: Some(checkpoint),
            ..Default::default()
        }
    }

    pub fn commitment(checkpoint: CommitmentCheckpoint) -> Self {
        Self {
            current_step: Some(DeploymentStep::CommitmentGenerated),
            commitment: Some(checkpoint),
            ..Default::default()
        }
    }

    /// Deployment checkpoint; also clears the broadcast journal.
    pub fn deployment(checkpoint: DeploymentCheckpoint) -> Self {
        Self {
            current_step: Some(DeploymentStep::ContractDeployed),
            deployment: Some(checkpoint),
            pending_deployment: Some(None),
            ..Default::default()
        }
    }

    /// Verification result written into the existing deployment checkpoint.
    pub fn verification(checkpoint: DeploymentCheckpoint) -> Self {
        Self {
            deployment: Some(checkpoint),
            ..Default::default()
        }
    }

    pub fn pending(pending: PendingDeployment) -> Self {
        Self {
            pending_deployment: Some(Some(pending)),
            ..Default::default()
        }
    }

    pub fn clear_pending() -> Self {
        Self {
            pending_deployment: Some(None),
            ..Default::default()
        }
    }

    pub fn finalize() -> Self {
        Self {
            current_step: Some(DeploymentStep::Complete),
            ..Default::default()
        }
    }

    /// Fold a later patch into this one. Fields set by `later` win; the
    /// step keeps the maximum of both.
    pub fn overlay(&mut self, later: &ProgressPatch) {
        if let Some(step) = later.current_step {
            self.current_step = Some(self.current_step.map_or(step, |current| current.max(step)));
        }
        if later.assets.is_some() {
            self.assets = later.assets.clone();
        }
        if later.commitment.is_some() {
            self.commitment = later.commitment.clone();
        }
        if later.deployment.is_some() {
            self.deployment = later.deployment.clone();
        }
        if later.pending_deployment.is_some() {
            self.pending_deployment = later.pending_deployment.clone();
        }
    }
}

/// Distinguishes an explicit `null` (clear) from an absent field (untouched).
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn assets() -> AssetsCheckpoint {
        AssetsCheckpoint {
            image_ref: "ipfs://img".to_string(),
            metadata_ref: "ipfs://meta".to_string(),
            base_uri: "ipfs://X/".to_string(),
            completed_at: Utc::now(),
        }
    }

    pub fn commitment() -> CommitmentCheckpoint {
        CommitmentCheckpoint {
            root: format!("0x{}", "ab".repeat(32)),
            member_count: 3,
            completed_at: Utc::now(),
        }
    }

    pub fn deployment() -> DeploymentCheckpoint {
        DeploymentCheckpoint {
            contract_address: "0x00000000000000000000000000000000000000c0".to_string(),
            tx_hash: "0xfeed".to_string(),
            network: "sepolia".to_string(),
            completed_at: Utc::now(),
            verified: None,
            verified_at: None,
            explorer_url: None,
        }
    }

    pub fn pending() -> PendingDeployment {
        PendingDeployment {
            tx_hash: "0xfeed".to_string(),
            network: "sepolia".to_string(),
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_empty_record_is_not_started() {
        let progress = DeploymentProgress::default();
        assert_eq!(progress.current_step, DeploymentStep::NotStarted);
        assert_eq!(progress.percent_complete(), 0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_percent_complete_counts_checkpoints() {
        let mut progress = DeploymentProgress::default();
        progress.apply(&ProgressPatch::assets(assets()));
        assert_eq!(progress.percent_complete(), 33);
        progress.apply(&ProgressPatch::commitment(commitment()));
        assert_eq!(progress.percent_complete(), 66);
        progress.apply(&ProgressPatch::deployment(deployment()));
        assert_eq!(progress.percent_complete(), 100);
    }

    #[test]
    fn test_steps_are_backed_by_checkpoints() {
        let mut progress = DeploymentProgress::default();
        assert!(progress.backs(DeploymentStep::NotStarted));
        assert!(!progress.backs(DeploymentStep::AssetsPublished));
        assert!(!progress.backs(DeploymentStep::Complete));

        progress.apply(&ProgressPatch::assets(assets()));
        progress.apply(&ProgressPatch::commitment(commitment()));
        assert!(progress.backs(DeploymentStep::CommitmentGenerated));
        assert!(!progress.backs(DeploymentStep::ContractDeployed));
        assert!(!progress.backs(DeploymentStep::Complete));

        progress.apply(&ProgressPatch::deployment(deployment()));
        assert!(progress.backs(DeploymentStep::Complete));
    }

    #[test]
    fn test_overlay_carries_earlier_checkpoints() {
        let mut carried = ProgressPatch::assets(assets());
        carried.overlay(&ProgressPatch::commitment(commitment()));
        carried.overlay(&ProgressPatch::pending(pending()));
        assert_eq!(carried.current_step, Some(DeploymentStep::CommitmentGenerated));
        assert!(carried.assets.is_some());
        assert!(carried.commitment.is_some());
        assert!(matches!(carried.pending_deployment, Some(Some(_))));

        carried.overlay(&ProgressPatch::deployment(deployment()));
        assert_eq!(carried.current_step, Some(DeploymentStep::ContractDeployed));
        assert_eq!(carried.pending_deployment, Some(None));

        let mut progress = DeploymentProgress::default();
        progress.apply(&carried);
        assert!(progress.check_order().is_ok());
        assert!(progress.backs(progress.current_step));
    }

    #[test]
    fn test_apply_never_regresses_current_step() {
        let mut progress = DeploymentProgress::default();
        progress.apply(&ProgressPatch::commitment(commitment()));
        progress.apply(&ProgressPatch {
            current_step: Some(DeploymentStep::AssetsPublished),
            ..Default::default()
        });
        assert_eq!(progress.current_step, DeploymentStep::CommitmentGenerated);
    }

    #[test]
    fn test_apply_tristate_pending() {
        let mut progress = DeploymentProgress::default();
        let pending = PendingDeployment {
            tx_hash: "0x1".into(),
            network: "sepolia".into(),
            submitted_at: Utc::now(),
        };
        progress.apply(&ProgressPatch::pending(pending.clone()));
        assert_eq!(progress.pending_deployment, Some(pending));

        progress.apply(&ProgressPatch::finalize());
        assert!(progress.pending_deployment.is_some(), "absent field leaves pending alone");

        progress.apply(&ProgressPatch::clear_pending());
        assert!(progress.pending_deployment.is_none());
    }

    #[test]
    fn test_normalized_rejects_out_of_order_checkpoints() {
        let progress = DeploymentProgress {
            deployment: Some(deployment()),
            assets: Some(assets()),
            ..Default::default()
        };
        let err = progress.normalized("camp-1").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_normalized_lowers_step_without_data() {
        let progress = DeploymentProgress {
            current_step: DeploymentStep::ContractDeployed,
            assets: Some(assets()),
            ..Default::default()
        };
        let progress = progress.normalized("camp-1").unwrap();
        assert_eq!(progress.current_step, DeploymentStep::AssetsPublished);
    }

    #[test]
    fn test_normalized_raises_step_to_checkpoints() {
        let progress = DeploymentProgress {
            current_step: DeploymentStep::NotStarted,
            assets: Some(assets()),
            commitment: Some(commitment()),
            ..Default::default()
        };
        let progress = progress.normalized("camp-1").unwrap();
        assert_eq!(progress.current_step, DeploymentStep::CommitmentGenerated);
    }

    #[test]
    fn test_normalized_keeps_complete_with_deployment() {
        let progress = DeploymentProgress {
            current_step: DeploymentStep::Complete,
            assets: Some(assets()),
            commitment: Some(commitment()),
            deployment: Some(deployment()),
            ..Default::default()
        };
        let progress = progress.normalized("camp-1").unwrap();
        assert!(progress.is_complete());
    }

    #[test]
    fn test_serializes_with_document_field_names() {
        let mut progress = DeploymentProgress::default();
        progress.apply(&ProgressPatch::assets(assets()));
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["currentStep"], "assetsPublished");
        assert_eq!(json["assets"]["baseURI"], "ipfs://X/");
        assert!(json["assets"]["imageRef"].is_string());
        assert!(json.get("commitment").is_none());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let cleared: ProgressPatch =
            serde_json::from_str(r#"{"pendingDeployment": null}"#).unwrap();
        assert_eq!(cleared.pending_deployment, Some(None));

        let untouched: ProgressPatch =
            serde_json::from_str(r#"{"currentStep": "complete"}"#).unwrap();
        assert_eq!(untouched.pending_deployment, None);
        assert_eq!(untouched.current_step, Some(DeploymentStep::Complete));
    }

    #[test]
    fn test_clear_pending_serializes_as_null() {
        let json = serde_json::to_value(ProgressPatch::clear_pending()).unwrap();
        assert!(json["pendingDeployment"].is_null());
        assert!(json.as_object().unwrap().contains_key("pendingDeployment"));
    }
}
