//! Step executors for the deployment pipeline.
//!
//! | Module       | Step          | Collaborator seam                         |
//! |--------------|---------------|-------------------------------------------|
//! | `assets`     | Assets        | `AssetUploader` (content-addressed store) |
//! | `commitment` | Commitment    | `CommitmentService` (remote or Merkle)    |
//! | `deploy`     | Deployment    | `SigningProvider` (wallet + chain RPC)    |
//! | `verify`     | Verification  | `ContractVerifier` (explorer service)     |
//!
//! Executors share no mutable state; everything a later step needs from an
//! earlier one is passed in explicitly from the checkpoints.

pub mod assets;
pub mod commitment;
pub mod deploy;
pub mod merkle;
pub mod verify;

pub use assets::{AssetPublisher, AssetUploader, HttpAssetUploader, PublishedAssets, UploadRequest};
pub use commitment::{
    CommitmentService, GeneratedCommitment, HttpCommitmentService, MerkleCommitmentService,
};
pub use deploy::{
    ConstructorArgs, ContractDeployer, DeployedContract, DeploymentPolicy, JsonRpcSigningProvider,
    NetworkTarget, SigningProvider, TxReceipt,
};
pub use verify::{ContractVerifier, HttpContractVerifier, VerificationOutcome, VerificationRequest};

use serde::{Deserialize, Serialize};

use crate::progress::DeploymentStep;

/// The orchestrator's fixed step order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Assets,
    Commitment,
    Deployment,
    Verification,
    Finalize,
}

impl Step {
    pub const ORDER: [Step; 5] = [
        Step::Assets,
        Step::Commitment,
        Step::Deployment,
        Step::Verification,
        Step::Finalize,
    ];

    /// The progress state reached when this step checkpoints, if it moves `currentStep`.
    pub fn reaches(self) -> Option<DeploymentStep> {
        match self {
            Step::Assets => Some(DeploymentStep::AssetsPublished),
            Step::Commitment => Some(DeploymentStep::CommitmentGenerated),
            Step::Deployment => Some(DeploymentStep::ContractDeployed),
            Step::Verification => None,
            Step::Finalize => Some(DeploymentStep::Complete),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Assets => "Publish assets",
            Step::Commitment => "Generate allowlist commitment",
            Step::Deployment => "Deploy contract",
            Step::Verification => "Verify source",
            Step::Finalize => "Finalize",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Assets => write!(f, "assets"),
            Step::Commitment => write!(f, "commitment"),
            Step::Deployment => write!(f, "deployment"),
            Step::Verification => write!(f, "verification"),
            Step::Finalize => write!(f, "finalize"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_fixed() {
        assert_eq!(
            Step::ORDER.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            vec!["assets", "commitment", "deployment", "verification", "finalize"]
        );
        assert!(Step::ORDER.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_verification_does_not_move_current_step() {
        assert_eq!(Step::Verification.reaches(), None);
        assert_eq!(Step::Finalize.reaches(), Some(DeploymentStep::Complete));
    }
}
