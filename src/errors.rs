//! Typed error hierarchy for the deployment orchestrator.
//!
//! Four top-level enums cover the four subsystems:
//! - `StepError`: a single step executor failed
//! - `ProviderError`: the wallet/signing provider returned an error
//! - `StoreError`: the progress store could not load or merge a record
//! - `RunError`: why an orchestrator run stopped

use std::fmt;

use crate::steps::Step;

/// Failure categories surfaced to the caller alongside the failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing image, empty allowlist, wallet not installed.
    Precondition,
    /// Signature or transaction rejected by the user.
    UserAction,
    /// Wrong chain and the switch was declined or unsupported.
    NetworkMismatch,
    /// Non-2xx or malformed answer from an external service.
    ExternalService,
    /// Broadcast succeeded but mining or confirmation failed.
    Transaction,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Precondition => write!(f, "PreconditionError"),
            ErrorCategory::UserAction => write!(f, "UserActionError"),
            ErrorCategory::NetworkMismatch => write!(f, "NetworkMismatchError"),
            ErrorCategory::ExternalService => write!(f, "ExternalServiceError"),
            ErrorCategory::Transaction => write!(f, "TransactionError"),
        }
    }
}

/// Errors from a single step executor.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("No image available: campaign has neither an image file nor an image URL")]
    AssetMissing,

    #[error("Failed to read image file at {path}: {source}")]
    ImageRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch image from {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    #[error("Upload failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
    Upload { status: Option<u16>, message: String },

    #[error("Allowlist for campaign {campaign_id} is empty")]
    EmptyAllowlist { campaign_id: String },

    #[error("Commitment generation failed: {0}")]
    Generation(String),

    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    #[error("Wallet is on chain {actual}, expected chain {expected}: {reason}")]
    WrongNetwork {
        expected: u64,
        actual: u64,
        reason: String,
    },

    #[error("Rejected by user: {0}")]
    UserRejected(String),

    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed {
        tx_hash: Option<String>,
        reason: String,
    },

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StepError {
    /// Classify this error into one of the caller-facing categories.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StepError::AssetMissing
            | StepError::ImageRead { .. }
            | StepError::EmptyAllowlist { .. }
            | StepError::WalletUnavailable(_) => ErrorCategory::Precondition,
            StepError::UserRejected(_) => ErrorCategory::UserAction,
            StepError::WrongNetwork { .. } => ErrorCategory::NetworkMismatch,
            StepError::TransactionReverted { .. } | StepError::TransactionFailed { .. } => {
                ErrorCategory::Transaction
            }
            StepError::AssetFetch { .. }
            | StepError::Upload { .. }
            | StepError::Generation(_)
            | StepError::Verification(_)
            | StepError::Http(_) => ErrorCategory::ExternalService,
        }
    }
}

/// Errors returned by a `SigningProvider`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// EIP-1193: the user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// EIP-1193: the requested method is not supported.
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// EIP-3326: the chain has not been added to the wallet.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// JSON-RPC: method not found.
    pub const METHOD_NOT_FOUND: i64 = -32601;

    pub fn code(&self) -> Option<i64> {
        match self {
            ProviderError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(Self::USER_REJECTED)
    }
}

/// Errors from the progress store and campaign source.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Campaign {campaign_id} not found")]
    NotFound { campaign_id: String },

    #[error(
        "Revision conflict for campaign {campaign_id}: expected {expected}, found {found}"
    )]
    RevisionConflict {
        campaign_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Progress record for campaign {campaign_id} is inconsistent: {reason}")]
    Corrupt { campaign_id: String, reason: String },

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Why an orchestrator run stopped without reaching `Complete`.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("A deployment run is already in progress for campaign {campaign_id}")]
    AlreadyRunning { campaign_id: String },

    #[error("Failed to load campaign {campaign_id}: {source}")]
    Load {
        campaign_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Progress record for campaign {campaign_id} was modified concurrently during {step}")]
    ConcurrentModification { campaign_id: String, step: Step },

    #[error("Campaign {campaign_id} has no deployed contract to verify")]
    NotDeployed { campaign_id: String },

    #[error("{step} failed ({}): {source}", .source.category())]
    Step {
        step: Step,
        #[source]
        source: StepError,
    },
}

impl RunError {
    /// The step that failed, if the run stopped inside a step.
    pub fn step(&self) -> Option<Step> {
        match self {
            RunError::Step { step, .. } | RunError::ConcurrentModification { step, .. } => {
                Some(*step)
            }
            _ => None,
        }
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            RunError::Step { source, .. } => Some(source.category()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_categories_follow_taxonomy() {
        assert_eq!(StepError::AssetMissing.category(), ErrorCategory::Precondition);
        assert_eq!(
            StepError::EmptyAllowlist {
                campaign_id: "c".into()
            }
            .category(),
            ErrorCategory::Precondition
        );
        assert_eq!(
            StepError::UserRejected("denied".into()).category(),
            ErrorCategory::UserAction
        );
        assert_eq!(
            StepError::WrongNetwork {
                expected: 1,
                actual: 5,
                reason: "switch declined".into()
            }
            .category(),
            ErrorCategory::NetworkMismatch
        );
        assert_eq!(
            StepError::Upload {
                status: Some(502),
                message: "bad gateway".into()
            }
            .category(),
            ErrorCategory::ExternalService
        );
        assert_eq!(
            StepError::TransactionReverted {
                tx_hash: "0xabc".into()
            }
            .category(),
            ErrorCategory::Transaction
        );
    }

    #[test]
    fn upload_error_message_includes_status() {
        let err = StepError::Upload {
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Upload failed with status 500: boom");

        let err = StepError::Upload {
            status: None,
            message: "rejected".into(),
        };
        assert_eq!(err.to_string(), "Upload failed: rejected");
    }

    #[test]
    fn provider_error_detects_user_rejection() {
        let err = ProviderError::Rpc {
            code: ProviderError::USER_REJECTED,
            message: "User denied".into(),
        };
        assert!(err.is_user_rejection());
        assert!(!ProviderError::Unavailable("no wallet".into()).is_user_rejection());
    }

    #[test]
    fn run_error_step_carries_step_and_category() {
        let err = RunError::Step {
            step: Step::Deployment,
            source: StepError::UserRejected("denied".into()),
        };
        assert_eq!(err.step(), Some(Step::Deployment));
        assert_eq!(err.category(), Some(ErrorCategory::UserAction));
        let msg = err.to_string();
        assert!(msg.contains("deployment"));
        assert!(msg.contains("UserActionError"));
    }

    #[test]
    fn run_error_already_running_has_no_step() {
        let err = RunError::AlreadyRunning {
            campaign_id: "camp-1".into(),
        };
        assert!(err.step().is_none());
        assert!(err.to_string().contains("camp-1"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&StepError::AssetMissing);
        assert_std_error(&ProviderError::Unavailable("x".into()));
        assert_std_error(&StoreError::Backend("x".into()));
        assert_std_error(&RunError::NotDeployed {
            campaign_id: "x".into(),
        });
    }
}
