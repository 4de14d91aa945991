use serde::Serialize;
use tokio::sync::broadcast;

use crate::progress::DeploymentStep;
use crate::steps::Step;

/// Non-fatal problems collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunWarning {
    /// A checkpoint write failed; the result is only held in memory.
    Persistence { step: Step, message: String },
    Verification { message: String },
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunWarning::Persistence { step, message } => {
                write!(f, "checkpoint for {step} not persisted: {message}")
            }
            RunWarning::Verification { message } => write!(f, "verification failed: {message}"),
        }
    }
}

/// Step-level progress published on the orchestrator's broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum RunEvent {
    StepStarted {
        campaign_id: String,
        step: Step,
    },
    StepSkipped {
        campaign_id: String,
        step: Step,
    },
    StepCompleted {
        campaign_id: String,
        step: Step,
        detail: Option<String>,
    },
    Warning {
        campaign_id: String,
        warning: RunWarning,
    },
    Finished {
        campaign_id: String,
        success: bool,
        current_step: DeploymentStep,
    },
}

impl RunEvent {
    pub fn campaign_id(&self) -> &str {
        match self {
            RunEvent::StepStarted { campaign_id, .. }
            | RunEvent::StepSkipped { campaign_id, .. }
            | RunEvent::StepCompleted { campaign_id, .. }
            | RunEvent::Warning { campaign_id, .. }
            | RunEvent::Finished { campaign_id, .. } => campaign_id,
        }
    }
}

/// Send without caring whether anyone is listening.
pub(crate) fn publish(tx: &broadcast::Sender<RunEvent>, event: RunEvent) {
    let _ = tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = RunEvent::StepCompleted {
            campaign_id: "camp-1".into(),
            step: Step::Assets,
            detail: Some("ipfs://X/".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StepCompleted");
        assert_eq!(json["data"]["step"], "assets");
        assert_eq!(json["data"]["campaign_id"], "camp-1");
    }

    #[test]
    fn test_warning_display() {
        let warning = RunWarning::Persistence {
            step: Step::Commitment,
            message: "disk full".into(),
        };
        assert_eq!(
            warning.to_string(),
            "checkpoint for commitment not persisted: disk full"
        );
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let (tx, _) = broadcast::channel(4);
        publish(
            &tx,
            RunEvent::StepSkipped {
                campaign_id: "camp-1".into(),
                step: Step::Finalize,
            },
        );
    }
}
