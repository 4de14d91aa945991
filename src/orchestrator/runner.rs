use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use super::events::{RunEvent, RunWarning, publish};
use super::guard::RunGuard;
use crate::errors::{RunError, StepError, StoreError};
use crate::progress::{
    AssetsCheckpoint, CampaignRecord, CampaignSource, CommitmentCheckpoint, DeploymentCheckpoint,
    DeploymentProgress, DeploymentStep, PendingDeployment, ProgressPatch, ProgressStore,
};
use crate::steps::{
    AssetPublisher, CommitmentService, ConstructorArgs, ContractDeployer, ContractVerifier, Step,
    VerificationOutcome, VerificationRequest,
};

const EVENT_CAPACITY: usize = 64;

/// The successful terminal result of [`Orchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub campaign_id: String,
    pub current_step: DeploymentStep,
    pub image_ref: String,
    pub metadata_ref: String,
    #[serde(rename = "baseURI")]
    pub base_uri: String,
    pub commitment_root: String,
    pub member_count: u64,
    pub contract_address: String,
    pub tx_hash: String,
    pub network: String,
    pub verified: Option<bool>,
    pub explorer_url: Option<String>,
    pub executed: Vec<Step>,
    pub skipped: Vec<Step>,
    pub warnings: Vec<RunWarning>,
}

/// The failed terminal result of [`Orchestrator::run`].
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RunFailure {
    pub error: RunError,
    /// `currentStep` as it stood when the run stopped.
    pub last_completed_step: DeploymentStep,
    pub warnings: Vec<RunWarning>,
}

/// Book-keeping for one invocation of `run`.
struct RunState {
    campaign_id: String,
    progress: DeploymentProgress,
    /// Revision expected by the next checkpoint write. `None` writes
    /// unconditionally.
    revision: Option<u64>,
    /// Checkpoints whose write failed; folded into every later write until
    /// one lands.
    unsaved: ProgressPatch,
    executed: Vec<Step>,
    skipped: Vec<Step>,
    warnings: Vec<RunWarning>,
    events: broadcast::Sender<RunEvent>,
}

impl RunState {
    fn new(
        campaign_id: &str,
        progress: DeploymentProgress,
        events: broadcast::Sender<RunEvent>,
    ) -> Self {
        Self {
            campaign_id: campaign_id.to_string(),
            revision: Some(progress.revision),
            unsaved: ProgressPatch::default(),
            progress,
            executed: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            events,
        }
    }

    fn started(&self, step: Step) {
        tracing::info!(campaign_id = %self.campaign_id, %step, "step started");
        publish(
            &self.events,
            RunEvent::StepStarted {
                campaign_id: self.campaign_id.clone(),
                step,
            },
        );
    }

    fn skipped(&mut self, step: Step) {
        tracing::debug!(campaign_id = %self.campaign_id, %step, "step already checkpointed");
        self.skipped.push(step);
        publish(
            &self.events,
            RunEvent::StepSkipped {
                campaign_id: self.campaign_id.clone(),
                step,
            },
        );
    }

    fn completed(&mut self, step: Step, detail: Option<String>) {
        tracing::info!(campaign_id = %self.campaign_id, %step, "step completed");
        self.executed.push(step);
        publish(
            &self.events,
            RunEvent::StepCompleted {
                campaign_id: self.campaign_id.clone(),
                step,
                detail,
            },
        );
    }

    fn warn(&mut self, warning: RunWarning) {
        tracing::warn!(campaign_id = %self.campaign_id, %warning, "run warning");
        self.warnings.push(warning.clone());
        publish(
            &self.events,
            RunEvent::Warning {
                campaign_id: self.campaign_id.clone(),
                warning,
            },
        );
    }

    fn finished(&self, success: bool) {
        publish(
            &self.events,
            RunEvent::Finished {
                campaign_id: self.campaign_id.clone(),
                success,
                current_step: self.progress.current_step,
            },
        );
    }

    fn fail(self, error: RunError) -> RunFailure {
        tracing::error!(
            campaign_id = %self.campaign_id,
            step = ?error.step(),
            error = %error,
            "deployment run failed"
        );
        self.finished(false);
        RunFailure {
            error,
            last_completed_step: self.progress.current_step,
            warnings: self.warnings,
        }
    }
}

fn step_error(step: Step) -> impl Fn(StepError) -> RunError {
    move |source| RunError::Step { step, source }
}

fn constructor_args(
    campaign: &CampaignRecord,
    assets: &AssetsCheckpoint,
    commitment: &CommitmentCheckpoint,
) -> ConstructorArgs {
    ConstructorArgs {
        name: campaign.name.clone(),
        symbol: campaign.token_symbol(),
        max_supply: campaign.max_supply,
        base_uri: assets.base_uri.clone(),
        commitment_root: commitment.root.clone(),
    }
}

/// Resumable deployment state machine.
///
/// Each call to [`run`](Self::run) loads the campaign's progress record,
/// skips every step whose checkpoint is present, executes the rest in the
/// fixed order, and writes a checkpoint after each one. Any number of calls,
/// interleaved with failures, converge on the same `complete` record and
/// perform each side effect at most once.
pub struct Orchestrator {
    store: Arc<dyn ProgressStore>,
    campaigns: Arc<dyn CampaignSource>,
    publisher: AssetPublisher,
    commitments: Arc<dyn CommitmentService>,
    deployer: ContractDeployer,
    verifier: Option<Arc<dyn ContractVerifier>>,
    guard: RunGuard,
    events: broadcast::Sender<RunEvent>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        campaigns: Arc<dyn CampaignSource>,
        publisher: AssetPublisher,
        commitments: Arc<dyn CommitmentService>,
        deployer: ContractDeployer,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            campaigns,
            publisher,
            commitments,
            deployer,
            verifier: None,
            guard: RunGuard::new(),
            events,
        }
    }

    /// Enable the best-effort Verification step.
    pub fn with_verifier(mut self, verifier: Arc<dyn ContractVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Share a guard with other orchestrators in this process.
    pub fn with_guard(mut self, guard: RunGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Current progress record, for display.
    pub async fn progress(&self, campaign_id: &str) -> Result<DeploymentProgress, RunError> {
        self.store
            .load(campaign_id)
            .await
            .map_err(|source| RunError::Load {
                campaign_id: campaign_id.to_string(),
                source,
            })
    }

    /// Drive `campaign_id` to `complete`, resuming from its last checkpoint.
    pub async fn run(&self, campaign_id: &str) -> Result<RunSummary, RunFailure> {
        let _permit = match self.guard.try_acquire(campaign_id) {
            Ok(permit) => permit,
            Err(error) => {
                tracing::warn!(campaign_id, "run rejected, another run is in flight");
                let last_completed_step = self
                    .store
                    .load(campaign_id)
                    .await
                    .map(|p| p.current_step)
                    .unwrap_or_default();
                return Err(RunFailure {
                    error,
                    last_completed_step,
                    warnings: Vec::new(),
                });
            }
        };

        let progress = match self.progress(campaign_id).await {
            Ok(progress) => progress,
            Err(error) => {
                return Err(RunFailure {
                    error,
                    last_completed_step: DeploymentStep::NotStarted,
                    warnings: Vec::new(),
                });
            }
        };

        tracing::info!(
            campaign_id,
            current_step = %progress.current_step,
            revision = progress.revision,
            "starting deployment run"
        );

        let mut state = RunState::new(campaign_id, progress, self.events.clone());
        match self.drive(&mut state).await {
            Ok(summary) => {
                state.finished(true);
                tracing::info!(
                    campaign_id,
                    contract_address = %summary.contract_address,
                    executed = summary.executed.len(),
                    warnings = summary.warnings.len(),
                    "deployment run complete"
                );
                Ok(summary)
            }
            Err(error) => Err(state.fail(error)),
        }
    }

    async fn drive(&self, state: &mut RunState) -> Result<RunSummary, RunError> {
        let campaign = if state.progress.is_complete() {
            None
        } else {
            Some(self.load_campaign(&state.campaign_id).await?)
        };

        let assets = match state.progress.assets.clone() {
            Some(checkpoint) => {
                state.skipped(Step::Assets);
                checkpoint
            }
            None => self.publish_assets(state, campaign.as_ref()).await?,
        };

        let commitment = match state.progress.commitment.clone() {
            Some(checkpoint) => {
                state.skipped(Step::Commitment);
                checkpoint
            }
            None => self.generate_commitment(state).await?,
        };

        let mut deployment = match state.progress.deployment.clone() {
            Some(checkpoint) => {
                state.skipped(Step::Deployment);
                checkpoint
            }
            None => {
                let campaign = campaign.as_ref().ok_or_else(|| missing_campaign(state))?;
                let args = constructor_args(campaign, &assets, &commitment);
                self.deploy_contract(state, campaign, &args).await?
            }
        };

        match (&campaign, &self.verifier) {
            (Some(campaign), Some(verifier))
                if !state.progress.is_complete() && deployment.verified != Some(true) =>
            {
                state.started(Step::Verification);
                let args = constructor_args(campaign, &assets, &commitment);
                match self.verify(verifier.as_ref(), &deployment, args).await {
                    Ok(outcome) => {
                        deployment.verified = Some(outcome.verified);
                        deployment.verified_at = Some(Utc::now());
                        deployment.explorer_url = outcome.explorer_url;
                        state.completed(Step::Verification, deployment.explorer_url.clone());
                    }
                    Err(e) => {
                        deployment.verified = Some(false);
                        state.warn(RunWarning::Verification {
                            message: e.to_string(),
                        });
                    }
                }
                self.record(
                    state,
                    Step::Verification,
                    ProgressPatch::verification(deployment.clone()),
                )
                .await;
            }
            _ => state.skipped(Step::Verification),
        }

        if state.progress.is_complete() {
            state.skipped(Step::Finalize);
        } else {
            state.started(Step::Finalize);
            self.checkpoint(state, Step::Finalize, ProgressPatch::finalize())
                .await?;
            state.completed(Step::Finalize, None);
        }

        Ok(RunSummary {
            campaign_id: state.campaign_id.clone(),
            current_step: state.progress.current_step,
            image_ref: assets.image_ref,
            metadata_ref: assets.metadata_ref,
            base_uri: assets.base_uri,
            commitment_root: commitment.root,
            member_count: commitment.member_count,
            contract_address: deployment.contract_address,
            tx_hash: deployment.tx_hash,
            network: deployment.network,
            verified: deployment.verified,
            explorer_url: deployment.explorer_url,
            executed: std::mem::take(&mut state.executed),
            skipped: std::mem::take(&mut state.skipped),
            warnings: std::mem::take(&mut state.warnings),
        })
    }

    async fn publish_assets(
        &self,
        state: &mut RunState,
        campaign: Option<&CampaignRecord>,
    ) -> Result<AssetsCheckpoint, RunError> {
        let campaign = campaign.ok_or_else(|| missing_campaign(state))?;
        state.started(Step::Assets);
        let published = self
            .publisher
            .publish(campaign)
            .await
            .map_err(step_error(Step::Assets))?;

        let checkpoint = AssetsCheckpoint {
            image_ref: published.image_ref,
            metadata_ref: published.metadata_ref,
            base_uri: published.base_uri,
            completed_at: Utc::now(),
        };
        self.checkpoint(state, Step::Assets, ProgressPatch::assets(checkpoint.clone()))
            .await?;
        state.completed(Step::Assets, Some(checkpoint.base_uri.clone()));
        Ok(checkpoint)
    }

    async fn generate_commitment(
        &self,
        state: &mut RunState,
    ) -> Result<CommitmentCheckpoint, RunError> {
        state.started(Step::Commitment);
        let generated = self
            .commitments
            .generate(&state.campaign_id)
            .await
            .map_err(step_error(Step::Commitment))?;

        let checkpoint = CommitmentCheckpoint {
            root: generated.root,
            member_count: generated.member_count,
            completed_at: Utc::now(),
        };
        self.checkpoint(
            state,
            Step::Commitment,
            ProgressPatch::commitment(checkpoint.clone()),
        )
        .await?;
        state.completed(
            Step::Commitment,
            Some(format!("{} members", checkpoint.member_count)),
        );
        Ok(checkpoint)
    }

    async fn deploy_contract(
        &self,
        state: &mut RunState,
        campaign: &CampaignRecord,
        args: &ConstructorArgs,
    ) -> Result<DeploymentCheckpoint, RunError> {
        let network = self.deployer.network().name.clone();
        if let Some(requested) = campaign.network.as_deref()
            && requested != network
        {
            tracing::warn!(
                campaign_id = %state.campaign_id,
                requested,
                network = %network,
                "campaign was registered for another network"
            );
        }

        state.started(Step::Deployment);
        let pending = state
            .progress
            .pending_deployment
            .clone()
            .filter(|pending| {
                let same_network = pending.network == network;
                if !same_network {
                    tracing::warn!(
                        tx_hash = %pending.tx_hash,
                        pending_network = %pending.network,
                        "ignoring broadcast journal for another network"
                    );
                }
                same_network
            });

        let tx_hash = match pending {
            Some(pending) => {
                tracing::info!(
                    campaign_id = %state.campaign_id,
                    tx_hash = %pending.tx_hash,
                    "re-attaching to previously broadcast deployment"
                );
                pending.tx_hash
            }
            None => {
                let tx_hash = self
                    .deployer
                    .submit(args)
                    .await
                    .map_err(step_error(Step::Deployment))?;
                let journal = ProgressPatch::pending(PendingDeployment {
                    tx_hash: tx_hash.clone(),
                    network: network.clone(),
                    submitted_at: Utc::now(),
                });
                self.record(state, Step::Deployment, journal).await;
                tx_hash
            }
        };

        let deployed = match self.deployer.await_deployment(&tx_hash).await {
            Ok(deployed) => deployed,
            Err(e) => {
                if matches!(e, StepError::TransactionReverted { .. }) {
                    self.record(state, Step::Deployment, ProgressPatch::clear_pending())
                        .await;
                }
                return Err(RunError::Step {
                    step: Step::Deployment,
                    source: e,
                });
            }
        };

        let checkpoint = DeploymentCheckpoint {
            contract_address: deployed.contract_address,
            tx_hash: deployed.tx_hash,
            network,
            completed_at: Utc::now(),
            verified: None,
            verified_at: None,
            explorer_url: None,
        };
        self.checkpoint_deployment(state, ProgressPatch::deployment(checkpoint.clone()))
            .await?;
        state.completed(Step::Deployment, Some(checkpoint.contract_address.clone()));
        Ok(checkpoint)
    }

    async fn verify(
        &self,
        verifier: &dyn ContractVerifier,
        deployment: &DeploymentCheckpoint,
        constructor_args: ConstructorArgs,
    ) -> Result<VerificationOutcome, StepError> {
        let outcome = verifier
            .verify(&VerificationRequest {
                contract_address: deployment.contract_address.clone(),
                network: deployment.network.clone(),
                constructor_args,
            })
            .await?;
        if outcome.verified {
            Ok(outcome)
        } else {
            Err(StepError::Verification(
                "explorer reported the source as unverified".to_string(),
            ))
        }
    }

    /// Re-run Verification for a deployed campaign. `currentStep` is left
    /// untouched; the outcome is written into the deployment checkpoint.
    pub async fn retry_verification(
        &self,
        campaign_id: &str,
    ) -> Result<VerificationOutcome, RunError> {
        let _permit = self.guard.try_acquire(campaign_id)?;
        let progress = self.progress(campaign_id).await?;
        let (Some(assets), Some(commitment), Some(mut deployment)) = (
            progress.assets.clone(),
            progress.commitment.clone(),
            progress.deployment.clone(),
        ) else {
            return Err(RunError::NotDeployed {
                campaign_id: campaign_id.to_string(),
            });
        };
        let verifier = self.verifier.as_ref().ok_or_else(|| RunError::Step {
            step: Step::Verification,
            source: StepError::Verification("verification is disabled".to_string()),
        })?;
        let campaign = self.load_campaign(campaign_id).await?;

        let mut state = RunState::new(campaign_id, progress, self.events.clone());
        state.started(Step::Verification);
        let args = constructor_args(&campaign, &assets, &commitment);
        let result = self.verify(verifier.as_ref(), &deployment, args).await;
        match &result {
            Ok(outcome) => {
                deployment.verified = Some(true);
                deployment.verified_at = Some(Utc::now());
                deployment.explorer_url = outcome.explorer_url.clone();
                state.completed(Step::Verification, outcome.explorer_url.clone());
            }
            Err(_) => deployment.verified = Some(false),
        }
        self.record(
            &mut state,
            Step::Verification,
            ProgressPatch::verification(deployment),
        )
        .await;
        result.map_err(step_error(Step::Verification))
    }

    async fn load_campaign(&self, campaign_id: &str) -> Result<CampaignRecord, RunError> {
        self.campaigns
            .campaign(campaign_id)
            .await
            .map_err(|source| RunError::Load {
                campaign_id: campaign_id.to_string(),
                source,
            })
    }

    /// Merge `patch` together with everything earlier writes failed to
    /// persist. On failure the combined patch is kept for the next write.
    async fn write(&self, state: &mut RunState, patch: &ProgressPatch) -> Result<(), StoreError> {
        let mut outgoing = std::mem::take(&mut state.unsaved);
        outgoing.overlay(patch);
        match self
            .store
            .merge(&state.campaign_id, &outgoing, state.revision)
            .await
        {
            Ok(revision) => {
                state.revision = Some(revision);
                Ok(())
            }
            Err(e) => {
                state.unsaved = outgoing;
                Err(e)
            }
        }
    }

    /// Write a step checkpoint. A revision conflict aborts the run; any
    /// other failure becomes a persistence warning and the in-memory result
    /// carries on.
    async fn checkpoint(
        &self,
        state: &mut RunState,
        step: Step,
        patch: ProgressPatch,
    ) -> Result<(), RunError> {
        match self.write(state, &patch).await {
            Ok(()) => {}
            Err(StoreError::RevisionConflict {
                expected, found, ..
            }) => {
                tracing::warn!(
                    campaign_id = %state.campaign_id,
                    %step,
                    expected,
                    found,
                    "progress record changed underneath the run"
                );
                return Err(RunError::ConcurrentModification {
                    campaign_id: state.campaign_id.clone(),
                    step,
                });
            }
            Err(e) => state.warn(RunWarning::Persistence {
                step,
                message: e.to_string(),
            }),
        }
        state.progress.apply(&patch);
        Ok(())
    }

    /// Checkpoint for a mined contract. The chain already holds it, so a
    /// revision conflict is overridden with an unconditional write instead
    /// of dropping the address.
    async fn checkpoint_deployment(
        &self,
        state: &mut RunState,
        patch: ProgressPatch,
    ) -> Result<(), RunError> {
        match self.checkpoint(state, Step::Deployment, patch.clone()).await {
            Err(RunError::ConcurrentModification { .. }) => {
                tracing::warn!(
                    campaign_id = %state.campaign_id,
                    "writing mined deployment over a concurrent change"
                );
                state.warn(RunWarning::Persistence {
                    step: Step::Deployment,
                    message: "progress record changed during deployment; checkpoint written unconditionally"
                        .to_string(),
                });
                state.revision = None;
                self.checkpoint(state, Step::Deployment, patch).await
            }
            other => other,
        }
    }

    /// Write that must never abort the run: the broadcast journal and
    /// verification results. After a conflict later writes go unconditional.
    async fn record(&self, state: &mut RunState, step: Step, patch: ProgressPatch) {
        if let Err(e) = self.write(state, &patch).await {
            if matches!(e, StoreError::RevisionConflict { .. }) {
                state.revision = None;
            }
            state.warn(RunWarning::Persistence {
                step,
                message: e.to_string(),
            });
        }
        state.progress.apply(&patch);
    }
}

fn missing_campaign(state: &RunState) -> RunError {
    RunError::Load {
        campaign_id: state.campaign_id.clone(),
        source: StoreError::NotFound {
            campaign_id: state.campaign_id.clone(),
        },
    }
}
