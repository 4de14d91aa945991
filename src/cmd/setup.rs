//! Builds stores and the orchestrator from the resolved configuration.

use anyhow::{Context, Result};
use std::sync::Arc;

use launchpad::config::{CommitmentMode, LaunchConfig, StoreBackend};
use launchpad::orchestrator::Orchestrator;
use launchpad::progress::{CampaignSource, FileStore, HttpStore, ProgressStore};
use launchpad::steps::{
    AssetPublisher, CommitmentService, ContractDeployer, HttpAssetUploader, HttpCommitmentService,
    HttpContractVerifier, JsonRpcSigningProvider, MerkleCommitmentService,
};

pub struct Stores {
    pub progress: Arc<dyn ProgressStore>,
    pub campaigns: Arc<dyn CampaignSource>,
}

pub fn open_stores(config: &LaunchConfig) -> Result<Stores> {
    match config.toml.store.backend {
        StoreBackend::File => {
            let store = Arc::new(FileStore::new(config.store_dir()));
            tracing::debug!(dir = %store.dir().display(), "using file progress store");
            Ok(Stores {
                progress: store.clone(),
                campaigns: store,
            })
        }
        StoreBackend::Http => {
            let url = config
                .toml
                .store
                .url
                .as_deref()
                .context("store.url (or LAUNCHPAD_STORE_URL) is required for the http backend")?;
            let store = Arc::new(
                HttpStore::new(url, config.http_timeout())
                    .context("Failed to create HTTP store client")?,
            );
            tracing::debug!(url, "using http progress store");
            Ok(Stores {
                progress: store.clone(),
                campaigns: store,
            })
        }
    }
}

/// Contract bytecode is only needed to broadcast; commands that never deploy
/// pass `require_bytecode = false`.
pub fn build_orchestrator(config: &LaunchConfig, require_bytecode: bool) -> Result<Orchestrator> {
    let stores = open_stores(config)?;
    let timeout = config.http_timeout();

    let uploader = HttpAssetUploader::new(&config.toml.storage.upload_url, timeout)
        .context("Failed to create upload client")?;

    let commitments: Arc<dyn CommitmentService> = match config.toml.commitment.mode {
        CommitmentMode::Local => Arc::new(MerkleCommitmentService::new(stores.campaigns.clone())),
        CommitmentMode::Remote => {
            let url = config
                .toml
                .commitment
                .url
                .as_deref()
                .context("commitment.url is required when commitment.mode = \"remote\"")?;
            Arc::new(
                HttpCommitmentService::new(url, timeout)
                    .context("Failed to create commitment client")?,
            )
        }
    };

    let bytecode_path = config.bytecode_path();
    let bytecode = match std::fs::read_to_string(&bytecode_path) {
        Ok(text) => JsonRpcSigningProvider::parse_bytecode(&text)
            .with_context(|| format!("Invalid bytecode in {}", bytecode_path.display()))?,
        Err(e) if !require_bytecode => {
            tracing::debug!(path = %bytecode_path.display(), error = %e, "bytecode not loaded");
            Vec::new()
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Failed to read contract bytecode: {}",
                    bytecode_path.display()
                )
            });
        }
    };
    let provider = JsonRpcSigningProvider::new(&config.toml.network.rpc_url, bytecode, timeout)
        .context("Failed to create JSON-RPC provider")?;
    let deployer = ContractDeployer::new(
        Arc::new(provider),
        config.network_target(),
        config.deployment_policy(),
    );

    let mut orchestrator = Orchestrator::new(
        stores.progress,
        stores.campaigns,
        AssetPublisher::new(Arc::new(uploader), timeout)
            .context("Failed to create image fetch client")?,
        commitments,
        deployer,
    );
    if config.toml.verification.enabled {
        let verifier = HttpContractVerifier::new(&config.toml.verification.url, timeout)
            .context("Failed to create verification client")?;
        orchestrator = orchestrator.with_verifier(Arc::new(verifier));
    }
    Ok(orchestrator)
}
