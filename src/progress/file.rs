use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use super::store::merge_into;
use super::{CampaignRecord, CampaignSource, DeploymentProgress, ProgressPatch, ProgressStore};
use crate::errors::StoreError;

/// Campaign documents stored as one JSON file per campaign.
///
/// Layout: `<dir>/<campaign_id>.json`, with a sibling `<campaign_id>.lock`
/// held exclusively for the duration of each merge so that writers in
/// other processes serialize on the same campaign. Blocking file I/O runs on
/// tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a campaign document, replacing any existing one.
    pub async fn put_campaign(&self, record: CampaignRecord) -> Result<(), StoreError> {
        let path = self.document_path(&record.id)?;
        let dir = self.dir.clone();
        Self::blocking(move || {
            fs::create_dir_all(&dir)?;
            write_atomic(&path, &record)
        })
        .await
    }

    fn document_path(&self, campaign_id: &str) -> Result<PathBuf, StoreError> {
        validate_id(campaign_id)?;
        Ok(self.dir.join(format!("{campaign_id}.json")))
    }

    fn lock_path(&self, campaign_id: &str) -> Result<PathBuf, StoreError> {
        validate_id(campaign_id)?;
        Ok(self.dir.join(format!("{campaign_id}.lock")))
    }

    async fn blocking<F, R>(f: F) -> Result<R, StoreError>
    where
        F: FnOnce() -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| StoreError::Backend(format!("store task panicked: {e}")))?
    }
}

fn validate_id(campaign_id: &str) -> Result<(), StoreError> {
    let valid = !campaign_id.is_empty()
        && campaign_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::Backend(format!(
            "invalid campaign id '{campaign_id}': only [A-Za-z0-9_-] allowed"
        )))
    }
}

fn read_document(path: &Path, campaign_id: &str) -> Result<CampaignRecord, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
            campaign_id: campaign_id.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

fn write_atomic(path: &Path, record: &CampaignRecord) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(record)?;
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl CampaignSource for FileStore {
    async fn campaign(&self, campaign_id: &str) -> Result<CampaignRecord, StoreError> {
        let path = self.document_path(campaign_id)?;
        let id = campaign_id.to_string();
        Self::blocking(move || read_document(&path, &id)).await
    }
}

#[async_trait]
impl ProgressStore for FileStore {
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
        let path = self.document_path(campaign_id)?;
        let lock_path = self.lock_path(campaign_id)?;
        let id = campaign_id.to_string();
        let patch = patch.clone();

        Self::blocking(move || {
            let lock = fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            lock.lock_exclusive()?;

            let result = (|| -> Result<u64, StoreError> {
                let mut record = read_document(&path, &id)?;
                let merged = merge_into(
                    &id,
                    record.deployment_progress.take(),
                    &patch,
                    expected_revision,
                )?;
                let revision = merged.revision;
                record.deployment_progress = Some(merged);
                write_atomic(&path, &record)?;
                Ok(revision)
            })();

            if let Err(e) = FileExt::unlock(&lock) {
                tracing::warn!(campaign_id = %id, error = %e, "failed to release store lock");
            }
            result
        })
        .await
    }
}
