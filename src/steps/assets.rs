use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::errors::StepError;
use crate::progress::CampaignRecord;

/// Image bytes ready for upload.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    fn new(file_name: String, bytes: Vec<u8>) -> Self {
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub campaign_id: String,
    pub image: ImagePayload,
    pub name: String,
    pub description: String,
    pub max_supply: u64,
}

/// References returned by the content-addressed store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAssets {
    pub image_ref: String,
    pub metadata_ref: String,
    pub base_uri: String,
}

/// Upload seam for the storage provider. Real implementation:
/// `HttpAssetUploader`.
#[async_trait]
pub trait AssetUploader: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<PublishedAssets, StepError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    image_ref: Option<String>,
    #[serde(default)]
    metadata_ref: Option<String>,
    #[serde(default, rename = "baseURI")]
    base_uri: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Multipart upload to the portal's storage endpoint.
#[derive(Debug, Clone)]
pub struct HttpAssetUploader {
    client: Client,
    url: String,
}

impl HttpAssetUploader {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StepError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AssetUploader for HttpAssetUploader {
    async fn upload(&self, request: UploadRequest) -> Result<PublishedAssets, StepError> {
        let image = Part::bytes(request.image.bytes)
            .file_name(request.image.file_name)
            .mime_str(&request.image.content_type)?;
        let form = Form::new()
            .part("image", image)
            .text("name", request.name)
            .text("description", request.description)
            .text("maxSupply", request.max_supply.to_string())
            .text("campaignId", request.campaign_id);

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StepError::Upload {
                status: Some(status.as_u16()),
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
            });
        }

        let body: UploadResponse = response.json().await?;
        if !body.success {
            return Err(StepError::Upload {
                status: None,
                message: body.error.unwrap_or_else(|| "upload rejected".to_string()),
            });
        }
        match (body.image_ref, body.metadata_ref, body.base_uri) {
            (Some(image_ref), Some(metadata_ref), Some(base_uri)) => Ok(PublishedAssets {
                image_ref,
                metadata_ref,
                base_uri,
            }),
            _ => Err(StepError::Upload {
                status: None,
                message: "response is missing imageRef, metadataRef or baseURI".to_string(),
            }),
        }
    }
}

/// Asset Publication: resolve the campaign image and upload it together with
/// the collection metadata.
pub struct AssetPublisher {
    uploader: Arc<dyn AssetUploader>,
    client: Client,
}

impl AssetPublisher {
    /// `timeout` bounds the remote image fetch.
    pub fn new(uploader: Arc<dyn AssetUploader>, timeout: Duration) -> Result<Self, StepError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { uploader, client })
    }

    pub async fn publish(&self, campaign: &CampaignRecord) -> Result<PublishedAssets, StepError> {
        let image = self.resolve_image(campaign).await?;
        tracing::debug!(
            campaign_id = %campaign.id,
            file_name = %image.file_name,
            bytes = image.bytes.len(),
            "uploading campaign image"
        );
        self.uploader
            .upload(UploadRequest {
                campaign_id: campaign.id.clone(),
                image,
                name: campaign.name.clone(),
                description: campaign.description.clone(),
                max_supply: campaign.max_supply,
            })
            .await
    }

    /// Local file first, then the remote URL. A configured path that does
    /// not exist falls through to the URL.
    async fn resolve_image(&self, campaign: &CampaignRecord) -> Result<ImagePayload, StepError> {
        if let Some(path) = &campaign.image_path {
            match tokio::fs::read(path).await {
                Ok(bytes) if !bytes.is_empty() => {
                    return Ok(ImagePayload::new(file_name_of(path), bytes));
                }
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "campaign image file is empty");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %path.display(), "campaign image file not found");
                }
                Err(source) => {
                    return Err(StepError::ImageRead {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }

        let Some(url) = campaign.image_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Err(StepError::AssetMissing);
        };
        self.fetch_remote(url).await
    }

    async fn fetch_remote(&self, url: &str) -> Result<ImagePayload, StepError> {
        let fetch_err = |reason: String| StepError::AssetFetch {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_err(format!("status {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if bytes.is_empty() {
            return Err(StepError::AssetMissing);
        }
        Ok(ImagePayload::new(file_name_from_url(url), bytes.to_vec()))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn file_name_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && segment.contains('.'))
        .unwrap_or("image")
        .to_string()
}
