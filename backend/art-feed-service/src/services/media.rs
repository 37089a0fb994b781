/// Image upload from a local file reference to blob storage
use crate::backend::BackendClient;
use crate::error::{ServiceError, ServiceResult};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

/// Result of pushing a local image to blob storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Object written under `key`
    Uploaded { key: String },
    /// Nothing was written
    Failed { reason: String },
}

impl UploadOutcome {
    pub fn key(&self) -> Option<&str> {
        match self {
            UploadOutcome::Uploaded { key } => Some(key.as_str()),
            UploadOutcome::Failed { .. } => None,
        }
    }
}

/// Strip a `file://` scheme so device URIs and plain paths both work
pub fn local_path(reference: &str) -> &Path {
    Path::new(reference.strip_prefix("file://").unwrap_or(reference))
}

/// Content type for an image file, by extension
pub fn content_type_for(path: &Path) -> mime::Mime {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("png") => mime::IMAGE_PNG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("svg") => mime::IMAGE_SVG,
        Some(other) => format!("image/{}", other)
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        None => mime::APPLICATION_OCTET_STREAM,
    }
}

#[derive(Clone)]
pub struct MediaService {
    backend: BackendClient,
}

impl MediaService {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Read a local image and store it under a fresh key.
    ///
    /// Never fails outright: a missing file or a rejected write is reported
    /// as [`UploadOutcome::Failed`].
    pub async fn upload_image(&self, reference: &str) -> UploadOutcome {
        let path = local_path(reference);

        let body = match tokio::fs::read(path).await {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read image for upload");
                return UploadOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let content_type = content_type_for(path);
        let key = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!(
                "{}/{}.{}",
                self.backend.image_prefix(),
                Uuid::new_v4(),
                ext.to_ascii_lowercase()
            ),
            None => format!("{}/{}", self.backend.image_prefix(), Uuid::new_v4()),
        };

        match self
            .backend
            .blobs()
            .upload(&key, body, content_type.as_ref())
            .await
        {
            Ok(()) => {
                debug!(%key, "Image uploaded");
                UploadOutcome::Uploaded { key }
            }
            Err(e) => {
                warn!(%key, error = %e, "Image upload failed");
                UploadOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Resolve the durable download URL for an uploaded object
    pub async fn download_url(&self, key: &str) -> ServiceResult<String> {
        self.backend.blobs().download_url(key).await
    }

    /// Upload then resolve, the sequence every image-carrying write starts with
    pub async fn upload_and_resolve(&self, reference: &str) -> ServiceResult<String> {
        match self.upload_image(reference).await {
            UploadOutcome::Uploaded { key } => self.download_url(&key).await,
            UploadOutcome::Failed { reason } => Err(ServiceError::Storage(reason)),
        }
    }
}
