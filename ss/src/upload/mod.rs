//! Image storage with local fallback
//!
//! [`StorageGateway::store`] always yields an [`ImageRef`]: a remote URL when
//! the configured [`ImageHost`] accepts the upload, otherwise the image
//! itself embedded as a data URL. Upload failures are logged and absorbed
//! here; callers never see them.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

mod imagekit;

pub use imagekit::ImageKitHost;

use crate::config::UploadConfig;
use crate::domain::{ImageRef, RenderedImage};

/// Errors from an image host
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Image host not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upload rejected {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),
}

/// A remote object store for images
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload and return the public URL
    async fn upload(&self, image: &RenderedImage, name: &str) -> Result<String, UploadError>;
}

/// Best-effort upload with a local fallback
#[derive(Clone, Default)]
pub struct StorageGateway {
    host: Option<Arc<dyn ImageHost>>,
}

impl StorageGateway {
    pub fn new(host: Arc<dyn ImageHost>) -> Self {
        Self { host: Some(host) }
    }

    /// Never uploads; every image is stored as a data URL
    pub fn local_only() -> Self {
        Self { host: None }
    }

    /// Build from config, degrading to local-only when the host is unusable
    pub fn from_config(config: &UploadConfig) -> Self {
        debug!(provider = %config.provider, "StorageGateway::from_config: called");
        match config.provider.as_str() {
            "none" => Self::local_only(),
            "imagekit" => match ImageKitHost::from_config(config) {
                Ok(host) => Self::new(Arc::new(host)),
                Err(e) => {
                    warn!(error = %e, "Image uploads disabled");
                    Self::local_only()
                }
            },
            other => {
                warn!(provider = %other, "Unknown upload provider, images will be stored locally");
                Self::local_only()
            }
        }
    }

    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Store an image, falling back to its data URL on any failure
    pub async fn store(&self, image: &RenderedImage, name: &str) -> ImageRef {
        debug!(%name, mime = %image.mime_type, "StorageGateway::store: called");
        let Some(host) = &self.host else {
            debug!("StorageGateway::store: no host, storing locally");
            return ImageRef::local(image);
        };

        match host.upload(image, name).await {
            Ok(url) if url.starts_with("http") => {
                info!(%url, "Uploaded image");
                ImageRef::Remote { url }
            }
            Ok(url) => {
                warn!(%url, "Image host returned a non-http reference, storing locally");
                ImageRef::local(image)
            }
            Err(e) => {
                warn!(error = %e, %name, "Image upload failed, storing locally");
                ImageRef::local(image)
            }
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Host answering every upload with a fixed result
    pub struct MockHost {
        url: Option<String>,
        pub names: Mutex<Vec<String>>,
    }

    impl MockHost {
        pub fn ok(url: &str) -> Self {
            Self {
                url: Some(url.to_string()),
                names: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                url: None,
                names: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageHost for MockHost {
        async fn upload(&self, _image: &RenderedImage, name: &str) -> Result<String, UploadError> {
            self.names.lock().unwrap().push(name.to_string());
            self.url.clone().ok_or(UploadError::Api {
                status: 500,
                message: "injected failure".to_string(),
            })
        }
    }
}
