//! ImageKit upload client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::Form;
use serde::Deserialize;
use tracing::debug;

use super::{ImageHost, UploadError};
use crate::config::UploadConfig;
use crate::domain::RenderedImage;

/// Uploads through the ImageKit server-side upload API
pub struct ImageKitHost {
    endpoint: String,
    private_key: String,
    folder: String,
    http: Client,
}

impl ImageKitHost {
    pub fn from_config(config: &UploadConfig) -> Result<Self, UploadError> {
        debug!(endpoint = %config.endpoint, "ImageKitHost::from_config: called");
        let private_key = std::env::var(&config.private_key_env)
            .map_err(|_| UploadError::NotConfigured(format!("{} not set", config.private_key_env)))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            private_key,
            folder: config.folder.clone(),
            http,
        })
    }

    fn build_form(&self, image: &RenderedImage, name: &str) -> Form {
        Form::new()
            .text("file", image.to_data_url())
            .text("fileName", name.to_string())
            .text("folder", self.folder.clone())
            .text("useUniqueFileName", "false")
    }
}

#[async_trait]
impl ImageHost for ImageKitHost {
    async fn upload(&self, image: &RenderedImage, name: &str) -> Result<String, UploadError> {
        debug!(%name, folder = %self.folder, "ImageKitHost::upload: called");
        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.private_key, Some(""))
            .multipart(self.build_form(image, name))
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(%status, "ImageKitHost::upload: rejected");
            return Err(UploadError::Api { status, message });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        parse_url(body)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

fn parse_url(body: UploadResponse) -> Result<String, UploadError> {
    body.url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| UploadError::InvalidResponse("missing url".to_string()))
}
