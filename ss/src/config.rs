//! ScienceSnap configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{ImageModel, Preferences};

/// Main ScienceSnap configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text model used for facts and plans
    pub llm: LlmConfig,

    /// Image model used for rendering
    pub image: ImageConfig,

    /// Image host used when saving
    pub upload: UploadConfig,

    /// Gallery storage
    pub storage: StorageConfig,

    /// Starting preferences (language, audience, image model)
    pub preferences: Preferences,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Both generation calls need an API key; without one nothing can be
    /// generated, so fail fast with a clear message.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if std::env::var(&self.image.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Image API key not found. Set the {} environment variable.",
                self.image.api_key_env
            ));
        }
        if self.upload.provider != "none" && std::env::var(&self.upload.private_key_env).is_err() {
            tracing::warn!(
                "{} not set; saved images will be embedded in the gallery instead of uploaded",
                self.upload.private_key_env
            );
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .sciencesnap.yml
        let local_config = PathBuf::from(".sciencesnap.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/sciencesnap/sciencesnap.yml
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed: the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = [
            config_path.cloned(),
            Some(PathBuf::from(".sciencesnap.yml")),
            Self::user_config_path(),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(&p).ok())
            .and_then(|c| c.log_level)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sciencesnap").join("sciencesnap.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Text model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("gemini" or "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| eyre::eyre!("Environment variable {} not set", self.api_key_env))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }
}

/// Image model configuration (Gemini image models)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Model id for the fast variant
    #[serde(rename = "flash-model")]
    pub flash_model: String,

    /// Model id for the high quality variant
    #[serde(rename = "pro-model")]
    pub pro_model: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl ImageConfig {
    /// Resolve a model variant to its model id
    pub fn model_id(&self, model: ImageModel) -> &str {
        match model {
            ImageModel::Flash => &self.flash_model,
            ImageModel::Pro => &self.pro_model,
        }
    }

    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| eyre::eyre!("Environment variable {} not set", self.api_key_env))
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            flash_model: "gemini-2.5-flash-image".to_string(),
            pro_model: "gemini-3-pro-image-preview".to_string(),
            timeout_ms: 180_000,
        }
    }
}

/// Image host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Provider name ("imagekit" or "none")
    pub provider: String,

    /// Upload endpoint
    pub endpoint: String,

    /// Environment variable containing the private upload key
    #[serde(rename = "private-key-env")]
    pub private_key_env: String,

    /// Remote folder for uploaded images
    pub folder: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            provider: "imagekit".to_string(),
            endpoint: "https://upload.imagekit.io/api/v1/files/upload".to_string(),
            private_key_env: "IMAGEKIT_PRIVATE_KEY".to_string(),
            folder: "/sciencesnap".to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// Gallery storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the shared gallery store
    #[serde(rename = "gallery-dir")]
    pub gallery_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            gallery_dir: gallerystore::default_store_path().to_string_lossy().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Audience, Language};
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.upload.provider, "imagekit");
        assert_eq!(config.preferences.image_model, ImageModel::Pro);
        assert!(config.storage.gallery_dir.ends_with("gallery"));
    }

    #[test]
    fn test_image_model_ids() {
        let config = ImageConfig::default();

        assert_eq!(config.model_id(ImageModel::Flash), "gemini-2.5-flash-image");
        assert_eq!(config.model_id(ImageModel::Pro), "gemini-3-pro-image-preview");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: anthropic
  model: claude-sonnet-4
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 4096
  timeout-ms: 60000

image:
  flash-model: image-fast
  pro-model: image-best

upload:
  provider: none

storage:
  gallery-dir: /tmp/gallery

preferences:
  language: fr
  audience: adult
  image-model: flash

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.image.model_id(ImageModel::Pro), "image-best");
        assert_eq!(config.image.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.upload.provider, "none");
        assert_eq!(config.storage.gallery_dir, "/tmp/gallery");
        assert_eq!(config.preferences.language, Language::Fr);
        assert_eq!(config.preferences.audience, Audience::Adult);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: gemini-2.5-pro
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gemini-2.5-pro");
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.upload.folder, "/sciencesnap");
        assert_eq!(config.preferences, Preferences::default());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.yml");
        fs::write(&path, "log-level: warn\nllm:\n  model: m1\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "m1");
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = PathBuf::from("/definitely/not/here.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn test_validate_requires_api_keys() {
        let mut config = Config::default();
        config.llm.api_key_env = "SCIENCESNAP_TEST_LLM_KEY".to_string();
        config.image.api_key_env = "SCIENCESNAP_TEST_IMAGE_KEY".to_string();
        config.upload.provider = "none".to_string();

        // SAFETY: serialized test; no other thread reads these variables
        unsafe {
            std::env::remove_var("SCIENCESNAP_TEST_LLM_KEY");
            std::env::remove_var("SCIENCESNAP_TEST_IMAGE_KEY");
        }
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SCIENCESNAP_TEST_LLM_KEY"));

        unsafe {
            std::env::set_var("SCIENCESNAP_TEST_LLM_KEY", "k1");
        }
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SCIENCESNAP_TEST_IMAGE_KEY"));

        unsafe {
            std::env::set_var("SCIENCESNAP_TEST_IMAGE_KEY", "k2");
        }
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.get_api_key().unwrap(), "k1");

        unsafe {
            std::env::remove_var("SCIENCESNAP_TEST_LLM_KEY");
            std::env::remove_var("SCIENCESNAP_TEST_IMAGE_KEY");
        }
    }
}
