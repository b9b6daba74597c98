use crate::embeddings::{Backend, Device, ModelOptions, Secret};
use crate::error::{EmbedrankError, Result as EmbedResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "sentence-transformers/all-mpnet-base-v2";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub text_embedder: EmbedderConfig,
    #[serde(default)]
    pub document_embedder: DocumentEmbedderConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Parsed `log_level`; unknown names fall back to `Info`
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.trim().parse().unwrap_or_else(|_| {
            log::warn!("Unknown log_level '{}', using info", self.log_level);
            log::LevelFilter::Info
        })
    }
}

/// Options shared by both embedder components.
///
/// This is also the `init_parameters` payload of an exported text embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Model identifier: a model name for remote backends, a file path for word vectors
    pub model: String,
    pub device: Device,
    /// Access token; `None` sends no credentials
    pub token: Option<Secret>,
    /// Prepended to every embedded text
    pub prefix: String,
    /// Appended to every embedded text
    pub suffix: String,
    pub batch_size: usize,
    pub progress_bar: bool,
    pub normalize_embeddings: bool,
    pub trust_remote_code: bool,
    pub backend: Backend,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            device: Device::resolve(None),
            token: Some(Secret::default()),
            prefix: String::new(),
            suffix: String::new(),
            batch_size: 32,
            progress_bar: true,
            normalize_embeddings: false,
            trust_remote_code: false,
            backend: Backend::default(),
        }
    }
}

impl EmbedderConfig {
    /// Loader options with the token resolved from its secret
    pub fn model_options(&self) -> EmbedResult<ModelOptions> {
        let token = match &self.token {
            Some(secret) => secret.resolve()?,
            None => None,
        };
        Ok(ModelOptions {
            model: self.model.clone(),
            device: self.device,
            token,
            batch_size: self.batch_size,
            progress_bar: self.progress_bar,
            normalize_embeddings: self.normalize_embeddings,
            trust_remote_code: self.trust_remote_code,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> EmbedResult<()> {
        if self.model.trim().is_empty() {
            return Err(EmbedrankError::Config("model must not be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(EmbedrankError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        if let Some(secret) = &self.token {
            secret.resolve()?;
        }
        self.backend.validate()
    }
}

/// Document embedder options: the shared ones plus metadata fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentEmbedderConfig {
    #[serde(flatten)]
    pub embedder: EmbedderConfig,
    /// Meta fields whose values are embedded ahead of the content, in this order
    pub meta_fields_to_embed: Vec<String>,
    /// Joins meta values and content
    pub embedding_separator: String,
}

impl Default for DocumentEmbedderConfig {
    fn default() -> Self {
        Self {
            embedder: EmbedderConfig::default(),
            meta_fields_to_embed: Vec::new(),
            embedding_separator: "\n".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in EMBEDRANK_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("EMBEDRANK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        log::debug!("Loading configuration from {}", config_path.display());
        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        log::info!("Configuration loaded from {}", config_path.display());

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        self.text_embedder
            .validate()
            .context("Invalid [text_embedder] section")?;
        self.document_embedder
            .embedder
            .validate()
            .context("Invalid [document_embedder] section")?;
        Ok(())
    }
}
