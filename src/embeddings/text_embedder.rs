use crate::config::EmbedderConfig;
use crate::embeddings::component::{json_kind, take_input};
use crate::embeddings::{Component, Embedding, ModelHandle, ModelLoader};
use crate::error::{EmbedrankError, Result};
use serde_json::{json, Value};

/// Embeds one free-text string, typically a query.
///
/// The model is not loaded on construction; call [`Component::load`] first.
pub struct TextEmbedder {
    config: EmbedderConfig,
    handle: ModelHandle,
}

impl TextEmbedder {
    /// Embedder using the backend named in `config`
    pub fn new(config: EmbedderConfig) -> Self {
        let loader = Box::new(config.backend.clone());
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: EmbedderConfig, loader: Box<dyn ModelLoader>) -> Self {
        Self {
            config,
            handle: ModelHandle::new(loader),
        }
    }

    pub fn dimension(&self) -> Option<usize> {
        self.handle.dimension()
    }

    /// Embed `prefix + text + suffix`
    pub fn embed(&self, text: &str) -> Result<Embedding> {
        let text_to_embed = format!("{}{}{}", self.config.prefix, text, self.config.suffix);
        let mut embeddings = self
            .handle
            .embed_batch(std::slice::from_ref(&text_to_embed), Self::TYPE_NAME)?;
        embeddings
            .pop()
            .ok_or_else(|| EmbedrankError::Model("model returned no embedding".to_string()))
    }
}

impl Component for TextEmbedder {
    const TYPE_NAME: &'static str = "embedrank.embeddings.TextEmbedder";

    type Config = EmbedderConfig;

    fn from_config(config: EmbedderConfig) -> Self {
        Self::new(config)
    }

    fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    fn load(&mut self) -> Result<()> {
        self.handle.load(&self.config)
    }

    fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// `{"text": <string>}` -> `{"embedding": [...]}`
    fn run(&self, inputs: Value) -> Result<Value> {
        let text = match take_input(inputs, "text", Self::TYPE_NAME)? {
            Value::String(text) => text,
            other => {
                return Err(EmbedrankError::InputType(format!(
                    "TextEmbedder expects a string as input, got {}. \
                     To embed a list of Documents, use DocumentEmbedder.",
                    json_kind(&other)
                )))
            }
        };
        let embedding = self.embed(&text)?;
        Ok(json!({ "embedding": embedding }))
    }
}
