use crate::config::DocumentEmbedderConfig;
use crate::embeddings::component::{json_kind, take_input};
use crate::embeddings::{Component, Document, ModelHandle, ModelLoader};
use crate::error::{EmbedrankError, Result};
use serde_json::{json, Value};

/// Embeds batches of [`Document`]s, fusing selected meta fields into the
/// embedded text.
pub struct DocumentEmbedder {
    config: DocumentEmbedderConfig,
    handle: ModelHandle,
}

impl DocumentEmbedder {
    /// Embedder using the backend named in `config`
    pub fn new(config: DocumentEmbedderConfig) -> Self {
        let loader = Box::new(config.embedder.backend.clone());
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: DocumentEmbedderConfig, loader: Box<dyn ModelLoader>) -> Self {
        Self {
            config,
            handle: ModelHandle::new(loader),
        }
    }

    pub fn dimension(&self) -> Option<usize> {
        self.handle.dimension()
    }

    /// `prefix + join(meta values ++ [content], separator) + suffix`
    pub fn text_to_embed(&self, document: &Document) -> String {
        let mut parts = document.meta_values_to_embed(&self.config.meta_fields_to_embed);
        parts.push(document.content.clone().unwrap_or_default());
        format!(
            "{}{}{}",
            self.config.embedder.prefix,
            parts.join(&self.config.embedding_separator),
            self.config.embedder.suffix
        )
    }

    /// Fill the embedding slot of every document with one batched model call.
    ///
    /// On error no document is modified.
    pub fn embed(&self, documents: &mut [Document]) -> Result<()> {
        let texts: Vec<String> = documents.iter().map(|d| self.text_to_embed(d)).collect();
        let embeddings = self.handle.embed_batch(&texts, Self::TYPE_NAME)?;

        for (document, embedding) in documents.iter_mut().zip(embeddings) {
            document.embedding = Some(embedding);
        }
        Ok(())
    }
}

impl Component for DocumentEmbedder {
    const TYPE_NAME: &'static str = "embedrank.embeddings.DocumentEmbedder";

    type Config = DocumentEmbedderConfig;

    fn from_config(config: DocumentEmbedderConfig) -> Self {
        Self::new(config)
    }

    fn config(&self) -> &DocumentEmbedderConfig {
        &self.config
    }

    fn load(&mut self) -> Result<()> {
        self.handle.load(&self.config.embedder)
    }

    fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// `{"documents": [...]}` -> `{"documents": [...]}` with embeddings set
    fn run(&self, inputs: Value) -> Result<Value> {
        let items = match take_input(inputs, "documents", Self::TYPE_NAME)? {
            Value::Array(items) => items,
            other => {
                return Err(EmbedrankError::InputType(format!(
                    "DocumentEmbedder expects a list of Documents as input, got {}. \
                     To embed a single string, use TextEmbedder.",
                    json_kind(&other)
                )))
            }
        };

        let mut documents = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                if !item.is_object() {
                    return Err(EmbedrankError::InputType(format!(
                        "DocumentEmbedder expects a list of Documents, element {} is {}",
                        i,
                        json_kind(&item)
                    )));
                }
                serde_json::from_value::<Document>(item).map_err(|e| {
                    EmbedrankError::InputType(format!("element {} is not a Document: {}", i, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.embed(&mut documents)?;
        Ok(json!({ "documents": serde_json::to_value(&documents)? }))
    }
}
