//! Embedding components and the model capability they wrap.
//!
//! A [`ModelLoader`] turns configuration into a loaded [`VectorModel`]. The
//! [`TextEmbedder`] and [`DocumentEmbedder`] components each own one
//! [`ModelHandle`] that starts unloaded and must be loaded explicitly before
//! any embedding call.

pub mod backend;
pub mod component;
pub mod device;
pub mod document;
pub mod document_embedder;
pub mod inference_api;
pub mod secret;
pub mod text_embedder;
pub mod word_vectors;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::EmbedderConfig;
use crate::error::{EmbedrankError, Result};

pub use backend::Backend;
pub use component::{Component, ComponentDescriptor};
pub use device::Device;
pub use document::Document;
pub use document_embedder::DocumentEmbedder;
pub use inference_api::InferenceApiModel;
pub use secret::Secret;
pub use text_embedder::TextEmbedder;
pub use word_vectors::WordVectorModel;

/// An embedding vector
pub type Embedding = Vec<f32>;

/// A loaded model producing one fixed-length vector per input text.
pub trait VectorModel: Send {
    /// Embed a batch of texts. Output `i` belongs to input `i`.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// Length of every vector this model returns
    fn dimension(&self) -> usize;
}

/// Loads a [`VectorModel`]. Loading is blocking and may be expensive.
pub trait ModelLoader: Send {
    fn load(&self, options: &ModelOptions) -> Result<Box<dyn VectorModel>>;
}

/// Options handed to a loader, with the access token already resolved.
#[derive(Clone)]
pub struct ModelOptions {
    pub model: String,
    pub device: Device,
    pub token: Option<String>,
    pub batch_size: usize,
    pub progress_bar: bool,
    pub normalize_embeddings: bool,
    pub trust_remote_code: bool,
}

enum ModelState {
    Unloaded,
    Ready(Box<dyn VectorModel>),
}

/// Per-component model lifecycle: `Unloaded` until [`ModelHandle::load`] succeeds.
pub struct ModelHandle {
    loader: Box<dyn ModelLoader>,
    state: ModelState,
}

impl ModelHandle {
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            state: ModelState::Unloaded,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    /// Dimension of the loaded model, if any
    pub fn dimension(&self) -> Option<usize> {
        match &self.state {
            ModelState::Ready(model) => Some(model.dimension()),
            ModelState::Unloaded => None,
        }
    }

    /// Load the model described by `config`. A second call on a ready handle does nothing.
    pub fn load(&mut self, config: &EmbedderConfig) -> Result<()> {
        if self.is_ready() {
            log::debug!("Embedding model {} already loaded", config.model);
            return Ok(());
        }

        log::info!("Loading embedding model {} on {}", config.model, config.device);
        let options = config.model_options()?;
        let model = self.loader.load(&options)?;
        log::info!(
            "Embedding model {} ready ({} dimensions)",
            config.model,
            model.dimension()
        );
        self.state = ModelState::Ready(model);
        Ok(())
    }

    /// Embed `texts` in one model call; `component` names the caller in errors.
    pub fn embed_batch(&self, texts: &[String], component: &str) -> Result<Vec<Embedding>> {
        let model = match &self.state {
            ModelState::Ready(model) => model,
            ModelState::Unloaded => {
                return Err(EmbedrankError::NotReady(format!(
                    "the embedding model of {} has not been loaded; call load() before embedding",
                    component
                )))
            }
        };

        let embeddings = model.embed_batch(texts)?;
        if embeddings.len() != texts.len() {
            return Err(EmbedrankError::Model(format!(
                "model returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

/// Normalize an embedding vector in place (L2 normalization)
pub fn normalize_embedding(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for val in embedding.iter_mut() {
            *val /= norm;
        }
    }
}
