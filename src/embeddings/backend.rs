use crate::embeddings::{
    InferenceApiModel, ModelLoader, ModelOptions, VectorModel, WordVectorModel,
};
use crate::error::{EmbedrankError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/v1/embeddings";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// Which model implementation an embedder loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backend {
    /// OpenAI-compatible `/v1/embeddings` endpoint
    InferenceApi {
        #[serde(default = "default_endpoint")]
        endpoint: String,
        /// LRU entries of text -> vector; 0 disables caching
        #[serde(default)]
        cache_capacity: usize,
    },
    /// Static word-vector table read from the file named by `model`
    WordVectors,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::InferenceApi {
            endpoint: default_endpoint(),
            cache_capacity: 0,
        }
    }
}

impl Backend {
    pub fn validate(&self) -> Result<()> {
        match self {
            Backend::InferenceApi { endpoint, .. } => {
                url::Url::parse(endpoint).map_err(|e| {
                    EmbedrankError::Config(format!("Invalid endpoint {}: {}", endpoint, e))
                })?;
                Ok(())
            }
            Backend::WordVectors => Ok(()),
        }
    }
}

impl ModelLoader for Backend {
    fn load(&self, options: &ModelOptions) -> Result<Box<dyn VectorModel>> {
        if options.trust_remote_code {
            log::warn!("trust_remote_code has no effect on the {:?} backend", self);
        }
        match self {
            Backend::InferenceApi {
                endpoint,
                cache_capacity,
            } => Ok(Box::new(InferenceApiModel::connect(
                endpoint,
                *cache_capacity,
                options,
            )?)),
            Backend::WordVectors => Ok(Box::new(WordVectorModel::from_path(
                Path::new(&options.model),
                options.normalize_embeddings,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_local_inference_api() {
        assert_eq!(
            Backend::default(),
            Backend::InferenceApi {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                cache_capacity: 0,
            }
        );
    }

    #[test]
    fn backend_serializes_with_kind_tag() {
        let value = serde_json::to_value(Backend::WordVectors).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "word_vectors"}));

        let backend: Backend =
            serde_json::from_value(serde_json::json!({"kind": "inference_api"})).unwrap();
        assert_eq!(backend, Backend::default());
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        let backend = Backend::InferenceApi {
            endpoint: "not a url".to_string(),
            cache_capacity: 0,
        };
        assert!(matches!(backend.validate(), Err(EmbedrankError::Config(_))));
        assert!(Backend::WordVectors.validate().is_ok());
    }

    #[test]
    fn word_vector_backend_loads_from_model_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        std::fs::write(&path, "kot 1 0\npies 0 1\n").unwrap();
        let options = ModelOptions {
            model: path.to_string_lossy().into_owned(),
            device: crate::embeddings::Device::Cpu,
            token: None,
            batch_size: 32,
            progress_bar: false,
            normalize_embeddings: false,
            trust_remote_code: false,
        };
        let model = Backend::WordVectors.load(&options).unwrap();
        assert_eq!(model.dimension(), 2);
    }

    #[test]
    fn word_vector_backend_missing_file_fails() {
        let options = ModelOptions {
            model: "/nonexistent/vectors.txt".to_string(),
            device: crate::embeddings::Device::Cpu,
            token: None,
            batch_size: 32,
            progress_bar: false,
            normalize_embeddings: false,
            trust_remote_code: false,
        };
        assert!(Backend::WordVectors.load(&options).is_err());
    }
}
