use crate::cache::EmbeddingCache;
use crate::embeddings::{normalize_embedding, Embedding, ModelOptions, VectorModel};
use crate::error::{EmbedrankError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Largest number of inputs sent in one request
const MAX_BATCH_SIZE: usize = 2048;

/// Sent once while loading to learn the output dimension
const PROBE_TEXT: &str = "dimension probe";

/// Request body of an OpenAI-compatible embeddings endpoint
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response body of an OpenAI-compatible embeddings endpoint
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Individual embedding data in API response
#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl EmbeddingResponse {
    /// Embeddings in input order. Servers may return `data` in any order when
    /// they report `index`.
    fn into_embeddings(mut self) -> Vec<Embedding> {
        if self.data.iter().all(|d| d.index.is_some()) {
            self.data.sort_by_key(|d| d.index);
        }
        self.data.into_iter().map(|d| d.embedding).collect()
    }
}

/// Embedding model served over HTTP by an OpenAI-compatible endpoint
/// (OpenAI, text-embeddings-inference, vLLM, Ollama).
///
/// Texts are sent in requests of at most `batch_size` inputs. With a cache,
/// texts embedded before are answered locally.
pub struct InferenceApiModel {
    client: Client,
    endpoint: Url,
    token: Option<String>,
    model: String,
    batch_size: usize,
    normalize: bool,
    progress_bar: bool,
    dimension: usize,
    cache: Option<EmbeddingCache>,
}

impl InferenceApiModel {
    /// Build the client and probe the endpoint once to learn the vector dimension.
    pub fn connect(endpoint: &str, cache_capacity: usize, options: &ModelOptions) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            EmbedrankError::Config(format!("Invalid endpoint {}: {}", endpoint, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EmbedrankError::Model(format!("Failed to build HTTP client: {}", e)))?;

        let cache = (cache_capacity > 0).then(|| EmbeddingCache::new(cache_capacity));

        let mut model = Self {
            client,
            endpoint,
            token: options.token.clone(),
            model: options.model.clone(),
            batch_size: options.batch_size.clamp(1, MAX_BATCH_SIZE),
            normalize: options.normalize_embeddings,
            progress_bar: options.progress_bar,
            dimension: 0,
            cache,
        };

        let probe = model.request(&[PROBE_TEXT.to_string()])?;
        model.dimension = probe
            .first()
            .map(Vec::len)
            .filter(|d| *d > 0)
            .ok_or_else(|| {
                EmbedrankError::Model(format!(
                    "Endpoint {} returned no embedding for the probe request",
                    model.endpoint
                ))
            })?;
        log::debug!("Endpoint {} serves {} dimensions", model.endpoint, model.dimension);

        Ok(model)
    }

    /// One HTTP request for `texts`
    fn request(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let start = std::time::Instant::now();
        let response = builder
            .send()
            .map_err(|e| EmbedrankError::Model(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(EmbedrankError::Model(format!(
                "Embedding endpoint error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .map_err(|e| EmbedrankError::Model(format!("Failed to parse response: {}", e)))?;
        log::debug!("Embedding request for {} texts took {:?}", texts.len(), start.elapsed());

        Ok(result.into_embeddings())
    }
}

impl VectorModel for InferenceApiModel {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut out: Vec<Option<Embedding>> = vec![None; texts.len()];
        let mut pending = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            match self.cache.as_ref().and_then(|c| c.get(text)) {
                Some(hit) => out[i] = Some(hit),
                None => pending.push(i),
            }
        }
        if let Some(cache) = &self.cache {
            let (hits, misses) = cache.stats();
            log::debug!(
                "{} of {} texts served from cache (total hits {}, misses {})",
                texts.len() - pending.len(),
                texts.len(),
                hits,
                misses
            );
        }

        let total = pending.len();
        let mut completed = 0;
        for chunk in pending.chunks(self.batch_size) {
            let batch: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            let embeddings = self.request(&batch)?;
            if embeddings.len() != batch.len() {
                return Err(EmbedrankError::Model(format!(
                    "Endpoint returned {} embeddings for {} inputs",
                    embeddings.len(),
                    batch.len()
                )));
            }

            for (&i, mut embedding) in chunk.iter().zip(embeddings) {
                if embedding.len() != self.dimension {
                    return Err(EmbedrankError::Model(format!(
                        "Endpoint returned {} dimensions, expected {}",
                        embedding.len(),
                        self.dimension
                    )));
                }
                if self.normalize {
                    normalize_embedding(&mut embedding);
                }
                if let Some(cache) = &self.cache {
                    cache.put(texts[i].clone(), embedding.clone());
                }
                out[i] = Some(embedding);
            }

            completed += chunk.len();
            if self.progress_bar {
                log::info!("Embedding progress: {}/{} texts", completed, total);
            }
        }

        out.into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| EmbedrankError::Model("Missing embedding in batch".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
