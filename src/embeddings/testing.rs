//! Deterministic in-process model for component tests.

use crate::embeddings::{Embedding, ModelLoader, ModelOptions, VectorModel};
use crate::error::{EmbedrankError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Serialize tests that mutate process-wide env vars so they don't race.
pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Loader for [`FakeModel`] that records what happened to it.
pub(crate) struct FakeLoader {
    dimension: usize,
    fail: bool,
    drop_last: bool,
    loads: Arc<AtomicUsize>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    options: Arc<Mutex<Option<ModelOptions>>>,
}

impl FakeLoader {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
            drop_last: false,
            loads: Arc::new(AtomicUsize::new(0)),
            batches: Arc::new(Mutex::new(Vec::new())),
            options: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(3)
        }
    }

    /// Model returns one embedding fewer than requested.
    pub(crate) fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }

    pub(crate) fn load_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.loads)
    }

    /// Every batch the model was asked to embed, in call order.
    pub(crate) fn batches(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.batches)
    }

    pub(crate) fn options(&self) -> Arc<Mutex<Option<ModelOptions>>> {
        Arc::clone(&self.options)
    }
}

impl ModelLoader for FakeLoader {
    fn load(&self, options: &ModelOptions) -> Result<Box<dyn VectorModel>> {
        if self.fail {
            return Err(EmbedrankError::Model(format!(
                "cannot load model {}",
                options.model
            )));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.options.lock().unwrap() = Some(options.clone());
        Ok(Box::new(FakeModel {
            dimension: self.dimension,
            drop_last: self.drop_last,
            batches: Arc::clone(&self.batches),
        }))
    }
}

pub(crate) struct FakeModel {
    dimension: usize,
    drop_last: bool,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

/// Vector derived from the text: char count, byte sum mod 97, then ones.
pub(crate) fn fake_embedding(text: &str, dimension: usize) -> Embedding {
    let mut v = vec![1.0; dimension];
    if dimension > 0 {
        v[0] = text.chars().count() as f32;
    }
    if dimension > 1 {
        v[1] = (text.bytes().map(u32::from).sum::<u32>() % 97) as f32;
    }
    v
}

impl VectorModel for FakeModel {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        self.batches.lock().unwrap().push(texts.to_vec());
        let mut out: Vec<Embedding> = texts
            .iter()
            .map(|t| fake_embedding(t, self.dimension))
            .collect();
        if self.drop_last {
            out.pop();
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
