use crate::embeddings::Embedding;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document to embed: text content, free-form metadata and an embedding slot.
///
/// Unknown fields are rejected so that arbitrary JSON objects are not mistaken
/// for documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub embedding: Option<Embedding>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Meta values to fuse into the embedded text, in `fields` order.
    ///
    /// Fields that are absent or hold a falsy value (null, false, 0, empty
    /// string/array/object) are skipped.
    pub fn meta_values_to_embed(&self, fields: &[String]) -> Vec<String> {
        fields
            .iter()
            .filter_map(|field| self.meta.get(field))
            .filter(|value| is_truthy(value))
            .map(meta_value_text)
            .collect()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Text form of a meta value: strings verbatim, `true` as `True`, everything else as JSON.
fn meta_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}
