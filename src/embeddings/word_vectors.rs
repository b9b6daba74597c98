//! Static word-vector model.
//!
//! Reads a table in the word2vec/fastText text format (`word v1 v2 ...` per
//! line, optionally preceded by a `count dimension` header). A text's vector
//! is the mean over its tokens, where out-of-vocabulary tokens contribute a
//! zero vector.

use crate::embeddings::{normalize_embedding, Embedding, VectorModel};
use crate::error::{EmbedrankError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

/// Word runs, or single non-space symbols (punctuation is its own token).
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+|[^\w\s]").expect("token pattern is valid"))
}

pub fn tokenize(text: &str) -> Vec<&str> {
    token_pattern().find_iter(text).map(|m| m.as_str()).collect()
}

pub struct WordVectorModel {
    vectors: HashMap<String, Embedding>,
    dimension: usize,
    normalize: bool,
}

impl WordVectorModel {
    pub fn from_path(path: &Path, normalize: bool) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            EmbedrankError::Model(format!(
                "Failed to open word vectors {}: {}",
                path.display(),
                e
            ))
        })?;
        let model = Self::from_reader(BufReader::new(file), normalize)?;
        log::info!(
            "Loaded {} word vectors ({} dimensions) from {}",
            model.vectors.len(),
            model.dimension,
            path.display()
        );
        Ok(model)
    }

    pub fn from_reader<R: BufRead>(reader: R, normalize: bool) -> Result<Self> {
        let mut vectors = HashMap::new();
        let mut dimension: Option<usize> = None;
        // "<count> <dimension>" candidate, confirmed by the first vector's length
        let mut header: Option<(String, usize)> = None;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let word = match parts.next() {
                Some(word) => word,
                None => continue,
            };
            let rest: Vec<&str> = parts.collect();

            if line_no == 0 && rest.len() == 1 {
                if let (Ok(_), Ok(declared)) = (word.parse::<usize>(), rest[0].parse::<usize>()) {
                    header = Some((word.to_string(), declared));
                    continue;
                }
            }

            let values = rest
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<std::result::Result<Embedding, _>>()
                .map_err(|e| {
                    EmbedrankError::Parse(format!(
                        "Invalid value on word-vector line {}: {}",
                        line_no + 1,
                        e
                    ))
                })?;

            if let Some((first_word, declared)) = header.take() {
                if declared == values.len() {
                    dimension = Some(declared);
                } else {
                    // not a header: a numeric word with a one-dimensional vector
                    vectors.insert(first_word, vec![declared as f32]);
                    dimension = Some(1);
                }
            }

            match dimension {
                Some(expected) if expected != values.len() => {
                    return Err(EmbedrankError::Parse(format!(
                        "Word-vector line {} has {} values, expected {}",
                        line_no + 1,
                        values.len(),
                        expected
                    )));
                }
                Some(_) => {}
                None => dimension = Some(values.len()),
            }
            vectors.insert(word.to_string(), values);
        }

        let dimension = match dimension {
            Some(d) if d > 0 && !vectors.is_empty() => d,
            _ => {
                return Err(EmbedrankError::Model(
                    "Word-vector table contains no vectors".to_string(),
                ))
            }
        };

        Ok(Self {
            vectors,
            dimension,
            normalize,
        })
    }

    fn lookup(&self, token: &str) -> Option<&Embedding> {
        self.vectors
            .get(token)
            .or_else(|| self.vectors.get(&token.to_lowercase()))
    }

    /// Mean of token vectors; all zeros for text without tokens.
    pub fn embed_text(&self, text: &str) -> Embedding {
        let tokens = tokenize(text);
        let mut sum = vec![0.0f32; self.dimension];
        if tokens.is_empty() {
            return sum;
        }

        for token in &tokens {
            if let Some(vector) = self.lookup(token) {
                for (acc, v) in sum.iter_mut().zip(vector) {
                    *acc += v;
                }
            }
        }
        let count = tokens.len() as f32;
        for v in sum.iter_mut() {
            *v /= count;
        }
        if self.normalize {
            normalize_embedding(&mut sum);
        }
        sum
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectors.len()
    }
}

impl VectorModel for WordVectorModel {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
