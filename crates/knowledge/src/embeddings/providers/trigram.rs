//! Offline embedding provider built from hashed character trigrams.
//!
//! Useful when no embedding service is running: vectors are deterministic and
//! content-dependent, so lexically similar passages land close together.
//! Not a substitute for a sentence-embedding model in production.

use crate::embeddings::provider::EmbeddingProvider;
use bookchat_core::{AppError, AppResult};
use std::collections::BTreeMap;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "does", "do",
];

/// Feature-hashing embedder over word trigrams and whole words.
#[derive(Debug, Clone)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Dimensionality used when none is configured (matches `all-minilm`).
    pub const DEFAULT_DIMENSIONS: usize = 384;

    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> AppResult<Vec<f32>> {
        // Ordered so float accumulation into shared buckets is reproducible
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for word in tokenize(text) {
            *counts.entry(word).or_insert(0) += 1;
        }

        if counts.is_empty() {
            return Err(AppError::Embedding(
                "Cannot embed text without indexable words".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimensions];

        for (word, count) in &counts {
            let weight = (*count as f32).sqrt();
            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let gram: String = window.iter().collect();
                self.accumulate(&mut vector, &gram, weight);
            }
            self.accumulate(&mut vector, word, *count as f32);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        Ok(vector)
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let index = (hash % self.dimensions as u64) as usize;
        // Sign bit spreads collisions around zero
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(&w.as_str()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }
}
