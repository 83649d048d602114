// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Embedding Provider Domain Interface (Anti-Corruption Layer)
//
// Isolates the matcher and deduplicator from whichever model turns text into
// vectors. Retry, backoff and batching are the provider's concern.
//
// Implementations in infrastructure/embedding_client.rs.

use async_trait::async_trait;

use super::scoring;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text into a fixed-length vector
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Vector length this provider produces
    fn dimension(&self) -> usize;

    /// Cosine similarity in [-1, 1]; fails on dimension mismatch.
    fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> Result<f64, EmbeddingError> {
        scoring::cosine_similarity(a, b)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Text cannot be empty")]
    EmptyInput,

    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
