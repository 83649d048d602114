// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Embedding Backfill
//!
//! Computes embeddings for patterns stored without one, so the semantic
//! signal and embedding-based deduplication can see them. One bad pattern
//! does not stop the run: failures are logged and counted.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{EmbeddingProvider, PatternRepository};
use crate::error::Result;

/// Outcome of a backfill run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Patterns that had no embedding
    pub scanned: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct EmbeddingBackfill {
    repository: Arc<dyn PatternRepository>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingBackfill {
    pub fn new(repository: Arc<dyn PatternRepository>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            repository,
            embeddings,
        }
    }

    /// Embed every pattern lacking an embedding. Deprecated patterns are
    /// included. Only a failure to list the store aborts the run.
    pub async fn backfill_embeddings(&self) -> Result<BackfillReport> {
        let pending: Vec<_> = self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(|p| p.embedding.is_none())
            .collect();

        let mut report = BackfillReport {
            scanned: pending.len(),
            ..Default::default()
        };

        for mut pattern in pending {
            let embedding = match self.embeddings.generate_embedding(&pattern.embedding_text()).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    warn!(pattern = %pattern.name, error = %e, "Failed to embed pattern");
                    report.failed += 1;
                    continue;
                }
            };

            pattern.embedding = Some(embedding);
            match self.repository.save(&pattern).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!(pattern = %pattern.name, error = %e, "Failed to store pattern embedding");
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            updated = report.updated,
            failed = report.failed,
            "Embedding backfill complete"
        );

        Ok(report)
    }
}
