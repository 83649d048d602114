// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository interface for the Pattern aggregate.
//!
//! The engine only ever reads the full collection, looks patterns up by name
//! and saves them back. Implementations live in `crate::infrastructure`.

use async_trait::async_trait;

use super::pattern::{Pattern, PatternId};

#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Save pattern (create or update). Failures are returned as-is and
    /// never retried by the engine.
    async fn save(&self, pattern: &Pattern) -> Result<(), RepositoryError>;

    /// Every pattern, deprecated ones included, in store order
    async fn find_all(&self) -> Result<Vec<Pattern>, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Pattern>, RepositoryError>;

    async fn find_by_id(&self, id: PatternId) -> Result<Option<Pattern>, RepositoryError> {
        Ok(self.find_all().await?.into_iter().find(|p| p.id == id))
    }
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Pattern not found: {0}")]
    NotFound(String),

    #[error("Pattern name '{name}' already belongs to pattern {existing}")]
    Conflict { name: String, existing: PatternId },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
