// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Error taxonomy for the pattern engine.
//!
//! Store and embedding failures keep their own types so callers can tell a
//! persistence problem from a model problem. Inside matching and duplicate
//! detection, embedding failures never surface here: the affected signal is
//! dropped from fusion instead.

use crate::domain::embedding::EmbeddingError;
use crate::domain::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, PatternEngineError>;

#[derive(Debug, thiserror::Error)]
pub enum PatternEngineError {
    /// Caller supplied an argument the engine cannot act on
    /// (unknown merge strategy, merge group smaller than two).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl PatternEngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        PatternEngineError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PatternEngineError::Validation(_))
    }
}
