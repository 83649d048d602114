// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory pattern store
//!
//! Backs development, tests and small embedded deployments. Patterns are kept
//! ordered by identity so `find_all` returns them in registration order.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{Pattern, PatternId, PatternRepository, RepositoryError};

pub struct InMemoryPatternRepository {
    patterns: Arc<RwLock<BTreeMap<PatternId, Pattern>>>,
    next_id: AtomicI64,
}

impl InMemoryPatternRepository {
    pub fn new() -> Self {
        Self {
            patterns: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: AtomicI64::new(1),
        }
    }

    /// Hand out the next identity. Identities never decrease; the counter
    /// saturates at `i64::MAX`.
    pub fn next_id(&self) -> PatternId {
        let id = self
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| Some(id.saturating_add(1)))
            .unwrap_or_else(|id| id);
        PatternId(id)
    }

    /// Seed the store with patterns, bumping the id counter past them.
    pub async fn with_patterns(patterns: impl IntoIterator<Item = Pattern>) -> Result<Self, RepositoryError> {
        let repo = Self::new();
        for pattern in patterns {
            repo.save(&pattern).await?;
        }
        Ok(repo)
    }

    pub async fn len(&self) -> usize {
        self.patterns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.patterns.read().await.is_empty()
    }
}

impl Default for InMemoryPatternRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatternRepository for InMemoryPatternRepository {
    async fn save(&self, pattern: &Pattern) -> Result<(), RepositoryError> {
        let mut patterns = self.patterns.write().await;

        if let Some(owner) = patterns
            .values()
            .find(|existing| existing.name == pattern.name && existing.id != pattern.id)
        {
            return Err(RepositoryError::Conflict {
                name: pattern.name.clone(),
                existing: owner.id,
            });
        }

        self.next_id.fetch_max(pattern.id.0.saturating_add(1), Ordering::SeqCst);
        patterns.insert(pattern.id, pattern.clone());
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Pattern>, RepositoryError> {
        let patterns = self.patterns.read().await;
        Ok(patterns.values().cloned().collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Pattern>, RepositoryError> {
        let patterns = self.patterns.read().await;
        Ok(patterns.values().find(|p| p.name == name).cloned())
    }

    async fn find_by_id(&self, id: PatternId) -> Result<Option<Pattern>, RepositoryError> {
        let patterns = self.patterns.read().await;
        Ok(patterns.get(&id).cloned())
    }
}
