// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PatternMatcher — Pattern Suggestion for Entities
//!
//! Ranks every active pattern in the library against an [`EntityDescription`]
//! and returns the ones worth suggesting, each with a confidence in [0, 1].
//!
//! ## Signals
//!
//! | Signal | Weight | Includable when |
//! |--------|--------|-----------------|
//! | field name | 0.4 | a name fragment occurs in some field name |
//! | field type | 0.3 | the pattern declares `field_types` and one is present |
//! | semantic | 0.2 | enabled, entity has a description, pattern has an embedding |
//! | popularity | 0.1 | always |
//!
//! Signals that are not includable are left out of the weighted average
//! entirely, so a pattern is never penalised for information it lacks.
//! Embedding failures only drop the semantic signal; they never fail a match.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    keyword_coverage, name_fragments, popularity_score, rescale_cosine, weighted_average,
    EmbeddingProvider, EntityDescription, Pattern, PatternRepository, Signal,
};
use crate::error::Result;

pub const FIELD_NAME_WEIGHT: f64 = 0.4;
pub const FIELD_TYPE_WEIGHT: f64 = 0.3;
pub const SEMANTIC_WEIGHT: f64 = 0.2;
pub const POPULARITY_WEIGHT: f64 = 0.1;

/// Knobs for a single `find_applicable_patterns` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Maximum number of matches returned
    pub limit: usize,
    /// Matches below this confidence are dropped
    pub min_confidence: f64,
    /// Skip patterns the entity already lists as applied
    pub exclude_applied: bool,
    /// Compare the entity description against pattern embeddings
    pub use_semantic: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            min_confidence: 0.5,
            exclude_applied: true,
            use_semantic: false,
        }
    }
}

/// A pattern suggested for an entity
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub pattern: Pattern,
    pub confidence: f64,
}

pub struct PatternMatcher {
    repository: Arc<dyn PatternRepository>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl PatternMatcher {
    pub fn new(repository: Arc<dyn PatternRepository>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            repository,
            embeddings,
        }
    }

    /// Ranked, confidence-scored patterns applicable to `entity`.
    ///
    /// Deprecated patterns are never suggested. Ties keep store order.
    pub async fn find_applicable_patterns(
        &self,
        entity: &EntityDescription,
        options: &MatchOptions,
    ) -> Result<Vec<PatternMatch>> {
        let candidates: Vec<Pattern> = self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(|p| !p.deprecated)
            .filter(|p| !(options.exclude_applied && entity.has_applied(&p.name)))
            .collect();

        let entity_embedding = if options.use_semantic {
            self.entity_embedding(entity, &candidates).await
        } else {
            None
        };

        let mut matches: Vec<PatternMatch> = candidates
            .into_iter()
            .filter_map(|pattern| {
                let signals = self.confidence_signals(&pattern, entity, entity_embedding.as_deref());
                let confidence = weighted_average(&signals);

                debug!(
                    pattern = %pattern.name,
                    entity = %entity.name,
                    confidence,
                    "Scored pattern"
                );

                if confidence >= options.min_confidence {
                    Some(PatternMatch { pattern, confidence })
                } else {
                    None
                }
            })
            .collect();

        // Stable: equal confidences keep store order
        matches.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));
        matches.truncate(options.limit);

        info!(
            entity = %entity.name,
            matched = matches.len(),
            "Pattern matching complete"
        );

        Ok(matches)
    }

    /// The four signals for one pattern. `entity_embedding` is `None` when
    /// the semantic signal is disabled or unavailable.
    pub fn confidence_signals(
        &self,
        pattern: &Pattern,
        entity: &EntityDescription,
        entity_embedding: Option<&[f32]>,
    ) -> [Signal; 4] {
        [
            field_name_signal(pattern, entity),
            field_type_signal(pattern, entity),
            self.semantic_signal(pattern, entity_embedding),
            Signal::present("popularity", popularity_score(pattern.times_instantiated), POPULARITY_WEIGHT),
        ]
    }

    /// Embed the entity description once per call, only if some candidate
    /// could use it.
    async fn entity_embedding(&self, entity: &EntityDescription, candidates: &[Pattern]) -> Option<Vec<f32>> {
        let text = entity.semantic_text()?;
        if !candidates.iter().any(|p| p.embedding.is_some()) {
            return None;
        }

        match self.embeddings.generate_embedding(text).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!(
                    entity = %entity.name,
                    error = %e,
                    "Failed to embed entity description, semantic signal dropped"
                );
                None
            }
        }
    }

    fn semantic_signal(&self, pattern: &Pattern, entity_embedding: Option<&[f32]>) -> Signal {
        let (Some(query), Some(target)) = (entity_embedding, pattern.embedding.as_deref()) else {
            return Signal::absent("semantic", SEMANTIC_WEIGHT);
        };

        match self.embeddings.cosine_similarity(query, target) {
            Ok(similarity) => Signal::present("semantic", rescale_cosine(similarity), SEMANTIC_WEIGHT),
            Err(e) => {
                warn!(
                    pattern = %pattern.name,
                    error = %e,
                    "Semantic comparison failed, signal dropped for this pattern"
                );
                Signal::absent("semantic", SEMANTIC_WEIGHT)
            }
        }
    }
}

fn field_name_signal(pattern: &Pattern, entity: &EntityDescription) -> Signal {
    let fragments = name_fragments(&pattern.name);
    let field_names = entity.field_names();
    Signal::when_positive("field_name", keyword_coverage(&fragments, &field_names), FIELD_NAME_WEIGHT)
}

fn field_type_signal(pattern: &Pattern, entity: &EntityDescription) -> Signal {
    let Some(expected) = pattern.expected_field_types() else {
        return Signal::absent("field_type", FIELD_TYPE_WEIGHT);
    };

    let present = entity.field_types();
    let matched = expected.iter().filter(|t| present.contains(t.as_str())).count();
    Signal::when_positive("field_type", matched as f64 / expected.len() as f64, FIELD_TYPE_WEIGHT)
}
