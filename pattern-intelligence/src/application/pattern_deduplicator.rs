// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PatternDeduplicator — Duplicate Detection & Consolidation
//!
//! Pattern libraries imported from several projects accumulate near-copies
//! of the same pattern. This service finds them, suggests which copy to keep
//! and folds the others into it.
//!
//! ## Similarity
//!
//! Weighted fusion of embedding cosine (0.7, only when both patterns carry an
//! embedding), name edit-distance similarity (0.2) and category equality
//! (0.1). Negative cosine contributes nothing. Absent signals shrink the
//! denominator rather than counting as zero.
//!
//! ## Grouping
//!
//! A single greedy pass in store order: each unassigned pattern collects
//! every later unassigned pattern at or above the threshold. There is no
//! transitive closure, so A~B and B~C with A!~C can split differently
//! depending on order. Singleton groups are never reported.
//!
//! ## Merging
//!
//! The kept pattern absorbs the usage count of every merged pattern; merged
//! patterns are soft-deprecated with a pointer to the kept one. Writes are
//! not transactional: a store failure partway leaves earlier writes in place.
//! Re-merging an already deprecated pattern counts its usage again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    name_similarity, weighted_average, EmbeddingError, EmbeddingProvider, Pattern,
    PatternRepository, Signal,
};
use crate::error::{PatternEngineError, Result};

pub const EMBEDDING_WEIGHT: f64 = 0.7;
pub const NAME_WEIGHT: f64 = 0.2;
pub const CATEGORY_WEIGHT: f64 = 0.1;

/// Which member of a duplicate group survives a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Highest `times_instantiated`, first in group order on ties
    #[default]
    MostUsed,
    /// First built-in or hand-authored pattern, else the first pattern.
    /// Decided by source type only; there is no timestamp comparison.
    Oldest,
    /// Highest identity, relying on stores assigning ids monotonically
    Newest,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::MostUsed => "most_used",
            MergeStrategy::Oldest => "oldest",
            MergeStrategy::Newest => "newest",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = PatternEngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "most_used" => Ok(MergeStrategy::MostUsed),
            "oldest" => Ok(MergeStrategy::Oldest),
            "newest" => Ok(MergeStrategy::Newest),
            other => Err(PatternEngineError::validation(format!("Unknown strategy: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeduplicationOptions {
    pub similarity_threshold: f64,
    pub strategy: MergeStrategy,
    /// Execute every suggestion instead of only reporting it
    pub auto_merge: bool,
}

impl Default for DeduplicationOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            strategy: MergeStrategy::MostUsed,
            auto_merge: false,
        }
    }
}

/// Which pattern to keep and which to fold into it
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSuggestion {
    pub keep: Pattern,
    pub merge: Vec<Pattern>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeduplicationReport {
    pub suggestions: Vec<MergeSuggestion>,
    /// Kept patterns as persisted, populated only when merges ran
    pub merged: Vec<Pattern>,
}

pub struct PatternDeduplicator {
    repository: Arc<dyn PatternRepository>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl PatternDeduplicator {
    pub fn new(repository: Arc<dyn PatternRepository>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            repository,
            embeddings,
        }
    }

    /// Groups of two or more active patterns at or above `similarity_threshold`.
    pub async fn find_duplicates(&self, similarity_threshold: f64) -> Result<Vec<Vec<Pattern>>> {
        let active: Vec<Pattern> = self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(|p| !p.deprecated)
            .collect();

        let mut assigned = vec![false; active.len()];
        let mut groups = Vec::new();

        for i in 0..active.len() {
            if assigned[i] {
                continue;
            }

            let mut group = vec![active[i].clone()];
            for j in (i + 1)..active.len() {
                if assigned[j] {
                    continue;
                }

                let similarity = self.similarity_or_degrade(&active[i], &active[j]);
                if similarity >= similarity_threshold {
                    debug!(
                        first = %active[i].name,
                        second = %active[j].name,
                        similarity,
                        "Duplicate candidate"
                    );
                    group.push(active[j].clone());
                    assigned[j] = true;
                }
            }

            if group.len() > 1 {
                assigned[i] = true;
                groups.push(group);
            }
        }

        info!(
            scanned = active.len(),
            groups = groups.len(),
            similarity_threshold,
            "Duplicate detection complete"
        );

        Ok(groups)
    }

    /// Fused similarity in [0, 1]. Embedding failures (e.g. dimension
    /// mismatch) are returned to the caller.
    pub async fn calculate_similarity(&self, p1: &Pattern, p2: &Pattern) -> Result<f64> {
        Ok(self.fused_similarity(p1, p2)?)
    }

    /// Pick the survivor of `group` according to `strategy`.
    pub fn suggest_merge(&self, group: &[Pattern], strategy: MergeStrategy) -> Result<MergeSuggestion> {
        if group.len() < 2 {
            return Err(PatternEngineError::validation("Need at least 2 patterns to merge"));
        }

        let (keep_index, reason) = match strategy {
            MergeStrategy::MostUsed => {
                let index = first_max_by_key(group, |p| p.times_instantiated);
                (
                    index,
                    format!("Kept most used pattern ({} uses)", group[index].times_instantiated),
                )
            }
            MergeStrategy::Oldest => match group.iter().position(|p| p.source_type.is_original()) {
                Some(index) => (
                    index,
                    format!("Kept original {} pattern", group[index].source_type),
                ),
                None => (0, "Kept first pattern, no original in group".to_string()),
            },
            MergeStrategy::Newest => {
                let index = first_max_by_key(group, |p| p.id);
                (index, format!("Kept newest pattern (id {})", group[index].id))
            }
        };

        let merge = group
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != keep_index)
            .map(|(_, p)| p.clone())
            .collect();

        Ok(MergeSuggestion {
            keep: group[keep_index].clone(),
            merge,
            reason,
        })
    }

    /// Fold `merge` into `keep`: usage is summed onto `keep`, which is saved
    /// first; each merged pattern is then deprecated and saved in order.
    pub async fn merge_patterns(&self, keep: &Pattern, merge: &[Pattern]) -> Result<Pattern> {
        for pattern in merge.iter().filter(|p| p.deprecated) {
            warn!(
                pattern = %pattern.name,
                "Merging a pattern that is already deprecated, its usage will be counted again"
            );
        }
        if keep.deprecated {
            warn!(pattern = %keep.name, "Kept pattern is deprecated");
        }

        let absorbed = merge
            .iter()
            .fold(0u64, |total, p| total.saturating_add(p.times_instantiated));

        let mut kept = keep.clone();
        kept.record_usage(absorbed);
        self.repository.save(&kept).await?;

        let reason = format!("Duplicate of {}", kept.name);
        for pattern in merge {
            let mut deprecated = pattern.clone();
            deprecated.deprecate(reason.clone(), kept.id);
            self.repository.save(&deprecated).await?;
        }

        info!(
            kept = %kept.name,
            merged = merge.len(),
            times_instantiated = kept.times_instantiated,
            "Merged duplicate patterns"
        );

        Ok(kept)
    }

    /// Find every duplicate group and suggest a merge for it; with
    /// `auto_merge` the suggestions are executed in order.
    pub async fn deduplicate(&self, options: &DeduplicationOptions) -> Result<DeduplicationReport> {
        let groups = self.find_duplicates(options.similarity_threshold).await?;

        let mut report = DeduplicationReport::default();
        for group in &groups {
            let suggestion = self.suggest_merge(group, options.strategy)?;
            if options.auto_merge {
                let kept = self.merge_patterns(&suggestion.keep, &suggestion.merge).await?;
                report.merged.push(kept);
            }
            report.suggestions.push(suggestion);
        }

        Ok(report)
    }

    fn fused_similarity(&self, p1: &Pattern, p2: &Pattern) -> std::result::Result<f64, EmbeddingError> {
        let cosine = match (p1.embedding.as_deref(), p2.embedding.as_deref()) {
            (Some(a), Some(b)) => Some(self.embeddings.cosine_similarity(a, b)?),
            _ => None,
        };
        Ok(similarity_from_signals(p1, p2, cosine))
    }

    fn similarity_or_degrade(&self, p1: &Pattern, p2: &Pattern) -> f64 {
        match self.fused_similarity(p1, p2) {
            Ok(similarity) => similarity,
            Err(e) => {
                warn!(
                    first = %p1.name,
                    second = %p2.name,
                    error = %e,
                    "Embedding comparison failed, scoring on name and category only"
                );
                similarity_from_signals(p1, p2, None)
            }
        }
    }
}

fn similarity_from_signals(p1: &Pattern, p2: &Pattern, cosine: Option<f64>) -> f64 {
    let category_match = if p1.category == p2.category { 1.0 } else { 0.0 };
    let signals = [
        Signal::from_option("embedding", cosine, EMBEDDING_WEIGHT),
        Signal::present("name", name_similarity(&p1.name, &p2.name), NAME_WEIGHT),
        Signal::present("category", category_match, CATEGORY_WEIGHT),
    ];
    weighted_average(&signals)
}

/// Index of the first element with the maximal key
fn first_max_by_key<K: Ord>(group: &[Pattern], key: impl Fn(&Pattern) -> K) -> usize {
    let mut best = 0;
    for (i, pattern) in group.iter().enumerate().skip(1) {
        if key(pattern) > key(&group[best]) {
            best = i;
        }
    }
    best
}
