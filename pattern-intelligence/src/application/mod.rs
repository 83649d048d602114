// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application services: matching, deduplication and embedding backfill

pub mod pattern_matcher;
pub mod pattern_deduplicator;
pub mod embedding_backfill;

pub use pattern_matcher::{MatchOptions, PatternMatch, PatternMatcher};
pub use pattern_deduplicator::{
    DeduplicationOptions, DeduplicationReport, MergeStrategy, MergeSuggestion, PatternDeduplicator,
};
pub use embedding_backfill::{BackfillReport, EmbeddingBackfill};
