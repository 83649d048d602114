// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for duplicate detection and merging.
//!
//! Exercises the full consolidation flow over an in-memory store: detect,
//! suggest, merge, and check that usage is conserved and merged patterns
//! point at the survivor.

use aegis_pattern_intelligence::{
    DeduplicationOptions, EmbeddingBackfill, HashEmbeddingProvider, InMemoryPatternRepository,
    MergeStrategy, Pattern, PatternDeduplicator, PatternId, PatternRepository, SourceType,
};
use std::sync::Arc;

fn imported_library() -> Vec<Pattern> {
    vec![
        Pattern::new(PatternId(1), "soft_delete", "lifecycle", SourceType::Builtin)
            .with_description("Marks rows deleted instead of removing them")
            .with_times_instantiated(12),
        Pattern::new(PatternId(2), "currency_format", "display", SourceType::Manual)
            .with_description("Formats money amounts")
            .with_times_instantiated(4),
        Pattern::new(PatternId(3), "soft_delete_v2", "lifecycle", SourceType::Imported)
            .with_description("Marks rows deleted instead of removing them")
            .with_times_instantiated(30),
        Pattern::new(PatternId(4), "soft_deletes", "lifecycle", SourceType::Migrated)
            .with_description("Marks rows deleted instead of removing them")
            .with_times_instantiated(3),
    ]
}

async fn embedded_store(patterns: Vec<Pattern>) -> (PatternDeduplicator, Arc<InMemoryPatternRepository>) {
    let repo = Arc::new(InMemoryPatternRepository::with_patterns(patterns).await.unwrap());

    let embeddings = Arc::new(HashEmbeddingProvider::default());
    EmbeddingBackfill::new(repo.clone(), embeddings.clone())
        .backfill_embeddings()
        .await
        .unwrap();

    (PatternDeduplicator::new(repo.clone(), embeddings), repo)
}

async fn total_usage(repo: &InMemoryPatternRepository) -> u64 {
    repo.find_all().await.unwrap().iter().map(|p| p.times_instantiated).sum()
}

#[tokio::test]
async fn test_detects_imported_copies() {
    let (dedup, _) = embedded_store(imported_library()).await;
    let groups = dedup.find_duplicates(0.8).await.unwrap();

    assert_eq!(groups.len(), 1);
    let ids: Vec<PatternId> = groups[0].iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![PatternId(1), PatternId(3), PatternId(4)]);
    for group in &groups {
        assert!(group.len() >= 2);
        assert!(group.iter().all(|p| !p.deprecated));
    }
}

#[tokio::test]
async fn test_similarity_is_bounded_and_symmetric() {
    let (dedup, repo) = embedded_store(imported_library()).await;
    let patterns = repo.find_all().await.unwrap();

    for a in &patterns {
        for b in &patterns {
            let ab = dedup.calculate_similarity(a, b).await.unwrap();
            let ba = dedup.calculate_similarity(b, a).await.unwrap();
            assert!((0.0..=1.0).contains(&ab));
            assert!((ab - ba).abs() < 1e-9);
        }
    }
}

#[tokio::test]
async fn test_merge_conserves_total_usage() {
    let (dedup, repo) = embedded_store(imported_library()).await;
    let before = total_usage(&repo).await;

    let groups = dedup.find_duplicates(0.8).await.unwrap();
    let suggestion = dedup.suggest_merge(&groups[0], MergeStrategy::MostUsed).unwrap();
    assert_eq!(suggestion.keep.id, PatternId(3));
    assert_eq!(suggestion.reason, "Kept most used pattern (30 uses)");

    let kept = dedup.merge_patterns(&suggestion.keep, &suggestion.merge).await.unwrap();
    assert_eq!(kept.times_instantiated, 12 + 30 + 3);

    // active usage equals the pre-merge total of the group members
    let active: u64 = repo
        .find_all()
        .await
        .unwrap()
        .iter()
        .filter(|p| !p.deprecated)
        .map(|p| p.times_instantiated)
        .sum();
    assert_eq!(active, before);

    for merged in &suggestion.merge {
        let stored = repo.find_by_id(merged.id).await.unwrap().unwrap();
        assert!(stored.deprecated);
        assert_eq!(stored.replacement_pattern_id, Some(kept.id));
        assert!(stored.deprecated_reason.unwrap().starts_with("Duplicate of "));
    }
}

#[tokio::test]
async fn test_auto_merge_keeps_original() {
    let (dedup, repo) = embedded_store(imported_library()).await;
    let options = DeduplicationOptions {
        similarity_threshold: 0.8,
        strategy: MergeStrategy::Oldest,
        auto_merge: true,
    };

    let report = dedup.deduplicate(&options).await.unwrap();
    assert_eq!(report.suggestions.len(), 1);
    assert_eq!(report.suggestions[0].keep.id, PatternId(1));
    assert_eq!(report.suggestions[0].reason, "Kept original builtin pattern");
    assert_eq!(report.merged[0].times_instantiated, 45);

    let builtin = repo.find_by_id(PatternId(1)).await.unwrap().unwrap();
    assert!(!builtin.deprecated);
    assert_eq!(builtin.times_instantiated, 45);

    // a second pass finds nothing to do
    let again = dedup.deduplicate(&options).await.unwrap();
    assert!(again.suggestions.is_empty());
}

#[tokio::test]
async fn test_unknown_strategy_name_is_rejected() {
    let err = "largest".parse::<MergeStrategy>().unwrap_err();
    assert!(err.is_validation());
}
