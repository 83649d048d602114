// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for pattern matching through the public API.
//!
//! Covers ranking, filtering and the confidence range over a small library
//! seeded the way a fresh node would see it, plus the semantic path after
//! an embedding backfill.

use aegis_pattern_intelligence::{
    build_embedding_provider, EmbeddingBackfill, EntityDescription, InMemoryPatternRepository,
    MatchOptions, Pattern, PatternEngineConfig, PatternId, PatternMatcher, PatternRepository,
    SourceType,
};
use serde_json::json;
use std::sync::Arc;

fn seed_library() -> Vec<Pattern> {
    vec![
        Pattern::new(PatternId(1), "email_validation", "validation", SourceType::Builtin)
            .with_description("Validates email address format")
            .with_field_types(["text", "email"])
            .with_times_instantiated(15),
        Pattern::new(PatternId(2), "audit_trail", "audit", SourceType::Builtin)
            .with_description("Tracks created_by and updated_by on every change")
            .with_times_instantiated(45),
        Pattern::new(PatternId(3), "soft_delete", "lifecycle", SourceType::Manual)
            .with_description("Marks rows deleted instead of removing them")
            .with_times_instantiated(32),
    ]
}

async fn matcher_for(patterns: Vec<Pattern>) -> (PatternMatcher, Arc<InMemoryPatternRepository>) {
    let repo = Arc::new(InMemoryPatternRepository::with_patterns(patterns).await.unwrap());
    let embeddings = build_embedding_provider(&PatternEngineConfig::default().embedding);
    (PatternMatcher::new(repo.clone(), embeddings), repo)
}

fn contact() -> EntityDescription {
    EntityDescription::from_json(json!({
        "entity": "Contact",
        "description": "A customer contact with email",
        "fields": {
            "email": {"type": "email"},
            "name": {"type": "text"}
        },
        "patterns": []
    }))
    .unwrap()
}

#[tokio::test]
async fn test_email_entity_matches_email_validation() {
    let (matcher, _) = matcher_for(seed_library()).await;
    let matches = matcher
        .find_applicable_patterns(&contact(), &MatchOptions::default())
        .await
        .unwrap();

    let email = matches
        .iter()
        .find(|m| m.pattern.name == "email_validation")
        .expect("email_validation should be suggested");
    assert!(email.confidence > 0.5);
}

#[tokio::test]
async fn test_results_sorted_and_bounded() {
    let (matcher, _) = matcher_for(seed_library()).await;
    let options = MatchOptions {
        min_confidence: 0.0,
        ..Default::default()
    };
    let matches = matcher.find_applicable_patterns(&contact(), &options).await.unwrap();

    assert_eq!(matches.len(), 3);
    for pair in matches.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
    for m in &matches {
        assert!((0.0..=1.0).contains(&m.confidence));
    }

    let limited = MatchOptions { limit: 1, ..options };
    let top = matcher.find_applicable_patterns(&contact(), &limited).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].pattern.name, matches[0].pattern.name);
}

#[tokio::test]
async fn test_applied_and_deprecated_patterns_excluded() {
    let (matcher, repo) = matcher_for(seed_library()).await;

    let mut soft_delete = repo.find_by_name("soft_delete").await.unwrap().unwrap();
    soft_delete.deprecate("Duplicate of audit_trail", PatternId(2));
    repo.save(&soft_delete).await.unwrap();

    let entity = contact().with_applied_pattern("email_validation");
    let options = MatchOptions {
        min_confidence: 0.0,
        ..Default::default()
    };
    let names: Vec<String> = matcher
        .find_applicable_patterns(&entity, &options)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.pattern.name)
        .collect();
    assert_eq!(names, vec!["audit_trail".to_string()]);

    let include_applied = MatchOptions {
        exclude_applied: false,
        ..options
    };
    let matches = matcher.find_applicable_patterns(&entity, &include_applied).await.unwrap();
    assert!(matches.iter().any(|m| m.pattern.name == "email_validation"));
    assert!(matches.iter().all(|m| m.pattern.name != "soft_delete"));
}

#[tokio::test]
async fn test_empty_library() {
    let (matcher, _) = matcher_for(vec![]).await;
    let matches = matcher
        .find_applicable_patterns(&contact(), &MatchOptions::default())
        .await
        .unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn test_semantic_matching_after_backfill() {
    let patterns = vec![
        Pattern::new(PatternId(1), "currency_format", "display", SourceType::Manual)
            .with_description("formats money amounts"),
        Pattern::new(PatternId(2), "audit_trail", "audit", SourceType::Manual)
            .with_description("records every change to the row"),
    ];
    let (matcher, repo) = matcher_for(patterns).await;

    let embeddings = build_embedding_provider(&PatternEngineConfig::default().embedding);
    let report = EmbeddingBackfill::new(repo.clone(), embeddings)
        .backfill_embeddings()
        .await
        .unwrap();
    assert_eq!(report.updated, 2);

    let entity = EntityDescription::new("Ledger").with_description("records every change to the row");
    let options = MatchOptions {
        min_confidence: 0.0,
        use_semantic: true,
        ..Default::default()
    };
    let matches = matcher.find_applicable_patterns(&entity, &options).await.unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].pattern.name, "audit_trail");
    assert!(matches[0].confidence > matches[1].confidence);

    // without the semantic signal both fall back to popularity alone
    let plain = MatchOptions {
        use_semantic: false,
        ..options
    };
    let matches = matcher.find_applicable_patterns(&entity, &plain).await.unwrap();
    assert_eq!(matches[0].pattern.name, "currency_format");
    assert!((matches[0].confidence - 0.3).abs() < 1e-9);
}
