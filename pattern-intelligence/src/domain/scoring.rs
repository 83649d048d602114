// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Signal fusion and similarity primitives shared by the matcher and the
//! deduplicator.
//!
//! A [`Signal`] whose preconditions did not hold is *absent*, not zero:
//! [`weighted_average`] drops it from both numerator and denominator.

use once_cell::sync::Lazy;
use regex::Regex;

use super::embedding::EmbeddingError;

/// Boundary between a lowercase/digit and an uppercase letter (camelCase)
static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Fragments shorter than this carry no keyword value ("id", "at", ...).
pub const MIN_FRAGMENT_LEN: usize = 3;

/// Popularity floor for a pattern nobody has used yet.
pub const BASE_POPULARITY: f64 = 0.3;

/// One weighted input to a fused score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub name: &'static str,
    pub score: Option<f64>,
    pub weight: f64,
}

impl Signal {
    /// Includable signal; `score` is clamped to [0, 1].
    pub fn present(name: &'static str, score: f64, weight: f64) -> Self {
        Self {
            name,
            score: Some(score.clamp(0.0, 1.0)),
            weight,
        }
    }

    pub fn absent(name: &'static str, weight: f64) -> Self {
        Self {
            name,
            score: None,
            weight,
        }
    }

    /// Present only when `score` is strictly positive.
    pub fn when_positive(name: &'static str, score: f64, weight: f64) -> Self {
        if score > 0.0 {
            Self::present(name, score, weight)
        } else {
            Self::absent(name, weight)
        }
    }

    pub fn from_option(name: &'static str, score: Option<f64>, weight: f64) -> Self {
        match score {
            Some(score) => Self::present(name, score, weight),
            None => Self::absent(name, weight),
        }
    }

    pub fn is_present(&self) -> bool {
        self.score.is_some()
    }
}

/// Weighted mean over present signals; 0.0 when none are present.
pub fn weighted_average(signals: &[Signal]) -> f64 {
    let (weighted_sum, total_weight) = signals
        .iter()
        .filter_map(|s| s.score.map(|score| (score * s.weight, s.weight)))
        .fold((0.0, 0.0), |(sum, total), (ws, w)| (sum + ws, total + w));

    if total_weight <= 0.0 {
        return 0.0;
    }

    (weighted_sum / total_weight).clamp(0.0, 1.0)
}

/// Cosine similarity in [-1, 1]. Zero-magnitude vectors score 0.0.
/// Vectors holding NaN or infinite components are rejected.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    if !a.iter().chain(b.iter()).all(|x| x.is_finite()) {
        return Err(EmbeddingError::InvalidResponse(
            "embedding contains non-finite values".to_string(),
        ));
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let magnitude_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let magnitude_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot_product / (magnitude_a * magnitude_b);
    if !similarity.is_finite() {
        return Err(EmbeddingError::InvalidResponse(
            "cosine similarity is not finite".to_string(),
        ));
    }

    Ok(similarity.clamp(-1.0, 1.0))
}

/// Map a cosine similarity from [-1, 1] onto [0, 1].
pub fn rescale_cosine(similarity: f64) -> f64 {
    ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Compressive usage curve: 0.3 for unused patterns, then
/// 0.3 + log10(n + 1) / 2.5, capped at 1.0.
pub fn popularity_score(times_instantiated: u64) -> f64 {
    if times_instantiated == 0 {
        return BASE_POPULARITY;
    }

    let boost = ((times_instantiated as f64) + 1.0).log10() / 2.5;
    (BASE_POPULARITY + boost).min(1.0)
}

/// 1 - levenshtein / max_len over characters.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let distance = strsim::levenshtein(a, b);
    let max_len = len_a.max(len_b);
    (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Lowercase keyword fragments of a pattern name, split on underscores,
/// punctuation, whitespace and camelCase humps.
pub fn name_fragments(name: &str) -> Vec<String> {
    let separated = CAMEL_BOUNDARY.replace_all(name, "${1}_${2}");

    NON_ALPHANUMERIC
        .split(&separated)
        .filter(|fragment| fragment.chars().count() >= MIN_FRAGMENT_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Fraction of `fragments` contained in at least one of `field_names`.
/// `field_names` must already be lowercased.
pub fn keyword_coverage(fragments: &[String], field_names: &[String]) -> f64 {
    if fragments.is_empty() {
        return 0.0;
    }

    let matched = fragments
        .iter()
        .filter(|fragment| field_names.iter().any(|field| field.contains(fragment.as_str())))
        .count();

    (matched as f64 / fragments.len() as f64).min(1.0)
}
