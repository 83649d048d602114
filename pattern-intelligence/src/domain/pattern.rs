// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identity. Stores hand these out monotonically, which is
/// what lets the `newest` merge strategy treat a larger id as more recent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PatternId(pub i64);

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a pattern came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Shipped with the library
    Builtin,
    /// Authored by hand in this project
    Manual,
    /// Pulled in from another project's library
    Imported,
    /// Carried over by a migration
    Migrated,
    /// Suggested by a model and accepted
    Generated,
}

impl SourceType {
    /// Built-in and hand-authored patterns are the originals that imports
    /// tend to duplicate.
    pub fn is_original(&self) -> bool {
        matches!(self, SourceType::Builtin | SourceType::Manual)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Builtin => "builtin",
            SourceType::Manual => "manual",
            SourceType::Imported => "imported",
            SourceType::Migrated => "migrated",
            SourceType::Generated => "generated",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key in `parameters` under which a pattern declares the field types it expects.
pub const FIELD_TYPES_PARAMETER: &str = "field_types";

/// A reusable, named design solution from the pattern library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Descriptive only, never executed here
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub times_instantiated: u64,
    pub source_type: SourceType,
    pub complexity_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_pattern_id: Option<PatternId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    pub fn new(
        id: PatternId,
        name: impl Into<String>,
        category: impl Into<String>,
        source_type: SourceType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            category: category.into(),
            description: String::new(),
            parameters: serde_json::Map::new(),
            implementation: String::new(),
            times_instantiated: 0,
            source_type,
            complexity_score: 1,
            embedding: None,
            deprecated: false,
            deprecated_reason: None,
            replacement_pattern_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = implementation.into();
        self
    }

    pub fn with_times_instantiated(mut self, times: u64) -> Self {
        self.times_instantiated = times;
        self
    }

    pub fn with_complexity(mut self, score: u32) -> Self {
        self.complexity_score = score;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_field_types<I, S>(self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let types: Vec<serde_json::Value> = types
            .into_iter()
            .map(|t| serde_json::Value::String(t.into()))
            .collect();
        self.with_parameter(FIELD_TYPES_PARAMETER, serde_json::Value::Array(types))
    }

    /// Field types declared under `parameters.field_types`, if any.
    ///
    /// Non-string entries are ignored; an empty or missing list means the
    /// pattern declares nothing.
    pub fn expected_field_types(&self) -> Option<Vec<String>> {
        let types: Vec<String> = self
            .parameters
            .get(FIELD_TYPES_PARAMETER)?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        if types.is_empty() {
            None
        } else {
            Some(types)
        }
    }

    /// Soft-deprecate in favour of `replacement`. The only way a pattern
    /// gains a replacement pointer.
    pub fn deprecate(&mut self, reason: impl Into<String>, replacement: PatternId) {
        self.deprecated = true;
        self.deprecated_reason = Some(reason.into());
        self.replacement_pattern_id = Some(replacement);
        self.updated_at = Utc::now();
    }

    pub fn record_usage(&mut self, additional: u64) {
        self.times_instantiated = self.times_instantiated.saturating_add(additional);
        self.updated_at = Utc::now();
    }

    /// Text fed to the embedding provider when (re)computing this
    /// pattern's embedding.
    pub fn embedding_text(&self) -> String {
        let mut components: Vec<&str> = vec![self.name.as_str()];
        if !self.description.is_empty() {
            components.push(&self.description);
        }
        if !self.implementation.is_empty() {
            components.push(&self.implementation);
        }

        let mut text = components.join(" ");
        if !self.category.is_empty() {
            text.push_str(" category: ");
            text.push_str(&self.category);
        }
        text
    }
}
