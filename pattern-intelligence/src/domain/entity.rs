// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Entity descriptions handed to the matcher by upstream schema parsers.
//!
//! Wire shape:
//!
//! ```json
//! {
//!   "entity": "contact",
//!   "description": "Customer contact information",
//!   "fields": { "email": { "type": "text" } },
//!   "patterns": ["audit_trail"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type", default)]
    pub field_type: String,

    /// Anything else the parser attached (nullability, defaults, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FieldSpec {
    pub fn of_type(field_type: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDescription {
    #[serde(rename = "entity")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,

    /// Names of patterns already applied to this entity
    #[serde(rename = "patterns", default)]
    pub applied_patterns: Vec<String>,
}

impl EntityDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldSpec::of_type(field_type));
        self
    }

    pub fn with_applied_pattern(mut self, pattern_name: impl Into<String>) -> Self {
        self.applied_patterns.push(pattern_name.into());
        self
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Lowercased field names
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().map(|name| name.to_lowercase()).collect()
    }

    pub fn field_types(&self) -> BTreeSet<&str> {
        self.fields
            .values()
            .map(|spec| spec.field_type.as_str())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Description text when present and not blank.
    pub fn semantic_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn has_applied(&self, pattern_name: &str) -> bool {
        self.applied_patterns.iter().any(|name| name == pattern_name)
    }
}
