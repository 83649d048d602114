// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pattern Intelligence
//!
//! Ranks the pattern library against an entity description and consolidates
//! duplicate patterns that pile up as libraries are imported and merged.
//!
//! # Architecture
//!
//! - **Layer:** Pattern Library Curation
//! - **Purpose:** Pattern matching (`PatternMatcher`) and duplicate
//!   detection/merging (`PatternDeduplicator`) over an injected
//!   `PatternRepository` and `EmbeddingProvider`.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod config;
pub mod error;

pub use domain::*;
pub use application::*;
pub use infrastructure::*;
pub use config::PatternEngineConfig;
pub use error::{PatternEngineError, Result};
