// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Pattern aggregate, entity descriptions, scoring primitives and the
//! interfaces the engine consumes.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Types and contracts shared by the matcher and deduplicator

pub mod pattern;
pub mod entity;
pub mod scoring;
pub mod repository;
pub mod embedding;

pub use pattern::*;
pub use entity::*;
pub use scoring::*;
pub use repository::*;
pub use embedding::*;
