// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer: store and embedding adapters

pub mod pattern_store;
pub mod embedding_client;

pub use pattern_store::InMemoryPatternRepository;
pub use embedding_client::{
    build_embedding_provider, HashEmbeddingProvider, OllamaEmbeddingProvider,
    DEFAULT_EMBEDDING_DIMENSION,
};
