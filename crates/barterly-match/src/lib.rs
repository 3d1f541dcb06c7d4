//! # barterly-match
//!
//! Matching and cycle-detection engine for Barterly.
//!
//! This crate provides:
//! - The cached embedding service (content-hash cache over a pluggable
//!   embedding provider)
//! - Candidate retrieval over cached embeddings
//! - Judgment-based re-ranking with per-candidate failure isolation
//! - Reciprocity detection (mutually beneficial pairs)
//! - Three-way barter cycle detection over lexical compatibility
//!
//! The engine owns no long-lived state: it is a function of (requesting
//! user, current skill/embedding data) to (candidates, matches, cycles),
//! with the embedding cache as its only shared mutable collaborator.

pub mod barter;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod keywords;

// Re-export core types
pub use barterly_core::*;

pub use barter::BarterDetector;
pub use config::MatchConfig;
pub use embeddings::{CacheableText, EmbeddingService};
pub use engine::MatchEngine;
pub use keywords::{SynonymGroup, SynonymTable};
