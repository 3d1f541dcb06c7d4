//! # barterly-inference
//!
//! Inference provider backends for the Barterly matching engine.
//!
//! This crate provides:
//! - The OpenRouter backend (OpenAI-compatible) implementing both the
//!   embedding and the generation capability
//! - The match judgment adapter: structured pairing verdicts with strict
//!   response validation and a deterministic fallback
//! - Deterministic mock backends for testing (feature `mock`)
//!
//! Backends are plain values implementing the `barterly-core` traits;
//! construct them once at process start and inject them by handle — there is
//! no global provider state.

pub mod judgment;
pub mod openrouter;

// Mock backends for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use barterly_core::*;

pub use judgment::{
    build_analysis_prompt, fallback_analysis, parse_analysis, JudgmentRequest, MatchJudge,
    JUDGE_SYSTEM_PROMPT,
};
pub use openrouter::{embedding_dimension_for, OpenRouterBackend, OpenRouterConfig};
