//! Centralized default constants for the Barterly matching engine.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// INFERENCE PROVIDERS
// =============================================================================

/// Default OpenRouter base URL (OpenAI-compatible API).
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

/// Default embedding model slug.
pub const EMBED_MODEL: &str = "openai/text-embedding-3-small";

/// Default embedding vector dimension for text-embedding-3-small.
pub const EMBED_DIMENSION: usize = 1536;

/// Default generation model slug for match judgment.
pub const GEN_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// Sampling temperature for judgment calls. Low for consistent scoring.
pub const GEN_TEMPERATURE: f32 = 0.3;

/// Maximum tokens in a judgment response.
pub const GEN_MAX_TOKENS: u32 = 1000;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Timeout for judgment generation requests in seconds.
pub const JUDGMENT_TIMEOUT_SECS: u64 = 30;

/// Timeout for free-text explanation requests in seconds.
pub const EXPLANATION_TIMEOUT_SECS: u64 = 20;

// =============================================================================
// MATCHING THRESHOLDS
// =============================================================================

/// Minimum embedding similarity for a pair to become a candidate.
pub const MIN_EMBEDDING_SIMILARITY: f32 = 0.4;

/// Minimum final score to consider a pairing a match at all.
pub const MIN_MATCH_SCORE: f32 = 0.3;

/// Score considered high confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.8;

/// `can_help` cutoff used by the judgment fallback verdict.
pub const FALLBACK_CAN_HELP_THRESHOLD: f32 = 0.4;

/// Confidence reported by the judgment fallback verdict.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Confidence reported for embedding-only (no-LLM) matches.
pub const EMBEDDING_ONLY_CONFIDENCE: f32 = 0.7;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Active-helper pool cap for candidate retrieval and cycle detection.
///
/// Exhaustive pairwise comparison is the documented algorithm; this bound is
/// what keeps it tractable. Configurable, not a hidden constant.
pub const ACTIVE_POOL_LIMIT: i64 = 200;

/// Default number of matches returned to the caller.
pub const DEFAULT_TOP_K: usize = 10;

/// Candidate pool size as a multiple of top-k.
pub const CANDIDATE_POOL_FACTOR: usize = 2;

/// Hard cap on matches returned per request.
pub const MAX_MATCHES_PER_REQUEST: usize = 20;

/// Hard cap on declared skills per user considered by the engine.
pub const MAX_SKILLS_PER_USER: usize = 50;

/// Maximum concurrent in-flight judgment calls during re-ranking.
pub const JUDGMENT_CONCURRENCY: usize = 4;

// =============================================================================
// BARTER CYCLES
// =============================================================================

/// Fairness score assigned to every detected cycle.
///
/// Placeholder, not a real computation: genuine fairness scoring (e.g.
/// proficiency-gap symmetry across the three legs) is a known gap.
pub const CYCLE_FAIRNESS_PLACEHOLDER: f32 = 0.85;

/// Minimum fairness score for a cycle to be proposed to users.
pub const MIN_FAIRNESS_SCORE: f32 = 0.6;

/// Maximum participants in any exchange cycle.
pub const MAX_CYCLE_PARTICIPANTS: usize = 5;
