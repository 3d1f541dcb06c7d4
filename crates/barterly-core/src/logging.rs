//! Structured logging schema and field name constants for Barterly.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, cache hits/misses |
//! | TRACE | Per-item iteration (per-candidate, per-skill scoring) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "match", "inference", "db", "similarity"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "retrieval", "rerank", "reciprocity", "barter", "openrouter"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "find_matches", "get_or_create", "analyze_match", "detect_cycles"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Seeker user id the operation runs for.
pub const USER_ID: &str = "user_id";

/// Helper user id on the other side of a pairing.
pub const HELPER_ID: &str = "helper_id";

/// Cache item kind ("skill" or "need").
pub const ITEM_KIND: &str = "item_kind";

/// Cache reference id (skill name).
pub const REF_ID: &str = "ref_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by an operation.
pub const RESULT_COUNT: &str = "result_count";

/// Number of candidates produced by retrieval.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Number of cycles produced by the detector.
pub const CYCLE_COUNT: &str = "cycle_count";

/// Number of input texts sent to an embedding model.
pub const INPUT_COUNT: &str = "input_count";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Similarity or match score.
pub const SCORE: &str = "score";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Whether the embedding cache served the request.
pub const CACHE_HIT: &str = "cache_hit";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
