//! Engine configuration.

use tracing::warn;

use barterly_core::defaults;

/// Tunables for candidate retrieval, re-ranking, and cycle detection.
///
/// Read from environment variables on construction via [`MatchConfig::from_env`]
/// (no restart coordination needed; each engine instance snapshots its own
/// config). The population cap and similarity floor are explicit quality/cost
/// trade-offs, not hidden constants.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Minimum embedding similarity for a pair to become a candidate.
    pub min_embedding_similarity: f32,
    /// Maximum active helpers considered per retrieval or cycle pass.
    pub active_pool_limit: i64,
    /// Default number of matches returned when the caller does not choose.
    pub default_top_k: usize,
    /// Candidate pool size as a multiple of top-k.
    pub candidate_pool_factor: usize,
    /// Hard cap on matches returned per request.
    pub max_matches: usize,
    /// Maximum declared skills per user considered by the engine.
    pub max_skills_per_user: usize,
    /// Maximum concurrent in-flight judgment calls during re-ranking.
    pub judgment_concurrency: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_embedding_similarity: defaults::MIN_EMBEDDING_SIMILARITY,
            active_pool_limit: defaults::ACTIVE_POOL_LIMIT,
            default_top_k: defaults::DEFAULT_TOP_K,
            candidate_pool_factor: defaults::CANDIDATE_POOL_FACTOR,
            max_matches: defaults::MAX_MATCHES_PER_REQUEST,
            max_skills_per_user: defaults::MAX_SKILLS_PER_USER,
            judgment_concurrency: defaults::JUDGMENT_CONCURRENCY,
        }
    }
}

impl MatchConfig {
    /// Load configuration from environment variables with fallback to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("BARTERLY_MIN_SIMILARITY") {
            if let Ok(v) = val.parse::<f32>() {
                config.min_embedding_similarity = v.clamp(-1.0, 1.0);
            } else {
                warn!(value = %val, "Invalid BARTERLY_MIN_SIMILARITY, using default");
            }
        }

        if let Ok(val) = std::env::var("BARTERLY_POOL_LIMIT") {
            if let Ok(v) = val.parse::<i64>() {
                config.active_pool_limit = v.max(1);
            } else {
                warn!(value = %val, "Invalid BARTERLY_POOL_LIMIT, using default");
            }
        }

        if let Ok(val) = std::env::var("BARTERLY_TOP_K") {
            if let Ok(v) = val.parse::<usize>() {
                config.default_top_k = v.clamp(1, config.max_matches);
            } else {
                warn!(value = %val, "Invalid BARTERLY_TOP_K, using default");
            }
        }

        if let Ok(val) = std::env::var("BARTERLY_JUDGMENT_CONCURRENCY") {
            if let Ok(v) = val.parse::<usize>() {
                config.judgment_concurrency = v.clamp(1, 32);
            } else {
                warn!(value = %val, "Invalid BARTERLY_JUDGMENT_CONCURRENCY, using default");
            }
        }

        config
    }

    /// Candidate pool size for a requested top-k.
    pub fn pool_size(&self, top_k: usize) -> usize {
        top_k.saturating_mul(self.candidate_pool_factor)
    }

    /// Requested top-k clamped to the per-request cap.
    pub fn effective_top_k(&self, top_k: usize) -> usize {
        top_k.clamp(1, self.max_matches)
    }
}
