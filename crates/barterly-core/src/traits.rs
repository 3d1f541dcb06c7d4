//! Core traits for Barterly abstractions.
//!
//! These traits define the seams between the matching core and its external
//! collaborators (user directory, embedding cache store, match persistence,
//! inference providers), enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// USER DIRECTORY
// =============================================================================

/// Read access to the user/skill directory.
///
/// Profile CRUD lives outside the matching core; this is the lookup surface
/// the core needs for retrieval, reciprocity, and cycle detection.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a single user by id. `None` if unknown.
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// List active users, optionally excluding one id (the seeker).
    async fn get_active_users(&self, limit: i64, exclude: Option<Uuid>) -> Result<Vec<User>>;

    /// Batch fetch by ids. Unknown ids are silently skipped.
    async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>>;
}

// =============================================================================
// EMBEDDING CACHE STORE
// =============================================================================

/// Storage for cached embeddings keyed by `(owner_id, kind, ref_id)`.
///
/// `upsert` must be atomic per key; concurrent writers for the same key may
/// race last-write-wins (any writer's value is equally valid because the
/// vector is a deterministic function of model and text).
#[async_trait]
pub trait EmbeddingCacheRepository: Send + Sync {
    /// Look up a cache entry by its composite key.
    async fn get_by_owner_kind_ref(
        &self,
        owner_id: Uuid,
        kind: ItemKind,
        ref_id: &str,
    ) -> Result<Option<EmbeddingCacheEntry>>;

    /// Insert or replace the entry with the same composite key.
    async fn upsert(&self, entry: EmbeddingCacheEntry) -> Result<()>;
}

// =============================================================================
// MATCH PERSISTENCE
// =============================================================================

/// Storage for ranked matches.
///
/// The matching core creates matches; status transitions are driven by user
/// action through the outer layers.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Persist a new match with `pending` status.
    async fn create_match(&self, result: &MatchResult) -> Result<StoredMatch>;

    /// Find a non-rejected match between the two users, if any.
    async fn check_existing_match(
        &self,
        seeker_id: Uuid,
        helper_id: Uuid,
    ) -> Result<Option<StoredMatch>>;

    /// Update a match's status. `None` if the match is unknown.
    async fn update_match_status(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<StoredMatch>>;

    /// List matches where the user is the seeker, newest first.
    async fn get_matches_for_user(
        &self,
        user_id: Uuid,
        status: Option<MatchStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredMatch>>;
}

// =============================================================================
// INFERENCE
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns one vector per input text, in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
