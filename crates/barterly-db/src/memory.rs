//! In-memory repository implementations.
//!
//! Back the same traits as the PostgreSQL repositories, for tests and for
//! embedded/demo deployments that do not need durability. Behavior mirrors
//! the database versions where it matters: active-user ordering, rejected
//! matches excluded from the existing-match check, and `created_at`
//! preserved across cache upserts for the same key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use barterly_core::{
    EmbeddingCacheEntry, EmbeddingCacheRepository, Error, ItemKind, MatchRepository, MatchResult,
    MatchStatus, Result, StoredMatch, User, UserDirectory,
};

// =============================================================================
// USER DIRECTORY
// =============================================================================

/// In-memory [`UserDirectory`].
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// True when no users are stored.
    pub fn is_empty(&self) -> bool {
        self.users.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn get_active_users(&self, limit: i64, exclude: Option<Uuid>) -> Result<Vec<User>> {
        let users = self.users.lock().unwrap();
        let mut active: Vec<User> = users
            .values()
            .filter(|u| u.is_active && Some(u.id) != exclude)
            .cloned()
            .collect();
        // Deterministic order matching the database version.
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        active.truncate(limit.max(0) as usize);
        Ok(active)
    }

    async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

// =============================================================================
// EMBEDDING CACHE
// =============================================================================

type CacheKey = (Uuid, ItemKind, String);

/// In-memory [`EmbeddingCacheRepository`].
#[derive(Default)]
pub struct InMemoryEmbeddingCache {
    entries: Mutex<HashMap<CacheKey, EmbeddingCacheEntry>>,
    fail_writes: AtomicBool,
}

impl InMemoryEmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Fetch an entry synchronously (test helper).
    pub fn entry(&self, owner_id: Uuid, kind: ItemKind, ref_id: &str) -> Option<EmbeddingCacheEntry> {
        self.entries
            .lock()
            .unwrap()
            .get(&(owner_id, kind, ref_id.to_string()))
            .cloned()
    }

    /// Make subsequent writes fail, to exercise write-failure handling.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingCacheRepository for InMemoryEmbeddingCache {
    async fn get_by_owner_kind_ref(
        &self,
        owner_id: Uuid,
        kind: ItemKind,
        ref_id: &str,
    ) -> Result<Option<EmbeddingCacheEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&(owner_id, kind, ref_id.to_string()))
            .cloned())
    }

    async fn upsert(&self, mut entry: EmbeddingCacheEntry) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("cache store unavailable".to_string()));
        }

        let key = (entry.owner_id, entry.kind, entry.ref_id.clone());
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(&key) {
            entry.created_at = existing.created_at;
        }
        entries.insert(key, entry);
        Ok(())
    }
}

// =============================================================================
// MATCH STORE
// =============================================================================

/// In-memory [`MatchRepository`].
#[derive(Default)]
pub struct InMemoryMatchStore {
    matches: Mutex<Vec<StoredMatch>>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matches.
    pub fn len(&self) -> usize {
        self.matches.lock().unwrap().len()
    }

    /// True when no matches are stored.
    pub fn is_empty(&self) -> bool {
        self.matches.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchStore {
    async fn create_match(&self, result: &MatchResult) -> Result<StoredMatch> {
        let now = Utc::now();
        let stored = StoredMatch {
            id: Uuid::new_v4(),
            seeker_id: result.seeker_id,
            helper_id: result.helper_id,
            skill_offered: result.skill_offered.clone(),
            skill_needed: result.skill_needed.clone(),
            match_score: result.match_score,
            confidence: result.confidence,
            explanation: result.explanation.clone(),
            is_reciprocal: result.is_reciprocal,
            metadata: result.metadata.clone(),
            status: MatchStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.matches.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn check_existing_match(
        &self,
        seeker_id: Uuid,
        helper_id: Uuid,
    ) -> Result<Option<StoredMatch>> {
        Ok(self
            .matches
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                m.seeker_id == seeker_id
                    && m.helper_id == helper_id
                    && m.status != MatchStatus::Rejected
            })
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn update_match_status(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<StoredMatch>> {
        let mut matches = self.matches.lock().unwrap();
        match matches.iter_mut().find(|m| m.id == match_id) {
            Some(m) => {
                m.status = status;
                m.updated_at = Utc::now();
                Ok(Some(m.clone()))
            }
            None => Ok(None),
        }
    }

    async fn get_matches_for_user(
        &self,
        user_id: Uuid,
        status: Option<MatchStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredMatch>> {
        let matches = self.matches.lock().unwrap();
        let mut found: Vec<StoredMatch> = matches
            .iter()
            .filter(|m| m.seeker_id == user_id && status.map(|s| m.status == s).unwrap_or(true))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}
