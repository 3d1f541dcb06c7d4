//! Cached embedding service.
//!
//! Maps `(owner, kind, ref_id, text)` to a vector through a content-hash
//! cache so unchanged skill text never hits the provider twice. The cache
//! write is the only mutation the matching core performs on shared state;
//! concurrent misses for the same key may race last-write-wins, which is
//! harmless as long as the provider is deterministic for identical
//! (model, text) input — an accepted risk, not engineered around.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use barterly_core::{
    sha256_text, EmbeddingBackend, EmbeddingCacheEntry, EmbeddingCacheRepository, Error, ItemKind,
    Result, Vector,
};

/// One item in a batched cache-aware embedding request.
#[derive(Debug, Clone)]
pub struct CacheableText {
    pub owner_id: uuid::Uuid,
    pub kind: ItemKind,
    pub ref_id: String,
    pub text: String,
}

/// Embedding generation with content-hash caching.
pub struct EmbeddingService {
    cache: Arc<dyn EmbeddingCacheRepository>,
    provider: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingService {
    /// Create a service over the given cache store and provider.
    pub fn new(
        cache: Arc<dyn EmbeddingCacheRepository>,
        provider: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        info!(
            subsystem = "match",
            component = "embeddings",
            model = provider.model_name(),
            "EmbeddingService initialized"
        );
        Self { cache, provider }
    }

    /// The configured embedding model name.
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// The configured embedding dimension.
    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    /// Return the cached embedding for the key, or generate and cache one.
    ///
    /// A hit requires the stored model and text hash to match and the stored
    /// vector to be non-empty; anything else (absent, stale model, stale
    /// text) regenerates and overwrites in place, preserving `created_at`.
    /// Provider failures propagate — a missing embedding makes the candidate
    /// meaningless, so there is no zero-vector fallback. A failed cache
    /// write after a successful embed is logged and swallowed: losing the
    /// write costs a recompute later, not correctness now.
    pub async fn get_or_create(
        &self,
        owner_id: uuid::Uuid,
        kind: ItemKind,
        ref_id: &str,
        text: &str,
    ) -> Result<Vector> {
        let text_hash = sha256_text(text);

        // Read failures degrade to a miss; the store is allowed to be flaky
        // without blocking match computation.
        let cached = match self
            .cache
            .get_by_owner_kind_ref(owner_id, kind, ref_id)
            .await
        {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    subsystem = "match",
                    component = "embeddings",
                    op = "get_or_create",
                    item_kind = %kind,
                    ref_id = ref_id,
                    error = %e,
                    "Cache lookup failed, treating as miss"
                );
                None
            }
        };

        if let Some(ref entry) = cached {
            if entry.is_fresh(self.provider.model_name(), &text_hash) {
                debug!(
                    subsystem = "match",
                    component = "embeddings",
                    op = "get_or_create",
                    item_kind = %kind,
                    ref_id = ref_id,
                    cache_hit = true,
                    "Cache hit"
                );
                return Ok(entry.vector.clone());
            }
            debug!(
                subsystem = "match",
                component = "embeddings",
                op = "get_or_create",
                item_kind = %kind,
                ref_id = ref_id,
                cache_hit = false,
                "Cache miss (stale)"
            );
        } else {
            debug!(
                subsystem = "match",
                component = "embeddings",
                op = "get_or_create",
                item_kind = %kind,
                ref_id = ref_id,
                cache_hit = false,
                "Cache miss (not found)"
            );
        }

        let vectors = self.provider.embed_texts(&[text.to_string()]).await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("provider returned no vector".to_string()))?;

        let now = Utc::now();
        let entry = EmbeddingCacheEntry {
            owner_id,
            kind,
            ref_id: ref_id.to_string(),
            model: self.provider.model_name().to_string(),
            text_hash,
            dimension: vector.as_slice().len() as i32,
            vector: vector.clone(),
            created_at: cached.map(|c| c.created_at).unwrap_or(now),
            updated_at: now,
        };

        if let Err(e) = self.cache.upsert(entry).await {
            warn!(
                subsystem = "match",
                component = "embeddings",
                op = "get_or_create",
                item_kind = %kind,
                ref_id = ref_id,
                error = %e,
                "Cache write failed, returning computed vector anyway"
            );
        }

        Ok(vector)
    }

    /// Embed texts without caching. Useful for one-off comparisons.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.provider.embed_texts(texts).await
    }

    /// Batch variant of [`get_or_create`](Self::get_or_create).
    pub async fn embed_batch_with_cache(&self, items: &[CacheableText]) -> Result<Vec<Vector>> {
        let mut vectors = Vec::with_capacity(items.len());
        for item in items {
            vectors.push(
                self.get_or_create(item.owner_id, item.kind, &item.ref_id, &item.text)
                    .await?,
            );
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barterly_inference::mock::MockEmbeddingBackend;
    use uuid::Uuid;

    // Minimal in-crate cache double; the shared in-memory store lives in
    // barterly-db and is exercised by the integration tests.
    #[derive(Default)]
    struct TestCache {
        entries: std::sync::Mutex<
            std::collections::HashMap<(Uuid, ItemKind, String), EmbeddingCacheEntry>,
        >,
        fail_writes: std::sync::atomic::AtomicBool,
        fail_reads: std::sync::atomic::AtomicBool,
    }

    impl TestCache {
        fn entry(&self, owner: Uuid, kind: ItemKind, ref_id: &str) -> Option<EmbeddingCacheEntry> {
            self.entries
                .lock()
                .unwrap()
                .get(&(owner, kind, ref_id.to_string()))
                .cloned()
        }
    }

    #[async_trait::async_trait]
    impl EmbeddingCacheRepository for TestCache {
        async fn get_by_owner_kind_ref(
            &self,
            owner_id: Uuid,
            kind: ItemKind,
            ref_id: &str,
        ) -> Result<Option<EmbeddingCacheEntry>> {
            if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::Internal("read failure".to_string()));
            }
            Ok(self.entry(owner_id, kind, ref_id))
        }

        async fn upsert(&self, entry: EmbeddingCacheEntry) -> Result<()> {
            if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::Internal("write failure".to_string()));
            }
            self.entries
                .lock()
                .unwrap()
                .insert((entry.owner_id, entry.kind, entry.ref_id.clone()), entry);
            Ok(())
        }
    }

    fn service(cache: Arc<TestCache>, provider: MockEmbeddingBackend) -> EmbeddingService {
        EmbeddingService::new(cache, Arc::new(provider))
    }

    #[tokio::test]
    async fn second_identical_call_is_a_cache_hit() {
        let cache = Arc::new(TestCache::default());
        let provider = MockEmbeddingBackend::new(8);
        let svc = service(cache.clone(), provider.clone());
        let owner = Uuid::new_v4();

        let first = svc
            .get_or_create(owner, ItemKind::Need, "Rust", "Rust. Systems")
            .await
            .unwrap();
        let second = svc
            .get_or_create(owner, ItemKind::Need, "Rust", "Rust. Systems")
            .await
            .unwrap();

        assert_eq!(first.as_slice(), second.as_slice());
        assert_eq!(provider.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn formatting_only_change_still_hits() {
        let cache = Arc::new(TestCache::default());
        let provider = MockEmbeddingBackend::new(8);
        let svc = service(cache.clone(), provider.clone());
        let owner = Uuid::new_v4();

        svc.get_or_create(owner, ItemKind::Need, "Rust", "Rust.  Systems")
            .await
            .unwrap();
        svc.get_or_create(owner, ItemKind::Need, "Rust", " Rust. Systems ")
            .await
            .unwrap();

        assert_eq!(provider.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn changed_text_refetches_and_preserves_created_at() {
        let cache = Arc::new(TestCache::default());
        let provider = MockEmbeddingBackend::new(8);
        let svc = service(cache.clone(), provider.clone());
        let owner = Uuid::new_v4();

        svc.get_or_create(owner, ItemKind::Skill, "Rust", "Rust. Old text")
            .await
            .unwrap();
        let original = cache.entry(owner, ItemKind::Skill, "Rust").unwrap();

        svc.get_or_create(owner, ItemKind::Skill, "Rust", "Rust. New text")
            .await
            .unwrap();
        let updated = cache.entry(owner, ItemKind::Skill, "Rust").unwrap();

        assert_eq!(provider.embed_call_count(), 2);
        assert_ne!(original.text_hash, updated.text_hash);
        assert_eq!(original.created_at, updated.created_at);
        assert!(updated.updated_at >= original.updated_at);
    }

    #[tokio::test]
    async fn model_change_invalidates_entry() {
        let cache = Arc::new(TestCache::default());
        let owner = Uuid::new_v4();

        let first_provider = MockEmbeddingBackend::new(8).with_model_name("model-a");
        let svc = service(cache.clone(), first_provider.clone());
        svc.get_or_create(owner, ItemKind::Skill, "Rust", "Rust. ")
            .await
            .unwrap();

        let second_provider = MockEmbeddingBackend::new(8).with_model_name("model-b");
        let svc = service(cache.clone(), second_provider.clone());
        svc.get_or_create(owner, ItemKind::Skill, "Rust", "Rust. ")
            .await
            .unwrap();

        assert_eq!(second_provider.embed_call_count(), 1);
        let entry = cache.entry(owner, ItemKind::Skill, "Rust").unwrap();
        assert_eq!(entry.model, "model-b");
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let cache = Arc::new(TestCache::default());
        let svc = service(cache, MockEmbeddingBackend::new(8).failing());

        let result = svc
            .get_or_create(Uuid::new_v4(), ItemKind::Need, "Rust", "Rust. ")
            .await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn cache_write_failure_is_swallowed() {
        let cache = Arc::new(TestCache::default());
        cache
            .fail_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let provider = MockEmbeddingBackend::new(8);
        let svc = service(cache.clone(), provider.clone());

        let vector = svc
            .get_or_create(Uuid::new_v4(), ItemKind::Need, "Rust", "Rust. ")
            .await
            .unwrap();
        assert_eq!(vector.as_slice().len(), 8);

        // Nothing cached, so the next call recomputes.
        svc.get_or_create(Uuid::new_v4(), ItemKind::Need, "Rust", "Rust. ")
            .await
            .unwrap();
        assert_eq!(provider.embed_call_count(), 2);
    }

    #[tokio::test]
    async fn cache_read_failure_degrades_to_miss() {
        let cache = Arc::new(TestCache::default());
        cache
            .fail_reads
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let provider = MockEmbeddingBackend::new(8);
        let svc = service(cache, provider.clone());

        let vector = svc
            .get_or_create(Uuid::new_v4(), ItemKind::Need, "Rust", "Rust. ")
            .await
            .unwrap();
        assert_eq!(vector.as_slice().len(), 8);
        assert_eq!(provider.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn embed_batch_with_cache_shares_entries() {
        let cache = Arc::new(TestCache::default());
        let provider = MockEmbeddingBackend::new(8);
        let svc = service(cache, provider.clone());
        let owner = Uuid::new_v4();

        let items = vec![
            CacheableText {
                owner_id: owner,
                kind: ItemKind::Skill,
                ref_id: "Rust".to_string(),
                text: "Rust. ".to_string(),
            },
            CacheableText {
                owner_id: owner,
                kind: ItemKind::Skill,
                ref_id: "Go".to_string(),
                text: "Go. ".to_string(),
            },
            CacheableText {
                owner_id: owner,
                kind: ItemKind::Skill,
                ref_id: "Rust".to_string(),
                text: "Rust. ".to_string(),
            },
        ];

        let vectors = svc.embed_batch_with_cache(&items).await.unwrap();
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0].as_slice(), vectors[2].as_slice());
        // Third item hits the entry written by the first.
        assert_eq!(provider.embed_call_count(), 2);
    }
}
