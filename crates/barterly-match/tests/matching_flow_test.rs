//! End-to-end matching flow over in-memory stores and mock providers.

use std::sync::Arc;

use barterly_core::{
    EmbeddingCacheRepository, MatchRepository, MatchStatus, ProficiencyLevel, SkillDescriptor,
    User, UserDirectory,
};
use barterly_db::{InMemoryEmbeddingCache, InMemoryMatchStore, InMemoryUserDirectory};
use barterly_inference::mock::{MockEmbeddingBackend, MockGenerationBackend};
use barterly_inference::MatchJudge;
use barterly_match::{BarterDetector, EmbeddingService, MatchEngine};
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn skill(name: &str, level: Option<ProficiencyLevel>) -> SkillDescriptor {
    SkillDescriptor {
        proficiency_level: level,
        ..SkillDescriptor::named(name)
    }
}

fn add_user(
    directory: &InMemoryUserDirectory,
    name: &str,
    offered: Vec<SkillDescriptor>,
    needed: Vec<SkillDescriptor>,
) -> Uuid {
    let user = User::new(Uuid::new_v4(), name, offered, needed);
    let id = user.id;
    directory.insert(user);
    id
}

/// Embeddings pinned so equal skill texts are parallel, others orthogonal.
fn pinned_backend() -> MockEmbeddingBackend {
    MockEmbeddingBackend::new(3)
        .with_vector_for("React. ", vec![1.0, 0.0, 0.0])
        .with_vector_for("Python. ", vec![0.0, 1.0, 0.0])
        .with_vector_for("Cooking. ", vec![0.0, 0.0, 1.0])
}

struct TestHarness {
    directory: Arc<InMemoryUserDirectory>,
    cache: Arc<InMemoryEmbeddingCache>,
    embed: MockEmbeddingBackend,
    gen: MockGenerationBackend,
    engine: MatchEngine,
}

fn harness(gen: MockGenerationBackend) -> TestHarness {
    init_tracing();
    let directory = Arc::new(InMemoryUserDirectory::new());
    let cache = Arc::new(InMemoryEmbeddingCache::new());
    let embed = pinned_backend();

    let embeddings = EmbeddingService::new(
        cache.clone() as Arc<dyn EmbeddingCacheRepository>,
        Arc::new(embed.clone()),
    );
    let judge = MatchJudge::new(Arc::new(gen.clone()));
    let engine = MatchEngine::new(
        directory.clone() as Arc<dyn UserDirectory>,
        embeddings,
        judge,
    );

    TestHarness {
        directory,
        cache,
        embed,
        gen,
        engine,
    }
}

#[tokio::test]
async fn full_flow_with_judgment_reciprocity_and_persistence() {
    let gen = MockGenerationBackend::new().with_response(
        r#"{"adjusted_score": 0.85, "can_help": true, "confidence": 0.9,
            "reasoning": "expert helper with direct overlap",
            "explanation": "This helper teaches React at expert level.",
            "prerequisites_met": true, "skill_level_match": true}"#,
    );
    let h = harness(gen);

    let seeker = add_user(
        &h.directory,
        "seeker",
        vec![skill("Python", Some(ProficiencyLevel::Advanced))],
        vec![skill("React", Some(ProficiencyLevel::Beginner))],
    );
    let helper = add_user(
        &h.directory,
        "helper",
        vec![skill("React", Some(ProficiencyLevel::Expert))],
        vec![skill("Python", Some(ProficiencyLevel::Beginner))],
    );
    add_user(
        &h.directory,
        "bystander",
        vec![skill("Cooking", None)],
        vec![],
    );

    let matches = h
        .engine
        .find_matches_for_user(seeker, 10, true)
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(m.helper_id, helper);
    assert!((m.match_score - 0.85).abs() < 1e-6);
    assert!((m.confidence - 0.9).abs() < 1e-6);
    assert_eq!(m.skill_offered, "React");
    assert_eq!(m.skill_needed, "React");
    assert!(m.is_reciprocal);
    assert_eq!(m.metadata["reverse_match"]["user_offers"], "Python");
    assert_eq!(m.metadata["prerequisites_met"], true);
    assert_eq!(h.gen.generate_call_count(), 1);

    // The engine's output flows into persistence unchanged; the store owns
    // the status lifecycle from here.
    let store = InMemoryMatchStore::new();
    let stored = store.create_match(m).await.unwrap();
    assert_eq!(stored.status, MatchStatus::Pending);
    assert!(store
        .check_existing_match(seeker, helper)
        .await
        .unwrap()
        .is_some());
    let accepted = store
        .update_match_status(stored.id, MatchStatus::Accepted)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(accepted.status, MatchStatus::Accepted);
}

#[tokio::test]
async fn seeker_without_needs_makes_no_provider_calls() {
    let h = harness(MockGenerationBackend::new());

    let seeker = add_user(
        &h.directory,
        "seeker",
        vec![skill("Python", None)],
        vec![],
    );
    add_user(&h.directory, "helper", vec![skill("React", None)], vec![]);

    let matches = h
        .engine
        .find_matches_for_user(seeker, 10, true)
        .await
        .unwrap();

    assert!(matches.is_empty());
    assert_eq!(h.embed.embed_call_count(), 0);
    assert_eq!(h.gen.generate_call_count(), 0);
    assert_eq!(h.cache.entry_count(), 0);
}

#[tokio::test]
async fn repeated_runs_hit_the_embedding_cache() {
    let h = harness(MockGenerationBackend::new());

    let seeker = add_user(&h.directory, "seeker", vec![], vec![skill("React", None)]);
    add_user(&h.directory, "helper", vec![skill("React", None)], vec![]);

    h.engine
        .find_matches_for_user(seeker, 10, false)
        .await
        .unwrap();
    let first_run_calls = h.embed.embed_call_count();
    assert!(first_run_calls > 0);
    assert_eq!(h.cache.entry_count(), 2);

    h.engine
        .find_matches_for_user(seeker, 10, false)
        .await
        .unwrap();
    assert_eq!(h.embed.embed_call_count(), first_run_calls);
}

#[tokio::test]
async fn cycle_detection_is_embedding_free() {
    let h = harness(MockGenerationBackend::new());

    let alice = add_user(
        &h.directory,
        "alice",
        vec![skill("Guitar", None)],
        vec![skill("Spanish", None)],
    );
    add_user(
        &h.directory,
        "bob",
        vec![skill("Photography", None)],
        vec![skill("Guitar", None)],
    );
    add_user(
        &h.directory,
        "carol",
        vec![skill("Spanish", None)],
        vec![skill("Photography", None)],
    );

    let detector = BarterDetector::new(h.directory.clone() as Arc<dyn UserDirectory>);
    let cycles = detector.detect_three_way_cycles(alice).await.unwrap();

    assert!(!cycles.is_empty());
    assert_eq!(cycles[0].participants.len(), 3);
    assert!(cycles[0].involves(alice));
    assert!(cycles[0].explanation.contains("alice"));

    // The lexical detector never touches the embedding pipeline.
    assert_eq!(h.embed.embed_call_count(), 0);
    assert_eq!(h.cache.entry_count(), 0);
}
