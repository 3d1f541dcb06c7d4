//! Core data model for the Barterly matching engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

// =============================================================================
// PROFICIENCY
// =============================================================================

/// Skill proficiency level, ordered from beginner to expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ProficiencyLevel {
    /// Numeric score for gap arithmetic (1..=4).
    pub fn as_numeric(&self) -> i32 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
            Self::Expert => 4,
        }
    }
}

impl std::fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
            Self::Expert => write!(f, "expert"),
        }
    }
}

impl std::str::FromStr for ProficiencyLevel {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            _ => Err(format!("Invalid proficiency level: {}", s)),
        }
    }
}

/// Numeric score for an optional proficiency level.
///
/// Undeclared levels count as intermediate so that a missing field neither
/// blocks nor inflates a pairing.
pub fn proficiency_numeric(level: Option<ProficiencyLevel>) -> i32 {
    level.map(|l| l.as_numeric()).unwrap_or(2)
}

/// Proficiency gap between helper and seeker.
///
/// Positive means the helper is more proficient (good for teaching).
pub fn proficiency_gap(helper: Option<ProficiencyLevel>, seeker: Option<ProficiencyLevel>) -> i32 {
    proficiency_numeric(helper) - proficiency_numeric(seeker)
}

/// A helper is sufficiently proficient iff the gap is non-negative.
pub fn is_sufficient_proficiency(
    helper: Option<ProficiencyLevel>,
    seeker: Option<ProficiencyLevel>,
) -> bool {
    proficiency_gap(helper, seeker) >= 0
}

// =============================================================================
// SKILLS
// =============================================================================

/// One skill a person offers or needs. Immutable value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub proficiency_level: Option<ProficiencyLevel>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SkillDescriptor {
    /// Create a descriptor with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: None,
            proficiency_level: None,
            tags: Vec::new(),
        }
    }

    /// Source text for embedding generation: name plus optional description.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.name, self.description.as_deref().unwrap_or(""))
    }
}

/// Which side of the exchange a cached embedding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A skill someone offers.
    Skill,
    /// A skill someone wants help with.
    Need,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skill => write!(f, "skill"),
            Self::Need => write!(f, "need"),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skill" => Ok(Self::Skill),
            "need" => Ok(Self::Need),
            _ => Err(format!("Invalid item kind: {}", s)),
        }
    }
}

// =============================================================================
// USERS
// =============================================================================

/// A platform user as the matching core sees one.
///
/// Authentication, profile details, and account lifecycle live in the outer
/// layers; the core only needs identity, activity, and the two skill lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub skills_offered: Vec<SkillDescriptor>,
    #[serde(default)]
    pub skills_needed: Vec<SkillDescriptor>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build an active user with the given skills. Timestamps are set to now.
    pub fn new(
        id: Uuid,
        username: impl Into<String>,
        skills_offered: Vec<SkillDescriptor>,
        skills_needed: Vec<SkillDescriptor>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: username.into(),
            skills_offered,
            skills_needed,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// EMBEDDING CACHE
// =============================================================================

/// A cached embedding, keyed by `(owner_id, kind, ref_id)`.
///
/// An entry is reusable only while both the model and the content hash still
/// match the current configuration and source text; anything else is stale
/// and must be regenerated in place (same key, `created_at` preserved).
#[derive(Debug, Clone)]
pub struct EmbeddingCacheEntry {
    pub owner_id: Uuid,
    pub kind: ItemKind,
    pub ref_id: String,
    pub model: String,
    pub text_hash: String,
    pub dimension: i32,
    pub vector: Vector,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmbeddingCacheEntry {
    /// True iff this entry can be served for the given model and text hash.
    pub fn is_fresh(&self, model: &str, text_hash: &str) -> bool {
        self.model == model && self.text_hash == text_hash && !self.vector.as_slice().is_empty()
    }
}

// =============================================================================
// MATCHING
// =============================================================================

/// A candidate pairing produced by embedding-based retrieval. Ephemeral.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub seeker_id: Uuid,
    pub helper_id: Uuid,
    /// The helper's offered skill that matched.
    pub skill_offered: SkillDescriptor,
    /// The seeker's need that matched.
    pub skill_needed: SkillDescriptor,
    /// Cosine similarity between need and skill embeddings, in [-1, 1].
    pub embedding_score: f32,
}

impl MatchCandidate {
    /// The helper's declared proficiency in the matched skill.
    pub fn helper_proficiency(&self) -> Option<ProficiencyLevel> {
        self.skill_offered.proficiency_level
    }

    /// The seeker's current level in the needed skill.
    pub fn seeker_level(&self) -> Option<ProficiencyLevel> {
        self.skill_needed.proficiency_level
    }
}

/// Structured verdict from the judgment adapter for one candidate pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchAnalysis {
    /// Final match score in [0, 1], baselined on the embedding score.
    pub adjusted_score: f32,
    /// The deciding flag: candidates where this is false are discarded.
    pub can_help: bool,
    /// Verdict confidence in [0, 1].
    pub confidence: f32,
    /// Brief internal reasoning from the evaluator.
    pub reasoning: String,
    /// User-facing explanation of the pairing.
    pub explanation: String,
    #[serde(default = "default_true")]
    pub prerequisites_met: bool,
    #[serde(default = "default_true")]
    pub skill_level_match: bool,
}

fn default_true() -> bool {
    true
}

impl MatchAnalysis {
    /// Clamp both scores to [0, 1].
    pub fn clamped(mut self) -> Self {
        self.adjusted_score = self.adjusted_score.clamp(0.0, 1.0);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

/// A ranked match between a seeker's need and a helper's skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub seeker_id: Uuid,
    pub helper_id: Uuid,
    pub skill_offered: String,
    pub skill_needed: String,
    /// Final score in [0, 1].
    pub match_score: f32,
    /// Confidence in [0, 1].
    pub confidence: f32,
    pub explanation: String,
    pub is_reciprocal: bool,
    #[serde(default)]
    pub metadata: JsonValue,
}

/// Status of a persisted match, owned by user action in the outer layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            _ => Err(format!("Invalid match status: {}", s)),
        }
    }
}

/// A match as persisted by the match repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMatch {
    pub id: Uuid,
    pub seeker_id: Uuid,
    pub helper_id: Uuid,
    pub skill_offered: String,
    pub skill_needed: String,
    pub match_score: f32,
    pub confidence: f32,
    pub explanation: String,
    pub is_reciprocal: bool,
    pub metadata: JsonValue,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// BARTER CYCLES
// =============================================================================

/// One leg of a barter cycle: `from` teaches `skill` to `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub skill: String,
}

/// A detected three-party exchange cycle. Ephemeral — recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarterCycle {
    /// Participant user ids in cycle order.
    pub participants: Vec<Uuid>,
    pub exchanges: Vec<Exchange>,
    /// Balance metric in [0, 1].
    pub fairness_score: f32,
    pub explanation: String,
}

impl BarterCycle {
    /// True iff the given user takes part in this cycle.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proficiency_ordering() {
        assert!(ProficiencyLevel::Beginner < ProficiencyLevel::Intermediate);
        assert!(ProficiencyLevel::Intermediate < ProficiencyLevel::Advanced);
        assert!(ProficiencyLevel::Advanced < ProficiencyLevel::Expert);
    }

    #[test]
    fn proficiency_numeric_values() {
        assert_eq!(ProficiencyLevel::Beginner.as_numeric(), 1);
        assert_eq!(ProficiencyLevel::Expert.as_numeric(), 4);
        assert_eq!(proficiency_numeric(None), 2);
        assert_eq!(proficiency_numeric(Some(ProficiencyLevel::Advanced)), 3);
    }

    #[test]
    fn proficiency_gap_and_sufficiency() {
        use ProficiencyLevel::*;
        assert_eq!(proficiency_gap(Some(Expert), Some(Beginner)), 3);
        assert_eq!(proficiency_gap(Some(Beginner), Some(Expert)), -3);
        assert!(is_sufficient_proficiency(Some(Advanced), Some(Advanced)));
        assert!(is_sufficient_proficiency(Some(Expert), Some(Intermediate)));
        assert!(!is_sufficient_proficiency(Some(Beginner), Some(Advanced)));
        // Both undeclared: counts as intermediate vs intermediate.
        assert!(is_sufficient_proficiency(None, None));
    }

    #[test]
    fn proficiency_serde_roundtrip() {
        let json = serde_json::to_string(&ProficiencyLevel::Advanced).unwrap();
        assert_eq!(json, "\"advanced\"");
        let parsed: ProficiencyLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ProficiencyLevel::Advanced);
    }

    #[test]
    fn proficiency_from_str() {
        assert_eq!(
            "EXPERT".parse::<ProficiencyLevel>().unwrap(),
            ProficiencyLevel::Expert
        );
        assert!("guru".parse::<ProficiencyLevel>().is_err());
    }

    #[test]
    fn skill_embedding_text_includes_description() {
        let skill = SkillDescriptor {
            name: "Rust".to_string(),
            description: Some("Systems programming".to_string()),
            ..SkillDescriptor::named("Rust")
        };
        assert_eq!(skill.embedding_text(), "Rust. Systems programming");
    }

    #[test]
    fn skill_embedding_text_without_description() {
        let skill = SkillDescriptor::named("Rust");
        assert_eq!(skill.embedding_text(), "Rust. ");
    }

    #[test]
    fn item_kind_display_and_parse() {
        assert_eq!(ItemKind::Skill.to_string(), "skill");
        assert_eq!(ItemKind::Need.to_string(), "need");
        assert_eq!("need".parse::<ItemKind>().unwrap(), ItemKind::Need);
        assert!("offer".parse::<ItemKind>().is_err());
    }

    #[test]
    fn cache_entry_freshness() {
        let entry = EmbeddingCacheEntry {
            owner_id: Uuid::new_v4(),
            kind: ItemKind::Need,
            ref_id: "Rust".to_string(),
            model: "test-model".to_string(),
            text_hash: "sha256:abc".to_string(),
            dimension: 3,
            vector: Vector::from(vec![1.0, 2.0, 3.0]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(entry.is_fresh("test-model", "sha256:abc"));
        assert!(!entry.is_fresh("other-model", "sha256:abc"));
        assert!(!entry.is_fresh("test-model", "sha256:def"));
    }

    #[test]
    fn cache_entry_with_empty_vector_is_stale() {
        let entry = EmbeddingCacheEntry {
            owner_id: Uuid::new_v4(),
            kind: ItemKind::Skill,
            ref_id: "Rust".to_string(),
            model: "test-model".to_string(),
            text_hash: "sha256:abc".to_string(),
            dimension: 0,
            vector: Vector::from(Vec::<f32>::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(!entry.is_fresh("test-model", "sha256:abc"));
    }

    #[test]
    fn match_candidate_proficiency_accessors() {
        let candidate = MatchCandidate {
            seeker_id: Uuid::new_v4(),
            helper_id: Uuid::new_v4(),
            skill_offered: SkillDescriptor {
                proficiency_level: Some(ProficiencyLevel::Expert),
                ..SkillDescriptor::named("Rust")
            },
            skill_needed: SkillDescriptor {
                proficiency_level: Some(ProficiencyLevel::Beginner),
                ..SkillDescriptor::named("Rust")
            },
            embedding_score: 0.9,
        };

        assert_eq!(
            candidate.helper_proficiency(),
            Some(ProficiencyLevel::Expert)
        );
        assert_eq!(candidate.seeker_level(), Some(ProficiencyLevel::Beginner));
    }

    #[test]
    fn match_analysis_clamped() {
        let analysis = MatchAnalysis {
            adjusted_score: 1.7,
            can_help: true,
            confidence: -0.2,
            reasoning: "r".to_string(),
            explanation: "e".to_string(),
            prerequisites_met: true,
            skill_level_match: true,
        }
        .clamped();

        assert_eq!(analysis.adjusted_score, 1.0);
        assert_eq!(analysis.confidence, 0.0);
    }

    #[test]
    fn match_analysis_optional_bools_default_true() {
        let json = r#"{
            "adjusted_score": 0.8,
            "can_help": true,
            "confidence": 0.9,
            "reasoning": "strong overlap",
            "explanation": "good match"
        }"#;
        let analysis: MatchAnalysis = serde_json::from_str(json).unwrap();
        assert!(analysis.prerequisites_met);
        assert!(analysis.skill_level_match);
    }

    #[test]
    fn match_analysis_missing_required_field_fails() {
        // No "explanation" field.
        let json = r#"{
            "adjusted_score": 0.8,
            "can_help": true,
            "confidence": 0.9,
            "reasoning": "strong overlap"
        }"#;
        assert!(serde_json::from_str::<MatchAnalysis>(json).is_err());
    }

    #[test]
    fn match_status_display_and_parse() {
        assert_eq!(MatchStatus::Pending.to_string(), "pending");
        assert_eq!(
            "accepted".parse::<MatchStatus>().unwrap(),
            MatchStatus::Accepted
        );
        assert_eq!(MatchStatus::default(), MatchStatus::Pending);
        assert!("open".parse::<MatchStatus>().is_err());
    }

    #[test]
    fn barter_cycle_involves() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let cycle = BarterCycle {
            participants: vec![a, b, c],
            exchanges: vec![],
            fairness_score: 0.85,
            explanation: String::new(),
        };

        assert!(cycle.involves(b));
        assert!(!cycle.involves(Uuid::new_v4()));
    }

    #[test]
    fn user_new_is_active() {
        let user = User::new(Uuid::new_v4(), "alice", vec![], vec![]);
        assert!(user.is_active);
        assert_eq!(user.username, "alice");
        assert_eq!(user.created_at, user.updated_at);
    }
}
