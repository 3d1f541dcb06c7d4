//! Hybrid matching engine: embedding retrieval, judgment re-ranking, and
//! reciprocity.
//!
//! Phase 1 retrieves candidates by cosine similarity over cached embeddings,
//! phase 2 optionally re-ranks them through the judgment adapter, phase 3
//! flags reciprocal pairings. Reciprocity is informational only — it never
//! adjusts scores; revisiting that is a product decision, not a code one.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use serde_json::json;
use tracing::{debug, info, trace};
use uuid::Uuid;

use barterly_core::{
    defaults, ItemKind, MatchCandidate, MatchResult, Result, User, UserDirectory,
};
use barterly_inference::{JudgmentRequest, MatchJudge};
use barterly_similarity::cosine_similarity;

use crate::config::MatchConfig;
use crate::embeddings::EmbeddingService;
use crate::keywords::SynonymTable;

/// The matching engine.
///
/// Holds its collaborators by handle; construct once at process start and
/// share. No global state.
pub struct MatchEngine {
    directory: Arc<dyn UserDirectory>,
    embeddings: EmbeddingService,
    judge: MatchJudge,
    synonyms: SynonymTable,
    config: MatchConfig,
}

impl MatchEngine {
    /// Create an engine with default configuration and built-in synonyms.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        embeddings: EmbeddingService,
        judge: MatchJudge,
    ) -> Self {
        Self {
            directory,
            embeddings,
            judge,
            synonyms: SynonymTable::default(),
            config: MatchConfig::default(),
        }
    }

    /// Replace the engine configuration.
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the synonym table.
    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Find ranked matches for a user's declared needs.
    ///
    /// An unknown user or a user with no needs yields an empty list — a
    /// valid state, not an error — without touching any provider.
    pub async fn find_matches_for_user(
        &self,
        user_id: Uuid,
        top_k: usize,
        use_llm: bool,
    ) -> Result<Vec<MatchResult>> {
        let start = Instant::now();
        let top_k = self.config.effective_top_k(top_k);

        let Some(user) = self.directory.get_user_by_id(user_id).await? else {
            info!(
                subsystem = "match",
                component = "engine",
                op = "find_matches",
                user_id = %user_id,
                "User not found, returning no matches"
            );
            return Ok(Vec::new());
        };

        if user.skills_needed.is_empty() {
            info!(
                subsystem = "match",
                component = "engine",
                op = "find_matches",
                user_id = %user_id,
                "User has no declared needs"
            );
            return Ok(Vec::new());
        }

        let candidates = self
            .retrieve_candidates(&user, self.config.pool_size(top_k))
            .await?;

        if candidates.is_empty() {
            info!(
                subsystem = "match",
                component = "engine",
                op = "find_matches",
                user_id = %user_id,
                "No candidates above similarity floor"
            );
            return Ok(Vec::new());
        }

        let mut matches = if use_llm {
            self.rerank_with_judgment(&user, candidates, top_k).await?
        } else {
            self.convert_candidates(candidates, top_k)
        };

        self.check_reciprocity(&user, &mut matches).await?;

        info!(
            subsystem = "match",
            component = "engine",
            op = "find_matches",
            user_id = %user_id,
            result_count = matches.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Match computation complete"
        );
        Ok(matches)
    }

    /// Phase 1: embedding-based candidate retrieval.
    ///
    /// For every need of the seeker and every offered skill of every active
    /// helper, score the pair by cosine similarity and keep it iff the score
    /// clears the configured floor. Sorted descending (stable), truncated to
    /// `pool_size`. Cubic in the worst case; acceptable under the configured
    /// population cap.
    pub async fn retrieve_candidates(
        &self,
        seeker: &User,
        pool_size: usize,
    ) -> Result<Vec<MatchCandidate>> {
        debug!(
            subsystem = "match",
            component = "retrieval",
            op = "retrieve_candidates",
            user_id = %seeker.id,
            "Retrieving candidates"
        );

        let helpers = self
            .directory
            .get_active_users(self.config.active_pool_limit, Some(seeker.id))
            .await?;

        if helpers.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();

        for need in seeker
            .skills_needed
            .iter()
            .take(self.config.max_skills_per_user)
        {
            let need_vector = self
                .embeddings
                .get_or_create(seeker.id, ItemKind::Need, &need.name, &need.embedding_text())
                .await?;

            for helper in &helpers {
                if helper.skills_offered.is_empty() {
                    continue;
                }

                for skill in helper
                    .skills_offered
                    .iter()
                    .take(self.config.max_skills_per_user)
                {
                    let skill_vector = self
                        .embeddings
                        .get_or_create(
                            helper.id,
                            ItemKind::Skill,
                            &skill.name,
                            &skill.embedding_text(),
                        )
                        .await?;

                    let similarity =
                        cosine_similarity(need_vector.as_slice(), skill_vector.as_slice())?;

                    trace!(
                        subsystem = "match",
                        component = "retrieval",
                        helper_id = %helper.id,
                        ref_id = %skill.name,
                        score = similarity,
                        "Scored pair"
                    );

                    if similarity >= self.config.min_embedding_similarity {
                        candidates.push(MatchCandidate {
                            seeker_id: seeker.id,
                            helper_id: helper.id,
                            skill_offered: skill.clone(),
                            skill_needed: need.clone(),
                            embedding_score: similarity,
                        });
                    }
                }
            }
        }

        // Stable sort: equal scores keep discovery order for reproducibility.
        candidates.sort_by(|a, b| {
            b.embedding_score
                .partial_cmp(&a.embedding_score)
                .unwrap_or(Ordering::Equal)
        });
        candidates.truncate(pool_size);

        debug!(
            subsystem = "match",
            component = "retrieval",
            op = "retrieve_candidates",
            user_id = %seeker.id,
            candidate_count = candidates.len(),
            "Retrieved candidates"
        );
        Ok(candidates)
    }

    /// Phase 2 (no-LLM path): map candidates straight to results.
    fn convert_candidates(
        &self,
        candidates: Vec<MatchCandidate>,
        top_k: usize,
    ) -> Vec<MatchResult> {
        candidates
            .into_iter()
            .take(top_k)
            .map(|candidate| {
                let explanation = format!(
                    "Based on semantic similarity, this helper's skills in {} align with \
                     your need for {}.",
                    candidate.skill_offered.name, candidate.skill_needed.name
                );
                let metadata = json!({
                    "helper_proficiency": candidate.helper_proficiency(),
                    "seeker_level": candidate.seeker_level(),
                    "embedding_score": candidate.embedding_score,
                });
                MatchResult {
                    seeker_id: candidate.seeker_id,
                    helper_id: candidate.helper_id,
                    skill_offered: candidate.skill_offered.name,
                    skill_needed: candidate.skill_needed.name,
                    match_score: candidate.embedding_score,
                    confidence: defaults::EMBEDDING_ONLY_CONFIDENCE,
                    explanation,
                    is_reciprocal: false,
                    metadata,
                }
            })
            .collect()
    }

    /// Phase 2 (LLM path): judge every candidate, drop the ones the judge
    /// says cannot help, re-sort by adjusted score.
    ///
    /// Judgment calls run concurrently up to the configured cap, preserving
    /// input order. The adapter is infallible by contract (provider and
    /// parse failures already degrade to the embedding-based verdict inside
    /// it), so one bad candidate can never abort the batch.
    async fn rerank_with_judgment(
        &self,
        seeker: &User,
        candidates: Vec<MatchCandidate>,
        top_k: usize,
    ) -> Result<Vec<MatchResult>> {
        debug!(
            subsystem = "match",
            component = "rerank",
            op = "rerank",
            user_id = %seeker.id,
            candidate_count = candidates.len(),
            "Re-ranking with judgment adapter"
        );

        // Full helper profiles give the judge richer context than the single
        // matched skill.
        let mut helper_ids: Vec<Uuid> = candidates.iter().map(|c| c.helper_id).collect();
        helper_ids.sort();
        helper_ids.dedup();
        let helpers: HashMap<Uuid, User> = self
            .directory
            .get_users_by_ids(&helper_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let judged: Vec<Option<MatchResult>> =
            futures::stream::iter(candidates.into_iter().map(|candidate| {
                let helper = helpers.get(&candidate.helper_id).cloned();
                self.judge_candidate(candidate, helper)
            }))
            .buffered(self.config.judgment_concurrency)
            .collect()
            .await;

        let mut matches: Vec<MatchResult> = judged.into_iter().flatten().collect();
        matches.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(Ordering::Equal)
        });
        matches.truncate(top_k);

        debug!(
            subsystem = "match",
            component = "rerank",
            op = "rerank",
            user_id = %seeker.id,
            result_count = matches.len(),
            "Re-ranking complete"
        );
        Ok(matches)
    }

    /// Judge one candidate. `None` when the verdict says the helper cannot
    /// help.
    async fn judge_candidate(
        &self,
        candidate: MatchCandidate,
        helper: Option<User>,
    ) -> Option<MatchResult> {
        let helper_skills = match &helper {
            Some(helper) => helper
                .skills_offered
                .iter()
                .map(|s| match s.proficiency_level {
                    Some(level) => format!("{} ({})", s.name, level),
                    None => s.name.clone(),
                })
                .collect(),
            None => vec![candidate.skill_offered.name.clone()],
        };

        let request = JudgmentRequest {
            seeker_need: format!(
                "{}: {}",
                candidate.skill_needed.name,
                candidate.skill_needed.description.as_deref().unwrap_or("")
            ),
            helper_skills,
            seeker_context: json!({
                "need_level": candidate.seeker_level(),
                "need_description": candidate.skill_needed.description,
            }),
            helper_context: json!({
                "skill_level": candidate.helper_proficiency(),
                "skill_description": candidate.skill_offered.description,
            }),
            embedding_score: candidate.embedding_score,
        };

        let analysis = self.judge.analyze_match(&request).await;

        if !analysis.can_help {
            trace!(
                subsystem = "match",
                component = "rerank",
                helper_id = %candidate.helper_id,
                "Judge rejected candidate"
            );
            return None;
        }

        let metadata = json!({
            "helper_proficiency": candidate.helper_proficiency(),
            "seeker_level": candidate.seeker_level(),
            "embedding_score": candidate.embedding_score,
            "llm_reasoning": analysis.reasoning,
            "prerequisites_met": analysis.prerequisites_met,
            "skill_level_match": analysis.skill_level_match,
        });

        Some(MatchResult {
            seeker_id: candidate.seeker_id,
            helper_id: candidate.helper_id,
            skill_offered: candidate.skill_offered.name,
            skill_needed: candidate.skill_needed.name,
            match_score: analysis.adjusted_score,
            confidence: analysis.confidence,
            explanation: analysis.explanation,
            is_reciprocal: false,
            metadata,
        })
    }

    /// Phase 3: flag mutually beneficial pairings in place.
    ///
    /// A match is reciprocal iff some need of the helper and some offered
    /// skill of the seeker are lexically compatible. Sets `is_reciprocal`
    /// and `metadata.reverse_match`; scores are untouched.
    pub async fn check_reciprocity(
        &self,
        seeker: &User,
        matches: &mut [MatchResult],
    ) -> Result<()> {
        if seeker.skills_offered.is_empty() {
            return Ok(());
        }

        for m in matches.iter_mut() {
            let Some(helper) = self.directory.get_user_by_id(m.helper_id).await? else {
                continue;
            };
            if helper.skills_needed.is_empty() {
                continue;
            }

            let reverse = helper.skills_needed.iter().find_map(|helper_need| {
                seeker.skills_offered.iter().find_map(|user_skill| {
                    self.synonyms
                        .compatible(&helper_need.name, &user_skill.name)
                        .then(|| (helper_need.clone(), user_skill.clone()))
                })
            });

            if let Some((helper_need, user_skill)) = reverse {
                m.is_reciprocal = true;
                let info = json!({
                    "helper_needs": helper_need.name,
                    "helper_needs_description": helper_need.description,
                    "user_offers": user_skill.name,
                    "user_offers_description": user_skill.description,
                    "helper_proficiency": helper_need.proficiency_level,
                    "user_proficiency": user_skill.proficiency_level,
                });
                match m.metadata.as_object_mut() {
                    Some(obj) => {
                        obj.insert("reverse_match".to_string(), info);
                    }
                    None => {
                        m.metadata = json!({ "reverse_match": info });
                    }
                }
                info!(
                    subsystem = "match",
                    component = "reciprocity",
                    user_id = %seeker.id,
                    helper_id = %helper.id,
                    "Reciprocal match found"
                );
            }
        }

        Ok(())
    }
}
