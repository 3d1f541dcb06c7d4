//! Match judgment adapter: structured pairing verdicts from an LLM.
//!
//! The judge turns one candidate pairing into a [`MatchAnalysis`] verdict.
//! The provider response is treated as near-free text: fencing is stripped,
//! the remainder is parsed as JSON, and five fields are mandatory. Any
//! provider or parse failure degrades to a deterministic embedding-based
//! fallback — this adapter never errors, so one bad candidate cannot abort
//! a ranking batch.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use barterly_core::{defaults, GenerationBackend, MatchAnalysis, Result};

/// System message for judgment calls.
pub const JUDGE_SYSTEM_PROMPT: &str = "You are a helpful assistant that evaluates skill matches \
for peer learning. Always respond with valid JSON only.";

/// One candidate pairing to be judged.
#[derive(Debug, Clone)]
pub struct JudgmentRequest {
    /// What the seeker needs help with, as "name: description".
    pub seeker_need: String,
    /// The helper's full offered-skill list (richer context than the single
    /// matched skill).
    pub helper_skills: Vec<String>,
    /// Additional seeker context (need level, description).
    pub seeker_context: JsonValue,
    /// Additional helper context (skill level, description).
    pub helper_context: JsonValue,
    /// Baseline similarity score from the embedding phase.
    pub embedding_score: f32,
}

/// Judgment adapter over a pluggable generation backend.
pub struct MatchJudge {
    backend: Arc<dyn GenerationBackend>,
}

impl MatchJudge {
    /// Create a judge over the given backend.
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Model name of the underlying backend.
    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Judge whether a helper can assist with a seeker's need.
    ///
    /// Infallible by contract: provider failures, timeouts, and malformed
    /// responses all resolve to [`fallback_analysis`].
    pub async fn analyze_match(&self, req: &JudgmentRequest) -> MatchAnalysis {
        let prompt = build_analysis_prompt(req);

        let content = match self
            .backend
            .generate_with_system(JUDGE_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "judgment",
                    op = "analyze_match",
                    error = %e,
                    "Judgment call failed, using embedding fallback"
                );
                return fallback_analysis(req.embedding_score);
            }
        };

        match parse_analysis(&content) {
            Ok(analysis) => {
                debug!(
                    subsystem = "inference",
                    component = "judgment",
                    op = "analyze_match",
                    score = analysis.adjusted_score,
                    can_help = analysis.can_help,
                    "Judgment verdict parsed"
                );
                analysis
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "judgment",
                    op = "analyze_match",
                    error = %e,
                    response_len = content.len(),
                    "Unparseable judgment response, using embedding fallback"
                );
                fallback_analysis(req.embedding_score)
            }
        }
    }

    /// Generate a user-facing explanation for a match.
    ///
    /// Falls back to a templated explanation on any provider failure.
    pub async fn explain_match(
        &self,
        seeker_need: &str,
        helper_skill: &str,
        match_score: f32,
        is_reciprocal: bool,
    ) -> String {
        let prompt = build_explanation_prompt(seeker_need, helper_skill, match_score, is_reciprocal);

        match self.backend.generate(&prompt).await {
            Ok(explanation) => explanation.trim().to_string(),
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "judgment",
                    op = "explain_match",
                    error = %e,
                    "Explanation call failed, using template"
                );
                fallback_explanation(seeker_need, helper_skill, is_reciprocal)
            }
        }
    }
}

/// Build the structured judgment prompt for one candidate pairing.
pub fn build_analysis_prompt(req: &JudgmentRequest) -> String {
    let skills_text = req
        .helper_skills
        .iter()
        .map(|s| format!("  - {}", s))
        .collect::<Vec<_>>()
        .join("\n");

    let seeker_context = context_text(&req.seeker_context);
    let helper_context = context_text(&req.helper_context);

    format!(
        r#"Analyze if this helper can assist with the seeker's learning need.

SEEKER'S NEED:
{seeker_need}

HELPER'S SKILLS:
{skills_text}

EMBEDDING SIMILARITY: {embedding_score:.3}

SEEKER CONTEXT:
{seeker_context}

HELPER CONTEXT:
{helper_context}

Evaluate this match and respond with ONLY a JSON object (no markdown, no extra text):

{{
  "adjusted_score": <float 0.0-1.0>,
  "can_help": <boolean>,
  "confidence": <float 0.0-1.0>,
  "reasoning": "<brief explanation of your evaluation>",
  "explanation": "<2-3 sentence explanation for the user about why this is a good/bad match>",
  "prerequisites_met": <boolean>,
  "skill_level_match": <boolean>
}}

Consider:
- Skill relevance and overlap
- Proficiency levels (helper should be equal or higher)
- Prerequisites and dependencies
- Specificity of need vs breadth of skills
- Practical applicability

Adjusted score should:
- Start with embedding similarity as baseline
- Increase (+0.1 to +0.3) if strong contextual match
- Decrease (-0.1 to -0.3) if prerequisites missing or skill level mismatch
- Stay between 0.0 and 1.0
"#,
        seeker_need = req.seeker_need,
        skills_text = skills_text,
        embedding_score = req.embedding_score,
        seeker_context = seeker_context,
        helper_context = helper_context,
    )
}

fn context_text(context: &JsonValue) -> String {
    if context.is_null() || context.as_object().map(|o| o.is_empty()).unwrap_or(false) {
        "No additional context".to_string()
    } else {
        serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string())
    }
}

fn build_explanation_prompt(
    seeker_need: &str,
    helper_skill: &str,
    match_score: f32,
    is_reciprocal: bool,
) -> String {
    let reciprocal_text = if is_reciprocal {
        " This is a reciprocal match - you can help each other!"
    } else {
        ""
    };

    format!(
        r#"Generate a friendly, concise explanation (2-3 sentences) for why this skill match is relevant.

LEARNER NEEDS: {seeker_need}
HELPER OFFERS: {helper_skill}
MATCH SCORE: {match_score:.2}
{reciprocal_text}

Write a clear, encouraging explanation for the learner. Focus on practical value.
Respond with ONLY the explanation text, no JSON, no extra formatting.
"#
    )
}

/// Parse a judgment response into a verdict.
///
/// Strips surrounding markdown fencing, parses the remainder as JSON, and
/// requires `adjusted_score`, `can_help`, `confidence`, `reasoning`, and
/// `explanation` — missing any one is a hard parse failure. Scores are
/// clamped to [0, 1]; the two boolean qualifiers default to true.
pub fn parse_analysis(content: &str) -> Result<MatchAnalysis> {
    let stripped = strip_code_fences(content);
    let analysis: MatchAnalysis = serde_json::from_str(stripped)?;
    Ok(analysis.clamped())
}

fn strip_code_fences(content: &str) -> &str {
    let mut s = content.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

/// Deterministic verdict used when the provider fails or returns garbage.
pub fn fallback_analysis(embedding_score: f32) -> MatchAnalysis {
    MatchAnalysis {
        adjusted_score: embedding_score,
        can_help: embedding_score > defaults::FALLBACK_CAN_HELP_THRESHOLD,
        confidence: defaults::FALLBACK_CONFIDENCE,
        reasoning: "LLM analysis failed, using embedding score only".to_string(),
        explanation: "This match is based on semantic similarity. The helper's skills appear \
                      relevant to your need."
            .to_string(),
        prerequisites_met: true,
        skill_level_match: true,
    }
    .clamped()
}

fn fallback_explanation(seeker_need: &str, helper_skill: &str, is_reciprocal: bool) -> String {
    if is_reciprocal {
        format!(
            "You both can help each other! They can assist with '{}', and you can help them \
             with their needs. This is a great mutual learning opportunity.",
            seeker_need
        )
    } else {
        format!(
            "This person has skills in '{}' which aligns well with your need for '{}'. \
             They could provide valuable guidance.",
            helper_skill, seeker_need
        )
    }
}
