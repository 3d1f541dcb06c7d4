//! Three-way barter cycle detection.
//!
//! Searches the active-user population for closed loops A → C, B → A,
//! C → B where every leg clears the lexical compatibility test. Cycle
//! detection is deliberately embedding-free: its result sets are small and
//! its explanations must be literal, so keyword matching wins over semantic
//! similarity here. This asymmetry with pairwise matching is part of the
//! design, not an accident.
//!
//! Distinct (B, C) pairs that realize the same conceptual loop produce
//! distinct cycle records; no de-duplication is performed.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use barterly_core::{defaults, BarterCycle, Exchange, Result, SkillDescriptor, User, UserDirectory};

use crate::config::MatchConfig;
use crate::keywords::SynonymTable;

/// Detector for three-party exchange cycles.
pub struct BarterDetector {
    directory: Arc<dyn UserDirectory>,
    synonyms: SynonymTable,
    config: MatchConfig,
}

impl BarterDetector {
    /// Create a detector with default configuration and built-in synonyms.
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            synonyms: SynonymTable::default(),
            config: MatchConfig::default(),
        }
    }

    /// Replace the detector configuration.
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the synonym table.
    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Detect three-way barter cycles involving the given user.
    ///
    /// A cycle is A helps C, B helps A, C helps B. The user must declare
    /// both needs and offers to anchor a cycle; otherwise the result is
    /// empty. The fairness score on every record is the documented
    /// placeholder constant — genuine fairness scoring is a known gap.
    pub async fn detect_three_way_cycles(&self, user_id: Uuid) -> Result<Vec<BarterCycle>> {
        let start = Instant::now();

        let Some(user) = self.directory.get_user_by_id(user_id).await? else {
            return Ok(Vec::new());
        };
        if user.skills_needed.is_empty() || user.skills_offered.is_empty() {
            debug!(
                subsystem = "match",
                component = "barter",
                op = "detect_cycles",
                user_id = %user_id,
                "User lacks needs or offers, no cycles possible"
            );
            return Ok(Vec::new());
        }

        let all_users = self
            .directory
            .get_active_users(self.config.active_pool_limit, None)
            .await?;

        let mut cycles = Vec::new();

        for a_need in &user.skills_needed {
            for b in self.find_helpers(&user, a_need, &all_users) {
                if b.skills_needed.is_empty() {
                    continue;
                }

                for b_need in &b.skills_needed {
                    for c in self.find_helpers(b, b_need, &all_users) {
                        // Three distinct participants.
                        if c.id == user.id || c.id == b.id {
                            continue;
                        }
                        if let Some(cycle) = self.build_cycle(&user, b, c, a_need, b_need) {
                            cycles.push(cycle);
                        }
                    }
                }
            }
        }

        info!(
            subsystem = "match",
            component = "barter",
            op = "detect_cycles",
            user_id = %user_id,
            cycle_count = cycles.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Cycle detection complete"
        );
        Ok(cycles)
    }

    /// Users from the pool able to help `seeker` with `need`.
    fn find_helpers<'a>(
        &self,
        seeker: &User,
        need: &SkillDescriptor,
        all_users: &'a [User],
    ) -> Vec<&'a User> {
        all_users
            .iter()
            .filter(|u| u.id != seeker.id && self.can_help(u, need))
            .collect()
    }

    /// True iff any of the helper's offered skills is lexically compatible
    /// with the need.
    fn can_help(&self, helper: &User, need: &SkillDescriptor) -> bool {
        helper
            .skills_offered
            .iter()
            .any(|skill| self.synonyms.compatible(&skill.name, &need.name))
    }

    /// The helper's first offered skill compatible with the need.
    fn matching_skill<'a>(
        &self,
        helper: &'a User,
        need: &SkillDescriptor,
    ) -> Option<&'a SkillDescriptor> {
        helper
            .skills_offered
            .iter()
            .find(|skill| self.synonyms.compatible(&skill.name, &need.name))
    }

    /// Assemble a cycle record for (A, B, C), closing the third leg by
    /// finding a need of C that A can satisfy.
    fn build_cycle(
        &self,
        a: &User,
        b: &User,
        c: &User,
        a_need: &SkillDescriptor,
        b_need: &SkillDescriptor,
    ) -> Option<BarterCycle> {
        let c_need = c.skills_needed.iter().find(|need| self.can_help(a, need))?;

        let a_to_c = self.matching_skill(a, c_need)?;
        let b_to_a = self.matching_skill(b, a_need)?;
        let c_to_b = self.matching_skill(c, b_need)?;

        Some(BarterCycle {
            participants: vec![a.id, b.id, c.id],
            exchanges: vec![
                Exchange {
                    from_user: a.id,
                    to_user: c.id,
                    skill: a_to_c.name.clone(),
                },
                Exchange {
                    from_user: b.id,
                    to_user: a.id,
                    skill: b_to_a.name.clone(),
                },
                Exchange {
                    from_user: c.id,
                    to_user: b.id,
                    skill: c_to_b.name.clone(),
                },
            ],
            fairness_score: defaults::CYCLE_FAIRNESS_PLACEHOLDER,
            explanation: format!(
                "{} helps {}, {} helps {}, {} helps {}",
                a.username, c.username, b.username, a.username, c.username, b.username
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barterly_db::InMemoryUserDirectory;
    use std::collections::HashSet;

    fn skill(name: &str) -> SkillDescriptor {
        SkillDescriptor::named(name)
    }

    fn add_user(
        directory: &InMemoryUserDirectory,
        name: &str,
        offered: &[&str],
        needed: &[&str],
    ) -> Uuid {
        let user = User::new(
            Uuid::new_v4(),
            name,
            offered.iter().map(|s| skill(s)).collect(),
            needed.iter().map(|s| skill(s)).collect(),
        );
        let id = user.id;
        directory.insert(user);
        id
    }

    #[tokio::test]
    async fn detects_simple_three_way_cycle() {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let a = add_user(&directory, "alice", &["Guitar"], &["Spanish"]);
        let b = add_user(&directory, "bob", &["Photography"], &["Guitar"]);
        let c = add_user(&directory, "carol", &["Spanish"], &["Photography"]);

        let detector = BarterDetector::new(directory);
        let cycles = detector.detect_three_way_cycles(a).await.unwrap();

        assert!(!cycles.is_empty());
        let participants: HashSet<Uuid> = cycles[0].participants.iter().copied().collect();
        assert_eq!(participants, HashSet::from([a, b, c]));
        assert_eq!(cycles[0].exchanges.len(), 3);
        assert_eq!(cycles[0].fairness_score, defaults::CYCLE_FAIRNESS_PLACEHOLDER);

        // Every participant gives exactly once and receives exactly once.
        let givers: HashSet<Uuid> = cycles[0].exchanges.iter().map(|e| e.from_user).collect();
        let receivers: HashSet<Uuid> = cycles[0].exchanges.iter().map(|e| e.to_user).collect();
        assert_eq!(givers, participants);
        assert_eq!(receivers, participants);
    }

    #[tokio::test]
    async fn cycle_legs_resolve_the_matching_skills() {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let a = add_user(&directory, "alice", &["Guitar"], &["Spanish"]);
        add_user(&directory, "bob", &["Photography"], &["Guitar"]);
        add_user(&directory, "carol", &["Spanish"], &["Photography"]);

        let detector = BarterDetector::new(directory);
        let cycles = detector.detect_three_way_cycles(a).await.unwrap();

        let skills: HashSet<&str> = cycles[0]
            .exchanges
            .iter()
            .map(|e| e.skill.as_str())
            .collect();
        assert_eq!(skills, HashSet::from(["Guitar", "Photography", "Spanish"]));
    }

    #[tokio::test]
    async fn no_cycle_when_third_leg_missing() {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let a = add_user(&directory, "alice", &["Guitar"], &["Spanish"]);
        add_user(&directory, "bob", &["Photography"], &["Guitar"]);
        // Carol offers Spanish but needs something nobody offers.
        add_user(&directory, "carol", &["Spanish"], &["Juggling"]);

        let detector = BarterDetector::new(directory);
        assert!(detector.detect_three_way_cycles(a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn requires_both_needs_and_offers() {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let no_offers = add_user(&directory, "alice", &[], &["Spanish"]);
        let no_needs = add_user(&directory, "bob", &["Guitar"], &[]);
        add_user(&directory, "carol", &["Spanish"], &["Guitar"]);

        let detector = BarterDetector::new(directory);
        assert!(detector
            .detect_three_way_cycles(no_offers)
            .await
            .unwrap()
            .is_empty());
        assert!(detector
            .detect_three_way_cycles(no_needs)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_user_yields_empty() {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let detector = BarterDetector::new(directory);
        assert!(detector
            .detect_three_way_cycles(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn synonym_groups_close_cycle_legs() {
        let directory = Arc::new(InMemoryUserDirectory::new());
        // Carol needs Python; Alice's Django offer closes the third leg
        // through the python synonym group.
        let a = add_user(&directory, "alice", &["Django"], &["Guitar"]);
        add_user(&directory, "bob", &["Guitar"], &["Photography"]);
        add_user(&directory, "carol", &["Photography"], &["Python"]);

        let detector = BarterDetector::new(directory);
        let cycles = detector.detect_three_way_cycles(a).await.unwrap();
        assert!(!cycles.is_empty());
        assert_eq!(cycles[0].exchanges[0].skill, "Django");
    }

    #[tokio::test]
    async fn duplicate_helpers_produce_distinct_cycles() {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let a = add_user(&directory, "alice", &["Guitar"], &["Spanish"]);
        add_user(&directory, "bob", &["Photography"], &["Guitar"]);
        // Two interchangeable Spanish teachers: one cycle per (B, C) pair.
        add_user(&directory, "carol", &["Spanish"], &["Photography"]);
        add_user(&directory, "dave", &["Spanish"], &["Photography"]);

        let detector = BarterDetector::new(directory);
        let cycles = detector.detect_three_way_cycles(a).await.unwrap();
        assert_eq!(cycles.len(), 2);
    }

    #[tokio::test]
    async fn seeker_never_fills_another_slot() {
        let directory = Arc::new(InMemoryUserDirectory::new());
        // Alice could lexically satisfy her own need; two-party loop with bob
        // must not surface as a "three-way" cycle.
        let a = add_user(&directory, "alice", &["Spanish", "Guitar"], &["Spanish"]);
        add_user(&directory, "bob", &["Spanish"], &["Guitar"]);

        let detector = BarterDetector::new(directory);
        assert!(detector.detect_three_way_cycles(a).await.unwrap().is_empty());
    }
}
