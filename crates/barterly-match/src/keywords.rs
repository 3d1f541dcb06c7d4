//! Lexical skill-name compatibility.
//!
//! Reciprocity and cycle detection deliberately use keyword matching rather
//! than embeddings: their result sets are small and explanations must be
//! cheap and literal. Compatibility is exact match, substring containment in
//! either direction, or shared membership in a synonym group.
//!
//! Synonym groups are configuration, not logic: the table can be extended at
//! runtime or replaced wholesale from the environment without code changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One named group of mutually compatible skill-name substrings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymGroup {
    pub name: String,
    pub substrings: Vec<String>,
}

/// Table of keyword synonym groups used for lexical compatibility tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymTable {
    groups: Vec<SynonymGroup>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SynonymTable {
    /// The built-in groups covering common skill families.
    pub fn builtin() -> Self {
        let mut table = Self { groups: Vec::new() };
        table.add_group("python", &["python", "django", "flask", "fastapi"]);
        table.add_group("react", &["react", "reactjs", "next.js", "nextjs"]);
        table.add_group("javascript", &["javascript", "js", "typescript", "ts"]);
        table.add_group(
            "machine-learning",
            &["ml", "machine learning", "deep learning", "ai"],
        );
        table.add_group("data", &["data", "analytics", "analysis", "visualization"]);
        table
    }

    /// An empty table (containment and exact matching only).
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    /// Extend the built-in table from the `BARTERLY_SYNONYM_GROUPS` env var,
    /// a JSON object mapping group name to substring list.
    pub fn from_env() -> Self {
        let mut table = Self::builtin();
        if let Ok(val) = std::env::var("BARTERLY_SYNONYM_GROUPS") {
            match serde_json::from_str::<HashMap<String, Vec<String>>>(&val) {
                Ok(extra) => {
                    for (name, substrings) in extra {
                        let refs: Vec<&str> = substrings.iter().map(|s| s.as_str()).collect();
                        table.add_group(&name, &refs);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Invalid BARTERLY_SYNONYM_GROUPS, using built-ins");
                }
            }
        }
        table
    }

    /// Add or replace a group.
    pub fn add_group(&mut self, name: &str, substrings: &[&str]) {
        let substrings: Vec<String> = substrings.iter().map(|s| s.to_lowercase()).collect();
        match self.groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.substrings = substrings,
            None => self.groups.push(SynonymGroup {
                name: name.to_string(),
                substrings,
            }),
        }
    }

    /// Group names currently in the table.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name.as_str()).collect()
    }

    /// True iff both names hit a substring of the same group.
    pub fn share_group(&self, a: &str, b: &str) -> bool {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        self.groups.iter().any(|group| {
            group.substrings.iter().any(|s| a.contains(s.as_str()))
                && group.substrings.iter().any(|s| b.contains(s.as_str()))
        })
    }

    /// Symmetric lexical compatibility between two skill names.
    ///
    /// Exact match (case-insensitive), containment in either direction, or a
    /// shared synonym group.
    pub fn compatible(&self, a: &str, b: &str) -> bool {
        let a_norm = a.to_lowercase().trim().to_string();
        let b_norm = b.to_lowercase().trim().to_string();

        if a_norm == b_norm {
            return true;
        }
        if a_norm.contains(&b_norm) || b_norm.contains(&a_norm) {
            return true;
        }
        self.share_group(&a_norm, &b_norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_compatible() {
        let table = SynonymTable::builtin();
        assert!(table.compatible("Rust", "rust"));
        assert!(table.compatible("  Rust ", "rust"));
    }

    #[test]
    fn containment_either_direction() {
        let table = SynonymTable::empty();
        assert!(table.compatible("React", "React Native"));
        assert!(table.compatible("React Native", "React"));
        assert!(!table.compatible("React", "Vue"));
    }

    #[test]
    fn builtin_groups_match_family_members() {
        let table = SynonymTable::builtin();
        assert!(table.compatible("Python", "Django"));
        assert!(table.compatible("Flask", "FastAPI"));
        assert!(table.compatible("Machine Learning", "Deep Learning"));
        assert!(table.compatible("Data Analytics", "Data Visualization"));
    }

    #[test]
    fn unrelated_names_incompatible() {
        let table = SynonymTable::builtin();
        assert!(!table.compatible("Python", "Woodworking"));
        assert!(!table.compatible("Guitar", "Kubernetes"));
    }

    #[test]
    fn share_group_requires_both_sides() {
        let table = SynonymTable::builtin();
        assert!(table.share_group("django web", "fastapi services"));
        assert!(!table.share_group("django web", "carpentry"));
    }

    #[test]
    fn added_groups_extend_compatibility() {
        let mut table = SynonymTable::builtin();
        assert!(!table.compatible("Guitar", "Bass"));

        table.add_group("strings", &["guitar", "bass", "ukulele"]);
        assert!(table.compatible("Guitar", "Bass"));
        assert!(table.compatible("Ukulele lessons", "electric guitar"));
    }

    #[test]
    fn add_group_replaces_existing() {
        let mut table = SynonymTable::empty();
        table.add_group("g", &["a", "b"]);
        table.add_group("g", &["c", "d"]);
        assert_eq!(table.group_names(), vec!["g"]);
        assert!(!table.compatible("a", "b"));
        assert!(table.compatible("c", "d"));
    }
}
