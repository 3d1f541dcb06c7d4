//! Content hashing for embedding cache freshness checks.

use sha2::{Digest, Sha256};

/// SHA-256 hash of whitespace-normalized text, as `"sha256:<hex>"`.
///
/// Normalization collapses runs of whitespace to single spaces and trims,
/// so formatting-only edits do not invalidate cached embeddings. The hash
/// covers the source text and nothing else.
pub fn sha256_text(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let digest = Sha256::digest(normalized.as_bytes());
    format!("sha256:{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_for_identical_text() {
        assert_eq!(sha256_text("Rust systems"), sha256_text("Rust systems"));
    }

    #[test]
    fn formatting_only_changes_do_not_alter_hash() {
        assert_eq!(
            sha256_text("  Rust \n systems\tprogramming "),
            sha256_text("Rust systems programming")
        );
    }

    #[test]
    fn content_changes_alter_hash() {
        assert_ne!(sha256_text("Rust"), sha256_text("Go"));
    }

    #[test]
    fn empty_and_whitespace_only_agree() {
        assert_eq!(sha256_text(""), sha256_text("   \n\t "));
    }

    #[test]
    fn prefixed_format() {
        let hash = sha256_text("anything");
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), "sha256:".len() + 64);
    }
}
