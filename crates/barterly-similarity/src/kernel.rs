//! Similarity computations over embedding vectors.
//!
//! Pure CPU math: cosine similarity, batch top-K, normalization, and vector
//! combination. Zero vectors are a documented degenerate case, not an error:
//! a degenerate embedding scores as "unrelated" (0.0) rather than aborting a
//! whole retrieval pass.

use std::cmp::Ordering;

use tracing::warn;

use barterly_core::{Error, Result};

/// Cosine similarity between two vectors, in [-1, 1].
///
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (or either side is a zero vector)
/// - `-1.0` = opposite direction
///
/// Fails with [`Error::EmptyVector`] if either vector is empty and with
/// [`Error::DimensionMismatch`] if lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        warn!(
            subsystem = "similarity",
            op = "cosine_similarity",
            "Zero vector in cosine similarity computation"
        );
        return Ok(0.0);
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    // Clamp to counter floating point drift on near-parallel inputs.
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Cosine similarity between a query and every corpus vector, top-K.
///
/// Returns `(index, score)` pairs sorted descending by score; ties keep the
/// lower original index first (stable order, required for reproducible
/// runs). Zero corpus vectors score 0.0 against any query; a zero query
/// scores 0.0 against everything.
pub fn batch_top_k(query: &[f32], corpus: &[Vec<f32>], k: usize) -> Result<Vec<(usize, f32)>> {
    if corpus.is_empty() {
        return Ok(Vec::new());
    }
    if query.is_empty() {
        return Err(Error::EmptyVector);
    }

    let query_norm = magnitude(query);
    if query_norm == 0.0 {
        warn!(
            subsystem = "similarity",
            op = "batch_top_k",
            "Query vector is a zero vector"
        );
        return Ok((0..corpus.len().min(k)).map(|i| (i, 0.0)).collect());
    }

    let mut similarities = Vec::with_capacity(corpus.len());
    for (idx, candidate) in corpus.iter().enumerate() {
        if candidate.len() != query.len() {
            return Err(Error::DimensionMismatch {
                left: query.len(),
                right: candidate.len(),
            });
        }
        let candidate_norm = magnitude(candidate);
        let score = if candidate_norm == 0.0 {
            0.0
        } else {
            let dot: f32 = query.iter().zip(candidate.iter()).map(|(x, y)| x * y).sum();
            (dot / (query_norm * candidate_norm)).clamp(-1.0, 1.0)
        };
        similarities.push((idx, score));
    }

    // Stable sort: equal scores keep insertion (index) order.
    similarities.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    similarities.truncate(k);
    Ok(similarities)
}

/// Normalize a vector to unit length.
///
/// A zero vector is returned unchanged (documented degenerate case).
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = magnitude(v);
    if norm == 0.0 {
        warn!(
            subsystem = "similarity",
            op = "normalize",
            "Cannot normalize zero vector"
        );
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// L2 norm of a vector.
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Euclidean distance between two vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt())
}

/// Element-wise mean of multiple vectors.
pub fn average(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
    if vectors.is_empty() {
        return Err(Error::EmptyVector);
    }
    let dim = vectors[0].len();
    for v in vectors {
        if v.len() != dim {
            return Err(Error::DimensionMismatch {
                left: dim,
                right: v.len(),
            });
        }
    }

    let mut sum = vec![0.0f32; dim];
    for v in vectors {
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    let n = vectors.len() as f32;
    Ok(sum.into_iter().map(|x| x / n).collect())
}

/// Weighted element-wise mean of multiple vectors.
///
/// Weights are normalized to sum to 1 before combining. Fails with
/// [`Error::LengthMismatch`] when the counts differ and with
/// [`Error::InvalidWeights`] when the raw weight sum is exactly zero.
pub fn weighted_average(vectors: &[Vec<f32>], weights: &[f32]) -> Result<Vec<f32>> {
    if vectors.len() != weights.len() {
        return Err(Error::LengthMismatch {
            vectors: vectors.len(),
            weights: weights.len(),
        });
    }
    if vectors.is_empty() {
        return Err(Error::EmptyVector);
    }

    let weight_sum: f32 = weights.iter().sum();
    if weight_sum == 0.0 {
        return Err(Error::InvalidWeights(
            "sum of weights cannot be zero".to_string(),
        ));
    }

    let dim = vectors[0].len();
    let mut combined = vec![0.0f32; dim];
    for (v, w) in vectors.iter().zip(weights.iter()) {
        if v.len() != dim {
            return Err(Error::DimensionMismatch {
                left: dim,
                right: v.len(),
            });
        }
        let normalized_w = w / weight_sum;
        for (acc, x) in combined.iter_mut().zip(v.iter()) {
            *acc += normalized_w * x;
        }
    }
    Ok(combined)
}
