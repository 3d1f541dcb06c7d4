//! # barterly-similarity
//!
//! Vector similarity kernel for the Barterly matching engine.
//!
//! Pure vector math with no I/O: cosine similarity, batch top-K scoring,
//! normalization, and (weighted) averaging. The candidate pool in this
//! system is small enough (hundreds of users) that exhaustive comparison is
//! the documented algorithm; callers needing an ANN index can swap one in at
//! the embedding-lookup layer without touching these contracts.

pub mod kernel;

pub use kernel::{
    average, batch_top_k, cosine_similarity, euclidean_distance, magnitude, normalize,
    weighted_average,
};
