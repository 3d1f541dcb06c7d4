//! # barterly-db
//!
//! Storage layer for the Barterly matching engine.
//!
//! PostgreSQL (+ pgvector) implementations of the core repository traits —
//! user directory, embedding cache store, match persistence — plus
//! in-memory implementations of the same traits for tests and embedded use.
//!
//! The matching core owns no long-lived state of its own; everything
//! durable goes through the traits implemented here. The embedding cache is
//! the only shared mutable resource the core writes, and its upserts are
//! atomic per `(owner_id, kind, ref_id)` key.

pub mod embedding_cache;
pub mod matches;
pub mod memory;
pub mod pool;
pub mod schema;
pub mod users;

// Re-export core types
pub use barterly_core::*;

pub use embedding_cache::PgEmbeddingCacheRepository;
pub use matches::PgMatchRepository;
pub use memory::{InMemoryEmbeddingCache, InMemoryMatchStore, InMemoryUserDirectory};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use schema::{ensure_schema, SCHEMA_SQL};
pub use users::PgUserDirectory;
