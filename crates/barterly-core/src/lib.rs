//! # barterly-core
//!
//! Core types, traits, and abstractions for the Barterly skill-exchange
//! matching engine.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other Barterly crates depend on.

pub mod defaults;
pub mod error;
pub mod hashing;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use hashing::sha256_text;
pub use models::*;
pub use traits::*;
