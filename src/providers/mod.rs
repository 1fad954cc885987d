//! # External Collaborators
//!
//! Embedding service, diff retrieval, and call pacing.

pub mod diff;
pub mod embedder;
pub mod limiter;

pub use diff::{DiffSource, GitDiff};
pub use embedder::{Embedder, HttpEmbedder};
pub use limiter::{FixedDelay, NoDelay, RateLimiter};
