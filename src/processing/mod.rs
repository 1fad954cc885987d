//! # Changeset Clustering
//!
//! Heuristic and embedding-based clusterers plus the cascade that picks
//! between them.

pub mod cached;
pub mod cascade;
pub mod context;
pub mod directory;
pub mod kmeans;
pub mod merge;
pub mod pattern;
pub mod sampling;
pub mod semantic;
pub mod threshold;
pub mod validate;

pub use cascade::{default_cascade, smart_cluster_files, Attempt, Engine, Strategy};
pub use context::{EmbeddedDiff, Fetcher, Request, Services};
