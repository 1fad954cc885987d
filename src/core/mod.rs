//! Core domain types

pub mod cluster;
pub mod embedding;
pub mod file;
pub mod hash;
pub mod similarity;

pub use cluster::{Cluster, ClusterKind, Group};
pub use embedding::{cosine_similarity, Embedding};
pub use hash::{root_key, ContentHash};
