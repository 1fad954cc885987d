//! # diffgroup Library
//!
//! Groups a changeset of modified files into coherent clusters so each
//! cluster can receive one generated description. Cheap path heuristics are
//! tried first; cached and fresh diff embeddings are the fallback.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod processing;
pub mod providers;
pub mod storage;
pub mod ui;

pub use processing::{smart_cluster_files, Engine};
