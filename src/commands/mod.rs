//! # Command Implementations
//!
//! Each submodule handles one CLI command.

pub mod cache;
pub mod cluster;
