//! CLI command implementations.

pub mod common;
pub mod config;
pub mod mix;
pub mod topology;
