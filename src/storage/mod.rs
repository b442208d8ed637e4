//! # Storage Layer
//!
//! The stores the graph engine consumes, plus git-friendly file-backed
//! implementations of them.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSONL (one JSON per line) | `.taskdag/tasks.jsonl` |
//! | Dependencies | JSONL (one edge per line) | `.taskdag/dependencies.jsonl` |
//! | Config | TOML | `.taskdag/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - Reads take a shared `fs2` lock on the data file
//! - Writes take an exclusive lock on a sidecar `.lock` file and are atomic
//!   (temp file + rename)
//! - [`JsonlDependencyStore`] hands out a [`WriteLease`] (exclusive lock on a
//!   `.lease` file) so only one coordinator mutates a project at a time
//!
//! ## Key Types
//!
//! - [`TaskStore`] / [`DependencyStore`] - Interfaces consumed by the engine
//! - [`MemoryStore`] - In-memory implementation of both
//! - [`Project`] - Entry point for accessing a taskdag project
//! - [`Config`] - Project and global configuration

mod store;
mod memory;
mod jsonl;
mod config;
mod project;

pub use store::{DependencyStore, StoreError, TaskStore, WriteLease};
pub use memory::MemoryStore;
pub use jsonl::{JsonlDependencyStore, JsonlTaskStore};
pub use config::{Config, ConfigError, GlobalConfig, OutputFormat, ProjectConfig, WatchConfig};
pub use project::{Project, ProjectCoordinator, ProjectError};
