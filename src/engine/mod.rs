//! # Graph Engine
//!
//! Wires the pure domain algorithms to the stores.
//!
//! - [`Coordinator`] - the single writer of validated edges; serves
//!   snapshot-based reads (levels, ready set, neighbours)
//! - [`Snapshot`] - immutable graph plus its level cache

mod coordinator;
mod snapshot;

use serde::{Deserialize, Serialize};

pub use coordinator::Coordinator;
pub use snapshot::Snapshot;

/// When topological levels are computed for a new snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LevelMode {
    /// During every commit
    Eager,
    /// On first read of the snapshot
    #[default]
    Lazy,
}
