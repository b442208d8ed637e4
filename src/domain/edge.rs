//! Dependency edges

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::TaskId;

/// `dependent` cannot start until `prerequisite` reaches `completed`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub prerequisite: TaskId,
    pub dependent: TaskId,
}

impl DependencyEdge {
    pub fn new(prerequisite: TaskId, dependent: TaskId) -> Self {
        Self {
            prerequisite,
            dependent,
        }
    }

    /// Returns true if both ends point at the same task
    pub fn is_self_loop(&self) -> bool {
        self.prerequisite == self.dependent
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.prerequisite, self.dependent)
    }
}
