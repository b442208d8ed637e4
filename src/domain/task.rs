//! Task domain model
//!
//! A [`TaskRecord`] is the durable row owned by the Task Store. The engine only
//! ever sees the read-only [`TaskNode`] projection of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::{IdError, TaskId, WorkspaceId};

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Blocked,
}

impl TaskStatus {
    /// Returns true if this status satisfies a dependency on this task
    ///
    /// Only `completed` counts. A cancelled prerequisite keeps its dependents
    /// waiting until the edge is removed.
    pub fn is_complete(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Returns true if a task in this status may be started
    pub fn is_startable(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Blocked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// Short marker for text listings
    pub fn marker(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "[ ]",
            TaskStatus::InProgress => "[~]",
            TaskStatus::Completed => "[x]",
            TaskStatus::Cancelled => "[-]",
            TaskStatus::Blocked => "[!]",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses canonical names and the common aliases found in imported data
impl FromStr for TaskStatus {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "pending" | "todo" | "open" => Ok(TaskStatus::Pending),
            "in_progress" | "doing" | "started" => Ok(TaskStatus::InProgress),
            "completed" | "done" | "closed" => Ok(TaskStatus::Completed),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            "blocked" => Ok(TaskStatus::Blocked),
            _ => Err(IdError::InvalidStatus(s.to_string())),
        }
    }
}

/// Priority of a task (ordering hint only, never used by graph logic)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" | "critical" => Ok(Priority::Urgent),
            _ => Err(IdError::InvalidPriority(s.to_string())),
        }
    }
}

/// Snapshot of a task as seen by the graph engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: TaskId,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskNode {
    pub fn new(id: TaskId, status: TaskStatus) -> Self {
        Self {
            id,
            status,
            priority: Priority::default(),
        }
    }
}

/// A task row as persisted by the Task Store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique identifier
    pub id: TaskId,

    /// Workspace the task belongs to
    #[serde(default)]
    pub workspace: WorkspaceId,

    /// Human-readable title
    pub title: String,

    /// Current status
    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Priority,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,

    /// When the task was completed (if completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Creates a new pending task with a generated ID
    pub fn new(workspace: WorkspaceId, title: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: TaskId::generate(&title, now),
            workspace,
            title,
            status: TaskStatus::Pending,
            priority: Priority::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Creates a new pending task with an explicit ID
    pub fn with_id(id: TaskId, workspace: WorkspaceId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            workspace,
            title: title.into(),
            status: TaskStatus::Pending,
            priority: Priority::default(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Moves the task to a new status, maintaining `completed_at`
    pub fn set_status(&mut self, status: TaskStatus) {
        if self.status == status {
            return;
        }
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.completed_at = if status.is_complete() { Some(now) } else { None };
    }

    /// Returns the engine's view of this task
    pub fn node(&self) -> TaskNode {
        TaskNode {
            id: self.id.clone(),
            status: self.status,
            priority: self.priority,
        }
    }
}
