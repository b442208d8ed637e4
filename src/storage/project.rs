//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{Config, JsonlDependencyStore, JsonlTaskStore};
use crate::domain::{GraphError, WorkspaceId};
use crate::engine::Coordinator;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a taskdag project. Run 'taskdag init' first.")]
    NotInProject,
}

/// Coordinator wired to a project's JSONL stores
pub type ProjectCoordinator = Coordinator<JsonlTaskStore, JsonlDependencyStore>;

/// A taskdag project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(".taskdag").is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(".taskdag");

        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create .taskdag directory: {}", data_dir.display())
        })?;

        // Create default config
        let config_path = data_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# taskdag configuration

# Workspace whose dependency graph this project manages
workspace = "default"

# Recompute topological levels on every change ("eager") or on next read ("lazy")
levels = "lazy"

[watch]
# Milliseconds to wait for store writes to settle before rebuilding
debounce_ms = 250
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        // Lock files are per-machine state
        let gitignore_path = data_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Lock files
*.lock
*.lease

# Interrupted writes
*.tmp
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .taskdag directory path
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(".taskdag")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the configured workspace
    pub fn workspace(&self) -> &WorkspaceId {
        &self.config.project.workspace
    }

    /// Returns the task store
    pub fn task_store(&self) -> JsonlTaskStore {
        JsonlTaskStore::for_project(&self.root)
    }

    /// Returns the dependency store
    pub fn dependency_store(&self) -> JsonlDependencyStore {
        JsonlDependencyStore::for_project(&self.root)
    }

    /// Builds a coordinator and loads the graph from the stores
    pub fn coordinator(&self) -> Result<ProjectCoordinator, GraphError> {
        Coordinator::open(
            self.task_store(),
            self.dependency_store(),
            self.workspace().clone(),
            self.config.project.levels,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.data_dir().is_dir());
        assert!(project.data_dir().join("config.toml").is_file());
        assert!(project.data_dir().join(".gitignore").is_file());
        assert_eq!(project.workspace(), &WorkspaceId::default());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();
        Project::init(dir.path()).unwrap();
    }

    #[test]
    fn open_outside_project_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Project::open(dir.path()).is_err());
    }

    #[test]
    fn coordinator_on_empty_project() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let coordinator = project.coordinator().unwrap();
        assert!(coordinator.snapshot().graph().is_empty());
    }
}
