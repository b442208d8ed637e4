//! JSONL storage for tasks and dependencies
//!
//! Tasks are stored in `.taskdag/tasks.jsonl` and edges in
//! `.taskdag/dependencies.jsonl`, one JSON object per line.
//! Uses file locking for concurrent access safety.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::store::{DependencyStore, StoreError, TaskStore, WriteLease};
use crate::domain::{DependencyEdge, TaskId, TaskNode, TaskRecord, TaskStatus, WorkspaceId};

fn unavailable(action: &str, path: &Path, err: io::Error) -> StoreError {
    StoreError::Unavailable(format!("{} {}: {}", action, path.display(), err))
}

/// Reads every record of a JSONL file under a shared lock
fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path).map_err(|e| unavailable("Failed to open", path, e))?;

    // Acquire shared lock for reading
    file.lock_shared()
        .map_err(|e| unavailable("Failed to acquire read lock on", path, e))?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| unavailable("Failed to read", path, e))?;

        if line.trim().is_empty() {
            continue;
        }

        let record: T = serde_json::from_str(&line).map_err(|e| {
            StoreError::Corrupt(format!(
                "{} line {}: {}",
                path.display(),
                line_num + 1,
                e
            ))
        })?;
        records.push(record);
    }

    // Lock is released when file is dropped
    Ok(records)
}

/// Rewrites a JSONL file atomically (temp file + rename)
fn write_lines<'a, T: Serialize + 'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a T>,
) -> Result<(), StoreError> {
    ensure_parent(path)?;

    let temp_path = path.with_extension("jsonl.tmp");

    {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| unavailable("Failed to create temp file", &temp_path, e))?;

        let mut writer = BufWriter::new(&file);

        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| StoreError::Corrupt(format!("Failed to serialize record: {}", e)))?;
            writeln!(writer, "{}", line)
                .map_err(|e| unavailable("Failed to write", &temp_path, e))?;
        }

        writer
            .flush()
            .map_err(|e| unavailable("Failed to flush", &temp_path, e))?;
    }

    // Atomic rename
    fs::rename(&temp_path, path).map_err(|e| unavailable("Failed to replace", path, e))
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| unavailable("Failed to create directory", parent, e))?;
    }
    Ok(())
}

/// Opens (creating if needed) a lock file and takes an exclusive lock on it
fn lock_exclusive(path: &Path) -> Result<File, StoreError> {
    ensure_parent(path)?;
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| unavailable("Failed to open lock file", path, e))?;
    file.lock_exclusive()
        .map_err(|e| unavailable("Failed to acquire write lock on", path, e))?;
    Ok(file)
}

/// Store for task records in JSONL format
pub struct JsonlTaskStore {
    path: PathBuf,
}

impl JsonlTaskStore {
    /// Creates a new task store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".taskdag").join("tasks.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Reads all tasks from the store; later lines win over earlier ones
    pub fn read_all(&self) -> Result<BTreeMap<TaskId, TaskRecord>, StoreError> {
        Ok(read_lines::<TaskRecord>(&self.path)?
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect())
    }

    /// Writes all tasks to the store (full rewrite)
    pub fn write_all(&self, tasks: &BTreeMap<TaskId, TaskRecord>) -> Result<(), StoreError> {
        let _lock = lock_exclusive(&self.lock_path())?;
        write_lines(&self.path, tasks.values())
    }

    /// Appends a single task (used for quick adds without full rewrite)
    pub fn append(&self, task: &TaskRecord) -> Result<(), StoreError> {
        ensure_parent(&self.path)?;
        let _lock = lock_exclusive(&self.lock_path())?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| unavailable("Failed to open", &self.path, e))?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(task)
            .map_err(|e| StoreError::Corrupt(format!("Failed to serialize task: {}", e)))?;
        writeln!(writer, "{}", line).map_err(|e| unavailable("Failed to write", &self.path, e))?;
        writer
            .flush()
            .map_err(|e| unavailable("Failed to flush", &self.path, e))
    }

    /// Changes a task's status and rewrites the store
    pub fn set_status(
        &self,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> Result<TaskRecord, StoreError> {
        let _lock = lock_exclusive(&self.lock_path())?;
        let mut tasks = self.read_all()?;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.clone()))?;
        task.set_status(status);
        let updated = task.clone();
        write_lines(&self.path, tasks.values())?;
        Ok(updated)
    }

    /// Returns one task record
    pub fn get(&self, task_id: &TaskId) -> Result<TaskRecord, StoreError> {
        self.read_all()?
            .remove(task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.clone()))
    }
}

impl TaskStore for JsonlTaskStore {
    fn list_tasks(&self, workspace: &WorkspaceId) -> Result<Vec<TaskNode>, StoreError> {
        Ok(self
            .read_all()?
            .values()
            .filter(|t| &t.workspace == workspace)
            .map(TaskRecord::node)
            .collect())
    }

    fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatus, StoreError> {
        self.get(task_id).map(|t| t.status)
    }
}

/// One stored dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EdgeRecord {
    workspace: WorkspaceId,
    prerequisite: TaskId,
    dependent: TaskId,
}

impl EdgeRecord {
    fn new(workspace: &WorkspaceId, edge: &DependencyEdge) -> Self {
        Self {
            workspace: workspace.clone(),
            prerequisite: edge.prerequisite.clone(),
            dependent: edge.dependent.clone(),
        }
    }

    fn edge(&self) -> DependencyEdge {
        DependencyEdge::new(self.prerequisite.clone(), self.dependent.clone())
    }
}

/// Store for dependency edges in JSONL format
///
/// Rows are returned exactly as stored, duplicates included, so that a
/// corrupted file surfaces as a load error rather than being silently fixed.
pub struct JsonlDependencyStore {
    path: PathBuf,
}

impl JsonlDependencyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".taskdag").join("dependencies.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Guards read-modify-write of the data file
    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Guards whole coordinator mutations; distinct from `lock_path` so a
    /// lease holder can still write
    fn lease_path(&self) -> PathBuf {
        self.path.with_extension("lease")
    }

    fn read_records(&self) -> Result<Vec<EdgeRecord>, StoreError> {
        read_lines(&self.path)
    }
}

impl DependencyStore for JsonlDependencyStore {
    fn list_edges(&self, workspace: &WorkspaceId) -> Result<Vec<DependencyEdge>, StoreError> {
        Ok(self
            .read_records()?
            .iter()
            .filter(|r| &r.workspace == workspace)
            .map(EdgeRecord::edge)
            .collect())
    }

    fn insert_edge(
        &self,
        workspace: &WorkspaceId,
        edge: &DependencyEdge,
    ) -> Result<(), StoreError> {
        let _lock = lock_exclusive(&self.lock_path())?;
        let mut records = self.read_records()?;
        let record = EdgeRecord::new(workspace, edge);

        if records.contains(&record) {
            return Err(StoreError::Conflict(edge.clone()));
        }
        records.push(record);

        write_lines(&self.path, records.iter())
    }

    fn delete_edge(
        &self,
        workspace: &WorkspaceId,
        edge: &DependencyEdge,
    ) -> Result<(), StoreError> {
        let _lock = lock_exclusive(&self.lock_path())?;
        let mut records = self.read_records()?;
        let target = EdgeRecord::new(workspace, edge);

        let before = records.len();
        records.retain(|r| r != &target);
        if records.len() == before {
            return Err(StoreError::EdgeNotFound(edge.clone()));
        }

        write_lines(&self.path, records.iter())
    }

    fn lease(&self, _workspace: &WorkspaceId) -> Result<WriteLease, StoreError> {
        lock_exclusive(&self.lease_path()).map(WriteLease::file)
    }
}
