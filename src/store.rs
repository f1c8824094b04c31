//! Role/task store backed by a single JSON document.
//!
//! Every mutation runs as load -> mutate -> validate -> save while holding
//! both a process-wide mutex and the advisory file lock, so the foreground
//! loop and the background archive sweep never interleave. A failed closure or
//! a failed save leaves the file exactly as it was.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{Result, TodoError};
use crate::model::{
    ArchivedTask, Database, LayoutRecord, Role, RoleId, Status, Task, TaskId, UndoEntry,
};
use crate::storage::{FileLock, load_database, lock_path, read_database, write_database};

pub const DATA_FILE: &str = "todo.json";
pub const DEFAULT_UNDO_LIMIT: usize = 20;
/// Highest display number a role may be given
pub const MAX_ROLE_NUMBER: u32 = 9999;

#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    guard: Arc<Mutex<()>>,
    undo_limit: usize,
}

impl Store {
    /// Store rooted in a data directory (`<dir>/todo.json`)
    pub fn open(dir: &Path) -> Self {
        Self::at(dir.join(DATA_FILE))
    }

    /// Store backed by an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Arc::new(Mutex::new(())),
            undo_limit: DEFAULT_UNDO_LIMIT,
        }
    }

    pub fn with_undo_limit(mut self, limit: usize) -> Self {
        self.undo_limit = limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a read-only query against a fresh copy of the database
    pub fn read<T>(&self, f: impl FnOnce(&Database) -> T) -> Result<T> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let db = load_database(&self.path)?;
        Ok(f(&db))
    }

    /// Run a mutation as one transaction. Nothing is written if `f` fails.
    pub fn transact<T>(&self, f: impl FnOnce(&mut Database) -> Result<T>) -> Result<T> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let _lock = FileLock::acquire(lock_path(&self.path))?;
        let mut db = read_database(&self.path)?;
        let value = f(&mut db)?;
        write_database(&db, &self.path)?;
        Ok(value)
    }

    pub fn snapshot(&self) -> Result<Database> {
        self.read(|db| db.clone())
    }

    // ── Roles ────────────────────────────────────────────────────────

    pub fn create_role(&self, name: &str, color: &str) -> Result<RoleId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TodoError::validation("Role name cannot be empty"));
        }
        self.transact(|db| {
            let id = db.allocate_role_id();
            let number = db.next_role_number();
            db.roles.push(Role {
                id,
                number,
                name: name.to_string(),
                color: color.to_string(),
                created_at: Utc::now(),
            });
            tracing::info!(role_id = id, number, name, "created role");
            Ok(id)
        })
    }

    pub fn role(&self, id: RoleId) -> Result<Option<Role>> {
        self.read(|db| db.role(id).cloned())
    }

    pub fn role_by_number(&self, number: u32) -> Result<Option<Role>> {
        self.read(|db| db.role_by_number(number).cloned())
    }

    /// All roles ordered by display number
    pub fn list_roles(&self) -> Result<Vec<Role>> {
        self.read(|db| db.roles_ordered().into_iter().cloned().collect())
    }

    /// Delete a role that owns no tasks. The role is also cleared from the
    /// persisted layout.
    pub fn delete_role(&self, id: RoleId) -> Result<Role> {
        self.transact(|db| {
            let pos = db
                .roles
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| TodoError::not_found(format!("Role {} not found", id)))?;
            let owned = db.task_count(id);
            if owned > 0 {
                return Err(TodoError::constraint(format!(
                    "Cannot delete role r{}: it still has {} task(s)",
                    db.roles[pos].number, owned
                )));
            }
            let role = db.roles.remove(pos);
            if let Some(layout) = db.layout.as_mut() {
                for slot in layout.panel_roles.iter_mut() {
                    if *slot == Some(id) {
                        *slot = None;
                    }
                }
            }
            tracing::info!(role_id = id, number = role.number, "deleted role");
            Ok(role)
        })
    }

    /// Reassign display numbers in one transaction.
    ///
    /// Remapped roles are first parked on numbers above every number in use,
    /// then moved to their targets, with uniqueness checked after each phase.
    /// The final state is rejected as a whole if two roles would share a
    /// number.
    pub fn remap_role_numbers(&self, mapping: &[(RoleId, u32)]) -> Result<()> {
        if mapping.is_empty() {
            return Ok(());
        }
        if let Some((_, n)) = mapping
            .iter()
            .find(|(_, n)| *n == 0 || *n > MAX_ROLE_NUMBER)
        {
            return Err(TodoError::validation(format!("Invalid role number: {}", n)));
        }
        self.transact(|db| {
            for (id, _) in mapping {
                if db.role(*id).is_none() {
                    return Err(TodoError::not_found(format!("Role {} not found", id)));
                }
            }
            let ceiling = db.roles.iter().map(|r| r.number).max().unwrap_or(0);
            for (id, target) in mapping {
                let parked = ceiling.checked_add(*target).ok_or_else(|| {
                    TodoError::constraint("Role numbers are too large to remap")
                })?;
                if let Some(role) = db.roles.iter_mut().find(|r| r.id == *id) {
                    role.number = parked;
                }
            }
            check_unique_numbers(db)?;
            for (id, target) in mapping {
                if let Some(role) = db.roles.iter_mut().find(|r| r.id == *id) {
                    role.number = *target;
                }
            }
            check_unique_numbers(db)?;
            tracing::info!(count = mapping.len(), "remapped role numbers");
            Ok(())
        })
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn create_task(
        &self,
        role_id: RoleId,
        title: &str,
        due_date: Option<NaiveDate>,
    ) -> Result<TaskId> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TodoError::validation("Task title cannot be empty"));
        }
        self.transact(|db| {
            if db.role(role_id).is_none() {
                return Err(TodoError::not_found(format!("Role {} not found", role_id)));
            }
            let id = db.allocate_task_id();
            let number = db.next_task_number(role_id);
            db.tasks.push(Task {
                id,
                role_id,
                number,
                title: title.to_string(),
                due_date,
                status: Status::Todo,
                created_at: Utc::now(),
                ..Task::default()
            });
            tracing::info!(task_id = id, role_id, number, "created task");
            Ok(id)
        })
    }

    pub fn task(&self, id: TaskId) -> Result<Option<Task>> {
        self.read(|db| db.task(id).cloned())
    }

    pub fn task_by_number(&self, role_id: RoleId, number: u32) -> Result<Option<Task>> {
        self.read(|db| db.task_by_number(role_id, number).cloned())
    }

    pub fn tasks_for_role(&self, role_id: RoleId) -> Result<Vec<Task>> {
        self.read(|db| db.tasks_for_role(role_id).into_iter().cloned().collect())
    }

    /// Set the status; `done` stamps the completion time, anything else clears it
    pub fn update_task_status(&self, id: TaskId, status: Status) -> Result<()> {
        self.transact(|db| {
            let task = db
                .task_mut(id)
                .ok_or_else(|| TodoError::not_found(format!("Task {} not found", id)))?;
            task.status = status;
            task.completed_at = match status {
                Status::Done => Some(Utc::now()),
                _ => None,
            };
            Ok(())
        })
    }

    pub fn update_task(&self, id: TaskId, title: &str, due_date: Option<NaiveDate>) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TodoError::validation("Task title cannot be empty"));
        }
        self.transact(|db| {
            let task = db
                .task_mut(id)
                .ok_or_else(|| TodoError::not_found(format!("Task {} not found", id)))?;
            task.title = title.to_string();
            task.due_date = due_date;
            Ok(())
        })
    }

    pub fn delete_task(&self, id: TaskId, save_to_undo: bool) -> Result<Task> {
        let limit = self.undo_limit;
        self.transact(|db| {
            let pos = db
                .tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| TodoError::not_found(format!("Task {} not found", id)))?;
            let task = db.tasks.remove(pos);
            if save_to_undo {
                db.undo.push(UndoEntry {
                    task: task.clone(),
                    deleted_at: Utc::now(),
                });
                while db.undo.len() > limit {
                    evict_oldest_undo(db);
                }
            }
            tracing::info!(task_id = id, save_to_undo, "deleted task");
            Ok(task)
        })
    }

    /// Restore the most recently deleted task
    pub fn undo_last_deletion(&self) -> Result<Task> {
        self.transact(|db| {
            let pos = newest_undo(db).ok_or_else(|| TodoError::not_found("No deletions to undo"))?;
            let mut task = db.undo[pos].task.clone();
            if db.role(task.role_id).is_none() {
                return Err(TodoError::not_found(format!(
                    "Cannot restore t{}: its role no longer exists",
                    task.number
                )));
            }
            db.undo.remove(pos);
            if db.task_by_number(task.role_id, task.number).is_some() {
                task.number = db.next_task_number(task.role_id);
            }
            if db.task(task.id).is_some() {
                task.id = db.allocate_task_id();
            }
            db.tasks.push(task.clone());
            tracing::info!(task_id = task.id, number = task.number, "restored task");
            Ok(task)
        })
    }

    pub fn undo_depth(&self) -> Result<usize> {
        self.read(|db| db.undo.len())
    }

    // ── Layout ───────────────────────────────────────────────────────

    /// Overwrite (or clear, with `None`) the single layout record
    pub fn save_layout(&self, record: Option<LayoutRecord>) -> Result<()> {
        self.transact(|db| {
            if let Some(rec) = &record {
                if rec.panel_roles.len() != rec.panel_count {
                    return Err(TodoError::validation(format!(
                        "Layout has {} panels but {} role slots",
                        rec.panel_count,
                        rec.panel_roles.len()
                    )));
                }
                if let Some(missing) = rec
                    .panel_roles
                    .iter()
                    .flatten()
                    .find(|id| db.role(**id).is_none())
                {
                    return Err(TodoError::not_found(format!("Role {} not found", missing)));
                }
            }
            tracing::debug!(?record, "saving layout");
            db.layout = record;
            Ok(())
        })
    }

    pub fn load_layout(&self) -> Result<Option<LayoutRecord>> {
        self.read(|db| db.layout.clone())
    }

    // ── Archive ──────────────────────────────────────────────────────

    /// Move every done task completed before `cutoff` to the archive
    pub fn archive_completed_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.transact(|db| {
            let now = Utc::now();
            let (old, keep): (Vec<Task>, Vec<Task>) = std::mem::take(&mut db.tasks)
                .into_iter()
                .partition(|t| is_archivable(t, cutoff));
            db.tasks = keep;
            let count = old.len();
            db.archived.extend(old.into_iter().map(|task| ArchivedTask {
                task,
                archived_at: now,
            }));
            Ok(count)
        })
    }

    pub fn archived(&self) -> Result<Vec<ArchivedTask>> {
        self.read(|db| db.archived.clone())
    }
}

/// Done and completed strictly before the cutoff
pub fn is_archivable(task: &Task, cutoff: DateTime<Utc>) -> bool {
    task.status == Status::Done && task.completed_at.is_some_and(|at| at < cutoff)
}

fn check_unique_numbers(db: &Database) -> Result<()> {
    let mut seen = HashSet::new();
    for role in &db.roles {
        if !seen.insert(role.number) {
            return Err(TodoError::constraint(format!(
                "Role number {} is already in use",
                role.number
            )));
        }
    }
    Ok(())
}

fn newest_undo(db: &Database) -> Option<usize> {
    db.undo
        .iter()
        .enumerate()
        .max_by_key(|(i, e)| (e.deleted_at, *i))
        .map(|(i, _)| i)
}

fn evict_oldest_undo(db: &mut Database) {
    if let Some(pos) = db
        .undo
        .iter()
        .enumerate()
        .min_by_key(|(i, e)| (e.deleted_at, *i))
        .map(|(i, _)| i)
    {
        db.undo.remove(pos);
    }
}
