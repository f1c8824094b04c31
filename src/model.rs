use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub type RoleId = u64;
pub type TaskId = u64;

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Todo,
    Doing,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::Doing => "doing",
            Status::Done => "done",
        }
    }

    /// Parse a status keyword, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Some(Status::Todo),
            "doing" => Some(Status::Doing),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    /// Human readable label used by the detail view
    pub fn label(&self) -> &'static str {
        match self {
            Status::Todo => "To Do",
            Status::Doing => "In Progress",
            Status::Done => "Completed",
        }
    }

    /// Sort key: doing=0, todo=1, done=2
    fn sort_key(&self) -> u8 {
        match self {
            Status::Doing => 0,
            Status::Todo => 1,
            Status::Done => 2,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// A user-defined context that owns a numbered sequence of tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Role {
    pub id: RoleId,
    /// Stable display number (`r1`, `r2`, ...), unique across roles
    pub number: u32,
    pub name: String,
    /// Hex colour from the palette, e.g. `#D4A574`
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A unit of work under a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Task {
    pub id: TaskId,
    pub role_id: RoleId,
    /// Display number within the role (`t1`, `t2`, ...)
    pub number: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Fibonacci story points (1, 2, 3, 5, 8, 13)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u8>,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Ordering used by role panels: doing, todo, done; then due date (undated
/// last); then creation time.
pub fn panel_order(a: &Task, b: &Task) -> Ordering {
    a.status
        .sort_key()
        .cmp(&b.status.sort_key())
        .then_with(|| due_order(a, b))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Due date ascending with undated tasks last
pub fn due_order(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A deleted task kept for `undo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub task: Task,
    pub deleted_at: DateTime<Utc>,
}

/// A completed task moved out of the active list by the archive sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedTask {
    pub task: Task,
    pub archived_at: DateTime<Utc>,
}

/// The single persisted window layout record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub panel_count: usize,
    pub panel_roles: Vec<Option<RoleId>>,
}

/// Everything persisted in the data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub undo: Vec<UndoEntry>,
    #[serde(default)]
    pub archived: Vec<ArchivedTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutRecord>,
    #[serde(default = "first_id")]
    pub next_role_id: RoleId,
    #[serde(default = "first_id")]
    pub next_task_id: TaskId,
}

fn first_id() -> u64 {
    1
}

impl Default for Database {
    fn default() -> Self {
        Self {
            roles: Vec::new(),
            tasks: Vec::new(),
            undo: Vec::new(),
            archived: Vec::new(),
            layout: None,
            next_role_id: first_id(),
            next_task_id: first_id(),
        }
    }
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    pub fn role_by_number(&self, number: u32) -> Option<&Role> {
        self.roles.iter().find(|r| r.number == number)
    }

    /// Case-insensitive lookup by name
    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        let wanted = name.trim().to_lowercase();
        self.roles.iter().find(|r| r.name.to_lowercase() == wanted)
    }

    /// Roles ordered by display number
    pub fn roles_ordered(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.iter().collect();
        roles.sort_by_key(|r| r.number);
        roles
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn task_by_number(&self, role_id: RoleId, number: u32) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|t| t.role_id == role_id && t.number == number)
    }

    /// Tasks of a role in panel order
    pub fn tasks_for_role(&self, role_id: RoleId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().filter(|t| t.role_id == role_id).collect();
        tasks.sort_by(|a, b| panel_order(a, b));
        tasks
    }

    pub fn task_count(&self, role_id: RoleId) -> usize {
        self.tasks.iter().filter(|t| t.role_id == role_id).count()
    }

    pub fn next_role_number(&self) -> u32 {
        self.roles.iter().map(|r| r.number).max().unwrap_or(0) + 1
    }

    pub fn next_task_number(&self, role_id: RoleId) -> u32 {
        self.tasks
            .iter()
            .filter(|t| t.role_id == role_id)
            .map(|t| t.number)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub(crate) fn allocate_role_id(&mut self) -> RoleId {
        let id = self.next_role_id;
        self.next_role_id += 1;
        id
    }

    pub(crate) fn allocate_task_id(&mut self) -> TaskId {
        let id = self.next_task_id;
        self.next_task_id += 1;
        id
    }
}
