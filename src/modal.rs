//! Multi-step prompts: what the next typed line means.
//!
//! Exactly one [`ModalState`] is active at a time. [`step`] consumes the
//! current state and a raw line and returns the next state together with the
//! side effects the caller must apply. The machine never touches storage
//! itself; validation that needs existing data reads a [`Context`].

use chrono::NaiveDate;

use crate::date::{FORMATS_HINT, parse_due_date};
use crate::error::{Result, TodoError};
use crate::model::{Database, Role, RoleId, Task, TaskId};
use crate::store::MAX_ROLE_NUMBER;

/// The task a prompt chain is working on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub id: TaskId,
    pub number: u32,
    pub title: String,
    pub due_date: Option<NaiveDate>,
}

impl From<&Task> for TaskRef {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            number: task.number,
            title: task.title.clone(),
            due_date: task.due_date,
        }
    }
}

/// One role in the remap working list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapEntry {
    pub role: RoleId,
    pub name: String,
    pub original: u32,
    pub number: u32,
}

impl From<&Role> for RemapEntry {
    fn from(role: &Role) -> Self {
        Self {
            role: role.id,
            name: role.name.clone(),
            original: role.number,
            number: role.number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Idle,
    AwaitingRoleName,
    AwaitingTaskTitle {
        role: RoleId,
    },
    AwaitingTaskDueDate {
        role: RoleId,
        title: String,
    },
    AwaitingDeleteConfirmation {
        task: TaskRef,
    },
    AwaitingRoleDeleteConfirmation {
        role: RoleId,
        number: u32,
        name: String,
    },
    AwaitingEditTitle {
        task: TaskRef,
    },
    AwaitingEditDueDate {
        task: TaskRef,
        new_title: Option<String>,
    },
    AwaitingWindowRoleSelection {
        total_panels: usize,
        collected_roles: Vec<Option<RoleId>>,
        next_index: usize,
    },
    AwaitingRoleRemap {
        working: Vec<RemapEntry>,
    },
}

/// Work the caller performs after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreateRole {
        name: String,
    },
    CreateTask {
        role: RoleId,
        title: String,
        due_date: Option<NaiveDate>,
    },
    DeleteTask {
        task: TaskRef,
    },
    DeleteRole {
        role: RoleId,
    },
    UpdateTask {
        task: TaskRef,
        title: String,
        due_date: Option<NaiveDate>,
    },
    FinalizeLayout {
        roles: Vec<Option<RoleId>>,
    },
    RemapRoles {
        mapping: Vec<(RoleId, u32)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// A one-line message for the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: Level::Info, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { level: Level::Success, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: Level::Warning, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: Level::Error, text: text.into() }
    }
}

/// Everything a transition produced besides the next state
#[derive(Debug, Default)]
pub struct Outcome {
    pub effects: Vec<Effect>,
    pub notices: Vec<Notice>,
    pub error: Option<TodoError>,
}

impl Outcome {
    fn effect(effect: Effect) -> Self {
        Self {
            effects: vec![effect],
            ..Self::default()
        }
    }

    fn failed(error: TodoError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            ..Self::default()
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

/// Read-only data the transitions validate against
pub struct Context<'a> {
    pub db: &'a Database,
    pub today: NaiveDate,
}

impl ModalState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ModalState::Idle)
    }

    /// The question shown for this state
    pub fn prompt(&self) -> String {
        match self {
            ModalState::Idle => String::new(),
            ModalState::AwaitingRoleName => "Enter role name:".to_string(),
            ModalState::AwaitingTaskTitle { .. } => "Enter task title:".to_string(),
            ModalState::AwaitingTaskDueDate { title, .. } => format!(
                "Due date for '{}' (Enter to skip). {}",
                title, FORMATS_HINT
            ),
            ModalState::AwaitingDeleteConfirmation { task } => format!(
                "Delete task t{} '{}'? Type 'yes' to confirm:",
                task.number, task.title
            ),
            ModalState::AwaitingRoleDeleteConfirmation { number, name, .. } => {
                format!("Delete role r{} '{}'? Type 'yes' to confirm:", number, name)
            }
            ModalState::AwaitingEditTitle { task } => format!(
                "Editing t{}. New title (Enter keeps '{}'):",
                task.number, task.title
            ),
            ModalState::AwaitingEditDueDate { task, .. } => {
                let current = task
                    .due_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "none".to_string());
                format!(
                    "New due date (Enter keeps {}, 'clear' removes). {}",
                    current, FORMATS_HINT
                )
            }
            ModalState::AwaitingWindowRoleSelection {
                total_panels,
                next_index,
                ..
            } => format!(
                "Role for panel {} of {} (e.g. r1, Enter leaves it empty):",
                next_index + 1,
                total_panels
            ),
            ModalState::AwaitingRoleRemap { working } => {
                let current: Vec<String> = working
                    .iter()
                    .map(|e| format!("{}:{}", e.name, e.number))
                    .collect();
                format!(
                    "Remap as name:number (Enter to finish). Current: {}",
                    current.join(", ")
                )
            }
        }
    }
}

/// Holder enforcing that a new chain only starts from idle
#[derive(Debug, Default)]
pub struct ModalMachine {
    state: ModalState,
}

impl ModalMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_idle()
    }

    /// Start a prompt chain
    pub fn begin(&mut self, next: ModalState) -> Result<()> {
        if !self.state.is_idle() {
            return Err(TodoError::constraint(
                "Another prompt is still waiting for input",
            ));
        }
        tracing::debug!(?next, "modal begin");
        self.state = next;
        Ok(())
    }

    /// Feed one line to the active state
    pub fn submit(&mut self, line: &str, ctx: &Context<'_>) -> Outcome {
        let current = std::mem::take(&mut self.state);
        let (next, outcome) = step(current, line, ctx);
        tracing::debug!(?next, effects = outcome.effects.len(), "modal step");
        self.state = next;
        outcome
    }

    pub fn cancel(&mut self) {
        self.state = ModalState::Idle;
    }
}

/// The transition function
pub fn step(state: ModalState, line: &str, ctx: &Context<'_>) -> (ModalState, Outcome) {
    let input = line.trim();
    match state {
        ModalState::Idle => (ModalState::Idle, Outcome::default()),

        ModalState::AwaitingRoleName => {
            if input.is_empty() {
                return (
                    ModalState::Idle,
                    Outcome::failed(TodoError::validation("Role name cannot be empty")),
                );
            }
            (
                ModalState::Idle,
                Outcome::effect(Effect::CreateRole {
                    name: input.to_string(),
                }),
            )
        }

        ModalState::AwaitingTaskTitle { role } => {
            if input.is_empty() {
                return (
                    ModalState::Idle,
                    Outcome::failed(TodoError::validation("Task title cannot be empty")),
                );
            }
            (
                ModalState::AwaitingTaskDueDate {
                    role,
                    title: input.to_string(),
                },
                Outcome::default(),
            )
        }

        ModalState::AwaitingTaskDueDate { role, title } => {
            let mut outcome = Outcome::default();
            let due_date = if input.is_empty() {
                None
            } else {
                let parsed = parse_due_date(input, ctx.today);
                if parsed.is_none() {
                    outcome.notices.push(Notice::warning(format!(
                        "Could not understand due date '{}'; task created without one",
                        input
                    )));
                }
                parsed
            };
            outcome.effects.push(Effect::CreateTask {
                role,
                title,
                due_date,
            });
            (ModalState::Idle, outcome)
        }

        ModalState::AwaitingDeleteConfirmation { task } => {
            if is_yes(input) {
                (ModalState::Idle, Outcome::effect(Effect::DeleteTask { task }))
            } else {
                (ModalState::Idle, Outcome::notice(Notice::info("Delete cancelled")))
            }
        }

        ModalState::AwaitingRoleDeleteConfirmation { role, .. } => {
            if is_yes(input) {
                (ModalState::Idle, Outcome::effect(Effect::DeleteRole { role }))
            } else {
                (
                    ModalState::Idle,
                    Outcome::notice(Notice::info("Role deletion cancelled")),
                )
            }
        }

        ModalState::AwaitingEditTitle { task } => {
            let new_title = (!input.is_empty()).then(|| input.to_string());
            (
                ModalState::AwaitingEditDueDate { task, new_title },
                Outcome::default(),
            )
        }

        ModalState::AwaitingEditDueDate { task, new_title } => {
            let title = new_title.unwrap_or_else(|| task.title.clone());
            let mut outcome = Outcome::default();
            let due_date = if input.is_empty() {
                task.due_date
            } else if input.eq_ignore_ascii_case("clear") {
                None
            } else {
                match parse_due_date(input, ctx.today) {
                    Some(date) => Some(date),
                    None => {
                        outcome.notices.push(Notice::warning(format!(
                            "Could not understand due date '{}'; kept the current one",
                            input
                        )));
                        task.due_date
                    }
                }
            };
            outcome.effects.push(Effect::UpdateTask {
                task,
                title,
                due_date,
            });
            (ModalState::Idle, outcome)
        }

        ModalState::AwaitingWindowRoleSelection {
            total_panels,
            mut collected_roles,
            next_index,
        } => {
            let choice = if input.is_empty() {
                None
            } else {
                match resolve_role_token(input, ctx.db) {
                    Ok(id) => Some(id),
                    Err(err) => {
                        return (
                            ModalState::AwaitingWindowRoleSelection {
                                total_panels,
                                collected_roles,
                                next_index,
                            },
                            Outcome::failed(err),
                        );
                    }
                }
            };
            collected_roles.push(choice);
            let next_index = next_index + 1;
            if next_index >= total_panels {
                (
                    ModalState::Idle,
                    Outcome::effect(Effect::FinalizeLayout {
                        roles: collected_roles,
                    }),
                )
            } else {
                (
                    ModalState::AwaitingWindowRoleSelection {
                        total_panels,
                        collected_roles,
                        next_index,
                    },
                    Outcome::default(),
                )
            }
        }

        ModalState::AwaitingRoleRemap { mut working } => {
            if input.is_empty() {
                let mapping: Vec<(RoleId, u32)> = working
                    .iter()
                    .filter(|e| e.number != e.original)
                    .map(|e| (e.role, e.number))
                    .collect();
                if mapping.is_empty() {
                    return (
                        ModalState::Idle,
                        Outcome::notice(Notice::info("Role numbers unchanged")),
                    );
                }
                return (
                    ModalState::Idle,
                    Outcome::effect(Effect::RemapRoles { mapping }),
                );
            }
            match apply_remap_token(&mut working, input) {
                Ok(notice) => (
                    ModalState::AwaitingRoleRemap { working },
                    Outcome::default().with_notice(notice),
                ),
                Err(err) => (ModalState::AwaitingRoleRemap { working }, Outcome::failed(err)),
            }
        }
    }
}

fn is_yes(input: &str) -> bool {
    input.eq_ignore_ascii_case("yes")
}

/// Parse `r<digits>`
pub fn parse_role_token(token: &str) -> Option<u32> {
    let digits = token.trim().strip_prefix(['r', 'R'])?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn resolve_role_token(token: &str, db: &Database) -> Result<RoleId> {
    let number = parse_role_token(token).ok_or_else(|| {
        TodoError::validation(format!(
            "'{}' is not a role reference; use r<number> or Enter for none",
            token
        ))
    })?;
    db.role_by_number(number)
        .map(|r| r.id)
        .ok_or_else(|| TodoError::not_found(format!("Role r{} not found", number)))
}

/// Validate one `name:number` token and apply it to the working list. The
/// list is untouched on error.
fn apply_remap_token(working: &mut [RemapEntry], token: &str) -> Result<Notice> {
    let (name, number) = token.rsplit_once(':').ok_or_else(|| {
        TodoError::validation(format!("Expected name:number, got '{}'", token))
    })?;
    let name = name.trim();
    let number: u32 = number
        .trim()
        .parse()
        .ok()
        .filter(|n| (1..=MAX_ROLE_NUMBER).contains(n))
        .ok_or_else(|| TodoError::validation(format!("Invalid role number in '{}'", token)))?;
    if name.is_empty() {
        return Err(TodoError::validation(format!("Missing role name in '{}'", token)));
    }

    let pos = working
        .iter()
        .position(|e| e.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| TodoError::not_found(format!("No role named '{}'", name)))?;
    if let Some(holder) = working
        .iter()
        .enumerate()
        .find(|(i, e)| *i != pos && e.number == number)
        .map(|(_, e)| e)
    {
        return Err(TodoError::constraint(format!(
            "Number {} is already held by '{}'",
            number, holder.name
        )));
    }
    working[pos].number = number;
    Ok(Notice::info(format!("{} -> r{}", working[pos].name, number)))
}
