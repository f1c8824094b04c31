//! Command-line grammar for the idle prompt.
//!
//! The command token is case-insensitive. Anything that does not match is a
//! validation error that points at `help`.

use crate::error::{Result, TodoError};
use crate::layout;
use crate::modal::parse_role_token;
use crate::model::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    View,
    Edit,
    Delete,
    SetStatus(Status),
}

impl TaskAction {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "view" => Some(TaskAction::View),
            "edit" => Some(TaskAction::Edit),
            "delete" => Some(TaskAction::Delete),
            other => Status::parse(other).map(TaskAction::SetStatus),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Exit,
    Help,
    NewRole,
    SelectRole(u32),
    Add,
    Task { number: u32, action: TaskAction },
    Undo,
    Window(usize),
    Close,
    Kanban,
    Return,
    RoleRemap,
    DeleteRole,
}

impl Command {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Empty => "empty",
            Command::Exit => "exit",
            Command::Help => "help",
            Command::NewRole => "new role",
            Command::SelectRole(_) => "select role",
            Command::Add => "add",
            Command::Task { .. } => "task",
            Command::Undo => "undo",
            Command::Window(_) => "window",
            Command::Close => "close",
            Command::Kanban => "kanban",
            Command::Return => "return",
            Command::RoleRemap => "role remap",
            Command::DeleteRole => "delete",
        }
    }
}

/// Parse one line typed at the idle prompt
pub fn parse(line: &str) -> Result<Command> {
    let lowered = line.trim().to_lowercase();
    let parts: Vec<&str> = lowered.split_whitespace().collect();

    let command = match parts.as_slice() {
        [] => Command::Empty,
        ["exit"] | ["quit"] => Command::Exit,
        ["help"] => Command::Help,
        ["new", "role"] => Command::NewRole,
        ["add"] => Command::Add,
        ["undo"] => Command::Undo,
        ["close"] => Command::Close,
        ["k"] | ["kanban"] => Command::Kanban,
        ["r"] => Command::Return,
        ["role", "remap"] => Command::RoleRemap,
        ["delete"] => Command::DeleteRole,
        ["window", count] => Command::Window(parse_panel_count(count)?),
        ["window"] => {
            return Err(TodoError::validation("Usage: window <1-8>"));
        }
        ["task", task, rest @ ..] => parse_task(task, rest)?,
        [token] if parse_role_token(token).is_some() => select_role(token)?,
        [token, rest @ ..] if task_number(token).is_some() => parse_task(token, rest)?,
        _ => return Err(unknown(line)),
    };
    tracing::debug!(command = command.name(), "parsed command");
    Ok(command)
}

fn unknown(line: &str) -> TodoError {
    TodoError::validation(format!(
        "Unknown command: '{}'. Type 'help' for available commands.",
        line.trim()
    ))
}

fn parse_panel_count(token: &str) -> Result<usize> {
    let count: usize = token
        .parse()
        .map_err(|_| TodoError::validation(format!("Invalid panel count '{}'", token)))?;
    layout::validate_count(count)
}

fn select_role(token: &str) -> Result<Command> {
    parse_role_token(token)
        .map(Command::SelectRole)
        .ok_or_else(|| TodoError::validation(format!("Invalid role number: {}", token)))
}

/// `t<digits>`
fn task_number(token: &str) -> Option<u32> {
    let digits = token.strip_prefix('t')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn parse_task(token: &str, rest: &[&str]) -> Result<Command> {
    let number = task_number(token)
        .ok_or_else(|| TodoError::validation(format!("Invalid task reference '{}'", token)))?;
    let action = match rest {
        [] => {
            return Err(TodoError::validation(format!(
                "No action specified for task t{}. Try 't{} view'",
                number, number
            )));
        }
        [action] => TaskAction::parse(action).ok_or_else(|| {
            TodoError::validation(format!(
                "Unknown action '{}'. Use view, edit, delete, doing, done or todo",
                action
            ))
        })?,
        _ => {
            return Err(TodoError::validation(format!(
                "Too many arguments for task t{}",
                number
            )));
        }
    };
    Ok(Command::Task { number, action })
}
