//! One interactive session: input line, modal prompts, view and panels.
//!
//! The session is the single owner of all foreground state. Keys and
//! submitted lines are handled synchronously; every change to roles, tasks or
//! the layout goes through the [`Store`] before the in-memory view is touched,
//! so a failed write leaves the screen as it was.

use chrono::NaiveDate;

use crate::command::{self, Command, TaskAction};
use crate::config::UiConfig;
use crate::date;
use crate::error::{ErrorKind, Result, TodoError};
use crate::input::InputLine;
use crate::layout::MAX_PANELS;
use crate::modal::{Context, Effect, ModalMachine, ModalState, Notice, RemapEntry, TaskRef};
use crate::model::{Database, RoleId};
use crate::navigator::{Direction, PanelLayout, neighbor};
use crate::palette::role_color;
use crate::store::Store;
use crate::view::{ViewMode, ViewOrchestrator};

pub const IDLE_PROMPT: &str = "Type a command... (type 'help' for commands)";
pub const DETAIL_PROMPT: &str = "Press Enter to return...";

/// Terminal-independent key events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Esc,
    Tab,
    Up,
    Down,
    Left,
    Right,
    /// Space key released (only reported by terminals with release events)
    SpaceReleased,
    Interrupt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub active: bool,
    pub space_held: bool,
}

pub struct Session {
    store: Store,
    db: Database,
    view: ViewOrchestrator,
    modal: ModalMachine,
    nav: NavigationState,
    input: InputLine,
    notice: Option<Notice>,
    scroll: [u16; MAX_PANELS],
    /// Terminal reports key releases, so Space can be held
    release_events: bool,
    clock: fn() -> NaiveDate,
    should_quit: bool,
}

impl Session {
    /// Open a session, restoring the persisted window layout if there is one
    pub fn new(store: Store, ui: &UiConfig) -> Result<Self> {
        let db = store.snapshot()?;
        let mut view = ViewOrchestrator::new();
        if let Some(record) = &db.layout {
            match PanelLayout::from_record(record, |id| db.role(id).is_some()) {
                Ok(layout) => {
                    tracing::info!(panels = layout.count(), "restored window layout");
                    view.show_multi(layout);
                }
                Err(e) => tracing::warn!(error = %e, "ignoring unusable window layout"),
            }
        }
        Ok(Self {
            store,
            db,
            view,
            modal: ModalMachine::new(),
            nav: NavigationState::default(),
            input: InputLine::new(ui.history_limit),
            notice: None,
            scroll: [0; MAX_PANELS],
            release_events: false,
            clock: date::today,
            should_quit: false,
        })
    }

    /// Override "today" for due-date parsing
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    pub fn set_release_events(&mut self, enabled: bool) {
        self.release_events = enabled;
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Last loaded copy of the data, used for rendering
    pub fn data(&self) -> &Database {
        &self.db
    }

    pub fn view(&self) -> &ViewOrchestrator {
        &self.view
    }

    pub fn modal_state(&self) -> &ModalState {
        self.modal.state()
    }

    pub fn navigation(&self) -> NavigationState {
        self.nav
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn scroll_offset(&self, slot: usize) -> u16 {
        self.scroll.get(slot).copied().unwrap_or(0)
    }

    /// Text shown above the input line
    pub fn prompt(&self) -> String {
        if self.modal.is_active() {
            self.modal.state().prompt()
        } else if matches!(self.view.mode(), ViewMode::TaskDetail { .. }) {
            DETAIL_PROMPT.to_string()
        } else {
            IDLE_PROMPT.to_string()
        }
    }

    /// Reload the data copy (picks up background archive sweeps)
    pub fn refresh(&mut self) -> Result<()> {
        self.db = self.store.snapshot()?;
        Ok(())
    }

    /// Show an error on the status line
    pub fn report(&mut self, err: TodoError) {
        match err.kind() {
            ErrorKind::Persistence => tracing::error!(error = %err, "storage failure"),
            kind => tracing::debug!(?kind, error = %err, "command rejected"),
        }
        self.notice = Some(Notice::error(err.to_string()));
    }

    // ── Lines ────────────────────────────────────────────────────────

    /// Handle one submitted line. The line answers the pending prompt if
    /// there is one, closes the detail view if it is showing, and is parsed
    /// as a command otherwise.
    pub fn submit_line(&mut self, line: &str) -> Result<()> {
        self.notice = None;
        let result = self.route_line(line);
        if let Err(e) = self.refresh() {
            tracing::warn!(error = %e, "could not reload data");
        }
        result
    }

    fn route_line(&mut self, line: &str) -> Result<()> {
        if self.view.leave_task_detail() {
            return Ok(());
        }
        if self.modal.is_active() {
            return self.answer_prompt(line);
        }
        self.input.record(line);
        let command = command::parse(line)?;
        self.dispatch(command)
    }

    fn answer_prompt(&mut self, line: &str) -> Result<()> {
        let db = self.store.snapshot()?;
        let ctx = Context {
            db: &db,
            today: self.today(),
        };
        let outcome = self.modal.submit(line, &ctx);
        let mut notices = Vec::new();
        for effect in outcome.effects {
            notices.push(self.apply(effect)?);
        }
        notices.extend(outcome.notices);
        if let Some(last) = notices.pop() {
            self.notice = Some(last);
        }
        match outcome.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        tracing::debug!(command = command.name(), mode = self.view.mode().name(), "dispatch");
        match command {
            Command::Empty => {}
            Command::Exit => self.should_quit = true,
            Command::Help => self.view.open_help(),
            Command::NewRole => self.modal.begin(ModalState::AwaitingRoleName)?,
            Command::SelectRole(number) => self.select_role(number)?,
            Command::Add => {
                let role = self.require_active_role(
                    "No role selected. Use 'r1' to select a role or 'new role' to create one.",
                )?;
                self.modal.begin(ModalState::AwaitingTaskTitle { role })?;
            }
            Command::Task { number, action } => self.task_command(number, action)?,
            Command::Undo => {
                let task = self.store.undo_last_deletion()?;
                self.notice = Some(Notice::success(format!(
                    "Restored t{}: {}",
                    task.number, task.title
                )));
            }
            Command::Window(count) => self.modal.begin(ModalState::AwaitingWindowRoleSelection {
                total_panels: count,
                collected_roles: Vec::with_capacity(count),
                next_index: 0,
            })?,
            Command::Close => self.close_panel()?,
            Command::Kanban => self.view.open_kanban()?,
            Command::Return => {
                if !self.view.close_overlay() {
                    self.notice = Some(Notice::info("Nothing to return from"));
                }
            }
            Command::RoleRemap => {
                let working: Vec<RemapEntry> =
                    self.store.list_roles()?.iter().map(RemapEntry::from).collect();
                if working.is_empty() {
                    return Err(TodoError::validation("No roles to remap"));
                }
                self.modal.begin(ModalState::AwaitingRoleRemap { working })?;
            }
            Command::DeleteRole => self.begin_role_delete()?,
        }
        Ok(())
    }

    fn require_active_role(&self, message: &str) -> Result<RoleId> {
        self.view
            .active_role()
            .ok_or_else(|| TodoError::validation(message))
    }

    fn select_role(&mut self, number: u32) -> Result<()> {
        let role = self
            .store
            .role_by_number(number)?
            .ok_or_else(|| TodoError::not_found(format!("Role r{} not found", number)))?;
        self.show_role(role.id)
    }

    /// Put a role on screen: into the focused panel in multi-panel mode,
    /// otherwise as the single panel.
    fn show_role(&mut self, role: RoleId) -> Result<()> {
        self.view.leave_overlays();
        if let Some(layout) = self.view.layout() {
            let mut next = layout.clone();
            next.assign_focused(Some(role));
            self.store.save_layout(Some(next.to_record()))?;
            if let Some(layout) = self.view.layout_mut() {
                *layout = next;
            }
            self.view.sync_active_role();
        } else {
            self.view.show_single(Some(role));
            self.scroll[0] = 0;
        }
        Ok(())
    }

    fn task_command(&mut self, number: u32, action: TaskAction) -> Result<()> {
        let role = self.require_active_role("No role selected. Select a role first.")?;
        let task = self
            .store
            .task_by_number(role, number)?
            .ok_or_else(|| {
                TodoError::not_found(format!("Task t{} not found in the active role", number))
            })?;
        match action {
            TaskAction::View => self.view.show_task(task.id),
            TaskAction::Edit => self.modal.begin(ModalState::AwaitingEditTitle {
                task: TaskRef::from(&task),
            })?,
            TaskAction::Delete => self.modal.begin(ModalState::AwaitingDeleteConfirmation {
                task: TaskRef::from(&task),
            })?,
            TaskAction::SetStatus(status) => {
                self.store.update_task_status(task.id, status)?;
                self.notice = Some(Notice::success(format!(
                    "t{} marked as {}",
                    task.number,
                    status.label()
                )));
            }
        }
        Ok(())
    }

    fn begin_role_delete(&mut self) -> Result<()> {
        let id = self.require_active_role("No role selected. Select the role to delete first.")?;
        let role = self
            .store
            .role(id)?
            .ok_or_else(|| TodoError::not_found("Active role no longer exists"))?;
        let owned = self.store.read(|db| db.task_count(id))?;
        if owned > 0 {
            return Err(TodoError::constraint(format!(
                "Cannot delete role r{}: it still has {} task(s)",
                role.number, owned
            )));
        }
        self.modal.begin(ModalState::AwaitingRoleDeleteConfirmation {
            role: role.id,
            number: role.number,
            name: role.name,
        })
    }

    fn close_panel(&mut self) -> Result<()> {
        self.view.leave_overlays();
        let layout = self
            .view
            .layout()
            .ok_or_else(|| TodoError::not_found("No panel layout is open"))?;
        let closed_role = layout.focused_role();
        match layout.close_focused() {
            Some(next) => {
                self.store.save_layout(Some(next.to_record()))?;
                tracing::info!(panels = next.count(), "closed panel");
                self.view.show_multi(next);
            }
            None => {
                self.store.save_layout(None)?;
                tracing::info!("closed last panel");
                self.view.show_single(closed_role);
            }
        }
        self.scroll = [0; MAX_PANELS];
        Ok(())
    }

    /// Carry out one modal side effect and describe the result
    fn apply(&mut self, effect: Effect) -> Result<Notice> {
        tracing::debug!(?effect, "apply");
        let notice = match effect {
            Effect::CreateRole { name } => {
                let count = self.store.read(|db| db.roles.len())?;
                let id = self.store.create_role(&name, role_color(count))?;
                self.show_role(id)?;
                let number = self.store.role(id)?.map(|r| r.number).unwrap_or_default();
                Notice::success(format!("Created role r{}: {}", number, name.trim()))
            }
            Effect::CreateTask {
                role,
                title,
                due_date,
            } => {
                let id = self.store.create_task(role, &title, due_date)?;
                let number = self.store.task(id)?.map(|t| t.number).unwrap_or_default();
                Notice::success(format!("Created t{}: {}", number, title))
            }
            Effect::DeleteTask { task } => {
                self.store.delete_task(task.id, true)?;
                Notice::success(format!("Deleted t{}. Use 'undo' to restore.", task.number))
            }
            Effect::DeleteRole { role } => {
                let deleted = self.store.delete_role(role)?;
                self.view.forget_role(role);
                Notice::success(format!("Deleted role r{}: {}", deleted.number, deleted.name))
            }
            Effect::UpdateTask {
                task,
                title,
                due_date,
            } => {
                self.store.update_task(task.id, &title, due_date)?;
                Notice::success(format!("Updated t{}", task.number))
            }
            Effect::FinalizeLayout { roles } => {
                let layout = PanelLayout::new(roles)?;
                self.store.save_layout(Some(layout.to_record()))?;
                let count = layout.count();
                self.view.show_multi(layout);
                self.scroll = [0; MAX_PANELS];
                self.nav = NavigationState::default();
                Notice::success(format!("Window layout set: {} panel(s)", count))
            }
            Effect::RemapRoles { mapping } => {
                self.store.remap_role_numbers(&mapping)?;
                Notice::success(format!("Renumbered {} role(s)", mapping.len()))
            }
        };
        Ok(notice)
    }

    // ── Keys ─────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: Key) {
        if key == Key::Interrupt {
            self.should_quit = true;
            return;
        }
        if self.nav.active {
            self.navigation_key(key);
        } else {
            self.command_key(key);
        }
    }

    fn command_key(&mut self, key: Key) {
        match key {
            Key::Char(c) => self.input.push(c),
            Key::Backspace => self.input.backspace(),
            Key::Enter => {
                let line = self.input.take();
                if let Err(e) = self.submit_line(&line) {
                    self.report(e);
                }
            }
            Key::Esc => {
                if !self.input.is_empty() {
                    self.input.clear();
                } else if self.modal.is_active() {
                    self.modal.cancel();
                    self.notice = Some(Notice::info("Cancelled"));
                } else if self.view.mode().is_panel_view() {
                    self.nav = NavigationState {
                        active: true,
                        space_held: false,
                    };
                }
            }
            Key::Tab => {
                if !self.modal.is_active() {
                    self.cycle_focus();
                }
            }
            Key::Up => self.input.previous(),
            Key::Down => self.input.next(),
            Key::Left | Key::Right | Key::SpaceReleased | Key::Interrupt => {}
        }
    }

    fn navigation_key(&mut self, key: Key) {
        match key {
            Key::Char(' ') => self.nav.space_held = true,
            Key::SpaceReleased => self.nav.space_held = false,
            Key::Tab => self.cycle_focus(),
            Key::Up => self.arrow(Direction::Up),
            Key::Down => self.arrow(Direction::Down),
            Key::Left => self.arrow(Direction::Left),
            Key::Right => self.arrow(Direction::Right),
            Key::Char(c) => {
                self.nav = NavigationState::default();
                if c.is_alphanumeric() {
                    self.input.push(c);
                }
            }
            Key::Esc | Key::Enter | Key::Backspace => self.nav = NavigationState::default(),
            Key::Interrupt => {}
        }
    }

    fn cycle_focus(&mut self) {
        if let Some(layout) = self.view.layout_mut() {
            let index = layout.focus_next();
            tracing::debug!(index, "focus");
            self.view.sync_active_role();
        }
    }

    fn arrow(&mut self, direction: Direction) {
        if self.nav.space_held {
            self.swap_panel(direction);
            if !self.release_events {
                self.nav.space_held = false;
            }
            return;
        }
        match direction {
            Direction::Up => self.scroll_focused(-1),
            Direction::Down => self.scroll_focused(1),
            Direction::Left | Direction::Right => {
                if let Some(layout) = self.view.layout_mut() {
                    if let Some(target) = neighbor(layout.focused_index(), direction, layout.count())
                    {
                        let _ = layout.set_focus(target);
                    }
                }
                self.view.sync_active_role();
            }
        }
    }

    fn scroll_focused(&mut self, delta: i32) {
        let slot = self.view.layout().map(|l| l.focused_index()).unwrap_or(0);
        if let Some(offset) = self.scroll.get_mut(slot) {
            *offset = if delta < 0 {
                offset.saturating_sub(1)
            } else {
                offset.saturating_add(1)
            };
        }
    }

    /// Space+arrow: move the focused panel's role to the neighbouring slot
    fn swap_panel(&mut self, direction: Direction) {
        let Some(layout) = self.view.layout() else {
            return;
        };
        let from = layout.focused_index();
        let mut next = layout.clone();
        let Some(to) = next.swap_focused(direction) else {
            return;
        };
        if let Err(e) = self.store.save_layout(Some(next.to_record())) {
            self.report(e);
            return;
        }
        tracing::debug!(from, to, "moved panel");
        self.scroll.swap(from, to);
        if let Some(layout) = self.view.layout_mut() {
            *layout = next;
        }
        self.view.sync_active_role();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
    }

    fn session() -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path());
        let session = Session::new(store, &UiConfig::default())
            .unwrap()
            .with_clock(fixed_today);
        (dir, session)
    }

    fn run(session: &mut Session, lines: &[&str]) {
        for line in lines {
            session.submit_line(line).unwrap();
        }
    }

    fn type_line(session: &mut Session, line: &str) {
        for c in line.chars() {
            session.handle_key(Key::Char(c));
        }
        session.handle_key(Key::Enter);
    }

    #[test]
    fn test_new_role_becomes_active() {
        let (_dir, mut s) = session();
        run(&mut s, &["new role", "Work"]);
        let role = s.data().role_by_number(1).unwrap().clone();
        assert_eq!(role.name, "Work");
        assert_eq!(role.color, "#D4A574");
        assert_eq!(s.view().active_role(), Some(role.id));
        assert!(s.modal_state().is_idle());
    }

    #[test]
    fn test_role_name_exit_is_not_a_command() {
        let (_dir, mut s) = session();
        run(&mut s, &["new role", "exit"]);
        assert!(!s.should_quit());
        assert!(s.data().role_by_name("exit").is_some());
    }

    #[test]
    fn test_second_role_gets_next_palette_colour() {
        let (_dir, mut s) = session();
        run(&mut s, &["new role", "Work", "new role", "Home"]);
        assert_eq!(s.data().role_by_number(2).unwrap().color, "#C17817");
    }

    #[test]
    fn test_add_requires_active_role() {
        let (_dir, mut s) = session();
        let err = s.submit_line("add").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(s.modal_state().is_idle());
    }

    #[test]
    fn test_add_task_with_relative_due_date() {
        let (_dir, mut s) = session();
        run(&mut s, &["new role", "Work", "add", "Write report", "+2d"]);
        let task = s.data().tasks[0].clone();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 10, 17));
        assert_eq!(task.number, 1);
    }

    #[test]
    fn test_help_in_prompt_is_consumed_as_answer() {
        let (_dir, mut s) = session();
        run(&mut s, &["new role", "Work", "add", "help", ""]);
        assert_eq!(s.view().mode(), &ViewMode::SinglePanel { role: s.view().active_role() });
        assert_eq!(s.data().tasks[0].title, "help");
    }

    #[test]
    fn test_status_commands() {
        let (_dir, mut s) = session();
        run(&mut s, &["new role", "Work", "add", "A", "", "t1 doing"]);
        assert_eq!(s.data().tasks[0].status, crate::model::Status::Doing);
        run(&mut s, &["task t1 done"]);
        assert!(s.data().tasks[0].completed_at.is_some());
    }

    #[test]
    fn test_unknown_task_is_not_found() {
        let (_dir, mut s) = session();
        run(&mut s, &["new role", "Work"]);
        let err = s.submit_line("t9 view").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_task_detail_exits_on_next_line_without_running_it() {
        let (_dir, mut s) = session();
        run(&mut s, &["new role", "Work", "add", "A", "", "t1 view"]);
        assert!(matches!(s.view().mode(), ViewMode::TaskDetail { .. }));
        assert_eq!(s.prompt(), DETAIL_PROMPT);
        run(&mut s, &["exit"]);
        assert!(!s.should_quit());
        assert!(matches!(s.view().mode(), ViewMode::SinglePanel { .. }));
    }

    #[test]
    fn test_esc_clears_then_enters_navigation() {
        let (_dir, mut s) = session();
        s.handle_key(Key::Char('x'));
        s.handle_key(Key::Esc);
        assert!(s.input().is_empty());
        assert!(!s.navigation().active);
        s.handle_key(Key::Esc);
        assert!(s.navigation().active);
        s.handle_key(Key::Char('a'));
        assert!(!s.navigation().active);
        assert_eq!(s.input().text(), "a");
    }

    #[test]
    fn test_esc_cancels_pending_prompt() {
        let (_dir, mut s) = session();
        type_line(&mut s, "new role");
        assert!(!s.modal_state().is_idle());
        s.handle_key(Key::Esc);
        assert!(s.modal_state().is_idle());
        assert!(s.data().roles.is_empty());
    }

    #[test]
    fn test_errors_from_enter_become_notices() {
        let (_dir, mut s) = session();
        type_line(&mut s, "bogus");
        let notice = s.notice().unwrap();
        assert_eq!(notice.level, crate::modal::Level::Error);
        assert!(notice.text.contains("help"));
    }

    #[test]
    fn test_history_skips_prompt_answers() {
        let (_dir, mut s) = session();
        type_line(&mut s, "new role");
        type_line(&mut s, "Work");
        type_line(&mut s, "help");
        assert_eq!(s.input().history(), ["new role", "help"]);
        s.handle_key(Key::Up);
        assert_eq!(s.input().text(), "help");
    }

    #[test]
    fn test_return_without_overlay_is_informational() {
        let (_dir, mut s) = session();
        run(&mut s, &["r"]);
        assert_eq!(s.notice().unwrap().level, crate::modal::Level::Info);
    }
}
