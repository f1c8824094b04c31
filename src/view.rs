//! Which view owns the screen.
//!
//! Single-panel and multi-panel are base modes; only one of them is mounted
//! at a time. Help and Kanban are overlays: entering one stores a single
//! [`Snapshot`] of the base state and leaving restores it verbatim. Help
//! opened on top of Kanban returns to Kanban, and Kanban then returns to the
//! original base. Task detail remembers the mode it was opened from and
//! leaves on the next submitted line.

use crate::error::{Result, TodoError};
use crate::model::{RoleId, TaskId};
use crate::navigator::PanelLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    SinglePanel { role: Option<RoleId> },
    MultiPanel { layout: PanelLayout },
    Kanban,
    TaskDetail { task: TaskId, previous: Box<ViewMode> },
    Help,
}

impl ViewMode {
    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::SinglePanel { .. } => "single",
            ViewMode::MultiPanel { .. } => "multi",
            ViewMode::Kanban => "kanban",
            ViewMode::TaskDetail { .. } => "detail",
            ViewMode::Help => "help",
        }
    }

    pub fn is_overlay(&self) -> bool {
        matches!(self, ViewMode::Kanban | ViewMode::Help)
    }

    pub fn is_panel_view(&self) -> bool {
        matches!(self, ViewMode::SinglePanel { .. } | ViewMode::MultiPanel { .. })
    }

    fn forget_role(&mut self, role: RoleId) {
        match self {
            ViewMode::SinglePanel { role: shown } if *shown == Some(role) => *shown = None,
            ViewMode::MultiPanel { layout } => layout.clear_role(role),
            ViewMode::TaskDetail { previous, .. } => previous.forget_role(role),
            _ => {}
        }
    }
}

/// State saved when an overlay opens. A multi-panel base carries its layout
/// inside `mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub mode: ViewMode,
    pub active_role: Option<RoleId>,
}

#[derive(Debug, Clone)]
pub struct ViewOrchestrator {
    mode: ViewMode,
    active_role: Option<RoleId>,
    snapshot: Option<Snapshot>,
    /// Help was opened while Kanban was showing
    help_over_kanban: bool,
}

impl Default for ViewOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewOrchestrator {
    /// Welcome screen: single panel, no role
    pub fn new() -> Self {
        Self {
            mode: ViewMode::SinglePanel { role: None },
            active_role: None,
            snapshot: None,
            help_over_kanban: false,
        }
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn active_role(&self) -> Option<RoleId> {
        self.active_role
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn layout(&self) -> Option<&PanelLayout> {
        match &self.mode {
            ViewMode::MultiPanel { layout } => Some(layout),
            _ => None,
        }
    }

    pub fn layout_mut(&mut self) -> Option<&mut PanelLayout> {
        match &mut self.mode {
            ViewMode::MultiPanel { layout } => Some(layout),
            _ => None,
        }
    }

    /// The layout currently mounted or waiting underneath an overlay
    pub fn base_layout(&self) -> Option<&PanelLayout> {
        self.layout().or(match &self.snapshot {
            Some(Snapshot {
                mode: ViewMode::MultiPanel { layout },
                ..
            }) => Some(layout),
            _ => None,
        })
    }

    /// Re-read the active role from the focused panel
    pub fn sync_active_role(&mut self) {
        if let ViewMode::MultiPanel { layout } = &self.mode {
            self.active_role = layout.focused_role();
        }
    }

    /// Close any overlay or detail view, restoring the base mode
    pub fn leave_overlays(&mut self) {
        self.leave_task_detail();
        while self.mode.is_overlay() {
            self.close_overlay();
        }
    }

    /// Mount the single-panel view on `role`
    pub fn show_single(&mut self, role: Option<RoleId>) {
        self.leave_overlays();
        self.mode = ViewMode::SinglePanel { role };
        self.active_role = role;
    }

    /// Mount the multi-panel view; the active role follows focus
    pub fn show_multi(&mut self, layout: PanelLayout) {
        self.leave_overlays();
        self.active_role = layout.focused_role();
        self.mode = ViewMode::MultiPanel { layout };
    }

    /// Open help over whatever is showing
    pub fn open_help(&mut self) {
        self.leave_task_detail();
        match self.mode {
            ViewMode::Help => return,
            ViewMode::Kanban => self.help_over_kanban = true,
            _ => self.snapshot = Some(self.capture()),
        }
        tracing::debug!(from = self.mode.name(), "open help");
        self.mode = ViewMode::Help;
    }

    /// Open the kanban board for the active role
    pub fn open_kanban(&mut self) -> Result<()> {
        if self.active_role.is_none() {
            return Err(TodoError::validation(
                "No role selected. Select a role to view its board.",
            ));
        }
        self.leave_task_detail();
        match self.mode {
            ViewMode::Kanban => return Ok(()),
            ViewMode::Help => {
                self.close_overlay();
            }
            _ => {}
        }
        if !self.mode.is_overlay() {
            self.snapshot = Some(self.capture());
        }
        tracing::debug!(from = self.mode.name(), "open kanban");
        self.mode = ViewMode::Kanban;
        Ok(())
    }

    /// Leave the current overlay. Returns false when none is open.
    pub fn close_overlay(&mut self) -> bool {
        match self.mode {
            ViewMode::Help if self.help_over_kanban => {
                self.help_over_kanban = false;
                self.mode = ViewMode::Kanban;
            }
            ViewMode::Help | ViewMode::Kanban => {
                self.help_over_kanban = false;
                match self.snapshot.take() {
                    Some(Snapshot { mode, active_role }) => {
                        self.mode = mode;
                        self.active_role = active_role;
                    }
                    None => self.mode = ViewMode::SinglePanel { role: self.active_role },
                }
            }
            _ => return false,
        }
        tracing::debug!(to = self.mode.name(), "close overlay");
        true
    }

    pub fn show_task(&mut self, task: TaskId) {
        let previous = match &self.mode {
            // the detail view never stacks
            ViewMode::TaskDetail { previous, .. } => previous.clone(),
            other => Box::new(other.clone()),
        };
        self.mode = ViewMode::TaskDetail { task, previous };
    }

    /// Returns true if a detail view was closed
    pub fn leave_task_detail(&mut self) -> bool {
        let mode = std::mem::replace(&mut self.mode, ViewMode::Help);
        match mode {
            ViewMode::TaskDetail { previous, .. } => {
                self.mode = *previous;
                true
            }
            other => {
                self.mode = other;
                false
            }
        }
    }

    /// Drop every reference to a deleted role
    pub fn forget_role(&mut self, role: RoleId) {
        if self.active_role == Some(role) {
            self.active_role = None;
        }
        self.mode.forget_role(role);
        if let Some(snapshot) = &mut self.snapshot {
            if snapshot.active_role == Some(role) {
                snapshot.active_role = None;
            }
            snapshot.mode.forget_role(role);
        }
    }

    fn capture(&self) -> Snapshot {
        Snapshot {
            mode: self.mode.clone(),
            active_role: self.active_role,
        }
    }
}
