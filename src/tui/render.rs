//! Drawing. Every builder here takes plain data and returns ratatui text, so
//! what a panel shows can be tested without a terminal.

use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use ttodo::date::format_relative;
use ttodo::layout::template;
use ttodo::modal::{Level, Notice};
use ttodo::model::{Database, Role, RoleId, Status, Task, due_order};
use ttodo::palette::{active_color, hex_to_rgb, muted_color};
use ttodo::{Session, ViewMode};

const WELCOME: &str = "Welcome to ttodo. Type 'new role' to get started, or 'help' for commands.";

pub fn hex_color(hex: &str) -> Color {
    match hex_to_rgb(hex) {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => Color::Reset,
    }
}

/// Draw the whole screen
pub fn draw(frame: &mut Frame, session: &Session) {
    let [main, status, input] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(frame.area());

    draw_main(frame, session, main);
    frame.render_widget(Paragraph::new(status_line(session)), status);
    draw_input(frame, session, input);
}

fn draw_main(frame: &mut Frame, session: &Session, area: Rect) {
    let db = session.data();
    let today = session.today();
    match session.view().mode() {
        ViewMode::SinglePanel { role } => match role.and_then(|id| db.role(id)) {
            Some(role) => draw_role_panel(frame, db, role, today, true, session.scroll_offset(0), area),
            None => {
                let welcome = Paragraph::new(welcome_lines(db))
                    .block(Block::default().borders(Borders::ALL).title(" ttodo "))
                    .wrap(Wrap { trim: false });
                frame.render_widget(welcome, area);
            }
        },
        ViewMode::MultiPanel { layout } => {
            let Ok(tpl) = template(layout.count()) else {
                return;
            };
            let rects = tpl.split(area);
            for (slot, rect) in layout.slots().iter().zip(rects) {
                match slot.role.and_then(|id| db.role(id)) {
                    Some(role) => draw_role_panel(
                        frame,
                        db,
                        role,
                        today,
                        slot.focused,
                        session.scroll_offset(slot.index),
                        rect,
                    ),
                    None => draw_empty_panel(frame, slot.index, slot.focused, rect),
                }
            }
        }
        ViewMode::Kanban => {
            if let Some(role) = session.view().active_role().and_then(|id| db.role(id)) {
                draw_kanban(frame, db, role, today, area);
            }
        }
        ViewMode::TaskDetail { task, .. } => {
            if let Some(task) = db.task(*task) {
                let role = db.role(task.role_id);
                let color = role.map(|r| hex_color(&r.color)).unwrap_or(Color::Reset);
                let title = format!(
                    " Task Details - {} ",
                    role.map(|r| r.name.as_str()).unwrap_or("?")
                );
                let detail = Paragraph::new(detail_lines(task, today))
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(title)
                            .border_style(Style::default().fg(color)),
                    )
                    .wrap(Wrap { trim: false });
                frame.render_widget(detail, area);
            }
        }
        ViewMode::Help => {
            let help = Paragraph::new(help_lines())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Help ")
                        .border_style(Style::default().fg(Color::Yellow)),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(help, area);
        }
    }
}

fn draw_role_panel(
    frame: &mut Frame,
    db: &Database,
    role: &Role,
    today: NaiveDate,
    focused: bool,
    scroll: u16,
    area: Rect,
) {
    let border = if focused {
        hex_color(&active_color(&role.color))
    } else {
        hex_color(&role.color)
    };
    let mut title_style = Style::default().fg(border);
    if focused {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {} (r{}) ", role.name, role.number), title_style))
        .border_style(Style::default().fg(border));
    let panel = Paragraph::new(role_panel_lines(db, role, today))
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(panel, area);
}

fn draw_empty_panel(frame: &mut Frame, index: usize, focused: bool, area: Rect) {
    let style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let panel = Paragraph::new(Line::from(Span::styled(
        "Empty panel. Type r<N> to show a role here.",
        Style::default().fg(Color::DarkGray),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Panel {} ", index + 1))
            .border_style(style),
    )
    .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn draw_kanban(frame: &mut Frame, db: &Database, role: &Role, today: NaiveDate, area: Rect) {
    let color = hex_color(&role.color);
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Kanban - {} (r{}) ", role.name, role.number))
        .border_style(Style::default().fg(color));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let columns = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(inner);
    for (status, rect) in [Status::Todo, Status::Doing, Status::Done].into_iter().zip(columns.iter()) {
        let tasks = kanban_column(db, role.id, status);
        let title = format!(" {} ({}) ", status.as_str().to_uppercase(), tasks.len());
        let lines: Vec<Line<'static>> = if tasks.is_empty() {
            vec![Line::from(Span::styled(
                "(empty)",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            tasks
                .iter()
                .flat_map(|t| kanban_card(t, today, &role.color))
                .collect()
        };
        let column = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(column, *rect);
    }
}

fn draw_input(frame: &mut Frame, session: &Session, area: Rect) {
    let input = session.input();
    let border = if session.modal_state().is_idle() {
        Color::DarkGray
    } else {
        Color::Yellow
    };
    let widget = Paragraph::new(format!("> {}", input.text())).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", session.prompt()))
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(widget, area);
    if !session.navigation().active {
        let x = area.x + 3 + input.text().chars().count() as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

// ── Builders ─────────────────────────────────────────────────────────

pub fn welcome_lines(db: &Database) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(""), Line::from(WELCOME), Line::from("")];
    let roles = db.roles_ordered();
    if !roles.is_empty() {
        lines.push(Line::from(Span::styled(
            "Roles:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for role in roles {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  r{} ", role.number),
                    Style::default().fg(hex_color(&role.color)).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{} ({} tasks)", role.name, db.task_count(role.id))),
            ]));
        }
    }
    lines
}

fn task_line(task: &Task, today: NaiveDate, color: &str) -> Line<'static> {
    let base = hex_color(color);
    let mut spans = vec![
        Span::styled(
            format!("t{}: ", task.number),
            Style::default().fg(base).add_modifier(Modifier::BOLD),
        ),
        Span::styled(task.title.clone(), Style::default().fg(base)),
    ];
    if let Some(due) = task.due_date {
        spans.push(Span::styled(
            format!(" - {}", format_relative(due, today)),
            Style::default().fg(hex_color(&muted_color(color))),
        ));
    }
    Line::from(spans)
}

/// Doing tasks under an IN PROGRESS banner, then todo tasks
pub fn role_panel_lines(db: &Database, role: &Role, today: NaiveDate) -> Vec<Line<'static>> {
    let tasks = db.tasks_for_role(role.id);
    let doing: Vec<&Task> = tasks.iter().copied().filter(|t| t.status == Status::Doing).collect();
    let todo: Vec<&Task> = tasks.iter().copied().filter(|t| t.status == Status::Todo).collect();
    let rule = Style::default().fg(hex_color(&muted_color(&role.color)));

    let mut lines = Vec::new();
    if !doing.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("{} IN PROGRESS {}", "─".repeat(8), "─".repeat(8)),
            rule,
        )));
        lines.extend(doing.iter().map(|t| task_line(t, today, &role.color)));
        lines.push(Line::from(Span::styled("─".repeat(29), rule)));
        lines.push(Line::from(""));
    }
    lines.extend(todo.iter().map(|t| task_line(t, today, &role.color)));
    if doing.is_empty() && todo.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tasks yet. Use 'add' to create a task.",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

/// Tasks of one kanban column, by due date with undated last
pub fn kanban_column<'a>(db: &'a Database, role: RoleId, status: Status) -> Vec<&'a Task> {
    let mut tasks: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| t.role_id == role && t.status == status)
        .collect();
    tasks.sort_by(|a, b| due_order(a, b));
    tasks
}

pub fn kanban_card(task: &Task, today: NaiveDate, color: &str) -> Vec<Line<'static>> {
    let mut meta = Vec::new();
    if let Some(due) = task.due_date {
        meta.push(format_relative(due, today));
    }
    if let Some(priority) = task.priority {
        meta.push(format!("P:{}", priority.as_str()));
    }
    if let Some(points) = task.story_points {
        meta.push(format!("SP:{}", points));
    }
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("t{} ", task.number),
            Style::default().fg(hex_color(color)).add_modifier(Modifier::BOLD),
        ),
        Span::raw(task.title.clone()),
    ])];
    if !meta.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {}", meta.join(" | ")),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(""));
    lines
}

pub fn detail_lines(task: &Task, today: NaiveDate) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let field = |name: &str, value: String| {
        Line::from(vec![Span::styled(format!("{}: ", name), bold), Span::raw(value)])
    };

    let mut lines = vec![
        Line::from(Span::styled(format!("Task t{}: {}", task.number, task.title), bold)),
        Line::from(""),
    ];
    lines.push(match task.due_date {
        Some(due) => field("Due", format!("{} ({})", format_relative(due, today), due)),
        None => field("Due", "No due date set".to_string()),
    });
    if let Some(priority) = task.priority {
        lines.push(field("Priority", priority.as_str().to_string()));
    }
    if let Some(points) = task.story_points {
        lines.push(field("Story Points", points.to_string()));
    }
    lines.push(field("Status", task.status.label().to_string()));
    if let Some(description) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Description:", bold)));
        lines.extend(description.lines().map(|l| Line::from(l.to_string())));
    }
    if let Some(done) = task.completed_at {
        lines.push(Line::from(""));
        lines.push(field("Completed", done.format("%Y-%m-%d %H:%M UTC").to_string()));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Press Enter to return]",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));
    lines
}

pub fn help_lines() -> Vec<Line<'static>> {
    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    };
    let binding = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<18}", key), Style::default().fg(Color::Yellow)),
            Span::raw(desc),
        ])
    };
    vec![
        heading("Roles"),
        binding("new role", "Create a role (prompts for a name)"),
        binding("r<N>", "Show role N (into the focused panel in window mode)"),
        binding("role remap", "Renumber roles with name:number"),
        binding("delete", "Delete the active role (must have no tasks)"),
        Line::from(""),
        heading("Tasks"),
        binding("add", "Add a task to the active role"),
        binding("t<N> view", "Show task details"),
        binding("t<N> edit", "Edit title and due date"),
        binding("t<N> delete", "Delete a task"),
        binding("t<N> doing|done|todo", "Change status"),
        binding("undo", "Restore the last deleted task"),
        Line::from(""),
        heading("Views"),
        binding("window <1-8>", "Split the screen into panels"),
        binding("close", "Close the focused panel"),
        binding("k", "Kanban board for the active role"),
        binding("r", "Return from help or kanban"),
        binding("help", "Show this help"),
        binding("exit", "Quit (or Ctrl+C)"),
        Line::from(""),
        heading("Keys"),
        binding("Tab", "Focus next panel"),
        binding("Esc", "Clear input, cancel a prompt, or enter navigation"),
        binding("Up / Down", "History, or scroll in navigation"),
        binding("Left / Right", "Move focus in navigation"),
        binding("Space + arrow", "Move the focused panel in navigation"),
        binding("any letter", "Leave navigation"),
    ]
}

fn notice_style(level: Level) -> Style {
    match level {
        Level::Info => Style::default().fg(Color::Cyan),
        Level::Success => Style::default().fg(Color::Green),
        Level::Warning => Style::default().fg(Color::Yellow),
        Level::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// Mode badge, NAV indicator and the latest notice
pub fn status_line(session: &Session) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" {} ", session.view().mode().name().to_uppercase()),
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if session.navigation().active {
        let label = if session.navigation().space_held { " NAV+MOVE " } else { " NAV " };
        spans.push(Span::styled(
            label,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(Notice { level, text }) = session.notice() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(text.clone(), notice_style(*level)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use tempfile::TempDir;
    use ttodo::Key;
    use ttodo::test_helpers::{fixed_today, seed_store, session_for, submit_all};

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn screen(session: &Session) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, session)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_role_panel_sections() {
        let dir = TempDir::new().unwrap();
        let (store, roles) = seed_store(dir.path(), &["Work"]);
        let a = store.create_task(roles[0], "Write", None).unwrap();
        store
            .create_task(roles[0], "Read", fixed_today().succ_opt())
            .unwrap();
        store.update_task_status(a, Status::Doing).unwrap();
        let db = store.snapshot().unwrap();
        let role = db.role(roles[0]).unwrap();

        let out = text(&role_panel_lines(&db, role, fixed_today()));
        let banner = out.find("IN PROGRESS").unwrap();
        let doing = out.find("t1: Write").unwrap();
        let todo = out.find("t2: Read - Tomorrow").unwrap();
        assert!(banner < doing && doing < todo);
    }

    #[test]
    fn test_empty_role_panel_hint() {
        let dir = TempDir::new().unwrap();
        let (store, roles) = seed_store(dir.path(), &["Work"]);
        let db = store.snapshot().unwrap();
        let out = text(&role_panel_lines(&db, db.role(roles[0]).unwrap(), fixed_today()));
        assert!(out.contains("No tasks yet"));
    }

    #[test]
    fn test_kanban_column_orders_by_due_date() {
        let dir = TempDir::new().unwrap();
        let (store, roles) = seed_store(dir.path(), &["Work"]);
        let today = fixed_today();
        store.create_task(roles[0], "Undated", None).unwrap();
        store
            .create_task(roles[0], "Later", today.checked_add_days(chrono::Days::new(5)))
            .unwrap();
        store.create_task(roles[0], "Sooner", Some(today)).unwrap();
        let db = store.snapshot().unwrap();
        let titles: Vec<&str> = kanban_column(&db, roles[0], Status::Todo)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, ["Sooner", "Later", "Undated"]);
    }

    #[test]
    fn test_detail_lines() {
        let mut task = ttodo::test_helpers::make_task(1, 1, 4, "Plan trip");
        task.due_date = Some(fixed_today());
        task.status = Status::Doing;
        task.description = Some("Book flights".into());
        let out = text(&detail_lines(&task, fixed_today()));
        assert!(out.contains("Task t4: Plan trip"));
        assert!(out.contains("Due: Today (2025-10-15)"));
        assert!(out.contains("Status: In Progress"));
        assert!(out.contains("Book flights"));
        assert!(out.contains("Press Enter to return"));
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#D4A574"), Color::Rgb(0xD4, 0xA5, 0x74));
        assert_eq!(hex_color("nope"), Color::Reset);
    }

    #[test]
    fn test_screen_shows_welcome_then_role() {
        let dir = TempDir::new().unwrap();
        let (store, _) = seed_store(dir.path(), &[]);
        let mut session = session_for(store);
        assert!(screen(&session).contains("Welcome to ttodo"));

        submit_all(&mut session, &["new role", "Work", "add", "Buy milk", ""]);
        let shown = screen(&session);
        assert!(shown.contains("Work (r1)"));
        assert!(shown.contains("t1: Buy milk"));
    }

    #[test]
    fn test_screen_shows_every_panel_of_a_window() {
        let dir = TempDir::new().unwrap();
        let (store, _) = seed_store(dir.path(), &["Work", "Home"]);
        let mut session = session_for(store);
        submit_all(&mut session, &["window 3", "r1", "", "r2"]);
        let shown = screen(&session);
        assert!(shown.contains("Work (r1)"));
        assert!(shown.contains("Panel 2"));
        assert!(shown.contains("Home (r2)"));
    }

    #[test]
    fn test_status_line_shows_nav_and_notice() {
        let dir = TempDir::new().unwrap();
        let (store, _) = seed_store(dir.path(), &[]);
        let mut session = session_for(store);
        session.handle_key(Key::Esc);
        let out = text(&[status_line(&session)]);
        assert!(out.contains("NAV"));

        session.handle_key(Key::Char('x'));
        session.handle_key(Key::Enter);
        let out = text(&[status_line(&session)]);
        assert!(out.contains("Unknown command"));
    }

    #[test]
    fn test_prompt_is_drawn_for_pending_question() {
        let dir = TempDir::new().unwrap();
        let (store, _) = seed_store(dir.path(), &[]);
        let mut session = session_for(store);
        submit_all(&mut session, &["new role"]);
        assert!(screen(&session).contains("Enter role name:"));
    }
}
