use crate::config::UiConfig;
use crate::model::{Role, RoleId, Status, Task, TaskId};
use crate::palette::role_color;
use crate::session::Session;
use crate::store::Store;
use chrono::{NaiveDate, Utc};
use std::path::Path;

/// The date sessions built here treat as today (a Wednesday)
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
}

/// Create a role with the given id, number and name, everything else defaulted.
pub fn make_role(id: RoleId, number: u32, name: &str) -> Role {
    Role {
        id,
        number,
        name: name.to_string(),
        color: role_color((number as usize).saturating_sub(1)).to_string(),
        ..Role::default()
    }
}

/// Create a task with the given id, role, number and title.
pub fn make_task(id: TaskId, role_id: RoleId, number: u32, title: &str) -> Task {
    Task {
        id,
        role_id,
        number,
        title: title.to_string(),
        ..Task::default()
    }
}

/// Open a store in `dir` and create one role per name, in order.
pub fn seed_store(dir: &Path, roles: &[&str]) -> (Store, Vec<RoleId>) {
    let store = Store::open(dir);
    let ids = roles
        .iter()
        .enumerate()
        .map(|(i, name)| store.create_role(name, role_color(i)).unwrap())
        .collect();
    (store, ids)
}

/// A session on `store` whose clock is pinned to [`fixed_today`].
pub fn session_for(store: Store) -> Session {
    Session::new(store, &UiConfig::default())
        .unwrap()
        .with_clock(fixed_today)
}

/// Feed lines to a session, panicking on the first error.
pub fn submit_all(session: &mut Session, lines: &[&str]) {
    for line in lines {
        if let Err(e) = session.submit_line(line) {
            panic!("line {:?} failed: {}", line, e);
        }
    }
}

/// Mark a task done with a completion time `hours` in the past.
pub fn complete_hours_ago(store: &Store, task: TaskId, hours: i64) {
    store
        .transact(|db| {
            let t = db.task_mut(task).unwrap();
            t.status = Status::Done;
            t.completed_at = Some(Utc::now() - chrono::Duration::hours(hours));
            Ok(())
        })
        .unwrap();
}
