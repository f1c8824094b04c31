use anyhow::{Context, Result};
use ttodo::Store;

/// Print every role with its number, colour and task count
pub fn run(store: &Store) -> Result<()> {
    let db = store.snapshot().context("Failed to load todo data")?;
    let roles = db.roles_ordered();
    if roles.is_empty() {
        println!("No roles yet. Start ttodo and type 'new role'.");
        return Ok(());
    }

    let width = roles.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for role in roles {
        println!(
            "r{:<3} {:<width$}  {}  {} tasks",
            role.number,
            role.name,
            role.color,
            db.task_count(role.id),
            width = width
        );
    }
    Ok(())
}
