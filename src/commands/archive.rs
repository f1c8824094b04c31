use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use ttodo::Store;
use ttodo::archive::{candidates, sweep};

/// Parse a duration string like "30d", "2w", "12h" into a chrono Duration
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (num_str, unit) = match s.char_indices().last() {
        Some((i, c @ ('d' | 'w' | 'h'))) => (&s[..i], c),
        // Default to days if no unit specified
        _ => (s, 'd'),
    };

    let num: i64 = num_str
        .parse()
        .with_context(|| format!("Invalid number in duration: '{}'", num_str))?;
    if num < 0 {
        anyhow::bail!("Duration must not be negative: '{}'", s);
    }

    Ok(match unit {
        'w' => Duration::weeks(num),
        'h' => Duration::hours(num),
        _ => Duration::days(num),
    })
}

pub fn run(
    store: &Store,
    default_age: Duration,
    dry_run: bool,
    older: Option<&str>,
    list: bool,
) -> Result<()> {
    if list {
        let archived = store.archived().context("Failed to read archive")?;
        if archived.is_empty() {
            println!("No archived tasks.");
        } else {
            println!("Archived tasks ({}):", archived.len());
            for entry in &archived {
                println!(
                    "  t{} - {} (archived: {})",
                    entry.task.number,
                    entry.task.title,
                    entry.archived_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        return Ok(());
    }

    let max_age = match older {
        Some(s) => parse_duration(s)?,
        None => default_age,
    };
    let now = Utc::now();

    if dry_run {
        let pending = candidates(store, max_age, now).context("Failed to load tasks")?;
        if pending.is_empty() {
            println!("No tasks to archive.");
        } else {
            println!("Would archive {} tasks:", pending.len());
            for task in &pending {
                let completed = task
                    .completed_at
                    .map(|c| c.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("  t{} - {} (completed: {})", task.number, task.title, completed);
            }
        }
        return Ok(());
    }

    let archived = sweep(store, max_age, now).context("Archive sweep failed")?;
    if archived == 0 {
        println!("No tasks to archive.");
    } else {
        println!("Archived {} tasks", archived);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use ttodo::Status;
    use ttodo::test_helpers::{complete_hours_ago, seed_store};

    #[test]
    fn test_parse_duration_days() {
        assert_eq!(parse_duration("30d").unwrap(), Duration::days(30));
    }

    #[test]
    fn test_parse_duration_weeks() {
        assert_eq!(parse_duration("2w").unwrap(), Duration::weeks(2));
    }

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration("12h").unwrap(), Duration::hours(12));
    }

    #[test]
    fn test_parse_duration_no_unit() {
        assert_eq!(parse_duration("7").unwrap(), Duration::days(7));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("xd").is_err());
        assert!(parse_duration("-3d").is_err());
    }

    #[test]
    fn test_run_dry_run_leaves_tasks() {
        let dir = tempdir().unwrap();
        let (store, roles) = seed_store(dir.path(), &["Work"]);
        let task = store.create_task(roles[0], "Old", None).unwrap();
        complete_hours_ago(&store, task, 48);

        run(&store, Duration::hours(24), true, None, false).unwrap();
        assert!(store.task(task).unwrap().is_some());
        assert!(store.archived().unwrap().is_empty());
    }

    #[test]
    fn test_run_archive() {
        let dir = tempdir().unwrap();
        let (store, roles) = seed_store(dir.path(), &["Work"]);
        let old = store.create_task(roles[0], "Old", None).unwrap();
        complete_hours_ago(&store, old, 48);
        let open = store.create_task(roles[0], "Open", None).unwrap();

        run(&store, Duration::hours(24), false, None, false).unwrap();
        assert!(store.task(old).unwrap().is_none());
        assert!(store.task(open).unwrap().is_some());
        assert_eq!(store.archived().unwrap().len(), 1);
    }

    #[test]
    fn test_run_older_overrides_default() {
        let dir = tempdir().unwrap();
        let (store, roles) = seed_store(dir.path(), &["Work"]);
        let task = store.create_task(roles[0], "Recent", None).unwrap();
        store.update_task_status(task, Status::Done).unwrap();
        complete_hours_ago(&store, task, 3);

        run(&store, Duration::hours(24), false, None, false).unwrap();
        assert!(store.task(task).unwrap().is_some());

        run(&store, Duration::hours(24), false, Some("2h"), false).unwrap();
        assert!(store.task(task).unwrap().is_none());
    }

    #[test]
    fn test_run_list() {
        let dir = tempdir().unwrap();
        let (store, _) = seed_store(dir.path(), &["Work"]);
        run(&store, Duration::hours(24), false, None, true).unwrap();
    }
}
