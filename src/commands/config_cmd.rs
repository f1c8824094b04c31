//! Configuration management commands

use anyhow::Result;
use std::path::Path;
use ttodo::Config;
use ttodo::config::CONFIG_FILE;

/// Show current configuration
pub fn show(dir: &Path) -> Result<()> {
    let config = Config::load(dir)?;

    println!("ttodo Configuration ({})", dir.join(CONFIG_FILE).display());
    println!("========================");
    println!();
    println!("[ui]");
    println!("  history_limit = {}", config.ui.history_limit);
    println!("  tick_ms = {}", config.ui.tick_ms);
    println!();
    println!("[archive]");
    println!("  enabled = {}", config.archive.enabled);
    println!("  after_hours = {}", config.archive.after_hours);
    println!("  interval_minutes = {}", config.archive.interval_minutes);
    println!("  shutdown_timeout_ms = {}", config.archive.shutdown_timeout_ms);
    println!();
    println!("[undo]");
    println!("  limit = {}", config.undo.limit);
    println!();
    println!("[log]");
    println!("  filter = \"{}\"", config.log.filter);

    Ok(())
}

/// Initialize default config file
pub fn init(dir: &Path) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    if Config::init(dir)? {
        println!("Created default configuration at {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_and_show() {
        let temp_dir = TempDir::new().unwrap();

        init(temp_dir.path()).unwrap();
        assert!(temp_dir.path().join(CONFIG_FILE).exists());

        show(temp_dir.path()).unwrap();
    }

    #[test]
    fn test_init_keeps_existing() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.undo.limit = 5;
        config.save(temp_dir.path()).unwrap();

        init(temp_dir.path()).unwrap();
        assert_eq!(Config::load(temp_dir.path()).unwrap().undo.limit, 5);
    }
}
