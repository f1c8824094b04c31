use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ttodo::Config;

mod commands;
mod tui;

#[derive(Parser)]
#[command(name = "ttodo")]
#[command(about = "ttodo - roles, tasks and panels in the terminal")]
#[command(version)]
struct Cli {
    /// Path to the data directory (default: the platform data dir)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive terminal UI (the default)
    Tui {
        /// Data refresh rate in milliseconds
        #[arg(long, default_value = "2000")]
        refresh_rate: u64,
    },

    /// Archive completed tasks now
    Archive {
        /// Show what would be archived without doing it
        #[arg(long)]
        dry_run: bool,

        /// Only archive tasks completed more than this long ago (e.g. 30d, 2w, 12h)
        #[arg(long)]
        older: Option<String>,

        /// List archived tasks
        #[arg(long)]
        list: bool,
    },

    /// List roles
    Roles,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dir = match cli.dir {
        Some(dir) => dir,
        None => Config::default_dir()?,
    };
    let config = Config::load(&dir)?;
    ttodo::logging::init(&dir, &config.log.filter)?;
    tracing::debug!(dir = %dir.display(), "data directory");

    let command = cli.command.unwrap_or(Commands::Tui { refresh_rate: 2000 });
    match command {
        Commands::Tui { refresh_rate } => {
            tui::run(commands::open_store(&dir, &config), &config, refresh_rate)
        }
        Commands::Archive {
            dry_run,
            older,
            list,
        } => commands::archive::run(
            &commands::open_store(&dir, &config),
            config.archive.max_age(),
            dry_run,
            older.as_deref(),
            list,
        ),
        Commands::Roles => commands::roles::run(&commands::open_store(&dir, &config)),
        Commands::Config { show, init } => {
            if init {
                commands::config_cmd::init(&dir)?;
            }
            if show || !init {
                commands::config_cmd::show(&dir)?;
            }
            Ok(())
        }
    }
}
