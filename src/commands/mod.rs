pub mod archive;
pub mod config_cmd;
pub mod roles;

use std::path::Path;

use ttodo::{Config, Store};

/// Open the data store in `dir` with the configured undo depth
pub fn open_store(dir: &Path, config: &Config) -> Store {
    Store::open(dir).with_undo_limit(config.undo.limit)
}
