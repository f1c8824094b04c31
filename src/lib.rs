pub mod archive;
pub mod command;
pub mod config;
pub mod date;
pub mod error;
pub mod input;
pub mod layout;
pub mod logging;
pub mod modal;
pub mod model;
pub mod navigator;
pub mod palette;
pub mod session;
pub mod storage;
pub mod store;
pub mod view;

#[cfg(any(test, feature = "test-support"))]
pub mod test_helpers;

pub use archive::{ArchiveScheduler, Schedule, shutdown_runtime};
pub use command::{Command, TaskAction};
pub use config::Config;
pub use error::{ErrorKind, Result, TodoError};
pub use layout::{Template, template};
pub use modal::{Effect, ModalMachine, ModalState, Notice};
pub use model::{Database, LayoutRecord, Role, RoleId, Status, Task, TaskId};
pub use navigator::{Direction, PanelLayout, PanelSlot, neighbor, next_focus};
pub use session::{Key, NavigationState, Session};
pub use storage::StorageError;
pub use store::Store;
pub use view::{Snapshot, ViewMode, ViewOrchestrator};
