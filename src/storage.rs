use crate::model::Database;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Lock error: {0}")]
    Lock(String),
}

/// RAII guard for file locks - automatically releases lock on drop
pub struct FileLock {
    #[cfg(unix)]
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock on a lock file, blocking until available
    #[cfg(unix)]
    pub fn acquire<P: AsRef<Path>>(lock_path: P) -> Result<Self, StorageError> {
        if let Some(parent) = lock_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        let fd = file.as_raw_fd();
        let ret = unsafe { libc::flock(fd, libc::LOCK_EX) };

        if ret != 0 {
            return Err(StorageError::Lock(format!(
                "Failed to acquire lock on {:?}: {}",
                lock_path.as_ref(),
                std::io::Error::last_os_error()
            )));
        }

        Ok(FileLock { file })
    }

    #[cfg(not(unix))]
    pub fn acquire<P: AsRef<Path>>(_lock_path: P) -> Result<Self, StorageError> {
        // No flock outside unix; the in-process mutex in Store still serializes
        Ok(FileLock {})
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            let fd = self.file.as_raw_fd();
            unsafe {
                libc::flock(fd, libc::LOCK_UN);
            }
        }
    }
}

/// Lock file path next to the data file
pub fn lock_path<P: AsRef<Path>>(data_path: P) -> PathBuf {
    match data_path.as_ref().parent() {
        Some(parent) => parent.join("todo.lock"),
        None => PathBuf::from("todo.lock"),
    }
}

/// Read the database from disk. A missing file is an empty database.
///
/// The caller is expected to hold the [`FileLock`].
pub fn read_database<P: AsRef<Path>>(path: P) -> Result<Database, StorageError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Database::default());
    }
    let file = File::open(path)?;
    let meta = file.metadata()?;
    if meta.len() == 0 {
        return Ok(Database::default());
    }
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the database with an atomic temp-file + rename.
///
/// The caller is expected to hold the [`FileLock`].
pub fn write_database<P: AsRef<Path>>(db: &Database, path: P) -> Result<(), StorageError> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;
    let tmp_path = parent.join(format!(".todo.tmp.{}", std::process::id()));

    let result = (|| -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;

        let json = serde_json::to_string_pretty(db).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        #[cfg(unix)]
        {
            let rc = unsafe { libc::fsync(file.as_raw_fd()) };
            if rc != 0 {
                return Err(StorageError::Io(std::io::Error::last_os_error()));
            }
        }

        Ok(())
    })();

    if result.is_ok() {
        std::fs::rename(&tmp_path, path)?;
    } else {
        let _ = std::fs::remove_file(&tmp_path);
    }

    result
}

/// Load the database under the advisory lock
pub fn load_database<P: AsRef<Path>>(path: P) -> Result<Database, StorageError> {
    let _lock = FileLock::acquire(lock_path(&path))?;
    read_database(path)
}
