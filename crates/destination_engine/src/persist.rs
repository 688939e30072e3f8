use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use store_logging::store_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode state: {0}")]
    Encode(#[from] ron::Error),
    #[error("failed to decode state: {0}")]
    Decode(#[from] ron::error::SpannedError),
}

/// Ensure the state directory exists; create if missing.
pub fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// RON state files kept between sessions, such as the recent destinations.
/// Writes go through a temp file and a rename, so readers see either the
/// old or the new content.
pub struct StateDir {
    dir: PathBuf,
}

impl StateDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// `Ok(None)` when the file has never been written.
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>, PersistError> {
        let path = self.dir.join(filename);
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(ron::from_str(&content)?))
    }

    pub fn save<T: Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf, PersistError> {
        let content = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::new())?;
        ensure_state_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        store_debug!("Saved {:?}", target);
        Ok(target)
    }
}
