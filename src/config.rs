use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-manager";
const BOOKS_FILE_NAME: &str = "books.txt";
const STUDENTS_FILE_NAME: &str = "students.txt";
const LOG_FILE_NAME: &str = "library-manager.log";

/// How a collection picks the id of a newly added record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Collection size plus one. Can repeat an id that is still in use once
    /// records have been deleted.
    #[default]
    Sequential,
    /// Largest id currently in the collection plus one.
    AfterMax,
}

impl IdPolicy {
    pub fn next_id(self, existing: impl Iterator<Item = u32>) -> u32 {
        match self {
            IdPolicy::Sequential => {
                let count = existing.count();
                u32::try_from(count).unwrap_or(u32::MAX).saturating_add(1)
            }
            IdPolicy::AfterMax => existing.max().unwrap_or(0).saturating_add(1),
        }
    }
}

/// Where the application keeps its files, passed explicitly to everything
/// that touches disk.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub data_dir: PathBuf,
    pub books_path: PathBuf,
    pub students_path: PathBuf,
    pub log_path: PathBuf,
    pub id_policy: IdPolicy,
}

impl LibraryConfig {
    /// Standard layout inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            data_dir: dir.to_path_buf(),
            books_path: dir.join(BOOKS_FILE_NAME),
            students_path: dir.join(STUDENTS_FILE_NAME),
            log_path: dir.join(LOG_FILE_NAME),
            id_policy: IdPolicy::default(),
        }
    }

    /// Standard layout under `~/.library-manager`.
    pub fn default_location() -> Result<Self> {
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self::in_dir(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    pub fn with_id_policy(mut self, id_policy: IdPolicy) -> Self {
        self.id_policy = id_policy;
        self
    }
}
