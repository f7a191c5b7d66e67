use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::codec::LineCodec;
use crate::error::{FormatError, LibraryError, Result};

/// A data file line that failed to decode and was left out of the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the file.
    pub line_number: usize,
    pub content: String,
    pub error: FormatError,
}

/// Outcome of loading a data file: the decoded records in file order plus
/// every line that had to be skipped.
#[derive(Debug, Clone)]
pub struct LoadReport<R> {
    pub records: Vec<R>,
    pub skipped: Vec<SkippedLine>,
}

/// One record collection backed by one line-oriented text file.
#[derive(Debug, Clone)]
pub struct LineStore {
    path: PathBuf,
}

impl LineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode every line of the file. Malformed lines are logged, reported in
    /// [`LoadReport::skipped`] and otherwise ignored; blank lines are ignored
    /// silently. A file that does not exist yet loads as an empty collection.
    pub fn load<R: LineCodec>(&self) -> Result<LoadReport<R>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "data file missing, starting empty");
                return Ok(LoadReport {
                    records: Vec::new(),
                    skipped: Vec::new(),
                });
            }
            Err(err) => return Err(LibraryError::io(&self.path, err)),
        };

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match R::decode(line) {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!(
                        path = %self.path.display(),
                        line = idx + 1,
                        "skipping malformed record: {error}"
                    );
                    skipped.push(SkippedLine {
                        line_number: idx + 1,
                        content: line.to_string(),
                        error,
                    });
                }
            }
        }

        debug!(
            path = %self.path.display(),
            loaded = records.len(),
            skipped = skipped.len(),
            "loaded data file"
        );
        Ok(LoadReport { records, skipped })
    }

    /// Rewrite the whole file with `records` in order, one line each. The new
    /// content goes to a sibling temporary file first and is then renamed over
    /// the target, so an interrupted save leaves the previous file intact.
    pub fn save<R: LineCodec>(&self, records: &[R]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| LibraryError::io(parent, err))?;
            }
        }

        let mut content = String::new();
        for record in records {
            content.push_str(&record.encode());
            content.push('\n');
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, content).map_err(|err| LibraryError::io(&tmp_path, err))?;
        fs::rename(&tmp_path, &self.path).map_err(|err| {
            let _ = fs::remove_file(&tmp_path);
            LibraryError::io(&self.path, err)
        })?;

        debug!(path = %self.path.display(), records = records.len(), "saved data file");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
