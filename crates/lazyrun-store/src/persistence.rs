//! Reading and writing the store file.
//!
//! A missing file loads as an empty document. A file that is not a JSON
//! object also loads as an empty document: the problem is logged and
//! reported through [`LoadSource::Recovered`], never returned as an error.
//! A file that parses but had values dropped or repaired loads as
//! [`LoadSource::Repaired`].
//! Saves write a sibling temp file and rename it over the target, so a
//! crash mid-save leaves the previous file intact.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use lazyrun_core::{Document, LazyrunError, LoadIssue, RawDocument, Result};

/// How a [`LoadReport`] was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// No store file yet.
    Missing,
    /// The file parsed cleanly.
    Parsed,
    /// The file parsed, but some values had to be dropped or defaulted.
    Repaired { issues: Vec<LoadIssue> },
    /// The file was unreadable as a document and was replaced by an empty one.
    Recovered { reason: String },
}

/// The raw document plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub document: RawDocument,
    pub source: LoadSource,
}

/// The JSON file backing a shortcut store.
#[derive(Debug, Clone)]
pub struct StoreFile {
    path: PathBuf,
}

impl StoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.dir().join(name)
    }

    /// Load the raw document, substituting an empty one for a missing or
    /// corrupt file.
    ///
    /// # Errors
    ///
    /// Returns [`LazyrunError::Io`] if the file exists but cannot be read.
    pub fn load_report(&self) -> Result<LoadReport> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no store file yet");
                return Ok(LoadReport {
                    document: RawDocument::default(),
                    source: LoadSource::Missing,
                });
            }
            Err(e) => return Err(e.into()),
        };

        match RawDocument::parse(&bytes) {
            Ok(document) => {
                tracing::debug!(
                    path = %self.path.display(),
                    shortcuts = document.entries.len(),
                    "loaded store file"
                );
                let source = if document.issues.is_empty() {
                    LoadSource::Parsed
                } else {
                    tracing::warn!(
                        path = %self.path.display(),
                        issues = document.issues.len(),
                        "store file had malformed values"
                    );
                    LoadSource::Repaired {
                        issues: document.issues.clone(),
                    }
                };
                Ok(LoadReport { document, source })
            }
            Err(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "store file is corrupt, starting from an empty document"
                );
                Ok(LoadReport {
                    document: RawDocument::default(),
                    source: LoadSource::Recovered { reason },
                })
            }
        }
    }

    /// Load the raw document. See [`StoreFile::load_report`].
    ///
    /// # Errors
    ///
    /// Returns [`LazyrunError::Io`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<RawDocument> {
        self.load_report().map(|report| report.document)
    }

    /// Overwrite the store file with `doc`, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns [`LazyrunError::Io`] if the directory, temp file, or rename fails.
    pub fn save(&self, doc: &Document) -> Result<()> {
        fs::create_dir_all(self.dir())?;

        let mut json = serde_json::to_string_pretty(doc)
            .map_err(|e| LazyrunError::Serialization(e.to_string()))?;
        json.push('\n');

        let temp_path = self.sibling(".tmp");
        let mut temp = File::create(&temp_path)?;
        temp.write_all(json.as_bytes())?;
        temp.sync_all()?;
        drop(temp);
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            shortcuts = doc.entries.len(),
            "saved store file"
        );
        Ok(())
    }

    /// Block until this process holds the store's exclusive lock.
    ///
    /// The lock lives on a sibling `.lock` file and is released when the
    /// returned guard drops.
    ///
    /// # Errors
    ///
    /// Returns [`LazyrunError::Io`] if the lock file cannot be created and
    /// [`LazyrunError::Lock`] if locking fails.
    pub fn lock(&self) -> Result<StoreLock> {
        fs::create_dir_all(self.dir())?;
        let lock_path = self.sibling(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| LazyrunError::Lock(format!("{}: {e}", lock_path.display())))?;
        tracing::debug!(path = %lock_path.display(), "acquired store lock");
        Ok(StoreLock { file })
    }
}

/// Exclusive store lock; released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
