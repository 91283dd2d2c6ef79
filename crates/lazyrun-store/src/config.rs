//! Store location resolution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the store file path.
pub const STORE_ENV: &str = "LAZYRUN_STORE";

const APP_DIR: &str = "lazyrun";
const STORE_FILE: &str = "config.json";

/// Where the shortcut store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the store path: `explicit`, then `$LAZYRUN_STORE`, then the
    /// per-user configuration directory.
    #[must_use]
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        Self::resolve_with(explicit, std::env::var_os(STORE_ENV))
    }

    fn resolve_with(explicit: Option<PathBuf>, env: Option<OsString>) -> Self {
        let path = explicit
            .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(default_store_path);
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `<config dir>/lazyrun/config.json`, or `./.lazyrun/config.json` on
/// platforms without a configuration directory.
#[must_use]
pub fn default_store_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR).join(STORE_FILE),
        None => PathBuf::from(format!(".{APP_DIR}")).join(STORE_FILE),
    }
}
