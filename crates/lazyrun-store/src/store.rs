//! Shortcut operations over the store file.
//!
//! Every call loads (and migrates) the whole document. Mutations run under
//! the store lock and write the whole document back; a mutation that fails
//! writes nothing.

use std::collections::BTreeMap;
use std::path::Path;

use lazyrun_core::{migrate, Document, Entry, NotFound, Result};

use crate::config::StoreConfig;
use crate::persistence::{LoadReport, StoreFile};
use crate::runner::{CommandRunner, RunMode, RunOutcome, RunReport};

/// The shortcut store.
#[derive(Debug, Clone)]
pub struct ShortcutStore {
    file: StoreFile,
}

impl ShortcutStore {
    #[must_use]
    pub fn open(config: &StoreConfig) -> Self {
        Self {
            file: StoreFile::new(config.path()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Load and migrate the current document.
    ///
    /// # Errors
    ///
    /// Returns [`lazyrun_core::LazyrunError::Io`] if the store file cannot be read.
    pub fn load(&self) -> Result<Document> {
        Ok(migrate(self.file.load()?))
    }

    /// Load without migrating, with the outcome of the read.
    ///
    /// # Errors
    ///
    /// Returns [`lazyrun_core::LazyrunError::Io`] if the store file cannot be read.
    pub fn load_report(&self) -> Result<LoadReport> {
        self.file.load_report()
    }

    /// Run `op` on the locked, freshly loaded document and save the result.
    fn mutate<T>(&self, op: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let _lock = self.file.lock()?;
        let mut doc = self.load()?;
        let value = op(&mut doc)?;
        self.file.save(&doc)?;
        Ok(value)
    }

    /// Every shortcut, keyed by name.
    ///
    /// # Errors
    ///
    /// Returns [`lazyrun_core::LazyrunError::Io`] if the store file cannot be read.
    pub fn get_all(&self) -> Result<BTreeMap<String, Entry>> {
        Ok(self.load()?.entries)
    }

    /// # Errors
    ///
    /// Returns [`lazyrun_core::LazyrunError::Io`] if the store file cannot be read.
    pub fn get_shortcut(&self, name: &str) -> Result<Option<Entry>> {
        Ok(self.load()?.entries.remove(name))
    }

    /// Create `name` or replace its command.
    ///
    /// # Errors
    ///
    /// Returns [`lazyrun_core::LazyrunError::InvalidName`] for an empty or
    /// reserved name, or an I/O error from the store file.
    pub fn set_shortcut(&self, name: &str, cmd: &str) -> Result<()> {
        self.mutate(|doc| doc.set_shortcut(name, cmd))?;
        tracing::debug!(%name, "shortcut saved");
        Ok(())
    }

    /// Delete `name` if present. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the store file.
    pub fn delete_shortcut(&self, name: &str) -> Result<bool> {
        self.mutate(|doc| Ok(doc.remove_shortcut(name)))
    }

    /// Returns `false` if `name` already had `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Shortcut`] if `name` does not exist.
    pub fn add_tag(&self, name: &str, tag: &str) -> Result<bool> {
        self.mutate(|doc| doc.add_tag(name, tag))
    }

    /// # Errors
    ///
    /// Returns [`NotFound`] if `name` does not exist or lacks `tag`.
    pub fn remove_tag(&self, name: &str, tag: &str) -> Result<()> {
        self.mutate(|doc| doc.remove_tag(name, tag))
    }

    /// Tags of `name`; empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the store file.
    pub fn list_tags(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.load()?.tags(name))
    }

    /// Add `name` to `group` at `priority` (clamped) or at the end.
    /// Returns `false` if it was already a member.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Shortcut`] if `name` does not exist.
    pub fn add_to_group(&self, name: &str, group: &str, priority: Option<i64>) -> Result<bool> {
        self.mutate(|doc| doc.add_to_group(name, group, priority))
    }

    /// # Errors
    ///
    /// Returns [`NotFound::GroupMember`] if `name` is not in `group`.
    pub fn remove_from_group(&self, name: &str, group: &str) -> Result<()> {
        self.mutate(|doc| doc.remove_from_group(name, group))
    }

    /// Members of `group` in execution order; empty if unknown.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the store file.
    pub fn list_group_members(&self, group: &str) -> Result<Vec<String>> {
        Ok(self.load()?.group_members(group))
    }

    /// Every group, including empty ones, with its ordered members.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the store file.
    pub fn list_groups(&self) -> Result<BTreeMap<String, Vec<String>>> {
        Ok(self.load()?.meta.groups)
    }

    /// Run the single shortcut `name` and wait for it.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Shortcut`] if `name` does not exist.
    pub fn run_shortcut(&self, name: &str, runner: &dyn CommandRunner) -> Result<RunReport> {
        let entry = self.get_shortcut(name)?.ok_or_else(|| NotFound::Shortcut {
            name: name.to_string(),
        })?;
        Ok(launch(runner, name, &entry.cmd, RunMode::Wait))
    }

    /// Run every shortcut tagged `tag`, in name order.
    ///
    /// With `synchronous` each command finishes before the next starts;
    /// otherwise all are launched without waiting. A launch failure is
    /// reported in its [`RunReport`] and the rest still run.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the store file.
    pub fn run_by_tag(
        &self,
        tag: &str,
        synchronous: bool,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<RunReport>> {
        let doc = self.load()?;
        let mode = if synchronous {
            RunMode::Wait
        } else {
            RunMode::Detach
        };
        Ok(doc
            .tagged(tag)
            .into_iter()
            .map(|(name, entry)| launch(runner, name, &entry.cmd, mode))
            .collect())
    }

    /// Run the members of `group` in stored order, each to completion.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the store file.
    pub fn run_by_group(&self, group: &str, runner: &dyn CommandRunner) -> Result<Vec<RunReport>> {
        let doc = self.load()?;
        Ok(doc
            .group_members(group)
            .iter()
            .filter_map(|name| doc.get(name).map(|entry| (name, entry)))
            .map(|(name, entry)| launch(runner, name, &entry.cmd, RunMode::Wait))
            .collect())
    }
}

fn launch(runner: &dyn CommandRunner, name: &str, cmd: &str, mode: RunMode) -> RunReport {
    tracing::info!(%name, %cmd, ?mode, "running shortcut");
    let outcome = runner
        .run(cmd, mode)
        .unwrap_or_else(|e| RunOutcome::Failed(e.to_string()));
    if let RunOutcome::Failed(reason) = &outcome {
        tracing::warn!(%name, %reason, "shortcut failed to launch");
    }
    RunReport {
        name: name.to_string(),
        cmd: cmd.to_string(),
        outcome,
    }
}
