//! # lazyrun-store
//!
//! The shortcut store on disk and the operations built on it.
//!
//! The store file is the only source of truth. Every operation loads it
//! (migrating older revisions), works on the in-memory [`Document`], and
//! mutating operations write the whole document back under an exclusive
//! lock.
//!
//! [`Document`]: lazyrun_core::Document

pub mod config;
pub mod persistence;
pub mod runner;
pub mod store;

pub use config::StoreConfig;
pub use persistence::{LoadReport, LoadSource, StoreFile};
pub use runner::{CommandRunner, RunMode, RunOutcome, RunReport, ShellRunner};
pub use store::ShortcutStore;
