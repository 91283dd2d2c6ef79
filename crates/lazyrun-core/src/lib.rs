//! # lazyrun-core
//!
//! Core types and schema migration for the lazyrun shortcut store.
//!
//! This crate defines the foundational types used by the other lazyrun crates:
//! - [`Document`] — the fully-migrated store contents
//! - [`Entry`] and [`Metadata`] — one saved shortcut, and the `_meta` section
//! - [`RawDocument`] — the on-disk shape of any schema revision
//! - [`migrate`] — upgrade of a [`RawDocument`] to the current schema
//! - Error hierarchy ([`LazyrunError`], [`NotFound`])

pub mod document;
pub mod error;
pub mod migrate;
pub mod raw;

pub use document::{validate_name, Document, Entry, Metadata, CURRENT_SCHEMA_VERSION, META_KEY};
pub use error::{LazyrunError, NotFound, Result};
pub use migrate::migrate;
pub use raw::{LoadIssue, RawDocument, RawEntry, RawMetadata, RawRecord};
