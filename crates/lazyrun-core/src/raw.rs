//! The on-disk document as it was written, by any schema revision.
//!
//! A shortcut value is either a bare command string (revision 0) or a
//! record whose optional fields may be missing (revisions 1 and 2). This
//! shape is resolved exactly once, by [`crate::migrate`], right after
//! deserialization.
//!
//! Parsing is field by field: a record keeps its entry as long as `cmd` is
//! a string, and a badly shaped optional field falls back to its default.
//! Everything discarded along the way is listed in [`RawDocument::issues`].

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::document::{Document, Entry, Metadata, META_KEY};

/// A shortcut value in any revision.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEntry {
    Legacy(String),
    Record(RawRecord),
}

/// An entry-shaped shortcut value; only `cmd` is required.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub cmd: String,
    pub tags: Option<Vec<String>>,
    pub groups: Option<Vec<String>>,
    pub schema_version: Option<u32>,
    pub extra: BTreeMap<String, Value>,
}

/// The `_meta` section in any revision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawMetadata {
    pub schema_version: Option<u32>,
    pub groups: Option<BTreeMap<String, Vec<String>>>,
    pub extra: BTreeMap<String, Value>,
}

/// Something in the file that could not be kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadIssue {
    /// The value under `name` had no string `cmd` and was dropped.
    DroppedEntry { name: String },
    /// `field` of `owner` (a shortcut name or `_meta`) was badly shaped;
    /// its unusable parts were discarded.
    RepairedField { owner: String, field: String },
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadIssue::DroppedEntry { name } => write!(f, "dropped shortcut '{name}'"),
            LoadIssue::RepairedField { owner, field } => {
                write!(f, "repaired field '{field}' of '{owner}'")
            }
        }
    }
}

/// A loaded but not yet migrated document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawDocument {
    pub meta: Option<RawMetadata>,
    pub entries: BTreeMap<String, RawEntry>,
    /// What parsing had to drop or repair; empty for a well-formed file.
    pub issues: Vec<LoadIssue>,
}

impl RawDocument {
    /// Parse the bytes of a store file.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the bytes are not JSON or
    /// the top-level value is not an object.
    pub fn parse(bytes: &[u8]) -> Result<Self, String> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        Self::from_value(value)
    }

    /// Build from an already-parsed JSON value. See [`RawDocument::parse`].
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err("top-level value is not an object".to_string());
        };

        let mut doc = RawDocument::default();
        for (key, value) in map {
            let mut fields = Fields {
                owner: &key,
                issues: &mut doc.issues,
            };
            if key == META_KEY {
                doc.meta = fields.meta(value);
                continue;
            }
            match fields.entry(value) {
                Some(entry) => {
                    doc.entries.insert(key, entry);
                }
                None => {
                    tracing::warn!(name = %key, "dropping shortcut without a command");
                    doc.issues.push(LoadIssue::DroppedEntry { name: key });
                }
            }
        }
        Ok(doc)
    }

    /// Schema revision the document claims, if it has a `_meta` stamp.
    #[must_use]
    pub fn schema_version(&self) -> Option<u32> {
        self.meta.as_ref().and_then(|m| m.schema_version)
    }
}

/// Lenient readers for the fields of one top-level value.
struct Fields<'a> {
    owner: &'a str,
    issues: &'a mut Vec<LoadIssue>,
}

impl Fields<'_> {
    fn repaired(&mut self, field: &str) {
        tracing::warn!(owner = %self.owner, %field, "repairing badly shaped field");
        self.issues.push(LoadIssue::RepairedField {
            owner: self.owner.to_string(),
            field: field.to_string(),
        });
    }

    fn entry(&mut self, value: Value) -> Option<RawEntry> {
        let mut map = match value {
            Value::String(cmd) => return Some(RawEntry::Legacy(cmd)),
            Value::Object(map) => map,
            _ => return None,
        };
        let Some(Value::String(cmd)) = map.remove("cmd") else {
            return None;
        };
        Some(RawEntry::Record(RawRecord {
            cmd,
            tags: self.list("tags", map.remove("tags")),
            groups: self.list("groups", map.remove("groups")),
            schema_version: self.version(map.remove("schemaVersion")),
            extra: map.into_iter().collect(),
        }))
    }

    fn meta(&mut self, value: Value) -> Option<RawMetadata> {
        let Value::Object(mut map) = value else {
            self.repaired(META_KEY);
            return None;
        };
        Some(RawMetadata {
            schema_version: self.version(map.remove("schemaVersion")),
            groups: self.groups(map.remove("groups")),
            extra: map.into_iter().collect(),
        })
    }

    fn groups(&mut self, value: Option<Value>) -> Option<BTreeMap<String, Vec<String>>> {
        let tables: Map<String, Value> = match value? {
            Value::Null => return None,
            Value::Object(tables) => tables,
            _ => {
                self.repaired("groups");
                return None;
            }
        };
        let mut groups = BTreeMap::new();
        for (group, members) in tables {
            let field = format!("groups.{group}");
            if let Some(members) = self.list(&field, Some(members)) {
                groups.insert(group, members);
            }
        }
        Some(groups)
    }

    /// The string items of an array. Non-string items are discarded; any
    /// other shape is discarded whole.
    fn list(&mut self, field: &str, value: Option<Value>) -> Option<Vec<String>> {
        let items = match value? {
            Value::Null => return None,
            Value::Array(items) => items,
            _ => {
                self.repaired(field);
                return None;
            }
        };
        let total = items.len();
        let strings: Vec<String> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        if strings.len() != total {
            self.repaired(field);
        }
        Some(strings)
    }

    fn version(&mut self, value: Option<Value>) -> Option<u32> {
        match value? {
            Value::Null => None,
            other => {
                let version = other.as_u64().and_then(|v| u32::try_from(v).ok());
                if version.is_none() {
                    self.repaired("schemaVersion");
                }
                version
            }
        }
    }
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        RawEntry::Record(RawRecord {
            cmd: entry.cmd,
            tags: Some(entry.tags),
            groups: Some(entry.groups),
            schema_version: Some(entry.schema_version),
            extra: entry.extra,
        })
    }
}

impl From<Metadata> for RawMetadata {
    fn from(meta: Metadata) -> Self {
        RawMetadata {
            schema_version: Some(meta.schema_version),
            groups: Some(meta.groups),
            extra: meta.extra,
        }
    }
}

impl From<Document> for RawDocument {
    fn from(doc: Document) -> Self {
        RawDocument {
            meta: Some(doc.meta.into()),
            entries: doc
                .entries
                .into_iter()
                .map(|(name, entry)| (name, entry.into()))
                .collect(),
            issues: Vec::new(),
        }
    }
}
