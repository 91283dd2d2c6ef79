//! Document type — the fully-migrated contents of the shortcut store.
//!
//! On disk the document is a single JSON object: every key is a shortcut
//! name except the reserved `_meta` key, which holds the schema version and
//! the group ordering tables.
//!
//! ```json
//! {
//!   "build": { "cmd": "make all", "tags": ["ci"], "groups": ["release"], "schemaVersion": 2 },
//!   "_meta": { "schemaVersion": 2, "groups": { "release": ["build"] } }
//! }
//! ```
//!
//! Group membership is recorded twice: in each [`Entry::groups`] and in
//! [`Metadata::groups`], which alone carries the member order. Every
//! mutation in this module updates both sides together.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{LazyrunError, NotFound, Result};

/// Schema revision written by this version of lazyrun.
///
/// - 0: bare string shortcuts (`{"build": "make all"}`)
/// - 1: `{cmd, tags, groups}` records without a version stamp
/// - 2: version-stamped records plus the `_meta` section
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Reserved top-level key holding [`Metadata`].
pub const META_KEY: &str = "_meta";

/// The stored record for one shortcut.
///
/// Serialize-only: files are read through [`crate::RawDocument`] and [`crate::migrate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub cmd: String,
    pub tags: Vec<String>,
    pub groups: Vec<String>,
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,

    /// Fields written by other tools or newer revisions, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Entry {
    /// A fresh entry with no tags or groups.
    #[must_use]
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            tags: Vec::new(),
            groups: Vec::new(),
            schema_version: CURRENT_SCHEMA_VERSION,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The `_meta` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    /// Group name to member names, in execution order.
    pub groups: BTreeMap<String, Vec<String>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            groups: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Check that `name` may be used as a shortcut name.
///
/// # Errors
///
/// Returns [`LazyrunError::InvalidName`] for an empty name or the reserved `_meta` key.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name == META_KEY {
        return Err(LazyrunError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// All shortcuts plus metadata, in the current schema.
///
/// Produced only by [`crate::migrate`]; every other part of lazyrun works
/// on this type rather than on the raw on-disk shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub entries: BTreeMap<String, Entry>,
    pub meta: Metadata,
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.serialize_entry(META_KEY, &self.meta)?;
        map.end()
    }
}

impl Document {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut Entry> {
        self.entries.get_mut(name).ok_or_else(|| {
            NotFound::Shortcut {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Create `name`, or replace its command if it exists. Tags and groups are kept.
    ///
    /// # Errors
    ///
    /// Returns [`LazyrunError::InvalidName`] if `name` is empty or reserved.
    pub fn set_shortcut(&mut self, name: &str, cmd: &str) -> Result<()> {
        validate_name(name)?;
        match self.entries.get_mut(name) {
            Some(entry) => entry.cmd = cmd.to_string(),
            None => {
                self.entries.insert(name.to_string(), Entry::new(cmd));
            }
        }
        Ok(())
    }

    /// Remove `name` and every group reference to it. Returns whether it existed.
    pub fn remove_shortcut(&mut self, name: &str) -> bool {
        let Some(entry) = self.entries.remove(name) else {
            return false;
        };
        for group in &entry.groups {
            if let Some(members) = self.meta.groups.get_mut(group) {
                members.retain(|m| m != name);
            }
        }
        // Sweep every table in case the document was repaired from a partial state.
        for members in self.meta.groups.values_mut() {
            members.retain(|m| m != name);
        }
        true
    }

    /// Append `tag` to `name`. Returns `false` if the tag was already present.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Shortcut`] if `name` does not exist.
    pub fn add_tag(&mut self, name: &str, tag: &str) -> Result<bool> {
        let entry = self.entry_mut(name)?;
        if entry.has_tag(tag) {
            return Ok(false);
        }
        entry.tags.push(tag.to_string());
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`NotFound`] if `name` does not exist or does not carry `tag`.
    pub fn remove_tag(&mut self, name: &str, tag: &str) -> Result<()> {
        let entry = self.entry_mut(name)?;
        let before = entry.tags.len();
        entry.tags.retain(|t| t != tag);
        if entry.tags.len() == before {
            return Err(NotFound::Tag {
                name: name.to_string(),
                tag: tag.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Tags of `name`; empty for an unknown shortcut.
    #[must_use]
    pub fn tags(&self, name: &str) -> Vec<String> {
        self.get(name).map(|e| e.tags.clone()).unwrap_or_default()
    }

    /// Add `name` to `group`, at `priority` (clamped to the group length) or at the end.
    ///
    /// Returns `false` if `name` was already a member; the order is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::Shortcut`] if `name` does not exist.
    pub fn add_to_group(&mut self, name: &str, group: &str, priority: Option<i64>) -> Result<bool> {
        if !self.entries.contains_key(name) {
            return Err(NotFound::Shortcut {
                name: name.to_string(),
            }
            .into());
        }

        let members = self.meta.groups.entry(group.to_string()).or_default();
        if members.iter().any(|m| m == name) {
            return Ok(false);
        }
        let index = match priority {
            Some(p) => usize::try_from(p.max(0)).unwrap_or(usize::MAX).min(members.len()),
            None => members.len(),
        };
        members.insert(index, name.to_string());

        let entry = self.entry_mut(name)?;
        if !entry.groups.iter().any(|g| g == group) {
            entry.groups.push(group.to_string());
        }
        Ok(true)
    }

    /// Remove `name` from `group`. An emptied group stays listed.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound::GroupMember`] if `name` is not currently a member.
    pub fn remove_from_group(&mut self, name: &str, group: &str) -> Result<()> {
        let is_member = self.entries.contains_key(name)
            && self
                .meta
                .groups
                .get(group)
                .is_some_and(|members| members.iter().any(|m| m == name));
        if !is_member {
            return Err(NotFound::GroupMember {
                name: name.to_string(),
                group: group.to_string(),
            }
            .into());
        }

        if let Some(members) = self.meta.groups.get_mut(group) {
            members.retain(|m| m != name);
        }
        let entry = self.entry_mut(name)?;
        entry.groups.retain(|g| g != group);
        Ok(())
    }

    /// Members of `group` in stored order; empty for an unknown group.
    #[must_use]
    pub fn group_members(&self, group: &str) -> Vec<String> {
        self.meta.groups.get(group).cloned().unwrap_or_default()
    }

    /// Shortcuts carrying `tag`, sorted by name.
    #[must_use]
    pub fn tagged(&self, tag: &str) -> Vec<(&str, &Entry)> {
        // BTreeMap iteration is already name-ordered.
        self.entries
            .iter()
            .filter(|(_, e)| e.has_tag(tag))
            .map(|(n, e)| (n.as_str(), e))
            .collect()
    }

    /// Whether tags and groups are duplicate-free and both group
    /// representations agree.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        for (name, entry) in &self.entries {
            if has_duplicates(&entry.tags) || has_duplicates(&entry.groups) {
                return false;
            }
            for group in &entry.groups {
                let listed = self
                    .meta
                    .groups
                    .get(group)
                    .is_some_and(|members| members.contains(name));
                if !listed {
                    return false;
                }
            }
        }
        self.meta.groups.iter().all(|(group, members)| {
            !has_duplicates(members)
                && members.iter().all(|m| {
                    self.entries
                        .get(m)
                        .is_some_and(|e| e.groups.contains(group))
                })
        })
    }
}

fn has_duplicates(items: &[String]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, item)| items[..i].contains(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(names: &[&str]) -> Document {
        let mut doc = Document::default();
        for name in names {
            doc.set_shortcut(name, &format!("echo {name}")).unwrap();
        }
        doc
    }

    #[test]
    fn set_shortcut_keeps_tags_and_groups() {
        let mut doc = doc_with(&["build"]);
        doc.add_tag("build", "ci").unwrap();
        doc.add_to_group("build", "release", None).unwrap();

        doc.set_shortcut("build", "make all").unwrap();

        let entry = doc.get("build").unwrap();
        assert_eq!(entry.cmd, "make all");
        assert_eq!(entry.tags, vec!["ci"]);
        assert_eq!(entry.groups, vec!["release"]);
    }

    #[test]
    fn set_shortcut_rejects_reserved_and_empty_names() {
        let mut doc = Document::default();
        assert!(matches!(
            doc.set_shortcut(META_KEY, "ls"),
            Err(LazyrunError::InvalidName(_))
        ));
        assert!(matches!(
            doc.set_shortcut("  ", "ls"),
            Err(LazyrunError::InvalidName(_))
        ));
        assert!(doc.entries.is_empty());
    }

    #[test]
    fn add_tag_twice_keeps_one() {
        let mut doc = doc_with(&["build"]);
        assert!(doc.add_tag("build", "ci").unwrap());
        assert!(!doc.add_tag("build", "ci").unwrap());
        assert_eq!(doc.tags("build"), vec!["ci"]);
    }

    #[test]
    fn add_tag_on_missing_shortcut_is_not_found() {
        let mut doc = Document::default();
        let err = doc.add_tag("missing", "ci").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn remove_tag_reports_missing_name_and_missing_tag() {
        let mut doc = doc_with(&["build"]);
        assert!(matches!(
            doc.remove_tag("missing", "x"),
            Err(LazyrunError::NotFound(NotFound::Shortcut { .. }))
        ));
        assert!(matches!(
            doc.remove_tag("build", "x"),
            Err(LazyrunError::NotFound(NotFound::Tag { .. }))
        ));
    }

    #[test]
    fn tags_of_unknown_shortcut_is_empty() {
        assert!(Document::default().tags("nope").is_empty());
    }

    #[test]
    fn priority_inserts_at_front_and_clamps_past_end() {
        let mut doc = doc_with(&["a", "b", "x"]);
        doc.add_to_group("a", "g", None).unwrap();
        doc.add_to_group("b", "g", None).unwrap();

        let mut front = doc.clone();
        front.add_to_group("x", "g", Some(0)).unwrap();
        assert_eq!(front.group_members("g"), vec!["x", "a", "b"]);

        let mut back = doc.clone();
        back.add_to_group("x", "g", Some(5)).unwrap();
        assert_eq!(back.group_members("g"), vec!["a", "b", "x"]);

        let mut negative = doc;
        negative.add_to_group("x", "g", Some(-3)).unwrap();
        assert_eq!(negative.group_members("g"), vec!["x", "a", "b"]);
    }

    #[test]
    fn add_to_group_twice_keeps_position() {
        let mut doc = doc_with(&["a", "b"]);
        doc.add_to_group("a", "g", None).unwrap();
        doc.add_to_group("b", "g", None).unwrap();
        assert!(!doc.add_to_group("b", "g", Some(0)).unwrap());
        assert_eq!(doc.group_members("g"), vec!["a", "b"]);
        assert_eq!(doc.get("b").unwrap().groups, vec!["g"]);
    }

    #[test]
    fn add_to_group_on_missing_shortcut_creates_nothing() {
        let mut doc = Document::default();
        assert!(doc.add_to_group("ghost", "g", None).is_err());
        assert!(doc.meta.groups.is_empty());
    }

    #[test]
    fn remove_from_group_leaves_empty_group_listed() {
        let mut doc = doc_with(&["a"]);
        doc.add_to_group("a", "g", None).unwrap();
        doc.remove_from_group("a", "g").unwrap();

        assert!(doc.meta.groups.contains_key("g"));
        assert!(doc.group_members("g").is_empty());
        assert!(doc.get("a").unwrap().groups.is_empty());
        assert!(doc.is_consistent());
    }

    #[test]
    fn remove_from_group_when_not_member_is_not_found() {
        let mut doc = doc_with(&["a"]);
        assert!(matches!(
            doc.remove_from_group("a", "g"),
            Err(LazyrunError::NotFound(NotFound::GroupMember { .. }))
        ));
        assert!(doc.remove_from_group("ghost", "g").is_err());
    }

    #[test]
    fn remove_shortcut_clears_group_tables() {
        let mut doc = doc_with(&["a", "b"]);
        doc.add_to_group("a", "g1", None).unwrap();
        doc.add_to_group("a", "g2", None).unwrap();
        doc.add_to_group("b", "g1", None).unwrap();

        assert!(doc.remove_shortcut("a"));
        assert!(!doc.remove_shortcut("a"));

        assert_eq!(doc.group_members("g1"), vec!["b"]);
        assert!(doc.group_members("g2").is_empty());
        assert!(doc.is_consistent());
    }

    #[test]
    fn tagged_is_sorted_by_name() {
        let mut doc = doc_with(&["zeta", "alpha", "mid"]);
        for name in ["zeta", "alpha"] {
            doc.add_tag(name, "ci").unwrap();
        }
        let names: Vec<&str> = doc.tagged("ci").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(String),
        Remove(String),
        AddTag(String, String),
        RemoveTag(String, String),
        AddToGroup(String, String, Option<i64>),
        RemoveFromGroup(String, String),
    }

    fn op() -> impl proptest::strategy::Strategy<Value = Op> {
        use proptest::prelude::*;
        let name = || prop::sample::select(vec!["a", "b", "c"]).prop_map(String::from);
        let label = || prop::sample::select(vec!["x", "y"]).prop_map(String::from);
        prop_oneof![
            name().prop_map(Op::Set),
            name().prop_map(Op::Remove),
            (name(), label()).prop_map(|(n, t)| Op::AddTag(n, t)),
            (name(), label()).prop_map(|(n, t)| Op::RemoveTag(n, t)),
            (name(), label(), prop::option::of(-2i64..5))
                .prop_map(|(n, g, p)| Op::AddToGroup(n, g, p)),
            (name(), label()).prop_map(|(n, g)| Op::RemoveFromGroup(n, g)),
        ]
    }

    proptest::proptest! {
        #[test]
        fn invariants_hold_after_any_operation_sequence(ops in proptest::collection::vec(op(), 0..40)) {
            let mut doc = Document::default();
            for op in ops {
                // NotFound results are expected here; only the invariants matter.
                let _ = match op {
                    Op::Set(n) => doc.set_shortcut(&n, "cmd"),
                    Op::Remove(n) => {
                        doc.remove_shortcut(&n);
                        proptest::prop_assert!(doc.meta.groups.values().all(|m| !m.contains(&n)));
                        Ok(())
                    }
                    Op::AddTag(n, t) => doc.add_tag(&n, &t).map(drop),
                    Op::RemoveTag(n, t) => doc.remove_tag(&n, &t),
                    Op::AddToGroup(n, g, p) => doc.add_to_group(&n, &g, p).map(drop),
                    Op::RemoveFromGroup(n, g) => doc.remove_from_group(&n, &g),
                };
                proptest::prop_assert!(doc.is_consistent());
            }
        }
    }

    #[test]
    fn serializes_meta_alongside_entries() {
        let doc = doc_with(&["build"]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["build"]["cmd"], "echo build");
        assert_eq!(json["build"]["schemaVersion"], CURRENT_SCHEMA_VERSION);
        assert_eq!(json[META_KEY]["schemaVersion"], CURRENT_SCHEMA_VERSION);
        assert!(json[META_KEY]["groups"].as_object().unwrap().is_empty());
    }
}
