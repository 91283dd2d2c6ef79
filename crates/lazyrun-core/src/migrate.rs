//! Upgrade of a [`RawDocument`] of any revision to the current schema.
//!
//! Missing fields are filled with defaults, existing ones are kept, and
//! every version stamp is set to [`CURRENT_SCHEMA_VERSION`]. The two
//! group representations are then reconciled so that a document written
//! by an older or interrupted tool satisfies the same invariants as one
//! written by [`Document`]'s own mutations.
//!
//! `migrate(migrate(d).into()) == migrate(d)` for every `d`.

use std::collections::BTreeMap;

use crate::document::{Document, Entry, Metadata, CURRENT_SCHEMA_VERSION};
use crate::raw::{RawDocument, RawEntry};

/// Upgrade `raw` to a [`Document`] in the current schema.
#[must_use]
pub fn migrate(raw: RawDocument) -> Document {
    let from_version = raw.schema_version();
    if from_version != Some(CURRENT_SCHEMA_VERSION) {
        tracing::debug!(
            from = ?from_version,
            to = CURRENT_SCHEMA_VERSION,
            "migrating shortcut document"
        );
    }

    let meta = match raw.meta {
        Some(meta) => Metadata {
            schema_version: CURRENT_SCHEMA_VERSION,
            groups: meta.groups.unwrap_or_default(),
            extra: meta.extra,
        },
        None => Metadata::default(),
    };

    let entries = raw
        .entries
        .into_iter()
        .map(|(name, raw_entry)| (name, upgrade_entry(raw_entry)))
        .collect();

    let mut doc = Document { entries, meta };
    reconcile_groups(&mut doc);
    doc
}

fn upgrade_entry(raw: RawEntry) -> Entry {
    match raw {
        RawEntry::Legacy(cmd) => Entry::new(cmd),
        RawEntry::Record(record) => Entry {
            cmd: record.cmd,
            tags: dedup(record.tags.unwrap_or_default()),
            groups: dedup(record.groups.unwrap_or_default()),
            schema_version: CURRENT_SCHEMA_VERSION,
            extra: record.extra,
        },
    }
}

/// Remove repeats, keeping the first occurrence.
fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Make `Entry::groups` and `Metadata::groups` agree.
///
/// Members naming a missing shortcut are dropped; every other one-sided
/// membership is completed on the other side. Entries are visited in name
/// order, so members added to a group table are appended deterministically.
fn reconcile_groups(doc: &mut Document) {
    let Document { entries, meta } = doc;

    for members in meta.groups.values_mut() {
        let kept = std::mem::take(members)
            .into_iter()
            .filter(|m| entries.contains_key(m))
            .collect();
        *members = dedup(kept);
    }

    for (name, entry) in entries.iter() {
        for group in &entry.groups {
            let members = meta.groups.entry(group.clone()).or_default();
            if !members.contains(name) {
                tracing::debug!(%name, %group, "restoring missing group table membership");
                members.push(name.clone());
            }
        }
    }

    let mut missing: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (group, members) in &meta.groups {
        for member in members {
            if let Some(entry) = entries.get(member) {
                if !entry.groups.contains(group) {
                    missing.entry(member.clone()).or_default().push(group.clone());
                }
            }
        }
    }
    for (name, groups) in missing {
        if let Some(entry) = entries.get_mut(&name) {
            tracing::debug!(%name, ?groups, "restoring missing entry group names");
            entry.groups.extend(groups);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::META_KEY;
    use proptest::prelude::*;
    use serde_json::json;

    fn migrate_json(value: serde_json::Value) -> Document {
        migrate(RawDocument::from_value(value).unwrap())
    }

    #[test]
    fn legacy_string_document_is_upgraded() {
        let doc = migrate_json(json!({"build": "make all"}));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            json!({
                "build": {"cmd": "make all", "tags": [], "groups": [], "schemaVersion": CURRENT_SCHEMA_VERSION},
                META_KEY: {"schemaVersion": CURRENT_SCHEMA_VERSION, "groups": {}}
            })
        );
    }

    #[test]
    fn record_without_version_keeps_its_fields() {
        let doc = migrate_json(json!({
            "deploy": {"cmd": "./deploy.sh", "tags": ["prod"], "note": "careful"}
        }));
        let entry = doc.get("deploy").unwrap();
        assert_eq!(entry.cmd, "./deploy.sh");
        assert_eq!(entry.tags, vec!["prod"]);
        assert!(entry.groups.is_empty());
        assert_eq!(entry.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(entry.extra["note"], "careful");
    }

    #[test]
    fn stale_versions_are_restamped() {
        let doc = migrate_json(json!({
            "a": {"cmd": "ls", "schemaVersion": 1},
            "_meta": {"schemaVersion": 1}
        }));
        assert_eq!(doc.meta.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(doc.get("a").unwrap().schema_version, CURRENT_SCHEMA_VERSION);
        assert!(doc.meta.groups.is_empty());
    }

    #[test]
    fn duplicate_tags_and_groups_are_collapsed() {
        let doc = migrate_json(json!({
            "a": {"cmd": "ls", "tags": ["x", "y", "x"], "groups": ["g", "g"]},
            "_meta": {"groups": {"g": ["a", "a"]}}
        }));
        assert_eq!(doc.get("a").unwrap().tags, vec!["x", "y"]);
        assert_eq!(doc.get("a").unwrap().groups, vec!["g"]);
        assert_eq!(doc.group_members("g"), vec!["a"]);
    }

    #[test]
    fn one_sided_group_memberships_are_completed() {
        let doc = migrate_json(json!({
            "a": {"cmd": "ls", "groups": ["g"]},
            "b": {"cmd": "pwd"},
            "_meta": {"groups": {"g": ["b", "ghost"], "empty": []}}
        }));
        assert_eq!(doc.group_members("g"), vec!["b", "a"]);
        assert_eq!(doc.get("b").unwrap().groups, vec!["g"]);
        assert!(doc.meta.groups.contains_key("empty"));
        assert!(doc.is_consistent());
    }

    #[test]
    fn group_order_survives_a_badly_shaped_meta_version() {
        let doc = migrate_json(json!({
            "a": {"cmd": "ls", "groups": ["g"]},
            "b": {"cmd": "pwd", "groups": ["g"]},
            "_meta": {"schemaVersion": "1", "groups": {"g": ["b", "a"]}}
        }));
        assert_eq!(doc.group_members("g"), vec!["b", "a"]);
        assert_eq!(doc.meta.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn badly_shaped_tags_default_to_empty() {
        let doc = migrate_json(json!({"build": {"cmd": "make all", "tags": "ci"}}));
        let entry = doc.get("build").unwrap();
        assert_eq!(entry.cmd, "make all");
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn empty_document_gets_metadata() {
        let doc = migrate(RawDocument::default());
        assert!(doc.entries.is_empty());
        assert_eq!(doc.meta, Metadata::default());
    }

    fn names() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(String::from)
    }

    fn labels() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop::sample::select(vec!["x", "y", "z"]).prop_map(String::from),
            0..4,
        )
    }

    fn raw_entry() -> impl Strategy<Value = RawEntry> {
        prop_oneof![
            "[a-z ]{0,8}".prop_map(RawEntry::Legacy),
            (
                "[a-z ]{0,8}",
                prop::option::of(labels()),
                prop::option::of(labels()),
                prop::option::of(0u32..4),
            )
                .prop_map(|(cmd, tags, groups, schema_version)| {
                    RawEntry::Record(crate::raw::RawRecord {
                        cmd,
                        tags,
                        groups,
                        schema_version,
                        extra: BTreeMap::new(),
                    })
                }),
        ]
    }

    fn raw_document() -> impl Strategy<Value = RawDocument> {
        (
            prop::collection::btree_map(names(), raw_entry(), 0..4),
            prop::option::of(prop::collection::btree_map(
                prop::sample::select(vec!["x", "y", "z"]).prop_map(String::from),
                prop::collection::vec(names(), 0..4),
                0..3,
            )),
            any::<bool>(),
        )
            .prop_map(|(entries, groups, with_meta)| RawDocument {
                meta: with_meta.then(|| crate::raw::RawMetadata {
                    schema_version: Some(1),
                    groups,
                    extra: BTreeMap::new(),
                }),
                entries,
                issues: Vec::new(),
            })
    }

    proptest! {
        #[test]
        fn migrate_is_idempotent(raw in raw_document()) {
            let once = migrate(raw);
            let twice = migrate(RawDocument::from(once.clone()));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn migrated_documents_are_consistent(raw in raw_document()) {
            prop_assert!(migrate(raw).is_consistent());
        }
    }
}
