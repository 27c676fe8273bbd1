// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Template Diff
//!
//! Compares a freshly synthesized template against one written by an
//! earlier run. Resources are matched by logical id, which embeds the naming
//! suffix: two runs with different suffixes share no resources, so a
//! meaningful diff needs the suffix pinned to the earlier run's value.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::infrastructure::template::SUFFIX_METADATA_KEY;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
    pub outputs_added: Vec<String>,
    pub outputs_removed: Vec<String>,
    pub outputs_modified: Vec<String>,
    /// Both templates carry a suffix and they differ.
    pub suffix_changed: bool,
}

impl TemplateDiff {
    pub fn between(previous: &Value, current: &Value) -> Self {
        let (added, removed, modified) = compare_section(previous, current, "Resources");
        let (outputs_added, outputs_removed, outputs_modified) =
            compare_section(previous, current, "Outputs");

        let suffix_of = |template: &Value| template["Metadata"][SUFFIX_METADATA_KEY].as_u64();
        let suffix_changed = match (suffix_of(previous), suffix_of(current)) {
            (Some(before), Some(after)) => before != after,
            _ => false,
        };

        Self {
            added,
            removed,
            modified,
            outputs_added,
            outputs_removed,
            outputs_modified,
            suffix_changed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.outputs_added.is_empty()
            && self.outputs_removed.is_empty()
            && self.outputs_modified.is_empty()
    }
}

fn compare_section(
    previous: &Value,
    current: &Value,
    section: &str,
) -> (Vec<String>, Vec<String>, Vec<String>) {
    let empty = serde_json::Map::new();
    let before = previous[section].as_object().unwrap_or(&empty);
    let after = current[section].as_object().unwrap_or(&empty);

    let before_keys: BTreeSet<&String> = before.keys().collect();
    let after_keys: BTreeSet<&String> = after.keys().collect();

    let added = after_keys
        .difference(&before_keys)
        .map(|k| k.to_string())
        .collect();
    let removed = before_keys
        .difference(&after_keys)
        .map(|k| k.to_string())
        .collect();
    let modified = before_keys
        .intersection(&after_keys)
        .filter(|k| before.get(k.as_str()) != after.get(k.as_str()))
        .map(|k| k.to_string())
        .collect();

    (added, removed, modified)
}
