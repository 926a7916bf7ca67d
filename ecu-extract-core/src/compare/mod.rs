//! Structural comparison of two parsed ECU extracts
//!
//! Records are matched by name within each kind. Every shared name is
//! checked against the kind's field list; differing fields are reported by
//! their serialized name.

pub mod fields;

pub use fields::{FieldDescriptor, FieldValue};

use crate::model::{
    MessageGroupRecord, MessageRecord, ParsedDocument, SignalGroupRecord, SignalRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A record kind that can be diffed
pub trait Comparable: Sized + 'static {
    /// Identity key within the kind
    fn name(&self) -> &str;

    /// Fields checked for shared records, in report order
    fn diff_fields() -> &'static [FieldDescriptor<Self>];
}

impl Comparable for MessageRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn diff_fields() -> &'static [FieldDescriptor<Self>] {
        fields::MESSAGE_FIELDS
    }
}

impl Comparable for SignalRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn diff_fields() -> &'static [FieldDescriptor<Self>] {
        fields::SIGNAL_FIELDS
    }
}

impl Comparable for SignalGroupRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn diff_fields() -> &'static [FieldDescriptor<Self>] {
        fields::SIGNAL_GROUP_FIELDS
    }
}

impl Comparable for MessageGroupRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn diff_fields() -> &'static [FieldDescriptor<Self>] {
        fields::MESSAGE_GROUP_FIELDS
    }
}

/// A record present on both sides with at least one differing field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedEntry<T> {
    pub old: T,
    pub new: T,
    pub changed_fields: Vec<String>,
}

/// Old and new value of one changed field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldChange<'a> {
    pub field: &'static str,
    pub old: FieldValue<'a>,
    pub new: FieldValue<'a>,
}

impl<T: Comparable> ModifiedEntry<T> {
    /// Values of every changed field, in field-list order
    pub fn changes(&self) -> Vec<FieldChange<'_>> {
        T::diff_fields()
            .iter()
            .filter(|field| self.changed_fields.iter().any(|name| name == field.name))
            .map(|field| FieldChange {
                field: field.name,
                old: (field.get)(&self.old),
                new: (field.get)(&self.new),
            })
            .collect()
    }
}

/// Diff of one record kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDiff<T> {
    pub added: Vec<T>,
    pub deleted: Vec<T>,
    pub modified: Vec<ModifiedEntry<T>>,
}

impl<T> Default for EntityDiff<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            deleted: Vec::new(),
            modified: Vec::new(),
        }
    }
}

impl<T> EntityDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            added: self.added.len(),
            deleted: self.deleted.len(),
            modified: self.modified.len(),
        }
    }
}

/// Classify records of one kind as added, deleted or modified
///
/// Names are keyed last-wins on each side. `added` and `deleted` keep the
/// order of `new` and `base`; `modified` follows `base` and holds each shared
/// name once, comparing the last record of that name on both sides.
pub fn diff<T: Comparable + Clone>(
    base: &[T],
    new: &[T],
    compare_fields: &[FieldDescriptor<T>],
) -> EntityDiff<T> {
    let base_map: HashMap<&str, &T> = base.iter().map(|item| (item.name(), item)).collect();
    let new_map: HashMap<&str, &T> = new.iter().map(|item| (item.name(), item)).collect();

    let added = new
        .iter()
        .filter(|item| !base_map.contains_key(item.name()))
        .cloned()
        .collect();
    let deleted = base
        .iter()
        .filter(|item| !new_map.contains_key(item.name()))
        .cloned()
        .collect();

    let modified = base
        .iter()
        .filter(|item| {
            base_map
                .get(item.name())
                .is_some_and(|winner| std::ptr::eq(*winner, *item))
        })
        .filter_map(|old| {
            let new = new_map.get(old.name())?;
            let changed_fields: Vec<String> = compare_fields
                .iter()
                .filter(|field| field.differs(old, new))
                .map(|field| field.name.to_string())
                .collect();

            (!changed_fields.is_empty()).then(|| ModifiedEntry {
                old: old.clone(),
                new: (*new).clone(),
                changed_fields,
            })
        })
        .collect();

    EntityDiff {
        added,
        deleted,
        modified,
    }
}

/// Diff of one record kind using its own field list
pub fn diff_kind<T: Comparable + Clone>(base: &[T], new: &[T]) -> EntityDiff<T> {
    diff(base, new, T::diff_fields())
}

/// Differences between two parsed documents, per record kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub messages: EntityDiff<MessageRecord>,
    pub signals: EntityDiff<SignalRecord>,
    pub signal_groups: EntityDiff<SignalGroupRecord>,
    pub message_groups: EntityDiff<MessageGroupRecord>,
}

/// Added/deleted/modified counts for one kind or in total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub deleted: usize,
    pub modified: usize,
}

impl ChangeCounts {
    fn sum(counts: &[ChangeCounts]) -> Self {
        counts.iter().fold(ChangeCounts::default(), |acc, c| ChangeCounts {
            added: acc.added + c.added,
            deleted: acc.deleted + c.deleted,
            modified: acc.modified + c.modified,
        })
    }
}

/// Comparison summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub total: ChangeCounts,
    pub messages: ChangeCounts,
    pub signals: ChangeCounts,
    pub signal_groups: ChangeCounts,
    pub message_groups: ChangeCounts,
}

impl ComparisonResult {
    /// Whether the two documents are equivalent for every kind
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
            && self.signals.is_empty()
            && self.signal_groups.is_empty()
            && self.message_groups.is_empty()
    }

    pub fn summary(&self) -> ComparisonSummary {
        let messages = self.messages.counts();
        let signals = self.signals.counts();
        let signal_groups = self.signal_groups.counts();
        let message_groups = self.message_groups.counts();

        ComparisonSummary {
            total: ChangeCounts::sum(&[messages, signals, signal_groups, message_groups]),
            messages,
            signals,
            signal_groups,
            message_groups,
        }
    }
}

/// Compare two parsed documents; never fails
pub fn compare(base: &ParsedDocument, new: &ParsedDocument) -> ComparisonResult {
    let result = ComparisonResult {
        messages: diff_kind(&base.messages, &new.messages),
        signals: diff_kind(&base.signals, &new.signals),
        signal_groups: diff_kind(&base.signal_groups, &new.signal_groups),
        message_groups: diff_kind(&base.message_groups, &new.message_groups),
    };

    let summary = result.summary();
    log::debug!(
        "Comparison: {} added, {} deleted, {} modified",
        summary.total.added,
        summary.total.deleted,
        summary.total.modified
    );

    result
}
