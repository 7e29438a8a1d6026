//! Per-session document cache and change tracker.
//!
//! The cache keeps two views of every fetched document: an immutable [`Snapshot`] of the
//! state the server returned, and the live [`Document`] handle given to the caller. Comparing
//! the two is how modifications are detected. Entries are never evicted or replaced; the
//! cache lives exactly as long as the session that owns it.

use std::collections::HashMap;

use crate::document::{Document, FieldChange, Snapshot};

#[derive(Debug, Default)]
pub struct SessionCache {
    snapshots: HashMap<String, Snapshot>,
    changes: HashMap<String, Document>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: &str) -> bool {
        self.snapshots.contains_key(id)
    }

    /// Returns the fetch-time snapshot for `id`.
    pub fn get(&self, id: &str) -> Option<&Snapshot> {
        self.snapshots.get(id)
    }

    /// Registers a freshly fetched document.
    ///
    /// Stores a snapshot and tracks `document` as the live reference. Returns `false`
    /// without touching anything when `id` is already recorded: the first write wins.
    pub fn record(&mut self, document: &Document) -> bool {
        if self.has(document.id()) {
            return false;
        }

        let id = document.id().to_string();
        self.snapshots.insert(id.clone(), document.snapshot());
        self.changes.insert(id, document.clone());

        true
    }

    /// Returns the live document tracked for `id`.
    pub fn tracked(&self, id: &str) -> Option<&Document> {
        self.changes.get(id)
    }

    /// True if the tracked document no longer matches its snapshot.
    pub fn is_dirty(&self, id: &str) -> bool {
        match (self.snapshots.get(id), self.changes.get(id)) {
            (Some(snapshot), Some(document)) => !snapshot.matches(document),
            _ => false,
        }
    }

    /// Identifiers of every modified document, sorted.
    pub fn dirty_ids(&self) -> Vec<String> {
        let mut ids = self
            .snapshots
            .keys()
            .filter(|id| self.is_dirty(id))
            .cloned()
            .collect::<Vec<_>>();
        ids.sort();

        ids
    }

    /// Field-level changes of the tracked document for `id`.
    pub fn diff(&self, id: &str) -> Vec<FieldChange> {
        match (self.snapshots.get(id), self.changes.get(id)) {
            (Some(snapshot), Some(document)) => snapshot.diff(document),
            _ => Vec::new(),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
