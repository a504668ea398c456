//! Listener-wide record of targets whose events are suppressed.
//!
//! An `edit-config` naming a target marks it suppressed; any other operation
//! naming the same target clears the mark. Every session on a listener shares
//! one map and the last writer wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared map from target name to its suppression flag.
#[derive(Debug, Clone, Default)]
pub struct ResetMap {
    entries: Arc<RwLock<HashMap<String, bool>>>,
}

impl ResetMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records whether events for `target` are suppressed.
    pub fn mark(&self, target: &str, suppress: bool) {
        self.entries
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(target.to_owned(), suppress);
    }

    /// Returns the flag for `target`, if one was ever recorded.
    #[must_use]
    pub fn get(&self, target: &str) -> Option<bool> {
        self.entries
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(target)
            .copied()
    }

    /// Returns true when events for `target` are suppressed.
    #[must_use]
    pub fn is_suppressed(&self, target: &str) -> bool {
        self.get(target).unwrap_or(false)
    }

    /// Copies the current contents.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.entries
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}
