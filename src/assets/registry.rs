use std::collections::HashMap;

use crate::scene_graph::ObjectId;

/// Immutable name → scene object mapping produced by a completed load batch.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: HashMap<String, ObjectId>,
}

impl ModelRegistry {
    pub(crate) fn from_entries<N: Into<String>>(
        entries: impl IntoIterator<Item = (N, ObjectId)>,
    ) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, id)| (name.into(), id))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<ObjectId> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
