//! Priority-sorted list shared by the emitter and the registry reload.

use std::cmp::Ordering;

/// Priority used when none is given. Lower runs earlier.
pub const DEFAULT_PRIORITY: f64 = 0.0;

/// A list kept sorted by ascending priority.
///
/// Items with equal priority keep their insertion order, so the list behaves
/// like a stable sort re-run after every insertion.
#[derive(Debug, Clone)]
pub struct PriorityList<T> {
    entries: Vec<(T, f64)>,
}

impl<T> PriorityList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert `item` after every entry whose priority is `<= priority`.
    pub fn insert(&mut self, item: T, priority: f64) {
        let at = self
            .entries
            .partition_point(|(_, p)| p.total_cmp(&priority) != Ordering::Greater);
        self.entries.insert(at, (item, priority));
    }

    /// Keep only the entries matching `keep`. Returns how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|(item, _)| keep(item));
        before - self.entries.len()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries with their priorities, in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.entries.iter().map(|(item, priority)| (item, *priority))
    }

    /// Items in execution order.
    pub fn into_items(self) -> Vec<T> {
        self.entries.into_iter().map(|(item, _)| item).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for PriorityList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(T, f64)> for PriorityList<T> {
    fn from_iter<I: IntoIterator<Item = (T, f64)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (item, priority) in iter {
            list.insert(item, priority);
        }
        list
    }
}
