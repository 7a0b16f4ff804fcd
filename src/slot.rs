//! Slot allocation for connected controllers.
//!
//! A slot is the small integer a host uses to address a controller for the
//! lifetime of its connection. Freed slots are reused smallest-first, so a
//! sequence of connects and disconnects always yields the same indices.

use std::collections::BTreeSet;

/// Table of optional entries indexed by slot, with a smallest-first free list.
///
/// Invariant: an index is either occupied or in the free list, never both.
#[derive(Debug)]
pub struct SlotTable<T> {
    entries: Vec<Option<T>>,
    free: BTreeSet<usize>,
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free: BTreeSet::new(),
        }
    }
}

impl<T> SlotTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the lowest free slot, growing the table if none is free.
    ///
    /// The slot stays empty until [`fill`](Self::fill) is called.
    pub fn acquire(&mut self) -> usize {
        match self.free.pop_first() {
            Some(idx) => idx,
            None => {
                self.entries.push(None);
                self.entries.len() - 1
            }
        }
    }

    /// Store `value` in a slot obtained from [`acquire`](Self::acquire).
    pub fn fill(&mut self, idx: usize, value: T) {
        debug_assert!(!self.free.contains(&idx), "filling a free slot {idx}");
        if let Some(entry) = self.entries.get_mut(idx) {
            *entry = Some(value);
        }
    }

    /// Return a slot to the free list and take its entry.
    ///
    /// Releasing an index that is already free or was never handed out is a no-op.
    pub fn release(&mut self, idx: usize) -> Option<T> {
        if idx >= self.entries.len() || self.free.contains(&idx) {
            return None;
        }
        self.free.insert(idx);
        self.entries[idx].take()
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.entries.get(idx).and_then(Option::as_ref)
    }

    pub fn is_occupied(&self, idx: usize) -> bool {
        self.get(idx).is_some()
    }

    /// Occupied `(slot, entry)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|v| (i, v)))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
