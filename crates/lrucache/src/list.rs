//! Recency list backed by a slot arena
//!
//! Entries are addressed by stable slot indices instead of pointers, so
//! relinking is O(1) and no entry owns its neighbours. Slot 0 is the head
//! sentinel and slot 1 the tail sentinel; real entries live strictly
//! between them, least recently used first.

use std::iter::FusedIterator;

use crate::error::{Error, Result};

const HEAD: usize = 0;
const TAIL: usize = 1;

/// Slot in the arena. Sentinels and free slots have no entry.
struct Slot<K, V> {
    entry: Option<(K, V)>,
    prev: usize,
    next: usize,
}

impl<K, V> Slot<K, V> {
    fn sentinel() -> Self {
        Self {
            entry: None,
            prev: HEAD,
            next: TAIL,
        }
    }
}

/// Doubly linked list of entries ordered from least to most recently used
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Slot<K, V>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    /// Create an empty list with room for `capacity` entries
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.saturating_add(2));
        slots.push(Slot::sentinel());
        slots.push(Slot::sentinel());

        Self {
            slots,
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Append a new entry at the most recently used end and return its handle
    pub(crate) fn push_back(&mut self, key: K, value: V) -> usize {
        let slot = Slot {
            entry: Some((key, value)),
            prev: HEAD,
            next: TAIL,
        };

        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        self.link_back(idx);
        self.len += 1;
        idx
    }

    /// Move a live entry to the most recently used end
    pub(crate) fn move_to_back(&mut self, idx: usize) {
        if !self.is_live(idx) || self.slots[TAIL].prev == idx {
            return;
        }

        self.unlink(idx);
        self.link_back(idx);
    }

    /// Detach an entry and release its slot for reuse
    pub(crate) fn remove(&mut self, idx: usize) -> Option<(K, V)> {
        if !self.is_live(idx) {
            return None;
        }

        self.unlink(idx);
        let entry = self.slots[idx].entry.take();
        self.free_list.push(idx);
        self.len -= 1;
        entry
    }

    /// Remove the least recently used entry
    pub(crate) fn pop_front(&mut self) -> Option<(K, V)> {
        let first = self.slots[HEAD].next;
        if first == TAIL {
            return None;
        }
        self.remove(first)
    }

    /// Least recently used entry
    pub(crate) fn front(&self) -> Option<(&K, &V)> {
        self.entry(self.slots[HEAD].next)
    }

    /// Most recently used entry
    pub(crate) fn back(&self) -> Option<(&K, &V)> {
        self.entry(self.slots[TAIL].prev)
    }

    pub(crate) fn entry(&self, idx: usize) -> Option<(&K, &V)> {
        self.slots
            .get(idx)
            .and_then(|slot| slot.entry.as_ref())
            .map(|(k, v)| (k, v))
    }

    pub(crate) fn value_mut(&mut self, idx: usize) -> Option<&mut V> {
        self.slots
            .get_mut(idx)
            .and_then(|slot| slot.entry.as_mut())
            .map(|(_, v)| v)
    }

    /// Drop every entry and go back to the two-sentinel state
    pub(crate) fn clear(&mut self) {
        self.slots.truncate(2);
        self.slots[HEAD] = Slot::sentinel();
        self.slots[TAIL] = Slot::sentinel();
        self.free_list.clear();
        self.len = 0;
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            front: self.slots[HEAD].next,
            back: self.slots[TAIL].prev,
            remaining: self.len,
        }
    }

    /// Walk the list in both directions and check that the links agree
    /// with each other and with the entry count.
    pub(crate) fn check_links(&self) -> Result<()> {
        let mut visited = 0usize;
        let mut prev = HEAD;
        let mut current = self.slots[HEAD].next;

        while current != TAIL {
            let slot = self.slots.get(current).ok_or_else(|| {
                Error::Inconsistent(format!("link to out-of-bounds slot {}", current))
            })?;
            if slot.entry.is_none() {
                return Err(Error::Inconsistent(format!(
                    "slot {} is linked but holds no entry",
                    current
                )));
            }
            if slot.prev != prev {
                return Err(Error::Inconsistent(format!(
                    "slot {} has prev {} but was reached from {}",
                    current, slot.prev, prev
                )));
            }

            visited += 1;
            if visited > self.len {
                return Err(Error::Inconsistent(format!(
                    "forward walk visited more than {} entries",
                    self.len
                )));
            }

            prev = current;
            current = slot.next;
        }

        if self.slots[TAIL].prev != prev {
            return Err(Error::Inconsistent(format!(
                "tail sentinel points back to {} but last entry is {}",
                self.slots[TAIL].prev, prev
            )));
        }
        if visited != self.len {
            return Err(Error::Inconsistent(format!(
                "forward walk visited {} entries, expected {}",
                visited, self.len
            )));
        }

        let occupied = self.slots[2..]
            .iter()
            .filter(|slot| slot.entry.is_some())
            .count();
        if occupied != self.len || occupied + self.free_list.len() != self.slots.len() - 2 {
            return Err(Error::Inconsistent(format!(
                "{} occupied and {} free slots do not add up to {} entries in {} slots",
                occupied,
                self.free_list.len(),
                self.len,
                self.slots.len() - 2
            )));
        }

        Ok(())
    }

    fn is_live(&self, idx: usize) -> bool {
        idx > TAIL && self.slots.get(idx).is_some_and(|slot| slot.entry.is_some())
    }

    fn link_back(&mut self, idx: usize) {
        let last = self.slots[TAIL].prev;
        self.slots[idx].prev = last;
        self.slots[idx].next = TAIL;
        self.slots[last].next = idx;
        self.slots[TAIL].prev = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }
}

/// Iterator over cache entries from least to most recently used
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let slot = &self.slots[self.front];
        self.front = slot.next;
        self.remaining -= 1;
        slot.entry.as_ref().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let slot = &self.slots[self.back];
        self.back = slot.prev;
        self.remaining -= 1;
        slot.entry.as_ref().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
