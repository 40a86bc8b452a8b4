//! Slot model: the per-slot state machine and the owned slot array.

use crate::error::Result;
use core::fmt;

/// Position of a slot in the current slot array.
///
/// Only valid until the next mutating call: a grow or shrink rehash moves
/// every live entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SlotIndex(usize);

impl SlotIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for SlotIndex {
    fn from(index: usize) -> Self {
        SlotIndex(index)
    }
}

/// Observable state of a slot, handed to render formatters.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SlotState {
    Empty,
    Occupied,
    Tombstone,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SlotState::Empty => "empty",
            SlotState::Occupied => "occupied",
            SlotState::Tombstone => "tombstone",
        })
    }
}

#[derive(Debug)]
pub(crate) enum Slot<K, V> {
    Empty,
    // The hash is kept so a rehash never calls back into `K: Hash`.
    Occupied { key: K, value: V, hash: u64 },
    Tombstone,
}

impl<K, V> Slot<K, V> {
    pub(crate) fn state(&self) -> SlotState {
        match self {
            Slot::Empty => SlotState::Empty,
            Slot::Occupied { .. } => SlotState::Occupied,
            Slot::Tombstone => SlotState::Tombstone,
        }
    }

    pub(crate) fn key(&self) -> Option<&K> {
        match self {
            Slot::Occupied { key, .. } => Some(key),
            _ => None,
        }
    }

    pub(crate) fn value(&self) -> Option<&V> {
        match self {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Fixed-size slot array plus its occupancy counters.
///
/// `used` counts slots written since allocation (Occupied + Tombstone),
/// `active` counts Occupied slots. A table is never resized in place; a
/// rehash builds a fresh one and swaps it in.
#[derive(Debug)]
pub(crate) struct SlotTable<K, V> {
    slots: Vec<Slot<K, V>>,
    used: usize,
    active: usize,
}

impl<K, V> SlotTable<K, V> {
    /// Allocate `size` empty slots. Allocation failure is reported, not aborted on.
    pub(crate) fn with_capacity(size: usize) -> Result<Self> {
        alloc_limit::check(size)?;
        let mut slots = Vec::new();
        slots.try_reserve_exact(size)?;
        slots.resize_with(size, || Slot::Empty);
        Ok(Self {
            slots,
            used: 0,
            active: 0,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    pub(crate) fn active(&self) -> usize {
        self.active
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Slot<K, V>> {
        self.slots.get(index)
    }

    pub(crate) fn value_mut(&mut self, index: usize) -> Option<&mut V> {
        match self.slots.get_mut(index) {
            Some(Slot::Occupied { value, .. }) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn iter(&self) -> core::slice::Iter<'_, Slot<K, V>> {
        self.slots.iter()
    }

    /// Write an entry into an Empty or Tombstone slot.
    ///
    /// Returns `false` (and writes nothing) if the slot is Occupied or out of range.
    pub(crate) fn occupy(&mut self, index: usize, key: K, value: V, hash: u64) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        match slot {
            Slot::Occupied { .. } => return false,
            Slot::Empty => self.used += 1,
            Slot::Tombstone => {}
        }
        *slot = Slot::Occupied { key, value, hash };
        self.active += 1;
        self.debug_check_counts();
        true
    }

    /// Turn an Occupied slot into a Tombstone and hand back its entry.
    pub(crate) fn vacate(&mut self, index: usize) -> Option<(K, V)> {
        let slot = self.slots.get_mut(index)?;
        if !matches!(slot, Slot::Occupied { .. }) {
            return None;
        }
        match core::mem::replace(slot, Slot::Tombstone) {
            Slot::Occupied { key, value, .. } => {
                self.active -= 1;
                self.debug_check_counts();
                Some((key, value))
            }
            _ => None,
        }
    }

    /// Move an entry out for replay into another table. The slot reverts to
    /// Empty; the source table is discarded right after replay.
    pub(crate) fn take(&mut self, index: usize) -> Option<(K, V, u64)> {
        let slot = self.slots.get_mut(index)?;
        match core::mem::replace(slot, Slot::Empty) {
            Slot::Occupied { key, value, hash } => {
                self.active -= 1;
                Some((key, value, hash))
            }
            other => {
                *slot = other;
                None
            }
        }
    }

    /// Hashes of every Occupied slot, in slot order.
    pub(crate) fn occupied_hashes(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Slot::Occupied { hash, .. } => Some((i, *hash)),
                _ => None,
            })
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (K, V)> {
        self.slots.into_iter().filter_map(|s| match s {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            _ => None,
        })
    }

    #[inline]
    fn debug_check_counts(&self) {
        debug_assert!(self.active <= self.used && self.used <= self.slots.len());
    }
}

// Test builds can cap slot-array sizes to force allocation failures.
#[cfg(not(test))]
mod alloc_limit {
    use crate::error::Result;

    #[inline]
    pub(super) fn check(_size: usize) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod alloc_limit {
    use crate::error::{Error, Result};
    use std::cell::Cell;

    thread_local! {
        static MAX_SLOTS: Cell<Option<usize>> = const { Cell::new(None) };
    }

    pub(super) fn check(size: usize) -> Result<()> {
        match MAX_SLOTS.with(Cell::get) {
            Some(max) if size > max => Err(Error::MemoryError),
            _ => Ok(()),
        }
    }

    /// Fail every slot array larger than `max` on this thread until the
    /// returned guard drops.
    pub(crate) fn cap(max: usize) -> CapGuard {
        MAX_SLOTS.with(|m| m.set(Some(max)));
        CapGuard(())
    }

    pub(crate) struct CapGuard(());

    impl Drop for CapGuard {
        fn drop(&mut self) {
            MAX_SLOTS.with(|m| m.set(None));
        }
    }
}
