//! Probe sequences and the two slot searches built on them.

use crate::error::{Error, Result};
use crate::slot::{Slot, SlotTable};

/// Probing method selected in the table configuration.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ProbingMethod {
    #[default]
    Linear,
    Quadratic,
    /// Reserved; rejected when a table is built.
    DoubleHashing,
}

impl ProbingMethod {
    pub(crate) fn resolve(self) -> Result<Probe> {
        match self {
            ProbingMethod::Linear => Ok(Probe::Linear),
            ProbingMethod::Quadratic => Ok(Probe::Quadratic),
            ProbingMethod::DoubleHashing => {
                Err(Error::InvalidState("double hashing is not supported"))
            }
        }
    }
}

/// A probing method the table can actually run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Probe {
    /// `(home + i) mod size`
    Linear,
    /// `(home + i(i+1)/2) mod size`. With a prime `size` the first
    /// `(size + 1) / 2` probes are pairwise distinct, so a table kept at most
    /// half full always finds a free slot.
    Quadratic,
}

impl From<Probe> for ProbingMethod {
    fn from(p: Probe) -> Self {
        match p {
            Probe::Linear => ProbingMethod::Linear,
            Probe::Quadratic => ProbingMethod::Quadratic,
        }
    }
}

/// Candidate slot indices for one hash: exactly `size` of them.
#[derive(Clone, Debug)]
pub struct ProbeSequence {
    probe: Probe,
    size: usize,
    current: usize,
    attempt: usize,
}

impl ProbeSequence {
    pub fn new(probe: Probe, hash: u64, size: usize) -> Self {
        let home = if size == 0 {
            0
        } else {
            (hash % size as u64) as usize
        };
        Self {
            probe,
            size,
            current: home,
            attempt: 0,
        }
    }
}

impl Iterator for ProbeSequence {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.attempt >= self.size {
            return None;
        }
        let index = self.current;
        self.attempt += 1;
        // Offsets are accumulated mod size: i for linear, i(i+1)/2 for
        // quadratic (the triangular step from attempt i-1 to i is i).
        let step = match self.probe {
            Probe::Linear => 1,
            Probe::Quadratic => self.attempt % self.size,
        };
        self.current = (self.current + step) % self.size;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.size - self.attempt;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ProbeSequence {}

/// Walk the sequence for `hash`: stop at the first Empty slot (absent), skip
/// Tombstones, and return the Occupied slot whose stored hash matches and
/// whose key satisfies `matches`.
pub(crate) fn locate_for_search<K, V, F>(
    table: &SlotTable<K, V>,
    probe: Probe,
    hash: u64,
    mut matches: F,
) -> Option<usize>
where
    F: FnMut(&K) -> bool,
{
    for index in ProbeSequence::new(probe, hash, table.len()) {
        match table.get(index)? {
            Slot::Empty => return None,
            Slot::Tombstone => {}
            Slot::Occupied { key, hash: h, .. } => {
                if *h == hash && matches(key) {
                    return Some(index);
                }
            }
        }
    }
    None
}

/// First Empty or Tombstone slot on the sequence for `hash`.
pub(crate) fn locate_for_insert<K, V>(table: &SlotTable<K, V>, probe: Probe, hash: u64) -> Option<usize> {
    ProbeSequence::new(probe, hash, table.len())
        .find(|&index| matches!(table.get(index), Some(Slot::Empty | Slot::Tombstone)))
}
