//! HashTable: open addressing over a slot array, resized by a [`CapacityPlanner`].

use crate::capacity::CapacityPlanner;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::probe::{self, Probe, ProbeSequence, ProbingMethod};
use crate::reentrancy::DebugReentrancy;
use crate::slot::{Slot, SlotIndex, SlotState, SlotTable};
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use tracing::{debug, trace, warn};

pub struct HashTable<K, V, S = DefaultHashBuilder> {
    table: SlotTable<K, V>,
    planner: CapacityPlanner,
    capacity_step: usize,
    min_size: usize,
    max_size: usize,
    load_factor: f64,
    min_load_factor: f64,
    inactive_factor: f64,
    hasher: S,
    equality: fn(&K, &K) -> bool,
    probe: Probe,
    // Set once growth finds no larger capacity; cleared by the next rehash.
    growth_saturated: bool,
    // Step at which an in-place purge last failed to replay.
    stalled_purge: Option<usize>,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashTable<K, V>
where
    K: Eq + Hash,
{
    /// Table with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::new())
    }
}

/// Live entries in slot order.
pub struct Iter<'a, K, V> {
    it: core::iter::Enumerate<core::slice::Iter<'a, Slot<K, V>>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (SlotIndex, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.find_map(|(i, slot)| match slot {
            Slot::Occupied { key, value, .. } => Some((SlotIndex::from(i), key, value)),
            _ => None,
        })
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Validate `config` and allocate the first slot array.
    pub fn with_config(config: Config<K, S>) -> Result<Self> {
        let (planner, probe) = config.validate()?;
        let capacity_step = planner.first_step();
        let table = SlotTable::with_capacity(planner.value_at(capacity_step))?;
        debug!(
            size = table.len(),
            min_size = config.min_size,
            max_size = config.max_size,
            load_factor = config.load_factor,
            ?probe,
            "hash table created"
        );
        Ok(Self {
            table,
            planner,
            capacity_step,
            min_size: config.min_size,
            max_size: config.max_size,
            load_factor: config.load_factor,
            min_load_factor: config.min_load_factor,
            inactive_factor: config.inactive_factor,
            hasher: config.hasher,
            equality: config.equality.unwrap_or(<K as PartialEq>::eq),
            probe,
            growth_saturated: false,
            stalled_purge: None,
            reentrancy: DebugReentrancy::new(),
        })
    }

    fn make_hash(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    fn find_slot(&self, hash: u64, key: &K) -> Option<usize> {
        let eq = self.equality;
        probe::locate_for_search(&self.table, self.probe, hash, |k| eq(k, key))
    }

    /// Current capacity.
    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// Number of live entries.
    pub fn active_count(&self) -> usize {
        self.table.active()
    }

    /// Slots written since the last rehash (live entries plus tombstones).
    pub fn used_count(&self) -> usize {
        self.table.used()
    }

    pub fn len(&self) -> usize {
        self.table.active()
    }

    pub fn is_empty(&self) -> bool {
        self.table.active() == 0
    }

    /// Position of the current capacity in [`CAPACITIES`](crate::CAPACITIES).
    pub fn capacity_step(&self) -> usize {
        self.capacity_step
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    pub fn probing(&self) -> ProbingMethod {
        self.probe.into()
    }

    /// Slot holding `key`, valid until the next insert or remove.
    pub fn search(&self, key: &K) -> Option<SlotIndex> {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        self.find_slot(hash, key).map(SlotIndex::from)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.search(key)?;
        self.table.get(index.get()).and_then(Slot::value)
    }

    /// Value at a slot returned by [`search`](Self::search) or [`insert`](Self::insert).
    pub fn fetch(&self, index: SlotIndex) -> Result<&V> {
        match self.table.get(index.get()) {
            None => Err(Error::InvalidArgument("slot index out of range")),
            Some(slot) => slot
                .value()
                .ok_or(Error::InvalidArgument("slot is not occupied")),
        }
    }

    pub fn fetch_mut(&mut self, index: SlotIndex) -> Result<&mut V> {
        if index.get() >= self.table.len() {
            return Err(Error::InvalidArgument("slot index out of range"));
        }
        self.table
            .value_mut(index.get())
            .ok_or(Error::InvalidArgument("slot is not occupied"))
    }

    /// Insert a new entry. Existing keys are never overwritten.
    ///
    /// May grow the table first, which moves every entry: indices returned
    /// earlier are stale afterwards.
    pub fn insert(&mut self, key: K, value: V) -> Result<SlotIndex> {
        let hash = {
            let _g = self.reentrancy.enter();
            let hash = self.make_hash(&key);
            if self.find_slot(hash, &key).is_some() {
                return Err(Error::KeyExists);
            }
            hash
        };

        if CapacityPlanner::should_grow(self.table.used(), self.table.len(), self.load_factor) {
            let target = self
                .planner
                .grow_target_for(self.capacity_step, self.table.active(), self.load_factor);
            match target {
                Some((step, capacity)) => {
                    if let Err(err) = self.rehash(step, capacity) {
                        warn!(%err, size = self.table.len(), target = capacity, "grow failed; table unchanged");
                        return Err(err);
                    }
                }
                None if !self.growth_saturated => {
                    self.growth_saturated = true;
                    warn!(
                        size = self.table.len(),
                        used = self.table.used(),
                        "growth saturated at max_size"
                    );
                }
                None => {}
            }
        }

        let index = probe::locate_for_insert(&self.table, self.probe, hash).ok_or(Error::NoSpace)?;
        if !self.table.occupy(index, key, value, hash) {
            return Err(Error::InvalidState("probe returned an occupied slot"));
        }
        trace!(index, active = self.table.active(), "inserted");
        Ok(SlotIndex::from(index))
    }

    /// Remove `key`, leaving a tombstone, and hand the entry back.
    ///
    /// May shrink or purge the table afterwards. A failed shrink allocation
    /// is logged and the table stays at its current capacity.
    pub fn remove(&mut self, key: &K) -> Result<(K, V)> {
        let index = {
            let _g = self.reentrancy.enter();
            let hash = self.make_hash(key);
            self.find_slot(hash, key).ok_or(Error::KeyNotFound)?
        };
        let entry = self
            .table
            .vacate(index)
            .ok_or(Error::InvalidState("search returned a vacant slot"))?;
        trace!(index, active = self.table.active(), "removed");
        self.maybe_shrink();
        Ok(entry)
    }

    fn maybe_shrink(&mut self) {
        let (active, used, size) = (self.table.active(), self.table.used(), self.table.len());
        if !CapacityPlanner::should_shrink(active, used, size, self.min_load_factor, self.inactive_factor) {
            return;
        }
        let target = self
            .planner
            .shrink_target(self.capacity_step)
            .filter(|&(_, candidate)| CapacityPlanner::admits(active, candidate, self.load_factor));
        let result = match target {
            Some((step, capacity)) => self.rehash(step, capacity),
            // Nothing smaller fits; still clear out tombstones in place.
            None if self.purge_due(active, used, size) => {
                let result = self.rehash(self.capacity_step, size);
                if result.is_err() {
                    self.stalled_purge = Some(self.capacity_step);
                }
                result
            }
            None => return,
        };
        if let Err(err) = result {
            warn!(%err, size, "shrink skipped; table kept at current capacity");
        }
    }

    // A purge that failed at this step fails again until the table is rebuilt.
    fn purge_due(&self, active: usize, used: usize, size: usize) -> bool {
        self.stalled_purge != Some(self.capacity_step)
            && CapacityPlanner::tombstones_exceed(active, used, size, self.inactive_factor)
    }

    /// Replay every live entry into a fresh slot array of `capacity` slots.
    ///
    /// All-or-nothing: placements are computed against the new array before
    /// anything moves, so any failure leaves the current table intact.
    /// Tombstones are dropped, so afterwards `used == active`.
    fn rehash(&mut self, step: usize, capacity: usize) -> Result<()> {
        let mut fresh = SlotTable::with_capacity(capacity)?;
        let mut taken = Vec::new();
        taken.try_reserve_exact(capacity)?;
        taken.resize(capacity, false);
        let mut plan = Vec::new();
        plan.try_reserve_exact(self.table.active())?;

        for (src, hash) in self.table.occupied_hashes() {
            let dst = ProbeSequence::new(self.probe, hash, capacity)
                .find(|&i| !taken[i])
                .ok_or(Error::InvalidState("rehash found no slot for a live entry"))?;
            taken[dst] = true;
            plan.push((src, dst));
        }

        let (from, tombstones) = (self.table.len(), self.table.used() - self.table.active());
        for (src, dst) in plan {
            if let Some((key, value, hash)) = self.table.take(src) {
                let placed = fresh.occupy(dst, key, value, hash);
                debug_assert!(placed);
            }
        }

        debug!(
            from,
            to = capacity,
            step,
            active = fresh.active(),
            tombstones,
            "rehashed"
        );
        self.table = fresh;
        self.capacity_step = step;
        self.growth_saturated = false;
        self.stalled_purge = None;
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.iter().enumerate(),
        }
    }

    /// Format one slot with `formatter(state, key, value)`; key and value
    /// are `Some` only for Occupied slots.
    pub fn render_slot<F>(&self, index: SlotIndex, formatter: F) -> Result<String>
    where
        F: FnOnce(SlotState, Option<&K>, Option<&V>) -> String,
    {
        let slot = self
            .table
            .get(index.get())
            .ok_or(Error::InvalidArgument("slot index out of range"))?;
        Ok(formatter(slot.state(), slot.key(), slot.value()))
    }

    /// Snapshot of the whole slot array: a summary header, then one line per slot.
    pub fn render<F>(&self, mut formatter: F) -> String
    where
        F: FnMut(SlotState, Option<&K>, Option<&V>) -> String,
    {
        let mut out = format!(
            "--- HashTable - size[{}] - entries[{}] - loadfct[{:.2}] ---\n",
            self.table.len(),
            self.table.active(),
            self.load_factor
        );
        for (i, slot) in self.table.iter().enumerate() {
            out.push_str(&format!(
                "Index {}: {}\n",
                i,
                formatter(slot.state(), slot.key(), slot.value())
            ));
        }
        out
    }

    /// Consume the table, passing each live key and value to the matching
    /// destroyer (once per entry). Entries without a destroyer are dropped.
    pub fn teardown(
        self,
        mut key_destroyer: Option<&mut dyn FnMut(K)>,
        mut value_destroyer: Option<&mut dyn FnMut(V)>,
    ) {
        let Self { table, .. } = self;
        debug!(size = table.len(), active = table.active(), "tearing down");
        for (key, value) in table.into_entries() {
            if let Some(destroy) = key_destroyer.as_deref_mut() {
                destroy(key);
            }
            if let Some(destroy) = value_destroyer.as_deref_mut() {
                destroy(value);
            }
        }
    }
}
