//! oa-hashtable: a single-threaded open-addressing hash table with
//! tombstones, pluggable probing and near-prime capacities.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep every entry in one slot array, find it by probing, and let
//!   the array follow the live entry count up and down.
//! - Layers:
//!   - `CapacityPlanner`: the embedded sequence of prime capacities
//!     (`2^i + delta`) and the grow/shrink policy over it.
//!   - `ProbeSequence`: `(hash, attempt, size) -> slot`, linear or
//!     quadratic (triangular offsets).
//!   - `SlotTable`: the slot array with `used`/`active` counters and the
//!     per-slot state machine `Empty -> Occupied <-> Tombstone`.
//!   - `HashTable`: public API; decides on rehashes and delegates searches.
//!
//! Constraints
//! - Single-threaded: `!Sync`; callers sharing a table serialize access.
//! - Unique keys; a duplicate insert fails and never overwrites.
//! - `size` is always a planner capacity within `[min_size, max_size]`.
//! - Every search or insert examines at most `size` slots.
//!
//! Rehashing
//! - Growth happens before an insert once `(used + 1) / size` reaches the
//!   load factor, straight to the smallest capacity that brings the ratio
//!   back under it (several steps at once for small load factors). Shrinking is considered after each removal, when tombstones
//!   exceed `inactive_factor` or the live ratio drops under
//!   `min_load_factor`, and only to a capacity that keeps the live ratio
//!   under the load factor. If no smaller capacity qualifies but tombstones
//!   are over their limit, the table is rebuilt at its current size.
//! - A rehash is transactional: placements in the new array are computed
//!   first, entries move only once all of them succeed. A purge that fails
//!   to replay is not retried until the capacity changes.
//! - Each slot stores its key's hash, so a rehash never calls `K: Hash`.
//!
//! Reentrancy
//! - Hashing and key comparison are user code. A debug-only guard panics if
//!   that code re-enters the table while a lookup is in progress.
//!
//! Indices
//! - `search` and `insert` return a `SlotIndex` that stays valid only until
//!   the next `insert` or `remove`.
//!
//! Notes and non-goals
//! - Double hashing is reserved in `ProbingMethod` but rejected at
//!   construction.
//! - Quadratic probing needs `load_factor <= 0.5`: on a prime capacity its
//!   first `(size + 1) / 2` probes are distinct, which is what guarantees a
//!   free slot below half load.
//! - Removal hands the entry back to the caller; tombstones hold no data.

mod capacity;
mod config;
mod error;
pub mod fnv;
mod hash_table;
mod hash_table_proptest;
mod probe;
mod reentrancy;
mod slot;

// Public surface
pub use capacity::{is_prime, next_prime, CapacityPlanner, CAPACITIES, DELTAS};
pub use config::{
    Config, DEFAULT_INACTIVE_FACTOR, DEFAULT_LOAD_FACTOR, DEFAULT_MAX_SIZE,
    DEFAULT_MIN_LOAD_FACTOR, DEFAULT_MIN_SIZE,
};
pub use error::{Error, Result};
pub use hash_table::{HashTable, Iter};
pub use probe::{Probe, ProbeSequence, ProbingMethod};
pub use slot::{SlotIndex, SlotState};
