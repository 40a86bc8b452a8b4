//! Capacity planning: the near-prime size sequence and the grow/shrink policy.
//!
//! Capacities follow `2^i + DELTAS[i]`, where each delta is the smallest
//! non-negative offset that makes the sum prime. The table is embedded rather
//! than computed at runtime; `is_prime` exists to check it (see tests) and for
//! callers who want to size things the same way.

use crate::error::{Error, Result};
use core::ops::RangeInclusive;

/// Offsets from successive powers of two to the next prime.
pub const DELTAS: [u32; 30] = [
    1, 0, 1, 3, 1, 5, 3, 3, 1, 9, 7, 5, 3, 17, 27, 3, 1, 29, 3, 21, 7, 17, 15, 9, 43, 35, 15, 29, 3,
    11,
];

/// `CAPACITIES[i] == 2^i + DELTAS[i]`, each one prime.
pub const CAPACITIES: [u32; 30] = build_capacities();

const fn build_capacities() -> [u32; 30] {
    let mut out = [0u32; 30];
    let mut i = 0;
    while i < out.len() {
        out[i] = (1u32 << i) + DELTAS[i];
        i += 1;
    }
    out
}

// Deterministic for every n < 4_759_123_141.
const WITNESSES: [u64; 3] = [2, 7, 61];

fn pow_mod(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    // modulus < 2^32, so every product fits in a u64.
    let mut acc = 1;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc * base % modulus;
        }
        base = base * base % modulus;
        exp >>= 1;
    }
    acc
}

/// Miller-Rabin primality test, exact over the whole `u32` range.
pub fn is_prime(n: u32) -> bool {
    let n = u64::from(n);
    if n < 2 {
        return false;
    }
    for &w in &WITNESSES {
        if n == w {
            return true;
        }
        if n % w == 0 {
            return false;
        }
    }

    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = x * x % n;
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Smallest prime `>= n`, if one fits in a `u32`.
pub fn next_prime(n: u32) -> Option<u32> {
    (n..=u32::MAX).find(|&c| is_prime(c))
}

/// Selects table capacities from [`CAPACITIES`] within `[min_size, max_size]`
/// and decides when a table should change size.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CapacityPlanner {
    first: usize,
    last: usize,
}

impl CapacityPlanner {
    pub fn new(min_size: usize, max_size: usize) -> Result<Self> {
        if min_size > max_size {
            return Err(Error::InvalidArgument("min_size exceeds max_size"));
        }
        let first = CAPACITIES
            .iter()
            .position(|&c| (c as usize) >= min_size)
            .ok_or(Error::InvalidArgument("min_size exceeds the largest capacity"))?;
        let last = CAPACITIES
            .iter()
            .rposition(|&c| (c as usize) <= max_size)
            .ok_or(Error::InvalidArgument("max_size is below the smallest capacity"))?;
        if first > last {
            return Err(Error::InvalidArgument(
                "no capacity lies between min_size and max_size",
            ));
        }
        Ok(Self { first, last })
    }

    /// Step a new table starts at: the smallest admissible capacity.
    pub fn first_step(&self) -> usize {
        self.first
    }

    pub fn steps(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    /// Capacity at `step`. Steps come from this planner, so they are in range.
    pub fn value_at(&self, step: usize) -> usize {
        CAPACITIES[step] as usize
    }

    /// Next strictly larger capacity, or `None` when saturated at `max_size`.
    pub fn grow_target(&self, step: usize) -> Option<(usize, usize)> {
        let current = self.value_at(step);
        (step + 1..=self.last)
            .map(|s| (s, self.value_at(s)))
            .find(|&(_, c)| c > current)
    }

    /// Smallest larger capacity at which `active` entries plus the pending
    /// insert stay under `load_factor`, or the largest step if none does.
    /// `None` when already saturated at `max_size`.
    pub fn grow_target_for(&self, step: usize, active: usize, load_factor: f64) -> Option<(usize, usize)> {
        let mut target = self.grow_target(step)?;
        while Self::should_grow(active, target.1, load_factor) {
            match self.grow_target(target.0) {
                Some(next) => target = next,
                None => break,
            }
        }
        Some(target)
    }

    /// Next strictly smaller capacity, or `None` when saturated at `min_size`.
    pub fn shrink_target(&self, step: usize) -> Option<(usize, usize)> {
        let current = self.value_at(step);
        (self.first..step)
            .rev()
            .map(|s| (s, self.value_at(s)))
            .find(|&(_, c)| c < current)
    }

    /// Grow before an insert would bring `used` to the load factor.
    pub fn should_grow(used: usize, size: usize, load_factor: f64) -> bool {
        (used + 1) as f64 / size as f64 >= load_factor
    }

    /// Tombstones (`used - active`) make up more than `inactive_factor` of the table.
    pub fn tombstones_exceed(active: usize, used: usize, size: usize, inactive_factor: f64) -> bool {
        (used - active) as f64 / size as f64 > inactive_factor
    }

    pub fn should_shrink(
        active: usize,
        used: usize,
        size: usize,
        min_load_factor: f64,
        inactive_factor: f64,
    ) -> bool {
        Self::tombstones_exceed(active, used, size, inactive_factor)
            || (active as f64 / size as f64) < min_load_factor
    }

    /// Guard on a shrink candidate: the live entries must still sit below the
    /// load factor afterwards.
    pub fn admits(active: usize, candidate: usize, load_factor: f64) -> bool {
        (active as f64 / candidate as f64) < load_factor
    }
}
