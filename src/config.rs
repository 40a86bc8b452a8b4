//! Table configuration: sizing bounds, thresholds and injected behaviour.

use crate::capacity::CapacityPlanner;
use crate::error::{Error, Result};
use crate::probe::{Probe, ProbingMethod};
use hashbrown::hash_map::DefaultHashBuilder;

pub const DEFAULT_LOAD_FACTOR: f64 = 0.5;
pub const DEFAULT_MIN_LOAD_FACTOR: f64 = 0.25;
pub const DEFAULT_INACTIVE_FACTOR: f64 = 0.1;
pub const DEFAULT_MIN_SIZE: usize = 13;
pub const DEFAULT_MAX_SIZE: usize = 1 << 20;

/// Builder for [`HashTable::with_config`](crate::HashTable::with_config).
///
/// Every option has a default; validation happens when the table is built.
pub struct Config<K, S = DefaultHashBuilder> {
    pub(crate) max_size: usize,
    pub(crate) min_size: usize,
    pub(crate) load_factor: f64,
    pub(crate) min_load_factor: f64,
    pub(crate) inactive_factor: f64,
    pub(crate) hasher: S,
    pub(crate) equality: Option<fn(&K, &K) -> bool>,
    pub(crate) probing: ProbingMethod,
}

impl<K> Config<K> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K> Default for Config<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> Config<K, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            min_size: DEFAULT_MIN_SIZE,
            load_factor: DEFAULT_LOAD_FACTOR,
            min_load_factor: DEFAULT_MIN_LOAD_FACTOR,
            inactive_factor: DEFAULT_INACTIVE_FACTOR,
            hasher,
            equality: None,
            probing: ProbingMethod::Linear,
        }
    }

    /// Upper bound on capacity; growth stops at the largest planned capacity below it.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Lower bound on capacity; the table starts at the smallest planned capacity above it.
    pub fn min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Grow when `(used + 1) / size` reaches this ratio. Must be in `(0, 1]`.
    pub fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Shrink when `active / size` drops below this ratio.
    pub fn min_load_factor(mut self, min_load_factor: f64) -> Self {
        self.min_load_factor = min_load_factor;
        self
    }

    /// Shrink (or purge) when tombstones exceed this share of the slots.
    pub fn inactive_factor(mut self, inactive_factor: f64) -> Self {
        self.inactive_factor = inactive_factor;
        self
    }

    /// Replace `K: Eq` as the key comparison. Must agree with the hasher:
    /// equal keys need equal hashes.
    pub fn equality(mut self, equality: fn(&K, &K) -> bool) -> Self {
        self.equality = Some(equality);
        self
    }

    pub fn probing(mut self, probing: ProbingMethod) -> Self {
        self.probing = probing;
        self
    }

    pub(crate) fn validate(&self) -> Result<(CapacityPlanner, Probe)> {
        let probe = self.probing.resolve()?;
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(Error::InvalidArgument("load_factor must be in (0, 1]"));
        }
        if !(self.min_load_factor >= 0.0 && self.min_load_factor < self.load_factor) {
            return Err(Error::InvalidArgument(
                "min_load_factor must be in [0, load_factor)",
            ));
        }
        if !(self.inactive_factor >= 0.0 && self.inactive_factor < 1.0) {
            return Err(Error::InvalidArgument("inactive_factor must be in [0, 1)"));
        }
        if probe == Probe::Quadratic && self.load_factor > 0.5 {
            return Err(Error::InvalidArgument(
                "quadratic probing requires load_factor <= 0.5",
            ));
        }
        let planner = CapacityPlanner::new(self.min_size, self.max_size)?;
        Ok((planner, probe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let c: Config<u32> = Config::new();
        let (planner, probe) = c.validate().unwrap();
        assert_eq!(probe, Probe::Linear);
        assert_eq!(planner.value_at(planner.first_step()), 17);
    }

    #[test]
    fn thresholds_are_range_checked() {
        let bad: [Config<u32>; 7] = [
            Config::new().load_factor(0.0),
            Config::new().load_factor(1.5),
            Config::new().load_factor(f64::NAN),
            Config::new().min_load_factor(0.5),
            Config::new().min_load_factor(-0.1),
            Config::new().inactive_factor(1.0),
            Config::new().min_size(100).max_size(50),
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(Error::InvalidArgument(_))));
        }
        assert!(Config::<u32>::new().load_factor(1.0).validate().is_ok());
    }

    #[test]
    fn quadratic_needs_half_load() {
        let c: Config<u32> = Config::new()
            .probing(ProbingMethod::Quadratic)
            .load_factor(0.75);
        assert_eq!(
            c.validate().err(),
            Some(Error::InvalidArgument(
                "quadratic probing requires load_factor <= 0.5"
            ))
        );
        let c: Config<u32> = Config::new().probing(ProbingMethod::Quadratic);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn double_hashing_is_rejected_as_invalid_state() {
        let c: Config<u32> = Config::new().probing(ProbingMethod::DoubleHashing);
        assert!(matches!(c.validate(), Err(Error::InvalidState(_))));
    }
}
