//! Deterministic expansion of a seed into a value set.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::seed::{generate_seed, Seed};

/// Number of integers in a value set.
pub const VALUE_SET_LEN: usize = 6;

/// Exclusive upper bound of each value.
pub const VALUE_BOUND: u8 = 10;

/// Six integers in `[0, 9]`, the unit of broadcast.
///
/// Serializes as a JSON array, e.g. `[1,2,3,4,5,6]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ValueSet([u8; VALUE_SET_LEN]);

impl ValueSet {
    /// Returns `None` if any value is out of range.
    pub fn new(values: [u8; VALUE_SET_LEN]) -> Option<Self> {
        values
            .iter()
            .all(|v| *v < VALUE_BOUND)
            .then_some(Self(values))
    }

    pub fn values(&self) -> &[u8; VALUE_SET_LEN] {
        &self.0
    }

    /// The wire encoding used at every send site.
    pub fn to_json(&self) -> String {
        // A list of small integers always serializes.
        serde_json::to_string(&self.0[..]).unwrap_or_default()
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl TryFrom<Vec<u8>> for ValueSet {
    type Error = String;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        let arr: [u8; VALUE_SET_LEN] = values
            .try_into()
            .map_err(|v: Vec<u8>| format!("expected {VALUE_SET_LEN} values, got {}", v.len()))?;
        Self::new(arr).ok_or_else(|| format!("values must be below {VALUE_BOUND}"))
    }
}

impl From<ValueSet> for Vec<u8> {
    fn from(set: ValueSet) -> Self {
        set.0.to_vec()
    }
}

/// Expand `seed` into a value set.
///
/// Each call owns a freshly seeded generator, so concurrent callers never
/// share state. The same seed always yields the same value set.
pub fn sample(seed: Seed) -> ValueSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut values = [0u8; VALUE_SET_LEN];
    for v in values.iter_mut() {
        *v = rng.gen_range(0..VALUE_BOUND);
    }
    ValueSet(values)
}

/// Sample a value set from a freshly generated seed.
pub fn draw() -> ValueSet {
    sample(generate_seed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sample_is_in_range() {
        for seed in (0..5_000u64).chain([u64::MAX, u64::MAX / 2]) {
            let set = sample(seed);
            assert_eq!(set.values().len(), VALUE_SET_LEN);
            assert!(set.values().iter().all(|v| *v < VALUE_BOUND), "{set}");
        }
    }

    #[test]
    fn sample_is_deterministic() {
        for seed in [0, 1, 42, 0xdead_beef, u64::MAX] {
            assert_eq!(sample(seed), sample(seed));
        }
    }

    #[test]
    fn fresh_draws_rarely_collide() {
        // 10^6 possible sets; 200 draws collide with probability ~2%.
        // Allow a couple of collisions so the check is not flaky.
        let draws: HashSet<ValueSet> = (0..200).map(|_| draw()).collect();
        assert!(draws.len() >= 197, "only {} distinct draws", draws.len());
    }

    #[test]
    fn every_digit_appears() {
        let mut seen = [0usize; VALUE_BOUND as usize];
        for seed in 0..1_000u64 {
            for v in sample(seed).values() {
                seen[*v as usize] += 1;
            }
        }
        // 6000 draws, ~600 per digit expected.
        assert!(seen.iter().all(|n| *n > 400), "{seen:?}");
    }

    #[test]
    fn serializes_as_json_array() {
        let set = ValueSet::new([1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(set.to_json(), "[1,2,3,4,5,6]");
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1,2,3,4,5,6]");
        assert_eq!(set.to_string(), "[1,2,3,4,5,6]");
    }

    #[test]
    fn deserialize_validates() {
        let ok: ValueSet = serde_json::from_str("[0,9,0,9,0,9]").unwrap();
        assert_eq!(ok.values(), &[0, 9, 0, 9, 0, 9]);
        assert!(serde_json::from_str::<ValueSet>("[1,2,3]").is_err());
        assert!(serde_json::from_str::<ValueSet>("[1,2,3,4,5,10]").is_err());
    }

    #[test]
    fn new_rejects_out_of_range() {
        assert!(ValueSet::new([0, 0, 0, 0, 0, 10]).is_none());
        assert!(ValueSet::new([9; VALUE_SET_LEN]).is_some());
    }
}
