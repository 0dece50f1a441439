use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Counts occurrences of keys. Missing keys count as zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Counter<T: Ord + PartialEq + Clone> {
    map: BTreeMap<T, usize>,
    sum: usize,
}

impl<T: Ord + PartialEq + Clone> Default for Counter<T> {
    fn default() -> Counter<T> {
        Counter::new()
    }
}

impl<T: Ord + PartialEq + Clone> Counter<T> {
    pub fn new() -> Counter<T> {
        Counter {
            map: BTreeMap::new(),
            sum: 0,
        }
    }

    pub fn add(&mut self, val: T, amount: usize) -> usize {
        let entry = self.map.entry(val).or_insert(0);
        *entry += amount;
        self.sum += amount;
        *entry
    }

    pub fn inc(&mut self, val: T) -> usize {
        self.add(val, 1)
    }

    pub fn get(&self, val: &T) -> usize {
        self.map.get(val).cloned().unwrap_or(0)
    }

    /// The sum of all counts
    pub fn sum(&self) -> usize {
        self.sum
    }

    pub fn borrow(&self) -> &BTreeMap<T, usize> {
        &self.map
    }
}
