// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Majority vote over a single comparable value.

use std::collections::BTreeMap;
use std::fmt;

/// A value together with how often it was observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub value: T,
    pub count: u64,
    /// `count / total`, or `0.0` when nothing was observed.
    pub score: f64,
}

/// Occurrence counter used for methods, status codes, URLs and bodies.
///
/// Counts are kept in a `BTreeMap`, so iteration follows `Ord` and every
/// query is deterministic. When several values share the highest count the
/// smallest of them is the majority.
#[derive(Debug, Clone)]
pub struct ScalarScore<T: Ord> {
    counts: BTreeMap<T, u64>,
    total: u64,
}

impl<T: Ord> Default for ScalarScore<T> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<T: Ord + Clone + Default> ScalarScore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: T) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.total += 1;
    }

    /// Number of `add` calls.
    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// The most frequent value. Returns `T::default()` with a zero score when
    /// nothing was added.
    pub fn majority(&self) -> Scored<T> {
        let mut best: Option<(&T, u64)> = None;
        for (value, &count) in &self.counts {
            match best {
                Some((_, max)) if count <= max => {}
                _ => best = Some((value, count)),
            }
        }

        match best {
            Some((value, count)) => Scored {
                value: value.clone(),
                count,
                score: self.ratio(count),
            },
            None => Scored {
                value: T::default(),
                count: 0,
                score: 0.0,
            },
        }
    }

    /// Every observed value except the majority, ascending by value.
    pub fn minorities(&self) -> Vec<Scored<T>> {
        if self.counts.is_empty() {
            return Vec::new();
        }
        let majority = self.majority().value;
        self.counts
            .iter()
            .filter(|(value, _)| **value != majority)
            .map(|(value, &count)| Scored {
                value: value.clone(),
                count,
                score: self.ratio(count),
            })
            .collect()
    }

    fn ratio(&self, count: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64
        }
    }
}

impl<T: Ord + Clone + Default> FromIterator<T> for ScalarScore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut score = Self::new();
        for value in iter {
            score.add(value);
        }
        score
    }
}

impl<T: Ord + Clone + Default + fmt::Display> fmt::Display for ScalarScore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.majority().value)
    }
}
