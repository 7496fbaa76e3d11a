// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Canonical/variant split for named values (query parameters, headers).

use std::collections::{BTreeMap, BTreeSet};

/// Name to list of values, ordered by name.
pub type Values = BTreeMap<String, Vec<String>>;

/// One named value observed in a sample.
///
/// `promoted` marks values that come from the URL path template and are
/// therefore always part of the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotedValue {
    pub name: String,
    pub values: Vec<String>,
    pub promoted: bool,
}

impl PromotedValue {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
            promoted: false,
        }
    }

    pub fn promoted(mut self, promoted: bool) -> Self {
        self.promoted = promoted;
        self
    }
}

/// Variant values sharing the same score.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantBucket {
    pub score: f64,
    pub values: Values,
}

/// Score and placement of a single `(name, values)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub name: String,
    pub values: Vec<String>,
    pub score: f64,
    pub canonical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct PairKey {
    name: String,
    values: Vec<String>,
}

#[derive(Debug, Clone)]
struct Record {
    // Zero on first sighting, +1 on every later one.
    count: u64,
    promoted: bool,
    last_seen: u64,
}

/// Frequency table over `(name, values)` pairs across the samples of one
/// endpoint.
///
/// A pair's score is `count / (total - 1)` where `count` starts at zero on the
/// first sighting; a pair present in every sample therefore scores exactly
/// `1.0`. Promoted pairs always score `1.0`, and so does everything when at
/// most one sample was added.
#[derive(Debug, Clone)]
pub struct KeyedAggregator {
    records: BTreeMap<PairKey, Record>,
    total: u64,
    threshold: f64,
    merge_duplicates: bool,
}

impl Default for KeyedAggregator {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            total: 0,
            threshold: Self::DEFAULT_THRESHOLD,
            merge_duplicates: false,
        }
    }
}

impl KeyedAggregator {
    pub const DEFAULT_THRESHOLD: f64 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum score for a pair to be canonical. Values outside `(0, 1]` are
    /// clamped; non-finite values fall back to the default.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = if threshold.is_finite() {
            threshold.clamp(f64::MIN_POSITIVE, 1.0)
        } else {
            Self::DEFAULT_THRESHOLD
        };
        self
    }

    pub fn with_merge_duplicates(mut self, merge: bool) -> Self {
        self.merge_duplicates = merge;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fold one sample in. `total` grows by one even for an empty sample;
    /// a pair repeated inside the same sample is counted once.
    pub fn add<I>(&mut self, sample: I)
    where
        I: IntoIterator<Item = PromotedValue>,
    {
        let seq = self.total;
        let mut seen = BTreeSet::new();

        for value in sample {
            let key = PairKey {
                name: value.name,
                values: value.values,
            };
            if !seen.insert(key.clone()) {
                continue;
            }
            match self.records.get_mut(&key) {
                Some(record) => {
                    record.count += 1;
                    record.promoted |= value.promoted;
                    record.last_seen = seq;
                }
                None => {
                    self.records.insert(
                        key,
                        Record {
                            count: 0,
                            promoted: value.promoted,
                            last_seen: seq,
                        },
                    );
                }
            }
        }

        self.total += 1;
    }

    /// Number of samples folded in.
    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    fn score(&self, record: &Record) -> f64 {
        if self.total <= 1 || record.promoted {
            1.0
        } else {
            record.count as f64 / (self.total - 1) as f64
        }
    }

    fn is_canonical(&self, record: &Record) -> bool {
        self.score(record) >= self.threshold
    }

    /// Every observed pair with its score, in `(name, values)` order.
    pub fn pairs(&self) -> Vec<PairScore> {
        self.records
            .iter()
            .map(|(key, record)| PairScore {
                name: key.name.clone(),
                values: key.values.clone(),
                score: self.score(record),
                canonical: self.is_canonical(record),
            })
            .collect()
    }

    /// Pairs scoring at or above the threshold, keyed by name. When two
    /// canonical pairs share a name the most recently seen one wins.
    pub fn canonical(&self) -> Values {
        let mut picked: BTreeMap<&str, (u64, &Vec<String>)> = BTreeMap::new();
        for (key, record) in &self.records {
            if !self.is_canonical(record) {
                continue;
            }
            match picked.get(key.name.as_str()) {
                Some((seen, _)) if *seen >= record.last_seen => {}
                _ => {
                    picked.insert(&key.name, (record.last_seen, &key.values));
                }
            }
        }
        picked
            .into_iter()
            .map(|(name, (_, values))| (name.to_string(), values.clone()))
            .collect()
    }

    /// Non-canonical pairs grouped by score, ascending.
    ///
    /// Names present in `canonical()` are left out. A name keeps only its
    /// lowest-scored bucket; with `merge_duplicates` the values it had in
    /// higher buckets are appended there.
    pub fn variants(&self) -> Vec<VariantBucket> {
        let canonical = self.canonical();

        let mut by_count: BTreeMap<u64, BTreeMap<&str, (u64, &Vec<String>)>> = BTreeMap::new();
        for (key, record) in &self.records {
            if self.is_canonical(record) || canonical.contains_key(&key.name) {
                continue;
            }
            let bucket = by_count.entry(record.count).or_default();
            match bucket.get(key.name.as_str()) {
                Some((seen, _)) if *seen >= record.last_seen => {}
                _ => {
                    bucket.insert(&key.name, (record.last_seen, &key.values));
                }
            }
        }

        let denominator = self.total.saturating_sub(1).max(1) as f64;
        let mut out: Vec<VariantBucket> = Vec::new();
        let mut home: BTreeMap<&str, usize> = BTreeMap::new();

        for (count, entries) in by_count {
            let mut values = Values::new();
            for (name, (_, vs)) in entries {
                match home.get(name) {
                    Some(&index) => {
                        if self.merge_duplicates {
                            out[index]
                                .values
                                .entry(name.to_string())
                                .or_default()
                                .extend(vs.iter().cloned());
                        }
                    }
                    None => {
                        home.insert(name, out.len());
                        values.insert(name.to_string(), vs.clone());
                    }
                }
            }
            if !values.is_empty() {
                out.push(VariantBucket {
                    score: count as f64 / denominator,
                    values,
                });
            }
        }

        out
    }
}
