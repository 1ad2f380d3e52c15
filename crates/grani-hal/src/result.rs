//! Unified result handling: per-job counts and cross-trial aggregation.
//!
//! Every backend, whatever its wire format, produces an [`ExecutionResult`]
//! holding a [`Counts`] mapping from canonical bitstrings to observed
//! occurrence counts. A canonical bitstring has exactly the width of the
//! measured classical register, most-significant bit first (classical bit
//! `W-1` leftmost).
//!
//! [`Aggregate`] folds per-trial counts into a running total and reports a
//! ranked summary — the output side of a multi-trial amplification run.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Render a value as a zero-padded binary string of the given width.
///
/// Values that need more than `width` bits produce a longer string; callers
/// are expected to range-check first.
pub fn to_bitstring(value: u64, width: usize) -> String {
    format!("{value:0width$b}")
}

/// Parse a binary string back into its value.
///
/// Returns `None` for empty strings or strings containing anything other
/// than 0/1.
pub fn from_bitstring(bits: &str) -> Option<u64> {
    if bits.is_empty() {
        return None;
    }
    u64::from_str_radix(bits, 2).ok()
}

/// Measurement counts: canonical bitstring → number of observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts {
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create an empty counts mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` observations of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.counts.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Get the count for a bitstring (0 if never observed).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of observations across all outcomes.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The most frequently observed outcome.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.counts
            .iter()
            .max_by_key(|&(_, &count)| count)
            .map(|(bits, &count)| (bits.as_str(), count))
    }

    /// Outcomes sorted by descending count.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut entries: Vec<_> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Iterate over (bitstring, count) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no outcome was observed.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (bits, count) in iter {
            counts.insert(bits, count);
        }
        counts
    }
}

/// Result of executing a circuit on a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts.
    pub counts: Counts,
    /// Number of shots executed.
    pub shots: u32,
    /// Execution time in milliseconds, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
        }
    }

    /// Attach an execution time.
    pub fn with_execution_time(mut self, millis: u64) -> Self {
        self.execution_time_ms = Some(millis);
        self
    }
}

/// Running aggregate of counts across repeated trials.
///
/// Per-trial counts are folded in as they arrive and not retained. After
/// `T` trials of `S` shots each the aggregate total is `T × S` (modulo
/// backend-reported shot loss, which is passed through untouched).
#[derive(Debug, Clone)]
pub struct Aggregate {
    totals: FxHashMap<String, u64>,
    /// First-seen insertion order, used for stable tie-breaking.
    order: Vec<String>,
    shots_per_trial: u32,
    trials: u32,
}

impl Aggregate {
    /// Create an empty aggregate for trials of `shots_per_trial` shots.
    pub fn new(shots_per_trial: u32) -> Self {
        Self {
            totals: FxHashMap::default(),
            order: Vec::new(),
            shots_per_trial,
            trials: 0,
        }
    }

    /// Fold one trial's counts into the running totals.
    pub fn fold(&mut self, counts: &Counts) {
        self.trials += 1;
        // Deterministic fold order keeps first-seen ranking reproducible.
        for (bitstring, &count) in counts.sorted() {
            match self.totals.get_mut(bitstring) {
                Some(total) => *total += count,
                None => {
                    self.totals.insert(bitstring.clone(), count);
                    self.order.push(bitstring.clone());
                }
            }
        }
    }

    /// Number of trials folded so far.
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Aggregate count for an outcome (0 if never observed).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.totals.get(bitstring).copied().unwrap_or(0)
    }

    /// Expected total: `trials × shots_per_trial`.
    pub fn expected_total(&self) -> u64 {
        u64::from(self.trials) * u64::from(self.shots_per_trial)
    }

    /// Actual total of all folded counts.
    pub fn total(&self) -> u64 {
        self.totals.values().sum()
    }

    /// Outcomes by descending aggregate count, ties stable by first-seen
    /// order.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .order
            .iter()
            .map(|bits| (bits.as_str(), self.totals[bits]))
            .collect();
        // Vec::sort_by is stable, so equal counts keep first-seen order.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    /// An outcome's share of the expected total, as a percentage.
    ///
    /// Returns 0.0 for outcomes never observed or before any trial ran.
    pub fn percentage(&self, bitstring: &str) -> f64 {
        let expected = self.expected_total();
        if expected == 0 {
            return 0.0;
        }
        self.get(bitstring) as f64 / expected as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_counts_accumulate() {
        let mut counts = Counts::new();
        counts.insert("011", 1);
        counts.insert("011", 1);
        counts.insert("100", 5);

        assert_eq!(counts.get("011"), 2);
        assert_eq!(counts.get("100"), 5);
        assert_eq!(counts.get("000"), 0);
        assert_eq!(counts.total_shots(), 7);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_counts_most_frequent() {
        let counts: Counts = [("011".to_string(), 900), ("100".to_string(), 124)]
            .into_iter()
            .collect();
        assert_eq!(counts.most_frequent(), Some(("011", 900)));
    }

    #[test]
    fn test_counts_sorted_descending() {
        let counts: Counts = [
            ("000".to_string(), 10),
            ("011".to_string(), 900),
            ("100".to_string(), 124),
        ]
        .into_iter()
        .collect();

        let sorted = counts.sorted();
        assert_eq!(sorted[0].0, "011");
        assert_eq!(sorted[1].0, "100");
        assert_eq!(sorted[2].0, "000");
    }

    #[test]
    fn test_execution_result() {
        let mut counts = Counts::new();
        counts.insert("00", 1000);
        let result = ExecutionResult::new(counts, 1000).with_execution_time(12);

        assert_eq!(result.shots, 1000);
        assert_eq!(result.execution_time_ms, Some(12));
        assert_eq!(result.counts.total_shots(), 1000);
    }

    #[test]
    fn test_aggregate_sums_per_outcome() {
        let first: Counts = [("011".to_string(), 600)].into_iter().collect();
        let second: Counts = [("011".to_string(), 500), ("100".to_string(), 20)]
            .into_iter()
            .collect();

        let mut agg = Aggregate::new(1024);
        agg.fold(&first);
        agg.fold(&second);

        assert_eq!(agg.trials(), 2);
        assert_eq!(agg.get("011"), 1100);
        assert_eq!(agg.get("100"), 20);
        assert_eq!(agg.expected_total(), 2048);
        assert!((agg.percentage("011") - 53.7109375).abs() < 1e-9);
        assert_eq!(agg.percentage("110"), 0.0);
    }

    #[test]
    fn test_aggregate_total_invariant() {
        let mut agg = Aggregate::new(100);
        for _ in 0..5 {
            let trial: Counts = [("00".to_string(), 60), ("11".to_string(), 40)]
                .into_iter()
                .collect();
            agg.fold(&trial);
        }
        assert_eq!(agg.total(), 500);
        assert_eq!(agg.total(), agg.expected_total());
    }

    #[test]
    fn test_aggregate_ranked_stable_ties() {
        let first: Counts = [("010".to_string(), 7), ("101".to_string(), 3)]
            .into_iter()
            .collect();
        let second: Counts = [("101".to_string(), 1), ("111".to_string(), 7)]
            .into_iter()
            .collect();

        let mut agg = Aggregate::new(10);
        agg.fold(&first);
        agg.fold(&second);

        // 010 and 111 both total 7; 010 was seen first and must rank first.
        let ranked = agg.ranked();
        assert_eq!(ranked[0], ("010", 7));
        assert_eq!(ranked[1], ("111", 7));
        assert_eq!(ranked[2], ("101", 4));
    }

    #[test]
    fn test_empty_aggregate_percentage() {
        let agg = Aggregate::new(1024);
        assert_eq!(agg.percentage("011"), 0.0);
    }

    #[test]
    fn test_to_bitstring_pads() {
        assert_eq!(to_bitstring(0, 3), "000");
        assert_eq!(to_bitstring(3, 3), "011");
        assert_eq!(to_bitstring(7, 3), "111");
        assert_eq!(to_bitstring(1, 5), "00001");
    }

    #[test]
    fn test_from_bitstring() {
        assert_eq!(from_bitstring("011"), Some(3));
        assert_eq!(from_bitstring("000"), Some(0));
        assert_eq!(from_bitstring(""), None);
        assert_eq!(from_bitstring("01x"), None);
    }

    proptest! {
        #[test]
        fn prop_bitstring_round_trip(value in 0u64..8) {
            let bits = to_bitstring(value, 3);
            prop_assert_eq!(bits.len(), 3);
            prop_assert_eq!(from_bitstring(&bits), Some(value));
        }

        #[test]
        fn prop_bitstring_round_trip_wide(value: u16) {
            let bits = to_bitstring(u64::from(value), 16);
            prop_assert_eq!(bits.len(), 16);
            prop_assert_eq!(from_bitstring(&bits), Some(u64::from(value)));
        }
    }
}
