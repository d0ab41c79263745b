#![forbid(unsafe_code)]

use crate::types::ColumnType;
use std::collections::HashSet;

/// Summary of a column's present values. Missing entries only contribute to `missing_count`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnStats {
    pub column_type: ColumnType,
    pub count: u64,
    pub missing_count: u64,
    pub distinct_count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: Option<f64>,
    pub mean: Option<f64>,
}

impl ColumnStats {
    pub(crate) fn empty(column_type: ColumnType) -> Self {
        Self {
            column_type,
            count: 0,
            missing_count: 0,
            distinct_count: 0,
            min: None,
            max: None,
            sum: None,
            mean: None,
        }
    }
}

/// Streaming accumulator behind [`ColumnStats`].
pub(crate) struct StatsAccumulator {
    stats: ColumnStats,
    distinct: DistinctCounter,
    sum: f64,
}

impl StatsAccumulator {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            stats: ColumnStats::empty(column_type),
            distinct: DistinctCounter::new(),
            sum: 0.0,
        }
    }

    pub fn push_missing(&mut self) {
        self.stats.missing_count += 1;
    }

    pub fn push(&mut self, v: f64) {
        self.stats.count += 1;
        // Normalize -0.0 so it counts as the same distinct value as 0.0.
        let key = if v == 0.0 { 0.0f64 } else { v };
        self.distinct.insert_hash(splitmix64(key.to_bits()));
        self.sum += v;
        self.stats.min = Some(self.stats.min.map(|m| m.min(v)).unwrap_or(v));
        self.stats.max = Some(self.stats.max.map(|m| m.max(v)).unwrap_or(v));
    }

    pub fn finish(mut self) -> ColumnStats {
        self.stats.distinct_count = self.distinct.estimate();
        if self.stats.count > 0 {
            self.stats.sum = Some(self.sum);
            self.stats.mean = Some(self.sum / self.stats.count as f64);
        }
        self.stats
    }
}

#[derive(Clone, Debug)]
pub(crate) struct HyperLogLog {
    p: u8,
    registers: Vec<u8>,
}

impl HyperLogLog {
    pub fn with_precision(p: u8) -> Self {
        debug_assert!((4..=16).contains(&p));
        Self {
            p,
            registers: vec![0u8; 1 << p],
        }
    }

    pub fn insert_hash(&mut self, hash: u64) {
        let idx = (hash >> (64 - self.p)) as usize;
        let w = hash << self.p;
        let rank = (w.leading_zeros() + 1) as u8;
        self.registers[idx] = self.registers[idx].max(rank);
    }

    pub fn estimate(&self) -> u64 {
        let m = self.registers.len() as f64;
        let alpha = match self.registers.len() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            _ => 0.7213 / (1.0 + 1.079 / m),
        };

        let mut inv_sum = 0.0;
        let mut zeros = 0u32;
        for &r in &self.registers {
            inv_sum += 2f64.powi(-(r as i32));
            if r == 0 {
                zeros += 1;
            }
        }

        let raw = alpha * m * m / inv_sum;

        // Small range correction.
        if raw <= 2.5 * m && zeros > 0 {
            let z = zeros as f64;
            return (m * (m / z).ln()).round().max(0.0) as u64;
        }

        raw.round().max(0.0) as u64
    }
}

pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Exact distinct counting that spills into HyperLogLog once the set grows large.
#[derive(Clone, Debug)]
pub(crate) enum DistinctCounter {
    Exact(HashSet<u64>),
    Hll(HyperLogLog),
}

impl DistinctCounter {
    pub fn new() -> Self {
        Self::Exact(HashSet::new())
    }

    pub fn insert_hash(&mut self, hash: u64) {
        match self {
            Self::Exact(set) => {
                const THRESH: usize = 2048;
                if set.len() >= THRESH && !set.contains(&hash) {
                    let mut hll = HyperLogLog::with_precision(10);
                    for &h in set.iter() {
                        hll.insert_hash(h);
                    }
                    hll.insert_hash(hash);
                    *self = Self::Hll(hll);
                } else {
                    set.insert(hash);
                }
            }
            Self::Hll(hll) => hll.insert_hash(hash),
        }
    }

    pub fn insert_str(&mut self, s: &str) {
        // FNV-1a for stable hashing across runs (not cryptographic).
        let mut h: u64 = 0xcbf29ce484222325;
        for b in s.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.insert_hash(splitmix64(h));
    }

    pub fn estimate(&self) -> u64 {
        match self {
            Self::Exact(set) => set.len() as u64,
            Self::Hll(hll) => hll.estimate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_skips_missing_in_aggregates() {
        let mut acc = StatsAccumulator::new(ColumnType::Double);
        acc.push(2.0);
        acc.push_missing();
        acc.push(4.0);
        acc.push(4.0);
        let stats = acc.finish();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.missing_count, 1);
        assert_eq!(stats.distinct_count, 2);
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(4.0));
        assert_eq!(stats.sum, Some(10.0));
        assert_eq!(stats.mean, Some(10.0 / 3.0));
    }

    #[test]
    fn distinct_counter_spills_to_estimate() {
        let mut counter = DistinctCounter::new();
        for i in 0..10_000u64 {
            counter.insert_hash(splitmix64(i));
        }
        assert!(matches!(counter, DistinctCounter::Hll(_)));
        let est = counter.estimate() as f64;
        assert!((est - 10_000.0).abs() / 10_000.0 < 0.15, "estimate {est}");
    }
}
