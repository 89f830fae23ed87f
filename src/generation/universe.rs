use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;

use crate::percentile::{AverageRankPercentile, Ranker};
use crate::types::identifiers::BoxKey;
use crate::types::report::CoverageStats;

/// C(10 + 5 - 1, 5): combinations with repetition of 10 digits taken 5 at a time.
pub const UNIVERSE_SIZE: usize = 2002;

// Built on first access behind `Lazy`; concurrent first callers block until
// the single build finishes and never observe a partial map.
static UNIVERSE: Lazy<Universe> = Lazy::new(Universe::build);

/// The fixed set of all boxes together with their global digit-sum percentiles.
#[derive(Debug)]
pub struct Universe {
    boxes: Vec<BoxKey>,
    global_percentiles: HashMap<BoxKey, f64>,
}

/// Process-wide universe, read-only after the first call.
pub fn universe() -> &'static Universe {
    &UNIVERSE
}

/// Every non-decreasing 5-digit sequence over 0-9, ascending.
pub fn enumerate_universe() -> Vec<BoxKey> {
    let mut boxes = Vec::with_capacity(UNIVERSE_SIZE);
    for a in 0..=9u8 {
        for b in a..=9 {
            for c in b..=9 {
                for d in c..=9 {
                    for e in d..=9 {
                        boxes.push(BoxKey::from_digits([a, b, c, d, e]));
                    }
                }
            }
        }
    }
    debug_assert_eq!(boxes.len(), UNIVERSE_SIZE);
    boxes
}

impl Universe {
    fn build() -> Self {
        let boxes = enumerate_universe();
        let sums: Vec<u32> = boxes.iter().map(BoxKey::digit_sum).collect();
        let ranks = AverageRankPercentile.ranks(&sums);

        let global_percentiles = boxes.iter().copied().zip(ranks).collect();

        log::debug!("built box universe with {} members", boxes.len());

        Self {
            boxes,
            global_percentiles,
        }
    }

    pub fn boxes(&self) -> &[BoxKey] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Percentile of the box's digit sum across the whole universe.
    pub fn global_percentile(&self, key: &BoxKey) -> Option<f64> {
        self.global_percentiles.get(key).copied()
    }

    /// Coverage of the universe by a pool of boxes.
    pub fn coverage(&self, pool: &[BoxKey]) -> CoverageStats {
        let present: BTreeSet<&BoxKey> = pool.iter().collect();

        let mut covered_count = 0;
        let mut missing_boxes = Vec::new();
        for key in &self.boxes {
            if present.contains(key) {
                covered_count += 1;
            } else {
                missing_boxes.push(*key);
            }
        }

        let coverage_percent = if self.boxes.is_empty() {
            0.0
        } else {
            covered_count as f64 / self.boxes.len() as f64 * 100.0
        };

        CoverageStats {
            universe_size: self.boxes.len(),
            covered_count,
            missing_boxes,
            coverage_percent,
        }
    }
}
