/// Assigns each value its percentile standing within the collection.
///
/// Output is order-preserving: `ranks(values)[i]` belongs to `values[i]`.
pub trait Ranker {
    fn ranks(&self, values: &[u32]) -> Vec<f64>;

    fn rounded_ranks(&self, values: &[u32]) -> Vec<u32> {
        self.ranks(values).into_iter().map(round_percentile).collect()
    }
}

/// Tie-aware percentile rank: every run of equal values shares the average of
/// its 0-indexed sorted positions, scaled by `max(n - 1, 1)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AverageRankPercentile;

impl Ranker for AverageRankPercentile {
    fn ranks(&self, values: &[u32]) -> Vec<f64> {
        percentile_ranks(values)
    }
}

pub fn percentile_ranks<T: Ord>(values: &[T]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    // Stable sort keeps equal values in input order; only the run bounds matter.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].cmp(&values[b]));

    let scale = (n - 1).max(1) as f64;
    let mut ranks = vec![0.0; n];

    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }

        let avg_rank = (i + j) as f64 / 2.0;
        let pct = avg_rank / scale * 100.0;
        for &idx in &order[i..=j] {
            ranks[idx] = pct;
        }

        i = j + 1;
    }

    debug_assert!(ranks.iter().all(|p| (0.0..=100.0).contains(p)));
    ranks
}

/// Round half to even, clamped to 0..=100.
pub fn round_percentile(pct: f64) -> u32 {
    pct.round_ties_even().clamp(0.0, 100.0) as u32
}
