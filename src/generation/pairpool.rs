use std::collections::BTreeSet;

use crate::types::identifiers::{Straight, DRAW_LEN};
use crate::types::request::PairGroup;

/// Expand every `seed digit + pair A + pair B` base into all of its distinct
/// orderings.
///
/// The result is sorted and duplicate-free. Bases built from repeated seed
/// digits or overlapping pairs collapse naturally.
pub fn generate_straights(
    seed: &[u8; DRAW_LEN],
    group_a: &PairGroup,
    group_b: &PairGroup,
) -> Vec<Straight> {
    let mut pool = BTreeSet::new();

    for &sd in seed {
        for a in group_a.pairs() {
            for b in group_b.pairs() {
                let base = [sd, a[0], a[1], b[0], b[1]];
                pool.extend(distinct_permutations(base));
            }
        }
    }

    pool.into_iter().collect()
}

/// All distinct orderings of a 5-digit multiset, in ascending order.
///
/// Repeated digits yield fewer than 120 results (120 / product of the
/// factorials of each digit's multiplicity).
pub fn distinct_permutations(mut digits: [u8; DRAW_LEN]) -> Vec<Straight> {
    digits.sort_unstable();

    let mut out = vec![Straight::new(digits)];
    while next_permutation(&mut digits) {
        out.push(Straight::new(digits));
    }
    out
}

/// Advance to the next lexicographic permutation. Returns false once the
/// sequence is the last (non-increasing) permutation.
fn next_permutation(digits: &mut [u8]) -> bool {
    let n = digits.len();
    if n < 2 {
        return false;
    }

    // Rightmost ascent.
    let mut i = n - 1;
    while i > 0 && digits[i - 1] >= digits[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }

    let mut j = n - 1;
    while digits[j] <= digits[i - 1] {
        j -= 1;
    }

    digits.swap(i - 1, j);
    digits[i..].reverse();
    true
}
