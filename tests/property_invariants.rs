use std::collections::{BTreeMap, BTreeSet};

use dc5_core::generation::{distinct_permutations, normalize};
use dc5_core::percentile::percentile_ranks;
use dc5_core::types::{BoxKey, Straight};
use dc5_core::{EngineConfig, FilterCatalog, FilterEngine, FilterRecord, FilterRequest};

use proptest::prelude::*;

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

fn digits() -> impl Strategy<Value = [u8; 5]> {
    prop::array::uniform5(0u8..10)
}

fn pair_tokens() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec((0u8..10, 0u8..10), 1..4)
        .prop_map(|pairs| pairs.into_iter().map(|(a, b)| format!("{a}{b}")).collect())
}

fn catalog() -> FilterCatalog {
    FilterCatalog::compile(&[
        FilterRecord::new("F1", "High sum", "combo_sum > 30"),
        FilterRecord::new("F2", "Seed repeat", "len(set(combo_digits) & set(seed_digits)) >= 3"),
        FilterRecord::new("F3", "Quad", "max(Counter(combo_digits).values()) >= 4"),
        FilterRecord::new("F4", "Odd heavy", "sum(1 for d in combo_digits if d % 2) >= 4"),
    ])
}

proptest! {
    #[test]
    fn percentiles_stay_in_range_and_respect_order(values in prop::collection::vec(0u32..46, 1..60)) {
        let ranks = percentile_ranks(&values);
        prop_assert_eq!(ranks.len(), values.len());

        for (i, a) in values.iter().enumerate() {
            prop_assert!((0.0..=100.0).contains(&ranks[i]));
            for (j, b) in values.iter().enumerate() {
                if a == b {
                    prop_assert_eq!(ranks[i], ranks[j]);
                } else if a < b {
                    prop_assert!(ranks[i] < ranks[j]);
                }
            }
        }
    }

    #[test]
    fn distinct_values_hit_both_ends(values in prop::collection::btree_set(0u32..1000, 2..50)) {
        let mut values: Vec<u32> = values.into_iter().collect();
        values.reverse();

        let ranks = percentile_ranks(&values);
        prop_assert_eq!(ranks[0], 100.0);
        prop_assert_eq!(ranks[values.len() - 1], 0.0);
    }

    #[test]
    fn permutation_count_follows_digit_multiplicity(d in digits()) {
        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        for x in d {
            *counts.entry(x).or_insert(0) += 1;
        }
        let expected = counts.values().fold(factorial(5), |acc, &m| acc / factorial(m));

        let perms = distinct_permutations(d);
        prop_assert_eq!(perms.len(), expected);

        let unique: BTreeSet<&Straight> = perms.iter().collect();
        prop_assert_eq!(unique.len(), perms.len());

        let key = BoxKey::from_digits(d);
        prop_assert!(perms.iter().all(|s| s.to_box() == key));
    }

    #[test]
    fn boxing_is_idempotent_and_order_blind(d in digits(), shift in 0usize..5) {
        let straight = Straight::new(d);
        let mut rotated = d;
        rotated.rotate_left(shift);

        let key = normalize(&straight);
        prop_assert_eq!(key, normalize(&Straight::new(rotated)));
        prop_assert_eq!(BoxKey::parse(&key.to_string()).unwrap(), key);
        prop_assert_eq!(key.digit_sum(), straight.digit_sum());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn engine_partitions_any_pool(
        seed in digits(),
        group_a in pair_tokens(),
        group_b in pair_tokens(),
    ) {
        let catalog = catalog();
        let seed: String = seed.iter().map(|d| char::from(b'0' + d)).collect();
        let request = FilterRequest::new(seed, group_a, group_b);

        let report = FilterEngine::new(&catalog, EngineConfig { hide_zero_initial: false, ..EngineConfig::v0() })
            .run(&request)
            .unwrap();

        prop_assert_eq!(report.survivors.len() + report.eliminated.len(), report.pool.len());
        prop_assert_eq!(report.filters.len(), catalog.len());

        let dynamic_total: usize = report.filters.iter().map(|f| f.dynamic_count).sum();
        prop_assert_eq!(dynamic_total, report.eliminated.len());

        for f in &report.filters {
            prop_assert!(f.dynamic_count <= f.initial_count);
            prop_assert!(f.initial_count <= report.pool.len());
        }
    }
}
