//! Per-candidate attribute bundle evaluated by filter predicates.
//!
//! History-derived attributes are computed once per request in a
//! [`HistoryProfile`]; a [`Context`] pairs that profile with one candidate box.
//! Both are immutable once built.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::value::{MapValue, Value};
use crate::types::identifiers::{BoxKey, DRAW_LEN};
use crate::types::request::DrawHistory;

/// V-Trac group of each digit: {0,5}->1, {1,6}->2, {2,7}->3, {3,8}->4, {4,9}->5.
pub const V_TRAC_GROUPS: [u8; 10] = [1, 2, 3, 4, 5, 1, 2, 3, 4, 5];

/// Mirror of each digit: d <-> (d + 5) mod 10.
pub const MIRROR_PAIRS: [u8; 10] = [5, 6, 7, 8, 9, 0, 1, 2, 3, 4];

pub fn vtrac(digit: u8) -> u8 {
    V_TRAC_GROUPS[digit as usize % 10]
}

pub fn mirror(digit: u8) -> u8 {
    MIRROR_PAIRS[digit as usize % 10]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SumCategory {
    VeryLow,
    Low,
    Mid,
    High,
}

impl SumCategory {
    pub fn of(total: u32) -> Self {
        match total {
            0..=15 => SumCategory::VeryLow,
            16..=24 => SumCategory::Low,
            25..=33 => SumCategory::Mid,
            _ => SumCategory::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SumCategory::VeryLow => "Very Low",
            SumCategory::Low => "Low",
            SumCategory::Mid => "Mid",
            SumCategory::High => "High",
        }
    }
}

impl fmt::Display for SumCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(total: u32) -> Self {
        if total % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Parity::Even => "Even",
            Parity::Odd => "Odd",
        }
    }
}

fn digit_sum(digits: &[u8]) -> u32 {
    digits.iter().map(|&d| d as u32).sum()
}

/// Attributes derived from the draw history plus hot/cold digit lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryProfile {
    pub seed_digits: Vec<u8>,
    pub prev_seed_digits: Vec<u8>,
    pub prev_prev_seed_digits: Vec<u8>,

    /// Seed digits absent from the 2-back draw.
    pub new_seed_digits: BTreeSet<u8>,
    /// Digits present in both the seed and the 2-back draw.
    pub common_to_both: BTreeSet<u8>,
    /// Union of the seed and 2-back digits.
    pub last2: BTreeSet<u8>,

    pub hot_digits: Vec<u8>,
    pub cold_digits: Vec<u8>,
    /// Digits absent from both back-draws.
    pub due_digits: Vec<u8>,

    pub seed_counts: BTreeMap<u8, i64>,
    pub seed_sum: u32,
    pub seed_sum_cat: SumCategory,
    pub seed_vtracs: BTreeSet<u8>,

    /// (category, parity) for 3-back, 2-back and 1-back, oldest first.
    pub prev_pattern: [(SumCategory, Parity); 3],
}

impl HistoryProfile {
    pub fn new(history: &DrawHistory, hot_digits: &[u8], cold_digits: &[u8]) -> Self {
        let seed_digits = history.seed.to_vec();
        let prev = &history.prev;
        let prev_prev = &history.prev_prev;

        let seed_set: BTreeSet<u8> = seed_digits.iter().copied().collect();
        let prev_set: BTreeSet<u8> = prev.iter().copied().collect();

        let due_digits = (0..=9u8)
            .filter(|d| !prev.contains(d) && !prev_prev.contains(d))
            .collect();

        let mut seed_counts = BTreeMap::new();
        for &d in &seed_digits {
            *seed_counts.entry(d).or_insert(0) += 1;
        }

        let seed_sum = digit_sum(&seed_digits);
        let pattern_cell = |digits: &[u8]| {
            let total = digit_sum(digits);
            (SumCategory::of(total), Parity::of(total))
        };

        HistoryProfile {
            new_seed_digits: seed_set.difference(&prev_set).copied().collect(),
            common_to_both: seed_set.intersection(&prev_set).copied().collect(),
            last2: seed_set.union(&prev_set).copied().collect(),
            hot_digits: hot_digits.iter().copied().filter(|d| *d <= 9).collect(),
            cold_digits: cold_digits.iter().copied().filter(|d| *d <= 9).collect(),
            due_digits,
            seed_counts,
            seed_sum,
            seed_sum_cat: SumCategory::of(seed_sum),
            seed_vtracs: seed_digits.iter().map(|&d| vtrac(d)).collect(),
            prev_pattern: [
                pattern_cell(prev_prev),
                pattern_cell(prev),
                pattern_cell(&seed_digits),
            ],
            prev_seed_digits: prev.clone(),
            prev_prev_seed_digits: prev_prev.clone(),
            seed_digits,
        }
    }
}

/// The full attribute set for one candidate.
#[derive(Debug, Clone, Copy)]
pub struct Context<'h> {
    history: &'h HistoryProfile,
    combo: BoxKey,
    combo_sum: u32,
}

impl<'h> Context<'h> {
    pub fn build(history: &'h HistoryProfile, combo: BoxKey) -> Self {
        Context {
            history,
            combo,
            combo_sum: combo.digit_sum(),
        }
    }

    pub fn history(&self) -> &'h HistoryProfile {
        self.history
    }

    pub fn combo(&self) -> BoxKey {
        self.combo
    }

    pub fn combo_digits(&self) -> &[u8; DRAW_LEN] {
        self.combo.digits()
    }

    pub fn combo_sum(&self) -> u32 {
        self.combo_sum
    }

    pub fn combo_sum_cat(&self) -> SumCategory {
        SumCategory::of(self.combo_sum)
    }

    pub fn combo_vtracs(&self) -> BTreeSet<u8> {
        self.combo.digits().iter().map(|&d| vtrac(d)).collect()
    }

    /// Value of one schema field, as seen by predicates.
    pub fn value(&self, field: Field) -> Value {
        let h = self.history;
        match field {
            Field::Combo => Value::str(self.combo.to_string()),
            Field::ComboDigits => Value::int_list(self.combo.digits()),
            Field::ComboSum => Value::Int(self.combo_sum as i64),
            Field::ComboSumCat => Value::str(self.combo_sum_cat().as_str()),
            Field::ComboVtracs => Value::int_set(&self.combo_vtracs()),
            Field::SeedDigits => Value::int_list(&h.seed_digits),
            Field::PrevSeedDigits => Value::int_list(&h.prev_seed_digits),
            Field::PrevPrevSeedDigits => Value::int_list(&h.prev_prev_seed_digits),
            Field::NewSeedDigits => Value::int_set(&h.new_seed_digits),
            Field::CommonToBoth => Value::int_set(&h.common_to_both),
            Field::Last2 => Value::int_set(&h.last2),
            Field::HotDigits => Value::int_list(&h.hot_digits),
            Field::ColdDigits => Value::int_list(&h.cold_digits),
            Field::DueDigits => Value::int_list(&h.due_digits),
            Field::SeedCounts => Value::Map(MapValue {
                entries: h
                    .seed_counts
                    .iter()
                    .map(|(&d, &n)| (Value::Int(d as i64), Value::Int(n)))
                    .collect(),
                counting: true,
            }),
            Field::SeedSum => Value::Int(h.seed_sum as i64),
            Field::SeedSumCat => Value::str(h.seed_sum_cat.as_str()),
            Field::SeedVtracs => Value::int_set(&h.seed_vtracs),
            Field::PrevPattern => Value::Tuple(
                h.prev_pattern
                    .iter()
                    .flat_map(|(cat, parity)| [Value::str(cat.as_str()), Value::str(parity.as_str())])
                    .collect(),
            ),
            Field::Mirror => digit_table(&MIRROR_PAIRS),
            Field::VTracGroups => digit_table(&V_TRAC_GROUPS),
        }
    }
}

fn digit_table(table: &[u8; 10]) -> Value {
    Value::Map(MapValue {
        entries: table
            .iter()
            .enumerate()
            .map(|(d, &v)| (Value::Int(d as i64), Value::Int(v as i64)))
            .collect(),
        counting: false,
    })
}

/// The closed set of names a predicate may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Combo,
    ComboDigits,
    ComboSum,
    ComboSumCat,
    ComboVtracs,
    SeedDigits,
    PrevSeedDigits,
    PrevPrevSeedDigits,
    NewSeedDigits,
    CommonToBoth,
    Last2,
    HotDigits,
    ColdDigits,
    DueDigits,
    SeedCounts,
    SeedSum,
    SeedSumCat,
    SeedVtracs,
    PrevPattern,
    Mirror,
    VTracGroups,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::Combo,
        Field::ComboDigits,
        Field::ComboSum,
        Field::ComboSumCat,
        Field::ComboVtracs,
        Field::SeedDigits,
        Field::PrevSeedDigits,
        Field::PrevPrevSeedDigits,
        Field::NewSeedDigits,
        Field::CommonToBoth,
        Field::Last2,
        Field::HotDigits,
        Field::ColdDigits,
        Field::DueDigits,
        Field::SeedCounts,
        Field::SeedSum,
        Field::SeedSumCat,
        Field::SeedVtracs,
        Field::PrevPattern,
        Field::Mirror,
        Field::VTracGroups,
    ];

    pub fn from_name(name: &str) -> Option<Field> {
        let field = match name {
            "combo" => Field::Combo,
            "combo_digits" => Field::ComboDigits,
            "combo_sum" => Field::ComboSum,
            "combo_sum_cat" => Field::ComboSumCat,
            "combo_vtracs" => Field::ComboVtracs,
            "seed_digits" => Field::SeedDigits,
            "prev_seed_digits" => Field::PrevSeedDigits,
            "prev_prev_seed_digits" => Field::PrevPrevSeedDigits,
            "new_seed_digits" => Field::NewSeedDigits,
            "common_to_both" => Field::CommonToBoth,
            "last2" => Field::Last2,
            "hot_digits" => Field::HotDigits,
            "cold_digits" => Field::ColdDigits,
            "due_digits" => Field::DueDigits,
            "seed_counts" => Field::SeedCounts,
            "seed_sum" => Field::SeedSum,
            "prev_sum_cat" | "seed_sum_cat" => Field::SeedSumCat,
            "seed_vtracs" => Field::SeedVtracs,
            "prev_pattern" => Field::PrevPattern,
            "mirror" | "MIRROR" | "MIRROR_PAIRS" => Field::Mirror,
            "V_TRAC_GROUPS" | "vtrac_groups" => Field::VTracGroups,
            _ => return None,
        };
        Some(field)
    }

    /// Canonical name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Combo => "combo",
            Field::ComboDigits => "combo_digits",
            Field::ComboSum => "combo_sum",
            Field::ComboSumCat => "combo_sum_cat",
            Field::ComboVtracs => "combo_vtracs",
            Field::SeedDigits => "seed_digits",
            Field::PrevSeedDigits => "prev_seed_digits",
            Field::PrevPrevSeedDigits => "prev_prev_seed_digits",
            Field::NewSeedDigits => "new_seed_digits",
            Field::CommonToBoth => "common_to_both",
            Field::Last2 => "last2",
            Field::HotDigits => "hot_digits",
            Field::ColdDigits => "cold_digits",
            Field::DueDigits => "due_digits",
            Field::SeedCounts => "seed_counts",
            Field::SeedSum => "seed_sum",
            Field::SeedSumCat => "prev_sum_cat",
            Field::SeedVtracs => "seed_vtracs",
            Field::PrevPattern => "prev_pattern",
            Field::Mirror => "mirror",
            Field::VTracGroups => "V_TRAC_GROUPS",
        }
    }
}
