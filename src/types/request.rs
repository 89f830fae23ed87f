use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::identifiers::{FilterId, DRAW_LEN};

/// Whole-request input errors. Generation never starts when one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Draw 1-back must be exactly 5 digits, got {0:?}")]
    InvalidSeed(String),

    #[error("Pair group {group} has no valid two-digit entries")]
    EmptyPairGroup { group: PairGroupLabel },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairGroupLabel {
    A,
    B,
}

impl fmt::Display for PairGroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairGroupLabel::A => f.write_str("A"),
            PairGroupLabel::B => f.write_str("B"),
        }
    }
}

/// Up to three prior draws: the seed (1-back) and two optional back-draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawHistory {
    pub seed: [u8; DRAW_LEN],
    pub prev: Vec<u8>,
    pub prev_prev: Vec<u8>,
}

impl DrawHistory {
    /// The seed must be exactly five digits after trimming. Back-draws keep
    /// only their digit characters.
    pub fn parse(
        seed: &str,
        prev: Option<&str>,
        prev_prev: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let trimmed = seed.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != DRAW_LEN || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(ValidationError::InvalidSeed(seed.to_string()));
        }

        let mut digits = [0u8; DRAW_LEN];
        for (slot, b) in digits.iter_mut().zip(bytes) {
            *slot = b - b'0';
        }

        Ok(DrawHistory {
            seed: digits,
            prev: digits_only(prev.unwrap_or("")),
            prev_prev: digits_only(prev_prev.unwrap_or("")),
        })
    }
}

fn digits_only(raw: &str) -> Vec<u8> {
    raw.bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect()
}

/// An ordered, duplicate-free list of two-digit pair tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairGroup {
    pairs: Vec<[u8; 2]>,
}

impl PairGroup {
    /// Validate raw tokens: malformed and repeated tokens are dropped, entries
    /// past `max_entries` are truncated, and an empty result is an error.
    pub fn from_tokens<S: AsRef<str>>(
        label: PairGroupLabel,
        tokens: &[S],
        max_entries: usize,
    ) -> Result<Self, ValidationError> {
        let mut pairs: Vec<[u8; 2]> = Vec::new();

        for token in tokens {
            let raw = token.as_ref().trim();
            let bytes = raw.as_bytes();
            if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
                log::warn!("pair group {label}: dropping malformed token {raw:?}");
                continue;
            }
            let pair = [bytes[0] - b'0', bytes[1] - b'0'];
            if pairs.contains(&pair) {
                log::warn!("pair group {label}: dropping duplicate token {raw:?}");
                continue;
            }
            pairs.push(pair);
        }

        if pairs.len() > max_entries {
            log::warn!(
                "pair group {label}: truncating {} entries to {max_entries}",
                pairs.len()
            );
            pairs.truncate(max_entries);
        }

        if pairs.is_empty() {
            return Err(ValidationError::EmptyPairGroup { group: label });
        }

        Ok(PairGroup { pairs })
    }

    pub fn pairs(&self) -> &[[u8; 2]] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Request-scoped snapshot of which filters are enabled.
///
/// An explicit per-id entry wins; otherwise a filter is active when
/// `select_all` is set and the filter is enabled by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub select_all: bool,
    pub overrides: BTreeMap<FilterId, bool>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            select_all: true,
            overrides: BTreeMap::new(),
        }
    }
}

impl FilterSelection {
    /// Exactly the given ids are active.
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            select_all: false,
            overrides: ids
                .into_iter()
                .map(|id| (FilterId::new(id), true))
                .collect(),
        }
    }

    /// Nothing is active.
    pub fn none() -> Self {
        Self {
            select_all: false,
            overrides: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, id: impl Into<String>, enabled: bool) {
        self.overrides.insert(FilterId::new(id), enabled);
    }

    pub fn is_active(&self, id: &FilterId, enabled_default: bool) -> bool {
        self.overrides
            .get(id)
            .copied()
            .unwrap_or(self.select_all && enabled_default)
    }
}

/// Everything the engine needs for one run, as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub seed: String,
    #[serde(default)]
    pub prev_draw: Option<String>,
    #[serde(default)]
    pub prev_prev_draw: Option<String>,

    pub pair_group_a: Vec<String>,
    pub pair_group_b: Vec<String>,

    #[serde(default)]
    pub hot_digits: Vec<u8>,
    #[serde(default)]
    pub cold_digits: Vec<u8>,

    #[serde(default)]
    pub selection: FilterSelection,

    #[serde(default)]
    pub check_combo: Option<String>,
}

impl FilterRequest {
    pub fn new<A, B>(seed: impl Into<String>, pair_group_a: A, pair_group_b: B) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            seed: seed.into(),
            prev_draw: None,
            prev_prev_draw: None,
            pair_group_a: pair_group_a.into_iter().map(Into::into).collect(),
            pair_group_b: pair_group_b.into_iter().map(Into::into).collect(),
            hot_digits: Vec::new(),
            cold_digits: Vec::new(),
            selection: FilterSelection::default(),
            check_combo: None,
        }
    }
}

/// Split `"01, 27,56"` into two-digit tokens, dropping anything else.
pub fn parse_pairs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

/// Split `"1, 2, x"` into digits 0-9, dropping anything else.
pub fn parse_digit_list(raw: &str) -> Vec<u8> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|p| p.parse::<u8>().ok())
        .filter(|d| *d <= 9)
        .collect()
}
