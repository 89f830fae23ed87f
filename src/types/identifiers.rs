use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Number of digits in every straight and box.
pub const DRAW_LEN: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoxKeyError {
    #[error("Expected exactly {DRAW_LEN} digits, got {0:?}")]
    WrongLength(String),
    #[error("Non-digit character in {0:?}")]
    NonDigit(String),
}

/// An ordered 5-digit sequence: one specific permutation of a digit multiset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Straight([u8; DRAW_LEN]);

impl Straight {
    pub fn new(digits: [u8; DRAW_LEN]) -> Self {
        Straight(digits)
    }

    pub fn parse(raw: &str) -> Result<Self, BoxKeyError> {
        parse_digits(raw).map(Straight)
    }

    pub fn digits(&self) -> &[u8; DRAW_LEN] {
        &self.0
    }

    pub fn digit_sum(&self) -> u32 {
        self.0.iter().map(|&d| d as u32).sum()
    }

    /// Canonical box of this straight.
    pub fn to_box(&self) -> BoxKey {
        BoxKey::from_digits(self.0)
    }
}

impl fmt::Display for Straight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_digits(f, &self.0)
    }
}

/// Canonical (digit-sorted) form of a straight.
///
/// Two straights are box-equivalent iff they share the same digit multiset.
/// A `BoxKey` can only be built through sorting, so the digits are always
/// non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxKey([u8; DRAW_LEN]);

impl BoxKey {
    pub fn from_digits(mut digits: [u8; DRAW_LEN]) -> Self {
        digits.sort_unstable();
        BoxKey(digits)
    }

    /// Normalize any 5-digit string (straight or box) into its box.
    pub fn parse(raw: &str) -> Result<Self, BoxKeyError> {
        parse_digits(raw).map(BoxKey::from_digits)
    }

    pub fn digits(&self) -> &[u8; DRAW_LEN] {
        &self.0
    }

    pub fn digit_sum(&self) -> u32 {
        self.0.iter().map(|&d| d as u32).sum()
    }
}

impl fmt::Display for BoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_digits(f, &self.0)
    }
}

impl Serialize for BoxKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BoxKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BoxKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn parse_digits(raw: &str) -> Result<[u8; DRAW_LEN], BoxKeyError> {
    let bytes = raw.as_bytes();
    if bytes.len() != DRAW_LEN {
        return Err(BoxKeyError::WrongLength(raw.to_string()));
    }
    let mut digits = [0u8; DRAW_LEN];
    for (slot, b) in digits.iter_mut().zip(bytes) {
        if !b.is_ascii_digit() {
            return Err(BoxKeyError::NonDigit(raw.to_string()));
        }
        *slot = b - b'0';
    }
    Ok(digits)
}

fn write_digits(f: &mut fmt::Formatter<'_>, digits: &[u8]) -> fmt::Result {
    for d in digits {
        write!(f, "{d}")?;
    }
    Ok(())
}

/// Unique, non-empty key of a filter within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(String);

impl FilterId {
    pub fn new(raw: impl Into<String>) -> Self {
        FilterId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content hash of a compiled filter catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogVersion(String);

impl CatalogVersion {
    /// Hash one line per filter, in catalog order.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut hasher = Sha256::new();
        for line in lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }

        let hash = hasher.finalize();
        let hex = hex::encode(hash);

        CatalogVersion(format!("sha256:{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
