use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneError {
    #[error("Zone bounds must satisfy 0 <= lo <= hi <= 100, got {lo}-{hi}")]
    OutOfRange { lo: u32, hi: u32 },
}

/// Inclusive integer percentile range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawZone")]
pub struct PercentileZone {
    lo: u32,
    hi: u32,
}

// Unchecked wire form; bounds are validated on the way in.
#[derive(Deserialize)]
struct RawZone {
    lo: u32,
    hi: u32,
}

impl TryFrom<RawZone> for PercentileZone {
    type Error = ZoneError;

    fn try_from(raw: RawZone) -> Result<Self, Self::Error> {
        Self::new(raw.lo, raw.hi)
    }
}

impl PercentileZone {
    pub fn new(lo: u32, hi: u32) -> Result<Self, ZoneError> {
        if lo > hi || hi > 100 {
            return Err(ZoneError::OutOfRange { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> u32 {
        self.lo
    }

    pub fn hi(&self) -> u32 {
        self.hi
    }

    pub fn contains(&self, value: u32) -> bool {
        self.lo <= value && value <= self.hi
    }
}

impl fmt::Display for PercentileZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lo, self.hi)
    }
}

/// The configured list of primary percentile zones.
///
/// An empty set keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneSet {
    zones: Vec<PercentileZone>,
}

impl ZoneSet {
    pub fn keep_all() -> Self {
        Self::default()
    }

    pub fn new(zones: Vec<PercentileZone>) -> Self {
        Self { zones }
    }

    /// Parse `"0–26, 30–35, 36–43"`. Either `-` or `–` separates the bounds.
    /// Malformed, inverted, or out-of-range pieces are skipped.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.replace('–', "-");
        let mut zones = Vec::new();

        for piece in normalized.split(',') {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let Some((a, b)) = piece.split_once('-') else {
                log::warn!("ignoring percentile zone without a range separator: {piece:?}");
                continue;
            };
            match (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
                (Ok(lo), Ok(hi)) => match PercentileZone::new(lo, hi) {
                    Ok(zone) => zones.push(zone),
                    Err(e) => log::warn!("ignoring percentile zone {piece:?}: {e}"),
                },
                _ => log::warn!("ignoring malformed percentile zone {piece:?}"),
            }
        }

        Self { zones }
    }

    pub fn zones(&self) -> &[PercentileZone] {
        &self.zones
    }

    pub fn is_keep_all(&self) -> bool {
        self.zones.is_empty()
    }

    /// True iff `value` falls inside at least one zone, or the set is empty.
    pub fn admits(&self, value: u32) -> bool {
        self.is_keep_all() || self.zones.iter().any(|z| z.contains(value))
    }

    /// Union retention: passing either the local or the global test is enough.
    pub fn admits_either(&self, local: u32, global: u32) -> bool {
        self.admits(local) || self.admits(global)
    }
}
