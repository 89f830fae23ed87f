use serde::{Deserialize, Serialize};

use crate::percentile::ZoneSet;

// Key point:
// Serializable
// Comparable
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Primary percentile zones. Empty keeps every straight.
    pub primary_zones: ZoneSet,
    /// Pair group entries beyond this count are truncated.
    pub max_pair_entries: usize,
    /// Leave zero-impact filters out of the reported filter list.
    pub hide_zero_initial: bool,
}

impl EngineConfig {
    pub fn v0() -> Self {
        Self {
            primary_zones: ZoneSet::keep_all(),
            max_pair_entries: 20,
            hide_zero_initial: true,
        }
    }

    pub fn with_zones(mut self, zones: ZoneSet) -> Self {
        self.primary_zones = zones;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::v0()
    }
}
