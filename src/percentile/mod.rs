pub mod ranking;
pub mod zones;

pub use ranking::{percentile_ranks, round_percentile, AverageRankPercentile, Ranker};
pub use zones::{PercentileZone, ZoneError, ZoneSet};
