use serde::{Deserialize, Serialize};

use crate::types::identifiers::{BoxKey, CatalogVersion, FilterId};

/// Per-filter elimination accounting for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub id: FilterId,
    pub name: String,
    pub active: bool,

    /// Candidates this filter eliminates on its own against the full pool.
    pub initial_count: usize,
    /// Candidates this filter removed from the shrinking pool, in display order.
    pub dynamic_count: usize,

    /// Candidates for which an expression failed at runtime and was read as false.
    pub eval_errors: usize,
}

/// A candidate removed during survivorship, with the first filter that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub combo: BoxKey,
    pub filter_id: FilterId,
    pub filter_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComboOutcome {
    Survivor,
    Eliminated {
        filter_id: FilterId,
        filter_name: String,
    },
    /// The input was not five digits; nothing was evaluated.
    Invalid { input: String },
}

/// Status of a caller-supplied combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo: Option<BoxKey>,
    /// False when the combo was not part of the generated, zoned pool.
    pub in_pool: bool,
    pub outcome: ComboOutcome,
}

/// How much of the fixed box universe the pool covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageStats {
    pub universe_size: usize,
    pub covered_count: usize,
    pub missing_boxes: Vec<BoxKey>,
    pub coverage_percent: f64,
}

/// Sizes at each stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub seed: String,
    pub straights_generated: usize,
    pub straights_in_zones: usize,
    pub pool_size: usize,
    pub active_filters: usize,
    pub survivors: usize,
    pub catalog_version: CatalogVersion,
}

/// The final result of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    pub pool: Vec<BoxKey>,
    /// Filters in display order.
    pub filters: Vec<FilterStats>,
    pub survivors: Vec<BoxKey>,
    pub eliminated: Vec<Elimination>,
    pub combo_check: Option<ComboCheck>,
    pub coverage: CoverageStats,
    pub run: RunMetadata,
}
