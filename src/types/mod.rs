pub mod identifiers;
pub mod report;
pub mod request;

pub use identifiers::{BoxKey, BoxKeyError, CatalogVersion, FilterId, Straight, DRAW_LEN};
pub use report::{
    ComboCheck, ComboOutcome, CoverageStats, Elimination, FilterReport, FilterStats, RunMetadata,
};
pub use request::{
    parse_digit_list, parse_pairs, DrawHistory, FilterRequest, FilterSelection, PairGroup,
    PairGroupLabel, ValidationError,
};
