//! Deterministic candidate filtering for 5-digit draws.
//!
//! `dc5-core` expands a seed draw and two pair groups into every distinct
//! straight, keeps the straights whose digit-sum percentile lands in the
//! configured zones, reduces them to boxes, and runs the boxes through an
//! ordered list of user-authored filters. Filter expressions are compiled into
//! a small closed predicate language; they can only read the per-candidate
//! context. Identical inputs always produce identical reports.

pub mod config;
pub mod context;
pub mod engine;
pub mod expr;
pub mod filters;
pub mod generation;
pub mod percentile;
pub mod types;

pub use config::EngineConfig;
pub use engine::FilterEngine;
pub use filters::{CompiledFilter, FilterCatalog, FilterRecord, SkippedFilter};
pub use types::{BoxKey, FilterReport, FilterRequest, FilterSelection, ValidationError};
