//! Filter records as they arrive at the engine boundary, and their compiled form.

use std::collections::BTreeSet;
use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::Context;
use crate::expr::{CompileError, EvalError, Predicate};
use crate::types::identifiers::{CatalogVersion, FilterId};

/// An already-parsed filter definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRecord {
    #[serde(alias = "fid")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Applicability guard. Missing or blank means always applicable.
    #[serde(default)]
    pub applicable_if: Option<String>,
    /// Elimination condition. Missing or blank means never eliminates.
    #[serde(default)]
    pub expression: Option<String>,
    /// Accepts a JSON bool or the CSV-style text `"true"` in any case.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub enabled: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
    Other(serde_json::Value),
}

// Anything other than `true` or "true" (case-insensitive) is off.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(text) => text.trim().eq_ignore_ascii_case("true"),
        Flag::Other(_) => false,
    })
}

impl FilterRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            applicable_if: None,
            expression: Some(expression.into()),
            enabled: true,
        }
    }

    pub fn with_applicable(mut self, applicable_if: impl Into<String>) -> Self {
        self.applicable_if = Some(applicable_if.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionRole {
    Applicable,
    Elimination,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterCompileError {
    #[error("Filter id is empty")]
    EmptyId,

    #[error("Duplicate filter id: {0}")]
    DuplicateId(String),

    #[error("Invalid {role:?} expression: {source}")]
    Expression {
        role: ExpressionRole,
        #[source]
        source: CompileError,
    },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A record that was excluded from the active set at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFilter {
    pub id: String,
    pub name: String,
    pub reason: String,
}

/// Outcome of running one filter against one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Applicable and the elimination condition held.
    Eliminates,
    /// Applicable, elimination condition false.
    Passes,
    /// The applicability guard was false.
    NotApplicable,
    /// An expression failed at runtime; read as "does not eliminate".
    Failed {
        role: ExpressionRole,
        error: EvalError,
    },
}

impl Verdict {
    pub fn eliminates(&self) -> bool {
        matches!(self, Verdict::Eliminates)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub id: FilterId,
    pub name: String,
    pub applicable: Predicate,
    pub elimination: Predicate,
    pub enabled_default: bool,
}

fn clean(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim_matches('\'').trim()
}

impl CompiledFilter {
    pub fn compile(record: &FilterRecord) -> Result<Self, FilterCompileError> {
        let id = record.id.trim();
        if id.is_empty() {
            return Err(FilterCompileError::EmptyId);
        }

        let applicable = match record.applicable_if.as_deref().map(clean) {
            Some(src) if !src.is_empty() => Predicate::compile(src),
            _ => Ok(Predicate::constant(true)),
        }
        .map_err(|source| FilterCompileError::Expression {
            role: ExpressionRole::Applicable,
            source,
        })?;

        let elimination = match record.expression.as_deref().map(clean) {
            Some(src) if !src.is_empty() => Predicate::compile(&src.replace("!==", "!=")),
            _ => Ok(Predicate::constant(false)),
        }
        .map_err(|source| FilterCompileError::Expression {
            role: ExpressionRole::Elimination,
            source,
        })?;

        Ok(Self {
            id: FilterId::new(id),
            name: clean(&record.name).to_string(),
            applicable,
            elimination,
            enabled_default: record.enabled,
        })
    }

    pub fn evaluate(&self, ctx: &Context<'_>) -> Verdict {
        match self.applicable.eval(ctx) {
            Ok(true) => {}
            Ok(false) => return Verdict::NotApplicable,
            Err(error) => {
                return Verdict::Failed {
                    role: ExpressionRole::Applicable,
                    error,
                }
            }
        }

        match self.elimination.eval(ctx) {
            Ok(true) => Verdict::Eliminates,
            Ok(false) => Verdict::Passes,
            Err(error) => Verdict::Failed {
                role: ExpressionRole::Elimination,
                error,
            },
        }
    }

    fn version_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.id,
            self.applicable.source(),
            self.elimination.source(),
            self.enabled_default
        )
    }
}

/// The compiled, immutable set of filters for a session.
#[derive(Debug, Clone)]
pub struct FilterCatalog {
    filters: Vec<CompiledFilter>,
    skipped: Vec<SkippedFilter>,
    version: CatalogVersion,
    compiled_at: DateTime<Utc>, // informational only
}

impl FilterCatalog {
    /// Compile every record in order. Records that fail are reported in
    /// [`FilterCatalog::skipped`] and never reach the active set.
    pub fn compile(records: &[FilterRecord]) -> Self {
        let mut filters: Vec<CompiledFilter> = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();
        let mut seen = BTreeSet::new();

        for record in records {
            let compiled = CompiledFilter::compile(record).and_then(|filter| {
                if seen.contains(&filter.id) {
                    Err(FilterCompileError::DuplicateId(filter.id.to_string()))
                } else {
                    Ok(filter)
                }
            });

            match compiled {
                Ok(filter) => {
                    seen.insert(filter.id.clone());
                    filters.push(filter);
                }
                Err(e) => {
                    log::warn!("skipping filter {:?}: {e}", record.id);
                    skipped.push(SkippedFilter {
                        id: record.id.clone(),
                        name: record.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let lines: Vec<String> = filters.iter().map(CompiledFilter::version_line).collect();
        let version = CatalogVersion::from_lines(lines.iter().map(String::as_str));

        Self {
            filters,
            skipped,
            version,
            compiled_at: Utc::now(),
        }
    }

    /// Compile a JSON array of [`FilterRecord`]s.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let records: Vec<FilterRecord> = serde_json::from_reader(reader)?;
        Ok(Self::compile(&records))
    }

    pub fn filters(&self) -> &[CompiledFilter] {
        &self.filters
    }

    pub fn skipped(&self) -> &[SkippedFilter] {
        &self.skipped
    }

    pub fn version(&self) -> &CatalogVersion {
        &self.version
    }

    pub fn compiled_at(&self) -> DateTime<Utc> {
        self.compiled_at
    }

    pub fn get(&self, id: &str) -> Option<&CompiledFilter> {
        self.filters.iter().find(|f| f.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
