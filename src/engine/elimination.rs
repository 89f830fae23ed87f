//! Initial counts, display order, first-match survivorship and sequential
//! (dynamic) counts over a fixed candidate pool.

use std::cmp::Reverse;

use crate::context::Context;
use crate::filters::{CompiledFilter, Verdict};

/// Which candidates each filter eliminates, evaluated once per (filter, candidate).
///
/// Rows follow catalog order; columns follow the candidate slice. Every later
/// pass reads from this grid, so no pass can observe another's work.
#[derive(Debug, Clone)]
pub struct EvaluationMatrix {
    eliminates: Vec<Vec<bool>>,
    eval_errors: Vec<usize>,
}

impl EvaluationMatrix {
    pub fn evaluate(filters: &[CompiledFilter], contexts: &[Context<'_>]) -> Self {
        let mut eliminates = Vec::with_capacity(filters.len());
        let mut eval_errors = Vec::with_capacity(filters.len());

        for filter in filters {
            let mut errors = 0;
            let row: Vec<bool> = contexts
                .iter()
                .map(|ctx| match filter.evaluate(ctx) {
                    Verdict::Failed { role, error } => {
                        errors += 1;
                        log::debug!(
                            "filter {} {role:?} expression failed on {}: {error}",
                            filter.id,
                            ctx.combo()
                        );
                        false
                    }
                    verdict => verdict.eliminates(),
                })
                .collect();
            eliminates.push(row);
            eval_errors.push(errors);
        }

        Self {
            eliminates,
            eval_errors,
        }
    }

    pub fn eliminates(&self, filter: usize, candidate: usize) -> bool {
        self.eliminates[filter][candidate]
    }

    /// Candidates the filter eliminates on its own, against the full pool.
    pub fn initial_count(&self, filter: usize) -> usize {
        self.eliminates[filter].iter().filter(|&&e| e).count()
    }

    pub fn initial_counts(&self) -> Vec<usize> {
        (0..self.eliminates.len()).map(|f| self.initial_count(f)).collect()
    }

    pub fn eval_errors(&self, filter: usize) -> usize {
        self.eval_errors[filter]
    }

    pub fn filter_count(&self) -> usize {
        self.eliminates.len()
    }
}

/// Filter indices with zero-impact filters last and the rest by descending
/// initial count. Ties keep catalog order.
pub fn display_order(initial_counts: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..initial_counts.len()).collect();
    order.sort_by_key(|&f| (initial_counts[f] == 0, Reverse(initial_counts[f])));
    order
}

/// Per-candidate progress through the ordered filter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    /// Next position in the display order to check.
    Evaluating(usize),
    /// Removed by the filter at this catalog index.
    Eliminated(usize),
    Survivor,
}

/// Walk the display order until an active filter eliminates the candidate.
pub fn first_match<F>(order: &[usize], active: &[bool], mut eliminates: F) -> CandidateState
where
    F: FnMut(usize) -> bool,
{
    let mut state = CandidateState::Evaluating(0);
    loop {
        state = match state {
            CandidateState::Evaluating(pos) => match order.get(pos) {
                None => CandidateState::Survivor,
                Some(&f) if active[f] && eliminates(f) => CandidateState::Eliminated(f),
                Some(_) => CandidateState::Evaluating(pos + 1),
            },
            terminal => return terminal,
        };
    }
}

/// Terminal state of every candidate under first-match-wins.
pub fn survivorship(
    matrix: &EvaluationMatrix,
    order: &[usize],
    active: &[bool],
    candidates: usize,
) -> Vec<CandidateState> {
    (0..candidates)
        .map(|c| first_match(order, active, |f| matrix.eliminates(f, c)))
        .collect()
}

/// Result of the sequential pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicPass {
    /// Marginal removals per filter, indexed by catalog position.
    pub counts: Vec<usize>,
    /// Candidate indices left after every active filter ran, ascending.
    pub remaining: Vec<usize>,
}

/// Apply active filters in display order to a shrinking pool.
pub fn dynamic_counts(
    matrix: &EvaluationMatrix,
    order: &[usize],
    active: &[bool],
    candidates: usize,
) -> DynamicPass {
    let mut counts = vec![0; matrix.filter_count()];
    let mut remaining: Vec<usize> = (0..candidates).collect();

    for &f in order {
        if !active[f] {
            continue;
        }
        let before = remaining.len();
        remaining.retain(|&c| !matrix.eliminates(f, c));
        counts[f] = before - remaining.len();
    }

    DynamicPass { counts, remaining }
}
