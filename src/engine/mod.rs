pub mod elimination;

use crate::config::EngineConfig;
use crate::context::{Context, HistoryProfile};
use crate::filters::FilterCatalog;
use crate::generation::{dedup_boxes, generate_straights, universe, Universe};
use crate::percentile::{round_percentile, AverageRankPercentile, Ranker, ZoneSet};
use crate::types::identifiers::{BoxKey, Straight};
use crate::types::report::{
    ComboCheck, ComboOutcome, Elimination, FilterReport, FilterStats, RunMetadata,
};
use crate::types::request::{
    DrawHistory, FilterRequest, PairGroup, PairGroupLabel, ValidationError,
};

pub use elimination::{
    display_order, dynamic_counts, first_match, survivorship, CandidateState, DynamicPass,
    EvaluationMatrix,
};

/// Keep straights whose rounded digit-sum percentile lands in a zone, either
/// within the generated pool or within the whole box universe.
pub fn retain_in_zones<R: Ranker>(
    straights: &[Straight],
    zones: &ZoneSet,
    ranker: &R,
    universe: &Universe,
) -> Vec<Straight> {
    if zones.is_keep_all() {
        return straights.to_vec();
    }

    let sums: Vec<u32> = straights.iter().map(Straight::digit_sum).collect();
    let local = ranker.rounded_ranks(&sums);

    straights
        .iter()
        .zip(local)
        .filter(|(straight, local_pct)| {
            match universe.global_percentile(&straight.to_box()) {
                Some(global) => zones.admits_either(*local_pct, round_percentile(global)),
                None => zones.admits(*local_pct),
            }
        })
        .map(|(straight, _)| *straight)
        .collect()
}

/// Candidate pool built from one request's seed and pair groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    pub straights_generated: usize,
    pub straights_in_zones: usize,
    pub boxes: Vec<BoxKey>,
}

pub struct FilterEngine<'c, R = AverageRankPercentile> {
    catalog: &'c FilterCatalog,
    config: EngineConfig,
    ranker: R,
}

impl<'c> FilterEngine<'c> {
    pub fn new(catalog: &'c FilterCatalog, config: EngineConfig) -> Self {
        Self {
            catalog,
            config,
            ranker: AverageRankPercentile,
        }
    }
}

impl<'c, R> FilterEngine<'c, R>
where
    R: Ranker,
{
    pub fn with_ranker(catalog: &'c FilterCatalog, config: EngineConfig, ranker: R) -> Self {
        Self {
            catalog,
            config,
            ranker,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate, zone and box the candidate pool.
    pub fn build_pool(
        &self,
        history: &DrawHistory,
        group_a: &PairGroup,
        group_b: &PairGroup,
    ) -> CandidatePool {
        let straights = generate_straights(&history.seed, group_a, group_b);
        let zoned = retain_in_zones(
            &straights,
            &self.config.primary_zones,
            &self.ranker,
            universe(),
        );
        let boxes = dedup_boxes(&zoned);

        CandidatePool {
            straights_generated: straights.len(),
            straights_in_zones: zoned.len(),
            boxes,
        }
    }

    pub fn run(&self, request: &FilterRequest) -> Result<FilterReport, ValidationError> {
        // 0. Validation: nothing is generated for a bad request
        let history = DrawHistory::parse(
            &request.seed,
            request.prev_draw.as_deref(),
            request.prev_prev_draw.as_deref(),
        )?;
        let max = self.config.max_pair_entries;
        let group_a = PairGroup::from_tokens(PairGroupLabel::A, request.pair_group_a.as_slice(), max)?;
        let group_b = PairGroup::from_tokens(PairGroupLabel::B, request.pair_group_b.as_slice(), max)?;

        // 1. Pool Phase
        let pool = self.build_pool(&history, &group_a, &group_b);

        // 2. Context Phase
        let profile = HistoryProfile::new(&history, &request.hot_digits, &request.cold_digits);
        let contexts: Vec<Context<'_>> = pool
            .boxes
            .iter()
            .map(|&key| Context::build(&profile, key))
            .collect();

        // 3. Evaluation Phase
        let filters = self.catalog.filters();
        let matrix = EvaluationMatrix::evaluate(filters, &contexts);
        let initial_counts = matrix.initial_counts();
        let order = display_order(&initial_counts);
        let active: Vec<bool> = filters
            .iter()
            .map(|f| request.selection.is_active(&f.id, f.enabled_default))
            .collect();

        // 4. Elimination Phase
        let states = survivorship(&matrix, &order, &active, contexts.len());
        let dynamic = dynamic_counts(&matrix, &order, &active, contexts.len());

        let mut survivors = Vec::new();
        let mut eliminated = Vec::new();
        for (key, state) in pool.boxes.iter().zip(&states) {
            match state {
                CandidateState::Eliminated(f) => eliminated.push(Elimination {
                    combo: *key,
                    filter_id: filters[*f].id.clone(),
                    filter_name: filters[*f].name.clone(),
                }),
                _ => survivors.push(*key),
            }
        }

        debug_assert_eq!(
            dynamic.remaining.iter().map(|&c| pool.boxes[c]).collect::<Vec<_>>(),
            survivors,
            "sequential pass and survivorship must agree"
        );

        // 5. Combo Check Phase: a bad combo is reported, never fatal
        let combo_check = request
            .check_combo
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| match BoxKey::parse(raw) {
                Ok(combo) => match pool.boxes.binary_search(&combo) {
                    Ok(c) => ComboCheck {
                        combo: Some(combo),
                        in_pool: true,
                        outcome: outcome_for(states[c], self.catalog),
                    },
                    Err(_) => {
                        let ctx = Context::build(&profile, combo);
                        let state =
                            first_match(&order, &active, |f| filters[f].evaluate(&ctx).eliminates());
                        ComboCheck {
                            combo: Some(combo),
                            in_pool: false,
                            outcome: outcome_for(state, self.catalog),
                        }
                    }
                },
                Err(err) => {
                    log::warn!("Combo check skipped for {raw:?}: {err}");
                    ComboCheck {
                        combo: None,
                        in_pool: false,
                        outcome: ComboOutcome::Invalid {
                            input: raw.to_string(),
                        },
                    }
                }
            });

        // 6. Reporting Phase
        let stats: Vec<FilterStats> = order
            .iter()
            .filter(|&&f| !(self.config.hide_zero_initial && initial_counts[f] == 0))
            .map(|&f| FilterStats {
                id: filters[f].id.clone(),
                name: filters[f].name.clone(),
                active: active[f],
                initial_count: initial_counts[f],
                dynamic_count: dynamic.counts[f],
                eval_errors: matrix.eval_errors(f),
            })
            .collect();

        let coverage = universe().coverage(&pool.boxes);

        let run = RunMetadata {
            seed: history.seed.iter().map(|d| char::from(b'0' + d)).collect(),
            straights_generated: pool.straights_generated,
            straights_in_zones: pool.straights_in_zones,
            pool_size: pool.boxes.len(),
            active_filters: active.iter().filter(|&&a| a).count(),
            survivors: survivors.len(),
            catalog_version: self.catalog.version().clone(),
        };

        log::info!(
            "seed {}: {} straights, {} in zones, {} boxes, {} survivors across {} active filters",
            run.seed,
            run.straights_generated,
            run.straights_in_zones,
            run.pool_size,
            run.survivors,
            run.active_filters
        );

        Ok(FilterReport {
            pool: pool.boxes,
            filters: stats,
            survivors,
            eliminated,
            combo_check,
            coverage,
            run,
        })
    }
}

fn outcome_for(state: CandidateState, catalog: &FilterCatalog) -> ComboOutcome {
    match state {
        CandidateState::Eliminated(f) => {
            let filter = &catalog.filters()[f];
            ComboOutcome::Eliminated {
                filter_id: filter.id.clone(),
                filter_name: filter.name.clone(),
            }
        }
        CandidateState::Survivor | CandidateState::Evaluating(_) => ComboOutcome::Survivor,
    }
}
