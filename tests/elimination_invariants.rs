use std::collections::BTreeSet;

use dc5_core::context::{Context, HistoryProfile};
use dc5_core::engine::{
    display_order, dynamic_counts, first_match, survivorship, CandidateState, EvaluationMatrix,
};
use dc5_core::types::{DrawHistory, FilterStats};
use dc5_core::{
    BoxKey, EngineConfig, FilterCatalog, FilterEngine, FilterRecord, FilterReport, FilterRequest,
    FilterSelection,
};

fn records() -> Vec<FilterRecord> {
    vec![
        FilterRecord::new("F_high", "High sum", "combo_sum > 20"),
        FilterRecord::new("F_hot", "Two hot digits", "len(set(combo_digits) & set(hot_digits)) >= 2"),
        FilterRecord::new("F_dup", "Repeated digit", "len(set(combo_digits)) < 5"),
        FilterRecord::new("F_never", "Impossible sum", "combo_sum > 100"),
        FilterRecord::new("F_err", "Always fails", "combo_digits[combo_sum] == 1"),
        FilterRecord::new("F_guard", "Never applicable", "True").with_applicable("seed_sum > 100"),
        FilterRecord::new("F_off", "Disabled", "combo_sum > 0").enabled(false),
    ]
}

fn request() -> FilterRequest {
    let mut request = FilterRequest::new("12345", ["01", "23"], ["45", "67"]);
    request.hot_digits = vec![1, 2];
    request
}

fn config() -> EngineConfig {
    EngineConfig {
        hide_zero_initial: false,
        ..EngineConfig::v0()
    }
}

fn run(catalog: &FilterCatalog, request: &FilterRequest) -> FilterReport {
    FilterEngine::new(catalog, config()).run(request).unwrap()
}

fn stats<'r>(report: &'r FilterReport, id: &str) -> &'r FilterStats {
    report.filters.iter().find(|f| f.id.as_str() == id).unwrap()
}

#[test]
fn survivors_and_eliminated_partition_the_pool() {
    let catalog = FilterCatalog::compile(&records());
    let report = run(&catalog, &request());

    assert!(!report.pool.is_empty());
    assert_eq!(report.survivors.len() + report.eliminated.len(), report.pool.len());

    let survivors: BTreeSet<BoxKey> = report.survivors.iter().copied().collect();
    let eliminated: BTreeSet<BoxKey> = report.eliminated.iter().map(|e| e.combo).collect();
    assert!(survivors.is_disjoint(&eliminated));

    let all: BTreeSet<BoxKey> = survivors.union(&eliminated).copied().collect();
    let pool: BTreeSet<BoxKey> = report.pool.iter().copied().collect();
    assert_eq!(all, pool);

    assert!(report.survivors.windows(2).all(|w| w[0] < w[1]));
    assert!(report.eliminated.windows(2).all(|w| w[0].combo < w[1].combo));
    assert_eq!(report.run.survivors, report.survivors.len());
    assert_eq!(report.run.pool_size, report.pool.len());
}

#[test]
fn dynamic_counts_never_exceed_initial_counts() {
    let catalog = FilterCatalog::compile(&records());
    let report = run(&catalog, &request());

    for f in &report.filters {
        assert!(f.dynamic_count <= f.initial_count, "{}", f.id);
    }

    let total: usize = report.filters.iter().map(|f| f.dynamic_count).sum();
    assert_eq!(total, report.eliminated.len());

    let first_active = report.filters.iter().find(|f| f.active).unwrap();
    assert_eq!(first_active.dynamic_count, first_active.initial_count);
}

#[test]
fn display_order_puts_zero_impact_filters_last() {
    let catalog = FilterCatalog::compile(&records());
    let report = run(&catalog, &request());

    assert_eq!(report.filters.len(), catalog.len());
    for pair in report.filters.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.initial_count == 0 {
            assert_eq!(b.initial_count, 0);
        } else if b.initial_count > 0 {
            assert!(a.initial_count >= b.initial_count);
        }
    }

    let zero: Vec<&str> = report
        .filters
        .iter()
        .filter(|f| f.initial_count == 0)
        .map(|f| f.id.as_str())
        .collect();
    assert_eq!(zero, vec!["F_never", "F_err", "F_guard"]);
}

#[test]
fn every_elimination_names_the_first_matching_active_filter() {
    let catalog = FilterCatalog::compile(&records());
    let request = request();
    let report = run(&catalog, &request);

    let history = DrawHistory::parse(&request.seed, None, None).unwrap();
    let profile = HistoryProfile::new(&history, &request.hot_digits, &request.cold_digits);
    let active: Vec<&str> = report
        .filters
        .iter()
        .filter(|f| f.active)
        .map(|f| f.id.as_str())
        .collect();

    let eliminates = |id: &str, key: BoxKey| {
        catalog
            .get(id)
            .unwrap()
            .evaluate(&Context::build(&profile, key))
            .eliminates()
    };

    for e in &report.eliminated {
        let first = active.iter().find(|id| eliminates(**id, e.combo)).unwrap();
        assert_eq!(e.filter_id.as_str(), *first, "{}", e.combo);
        assert_eq!(e.filter_name, catalog.get(first).unwrap().name);
    }

    for s in &report.survivors {
        assert!(active.iter().all(|id| !eliminates(*id, *s)), "{s} should be eliminated");
    }
}

#[test]
fn runtime_errors_are_counted_and_never_eliminate() {
    let catalog = FilterCatalog::compile(&records());
    let report = run(&catalog, &request());

    let err = stats(&report, "F_err");
    assert_eq!(err.eval_errors, report.pool.len());
    assert_eq!(err.initial_count, 0);
    assert_eq!(err.dynamic_count, 0);

    assert_eq!(stats(&report, "F_high").eval_errors, 0);
    assert!(report.eliminated.iter().all(|e| e.filter_id.as_str() != "F_err"));
}

#[test]
fn inapplicable_filters_eliminate_nothing() {
    let catalog = FilterCatalog::compile(&records());
    let report = run(&catalog, &request());

    let guard = stats(&report, "F_guard");
    assert_eq!(guard.initial_count, 0);
    assert_eq!(guard.eval_errors, 0);
}

#[test]
fn inactive_filters_get_initial_counts_but_remove_nothing() {
    let catalog = FilterCatalog::compile(&records());
    let report = run(&catalog, &request());

    let off = stats(&report, "F_off");
    assert!(!off.active);
    assert_eq!(off.initial_count, report.pool.len());
    assert_eq!(off.dynamic_count, 0);
    assert_eq!(report.filters[0].id.as_str(), "F_off");
    assert!(report.eliminated.iter().all(|e| e.filter_id.as_str() != "F_off"));
    assert_eq!(report.run.active_filters, 6);
}

#[test]
fn explicit_overrides_win_over_defaults() {
    let catalog = FilterCatalog::compile(&records());

    let mut request = request();
    request.selection.set("F_off", true);
    let report = run(&catalog, &request);

    assert!(report.survivors.is_empty());
    assert_eq!(stats(&report, "F_off").dynamic_count, report.pool.len());
    assert_eq!(stats(&report, "F_high").dynamic_count, 0);

    let mut request = self::request();
    request.selection = FilterSelection::only(["F_high"]);
    let report = run(&catalog, &request);

    assert_eq!(report.run.active_filters, 1);
    assert!(report.survivors.iter().all(|s| s.digit_sum() <= 20));
    assert!(report.eliminated.iter().all(|e| e.combo.digit_sum() > 20));
}

#[test]
fn no_active_filters_keeps_the_whole_pool() {
    let catalog = FilterCatalog::compile(&records());

    let mut request = request();
    request.selection = FilterSelection::none();
    let report = run(&catalog, &request);

    assert_eq!(report.survivors, report.pool);
    assert!(report.eliminated.is_empty());
    assert!(report.filters.iter().all(|f| !f.active && f.dynamic_count == 0));
    // Initial counts are still reported for every filter.
    assert!(stats(&report, "F_high").initial_count > 0);
}

#[test]
fn a_malformed_filter_does_not_disturb_the_others() {
    let clean = FilterCatalog::compile(&records());

    let mut with_bad = records();
    with_bad.insert(2, FilterRecord::new("F_bad", "Broken", "combo_sum >>> 3"));
    with_bad.insert(0, FilterRecord::new("F_undef", "Undefined", "undefined_name > 3"));
    let noisy = FilterCatalog::compile(&with_bad);

    assert_eq!(noisy.skipped().len(), 2);
    assert_eq!(run(&clean, &request()), run(&noisy, &request()));
}

#[test]
fn hidden_zero_impact_filters_are_left_out_of_the_report() {
    let catalog = FilterCatalog::compile(&records());
    let report = FilterEngine::new(&catalog, EngineConfig::v0())
        .run(&request())
        .unwrap();

    let ids: BTreeSet<&str> = report.filters.iter().map(|f| f.id.as_str()).collect();
    assert!(!ids.contains("F_never"));
    assert!(!ids.contains("F_err"));
    assert!(!ids.contains("F_guard"));
    assert!(ids.contains("F_high"));

    // Hiding only affects the listing.
    assert_eq!(report.survivors, run(&catalog, &request()).survivors);
}

#[test]
fn sequential_pass_agrees_with_first_match_survivorship() {
    let catalog = FilterCatalog::compile(&records());
    let history = DrawHistory::parse("12345", None, None).unwrap();
    let profile = HistoryProfile::new(&history, &[1, 2], &[]);

    let boxes: Vec<BoxKey> = ["01245", "01267", "12345", "23456", "34567", "56789"]
        .iter()
        .map(|s| BoxKey::parse(s).unwrap())
        .collect();
    let contexts: Vec<Context<'_>> = boxes.iter().map(|&b| Context::build(&profile, b)).collect();

    let matrix = EvaluationMatrix::evaluate(catalog.filters(), &contexts);
    let order = display_order(&matrix.initial_counts());
    let active: Vec<bool> = catalog.filters().iter().map(|f| f.enabled_default).collect();

    let states = survivorship(&matrix, &order, &active, contexts.len());
    let pass = dynamic_counts(&matrix, &order, &active, contexts.len());

    let survivors: Vec<usize> = states
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == CandidateState::Survivor)
        .map(|(c, _)| c)
        .collect();
    assert_eq!(survivors, pass.remaining);

    for (f, count) in pass.counts.iter().enumerate() {
        let by_state = states
            .iter()
            .filter(|s| **s == CandidateState::Eliminated(f))
            .count();
        assert_eq!(*count, by_state);
    }
}

#[test]
fn first_match_walks_the_order_until_an_active_hit() {
    let order = [2, 0, 1];
    let active = [false, true, true];

    assert_eq!(first_match(&order, &active, |f| f == 1), CandidateState::Eliminated(1));
    assert_eq!(first_match(&order, &active, |f| f == 0), CandidateState::Survivor);
    assert_eq!(first_match(&order, &active, |_| true), CandidateState::Eliminated(2));
    assert_eq!(first_match(&[], &[], |_| true), CandidateState::Survivor);
}

#[test]
fn display_order_ties_keep_catalog_order() {
    assert_eq!(display_order(&[3, 0, 5, 3, 0, 1]), vec![2, 0, 3, 5, 1, 4]);
    assert!(display_order(&[]).is_empty());
}
