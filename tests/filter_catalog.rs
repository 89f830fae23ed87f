use std::io::Write;

use dc5_core::context::{Context, HistoryProfile};
use dc5_core::filters::{CatalogError, ExpressionRole, Verdict};
use dc5_core::types::{BoxKey, DrawHistory};
use dc5_core::{CompiledFilter, FilterCatalog, FilterRecord};

use tempfile::NamedTempFile;

fn sample_records() -> Vec<FilterRecord> {
    vec![
        FilterRecord::new("F1", "High sum", "combo_sum > 30"),
        FilterRecord::new("F2", "Broken syntax", "combo_sum >"),
        FilterRecord::new("F3", "Unknown name", "undefined_name > 3"),
        FilterRecord::new("F1", "Duplicate", "combo_sum < 5"),
        FilterRecord::new("  ", "No id", "True"),
        FilterRecord::new("F4", "Guarded", "True").with_applicable("seed_sum > 40"),
    ]
}

#[test]
fn bad_records_are_skipped_not_fatal() {
    let catalog = FilterCatalog::compile(&sample_records());

    let ids: Vec<&str> = catalog.filters().iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["F1", "F4"]);

    let skipped: Vec<(&str, &str)> = catalog
        .skipped()
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("F2", "Broken syntax"),
            ("F3", "Unknown name"),
            ("F1", "Duplicate"),
            ("  ", "No id"),
        ]
    );

    assert!(catalog.skipped()[1].reason.contains("undefined_name"));
    assert!(catalog.skipped()[2].reason.contains("Duplicate filter id"));
}

#[test]
fn first_record_wins_on_duplicate_ids() {
    let catalog = FilterCatalog::compile(&sample_records());

    let f1 = catalog.get("F1").unwrap();
    assert_eq!(f1.name, "High sum");
    assert_eq!(f1.elimination.source(), "combo_sum > 30");
}

#[test]
fn blank_expressions_default_to_inert_filters() {
    let record = FilterRecord {
        id: "F9".into(),
        name: "Inert".into(),
        applicable_if: Some("   ".into()),
        expression: None,
        enabled: false,
    };

    let filter = CompiledFilter::compile(&record).unwrap();
    assert_eq!(filter.applicable.source(), "True");
    assert_eq!(filter.elimination.source(), "False");
    assert!(!filter.enabled_default);

    let history = DrawHistory::parse("12345", None, None).unwrap();
    let profile = HistoryProfile::new(&history, &[], &[]);
    let ctx = Context::build(&profile, BoxKey::parse("01167").unwrap());
    assert_eq!(filter.evaluate(&ctx), Verdict::Passes);
}

#[test]
fn surrounding_quotes_and_strict_inequality_are_normalized() {
    let record = FilterRecord::new("F1", "\"Quoted\"", "\"combo_sum !== 3\"")
        .with_applicable("'seed_sum > 0'");

    let filter = CompiledFilter::compile(&record).unwrap();
    assert_eq!(filter.name, "Quoted");
    assert_eq!(filter.elimination.source(), "combo_sum != 3");
    assert_eq!(filter.applicable.source(), "seed_sum > 0");
}

#[test]
fn verdicts_distinguish_guard_and_condition() {
    let history = DrawHistory::parse("12345", None, None).unwrap();
    let profile = HistoryProfile::new(&history, &[], &[]);
    let ctx = Context::build(&profile, BoxKey::parse("01167").unwrap());

    let compile = |applicable: &str, expression: &str| {
        CompiledFilter::compile(&FilterRecord::new("F", "F", expression).with_applicable(applicable))
            .unwrap()
    };

    assert_eq!(compile("True", "combo_sum == 15").evaluate(&ctx), Verdict::Eliminates);
    assert_eq!(compile("True", "combo_sum == 16").evaluate(&ctx), Verdict::Passes);
    assert_eq!(compile("seed_sum > 40", "True").evaluate(&ctx), Verdict::NotApplicable);

    let failed = compile("combo_digits[9] == 0", "True").evaluate(&ctx);
    assert!(matches!(
        failed,
        Verdict::Failed {
            role: ExpressionRole::Applicable,
            ..
        }
    ));
    assert!(!failed.eliminates());

    let failed = compile("True", "combo_sum / 0 > 1").evaluate(&ctx);
    assert!(matches!(
        failed,
        Verdict::Failed {
            role: ExpressionRole::Elimination,
            ..
        }
    ));
    assert!(!failed.eliminates());
}

#[test]
fn catalog_loads_from_json_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"fid": "F1", "name": "High sum", "expression": "combo_sum > 30", "enabled": true}},
            {{"id": "F2", "name": "Guarded", "applicable_if": "seed_sum > 10", "expression": "combo_sum < 10"}},
            {{"id": "F3", "expression": "nope("}}
        ]"#
    )
    .unwrap();

    let catalog = FilterCatalog::from_json_reader(file.reopen().unwrap()).unwrap();

    assert_eq!(catalog.len(), 2);
    assert!(catalog.get("F1").unwrap().enabled_default);
    assert!(!catalog.get("F2").unwrap().enabled_default);
    assert_eq!(catalog.get("F2").unwrap().applicable.source(), "seed_sum > 10");
    assert_eq!(catalog.skipped().len(), 1);
    assert_eq!(catalog.skipped()[0].id, "F3");
}

#[test]
fn malformed_json_is_an_error() {
    let result = FilterCatalog::from_json_reader("[{\"id\": ".as_bytes());
    assert!(matches!(result, Err(CatalogError::Json(_))));
}

#[test]
fn version_hashes_the_compiled_content() {
    let a = FilterCatalog::compile(&sample_records());
    let b = FilterCatalog::compile(&sample_records());
    assert_eq!(a.version(), b.version());
    assert!(a.version().as_str().starts_with("sha256:"));
    assert_eq!(a.version().as_str().len(), "sha256:".len() + 64);

    let mut changed = sample_records();
    changed[0].expression = Some("combo_sum > 31".into());
    let c = FilterCatalog::compile(&changed);
    assert_ne!(a.version(), c.version());

    // Skipped records do not contribute.
    let mut only_valid = sample_records();
    only_valid.retain(|r| r.id == "F4" || r.name == "High sum");
    let d = FilterCatalog::compile(&only_valid);
    assert_eq!(a.version(), d.version());
}

#[test]
fn empty_catalog() {
    let catalog = FilterCatalog::compile(&[]);
    assert!(catalog.is_empty());
    assert!(catalog.skipped().is_empty());
    assert!(catalog.get("F1").is_none());
}

#[test]
fn pathologically_nested_expressions_are_skipped() {
    let parens = format!("{}1{} == 1", "(".repeat(10_000), ")".repeat(10_000));
    let nots = format!("{}combo_sum == 1", "not ".repeat(3_000));
    let negations = format!("{}1 == 1", "-".repeat(5_000));
    let lists = format!("{}1{}", "[".repeat(5_000), "]".repeat(5_000));
    let calls = format!("{}combo_digits{} == 1", "len(".repeat(2_000), ")".repeat(2_000));
    let ternaries = format!("{}False", "True if combo_sum > 40 else ".repeat(2_000));
    let additions = format!("combo_sum == {}1", "1 + ".repeat(10_000));

    let records = vec![
        FilterRecord::new("P", "Parens", parens),
        FilterRecord::new("N", "Nots", nots),
        FilterRecord::new("M", "Negations", negations),
        FilterRecord::new("L", "Lists", lists),
        FilterRecord::new("C", "Calls", calls).with_applicable("True"),
        FilterRecord::new("T", "Ternaries", ternaries),
        FilterRecord::new("A", "Additions", additions),
        FilterRecord::new("OK", "Still loads", "combo_sum > 30"),
    ];
    let catalog = FilterCatalog::compile(&records);

    let ids: Vec<&str> = catalog.filters().iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["OK"]);
    assert_eq!(catalog.skipped().len(), 7);
    for skipped in catalog.skipped() {
        assert!(
            skipped.reason.contains("nests deeper than 64 levels"),
            "{}: {}",
            skipped.id,
            skipped.reason
        );
    }
}

#[test]
fn long_flat_chains_and_moderate_nesting_still_compile() {
    let alternatives: Vec<String> = (0..500).map(|n| format!("combo_sum == {n}")).collect();
    let nested = format!("{}combo_sum{} > 30", "(".repeat(20), ")".repeat(20));
    let conjunction = vec!["combo_sum >= 0"; 300].join(" and ");

    let catalog = FilterCatalog::compile(&[
        FilterRecord::new("OR", "Any sum", alternatives.join(" or ")),
        FilterRecord::new("PAREN", "Nested", nested),
        FilterRecord::new("AND", "Always", conjunction),
    ]);
    assert!(catalog.skipped().is_empty(), "{:?}", catalog.skipped());

    let history = DrawHistory::parse("12345", None, None).unwrap();
    let profile = HistoryProfile::new(&history, &[], &[]);
    let ctx = Context::build(&profile, BoxKey::parse("99999").unwrap());

    assert_eq!(catalog.get("OR").unwrap().evaluate(&ctx), Verdict::Eliminates);
    assert_eq!(catalog.get("PAREN").unwrap().evaluate(&ctx), Verdict::Eliminates);
    assert_eq!(catalog.get("AND").unwrap().evaluate(&ctx), Verdict::Eliminates);
}

#[test]
fn enabled_flag_accepts_csv_style_text() {
    let json = r#"[
        {"id": "F1", "expression": "True", "enabled": "true"},
        {"id": "F2", "expression": "True", "enabled": "TRUE"},
        {"id": "F3", "expression": "True", "enabled": "false"},
        {"id": "F4", "expression": "True", "enabled": "yes"},
        {"id": "F5", "expression": "True", "enabled": 1},
        {"id": "F6", "expression": "True", "enabled": null},
        {"id": "F7", "expression": "True", "enabled": true},
        {"id": "F8", "expression": "True"}
    ]"#;

    let catalog = FilterCatalog::from_json_reader(json.as_bytes()).unwrap();
    let enabled: Vec<(&str, bool)> = catalog
        .filters()
        .iter()
        .map(|f| (f.id.as_str(), f.enabled_default))
        .collect();

    assert_eq!(
        enabled,
        vec![
            ("F1", true),
            ("F2", true),
            ("F3", false),
            ("F4", false),
            ("F5", false),
            ("F6", false),
            ("F7", true),
            ("F8", false),
        ]
    );
}
