use dc5_core::types::{
    parse_digit_list, parse_pairs, ComboCheck, ComboOutcome, DrawHistory, FilterId, PairGroup,
    PairGroupLabel,
};
use dc5_core::{
    EngineConfig, FilterCatalog, FilterEngine, FilterReport, FilterRequest, FilterSelection,
    ValidationError,
};

fn run(request: &FilterRequest) -> Result<FilterReport, ValidationError> {
    let catalog = FilterCatalog::compile(&[]);
    FilterEngine::new(&catalog, EngineConfig::v0()).run(request)
}

#[test]
fn seed_must_be_exactly_five_digits() {
    for bad in ["1234", "123456", "12a45", "", "12 45"] {
        let request = FilterRequest::new(bad, ["01"], ["67"]);
        assert_eq!(
            run(&request),
            Err(ValidationError::InvalidSeed(bad.to_string())),
            "{bad:?}"
        );
    }

    let padded = FilterRequest::new(" 12345 ", ["01"], ["67"]);
    assert!(run(&padded).is_ok());
}

#[test]
fn a_pair_group_with_no_valid_tokens_is_rejected() {
    let request = FilterRequest::new("12345", ["1", "abc", "123"], ["67"]);
    assert_eq!(
        run(&request),
        Err(ValidationError::EmptyPairGroup {
            group: PairGroupLabel::A
        })
    );

    let request = FilterRequest::new("12345", ["01"], Vec::<String>::new());
    assert_eq!(
        run(&request),
        Err(ValidationError::EmptyPairGroup {
            group: PairGroupLabel::B
        })
    );
}

#[test]
fn malformed_check_combo_is_reported_without_halting_the_run() {
    let mut request = FilterRequest::new("12345", ["01"], ["67"]);
    let baseline = run(&request).unwrap();

    for bad in ["12", "1234a", "123456"] {
        request.check_combo = Some(format!(" {bad} "));
        let report = run(&request).unwrap();

        assert_eq!(report.pool, baseline.pool);
        assert_eq!(report.survivors, baseline.survivors);
        assert_eq!(
            report.combo_check,
            Some(ComboCheck {
                combo: None,
                in_pool: false,
                outcome: ComboOutcome::Invalid { input: bad.into() },
            })
        );
    }

    request.check_combo = Some("12".into());
    let json = serde_json::to_value(run(&request).unwrap().combo_check).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "in_pool": false, "outcome": { "status": "invalid", "input": "12" } })
    );

    request.check_combo = Some("   ".into());
    assert_eq!(run(&request).unwrap().combo_check, None);
}

#[test]
fn malformed_and_repeated_pair_tokens_are_dropped() {
    let group = PairGroup::from_tokens(PairGroupLabel::A, &["01", " 27 ", "x1", "01", "5", "27"], 20)
        .unwrap();

    assert_eq!(group.pairs().to_vec(), vec![[0u8, 1], [2, 7]]);
    assert_eq!(group.len(), 2);
}

#[test]
fn pair_groups_are_truncated_to_the_configured_maximum() {
    let tokens: Vec<String> = (10..35).map(|n| n.to_string()).collect();
    let group = PairGroup::from_tokens(PairGroupLabel::B, &tokens, 20).unwrap();

    assert_eq!(group.len(), 20);
    assert_eq!(group.pairs()[0], [1u8, 0]);
    assert_eq!(group.pairs()[19], [2u8, 9]);
}

#[test]
fn history_parsing() {
    let history = DrawHistory::parse("01234", Some("5 6 7 8 9"), None).unwrap();

    assert_eq!(history.seed, [0, 1, 2, 3, 4]);
    assert_eq!(history.prev, vec![5, 6, 7, 8, 9]);
    assert!(history.prev_prev.is_empty());
}

#[test]
fn raw_list_helpers() {
    assert_eq!(parse_pairs("01, 27,5, 567,ab,56"), vec!["01", "27", "56"]);
    assert_eq!(parse_digit_list("1, 2, x, 10, 9,"), vec![1, 2, 9]);
    assert!(parse_pairs("").is_empty());
}

#[test]
fn selection_defaults() {
    let all = FilterSelection::default();
    let id = FilterId::new("F1");

    assert!(all.is_active(&id, true));
    assert!(!all.is_active(&id, false));

    let mut picked = FilterSelection::none();
    assert!(!picked.is_active(&id, true));
    picked.set("F1", true);
    assert!(picked.is_active(&id, false));

    let only = FilterSelection::only(["F2"]);
    assert!(!only.is_active(&id, true));
}

#[test]
fn request_deserializes_with_optional_fields_defaulted() {
    let request: FilterRequest = serde_json::from_str(
        r#"{ "seed": "12345", "pair_group_a": ["01"], "pair_group_b": ["67"] }"#,
    )
    .unwrap();

    assert_eq!(request, FilterRequest::new("12345", ["01"], ["67"]));
    assert!(request.selection.select_all);
}
