use price_delta::{
    data::RawTable,
    error::PriceDeltaError,
    resolve::{
        ColumnRole, MatchRule, PositionalFallback, ResolvedBy, RoleRules, RuleSet, TableSide,
        resolve, resolve_pair, resolve_role, resolve_table,
    },
};

fn repeat(value: &'static str, times: usize) -> Vec<&'static str> {
    vec![value; times]
}

#[test]
fn header_matching_ignores_accents_and_case() {
    let table = RawTable::from_text_columns(&[
        ("κωδικός", &["A1"]),
        ("Νέα χονδρική τιμή", &["1,00"]),
    ]);
    let identifier = resolve_role(&table, TableSide::New, ColumnRole::Identifier, &RuleSet::default())
        .expect("identifier");
    assert_eq!(identifier.label, "κωδικός");
    assert_eq!(identifier.resolved_by, ResolvedBy::Header { rule: 3 });

    let price = resolve_role(&table, TableSide::New, ColumnRole::NewPrice, &RuleSet::default())
        .expect("price");
    assert_eq!(price.index, 1);
}

#[test]
fn forbidden_keyword_excludes_retail_column() {
    let table = RawTable::from_text_columns(&[
        ("Barcode", &["2800001"]),
        ("Λιανική Τιμή", &["12,00"]),
        ("Χονδρική Τιμή", &["10,00"]),
    ]);
    let price = resolve_role(&table, TableSide::Old, ColumnRole::OldPrice, &RuleSet::default())
        .expect("wholesale price");
    assert_eq!(price.label, "Χονδρική Τιμή");
}

#[test]
fn new_list_with_ean_and_suggested_wholesale() {
    let table = RawTable::from_text_columns(&[
        ("Περιγραφή", &["Depon"]),
        ("EAN", &["5201234"]),
        ("Λιανική", &["14,00"]),
        ("Προτεινόμενη Χονδρική", &["12,00"]),
    ]);
    let resolved = resolve_table(&table, TableSide::New, &RuleSet::default()).expect("resolved");
    assert_eq!(resolved.identifier.label, "EAN");
    assert_eq!(resolved.price.label, "Προτεινόμενη Χονδρική");
    assert_eq!(resolved.name.as_ref().map(|c| c.index), Some(0));
    assert!(resolved.active_substance.is_none());
    assert_eq!(
        resolved.get(ColumnRole::NewPrice).map(|c| c.index),
        Some(3)
    );
    assert!(resolved.get(ColumnRole::OldPrice).is_none());
}

#[test]
fn sampling_needs_a_strict_majority_of_prefixed_values() {
    let mut majority = repeat("2800100", 11);
    majority.extend(repeat("9990000", 9));
    let table = RawTable::from_text_columns(&[
        ("Είδος", &["x"; 20]),
        ("Κ.", majority.as_slice()),
    ]);
    let column = resolve_role(&table, TableSide::New, ColumnRole::Identifier, &RuleSet::default())
        .expect("sampled identifier");
    assert_eq!(column.index, 1);
    assert_eq!(
        column.resolved_by,
        ResolvedBy::Sampled {
            rule: 2,
            hits: 11,
            sampled: 20
        }
    );

    let mut half = repeat("2800100", 10);
    half.extend(repeat("9990000", 10));
    let table = RawTable::from_text_columns(&[("Είδος", &["x"; 20]), ("Κ.", half.as_slice())]);
    let column = resolve_role(&table, TableSide::New, ColumnRole::Identifier, &RuleSet::default())
        .expect("positional identifier");
    assert_eq!(column.index, 0);
    assert_eq!(
        column.resolved_by,
        ResolvedBy::Positional(PositionalFallback::First)
    );
}

#[test]
fn sampling_skips_empty_cells_and_reads_numeric_cells() {
    let table = RawTable::from_text_columns(&[("Κ.", &["", " ", "2800001.0", "2800002", "123"])]);
    let rules = RoleRules::new(vec![MatchRule::sampled("280")], PositionalFallback::None);
    let column = resolve(&table, &rules).expect("sampled");
    assert_eq!(
        column.resolved_by,
        ResolvedBy::Sampled {
            rule: 0,
            hits: 2,
            sampled: 3
        }
    );
}

#[test]
fn positional_fallback_does_not_pick_a_forbidden_column() {
    let rules = RoleRules::new(
        vec![MatchRule::header(&["CODE"], &["RETAIL"])],
        PositionalFallback::First,
    );
    let table = RawTable::from_text_columns(&[("Retail", &["1"]), ("Item", &["2"])]);
    assert!(resolve(&table, &rules).is_none());
}

#[test]
fn missing_price_column_names_role_and_side() {
    let old = RawTable::from_text_columns(&[
        ("Barcode", &["2800001"]),
        ("Λιανική Τιμή", &["12,00"]),
    ]);
    let new = RawTable::from_text_columns(&[
        ("Barcode", &["2800001"]),
        ("Χονδρική", &["10,00"]),
    ]);
    let err = resolve_pair(&old, &new, &RuleSet::default()).expect_err("old price is missing");
    match &err {
        PriceDeltaError::MissingColumn { side, role, .. } => {
            assert_eq!(*side, TableSide::Old);
            assert_eq!(*role, ColumnRole::OldPrice);
        }
        other => panic!("unexpected error {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("old price list"), "{message}");
    assert!(message.contains("old wholesale price"), "{message}");
}

#[test]
fn identifier_fallback_never_reuses_the_price_column() {
    let old = RawTable::from_text_columns(&[
        ("Χονδρική Τιμή", &["10,00", "5,00"]),
        ("Είδος", &["Depon", "Ponstan"]),
    ]);
    let err = resolve_table(&old, TableSide::Old, &RuleSet::default())
        .expect_err("identifier would be the price column");
    match err {
        PriceDeltaError::MissingColumn { side, role, .. } => {
            assert_eq!(side, TableSide::Old);
            assert_eq!(role, ColumnRole::Identifier);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn empty_table_is_reported_before_column_lookup() {
    let empty = RawTable::from_rows(Vec::new(), Vec::new());
    let err = resolve_table(&empty, TableSide::New, &RuleSet::default()).expect_err("empty");
    assert_eq!(
        err,
        PriceDeltaError::EmptyTable {
            side: TableSide::New
        }
    );
}
