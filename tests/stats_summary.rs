use acs_rs::models::{CountyKey, ResolvedColumnPlan, ResultRow, ResultTable, VariableSpec};
use acs_rs::stats::{GroupKey, column_summary};

fn row(fips: &str, year: Option<i32>, v: &str) -> ResultRow {
    ResultRow {
        county: CountyKey::new(fips, fips),
        year,
        values: vec![v.into()],
    }
}

#[test]
fn column_stats_handle_missing_and_median_even_odd() {
    // 2019: [1,2,3,4] -> median 2.5
    // 2024: [10, missing, 30] -> missing = 1, median 20
    let table = ResultTable {
        plan: ResolvedColumnPlan::from_specs([VariableSpec::raw("IND1")]),
        multi_year: true,
        rows: vec![
            row("001", Some(2019), "1"),
            row("003", Some(2019), "2"),
            row("005", Some(2019), "3"),
            row("007", Some(2019), "4"),
            row("001", Some(2024), "10"),
            row("003", Some(2024), ""),
            row("005", Some(2024), "30"),
        ],
    };
    let got = column_summary(&table);
    assert_eq!(got.len(), 2);

    let a = &got[0];
    assert_eq!(
        a.key,
        GroupKey {
            column: "IND1".into(),
            year: Some(2019)
        }
    );
    assert_eq!(a.count, 4);
    assert_eq!(a.missing, 0);
    assert_eq!(a.min, Some(1.0));
    assert_eq!(a.max, Some(4.0));
    assert!((a.mean.unwrap() - 2.5).abs() < 1e-9);
    assert!((a.median.unwrap() - 2.5).abs() < 1e-9);

    let b = &got[1];
    assert_eq!(b.key.year, Some(2024));
    assert_eq!(b.count, 2);
    assert_eq!(b.missing, 1);
    assert!((b.median.unwrap() - 20.0).abs() < 1e-9);
}

#[test]
fn all_missing_column_has_no_values() {
    let table = ResultTable {
        plan: ResolvedColumnPlan::from_specs([VariableSpec::raw("IND1")]),
        multi_year: false,
        rows: vec![row("001", None, ""), row("003", None, "")],
    };
    let got = column_summary(&table);
    assert_eq!(got[0].count, 0);
    assert_eq!(got[0].missing, 2);
    assert_eq!(got[0].mean, None);
    assert_eq!(got[0].median, None);
}
