use acs_rs::models::{CountyKey, ResolvedColumnPlan, ResultRow, ResultTable, ValueFormat, VariableSpec};
use acs_rs::storage;
use acs_rs::topics::TopicRegistry;
use std::fs;

fn sample(multi_year: bool) -> ResultTable {
    let plan = ResolvedColumnPlan::from_specs([
        VariableSpec::new("B01003_001E", "Total Population", ValueFormat::Number),
        VariableSpec::new("B19013_001E", "Median Household Income", ValueFormat::Dollar),
    ]);
    let rows = [("161", "Washtenaw", 2019), ("163", "Wayne", 2024)]
        .into_iter()
        .map(|(fips, name, year)| ResultRow {
            county: CountyKey::new(fips, name),
            year: multi_year.then_some(year),
            values: vec!["1000".into(), String::new()],
        })
        .collect();
    ResultTable { plan, multi_year, rows }
}

#[test]
fn save_csv_and_json() {
    let table = sample(false);
    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("acs.csv");
    storage::save_csv(&table, &csv_path).unwrap();
    let csv_txt = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_txt.starts_with("County,Total Population,Median Household Income\n"));
    assert_eq!(csv_txt.lines().count(), 1 + table.rows.len());
    assert!(csv_txt.contains("Wayne,1000,\n"));

    let json_path = dir.path().join("acs.json");
    storage::save_json(&table, &json_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), table.rows.len());
    assert_eq!(arr[1]["County"], "Wayne");
    assert_eq!(arr[1]["Median Household Income"], "");
}

#[test]
fn multi_year_csv_leads_with_year() {
    let mut out = Vec::new();
    storage::write_csv(&sample(true), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Year,County,Total Population,Median Household Income")
    );
    assert_eq!(lines.next(), Some("2019,Washtenaw,1000,"));
}

#[test]
fn profile_is_long_form() {
    let mut out = Vec::new();
    storage::write_profile_csv(&sample(false), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "County,Field,Value");
    assert_eq!(lines[1], "Washtenaw,Total Population,1000");
    assert_eq!(lines.len(), 1 + 2 * 2);
}

#[test]
fn topics_listing_covers_every_variable() {
    let reg = TopicRegistry::michigan_acs();
    let mut out = Vec::new();
    storage::write_topics_csv(&reg, &mut out).unwrap();
    let mut rdr = csv::Reader::from_reader(out.as_slice());
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    let expected: usize = reg.topics().iter().map(|t| t.variables.len()).sum();
    assert_eq!(rows.len(), expected);
    assert!(rows.iter().any(|r| &r[2] == "B01003_001E" && &r[0] == "population"));
}

//test if the CSV file is safe and won't include executable formulas
//the CSV file can be opened in a spreadsheet where formulas would be evaluated,
//so risky cells are prefixed with a single quote
#[test]
fn csv_cells_are_prefixed_to_avoid_formulas() {
    let plan = ResolvedColumnPlan::from_specs([VariableSpec::raw("=HYPERLINK(\"http://evil\")")]);
    let table = ResultTable {
        plan,
        multi_year: false,
        rows: vec![ResultRow {
            county: CountyKey::new("000", "@foo"),
            year: None,
            values: vec!["-5".into()],
        }],
    };

    let mut out = Vec::new();
    storage::write_csv(&table, &mut out).unwrap();
    let mut rdr = csv::Reader::from_reader(out.as_slice());
    let headers = rdr.headers().unwrap().clone();
    let row = rdr.records().next().expect("one data row expected").unwrap();

    assert!(headers[1].starts_with('\''), "header not prefixed: {}", &headers[1]);
    assert!(headers[1].contains("=HYPERLINK"));
    assert_eq!(&row[0], "'@foo");
    // negative numbers are data, not formulas
    assert_eq!(&row[1], "-5");
}

#[test]
fn profile_cells_are_prefixed_to_avoid_formulas() {
    let plan = ResolvedColumnPlan::from_specs([VariableSpec::raw("B01003_001E")]);
    let table = ResultTable {
        plan,
        multi_year: false,
        rows: vec![ResultRow {
            county: CountyKey::new("163", "Wayne"),
            year: None,
            values: vec!["+cmd|' /C calc'!A0".into()],
        }],
    };

    let mut out = Vec::new();
    storage::write_profile_csv(&table, &mut out).unwrap();
    let mut rdr = csv::Reader::from_reader(out.as_slice());
    let row = rdr.records().next().expect("one profile line expected").unwrap();
    assert_eq!(&row[2], "'+cmd|' /C calc'!A0");
}
