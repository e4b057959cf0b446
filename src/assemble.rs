//! Merge batched, per-year raw rows into the final ordered table.

use crate::api::YearFetch;
use crate::error::{QueryError, Result};
use crate::models::{CountyKey, RawRow, ResolvedColumnPlan, ResultRow, ResultTable, SortSpec};
use ahash::AHashMap;
use std::cmp::Ordering;

/// A row merged across all batches of one year: county plus code -> value.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub county: CountyKey,
    pub year: i32,
    pub values: AHashMap<String, Option<String>>,
}

fn county_set(year: i32, rows: &[RawRow]) -> Result<Vec<&str>> {
    let mut fips: Vec<&str> = rows.iter().map(|r| r.county.fips.as_str()).collect();
    fips.sort_unstable();
    let before = fips.len();
    fips.dedup();
    if fips.len() != before {
        return Err(QueryError::MergeInconsistency {
            year,
            detail: "a batch returned the same county twice".into(),
        });
    }
    Ok(fips)
}

/// Merge all batches of one year on county FIPS. Rows come back in FIPS order.
///
/// Every batch must cover exactly the same counties.
pub fn merge_year(year: i32, batches: &[Vec<RawRow>]) -> Result<Vec<MergedRow>> {
    let Some((first, rest)) = batches.split_first() else {
        return Ok(Vec::new());
    };
    let expected = county_set(year, first)?;
    for (i, batch) in rest.iter().enumerate() {
        let got = county_set(year, batch)?;
        if got != expected {
            return Err(QueryError::MergeInconsistency {
                year,
                detail: format!(
                    "batch 0 returned {} counties, batch {} returned {} (sets differ)",
                    expected.len(),
                    i + 1,
                    got.len()
                ),
            });
        }
    }

    let mut merged: AHashMap<&str, MergedRow> = AHashMap::with_capacity(first.len());
    for row in batches.iter().flatten() {
        let entry = merged
            .entry(row.county.fips.as_str())
            .or_insert_with(|| MergedRow {
                county: row.county.clone(),
                year,
                values: AHashMap::new(),
            });
        for (code, value) in &row.values {
            entry.values.insert(code.clone(), value.clone());
        }
    }
    let mut out: Vec<MergedRow> = merged.into_iter().map(|(_, row)| row).collect();
    out.sort_by(|a, b| a.county.fips.cmp(&b.county.fips));
    Ok(out)
}

/// What a sort column name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    County,
    Year,
    Column(usize),
}

/// Resolve a sort column against the output header (labels, codes, `County`, `Year`).
pub fn resolve_sort_column(plan: &ResolvedColumnPlan, multi_year: bool, column: &str) -> Result<SortKey> {
    let wanted = column.trim();
    if let Some(i) = plan
        .columns()
        .iter()
        .position(|c| c.label.eq_ignore_ascii_case(wanted))
        .or_else(|| plan.columns().iter().position(|c| c.code.eq_ignore_ascii_case(wanted)))
    {
        return Ok(SortKey::Column(i));
    }
    if wanted.eq_ignore_ascii_case("County") {
        return Ok(SortKey::County);
    }
    if multi_year && wanted.eq_ignore_ascii_case("Year") {
        return Ok(SortKey::Year);
    }
    Err(QueryError::UnknownColumn(column.to_string()))
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortValue<'a> {
    Num(f64),
    Text(&'a str),
}

fn sort_value(s: &str) -> Option<SortValue<'_>> {
    if s.is_empty() {
        return None;
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(SortValue::Num(n)),
        _ => Some(SortValue::Text(s)),
    }
}

fn key_of(row: &ResultRow, key: SortKey) -> Option<SortValue<'_>> {
    match key {
        SortKey::County => Some(SortValue::Text(&row.county.name)),
        SortKey::Year => row.year.map(|y| SortValue::Num(f64::from(y))),
        SortKey::Column(i) => row.values.get(i).and_then(|v| sort_value(v)),
    }
}

/// Sort rows in place. Numbers come before text and empty values go last, in
/// either direction; ties break on (county name, year) ascending.
pub fn sort_rows(rows: &mut [ResultRow], key: SortKey, descending: bool) {
    rows.sort_by(|a, b| {
        let primary = match (key_of(a, key), key_of(b, key)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(SortValue::Num(_)), Some(SortValue::Text(_))) => Ordering::Less,
            (Some(SortValue::Text(_)), Some(SortValue::Num(_))) => Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                if descending { ord.reverse() } else { ord }
            }
        };
        primary
            .then_with(|| a.county.name.cmp(&b.county.name))
            .then_with(|| a.year.cmp(&b.year))
    });
}

/// Build the final table from every year's fetch.
///
/// `counties` restricts the output to those counties (empty = all). Rows are in
/// request-year order, then FIPS order, unless `sort` is given.
pub fn assemble(
    plan: &ResolvedColumnPlan,
    fetches: &[YearFetch],
    counties: &[CountyKey],
    sort: Option<&SortSpec>,
) -> Result<ResultTable> {
    let multi_year = fetches.len() > 1;
    let sort_key = sort
        .map(|s| resolve_sort_column(plan, multi_year, &s.column).map(|k| (k, s.descending)))
        .transpose()?;

    let mut rows = Vec::new();
    for fetch in fetches {
        for merged in merge_year(fetch.year, &fetch.batches)? {
            if !counties.is_empty() && !counties.iter().any(|c| c.fips == merged.county.fips) {
                continue;
            }
            let values = plan
                .columns()
                .iter()
                .map(|col| {
                    merged
                        .values
                        .get(&col.code)
                        .cloned()
                        .flatten()
                        .map(|v| col.format.render(&v))
                        .unwrap_or_default()
                })
                .collect();
            rows.push(ResultRow {
                county: merged.county,
                year: multi_year.then_some(fetch.year),
                values,
            });
        }
    }

    if let Some((key, descending)) = sort_key {
        sort_rows(&mut rows, key, descending);
    }

    Ok(ResultTable {
        plan: plan.clone(),
        multi_year,
        rows,
    })
}
