use crate::models::ResultTable;
use serde::{Deserialize, Serialize};

/// Grouping key: one column, optionally one year of a multi-year table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub column: String,
    pub year: Option<i32>,
}

/// Summary statistics for a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub key: GroupKey,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

fn summarize(key: GroupKey, mut vals: Vec<f64>, missing: usize) -> Summary {
    vals.sort_by(|a, b| a.total_cmp(b));
    let count = vals.len();
    let min = vals.first().cloned();
    let max = vals.last().cloned();
    let mean = if count > 0 {
        Some(vals.iter().copied().sum::<f64>() / count as f64)
    } else { None };
    let median = if count == 0 {
        None
    } else if count % 2 == 1 {
        Some(vals[count / 2])
    } else {
        Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
    };
    Summary { key, count, missing, min, max, mean, median }
}

/// Compute per-column statistics (per column and year for multi-year tables).
///
/// Empty cells count as missing; non-numeric text is ignored.
pub fn column_summary(table: &ResultTable) -> Vec<Summary> {
    let mut years: Vec<Option<i32>> = Vec::new();
    for r in &table.rows {
        if !years.contains(&r.year) {
            years.push(r.year);
        }
    }

    let mut out = Vec::new();
    for (i, label) in table.plan.labels().enumerate() {
        for &year in &years {
            let mut vals = Vec::new();
            let mut missing = 0;
            for r in table.rows.iter().filter(|r| r.year == year) {
                match r.values.get(i).map(|v| v.as_str()) {
                    None | Some("") => missing += 1,
                    Some(v) => {
                        if let Ok(x) = v.parse::<f64>() {
                            vals.push(x);
                        }
                    }
                }
            }
            let key = GroupKey { column: label.to_string(), year };
            out.push(summarize(key, vals, missing));
        }
    }
    out
}
