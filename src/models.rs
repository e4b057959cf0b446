use serde::{Deserialize, Serialize};

/// How a variable's numeric value is rendered in the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    /// Whole counts (population, households, ...).
    Number,
    /// Dollar amounts, rendered like `Number`.
    Dollar,
    /// One decimal place (median age, ...).
    Decimal,
}

impl ValueFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueFormat::Number => "number",
            ValueFormat::Dollar => "dollar",
            ValueFormat::Decimal => "decimal",
        }
    }

    /// Render an already-normalized (non-suppressed) provider value.
    ///
    /// Non-numeric text passes through unchanged.
    pub fn render(&self, raw: &str) -> String {
        let Ok(num) = raw.trim().parse::<f64>() else {
            return raw.to_string();
        };
        if !num.is_finite() {
            return raw.to_string();
        }
        match self {
            ValueFormat::Decimal => format!("{:.1}", num),
            ValueFormat::Number | ValueFormat::Dollar => {
                if num.fract() == 0.0 && num.abs() < 1e15 {
                    format!("{}", num as i64)
                } else {
                    num.to_string()
                }
            }
        }
    }
}

/// One provider variable and the column label it is shown under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub code: String,
    pub label: String,
    pub format: ValueFormat,
}

impl VariableSpec {
    pub fn new(code: impl Into<String>, label: impl Into<String>, format: ValueFormat) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            format,
        }
    }

    /// A raw, uncatalogued code: its label is the code itself.
    pub fn raw(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            label: code.clone(),
            code,
            format: ValueFormat::Number,
        }
    }
}

/// Ordered, code-unique list of the columns a query fetches and emits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumnPlan {
    columns: Vec<VariableSpec>,
}

impl ResolvedColumnPlan {
    /// Build a plan, keeping the first occurrence of every code.
    pub fn from_specs(specs: impl IntoIterator<Item = VariableSpec>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let columns = specs
            .into_iter()
            .filter(|s| seen.insert(s.code.clone()))
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[VariableSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.code.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }

    /// Reverse index: code -> label, for decoding responses.
    pub fn label_for(&self, code: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.label.as_str())
    }
}

/// A county of the fixed state, identified by its 3-digit FIPS code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountyKey {
    pub fips: String,
    pub name: String,
}

impl CountyKey {
    pub fn new(fips: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            fips: fips.into(),
            name: name.into(),
        }
    }
}

/// Which counties a request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Geography {
    /// Every county in the state (`county:*`).
    AllCounties,
    /// An explicit list of county FIPS codes.
    Counties(Vec<String>),
}

impl Geography {
    pub fn to_query_param(&self) -> String {
        match self {
            Geography::AllCounties => "county:*".to_string(),
            Geography::Counties(fips) => format!("county:{}", fips.join(",")),
        }
    }
}

/// A slice of the plan's codes sized for one provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchBatch {
    pub year: i32,
    pub index: usize,
    pub codes: Vec<String>,
}

impl FetchBatch {
    /// Human-readable code range for error context, e.g. `B01001_002E..B19013_001E`.
    pub fn code_range(&self) -> String {
        match (self.codes.first(), self.codes.last()) {
            (Some(a), Some(b)) if a == b => a.clone(),
            (Some(a), Some(b)) => format!("{a}..{b}"),
            _ => String::new(),
        }
    }
}

/// One provider response row, values keyed by code. `None` means suppressed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub county: CountyKey,
    pub year: i32,
    pub values: Vec<(String, Option<String>)>,
}

/// One output row. `values` is aligned with the plan's columns; empty means suppressed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub county: CountyKey,
    /// Present only when the query spans more than one year.
    pub year: Option<i32>,
    pub values: Vec<String>,
}

impl ResultRow {
    /// Value for a column label, looked up against the plan the row was built from.
    pub fn get<'a>(&'a self, plan: &ResolvedColumnPlan, label: &str) -> Option<&'a str> {
        plan.columns()
            .iter()
            .position(|c| c.label == label)
            .and_then(|i| self.values.get(i))
            .map(|s| s.as_str())
    }
}

/// Sort instruction for the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }
}

/// Everything a caller asks for in one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    pub topics: Vec<String>,
    pub raw_codes: Vec<String>,
    pub counties: Vec<String>,
    pub years: Vec<i32>,
    pub sort: Option<SortSpec>,
}

/// The final table: plan, header and ordered rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub plan: ResolvedColumnPlan,
    pub multi_year: bool,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Column header: `Year` (multi-year only), `County`, then the plan labels.
    pub fn header(&self) -> Vec<String> {
        let mut h = Vec::with_capacity(self.plan.len() + 2);
        if self.multi_year {
            h.push("Year".to_string());
        }
        h.push("County".to_string());
        h.extend(self.plan.labels().map(str::to_string));
        h
    }

    /// Rows flattened into cells in header order.
    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(move |r| {
            let mut rec = Vec::with_capacity(r.values.len() + 2);
            if self.multi_year {
                rec.push(r.year.map(|y| y.to_string()).unwrap_or_default());
            }
            rec.push(r.county.name.clone());
            rec.extend(r.values.iter().cloned());
            rec
        })
    }
}
