//! In-memory stand-in for the Census API, shared by the integration tests.
#![allow(dead_code)]

use acs_rs::api::{BatchRequest, BatchSource, Client, ClientConfig};
use acs_rs::counties::CountyTable;
use acs_rs::error::FetchFailure;
use acs_rs::models::Geography;
use acs_rs::{QueryEngine, TopicRegistry};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What one recorded request asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub year: i32,
    pub geography: Geography,
    pub codes: Vec<String>,
    pub api_key: String,
}

type ValueFn = dyn Fn(&str, &str, i32) -> Value + Send + Sync;

pub struct FakeCensus {
    /// (fips, provider name) pairs served for `county:*`.
    pub counties: Vec<(String, String)>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<Recorded>>,
    /// Fail any request for this year whose codes include this code.
    pub fail_on: Option<(i32, String, FetchFailure)>,
    /// Omit county `.0` from every batch that does not request code `.1`.
    pub drop_county: Option<(String, String)>,
    values: Box<ValueFn>,
}

/// Provider-style name: `Saint Clair` -> `St. Clair County, Michigan`.
pub fn provider_name(clean: &str) -> String {
    format!("{} County, Michigan", clean.replace("Saint ", "St. "))
}

impl FakeCensus {
    /// All 83 Michigan counties; each cell is `<fips><year>` by default.
    pub fn michigan() -> Self {
        let counties = CountyTable::michigan()
            .all()
            .iter()
            .map(|c| (c.fips.clone(), provider_name(&c.name)))
            .collect();
        Self::with_counties(counties)
    }

    pub fn with_counties(counties: Vec<(String, String)>) -> Self {
        Self {
            counties,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            fail_on: None,
            drop_county: None,
            values: Box::new(|fips, _code, year| json!(format!("{fips}{year}"))),
        }
    }

    pub fn values(mut self, f: impl Fn(&str, &str, i32) -> Value + Send + Sync + 'static) -> Self {
        self.values = Box::new(f);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl BatchSource for FakeCensus {
    fn fetch_batch(&self, request: &BatchRequest<'_>) -> Result<Value, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(Recorded {
            year: request.year,
            geography: request.geography.clone(),
            codes: request.codes.to_vec(),
            api_key: request.api_key.to_string(),
        });

        if let Some((year, code, failure)) = &self.fail_on
            && *year == request.year
            && request.codes.contains(code)
        {
            return Err(failure.clone());
        }

        let mut header = vec![json!("NAME")];
        header.extend(request.codes.iter().map(|c| json!(c)));
        header.push(json!("state"));
        header.push(json!("county"));

        let mut table = vec![Value::Array(header)];
        for (fips, name) in &self.counties {
            if let Geography::Counties(wanted) = request.geography
                && !wanted.contains(fips)
            {
                continue;
            }
            if let Some((dropped, anchor)) = &self.drop_county
                && dropped == fips
                && !request.codes.contains(anchor)
            {
                continue;
            }
            let mut row = vec![json!(name)];
            row.extend(request.codes.iter().map(|c| (self.values)(fips, c, request.year)));
            row.push(json!("26"));
            row.push(json!(fips));
            table.push(Value::Array(row));
        }
        Ok(Value::Array(table))
    }
}

/// A client over the fake with sequential requests, so batch order is observable.
pub fn sequential_config(max_vars_per_request: usize) -> ClientConfig {
    ClientConfig {
        max_vars_per_request,
        max_in_flight: 1,
        ..ClientConfig::default()
    }
}

pub fn engine(source: &FakeCensus, config: ClientConfig) -> QueryEngine<&FakeCensus> {
    QueryEngine::with_client(
        Arc::new(TopicRegistry::michigan_acs()),
        Arc::new(CountyTable::michigan()),
        Client::with_source(config, source),
    )
}
