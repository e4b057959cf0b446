/// Synchronous client for the **Census ACS 5-year API** (`/data/{year}/acs/acs5`).
///
/// The client fetches one vintage at a time for the counties of one state and returns
/// raw per-county rows. Requested codes are split into batches because the API caps the
/// number of fields per call; every batch asks for all target counties at once.
///
/// ### Notes
/// - The API answers with a JSON array of arrays: a header row
///   (`NAME`, the requested codes, `state`, `county`) followed by one row per county.
///   Rows are decoded against the batch's own code order, never a global column order.
/// - Suppressed cells (`null` or one of the Census annotation codes such as `-666666666`)
///   are normalized to `None` here.
/// - A failing batch fails its whole year. There is no automatic retry; all provider
///   traffic goes through [`Client::fetch_batch`].
///
/// Typical usage:
/// ```no_run
/// # use acs_rs::{Client, models::{Geography, ResolvedColumnPlan, VariableSpec}};
/// let client = Client::default();
/// let plan = ResolvedColumnPlan::from_specs([VariableSpec::raw("B01003_001E")]);
/// let fetched = client.fetch_years(&plan, &[2022], &Geography::AllCounties, "my-key")?;
/// # Ok::<(), acs_rs::error::QueryError>(())
/// ```
use crate::counties::{STATE_FIPS, clean_county_name};
use crate::error::{FetchFailure, QueryError, Result};
use crate::models::{CountyKey, FetchBatch, Geography, RawRow, ResolvedColumnPlan};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::time::Duration;

/// Oldest ACS 5-year vintage the API serves.
pub const MIN_VINTAGE: i32 = 2009;
/// Newest released ACS 5-year vintage.
pub const MAX_VINTAGE: i32 = 2024;
pub const DEFAULT_YEAR: i32 = MAX_VINTAGE;

/// Census annotation values that mean "no estimate available".
pub const SUPPRESSION_SENTINELS: [f64; 6] = [
    -666_666_666.0,
    -999_999_999.0,
    -888_888_888.0,
    -555_555_555.0,
    -333_333_333.0,
    -222_222_222.0,
];

const SUPPRESSED_TEXT: [&str; 4] = ["", "null", "None", "-"];

/// Values at or below this look like annotation codes even when undocumented.
const SENTINEL_FLOOR: f64 = -100_000_000.0;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub state_fips: String,
    /// The API allows 50 fields per call; `NAME` takes one of them.
    pub max_vars_per_request: usize,
    /// Upper bound on concurrent requests in flight.
    pub max_in_flight: usize,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.census.gov/data".into(),
            state_fips: STATE_FIPS.into(),
            max_vars_per_request: 49,
            max_in_flight: 4,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// One provider call: a vintage, a geography, up to `max_vars_per_request` codes and the key.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    pub year: i32,
    pub state_fips: &'a str,
    pub geography: &'a Geography,
    pub codes: &'a [String],
    pub api_key: &'a str,
}

/// Where batch responses come from. `HttpSource` talks to the Census API;
/// tests plug in an in-memory source.
pub trait BatchSource: Sync {
    /// Return the raw JSON body (array of arrays) for one batch.
    fn fetch_batch(&self, request: &BatchRequest<'_>) -> std::result::Result<Value, FetchFailure>;
}

impl<T: BatchSource + ?Sized> BatchSource for &T {
    fn fetch_batch(&self, request: &BatchRequest<'_>) -> std::result::Result<Value, FetchFailure> {
        (**self).fetch_batch(request)
    }
}

// Allow -, _, . unescaped in codes and keys
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string()
}

/// Blocking HTTP source backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub base_url: String,
    http: HttpClient,
}

impl HttpSource {
    pub fn new(config: &ClientConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::limited(5))
            .user_agent(concat!("acs_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("reqwest client build");
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Full request URL for a batch (the key included).
    pub fn url(&self, request: &BatchRequest<'_>) -> String {
        let get = std::iter::once("NAME")
            .chain(request.codes.iter().map(String::as_str))
            .map(enc)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}/{}/acs/acs5?get={}&for={}&in={}&key={}",
            self.base_url,
            request.year,
            get,
            enc(&request.geography.to_query_param()),
            enc(&format!("state:{}", request.state_fips)),
            enc(request.api_key),
        )
    }
}

impl BatchSource for HttpSource {
    fn fetch_batch(&self, request: &BatchRequest<'_>) -> std::result::Result<Value, FetchFailure> {
        let url = self.url(request);
        let resp = self
            .http
            .get(&url)
            .send()
            .map_err(|e| FetchFailure::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchFailure::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(FetchFailure::Status {
                code: status.as_u16(),
                detail: body_excerpt(&body),
            });
        }
        resp.json::<Value>()
            .map_err(|e| FetchFailure::Malformed(format!("decode json: {}", e.without_url())))
    }
}

const EXCERPT_CHARS: usize = 200;

/// Whitespace-collapsed error body, cut to `EXCERPT_CHARS` characters.
fn body_excerpt(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return "empty response body".into();
    }
    match flat.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

/// Fail fast on a vintage the API does not serve.
pub fn check_vintage(year: i32) -> Result<()> {
    if (MIN_VINTAGE..=MAX_VINTAGE).contains(&year) {
        Ok(())
    } else {
        Err(QueryError::UnsupportedVintage {
            year,
            min: MIN_VINTAGE,
            max: MAX_VINTAGE,
        })
    }
}

/// Split the plan's codes into consecutive batches of at most `max_per_request` codes.
pub fn partition_batches(plan: &ResolvedColumnPlan, year: i32, max_per_request: usize) -> Vec<FetchBatch> {
    let codes: Vec<String> = plan.codes().map(str::to_string).collect();
    codes
        .chunks(max_per_request.max(1))
        .enumerate()
        .map(|(index, chunk)| FetchBatch {
            year,
            index,
            codes: chunk.to_vec(),
        })
        .collect()
}

/// Normalize one response cell; `None` means suppressed.
pub fn normalize_value(cell: &Value) -> Option<String> {
    let text = match cell {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    if SUPPRESSED_TEXT.contains(&text.as_str()) {
        return None;
    }
    if let Ok(num) = text.parse::<f64>() {
        if SUPPRESSION_SENTINELS.contains(&num) {
            return None;
        }
        if num <= SENTINEL_FLOOR {
            log::warn!("passing through undocumented sentinel-like value {text}");
        }
    }
    Some(text)
}

/// Decode one batch response into rows keyed by the batch's own codes.
pub fn decode_batch(batch: &FetchBatch, body: &Value) -> std::result::Result<Vec<RawRow>, FetchFailure> {
    let malformed = |msg: String| FetchFailure::Malformed(msg);

    let table = body
        .as_array()
        .ok_or_else(|| malformed("not a top-level array".into()))?;
    let (header, rows) = table
        .split_first()
        .ok_or_else(|| malformed("empty array".into()))?;
    let header: Vec<&str> = header
        .as_array()
        .ok_or_else(|| malformed("header is not an array".into()))?
        .iter()
        .map(|h| h.as_str().unwrap_or_default())
        .collect();

    // NAME, the requested codes in request order, then the geography columns.
    if header.first() != Some(&"NAME") {
        return Err(malformed("header does not start with NAME".into()));
    }
    for (i, code) in batch.codes.iter().enumerate() {
        if header.get(i + 1) != Some(&code.as_str()) {
            return Err(malformed(format!(
                "expected column {code} at position {}, found {:?}",
                i + 1,
                header.get(i + 1)
            )));
        }
    }
    let county_idx = header
        .iter()
        .skip(batch.codes.len() + 1)
        .position(|h| *h == "county")
        .map(|p| p + batch.codes.len() + 1)
        .ok_or_else(|| malformed("missing county column".into()))?;

    rows.iter()
        .map(|row| {
            let cells = row
                .as_array()
                .filter(|cells| cells.len() == header.len())
                .ok_or_else(|| malformed("row does not match header width".into()))?;
            let name = cells[0].as_str().unwrap_or_default();
            let fips = cells[county_idx]
                .as_str()
                .ok_or_else(|| malformed("county code is not a string".into()))?;
            let values = batch
                .codes
                .iter()
                .zip(&cells[1..=batch.codes.len()])
                .map(|(code, cell)| (code.clone(), normalize_value(cell)))
                .collect();
            Ok(RawRow {
                county: CountyKey::new(fips, clean_county_name(name)),
                year: batch.year,
                values,
            })
        })
        .collect()
}

/// Every batch's rows for one year, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct YearFetch {
    pub year: i32,
    pub batches: Vec<Vec<RawRow>>,
}

#[derive(Debug, Clone)]
pub struct Client<S = HttpSource> {
    config: ClientConfig,
    source: S,
}

impl Default for Client<HttpSource> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Client<HttpSource> {
    pub fn new(config: ClientConfig) -> Self {
        let source = HttpSource::new(&config);
        Self { config, source }
    }
}

impl<S: BatchSource> Client<S> {
    pub fn with_source(config: ClientConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Batches needed for one year of this plan.
    pub fn batches(&self, plan: &ResolvedColumnPlan, year: i32) -> Vec<FetchBatch> {
        partition_batches(plan, year, self.config.max_vars_per_request)
    }

    /// Issue and decode a single batch.
    pub fn fetch_batch(&self, batch: &FetchBatch, geography: &Geography, api_key: &str) -> Result<Vec<RawRow>> {
        log::debug!(
            "GET year={} batch={} codes={} geography={}",
            batch.year,
            batch.index,
            batch.code_range(),
            geography.to_query_param()
        );
        let request = BatchRequest {
            year: batch.year,
            state_fips: &self.config.state_fips,
            geography,
            codes: &batch.codes,
            api_key,
        };
        self.source
            .fetch_batch(&request)
            .and_then(|body| decode_batch(batch, &body))
            .map_err(|cause| QueryError::Fetch {
                year: batch.year,
                codes: batch.code_range(),
                cause,
            })
    }

    /// Fetch every batch of every year.
    ///
    /// Batches run concurrently, at most `max_in_flight` at a time. The first failure
    /// (in year, then batch order) aborts the whole fetch; no partial year is returned.
    pub fn fetch_years(
        &self,
        plan: &ResolvedColumnPlan,
        years: &[i32],
        geography: &Geography,
        api_key: &str,
    ) -> Result<Vec<YearFetch>> {
        if api_key.trim().is_empty() {
            return Err(QueryError::MissingCredential);
        }
        for &year in years {
            check_vintage(year)?;
        }

        let jobs: Vec<FetchBatch> = years.iter().flat_map(|&y| self.batches(plan, y)).collect();
        let mut results: Vec<Vec<RawRow>> = Vec::with_capacity(jobs.len());
        for window in jobs.chunks(self.config.max_in_flight.max(1)) {
            let outcomes: Vec<Result<Vec<RawRow>>> = std::thread::scope(|scope| {
                let handles: Vec<_> = window
                    .iter()
                    .map(|batch| scope.spawn(move || self.fetch_batch(batch, geography, api_key)))
                    .collect();
                handles
                    .into_iter()
                    .zip(window)
                    .map(|(h, batch)| {
                        h.join().unwrap_or_else(|_| {
                            Err(QueryError::Fetch {
                                year: batch.year,
                                codes: batch.code_range(),
                                cause: FetchFailure::Transport("request worker panicked".into()),
                            })
                        })
                    })
                    .collect()
            });
            for outcome in outcomes {
                results.push(outcome?);
            }
        }

        let mut rows = results.into_iter();
        let mut out = Vec::with_capacity(years.len());
        for &year in years {
            let n = self.batches(plan, year).len();
            let batches: Vec<Vec<RawRow>> = rows.by_ref().take(n).collect();
            log::info!("fetched year {year}: {n} batch(es)");
            out.push(YearFetch { year, batches });
        }
        Ok(out)
    }
}
