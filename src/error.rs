use thiserror::Error;

/// Why a single provider request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("the Census API rejected the API key (HTTP {0})")]
    Unauthorized(u16),
    /// Any other non-success status, with an excerpt of the provider's explanation.
    #[error("HTTP {code}: {detail}")]
    Status { code: u16, detail: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Every way a query can fail. All of them abort the query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Unknown topic '{0}'. Run 'topics' to see available topics.")]
    UnknownTopic(String),

    #[error("Provide topic names or use --variable / -v.")]
    NoSelection,

    #[error("unsupported vintage {year}: ACS 5-year data is available for {min}..={max}")]
    UnsupportedVintage { year: i32, min: i32, max: i32 },

    #[error("Unknown county '{0}'")]
    UnknownCounty(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("fetch failed for year {year}, batch {codes}: {cause}")]
    Fetch {
        year: i32,
        codes: String,
        cause: FetchFailure,
    },

    #[error("inconsistent county sets across batches for year {year}: {detail}")]
    MergeInconsistency { year: i32, detail: String },

    #[error(
        "No Census API key found.\n\
         Run 'acs login' to save your key, or set CENSUS_API_KEY.\n\
         Get a free key at: https://api.census.gov/data/key_signup.html"
    )]
    MissingCredential,
}

pub type Result<T> = std::result::Result<T, QueryError>;
