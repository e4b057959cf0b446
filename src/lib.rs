//! acs_rs
//!
//! A small Rust library for querying **Census ACS 5-year estimates** for the 83
//! counties of Michigan and shaping them into a CSV-ready table. Pairs with the
//! `acs` CLI.
//!
//! ### Features
//! - Curated topics (`population`, `age`, `income`, ...) or raw variable codes
//! - One or several vintages per query, merged into one table with a `Year` column
//! - Automatic batching under the API's per-request variable limit
//! - Suppressed estimates normalized to empty cells
//! - County filter and numeric-aware sorting
//! - CSV / JSON output and quick per-column statistics
//!
//! ### Example
//! ```no_run
//! use acs_rs::{QueryEngine, credentials::EnvOrFileCredentials, models::QueryRequest};
//!
//! let engine = QueryEngine::default();
//! let table = engine.run(
//!     &QueryRequest {
//!         topics: vec!["age".into()],
//!         counties: vec!["Wayne".into()],
//!         years: vec![2022],
//!         ..Default::default()
//!     },
//!     &EnvOrFileCredentials::default(),
//! )?;
//! acs_rs::storage::write_csv(&table, std::io::stdout())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod assemble;
pub mod counties;
pub mod credentials;
pub mod error;
pub mod models;
pub mod query;
pub mod resolve;
pub mod stats;
pub mod storage;
pub mod topics;

pub use api::Client;
pub use error::QueryError;
pub use models::{CountyKey, QueryRequest, ResolvedColumnPlan, ResultRow, ResultTable, SortSpec, VariableSpec};
pub use query::QueryEngine;
pub use topics::TopicRegistry;
