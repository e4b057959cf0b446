//! The query engine: validate everything up front, then fetch, then assemble.
//!
//! Validation errors (unknown topic, county, column or vintage, empty selection,
//! missing key) are raised before any request goes out.

use crate::api::{BatchSource, Client, ClientConfig, DEFAULT_YEAR, HttpSource, check_vintage};
use crate::assemble::{assemble, resolve_sort_column};
use crate::counties::CountyTable;
use crate::credentials::CredentialProvider;
use crate::error::{QueryError, Result};
use crate::models::{CountyKey, Geography, QueryRequest, ResolvedColumnPlan, ResultTable, SortSpec};
use crate::resolve::resolve_variables;
use crate::topics::TopicRegistry;
use std::sync::Arc;

/// A fully validated query, ready to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub columns: ResolvedColumnPlan,
    /// Distinct years in request order.
    pub years: Vec<i32>,
    /// Requested counties in FIPS order; empty means every county.
    pub counties: Vec<CountyKey>,
    pub sort: Option<SortSpec>,
}

impl QueryPlan {
    pub fn multi_year(&self) -> bool {
        self.years.len() > 1
    }

    pub fn geography(&self) -> Geography {
        if self.counties.is_empty() {
            Geography::AllCounties
        } else {
            Geography::Counties(self.counties.iter().map(|c| c.fips.clone()).collect())
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryEngine<S = HttpSource> {
    registry: Arc<TopicRegistry>,
    counties: Arc<CountyTable>,
    client: Client<S>,
}

impl Default for QueryEngine<HttpSource> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl QueryEngine<HttpSource> {
    /// Engine over the built-in catalog and the live Census API.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(
            Arc::new(TopicRegistry::michigan_acs()),
            Arc::new(CountyTable::michigan()),
            Client::new(config),
        )
    }
}

impl<S: BatchSource> QueryEngine<S> {
    pub fn with_client(registry: Arc<TopicRegistry>, counties: Arc<CountyTable>, client: Client<S>) -> Self {
        Self {
            registry,
            counties,
            client,
        }
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    pub fn counties(&self) -> &CountyTable {
        &self.counties
    }

    pub fn client(&self) -> &Client<S> {
        &self.client
    }

    /// Validate a request without touching the network.
    pub fn plan(&self, request: &QueryRequest) -> Result<QueryPlan> {
        let columns = resolve_variables(&self.registry, &request.topics, &request.raw_codes)?;
        let counties = self.counties.resolve_all(&request.counties)?;

        let mut years: Vec<i32> = Vec::with_capacity(request.years.len().max(1));
        for &y in &request.years {
            if !years.contains(&y) {
                years.push(y);
            }
        }
        if years.is_empty() {
            years.push(DEFAULT_YEAR);
        }
        for &y in &years {
            check_vintage(y)?;
        }

        if let Some(sort) = &request.sort {
            resolve_sort_column(&columns, years.len() > 1, &sort.column)?;
        }

        Ok(QueryPlan {
            columns,
            years,
            counties,
            sort: request.sort.clone(),
        })
    }

    /// Run a query end to end. Either the whole table or a single error comes back.
    pub fn run(&self, request: &QueryRequest, credentials: &dyn CredentialProvider) -> Result<ResultTable> {
        let plan = self.plan(request)?;
        let api_key = credentials.api_key().ok_or(QueryError::MissingCredential)?;
        self.execute(&plan, &api_key)
    }

    /// Fetch and assemble an already validated plan.
    pub fn execute(&self, plan: &QueryPlan, api_key: &str) -> Result<ResultTable> {
        let fetches = self
            .client
            .fetch_years(&plan.columns, &plan.years, &plan.geography(), api_key)?;
        assemble(&plan.columns, &fetches, &plan.counties, plan.sort.as_ref())
    }
}
