//! The closed catalog of topics: named groups of ACS variables.
//!
//! The registry is built once and shared read-only (`Arc<TopicRegistry>` or a
//! plain reference); nothing mutates it after construction.

use crate::error::{QueryError, Result};
use crate::models::{ValueFormat, VariableSpec};
use serde::Serialize;

/// Name of the pseudo-topic that expands to every real topic.
pub const ALL_TOPICS: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicDefinition {
    pub name: String,
    pub description: String,
    pub variables: Vec<VariableSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRegistry {
    topics: Vec<TopicDefinition>,
}

impl TopicRegistry {
    /// Build a registry from topic definitions. Later duplicates of a name are ignored.
    pub fn new(topics: Vec<TopicDefinition>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let topics = topics
            .into_iter()
            .filter(|t| t.name != ALL_TOPICS && seen.insert(t.name.clone()))
            .collect();
        Self { topics }
    }

    /// Ordered spec list for a topic, or for `all` the concatenation of every topic.
    pub fn lookup(&self, name: &str) -> Result<Vec<VariableSpec>> {
        if name == ALL_TOPICS {
            return Ok(self
                .topics
                .iter()
                .flat_map(|t| t.variables.iter().cloned())
                .collect());
        }
        self.get(name)
            .map(|t| t.variables.clone())
            .ok_or_else(|| QueryError::UnknownTopic(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&TopicDefinition> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Topic names in canonical order (excludes `all`).
    pub fn all_topics(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn topics(&self) -> &[TopicDefinition] {
        &self.topics
    }

    /// The built-in Michigan ACS 5-year catalog.
    pub fn michigan_acs() -> Self {
        use ValueFormat::{Decimal, Dollar, Number};
        let topic = |name: &str, description: &str, vars: &[(&str, &str, ValueFormat)]| {
            TopicDefinition {
                name: name.to_string(),
                description: description.to_string(),
                variables: vars
                    .iter()
                    .map(|&(code, label, fmt)| VariableSpec::new(code, label, fmt))
                    .collect(),
            }
        };

        Self::new(vec![
            topic(
                "population",
                "Total population by sex",
                &[
                    ("B01003_001E", "Total Population", Number),
                    ("B01001_002E", "Male Population", Number),
                    ("B01001_026E", "Female Population", Number),
                ],
            ),
            topic(
                "age",
                "Median age overall and by sex",
                &[
                    ("B01002_001E", "Median Age", Decimal),
                    ("B01002_002E", "Median Age Male", Decimal),
                    ("B01002_003E", "Median Age Female", Decimal),
                ],
            ),
            topic(
                "race",
                "Population by race and Hispanic origin",
                &[
                    ("B02001_002E", "White Alone", Number),
                    ("B02001_003E", "Black or African American Alone", Number),
                    ("B02001_004E", "American Indian and Alaska Native Alone", Number),
                    ("B02001_005E", "Asian Alone", Number),
                    ("B02001_008E", "Two or More Races", Number),
                    ("B03003_003E", "Hispanic or Latino", Number),
                ],
            ),
            topic(
                "income",
                "Household, family and per-capita income",
                &[
                    ("B19013_001E", "Median Household Income", Dollar),
                    ("B19113_001E", "Median Family Income", Dollar),
                    ("B19301_001E", "Per Capita Income", Dollar),
                ],
            ),
            topic(
                "poverty",
                "Poverty status in the past 12 months",
                &[
                    ("B17001_001E", "Poverty Status Universe", Number),
                    ("B17001_002E", "Below Poverty Level", Number),
                ],
            ),
            topic(
                "households",
                "Household counts, size and income",
                &[
                    ("B11001_001E", "Total Households", Number),
                    ("B25010_001E", "Average Household Size", Decimal),
                    ("B19013_001E", "Median Household Income", Dollar),
                ],
            ),
            topic(
                "housing",
                "Housing units, occupancy, tenure and costs",
                &[
                    ("B25001_001E", "Total Housing Units", Number),
                    ("B25002_002E", "Occupied Housing Units", Number),
                    ("B25002_003E", "Vacant Housing Units", Number),
                    ("B25003_002E", "Owner Occupied", Number),
                    ("B25003_003E", "Renter Occupied", Number),
                    ("B25077_001E", "Median Home Value", Dollar),
                    ("B25064_001E", "Median Gross Rent", Dollar),
                ],
            ),
            topic(
                "employment",
                "Labor force status, population 16 and over",
                &[
                    ("B23025_002E", "In Labor Force", Number),
                    ("B23025_004E", "Employed", Number),
                    ("B23025_005E", "Unemployed", Number),
                    ("B23025_007E", "Not in Labor Force", Number),
                ],
            ),
            topic(
                "education",
                "Educational attainment, population 25 and over",
                &[
                    ("B15003_001E", "Population 25 and Over", Number),
                    ("B15003_017E", "High School Diploma", Number),
                    ("B15003_022E", "Bachelor's Degree", Number),
                    ("B15003_023E", "Master's Degree", Number),
                    ("B15003_025E", "Doctorate Degree", Number),
                ],
            ),
            topic(
                "internet",
                "Household internet subscriptions",
                &[
                    ("B28002_001E", "Households (Internet Universe)", Number),
                    ("B28002_004E", "Broadband Subscription", Number),
                    ("B28002_013E", "No Internet Access", Number),
                ],
            ),
            topic(
                "veterans",
                "Veteran status, civilian population 18 and over",
                &[
                    ("B21001_001E", "Civilian Population 18 and Over", Number),
                    ("B21001_002E", "Veterans", Number),
                ],
            ),
        ])
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::michigan_acs()
    }
}
