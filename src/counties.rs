//! The fixed county table for Michigan (state FIPS 26) and county-name cleanup.

use crate::error::{QueryError, Result};
use crate::models::CountyKey;
use regex::Regex;
use std::sync::LazyLock;

/// State FIPS code of the fixed geography.
pub const STATE_FIPS: &str = "26";

/// `, Michigan` as the provider appends it to every county name.
static STATE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),\s*Michigan$").expect("valid regex"));
static COUNTY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+County$").expect("valid regex"));
static SAINT_ABBREV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSt\.?\s+").expect("valid regex"));

/// Normalize a county name: strip the state and `County` suffixes, spell out `Saint`.
///
/// ```
/// assert_eq!(acs_rs::counties::clean_county_name("St. Clair County, Michigan"), "Saint Clair");
/// ```
pub fn clean_county_name(name: &str) -> String {
    let name = STATE_TAIL.replace(name.trim(), "");
    let name = COUNTY_SUFFIX.replace(&name, "");
    SAINT_ABBREV.replace_all(&name, "Saint ").into_owned()
}

const MICHIGAN_COUNTIES: [(&str, &str); 83] = [
    ("001", "Alcona"),
    ("003", "Alger"),
    ("005", "Allegan"),
    ("007", "Alpena"),
    ("009", "Antrim"),
    ("011", "Arenac"),
    ("013", "Baraga"),
    ("015", "Barry"),
    ("017", "Bay"),
    ("019", "Benzie"),
    ("021", "Berrien"),
    ("023", "Branch"),
    ("025", "Calhoun"),
    ("027", "Cass"),
    ("029", "Charlevoix"),
    ("031", "Cheboygan"),
    ("033", "Chippewa"),
    ("035", "Clare"),
    ("037", "Clinton"),
    ("039", "Crawford"),
    ("041", "Delta"),
    ("043", "Dickinson"),
    ("045", "Eaton"),
    ("047", "Emmet"),
    ("049", "Genesee"),
    ("051", "Gladwin"),
    ("053", "Gogebic"),
    ("055", "Grand Traverse"),
    ("057", "Gratiot"),
    ("059", "Hillsdale"),
    ("061", "Houghton"),
    ("063", "Huron"),
    ("065", "Ingham"),
    ("067", "Ionia"),
    ("069", "Iosco"),
    ("071", "Iron"),
    ("073", "Isabella"),
    ("075", "Jackson"),
    ("077", "Kalamazoo"),
    ("079", "Kalkaska"),
    ("081", "Kent"),
    ("083", "Keweenaw"),
    ("085", "Lake"),
    ("087", "Lapeer"),
    ("089", "Leelanau"),
    ("091", "Lenawee"),
    ("093", "Livingston"),
    ("095", "Luce"),
    ("097", "Mackinac"),
    ("099", "Macomb"),
    ("101", "Manistee"),
    ("103", "Marquette"),
    ("105", "Mason"),
    ("107", "Mecosta"),
    ("109", "Menominee"),
    ("111", "Midland"),
    ("113", "Missaukee"),
    ("115", "Monroe"),
    ("117", "Montcalm"),
    ("119", "Montmorency"),
    ("121", "Muskegon"),
    ("123", "Newaygo"),
    ("125", "Oakland"),
    ("127", "Oceana"),
    ("129", "Ogemaw"),
    ("131", "Ontonagon"),
    ("133", "Osceola"),
    ("135", "Oscoda"),
    ("137", "Otsego"),
    ("139", "Ottawa"),
    ("141", "Presque Isle"),
    ("143", "Roscommon"),
    ("145", "Saginaw"),
    ("147", "Saint Clair"),
    ("149", "Saint Joseph"),
    ("151", "Sanilac"),
    ("153", "Schoolcraft"),
    ("155", "Shiawassee"),
    ("157", "Tuscola"),
    ("159", "Van Buren"),
    ("161", "Washtenaw"),
    ("163", "Wayne"),
    ("165", "Wexford"),
];

/// Immutable lookup table of the state's counties, ordered by FIPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyTable {
    counties: Vec<CountyKey>,
}

impl CountyTable {
    pub fn michigan() -> Self {
        Self {
            counties: MICHIGAN_COUNTIES
                .iter()
                .map(|&(fips, name)| CountyKey::new(fips, name))
                .collect(),
        }
    }

    pub fn all(&self) -> &[CountyKey] {
        &self.counties
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }

    pub fn by_fips(&self, fips: &str) -> Option<&CountyKey> {
        self.counties.iter().find(|c| c.fips == fips)
    }

    /// Resolve a user-supplied county name (case-insensitive, suffixes tolerated).
    pub fn resolve(&self, name: &str) -> Result<&CountyKey> {
        let wanted = clean_county_name(name).to_lowercase();
        self.counties
            .iter()
            .find(|c| c.name.to_lowercase() == wanted)
            .ok_or_else(|| QueryError::UnknownCounty(name.to_string()))
    }

    /// Resolve every name, deduplicated and returned in FIPS order.
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<CountyKey>> {
        let mut out: Vec<CountyKey> = Vec::with_capacity(names.len());
        for n in names {
            let key = self.resolve(n.as_ref())?;
            if !out.contains(key) {
                out.push(key.clone());
            }
        }
        out.sort();
        Ok(out)
    }
}

impl Default for CountyTable {
    fn default() -> Self {
        Self::michigan()
    }
}
