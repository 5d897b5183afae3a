use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tier::{NO_DATA_COLOR, PerformanceTier};

/// Number of years before the current one tried when no year is requested.
pub const FALLBACK_PRIOR_YEARS: i32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    #[default]
    Water,
    Waste,
}

impl Sector {
    pub fn as_str(self) -> &'static str {
        match self {
            Sector::Water => "water",
            Sector::Waste => "waste",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sector `{0}` (expected `water` or `waste`)")]
pub struct UnknownSector(pub String);

impl FromStr for Sector {
    type Err = UnknownSector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" => Ok(Sector::Water),
            "waste" => Ok(Sector::Waste),
            _ => Err(UnknownSector(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyPerformanceRecord {
    pub name: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub sector: Sector,
    pub year: i32,
}

impl CountyPerformanceRecord {
    pub fn tier(&self) -> PerformanceTier {
        PerformanceTier::from_score(self.score)
    }
}

/// Rows found for one sector after walking the candidate years.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPerformance {
    /// Year the rows came from; `None` when no candidate year had data.
    pub year: Option<i32>,
    pub records: Vec<CountyPerformanceRecord>,
}

/// Years to query, in order. An explicit year is the only candidate;
/// otherwise the current year followed by the prior ones.
pub fn candidate_years(requested: Option<i32>, current_year: i32) -> Vec<i32> {
    match requested {
        Some(year) => vec![year],
        None => (0..=FALLBACK_PRIOR_YEARS)
            .map(|back| current_year - back)
            .collect(),
    }
}

/// Join key for county names: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Performance records keyed by normalized county name.
///
/// Iteration order is the order records were first inserted, so the
/// substring fallback in [`PerformanceLookup::find`] is deterministic for a
/// given source ordering. Re-inserting a key replaces the record in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceLookup {
    keys: Vec<String>,
    records: HashMap<String, CountyPerformanceRecord>,
}

impl PerformanceLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: CountyPerformanceRecord) {
        let key = normalize_name(&record.name);
        if key.is_empty() {
            return;
        }
        if self.records.insert(key.clone(), record).is_none() {
            self.keys.push(key);
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountyPerformanceRecord> {
        self.keys.iter().filter_map(|key| self.records.get(key))
    }

    /// Exact normalized match, else the first key (in insertion order) that
    /// contains the normalized name or is contained by it.
    pub fn find(&self, name: &str) -> Option<&CountyPerformanceRecord> {
        let normalized = normalize_name(name);
        if let Some(record) = self.records.get(&normalized) {
            return Some(record);
        }
        self.keys
            .iter()
            .find(|key| key.contains(normalized.as_str()) || normalized.contains(key.as_str()))
            .and_then(|key| self.records.get(key))
    }

    pub fn tier_for(&self, name: &str) -> Option<PerformanceTier> {
        self.find(name).map(CountyPerformanceRecord::tier)
    }

    pub fn fill_color(&self, name: &str) -> &'static str {
        self.tier_for(name)
            .map(PerformanceTier::color)
            .unwrap_or(NO_DATA_COLOR)
    }
}

impl FromIterator<CountyPerformanceRecord> for PerformanceLookup {
    fn from_iter<T: IntoIterator<Item = CountyPerformanceRecord>>(iter: T) -> Self {
        let mut lookup = Self::new();
        for record in iter {
            lookup.insert(record);
        }
        lookup
    }
}
