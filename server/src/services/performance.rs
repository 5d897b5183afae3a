use futures::future::{BoxFuture, FutureExt};
use ndc_shared::{CountyPerformanceRecord, ResolvedPerformance, Sector, candidate_years};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::services::FetchError;

/// Read side of the hosted performance table, one sector/year at a time.
pub trait PerformanceSource: Send + Sync {
    fn fetch_year(
        &self,
        sector: Sector,
        year: i32,
    ) -> BoxFuture<'_, Result<Vec<CountyPerformanceRecord>, FetchError>>;
}

/// Walk the candidate years and keep the first non-empty result.
///
/// Per-year failures count as "no data for that year"; running out of years
/// yields an empty result rather than an error.
pub async fn resolve_performance(
    source: &dyn PerformanceSource,
    sector: Sector,
    requested_year: Option<i32>,
    current_year: i32,
) -> ResolvedPerformance {
    for year in candidate_years(requested_year, current_year) {
        match source.fetch_year(sector, year).await {
            Ok(records) if !records.is_empty() => {
                info!(%sector, year, counties = records.len(), "performance data loaded");
                return ResolvedPerformance {
                    year: Some(year),
                    records,
                };
            }
            Ok(_) => debug!(%sector, year, "no performance rows"),
            Err(FetchError::NotConfigured) => {
                debug!(%sector, year, "performance source not configured");
            }
            Err(e) => warn!(error = %e, %sector, year, "performance fetch failed"),
        }
    }

    debug!(%sector, ?requested_year, "no performance data in any candidate year");
    ResolvedPerformance::default()
}

/// Row shape of the hosted summary view. Older rows carry `county_name`
/// instead of `name`, and `score` may be null. Numeric fields are read
/// leniently so one odd value costs that field, not the row.
#[derive(Debug, Deserialize)]
struct PerformanceRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    county_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_rank")]
    rank: Option<u32>,
}

impl PerformanceRow {
    fn into_record(self, sector: Sector, year: i32) -> Option<CountyPerformanceRecord> {
        let name = self
            .name
            .filter(|name| !name.is_empty())
            .or(self.county_name.filter(|name| !name.is_empty()))?;
        Some(CountyPerformanceRecord {
            name,
            score: self.score.unwrap_or(0.0),
            rank: self.rank.filter(|rank| *rank > 0),
            sector,
            year,
        })
    }
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

fn lenient_rank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let rank = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(rank
        .filter(|r| r.is_finite() && r.fract() == 0.0 && *r >= 1.0 && *r <= f64::from(u32::MAX))
        .map(|r| r as u32))
}

/// Decode rows one at a time; rows that are not objects or have no usable
/// name are dropped without failing the year.
fn decode_rows(rows: Vec<Value>, sector: Sector, year: i32) -> Vec<CountyPerformanceRecord> {
    let total = rows.len();
    let records: Vec<_> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<PerformanceRow>(row).ok())
        .filter_map(|row| row.into_record(sector, year))
        .collect();
    if records.len() < total {
        debug!(%sector, year, dropped = total - records.len(), "skipped unusable performance rows");
    }
    records
}

/// PostgREST endpoint of the hosted database, authenticated with the
/// project's anon key.
#[derive(Clone)]
pub struct RestPerformanceSource {
    client: reqwest::Client,
    base_url: Option<String>,
    anon_key: Option<String>,
    table: String,
}

impl RestPerformanceSource {
    pub fn new(
        client: reqwest::Client,
        base_url: Option<String>,
        anon_key: Option<String>,
        table: String,
    ) -> Self {
        Self {
            client,
            base_url,
            anon_key,
            table,
        }
    }

    pub fn query_url(&self, sector: Sector, year: i32) -> Result<reqwest::Url, FetchError> {
        let base = self.base_url.as_deref().ok_or(FetchError::NotConfigured)?;
        let mut url = reqwest::Url::parse(base).map_err(|_| FetchError::NotConfigured)?;
        {
            let Ok(mut segments) = url.path_segments_mut() else {
                return Err(FetchError::NotConfigured);
            };
            segments.pop_if_empty().extend(["rest", "v1", self.table.as_str()]);
        }
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("sector", &format!("eq.{sector}"))
            .append_pair("year", &format!("eq.{year}"))
            .append_pair("order", "score.desc");
        Ok(url)
    }

    async fn fetch(
        &self,
        sector: Sector,
        year: i32,
    ) -> Result<Vec<CountyPerformanceRecord>, FetchError> {
        let url = self.query_url(sector, year)?;
        let mut request = self.client.get(url);
        if let Some(key) = self.anon_key.as_deref() {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        let rows: Vec<Value> = resp.json().await?;
        Ok(decode_rows(rows, sector, year))
    }
}

impl PerformanceSource for RestPerformanceSource {
    fn fetch_year(
        &self,
        sector: Sector,
        year: i32,
    ) -> BoxFuture<'_, Result<Vec<CountyPerformanceRecord>, FetchError>> {
        self.fetch(sector, year).boxed()
    }
}
