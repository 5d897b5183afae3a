use serde::Serialize;

use crate::performance::CountyPerformanceRecord;
use crate::tier::PerformanceTier;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCounty {
    pub rank: u32,
    pub name: String,
    pub slug: String,
    pub score: f64,
    pub tier: PerformanceTier,
}

/// URL slug for a county page: lower-cased, whitespace runs become `-`,
/// anything outside `[a-z0-9-]` is dropped so the slug stays one path segment.
pub fn county_slug(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            word.to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// League table for one sector. Counties without a positive score are left
/// out; ties keep source order.
pub fn rank_counties<'a>(
    records: impl IntoIterator<Item = &'a CountyPerformanceRecord>,
) -> Vec<RankedCounty> {
    let mut scored: Vec<&CountyPerformanceRecord> = records
        .into_iter()
        .filter(|record| record.score.is_finite() && record.score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    scored
        .into_iter()
        .zip(1u32..)
        .map(|(record, rank)| RankedCounty {
            rank,
            name: record.name.clone(),
            slug: county_slug(&record.name),
            score: record.score,
            tier: record.tier(),
        })
        .collect()
}
