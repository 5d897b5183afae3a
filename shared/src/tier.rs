use serde::{Deserialize, Serialize};

/// Fill for counties with no joined performance record.
pub const NO_DATA_COLOR: &str = "#cbd5e1";

/// Qualitative bucket derived from a county's 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceTier {
    Outstanding,
    Satisfactory,
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl PerformanceTier {
    pub const ALL: [PerformanceTier; 4] = [
        PerformanceTier::Outstanding,
        PerformanceTier::Satisfactory,
        PerformanceTier::Good,
        PerformanceTier::NeedsImprovement,
    ];

    /// NaN compares false against every threshold and lands in `NeedsImprovement`.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            PerformanceTier::Outstanding
        } else if score >= 75.0 {
            PerformanceTier::Satisfactory
        } else if score >= 60.0 {
            PerformanceTier::Good
        } else {
            PerformanceTier::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceTier::Outstanding => "Outstanding",
            PerformanceTier::Satisfactory => "Satisfactory",
            PerformanceTier::Good => "Good",
            PerformanceTier::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            PerformanceTier::Outstanding => "#22c55e",
            PerformanceTier::Satisfactory => "#4cd9c0",
            PerformanceTier::Good => "#fcd34d",
            PerformanceTier::NeedsImprovement => "#ef4444",
        }
    }

    pub fn legend_label(self) -> &'static str {
        match self {
            PerformanceTier::Outstanding => "Outstanding (90+)",
            PerformanceTier::Satisfactory => "Satisfactory (75-89)",
            PerformanceTier::Good => "Good (60-74)",
            PerformanceTier::NeedsImprovement => "Needs Improvement (<60)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub tier: PerformanceTier,
    pub label: &'static str,
    pub color: &'static str,
}

pub fn legend() -> Vec<LegendEntry> {
    PerformanceTier::ALL
        .into_iter()
        .map(|tier| LegendEntry {
            tier,
            label: tier.legend_label(),
            color: tier.color(),
        })
        .collect()
}
