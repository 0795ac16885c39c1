#![deny(warnings)]

//! Debrief scoring: composite score, letter grade and recommendations.
//!
//! The composite score is the weighted sum of four indicators normalized to
//! [0, 100]. Market share, satisfaction and awareness are already on that
//! scale; revenue is scored against a target expressed as a multiple of the
//! campaign's total budget.

use mix_core::{clamp_percent, Kpis};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Errors produced by scoring configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    /// Weights must be non-negative and sum to 1.
    #[error("score weights must be >= 0 and sum to 1, got {0}")]
    InvalidWeights(f64),
    /// Grade band thresholds must be strictly descending.
    #[error("grade bands must be strictly descending")]
    UnorderedBands,
    /// Revenue target must be strictly positive.
    #[error("revenue target must be > 0")]
    NonPositiveTarget,
}

/// Letter grade awarded at the debrief.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Lowest score that earns `grade`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    pub min_score: f64,
    pub grade: Grade,
}

/// Ordered grade thresholds, best first. Scores below every band get F.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeBands(pub Vec<GradeBand>);

impl GradeBands {
    /// A >= 90, B >= 80, C >= 70, D >= 60.
    pub fn standard() -> Self {
        Self(vec![
            GradeBand {
                min_score: 90.0,
                grade: Grade::A,
            },
            GradeBand {
                min_score: 80.0,
                grade: Grade::B,
            },
            GradeBand {
                min_score: 70.0,
                grade: Grade::C,
            },
            GradeBand {
                min_score: 60.0,
                grade: Grade::D,
            },
        ])
    }

    /// Standard bands with A+ at 97 and above.
    pub fn fine() -> Self {
        let mut bands = Self::standard();
        bands.0.insert(
            0,
            GradeBand {
                min_score: 97.0,
                grade: Grade::APlus,
            },
        );
        bands
    }

    /// Thresholds and grades must both strictly descend.
    pub fn validate(&self) -> Result<(), ScoringError> {
        for pair in self.0.windows(2) {
            if !(pair[0].min_score > pair[1].min_score && pair[0].grade < pair[1].grade) {
                return Err(ScoringError::UnorderedBands);
            }
        }
        if self.0.iter().any(|b| !b.min_score.is_finite()) {
            return Err(ScoringError::UnorderedBands);
        }
        Ok(())
    }

    /// Grade for a composite score.
    pub fn grade(&self, score: f64) -> Grade {
        self.0
            .iter()
            .find(|b| score >= b.min_score)
            .map(|b| b.grade)
            .unwrap_or(Grade::F)
    }
}

impl Default for GradeBands {
    fn default() -> Self {
        Self::standard()
    }
}

/// Weight of each indicator in the composite score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub revenue: f64,
    pub market_share: f64,
    pub customer_satisfaction: f64,
    pub brand_awareness: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            revenue: 0.25,
            market_share: 0.25,
            customer_satisfaction: 0.25,
            brand_awareness: 0.25,
        }
    }
}

/// Scoring configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    /// Revenue that scores 100, as a multiple of the total budget.
    pub revenue_target_multiple: f64,
    pub bands: GradeBands,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            revenue_target_multiple: 1.5,
            bands: GradeBands::standard(),
        }
    }
}

impl ScoringConfig {
    /// Validate weights, bands and the revenue target.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let w = &self.weights;
        let parts = [
            w.revenue,
            w.market_share,
            w.customer_satisfaction,
            w.brand_awareness,
        ];
        let sum: f64 = parts.iter().sum();
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) || (sum - 1.0).abs() > 1e-9 {
            return Err(ScoringError::InvalidWeights(sum));
        }
        if !(self.revenue_target_multiple.is_finite() && self.revenue_target_multiple > 0.0) {
            return Err(ScoringError::NonPositiveTarget);
        }
        self.bands.validate()
    }
}

/// Everything the debrief looks at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebriefInput {
    pub kpis: Kpis,
    pub morale: f64,
    pub brand_equity: f64,
    pub total_budget: Decimal,
    pub remaining_budget: Decimal,
}

/// Indicators normalized to [0, 100].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub revenue: f64,
    pub market_share: f64,
    pub customer_satisfaction: f64,
    pub brand_awareness: f64,
}

/// Read-only outcome of a finished campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalResults {
    pub score: f64,
    pub grade: Grade,
    pub breakdown: ScoreBreakdown,
    pub kpis: Kpis,
    pub morale: f64,
    pub brand_equity: f64,
    pub total_budget: Decimal,
    pub remaining_budget: Decimal,
    pub recommendations: Vec<String>,
}

fn revenue_target(input: &DebriefInput, cfg: &ScoringConfig) -> f64 {
    input.total_budget.to_f64().unwrap_or(0.0) * cfg.revenue_target_multiple
}

/// Normalize KPIs onto the [0, 100] score scale.
pub fn normalize(input: &DebriefInput, cfg: &ScoringConfig) -> ScoreBreakdown {
    let target = revenue_target(input, cfg);
    let revenue = if target > 0.0 {
        clamp_percent(input.kpis.revenue.to_f64().unwrap_or(0.0) / target * 100.0)
    } else {
        0.0
    };
    ScoreBreakdown {
        revenue,
        market_share: clamp_percent(input.kpis.market_share),
        customer_satisfaction: clamp_percent(input.kpis.customer_satisfaction),
        brand_awareness: clamp_percent(input.kpis.brand_awareness),
    }
}

/// Weighted sum of the normalized indicators.
pub fn composite_score(breakdown: &ScoreBreakdown, weights: &Weights) -> f64 {
    breakdown.revenue * weights.revenue
        + breakdown.market_share * weights.market_share
        + breakdown.customer_satisfaction * weights.customer_satisfaction
        + breakdown.brand_awareness * weights.brand_awareness
}

struct Rule {
    fires: fn(&DebriefInput, &ScoringConfig) -> bool,
    message: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        fires: |i, c| i.kpis.revenue.to_f64().unwrap_or(0.0) < revenue_target(i, c) * 0.5,
        message: "Revenue fell well short of target: lean on conversion-focused tactics such as paid search, promotions and retargeting.",
    },
    Rule {
        fires: |i, _| i.kpis.profit < Decimal::ZERO,
        message: "The campaign lost money: cut tactics whose cost exceeded their revenue impact.",
    },
    Rule {
        fires: |i, _| i.kpis.market_share < 15.0,
        message: "Market share stayed low: consider competitive campaigns and broader reach channels.",
    },
    Rule {
        fires: |i, _| i.kpis.customer_satisfaction < 60.0,
        message: "Customer satisfaction needs attention: invest in loyalty programs and service quality.",
    },
    Rule {
        fires: |i, _| i.kpis.brand_awareness < 40.0,
        message: "Brand awareness is weak: add awareness tactics on TV, PR or social.",
    },
    Rule {
        fires: |i, _| i.morale < 40.0,
        message: "Team morale is low: pace workloads and avoid stacking time-heavy tactics.",
    },
    Rule {
        fires: |i, _| i.brand_equity < 40.0,
        message: "Brand equity eroded: respond to crises with transparent, brand-safe choices.",
    },
    Rule {
        fires: |i, _| i.remaining_budget > i.total_budget * Decimal::new(25, 2),
        message: "More than a quarter of the budget went unspent: deploy it on proven tactics earlier.",
    },
];

/// Recommendations whose rule fires, in display order.
pub fn recommendations(input: &DebriefInput, cfg: &ScoringConfig) -> Vec<String> {
    let out: Vec<String> = RULES
        .iter()
        .filter(|r| (r.fires)(input, cfg))
        .map(|r| r.message.to_string())
        .collect();
    if out.is_empty() {
        return vec![
            "Balanced campaign: keep the channel mix and scale what performed best.".to_string(),
        ];
    }
    out
}

/// Compute the final debrief.
pub fn final_results(
    input: &DebriefInput,
    cfg: &ScoringConfig,
) -> Result<FinalResults, ScoringError> {
    cfg.validate()?;
    let breakdown = normalize(input, cfg);
    let score = composite_score(&breakdown, &cfg.weights);
    let grade = cfg.bands.grade(score);
    debug!(score, %grade, "debrief scored");
    Ok(FinalResults {
        score,
        grade,
        breakdown,
        kpis: input.kpis.clone(),
        morale: input.morale,
        brand_equity: input.brand_equity,
        total_budget: input.total_budget,
        remaining_budget: input.remaining_budget,
        recommendations: recommendations(input, cfg),
    })
}
