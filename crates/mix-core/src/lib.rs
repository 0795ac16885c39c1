#![deny(warnings)]

//! Core domain models and invariants for the marketing mix simulation.
//!
//! This crate defines serializable types shared by the response engine and
//! the campaign state machine, plus validation helpers that guard the
//! boundaries where callers hand data to the core.

mod channel;

pub use channel::{Channel, ChannelParams, ChannelTable};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Add;
use thiserror::Error;

/// Industry the simulated business operates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    #[default]
    Retail,
    Technology,
    Healthcare,
    Finance,
    Automotive,
    Hospitality,
}

/// Demand characteristics of an industry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndustryProfile {
    /// Average revenue per converted customer in USD.
    pub avg_customer_value: f64,
    /// Addressable market size per quarter in USD.
    pub market_size: f64,
    /// Seasonality factor for Q1..Q4.
    pub seasonality: [f64; 4],
}

impl Industry {
    /// Built-in profile for the industry.
    pub fn profile(self) -> IndustryProfile {
        let (avg_customer_value, market_size, seasonality) = match self {
            Industry::Retail => (120.0, 4_000_000.0, [0.85, 0.95, 1.0, 1.3]),
            Industry::Technology => (1_500.0, 6_000_000.0, [0.95, 1.0, 0.95, 1.15]),
            Industry::Healthcare => (900.0, 5_000_000.0, [1.1, 1.0, 0.95, 1.0]),
            Industry::Finance => (2_500.0, 8_000_000.0, [1.15, 1.0, 0.9, 1.0]),
            Industry::Automotive => (3_000.0, 7_000_000.0, [0.9, 1.1, 1.05, 0.95]),
            Industry::Hospitality => (350.0, 3_000_000.0, [0.8, 1.15, 1.25, 0.9]),
        };
        IndustryProfile {
            avg_customer_value,
            market_size,
            seasonality,
        }
    }
}

/// One of the four campaign quarters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// All quarters in campaign order.
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Zero-based position in the campaign.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The quarter after this one, `None` after Q4.
    pub fn next(self) -> Option<Quarter> {
        Quarter::ALL.get(self.index() + 1).copied()
    }

    /// Quarter a zero-based tick counter falls into.
    pub fn from_tick(tick: u64) -> Quarter {
        Quarter::ALL[(tick % 4) as usize]
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.index() + 1)
    }
}

/// External market state for one tick. Produced by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    /// Seasonal demand multiplier (baseline 1.0, > 0).
    pub seasonality_index: f64,
    /// Competitor spend per channel in USD (>= 0).
    #[serde(default)]
    pub competitor_spend: ChannelTable<f64>,
    /// Macro-economic index scaling traffic (baseline 1.0, >= 0).
    pub economic_index: f64,
}

impl Default for MarketConditions {
    fn default() -> Self {
        Self {
            seasonality_index: 1.0,
            competitor_spend: ChannelTable::default(),
            economic_index: 1.0,
        }
    }
}

/// A price promotion run alongside channel spend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    /// Display name.
    pub name: String,
    /// Discount as a fraction of list price, in [0, 1).
    pub discount_frac: f64,
}

/// Player decisions for one engine tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Spend per channel in USD (>= 0).
    #[serde(default)]
    pub channel_budgets: ChannelTable<f64>,
    /// Active promotions.
    #[serde(default)]
    pub promotions: Vec<Promotion>,
}

/// Expected change to the campaign KPIs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Impact {
    /// Revenue in USD.
    pub revenue: Decimal,
    /// Market share in percentage points.
    pub market_share: f64,
    /// Customer satisfaction in points.
    pub customer_satisfaction: f64,
    /// Brand awareness in points.
    pub brand_awareness: f64,
}

impl Add for Impact {
    type Output = Impact;

    fn add(self, rhs: Impact) -> Impact {
        Impact {
            revenue: self.revenue + rhs.revenue,
            market_share: self.market_share + rhs.market_share,
            customer_satisfaction: self.customer_satisfaction + rhs.customer_satisfaction,
            brand_awareness: self.brand_awareness + rhs.brand_awareness,
        }
    }
}

impl<'a> std::iter::Sum<&'a Impact> for Impact {
    fn sum<I: Iterator<Item = &'a Impact>>(iter: I) -> Impact {
        iter.fold(Impact::default(), |acc, i| acc + i.clone())
    }
}

/// Campaign key performance indicators.
///
/// Used both for the running totals and for per-quarter deltas.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Revenue in USD (unbounded).
    pub revenue: Decimal,
    /// Profit in USD (unbounded, may be negative).
    pub profit: Decimal,
    /// Market share percentage, in [0, 100] for running totals.
    pub market_share: f64,
    /// Customer satisfaction, in [0, 100] for running totals.
    pub customer_satisfaction: f64,
    /// Brand awareness, in [0, 100] for running totals.
    pub brand_awareness: f64,
}

impl Kpis {
    /// Fold a delta into these totals, clamping the bounded indicators.
    pub fn fold(&self, delta: &Kpis) -> Kpis {
        Kpis {
            revenue: self.revenue + delta.revenue,
            profit: self.profit + delta.profit,
            market_share: clamp_percent(self.market_share + delta.market_share),
            customer_satisfaction: clamp_percent(
                self.customer_satisfaction + delta.customer_satisfaction,
            ),
            brand_awareness: clamp_percent(self.brand_awareness + delta.brand_awareness),
        }
    }
}

/// Clamp a value into the [0, 100] range used by bounded indicators.
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Identifier of a catalog tactic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TacticId(pub String);

/// Identifier of a wildcard event.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WildcardId(pub String);

/// Identifier of a choice inside a wildcard event.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChoiceId(pub String);

macro_rules! display_id {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

display_id!(TacticId, WildcardId, ChoiceId);

/// A purchasable marketing action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tactic {
    pub id: TacticId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Primary channel the tactic runs on, if any.
    #[serde(default)]
    pub channel: Option<Channel>,
    /// Cost in USD (>= 0).
    pub cost: Decimal,
    /// Team hours required.
    pub time_required: u32,
    pub expected_impact: Impact,
}

/// One option the player may pick in response to a wildcard event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub label: String,
    /// Cost in USD (>= 0).
    #[serde(default)]
    pub cost: Decimal,
    /// Team hours required.
    #[serde(default)]
    pub time_required: u32,
    #[serde(default)]
    pub impact: Impact,
    /// Morale delta in points.
    #[serde(default)]
    pub morale: Option<f64>,
    /// Brand equity delta in points.
    #[serde(default)]
    pub brand_equity: Option<f64>,
}

/// A random mid-campaign occurrence with a menu of choices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WildcardEvent {
    pub id: WildcardId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub choices: Vec<Choice>,
}

impl WildcardEvent {
    /// Look up a choice by id.
    pub fn choice(&self, id: &ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| &c.id == id)
    }

    /// Lowest-cost choice, ties broken by fewer hours.
    pub fn cheapest(&self) -> Option<&Choice> {
        self.choices
            .iter()
            .min_by(|a, b| a.cost.cmp(&b.cost).then(a.time_required.cmp(&b.time_required)))
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Spend or cost must be non-negative.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Decay rate must be within [0, 1).
    #[error("decay rate {1} for {0} must be within [0,1)")]
    DecayOutOfRange(Channel, f64),
    /// Half-saturation point and shape must be strictly positive.
    #[error("saturation parameters for {0} must be > 0")]
    NonPositiveSaturation(Channel),
    /// Efficiency must be non-negative.
    #[error("efficiency for {0} must be >= 0")]
    NegativeEfficiency(Channel),
    /// Seasonality must be strictly positive; economic index non-negative.
    #[error("market index out of range")]
    IndexOutOfRange,
    /// Promotion discount must be within [0, 1).
    #[error("promotion discount must be within [0,1)")]
    DiscountOutOfRange,
    /// Identifiers and names must not be blank.
    #[error("blank identifier or name")]
    BlankField,
    /// Identifier used more than once.
    #[error("duplicate identifier: {0}")]
    DuplicateId(String),
    /// Wildcard without any choice to pick.
    #[error("wildcard {0} has no choices")]
    NoChoices(String),
}

fn finite(values: &[f64]) -> Result<(), ValidationError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ValidationError::NonFinite)
    }
}

/// Validate a channel parameter table.
pub fn validate_channel_params(table: &ChannelTable<ChannelParams>) -> Result<(), ValidationError> {
    for (channel, p) in table.iter() {
        finite(&[p.decay_rate, p.half_saturation, p.shape, p.efficiency])?;
        if !(0.0..1.0).contains(&p.decay_rate) {
            return Err(ValidationError::DecayOutOfRange(channel, p.decay_rate));
        }
        if p.half_saturation <= 0.0 || p.shape <= 0.0 {
            return Err(ValidationError::NonPositiveSaturation(channel));
        }
        if p.efficiency < 0.0 {
            return Err(ValidationError::NegativeEfficiency(channel));
        }
    }
    Ok(())
}

/// Validate market conditions supplied by the caller.
pub fn validate_market_conditions(m: &MarketConditions) -> Result<(), ValidationError> {
    finite(&[m.seasonality_index, m.economic_index])?;
    if m.seasonality_index <= 0.0 || m.economic_index < 0.0 {
        return Err(ValidationError::IndexOutOfRange);
    }
    for (_, spend) in m.competitor_spend.iter() {
        finite(&[*spend])?;
        if *spend < 0.0 {
            return Err(ValidationError::NegativeMoney);
        }
    }
    Ok(())
}

/// Validate player input for one tick.
pub fn validate_player_input(input: &PlayerInput) -> Result<(), ValidationError> {
    for (_, spend) in input.channel_budgets.iter() {
        finite(&[*spend])?;
        if *spend < 0.0 {
            return Err(ValidationError::NegativeMoney);
        }
    }
    for p in &input.promotions {
        if p.name.trim().is_empty() {
            return Err(ValidationError::BlankField);
        }
        if !p.discount_frac.is_finite() || !(0.0..1.0).contains(&p.discount_frac) {
            return Err(ValidationError::DiscountOutOfRange);
        }
    }
    Ok(())
}

fn validate_impact(i: &Impact) -> Result<(), ValidationError> {
    finite(&[i.market_share, i.customer_satisfaction, i.brand_awareness])
}

/// Validate a catalog tactic.
pub fn validate_tactic(t: &Tactic) -> Result<(), ValidationError> {
    if t.id.0.trim().is_empty() || t.name.trim().is_empty() {
        return Err(ValidationError::BlankField);
    }
    if t.cost < Decimal::ZERO {
        return Err(ValidationError::NegativeMoney);
    }
    validate_impact(&t.expected_impact)
}

/// Validate a wildcard event and its choices.
pub fn validate_wildcard(w: &WildcardEvent) -> Result<(), ValidationError> {
    if w.id.0.trim().is_empty() || w.title.trim().is_empty() {
        return Err(ValidationError::BlankField);
    }
    if w.choices.is_empty() {
        return Err(ValidationError::NoChoices(w.id.0.clone()));
    }
    let mut seen = BTreeSet::new();
    for c in &w.choices {
        if c.id.0.trim().is_empty() {
            return Err(ValidationError::BlankField);
        }
        if !seen.insert(&c.id) {
            return Err(ValidationError::DuplicateId(c.id.0.clone()));
        }
        if c.cost < Decimal::ZERO {
            return Err(ValidationError::NegativeMoney);
        }
        validate_impact(&c.impact)?;
        finite(&[c.morale.unwrap_or(0.0), c.brand_equity.unwrap_or(0.0)])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn choice(id: &str) -> Choice {
        Choice {
            id: ChoiceId(id.to_string()),
            label: "Go".to_string(),
            cost: Decimal::new(1_000, 0),
            time_required: 8,
            impact: Impact::default(),
            morale: Some(-5.0),
            brand_equity: None,
        }
    }

    #[test]
    fn default_channel_params_are_valid() {
        validate_channel_params(&ChannelParams::default_table()).unwrap();
    }

    #[test]
    fn seo_remembers_more_than_tv() {
        let t = ChannelParams::default_table();
        assert!(t[Channel::Seo].decay_rate > t[Channel::Tv].decay_rate);
    }

    #[test]
    fn decay_of_one_is_rejected() {
        let mut t = ChannelParams::default_table();
        t[Channel::Radio].decay_rate = 1.0;
        assert_eq!(
            validate_channel_params(&t),
            Err(ValidationError::DecayOutOfRange(Channel::Radio, 1.0))
        );
    }

    #[test]
    fn channel_table_serializes_as_named_map() {
        let mut budgets = ChannelTable::<f64>::default();
        budgets[Channel::Tv] = 10_000.0;
        let s = serde_json::to_string(&budgets).unwrap();
        assert!(s.contains("\"tv\":10000.0"));
        let back: ChannelTable<f64> = serde_json::from_str(&s).unwrap();
        assert_eq!(back, budgets);
    }

    #[test]
    fn partial_channel_map_fills_defaults() {
        let input: PlayerInput =
            serde_yaml::from_str("channel_budgets:\n  seo: 5000\n  pr: 2500\n").unwrap();
        assert_eq!(input.channel_budgets[Channel::Seo], 5_000.0);
        assert_eq!(input.channel_budgets[Channel::Tv], 0.0);
        assert_eq!(input.channel_budgets.active(), vec![Channel::Seo, Channel::Pr]);
    }

    #[test]
    fn quarter_progression() {
        assert_eq!(Quarter::Q1.next(), Some(Quarter::Q2));
        assert_eq!(Quarter::Q4.next(), None);
        assert_eq!(Quarter::from_tick(6), Quarter::Q3);
        assert_eq!(Quarter::Q2.to_string(), "Q2");
    }

    #[test]
    fn fold_clamps_bounded_indicators_only() {
        let base = Kpis {
            revenue: Decimal::new(100, 0),
            profit: Decimal::new(-50, 0),
            market_share: 95.0,
            customer_satisfaction: 3.0,
            brand_awareness: 50.0,
        };
        let delta = Kpis {
            revenue: Decimal::new(-500, 0),
            profit: Decimal::new(-500, 0),
            market_share: 20.0,
            customer_satisfaction: -10.0,
            brand_awareness: 5.0,
        };
        let out = base.fold(&delta);
        assert_eq!(out.revenue, Decimal::new(-400, 0));
        assert_eq!(out.profit, Decimal::new(-550, 0));
        assert_eq!(out.market_share, 100.0);
        assert_eq!(out.customer_satisfaction, 0.0);
        assert_eq!(out.brand_awareness, 55.0);
    }

    #[test]
    fn impacts_sum() {
        let a = Impact {
            revenue: Decimal::new(150_000, 0),
            market_share: 1.5,
            ..Impact::default()
        };
        let b = Impact {
            revenue: Decimal::new(50_000, 0),
            brand_awareness: 4.0,
            ..Impact::default()
        };
        let total: Impact = [a, b].iter().sum();
        assert_eq!(total.revenue, Decimal::new(200_000, 0));
        assert_eq!(total.market_share, 1.5);
        assert_eq!(total.brand_awareness, 4.0);
    }

    #[test]
    fn wildcard_rejects_duplicate_choices() {
        let w = WildcardEvent {
            id: WildcardId("supply-shock".to_string()),
            title: "Supply shock".to_string(),
            description: String::new(),
            choices: vec![choice("absorb"), choice("absorb")],
        };
        assert_eq!(
            validate_wildcard(&w),
            Err(ValidationError::DuplicateId("absorb".to_string()))
        );
    }

    #[test]
    fn wildcard_requires_choices() {
        let w = WildcardEvent {
            id: WildcardId("quiet".to_string()),
            title: "Quiet quarter".to_string(),
            description: String::new(),
            choices: vec![],
        };
        assert!(matches!(
            validate_wildcard(&w),
            Err(ValidationError::NoChoices(_))
        ));
    }

    #[test]
    fn cheapest_prefers_cost_then_hours() {
        let priced = |id: &str, cost: i64, hours: u32| Choice {
            cost: Decimal::new(cost, 0),
            time_required: hours,
            ..choice(id)
        };
        let w = WildcardEvent {
            id: WildcardId("strike".to_string()),
            title: "Agency strike".to_string(),
            description: String::new(),
            choices: vec![
                priced("settle", 20_000, 10),
                priced("wait", 5_000, 40),
                priced("insource", 5_000, 25),
            ],
        };
        assert_eq!(w.cheapest().map(|c| c.id.0.as_str()), Some("insource"));
    }

    #[test]
    fn market_conditions_reject_negative_competitor_spend() {
        let mut m = MarketConditions::default();
        validate_market_conditions(&m).unwrap();
        m.competitor_spend[Channel::Digital] = -1.0;
        assert_eq!(
            validate_market_conditions(&m),
            Err(ValidationError::NegativeMoney)
        );
    }

    proptest! {
        #[test]
        fn clamp_percent_is_bounded(v in -1.0e6f64..1.0e6) {
            let c = clamp_percent(v);
            prop_assert!((0.0..=100.0).contains(&c));
        }

        #[test]
        fn promotion_discount_range(d in 0.0f64..0.999) {
            let input = PlayerInput {
                channel_budgets: ChannelTable::default(),
                promotions: vec![Promotion { name: "Spring sale".to_string(), discount_frac: d }],
            };
            prop_assert!(validate_player_input(&input).is_ok());
        }
    }
}
