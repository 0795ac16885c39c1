//! Campaign context: everything a single run accumulates.

use mix_core::{
    Channel, Choice, ChoiceId, Impact, Industry, Kpis, Quarter, Tactic, WildcardEvent, WildcardId,
};
use mix_scoring::{FinalResults, ScoringConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Player-chosen strategy for the campaign.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub brand_positioning: Option<String>,
    #[serde(default)]
    pub primary_channels: Vec<Channel>,
    #[serde(default)]
    pub industry: Industry,
    #[serde(default)]
    pub objectives: Vec<String>,
}

/// Starting values and limits for a campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub starting_kpis: Kpis,
    pub starting_morale: f64,
    pub starting_brand_equity: f64,
    /// Team hours available per quarter.
    pub quarter_time_capacity: u32,
    pub scoring: ScoringConfig,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            starting_kpis: Kpis {
                revenue: Decimal::ZERO,
                profit: Decimal::ZERO,
                market_share: 10.0,
                customer_satisfaction: 60.0,
                brand_awareness: 30.0,
            },
            starting_morale: 75.0,
            starting_brand_equity: 50.0,
            quarter_time_capacity: 480,
            scoring: ScoringConfig::default(),
        }
    }
}

/// A wildcard event as it occurred in a quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WildcardRecord {
    pub quarter: Quarter,
    pub event: WildcardEvent,
    /// Choice picked by the player, once resolved.
    pub response: Option<ChoiceId>,
    /// Whether morale and brand equity deltas were applied.
    pub impact_applied: bool,
}

impl WildcardRecord {
    pub fn new(quarter: Quarter, event: WildcardEvent) -> Self {
        Self {
            quarter,
            event,
            response: None,
            impact_applied: false,
        }
    }

    /// The chosen option, if the event is resolved.
    pub fn chosen(&self) -> Option<&Choice> {
        self.response.as_ref().and_then(|id| self.event.choice(id))
    }
}

/// Entry in the campaign's wildcard history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WildcardOutcome {
    pub quarter: Quarter,
    pub event_id: WildcardId,
    pub choice_id: ChoiceId,
}

/// Decisions and results of one quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuarterData {
    pub quarter: Quarter,
    pub tactics: Vec<Tactic>,
    pub budget_spent: Decimal,
    pub time_spent: u32,
    pub wildcard_events: Vec<WildcardRecord>,
    /// Set once, when the quarter completes.
    pub results: Option<Kpis>,
}

impl QuarterData {
    pub fn new(quarter: Quarter) -> Self {
        Self {
            quarter,
            tactics: Vec::new(),
            budget_spent: Decimal::ZERO,
            time_spent: 0,
            wildcard_events: Vec::new(),
            results: None,
        }
    }

    pub(crate) fn wildcard_mut(&mut self, id: &WildcardId) -> Option<&mut WildcardRecord> {
        self.wildcard_events.iter_mut().find(|r| &r.event.id == id)
    }

    /// Budget and hours this quarter could still commit once every tactic is
    /// dropped, after setting aside the cheapest choice of each unanswered
    /// wildcard other than `skip`.
    pub(crate) fn headroom(
        &self,
        remaining_budget: Decimal,
        capacity: u32,
        skip: Option<&WildcardId>,
    ) -> Headroom {
        let tactic_cost: Decimal = self.tactics.iter().map(|t| t.cost).sum();
        let tactic_hours: i64 = self
            .tactics
            .iter()
            .map(|t| i64::from(t.time_required))
            .sum();
        let mut room = Headroom {
            budget: remaining_budget + tactic_cost,
            hours: i64::from(capacity) - (i64::from(self.time_spent) - tactic_hours),
        };
        let pending = self
            .wildcard_events
            .iter()
            .filter(|r| r.response.is_none() && Some(&r.event.id) != skip)
            .filter_map(|r| r.event.cheapest());
        for choice in pending {
            room.budget -= choice.cost;
            room.hours -= i64::from(choice.time_required);
        }
        room
    }
}

/// Spare budget and hours in a quarter; see [`QuarterData::headroom`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Headroom {
    pub budget: Decimal,
    pub hours: i64,
}

impl Headroom {
    pub fn covers(&self, choice: &Choice) -> bool {
        choice.cost <= self.budget && i64::from(choice.time_required) <= self.hours
    }
}

/// KPI delta produced by a quarter's tactics and resolved wildcards.
///
/// Profit is the delta's revenue minus what the quarter spent. Does not
/// touch any running totals.
pub fn quarter_results(quarter: &QuarterData) -> Kpis {
    let tactics: Impact = quarter.tactics.iter().map(|t| &t.expected_impact).sum();
    let wildcards: Impact = quarter
        .wildcard_events
        .iter()
        .filter_map(WildcardRecord::chosen)
        .map(|c| &c.impact)
        .sum();
    let total = tactics + wildcards;
    Kpis {
        revenue: total.revenue,
        profit: total.revenue - quarter.budget_spent,
        market_share: total.market_share,
        customer_satisfaction: total.customer_satisfaction,
        brand_awareness: total.brand_awareness,
    }
}

/// State owned by one campaign run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignContext {
    pub config: CampaignConfig,
    pub strategy: StrategyConfig,
    /// One entry per quarter entered so far, in order.
    pub quarters: Vec<QuarterData>,
    pub total_budget: Decimal,
    pub remaining_budget: Decimal,
    pub kpis: Kpis,
    /// Hidden team morale in [0, 100].
    pub morale: f64,
    /// Hidden brand equity in [0, 100].
    pub brand_equity: f64,
    pub wildcard_history: Vec<WildcardOutcome>,
    pub final_results: Option<FinalResults>,
}

impl CampaignContext {
    /// Fresh context with the given budget.
    pub fn new(config: CampaignConfig, total_budget: Decimal) -> Self {
        Self {
            strategy: StrategyConfig::default(),
            quarters: Vec::with_capacity(Quarter::ALL.len()),
            total_budget,
            remaining_budget: total_budget,
            kpis: config.starting_kpis.clone(),
            morale: mix_core::clamp_percent(config.starting_morale),
            brand_equity: mix_core::clamp_percent(config.starting_brand_equity),
            wildcard_history: Vec::new(),
            final_results: None,
            config,
        }
    }

    /// Data for a quarter that has been entered.
    pub fn quarter(&self, quarter: Quarter) -> Option<&QuarterData> {
        self.quarters.iter().find(|q| q.quarter == quarter)
    }
}
