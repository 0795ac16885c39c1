//! Scenario files and the scripted campaign run built from them.

use anyhow::{bail, Context, Result};
use catalog::Catalog;
use mix_campaign::{Campaign, CampaignConfig, CampaignError, CampaignEvent, StrategyConfig};
use mix_core::{ChannelTable, ChoiceId, PlayerInput, Quarter, TacticId, WildcardEvent};
use mix_runtime::{run_ticks, EngineConfig, SeededMarket, SimulationState};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

pub const DEFAULT_SCENARIO: &str = include_str!("../../../assets/scenarios/default.yaml");

/// Plan for one quarter: engine spend plus campaign tactics.
#[derive(Debug, Clone, Deserialize)]
pub struct QuarterPlan {
    #[serde(default)]
    pub channel_budgets: ChannelTable<f64>,
    #[serde(default)]
    pub tactics: Vec<TacticId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub total_budget: Decimal,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub market_noise: f64,
    #[serde(default)]
    pub competitor_spend: ChannelTable<f64>,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub campaign: Option<CampaignConfig>,
    pub quarters: Vec<QuarterPlan>,
}

impl Scenario {
    pub fn parse(text: &str) -> Result<Self> {
        let s: Scenario = serde_yaml::from_str(text).context("parsing scenario yaml")?;
        if s.quarters.len() != Quarter::ALL.len() {
            bail!(
                "scenario {:?} plans {} quarters, expected {}",
                s.name,
                s.quarters.len(),
                Quarter::ALL.len()
            );
        }
        Ok(s)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::parse(&text)
    }
}

/// Run the channel plan through the response engine, one tick per quarter.
pub fn forecast(scenario: &Scenario) -> Result<Vec<SimulationState>> {
    let config = EngineConfig::for_industry(scenario.strategy.industry);
    let inputs: Vec<PlayerInput> = scenario
        .quarters
        .iter()
        .map(|q| PlayerInput {
            channel_budgets: q.channel_budgets.clone(),
            promotions: vec![],
        })
        .collect();
    let mut market = SeededMarket::new(
        scenario.seed,
        scenario.market_noise,
        scenario.competitor_spend.clone(),
    );
    let history = run_ticks(&config, &SimulationState::initial(), &inputs, &mut market)?;
    Ok(history)
}

fn step(campaign: Campaign, event: CampaignEvent) -> Result<Campaign> {
    let name = event.name();
    campaign
        .transition(&event)
        .with_context(|| format!("{name} rejected in {}", campaign.phase()))
}

/// Play the scenario's campaign through to the debrief.
///
/// One wildcard is drawn per quarter. A wildcard the quarter cannot afford
/// is passed over; otherwise it is answered with the first choice the
/// campaign accepts.
pub fn play_campaign(scenario: &Scenario, catalog: &Catalog) -> Result<Campaign> {
    let config = scenario.campaign.clone().unwrap_or_default();
    let mut campaign = Campaign::new(config)?;
    let mut deck = catalog.deck(scenario.seed);

    campaign = step(
        campaign,
        CampaignEvent::StartSimulation {
            total_budget: scenario.total_budget,
        },
    )?;
    campaign = step(campaign, CampaignEvent::SetStrategy(scenario.strategy.clone()))?;
    campaign = step(campaign, CampaignEvent::CompleteStrategySession)?;

    for (quarter, plan) in Quarter::ALL.iter().copied().zip(&scenario.quarters) {
        for id in &plan.tactics {
            let tactic = catalog
                .tactic(id)
                .with_context(|| format!("unknown tactic {id} in {quarter}"))?;
            campaign = step(campaign, CampaignEvent::AddTactic(tactic.clone()))?;
        }
        if let Some(event) = deck.draw() {
            campaign = answer_wildcard(campaign, quarter, event)?;
        }
        campaign = step(campaign, CampaignEvent::CompleteQuarter(quarter))?;
    }
    Ok(campaign)
}

fn answer_wildcard(
    campaign: Campaign,
    quarter: Quarter,
    event: WildcardEvent,
) -> Result<Campaign> {
    let event_id = event.id.clone();
    let title = event.title.clone();
    let choices: Vec<ChoiceId> = event.choices.iter().map(|c| c.id.clone()).collect();
    let triggered = match campaign.transition(&CampaignEvent::TriggerWildcard(event)) {
        Ok(next) => next,
        Err(CampaignError::GuardNotSatisfied(guard)) => {
            info!(%quarter, wildcard = %title, %guard, "wildcard passed over");
            return Ok(campaign);
        }
        Err(e) => return Err(e).with_context(|| format!("triggering {event_id}")),
    };
    for choice_id in choices {
        let respond = CampaignEvent::RespondToWildcard {
            event_id: event_id.clone(),
            choice_id: choice_id.clone(),
        };
        if let Ok(answered) = triggered.transition(&respond) {
            info!(%quarter, wildcard = %title, choice = %choice_id, "wildcard answered");
            return step(answered, CampaignEvent::ApplyWildcardImpact(event_id));
        }
    }
    bail!("no choice of wildcard {event_id} was accepted in {quarter}")
}
