#![deny(warnings)]

//! Tick orchestration for the marketing response engine.
//!
//! A tick takes the previous [`SimulationState`], the player's channel
//! budgets and the caller-supplied [`MarketConditions`], and returns the next
//! state. Ticks never mutate their inputs and never draw random numbers;
//! randomness enters only through a [`MarketProvider`] at the loop boundary.

mod market;

pub use market::{FixedMarket, MarketProvider, SeededMarket};

use mix_core::{
    validate_channel_params, validate_market_conditions, validate_player_input, ChannelParams,
    ChannelTable, Industry, IndustryProfile, MarketConditions, PlayerInput, Quarter,
    ValidationError,
};
use mix_response::{adstock, saturation, SynergyMatrix};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Per-channel carried-over spend.
pub type AdstockVector = ChannelTable<f64>;

/// Errors produced by the tick orchestrator.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Input or configuration failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Funnel rates must be within [0, 1].
    #[error("{0} must be within [0,1]")]
    RateOutOfRange(&'static str),
    /// Industry profile values must be positive.
    #[error("industry profile values must be > 0")]
    InvalidProfile,
}

/// Engine configuration: funnel constants, channel curves and industry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Share of traffic that becomes a lead.
    pub lead_rate: f64,
    /// Share of leads that convert into customers.
    pub conversion_rate: f64,
    /// Share of the market bought organically, independent of spend.
    pub base_sales_fraction: f64,
    /// Response curve parameters per channel.
    pub channels: ChannelTable<ChannelParams>,
    /// Cross-channel synergy coefficients.
    pub synergy: SynergyMatrix,
    /// Industry the profile was taken from.
    pub industry: Industry,
    /// Customer value, market size and seasonality.
    pub profile: IndustryProfile,
}

impl EngineConfig {
    /// Canonical configuration for an industry.
    pub fn for_industry(industry: Industry) -> Self {
        Self {
            lead_rate: 0.05,
            conversion_rate: 0.15,
            base_sales_fraction: 0.1,
            channels: ChannelParams::default_table(),
            synergy: SynergyMatrix::default(),
            industry,
            profile: industry.profile(),
        }
    }

    /// Validate rates, channel curves and the industry profile.
    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, rate) in [
            ("lead_rate", self.lead_rate),
            ("conversion_rate", self.conversion_rate),
            ("base_sales_fraction", self.base_sales_fraction),
        ] {
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                return Err(EngineError::RateOutOfRange(name));
            }
        }
        validate_channel_params(&self.channels)?;
        let p = &self.profile;
        if !(p.avg_customer_value > 0.0 && p.market_size > 0.0)
            || p.seasonality.iter().any(|s| !(s.is_finite() && *s > 0.0))
        {
            return Err(EngineError::InvalidProfile);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_industry(Industry::default())
    }
}

/// Sales produced by one tick and their attribution to channels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// `base_sales + incremental_sales`.
    pub total_sales: f64,
    /// Organic sales independent of spend.
    pub base_sales: f64,
    /// Sales attributable to marketing.
    pub incremental_sales: f64,
    /// Visitors per channel.
    pub channel_traffic: ChannelTable<f64>,
    /// Incremental sales attributed per channel.
    pub channel_contributions: ChannelTable<f64>,
    /// Contribution over spend, in percent.
    pub channel_roi: ChannelTable<f64>,
    /// Total visitors across channels.
    pub total_traffic: f64,
    pub leads: f64,
    pub conversions: f64,
    /// Number of promotions that ran this tick.
    pub promotions_applied: usize,
}

/// Immutable engine state after a tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Number of ticks applied so far.
    pub tick: u64,
    /// Market conditions the last tick ran under.
    pub market: MarketConditions,
    /// Carried-over spend per channel.
    pub adstock: AdstockVector,
    pub output: SimulationOutput,
}

impl SimulationState {
    /// State before any tick: no memory, no sales.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Quarter the next tick falls into.
    pub fn next_quarter(&self) -> Quarter {
        Quarter::from_tick(self.tick)
    }
}

/// Advance the engine by one tick.
///
/// Config, input and market conditions are validated before anything is
/// computed. Deterministic: identical arguments yield identical output.
pub fn tick(
    config: &EngineConfig,
    previous: &SimulationState,
    input: &PlayerInput,
    market: &MarketConditions,
) -> Result<SimulationState, EngineError> {
    config.validate()?;
    validate_player_input(input)?;
    validate_market_conditions(market)?;

    let spend = &input.channel_budgets;
    let memory =
        spend.map(|c, &s| adstock(s, previous.adstock[c], config.channels[c].decay_rate));
    let saturated = memory.map(|c, &a| {
        let p = &config.channels[c];
        saturation(a, p.half_saturation, p.shape)
    });
    let active = spend.active();
    let responses = config.synergy.apply(&saturated, &active);

    let traffic = responses
        .map(|c, &r| r * spend[c] * config.channels[c].efficiency * market.economic_index);
    let total_traffic = traffic.total();

    let leads = total_traffic * config.lead_rate;
    let conversions = leads * config.conversion_rate;
    let quarter = previous.next_quarter();
    let seasonal = market.seasonality_index * config.profile.seasonality[quarter.index()];
    let revenue = conversions * config.profile.avg_customer_value * seasonal;

    let contributions = traffic.map(|_, &t| {
        if total_traffic > 0.0 {
            t / total_traffic * revenue
        } else {
            0.0
        }
    });
    let roi = contributions.map(|c, &contribution| {
        if spend[c] > 0.0 {
            contribution / spend[c] * 100.0
        } else {
            0.0
        }
    });

    let base_sales =
        config.base_sales_fraction * config.profile.market_size * market.seasonality_index;

    debug!(
        tick = previous.tick + 1,
        %quarter,
        active = active.len(),
        total_traffic,
        revenue,
        "engine tick"
    );

    Ok(SimulationState {
        tick: previous.tick + 1,
        market: market.clone(),
        adstock: memory,
        output: SimulationOutput {
            total_sales: base_sales + revenue,
            base_sales,
            incremental_sales: revenue,
            channel_traffic: traffic,
            channel_contributions: contributions,
            channel_roi: roi,
            total_traffic,
            leads,
            conversions,
            promotions_applied: input.promotions.len(),
        },
    })
}

/// Run one tick per input, drawing market conditions from `provider`.
///
/// Returns every intermediate state, starting with the first tick.
pub fn run_ticks(
    config: &EngineConfig,
    initial: &SimulationState,
    inputs: &[PlayerInput],
    provider: &mut impl MarketProvider,
) -> Result<Vec<SimulationState>, EngineError> {
    let mut history: Vec<SimulationState> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let previous = history.last().unwrap_or(initial);
        let market = provider.conditions(previous.tick + 1);
        let next = tick(config, previous, input, &market)?;
        history.push(next);
    }
    Ok(history)
}
