#![deny(warnings)]

//! Quarterly campaign state machine.
//!
//! A [`Campaign`] moves through
//! `Idle -> StrategySession -> Q1 -> Q2 -> Q3 -> Q4 -> Debrief -> Completed`
//! and back to `Idle` on restart. Every transition is a pure function of the
//! current campaign and a [`CampaignEvent`]: it returns the next campaign or
//! an explicit [`CampaignError`], and never mutates the receiver.

mod context;
mod machine;

pub use context::{
    quarter_results, CampaignConfig, CampaignContext, QuarterData, StrategyConfig,
    WildcardOutcome, WildcardRecord,
};
pub use machine::Campaign;

use mix_core::{ChoiceId, Quarter, Tactic, TacticId, ValidationError, WildcardEvent, WildcardId};
use mix_scoring::ScoringError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where the campaign currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    StrategySession,
    Quarter(Quarter),
    Debrief,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::StrategySession => f.write_str("strategySession"),
            Phase::Quarter(q) => write!(f, "{q}"),
            Phase::Debrief => f.write_str("debrief"),
            Phase::Completed => f.write_str("completed"),
        }
    }
}

/// Inputs the state machine accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CampaignEvent {
    StartSimulation { total_budget: Decimal },
    SetStrategy(StrategyConfig),
    CompleteStrategySession,
    AddTactic(Tactic),
    RemoveTactic(TacticId),
    TriggerWildcard(WildcardEvent),
    RespondToWildcard {
        event_id: WildcardId,
        choice_id: ChoiceId,
    },
    ApplyWildcardImpact(WildcardId),
    CompleteQuarter(Quarter),
    CompleteDebrief,
    RestartSimulation,
}

impl CampaignEvent {
    /// Stable event name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            CampaignEvent::StartSimulation { .. } => "START_SIMULATION",
            CampaignEvent::SetStrategy(_) => "SET_STRATEGY",
            CampaignEvent::CompleteStrategySession => "COMPLETE_STRATEGY_SESSION",
            CampaignEvent::AddTactic(_) => "ADD_TACTIC",
            CampaignEvent::RemoveTactic(_) => "REMOVE_TACTIC",
            CampaignEvent::TriggerWildcard(_) => "TRIGGER_WILDCARD",
            CampaignEvent::RespondToWildcard { .. } => "RESPOND_TO_WILDCARD",
            CampaignEvent::ApplyWildcardImpact(_) => "APPLY_WILDCARD_IMPACT",
            CampaignEvent::CompleteQuarter(_) => "COMPLETE_QUARTER",
            CampaignEvent::CompleteDebrief => "COMPLETE_DEBRIEF",
            CampaignEvent::RestartSimulation => "RESTART_SIMULATION",
        }
    }
}

/// Precondition that blocked a transition.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Guard {
    #[error("total budget must be > 0")]
    NonPositiveBudget,
    #[error("target audience is not set")]
    MissingTargetAudience,
    #[error("brand positioning is not set")]
    MissingBrandPositioning,
    #[error("at least one primary channel is required")]
    NoPrimaryChannel,
    #[error("cannot complete {requested} while in {current}")]
    QuarterMismatch { current: Quarter, requested: Quarter },
    #[error("budget overspent by {0}")]
    BudgetExceeded(Decimal),
    #[error("{spent} hours used of {capacity} available")]
    TimeExceeded { spent: u32, capacity: u32 },
    #[error("wildcard {0} is awaiting a response")]
    AwaitingResponse(WildcardId),
    #[error("no choice of wildcard {0} fits the quarter's budget and hours")]
    NoAffordableChoice(WildcardId),
    #[error("choice would leave an open wildcard without an affordable answer")]
    StrandsOpenWildcard,
    #[error("impact of wildcard {0} was already applied")]
    ImpactAlreadyApplied(WildcardId),
}

/// Reference that did not resolve in the current quarter.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Missing {
    #[error("tactic {0}")]
    Tactic(TacticId),
    #[error("wildcard {0}")]
    Wildcard(WildcardId),
    #[error("choice {choice} in wildcard {event}")]
    Choice { event: WildcardId, choice: ChoiceId },
    #[error("data for {0}")]
    Quarter(Quarter),
}

/// Why a transition was refused. The campaign is unchanged in every case.
#[derive(Debug, Error, PartialEq)]
pub enum CampaignError {
    #[error("{event} is not accepted in {phase}")]
    EventNotAccepted { phase: Phase, event: &'static str },
    #[error("guard not satisfied: {0}")]
    GuardNotSatisfied(Guard),
    #[error("not found: {0}")]
    NotFound(Missing),
    #[error("wildcard {0} already has a response")]
    AlreadyResolved(WildcardId),
    #[error("tactic {0} is already selected this quarter")]
    DuplicateTactic(TacticId),
    #[error("wildcard {0} was already triggered this quarter")]
    DuplicateWildcard(WildcardId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
