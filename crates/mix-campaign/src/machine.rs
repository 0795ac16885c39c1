//! Transition logic for [`Campaign`].

use crate::context::{
    quarter_results, CampaignConfig, CampaignContext, QuarterData, StrategyConfig,
    WildcardOutcome, WildcardRecord,
};
use crate::{CampaignError, CampaignEvent, Guard, Missing, Phase};
use mix_core::{clamp_percent, validate_tactic, validate_wildcard, Quarter};
use mix_scoring::{final_results, DebriefInput, FinalResults};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A campaign run: current phase plus its context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    phase: Phase,
    context: CampaignContext,
}

impl Campaign {
    /// An idle campaign using `config` for every run.
    pub fn new(config: CampaignConfig) -> Result<Self, CampaignError> {
        config.scoring.validate()?;
        Ok(Self {
            phase: Phase::Idle,
            context: CampaignContext::new(config, Decimal::ZERO),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Read-only snapshot of the run.
    pub fn context(&self) -> &CampaignContext {
        &self.context
    }

    /// Present only once the debrief has been reached.
    pub fn final_results(&self) -> Option<&FinalResults> {
        self.context.final_results.as_ref()
    }

    /// Apply `event`, returning the next campaign.
    pub fn transition(&self, event: &CampaignEvent) -> Result<Campaign, CampaignError> {
        let mut next = self.clone();
        match next.step(event) {
            Ok(()) => {
                if next.phase != self.phase {
                    info!(
                        from = %self.phase,
                        to = %next.phase,
                        event = event.name(),
                        "phase change"
                    );
                } else {
                    debug!(phase = %self.phase, event = event.name(), "event applied");
                }
                Ok(next)
            }
            Err(e) => {
                warn!(phase = %self.phase, event = event.name(), error = %e, "event rejected");
                Err(e)
            }
        }
    }

    fn step(&mut self, event: &CampaignEvent) -> Result<(), CampaignError> {
        match (self.phase, event) {
            (Phase::Idle, CampaignEvent::StartSimulation { total_budget }) => {
                if *total_budget <= Decimal::ZERO {
                    return Err(CampaignError::GuardNotSatisfied(Guard::NonPositiveBudget));
                }
                self.context = CampaignContext::new(self.context.config.clone(), *total_budget);
                self.phase = Phase::StrategySession;
                Ok(())
            }
            (Phase::StrategySession, CampaignEvent::SetStrategy(strategy)) => {
                self.context.strategy = strategy.clone();
                Ok(())
            }
            (Phase::StrategySession, CampaignEvent::CompleteStrategySession) => {
                check_strategy(&self.context.strategy)?;
                self.enter_quarter(Quarter::Q1);
                Ok(())
            }
            (Phase::Quarter(q), CampaignEvent::AddTactic(tactic)) => {
                validate_tactic(tactic)?;
                let ctx = &mut self.context;
                let data = quarter_mut(&mut ctx.quarters, q)?;
                if data.tactics.iter().any(|t| t.id == tactic.id) {
                    return Err(CampaignError::DuplicateTactic(tactic.id.clone()));
                }
                data.tactics.push(tactic.clone());
                data.budget_spent += tactic.cost;
                data.time_spent = data.time_spent.saturating_add(tactic.time_required);
                ctx.remaining_budget -= tactic.cost;
                if ctx.remaining_budget < Decimal::ZERO {
                    warn!(quarter = %q, remaining = %ctx.remaining_budget, "budget overspent");
                }
                Ok(())
            }
            (Phase::Quarter(q), CampaignEvent::RemoveTactic(id)) => {
                let ctx = &mut self.context;
                let data = quarter_mut(&mut ctx.quarters, q)?;
                let pos = data
                    .tactics
                    .iter()
                    .position(|t| &t.id == id)
                    .ok_or_else(|| CampaignError::NotFound(Missing::Tactic(id.clone())))?;
                let tactic = data.tactics.remove(pos);
                data.budget_spent -= tactic.cost;
                data.time_spent = data.time_spent.saturating_sub(tactic.time_required);
                ctx.remaining_budget += tactic.cost;
                Ok(())
            }
            (Phase::Quarter(q), CampaignEvent::TriggerWildcard(wildcard)) => {
                validate_wildcard(wildcard)?;
                let ctx = &mut self.context;
                let capacity = ctx.config.quarter_time_capacity;
                let data = quarter_mut(&mut ctx.quarters, q)?;
                if data.wildcard_mut(&wildcard.id).is_some() {
                    return Err(CampaignError::DuplicateWildcard(wildcard.id.clone()));
                }
                let room = data.headroom(ctx.remaining_budget, capacity, None);
                if !wildcard.cheapest().is_some_and(|c| room.covers(c)) {
                    return Err(CampaignError::GuardNotSatisfied(Guard::NoAffordableChoice(
                        wildcard.id.clone(),
                    )));
                }
                data.wildcard_events.push(WildcardRecord::new(q, wildcard.clone()));
                Ok(())
            }
            (Phase::Quarter(q), CampaignEvent::RespondToWildcard { event_id, choice_id }) => {
                let ctx = &mut self.context;
                let capacity = ctx.config.quarter_time_capacity;
                let data = quarter_mut(&mut ctx.quarters, q)?;
                let idx = data
                    .wildcard_events
                    .iter()
                    .position(|r| &r.event.id == event_id)
                    .ok_or_else(|| CampaignError::NotFound(Missing::Wildcard(event_id.clone())))?;
                let record = &data.wildcard_events[idx];
                if record.response.is_some() {
                    return Err(CampaignError::AlreadyResolved(event_id.clone()));
                }
                let choice = record.event.choice(choice_id).cloned().ok_or_else(|| {
                    CampaignError::NotFound(Missing::Choice {
                        event: event_id.clone(),
                        choice: choice_id.clone(),
                    })
                })?;
                if choice.cost > ctx.remaining_budget {
                    return Err(CampaignError::GuardNotSatisfied(Guard::BudgetExceeded(
                        choice.cost - ctx.remaining_budget,
                    )));
                }
                let hours = data.time_spent.saturating_add(choice.time_required);
                if hours > capacity {
                    return Err(CampaignError::GuardNotSatisfied(Guard::TimeExceeded {
                        spent: hours,
                        capacity,
                    }));
                }
                if !data
                    .headroom(ctx.remaining_budget, capacity, Some(event_id))
                    .covers(&choice)
                {
                    return Err(CampaignError::GuardNotSatisfied(Guard::StrandsOpenWildcard));
                }
                data.wildcard_events[idx].response = Some(choice_id.clone());
                data.budget_spent += choice.cost;
                data.time_spent = hours;
                ctx.remaining_budget -= choice.cost;
                ctx.wildcard_history.push(WildcardOutcome {
                    quarter: q,
                    event_id: event_id.clone(),
                    choice_id: choice_id.clone(),
                });
                Ok(())
            }
            (Phase::Quarter(q), CampaignEvent::ApplyWildcardImpact(event_id)) => {
                let ctx = &mut self.context;
                let data = quarter_mut(&mut ctx.quarters, q)?;
                let record = data
                    .wildcard_mut(event_id)
                    .ok_or_else(|| CampaignError::NotFound(Missing::Wildcard(event_id.clone())))?;
                if record.impact_applied {
                    return Err(CampaignError::GuardNotSatisfied(
                        Guard::ImpactAlreadyApplied(event_id.clone()),
                    ));
                }
                let (morale, equity) = match record.chosen() {
                    Some(c) => (c.morale.unwrap_or(0.0), c.brand_equity.unwrap_or(0.0)),
                    None => {
                        return Err(CampaignError::GuardNotSatisfied(Guard::AwaitingResponse(
                            event_id.clone(),
                        )))
                    }
                };
                record.impact_applied = true;
                ctx.morale = clamp_percent(ctx.morale + morale);
                ctx.brand_equity = clamp_percent(ctx.brand_equity + equity);
                Ok(())
            }
            (Phase::Quarter(q), CampaignEvent::CompleteQuarter(requested)) => {
                if *requested != q {
                    return Err(CampaignError::GuardNotSatisfied(Guard::QuarterMismatch {
                        current: q,
                        requested: *requested,
                    }));
                }
                let ctx = &mut self.context;
                if ctx.remaining_budget < Decimal::ZERO {
                    return Err(CampaignError::GuardNotSatisfied(Guard::BudgetExceeded(
                        -ctx.remaining_budget,
                    )));
                }
                let capacity = ctx.config.quarter_time_capacity;
                let data = quarter_mut(&mut ctx.quarters, q)?;
                if data.time_spent > capacity {
                    return Err(CampaignError::GuardNotSatisfied(Guard::TimeExceeded {
                        spent: data.time_spent,
                        capacity,
                    }));
                }
                if let Some(pending) = data.wildcard_events.iter().find(|r| r.response.is_none()) {
                    return Err(CampaignError::GuardNotSatisfied(Guard::AwaitingResponse(
                        pending.event.id.clone(),
                    )));
                }
                let results = quarter_results(data);
                data.results = Some(results.clone());
                ctx.kpis = ctx.kpis.fold(&results);
                info!(
                    quarter = %q,
                    revenue = %results.revenue,
                    profit = %results.profit,
                    remaining = %ctx.remaining_budget,
                    "quarter complete"
                );
                match q.next() {
                    Some(next) => self.enter_quarter(next),
                    None => self.enter_debrief()?,
                }
                Ok(())
            }
            (Phase::Debrief, CampaignEvent::CompleteDebrief) => {
                self.phase = Phase::Completed;
                Ok(())
            }
            (Phase::Completed, CampaignEvent::RestartSimulation) => {
                *self = Campaign::new(self.context.config.clone())?;
                Ok(())
            }
            (phase, event) => Err(CampaignError::EventNotAccepted {
                phase,
                event: event.name(),
            }),
        }
    }

    fn enter_quarter(&mut self, quarter: Quarter) {
        self.context.quarters.push(QuarterData::new(quarter));
        self.phase = Phase::Quarter(quarter);
    }

    fn enter_debrief(&mut self) -> Result<(), CampaignError> {
        let ctx = &self.context;
        let input = DebriefInput {
            kpis: ctx.kpis.clone(),
            morale: ctx.morale,
            brand_equity: ctx.brand_equity,
            total_budget: ctx.total_budget,
            remaining_budget: ctx.remaining_budget,
        };
        let results = final_results(&input, &ctx.config.scoring)?;
        info!(score = results.score, grade = %results.grade, "debrief ready");
        self.context.final_results = Some(results);
        self.phase = Phase::Debrief;
        Ok(())
    }
}

impl Default for Campaign {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            context: CampaignContext::new(CampaignConfig::default(), Decimal::ZERO),
        }
    }
}

fn check_strategy(strategy: &StrategyConfig) -> Result<(), CampaignError> {
    let is_set = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.trim().is_empty());
    if !is_set(&strategy.target_audience) {
        return Err(CampaignError::GuardNotSatisfied(Guard::MissingTargetAudience));
    }
    if !is_set(&strategy.brand_positioning) {
        return Err(CampaignError::GuardNotSatisfied(Guard::MissingBrandPositioning));
    }
    if strategy.primary_channels.is_empty() {
        return Err(CampaignError::GuardNotSatisfied(Guard::NoPrimaryChannel));
    }
    Ok(())
}

fn quarter_mut(
    quarters: &mut [QuarterData],
    q: Quarter,
) -> Result<&mut QuarterData, CampaignError> {
    quarters
        .iter_mut()
        .find(|d| d.quarter == q)
        .ok_or(CampaignError::NotFound(Missing::Quarter(q)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mix_core::{Channel, Choice, ChoiceId, Impact, Tactic, TacticId, WildcardEvent, WildcardId};
    use proptest::prelude::*;

    fn money(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn tactic(id: &str, cost: i64, revenue: i64) -> Tactic {
        Tactic {
            id: TacticId(id.to_string()),
            name: format!("Tactic {id}"),
            description: String::new(),
            channel: Some(Channel::Digital),
            cost: money(cost),
            time_required: 40,
            expected_impact: Impact {
                revenue: money(revenue),
                market_share: 1.0,
                customer_satisfaction: 0.5,
                brand_awareness: 2.0,
            },
        }
    }

    fn wildcard(id: &str, morale: f64, equity: f64) -> WildcardEvent {
        WildcardEvent {
            id: WildcardId(id.to_string()),
            title: "Competitor price war".to_string(),
            description: String::new(),
            choices: vec![
                Choice {
                    id: ChoiceId("match".to_string()),
                    label: "Match prices".to_string(),
                    cost: money(20_000),
                    time_required: 20,
                    impact: Impact {
                        revenue: money(-10_000),
                        market_share: 2.0,
                        ..Impact::default()
                    },
                    morale: Some(morale),
                    brand_equity: Some(equity),
                },
                Choice {
                    id: ChoiceId("hold".to_string()),
                    label: "Hold prices".to_string(),
                    cost: Decimal::ZERO,
                    time_required: 0,
                    impact: Impact {
                        market_share: -1.0,
                        ..Impact::default()
                    },
                    morale: None,
                    brand_equity: None,
                },
            ],
        }
    }

    fn priced_wildcard(id: &str, choices: &[(&str, i64, u32)]) -> WildcardEvent {
        WildcardEvent {
            id: WildcardId(id.to_string()),
            title: format!("Wildcard {id}"),
            description: String::new(),
            choices: choices
                .iter()
                .map(|&(choice, cost, hours)| Choice {
                    id: ChoiceId(choice.to_string()),
                    label: choice.to_string(),
                    cost: money(cost),
                    time_required: hours,
                    impact: Impact::default(),
                    morale: None,
                    brand_equity: None,
                })
                .collect(),
        }
    }

    fn recall() -> WildcardEvent {
        priced_wildcard("recall", &[("transparent", 90_000, 60), ("quiet", 30_000, 30)])
    }

    fn respond(event: &str, choice: &str) -> CampaignEvent {
        CampaignEvent::RespondToWildcard {
            event_id: WildcardId(event.to_string()),
            choice_id: ChoiceId(choice.to_string()),
        }
    }

    fn strategy() -> StrategyConfig {
        StrategyConfig {
            target_audience: Some("Urban professionals 25-40".to_string()),
            brand_positioning: Some("Premium but approachable".to_string()),
            primary_channels: vec![Channel::Digital, Channel::Social],
            ..StrategyConfig::default()
        }
    }

    fn run(c: Campaign, events: &[CampaignEvent]) -> Campaign {
        events
            .iter()
            .fold(c, |c, e| c.transition(e).expect("transition"))
    }

    fn in_q1(budget: i64) -> Campaign {
        run(
            Campaign::default(),
            &[
                CampaignEvent::StartSimulation {
                    total_budget: money(budget),
                },
                CampaignEvent::SetStrategy(strategy()),
                CampaignEvent::CompleteStrategySession,
            ],
        )
    }

    #[test]
    fn strategy_guard_blocks_incomplete_session() {
        let c = run(
            Campaign::default(),
            &[CampaignEvent::StartSimulation {
                total_budget: money(1_000_000),
            }],
        );
        let err = c
            .transition(&CampaignEvent::CompleteStrategySession)
            .unwrap_err();
        assert_eq!(
            err,
            CampaignError::GuardNotSatisfied(Guard::MissingTargetAudience)
        );
        assert_eq!(c.phase(), Phase::StrategySession);

        let partial = StrategyConfig {
            primary_channels: vec![],
            ..strategy()
        };
        let c = c
            .transition(&CampaignEvent::SetStrategy(partial))
            .unwrap();
        assert_eq!(
            c.transition(&CampaignEvent::CompleteStrategySession),
            Err(CampaignError::GuardNotSatisfied(Guard::NoPrimaryChannel))
        );
        let blank = StrategyConfig {
            brand_positioning: Some("   ".to_string()),
            ..strategy()
        };
        let c = c.transition(&CampaignEvent::SetStrategy(blank)).unwrap();
        assert_eq!(
            c.transition(&CampaignEvent::CompleteStrategySession),
            Err(CampaignError::GuardNotSatisfied(Guard::MissingBrandPositioning))
        );
    }

    #[test]
    fn zero_budget_cannot_start() {
        let err = Campaign::default()
            .transition(&CampaignEvent::StartSimulation {
                total_budget: Decimal::ZERO,
            })
            .unwrap_err();
        assert_eq!(err, CampaignError::GuardNotSatisfied(Guard::NonPositiveBudget));
    }

    #[test]
    fn first_quarter_tactic_moves_revenue_and_budget_exactly() {
        let c = in_q1(2_000_000);
        assert_eq!(c.phase(), Phase::Quarter(Quarter::Q1));
        let before_revenue = c.context().kpis.revenue;
        let c = run(
            c,
            &[
                CampaignEvent::AddTactic(tactic("search-ads", 75_000, 150_000)),
                CampaignEvent::CompleteQuarter(Quarter::Q1),
            ],
        );
        assert_eq!(c.phase(), Phase::Quarter(Quarter::Q2));
        assert_eq!(c.context().kpis.revenue - before_revenue, money(150_000));
        assert_eq!(c.context().remaining_budget, money(1_925_000));
        let q1 = c.context().quarter(Quarter::Q1).unwrap();
        assert_eq!(q1.results.as_ref().unwrap().profit, money(75_000));
    }

    #[test]
    fn add_then_remove_restores_budget() {
        let c = in_q1(500_000);
        let before = c.context().remaining_budget;
        let c = run(
            c,
            &[
                CampaignEvent::AddTactic(tactic("influencers", 33_333, 50_000)),
                CampaignEvent::RemoveTactic(TacticId("influencers".to_string())),
            ],
        );
        assert_eq!(c.context().remaining_budget, before);
        let q1 = c.context().quarter(Quarter::Q1).unwrap();
        assert!(q1.tactics.is_empty());
        assert_eq!(q1.budget_spent, Decimal::ZERO);
        assert_eq!(q1.time_spent, 0);
    }

    #[test]
    fn referential_misses_are_reported() {
        let c = in_q1(500_000);
        assert_eq!(
            c.transition(&CampaignEvent::RemoveTactic(TacticId("nope".to_string()))),
            Err(CampaignError::NotFound(Missing::Tactic(TacticId(
                "nope".to_string()
            ))))
        );
        let c = c
            .transition(&CampaignEvent::TriggerWildcard(wildcard("war", 0.0, 0.0)))
            .unwrap();
        assert!(matches!(
            c.transition(&CampaignEvent::RespondToWildcard {
                event_id: WildcardId("war".to_string()),
                choice_id: ChoiceId("surrender".to_string()),
            }),
            Err(CampaignError::NotFound(Missing::Choice { .. }))
        ));
        assert!(matches!(
            c.transition(&CampaignEvent::ApplyWildcardImpact(WildcardId(
                "ghost".to_string()
            ))),
            Err(CampaignError::NotFound(Missing::Wildcard(_)))
        ));
    }

    #[test]
    fn duplicate_tactic_is_refused() {
        let c = in_q1(500_000);
        let c = c
            .transition(&CampaignEvent::AddTactic(tactic("tv-spot", 1_000, 2_000)))
            .unwrap();
        assert!(matches!(
            c.transition(&CampaignEvent::AddTactic(tactic("tv-spot", 1_000, 2_000))),
            Err(CampaignError::DuplicateTactic(_))
        ));
    }

    #[test]
    fn wildcard_lifecycle() {
        let c = in_q1(1_000_000);
        let id = WildcardId("war".to_string());
        let c = c
            .transition(&CampaignEvent::TriggerWildcard(wildcard("war", -10.0, 5.0)))
            .unwrap();
        assert_eq!(
            c.context().quarter(Quarter::Q1).unwrap().wildcard_events[0].quarter,
            Quarter::Q1
        );
        // Cannot apply or complete before responding.
        assert_eq!(
            c.transition(&CampaignEvent::ApplyWildcardImpact(id.clone())),
            Err(CampaignError::GuardNotSatisfied(Guard::AwaitingResponse(
                id.clone()
            )))
        );
        assert_eq!(
            c.transition(&CampaignEvent::CompleteQuarter(Quarter::Q1)),
            Err(CampaignError::GuardNotSatisfied(Guard::AwaitingResponse(
                id.clone()
            )))
        );
        let c = run(
            c,
            &[
                CampaignEvent::RespondToWildcard {
                    event_id: id.clone(),
                    choice_id: ChoiceId("match".to_string()),
                },
                CampaignEvent::ApplyWildcardImpact(id.clone()),
            ],
        );
        assert_eq!(c.context().remaining_budget, money(980_000));
        assert_eq!(c.context().morale, 65.0);
        assert_eq!(c.context().brand_equity, 55.0);
        assert_eq!(c.context().wildcard_history.len(), 1);
        assert_eq!(
            c.transition(&CampaignEvent::RespondToWildcard {
                event_id: id.clone(),
                choice_id: ChoiceId("hold".to_string()),
            }),
            Err(CampaignError::AlreadyResolved(id.clone()))
        );
        assert_eq!(
            c.transition(&CampaignEvent::ApplyWildcardImpact(id.clone())),
            Err(CampaignError::GuardNotSatisfied(
                Guard::ImpactAlreadyApplied(id.clone())
            ))
        );
        let share_before = c.context().kpis.market_share;
        let c = c
            .transition(&CampaignEvent::CompleteQuarter(Quarter::Q1))
            .unwrap();
        assert_eq!(c.context().kpis.market_share, share_before + 2.0);
        assert_eq!(c.context().kpis.revenue, money(-10_000));
    }

    #[test]
    fn quarter_guard_checks_identity_budget_and_time() {
        let c = in_q1(100_000);
        assert_eq!(
            c.transition(&CampaignEvent::CompleteQuarter(Quarter::Q3)),
            Err(CampaignError::GuardNotSatisfied(Guard::QuarterMismatch {
                current: Quarter::Q1,
                requested: Quarter::Q3,
            }))
        );
        let over = c
            .transition(&CampaignEvent::AddTactic(tactic("superbowl", 150_000, 400_000)))
            .unwrap();
        assert_eq!(over.context().remaining_budget, money(-50_000));
        assert_eq!(
            over.transition(&CampaignEvent::CompleteQuarter(Quarter::Q1)),
            Err(CampaignError::GuardNotSatisfied(Guard::BudgetExceeded(money(
                50_000
            ))))
        );
        let mut busy = c.clone();
        for i in 0..13 {
            busy = busy
                .transition(&CampaignEvent::AddTactic(tactic(&format!("t{i}"), 10, 10)))
                .unwrap();
        }
        assert_eq!(
            busy.transition(&CampaignEvent::CompleteQuarter(Quarter::Q1)),
            Err(CampaignError::GuardNotSatisfied(Guard::TimeExceeded {
                spent: 520,
                capacity: 480,
            }))
        );
    }

    #[test]
    fn wildcard_without_affordable_choice_is_refused() {
        let c = run(
            in_q1(100_000),
            &[
                CampaignEvent::AddTactic(tactic("billboards", 90_000, 120_000)),
                CampaignEvent::CompleteQuarter(Quarter::Q1),
            ],
        );
        assert_eq!(c.context().remaining_budget, money(10_000));
        assert_eq!(
            c.transition(&CampaignEvent::TriggerWildcard(recall())),
            Err(CampaignError::GuardNotSatisfied(Guard::NoAffordableChoice(
                WildcardId("recall".to_string())
            )))
        );
        // The refused event leaves nothing open, so the quarter can close.
        let c = c
            .transition(&CampaignEvent::CompleteQuarter(Quarter::Q2))
            .unwrap();
        assert_eq!(c.phase(), Phase::Quarter(Quarter::Q3));
    }

    #[test]
    fn response_must_fit_remaining_budget() {
        let c = run(
            in_q1(100_000),
            &[
                CampaignEvent::TriggerWildcard(recall()),
                CampaignEvent::AddTactic(tactic("billboards", 90_000, 120_000)),
            ],
        );
        assert_eq!(
            c.transition(&respond("recall", "quiet")),
            Err(CampaignError::GuardNotSatisfied(Guard::BudgetExceeded(money(
                20_000
            ))))
        );
        // Dropping the tactic frees enough to answer and close the quarter.
        let c = run(
            c,
            &[
                CampaignEvent::RemoveTactic(TacticId("billboards".to_string())),
                respond("recall", "quiet"),
                CampaignEvent::CompleteQuarter(Quarter::Q1),
            ],
        );
        assert_eq!(c.phase(), Phase::Quarter(Quarter::Q2));
        assert_eq!(c.context().remaining_budget, money(70_000));
    }

    #[test]
    fn response_must_fit_quarter_hours() {
        let c = run(
            in_q1(1_000_000),
            &[
                CampaignEvent::TriggerWildcard(priced_wildcard(
                    "crunch",
                    &[("overtime", 0, 470)],
                )),
                CampaignEvent::AddTactic(tactic("webinar", 5_000, 10_000)),
            ],
        );
        assert_eq!(
            c.transition(&respond("crunch", "overtime")),
            Err(CampaignError::GuardNotSatisfied(Guard::TimeExceeded {
                spent: 510,
                capacity: 480,
            }))
        );
        let c = run(
            c,
            &[
                CampaignEvent::RemoveTactic(TacticId("webinar".to_string())),
                respond("crunch", "overtime"),
                CampaignEvent::CompleteQuarter(Quarter::Q1),
            ],
        );
        assert_eq!(c.context().quarter(Quarter::Q1).unwrap().time_spent, 470);
    }

    #[test]
    fn open_wildcards_keep_an_affordable_answer() {
        let c = run(
            in_q1(50_000),
            &[
                CampaignEvent::TriggerWildcard(priced_wildcard(
                    "launch-delay",
                    &[("deluxe", 40_000, 10), ("basic", 20_000, 10)],
                )),
                CampaignEvent::TriggerWildcard(priced_wildcard(
                    "press-leak",
                    &[("statement", 20_000, 10)],
                )),
            ],
        );
        assert_eq!(
            c.transition(&CampaignEvent::TriggerWildcard(priced_wildcard(
                "outage",
                &[("refund", 20_000, 0)],
            ))),
            Err(CampaignError::GuardNotSatisfied(Guard::NoAffordableChoice(
                WildcardId("outage".to_string())
            )))
        );
        assert_eq!(
            c.transition(&respond("launch-delay", "deluxe")),
            Err(CampaignError::GuardNotSatisfied(Guard::StrandsOpenWildcard))
        );
        let c = run(
            c,
            &[
                respond("launch-delay", "basic"),
                respond("press-leak", "statement"),
                CampaignEvent::CompleteQuarter(Quarter::Q1),
            ],
        );
        assert_eq!(c.phase(), Phase::Quarter(Quarter::Q2));
        assert_eq!(c.context().remaining_budget, money(10_000));
    }

    #[test]
    fn four_quarters_reach_debrief_then_restart() {
        let mut c = in_q1(2_000_000);
        for q in Quarter::ALL {
            assert!(c.final_results().is_none());
            c = run(
                c,
                &[
                    CampaignEvent::AddTactic(tactic(&format!("{q}-push"), 300_000, 700_000)),
                    CampaignEvent::CompleteQuarter(q),
                ],
            );
        }
        assert_eq!(c.phase(), Phase::Debrief);
        let results = c.final_results().expect("final results in debrief");
        assert_eq!(results.kpis.revenue, money(2_800_000));
        assert_eq!(results.kpis.profit, money(1_600_000));
        assert_eq!(c.context().quarters.len(), 4);
        assert!(c
            .context()
            .quarters
            .iter()
            .all(|q| q.results.is_some()));

        assert!(matches!(
            c.transition(&CampaignEvent::RestartSimulation),
            Err(CampaignError::EventNotAccepted { .. })
        ));
        let done = c.transition(&CampaignEvent::CompleteDebrief).unwrap();
        assert_eq!(done.phase(), Phase::Completed);
        assert_eq!(done.final_results(), c.final_results());
        let idle = done.transition(&CampaignEvent::RestartSimulation).unwrap();
        assert_eq!(idle.phase(), Phase::Idle);
        assert_eq!(idle, Campaign::default());
    }

    #[test]
    fn events_outside_their_phase_are_rejected() {
        let idle = Campaign::default();
        assert_eq!(
            idle.transition(&CampaignEvent::AddTactic(tactic("x", 1, 1))),
            Err(CampaignError::EventNotAccepted {
                phase: Phase::Idle,
                event: "ADD_TACTIC",
            })
        );
        let q1 = in_q1(10_000);
        assert!(matches!(
            q1.transition(&CampaignEvent::SetStrategy(strategy())),
            Err(CampaignError::EventNotAccepted { .. })
        ));
    }

    #[test]
    fn snapshot_serializes() {
        let c = in_q1(250_000);
        let s = serde_json::to_string(&c).unwrap();
        let back: Campaign = serde_json::from_str(&s).unwrap();
        assert_eq!(back, c);
    }

    proptest! {
        #[test]
        fn morale_and_equity_stay_clamped(
            deltas in proptest::collection::vec((-1000.0f64..=1000.0, -1000.0f64..=1000.0), 1..6)
        ) {
            let mut c = in_q1(10_000_000);
            for (i, (m, e)) in deltas.iter().enumerate() {
                let id = format!("w{i}");
                c = run(c, &[
                    CampaignEvent::TriggerWildcard(wildcard(&id, *m, *e)),
                    CampaignEvent::RespondToWildcard {
                        event_id: WildcardId(id.clone()),
                        choice_id: ChoiceId("match".to_string()),
                    },
                    CampaignEvent::ApplyWildcardImpact(WildcardId(id)),
                ]);
                prop_assert!((0.0..=100.0).contains(&c.context().morale));
                prop_assert!((0.0..=100.0).contains(&c.context().brand_equity));
            }
        }

        #[test]
        fn extreme_deltas_pin_to_bounds(up in proptest::bool::ANY) {
            let d = if up { 1000.0 } else { -1000.0 };
            let c = run(in_q1(1_000_000), &[
                CampaignEvent::TriggerWildcard(wildcard("w", d, d)),
                CampaignEvent::RespondToWildcard {
                    event_id: WildcardId("w".to_string()),
                    choice_id: ChoiceId("match".to_string()),
                },
                CampaignEvent::ApplyWildcardImpact(WildcardId("w".to_string())),
            ]);
            let expected = if up { 100.0 } else { 0.0 };
            prop_assert_eq!(c.context().morale, expected);
            prop_assert_eq!(c.context().brand_equity, expected);
        }
    }
}
