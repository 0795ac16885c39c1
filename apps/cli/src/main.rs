#![deny(warnings)]

//! Headless CLI: forecast a channel plan and play a scripted campaign.

mod scenario;

use anyhow::{Context, Result};
use catalog::Catalog;
use chrono::NaiveDate;
use mix_campaign::CampaignEvent;
use mix_core::Quarter;
use persistence::SaveStore;
use scenario::{forecast, play_campaign, Scenario, DEFAULT_SCENARIO};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    catalog: Option<PathBuf>,
    seed: Option<u64>,
    out: Option<PathBuf>,
    player: Option<String>,
    date: Option<NaiveDate>,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next().map(PathBuf::from),
            "--catalog" => args.catalog = it.next().map(PathBuf::from),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--out" => args.out = it.next().map(PathBuf::from),
            "--player" => args.player = it.next(),
            "--date" => {
                args.date = it
                    .next()
                    .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            }
            "--version" => args.version = true,
            _ => {}
        }
    }
    args
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .init();

    let args = parse_args();
    if args.version {
        println!(
            "mix-sim {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(scenario = ?args.scenario, seed = ?args.seed, "starting CLI");

    let mut scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::parse(DEFAULT_SCENARIO)?,
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    let catalog = match &args.catalog {
        Some(dir) => Catalog::load_dir(dir)
            .with_context(|| format!("loading catalog from {}", dir.display()))?,
        None => Catalog::builtin()?,
    };

    println!(
        "Scenario: {} | industry: {:?} | budget: ${} | seed: {}",
        scenario.name, scenario.strategy.industry, scenario.total_budget, scenario.seed
    );

    let history = forecast(&scenario)?;
    for (quarter, state) in Quarter::ALL.iter().zip(&history) {
        let o = &state.output;
        println!(
            "Forecast {} | total: ${:.0} | base: ${:.0} | incremental: ${:.0} | traffic: {:.0} | conversions: {:.1}",
            quarter,
            o.total_sales,
            o.base_sales,
            o.incremental_sales,
            o.total_traffic,
            o.conversions
        );
    }

    let campaign = play_campaign(&scenario, &catalog)?;
    let ctx = campaign.context();
    for q in &ctx.quarters {
        if let Some(r) = &q.results {
            println!(
                "Campaign {} | tactics: {} | spent: ${} | hours: {} | revenue: ${} | profit: ${}",
                q.quarter,
                q.tactics.len(),
                q.budget_spent,
                q.time_spent,
                r.revenue,
                r.profit
            );
        }
    }
    let results = campaign
        .final_results()
        .context("campaign ended without a debrief")?;
    println!(
        "Debrief | score: {:.1} | grade: {} | revenue: ${} | share: {:.1}% | satisfaction: {:.1} | awareness: {:.1} | morale: {:.0} | brand equity: {:.0}",
        results.score,
        results.grade,
        results.kpis.revenue,
        results.kpis.market_share,
        results.kpis.customer_satisfaction,
        results.kpis.brand_awareness,
        results.morale,
        results.brand_equity
    );
    for rec in &results.recommendations {
        println!("  - {rec}");
    }

    if let Some(out) = &args.out {
        let store = SaveStore::new(out);
        let path = store.save("latest", &campaign)?;
        println!("Snapshot written to {}", path.display());
        if let (Some(player), Some(date)) = (&args.player, args.date) {
            let entry = store.submit(player, date, &campaign)?;
            println!("Leaderboard entry {} for {}", entry.fingerprint, entry.player);
        }
    }

    let done = campaign.transition(&CampaignEvent::CompleteDebrief)?;
    info!(phase = %done.phase(), "campaign finished");
    Ok(())
}
