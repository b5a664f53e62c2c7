#![deny(warnings)]

//! Headless runner: plays one simulation with the autoplayer and prints the
//! quarter-by-quarter KPIs and the final grade.

use anyhow::{Context, Result};
use content::Catalog;
use persistence::MemoryStore;
use sim_core::{QuarterKey, SeededRandom, SimConfig, SimulationContext, StrategyPatch, TacticCategory};
use sim_runtime::Simulation;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    seed: Option<u64>,
    user: Option<String>,
    username: Option<String>,
    config: Option<PathBuf>,
    content: Option<PathBuf>,
    db: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--user" => args.user = it.next(),
            "--username" => args.username = it.next(),
            "--config" => args.config = it.next().map(PathBuf::from),
            "--content" => args.content = it.next().map(PathBuf::from),
            "--db" => args.db = it.next(),
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    args
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.rng_seed = seed;
    }
    Ok(cfg)
}

fn ensure_db_dir(url: &str) -> Result<()> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(parent) = path.and_then(|p| std::path::Path::new(p).parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn print_report(ctx: &SimulationContext) {
    for q in QuarterKey::ALL {
        let data = ctx.quarter(q);
        if let Some(r) = &data.results {
            println!(
                "{} | tactics: {} | spent: ${} | revenue: ${} | profit: ${} | share: {:.1}% | satisfaction: {:.1} | awareness: {:.1}",
                q,
                data.tactics.len(),
                r.budget_spent,
                r.revenue,
                r.profit,
                r.market_share,
                r.customer_satisfaction,
                r.brand_awareness
            );
        }
    }
    if let Some(o) = &ctx.big_bet_outcome {
        println!(
            "Big bet {} | {} (p = {:.2}, roll = {:.2})",
            o.option_id,
            if o.success { "succeeded" } else { "failed" },
            o.success_probability,
            o.roll
        );
    }
    if let Some(f) = &ctx.final_results {
        println!(
            "Final | revenue: ${} | spent: ${} | ROI: {:.1}% | score: {} | grade: {}",
            f.total_revenue, f.total_budget_spent, f.roi, f.overall_score, f.grade
        );
    }
}

async fn persist(url: &str, ctx: &SimulationContext, snapshot: &sim_core::SimulationSnapshot, username: &str) -> Result<()> {
    ensure_db_dir(url)?;
    let pool = persistence::init_db(url).await?;
    persistence::save_snapshot(&pool, snapshot).await?;
    let entry = persistence::submit_leaderboard(&pool, ctx, &ctx.user_id, username).await?;
    info!(simulation = %entry.simulation_id, score = entry.overall_score, "submitted to leaderboard");
    for (rank, row) in persistence::top_scores(&pool, 5).await?.iter().enumerate() {
        println!(
            "#{} {} | score: {} | grade: {} | ROI: {:.1}%",
            rank + 1,
            row.username,
            row.overall_score,
            row.grade,
            row.roi
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("marketing-quarters {} ({})", env!("GIT_SHA"), env!("BUILD_DATE"));
    let args = parse_args();
    let cfg = load_config(&args)?;
    let catalog = match &args.content {
        Some(dir) => Catalog::load_dir(dir).with_context(|| format!("loading content from {}", dir.display()))?,
        None => Catalog::builtin(),
    };
    let user = args.user.clone().unwrap_or_else(|| "local".to_string());
    let username = args.username.clone().unwrap_or_else(|| user.clone());
    info!(seed = cfg.rng_seed, user = %user, tactics = catalog.tactics().len(), "starting autoplay");

    let mut rng = SeededRandom::new(cfg.rng_seed.wrapping_add(1));
    let mut sim = Simulation::new(cfg);
    let strategy = StrategyPatch {
        company_name: Some("Autoplay Co".to_string()),
        primary_channels: Some(vec![TacticCategory::Digital, TacticCategory::Content]),
        ..Default::default()
    };
    sim_ai::autoplay(&mut sim, &catalog, &mut rng, &user, strategy)?;

    let ctx = sim.context().context("simulation has no context after autoplay")?.clone();
    print_report(&ctx);

    match &args.db {
        Some(url) => {
            let snapshot = sim.snapshot().context("simulation has no snapshot")?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(persist(url, &ctx, &snapshot, &username))?;
            sim.finish();
        }
        None => {
            let mut store = MemoryStore::new();
            sim.save(&mut store)?;
            let entry = sim.submit(&mut store, &username)?;
            info!(simulation = %entry.simulation_id, saved = store.len(), "run recorded in memory");
        }
    }
    info!(phase = ?sim.phase(), "done");
    Ok(())
}
