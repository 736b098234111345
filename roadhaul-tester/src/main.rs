mod common;
mod logic;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use common::{OutputTarget, parse_seeds, split_csv};
use logic::{
    FileStorage, GameplayStrategy, RunRecord, SimulationConfig, run_simulation,
    write_console_report, write_json_report, write_markdown_report,
};
use roadhaul_game::{EmbeddedData, GameEngine, MemoryStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "roadhaul-tester", version)]
#[command(about = "Headless autopilot runs for Roadhaul: drives sessions with scripted strategies")]
struct Args {
    /// Strategies to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// Seeds to run (comma-separated, decimal or 0x hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Runs per seed; iteration i uses seed + i
    #[arg(long, default_value_t = 1)]
    iterations: u64,

    /// Ticks simulated per run
    #[arg(long, default_value_t = 20_000)]
    max_ticks: u32,

    /// Seconds per simulated tick
    #[arg(long, default_value_t = 0.25)]
    tick: f32,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Persist each run's saves under this directory instead of in memory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.tick <= 0.0 || !args.tick.is_finite() {
        bail!("--tick must be a positive number of seconds");
    }
    let strategies = parse_strategies(&args.strategies)?;
    let seeds = parse_seeds(&split_csv(&args.seeds))?;

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let start_time = Instant::now();
    let records = run_all(&args, &strategies, &seeds)?;

    let mut out = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Console => write_console_report(&mut out, &records, start_time.elapsed())?,
        ReportFormat::Json => write_json_report(&mut out, &records)?,
        ReportFormat::Markdown => write_markdown_report(&mut out, &records)?,
    }
    out.flush()?;

    if records.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn announce_banner() {
    println!("{}", "🚚 Roadhaul Autopilot Tester".bright_cyan().bold());
    println!("{}", "============================".cyan());
}

fn parse_strategies(raw: &str) -> Result<Vec<GameplayStrategy>> {
    let tokens = split_csv(raw);
    if tokens.is_empty() {
        bail!("at least one strategy is required");
    }
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(GameplayStrategy::ALL.to_vec());
    }
    let mut strategies = Vec::new();
    for token in &tokens {
        let strategy = GameplayStrategy::from_str(token, true)
            .map_err(|_| anyhow!("unknown strategy: {token}"))?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    Ok(strategies)
}

fn run_all(args: &Args, strategies: &[GameplayStrategy], seeds: &[u64]) -> Result<Vec<RunRecord>> {
    let mut records = Vec::new();
    for &strategy in strategies {
        for &base in seeds {
            for i in 0..args.iterations.max(1) {
                let seed = base.wrapping_add(i);
                let config = SimulationConfig::new(strategy, seed)
                    .with_max_ticks(args.max_ticks)
                    .with_dt(args.tick);
                let record = run_one(args.save_dir.as_ref(), &config)?;
                if args.report == ReportFormat::Console {
                    let mark = if record.passed() {
                        "✅".green()
                    } else {
                        "❌".red()
                    };
                    println!(
                        "{mark} {strategy} seed {seed}: {} deliveries in {}ms",
                        record.deliveries, record.elapsed_ms
                    );
                }
                records.push(record);
            }
        }
    }
    Ok(records)
}

/// Each run gets fresh storage so results do not depend on run order.
fn run_one(save_dir: Option<&PathBuf>, config: &SimulationConfig) -> Result<RunRecord> {
    if let Some(dir) = save_dir {
        let run_dir = dir.join(format!(
            "{}-{}",
            config.strategy.label().to_lowercase(),
            config.seed
        ));
        let storage = FileStorage::new(&run_dir)
            .with_context(|| format!("failed to prepare {}", run_dir.display()))?;
        run_simulation(&GameEngine::new(EmbeddedData, storage), config)
    } else {
        run_simulation(
            &GameEngine::new(EmbeddedData, MemoryStorage::default()),
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_parse_case_insensitively() {
        assert_eq!(
            parse_strategies("greedy, CAUTIOUS,greedy").unwrap(),
            vec![GameplayStrategy::Greedy, GameplayStrategy::Cautious]
        );
        assert_eq!(parse_strategies("all").unwrap().len(), 3);
        assert!(parse_strategies("reckless").is_err());
        assert!(parse_strategies(" , ").is_err());
    }

    #[test]
    fn args_defaults() {
        let args = Args::parse_from(["roadhaul-tester"]);
        assert_eq!(args.seeds, "1337");
        assert_eq!(args.iterations, 1);
        assert_eq!(args.max_ticks, 20_000);
        assert_eq!(args.report, ReportFormat::Console);
        assert!(args.save_dir.is_none());
    }

    #[test]
    fn iterations_offset_seeds() {
        let args = Args::parse_from([
            "roadhaul-tester",
            "--iterations",
            "2",
            "--max-ticks",
            "50",
            "--report",
            "json",
        ]);
        let records = run_all(&args, &[GameplayStrategy::Greedy], &[10]).unwrap();
        let seeds: Vec<u64> = records.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![10, 11]);
    }
}
