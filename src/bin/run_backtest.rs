//! Прогон MA Crossover по свечам из JSON файла
//! Конфиг бэктеста и стратегии в YAML, журнал сделок можно выгрузить в JSON

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;

use kline_backtest::backtest::{BacktestConfig, BacktestEngine};
use kline_backtest::models::Bar;
use kline_backtest::risk::DailyLossGuard;
use kline_backtest::strategy::{MaCrossoverConfig, MaCrossoverStrategy};
use kline_backtest::utils::logging::init_logging;

#[derive(Parser)]
#[command(name = "run-backtest", about = "Replay OHLCV bars through the MA crossover strategy")]
struct Args {
    /// JSON array of bars: {timestamp, open, high, low, close, volume}
    #[arg(short, long)]
    bars: PathBuf,

    /// Backtest config (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Strategy parameters (YAML); defaults are used when omitted
    #[arg(short, long)]
    strategy: Option<PathBuf>,

    /// Write the trade ledger here as JSON
    #[arg(short, long)]
    trades_out: Option<PathBuf>,

    /// Print the flat summary as JSON to stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = BacktestConfig::from_yaml_file(&args.config)
        .with_context(|| format!("loading backtest config {}", args.config.display()))?;

    let strategy_config = match &args.strategy {
        Some(path) => {
            let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str::<MaCrossoverConfig>(&raw)
                .with_context(|| format!("parsing strategy config {}", path.display()))?
        }
        None => MaCrossoverConfig::default(),
    };
    let strategy = MaCrossoverStrategy::new(strategy_config).context("invalid strategy config")?;

    let raw = fs::read_to_string(&args.bars).with_context(|| format!("reading {}", args.bars.display()))?;
    let bars: Vec<Bar> = serde_json::from_str(&raw).with_context(|| format!("parsing bars {}", args.bars.display()))?;
    info!("📊 Loaded {} bars from {}", bars.len(), args.bars.display());

    let risk = DailyLossGuard::new(&config.risk);
    let mut engine = BacktestEngine::new(config, strategy, risk)?;

    let report = match engine.run(&bars) {
        Ok(report) => report,
        Err(e) => {
            // частичный журнал только для диагностики
            log::error!(
                "Run failed ({}), {} trades recorded before the fault",
                e.category(),
                engine.ledger().len()
            );
            return Err(e.into());
        }
    };

    report.summary.log_summary();

    if let Some(path) = &args.trades_out {
        let json = serde_json::to_string_pretty(&report.trades)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("💾 Trade ledger written to {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary.to_key_values())?);
    }

    Ok(())
}
