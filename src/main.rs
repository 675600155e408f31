use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::path::PathBuf;
use tracing::info;

use breakwater::application::backtest::BacktestEngine;
use breakwater::application::paper_trader::{PaperTrader, PaperTraderSettings};
use breakwater::application::strategies::BreakoutStrategy;
use breakwater::config::{self, FileConfig, SimulationSettings};
use breakwater::domain::performance::{MonteCarloConfig, MonteCarloEngine};
use breakwater::domain::risk::RiskConfig;
use breakwater::domain::trading::fees::ConstantFeeModel;
use breakwater::infrastructure::csv_feed::{MemoryFeed, load_candles};
use breakwater::infrastructure::persistence::{
    JsonStateStore, TradeLogWriter, write_equity_csv, write_trades_csv,
};
use breakwater::infrastructure::simulation::VolatilitySlippage;

#[derive(Parser)]
#[command(name = "breakwater", about = "Breakout strategy backtester and paper trader")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a candle CSV through the strategy and print performance
    Backtest {
        /// Candle CSV (time,open,high,low,close[,volume])
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = 10_000.0)]
        initial_balance: f64,
        /// TOML run configuration; replaces environment variables
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write closed trades to this CSV
        #[arg(long)]
        trades_out: Option<PathBuf>,
        /// Write the equity curve to this CSV
        #[arg(long)]
        equity_out: Option<PathBuf>,
    },
    /// Simulated live session with slippage, fees, logging and durable state
    Paper {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = 10_000.0)]
        initial_balance: f64,
        #[arg(long)]
        config: Option<PathBuf>,
        /// JSON state snapshot, resumed on restart
        #[arg(long)]
        state_file: Option<PathBuf>,
        /// Append-only CSV log of closed trades
        #[arg(long)]
        trades_log: Option<PathBuf>,
    },
    /// Bootstrap-resample realized trade outcomes for robustness statistics
    MonteCarlo {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = 10_000.0)]
        initial_balance: f64,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 1000)]
        iterations: usize,
    },
}

struct RunConfig {
    risk: RiskConfig,
    strategy: BreakoutStrategy,
    simulation: SimulationSettings,
}

fn resolve_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            let file = FileConfig::load(path)?;
            Ok(RunConfig {
                risk: file.risk,
                strategy: file.strategy,
                simulation: file.simulation,
            })
        }
        None => Ok(RunConfig {
            risk: config::risk_from_env(),
            strategy: config::strategy_from_env(),
            simulation: config::simulation_from_env(),
        }),
    }
}

fn to_balance(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value).context("initial balance must be a finite number")
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Command::Backtest {
            data,
            initial_balance,
            config,
            trades_out,
            equity_out,
        } => {
            let run = resolve_config(config.as_ref())?;
            let candles = load_candles(&data)?;
            let engine = BacktestEngine::new(
                Box::new(run.strategy),
                run.risk,
                to_balance(initial_balance)?,
            )?;
            let report = engine.run(&candles)?;

            if let Some(path) = trades_out {
                write_trades_csv(&path, &report.trades)?;
                info!(path = %path.display(), "Wrote trade list");
            }
            if let Some(path) = equity_out {
                write_equity_csv(&path, &report.equity_curve)?;
                info!(path = %path.display(), "Wrote equity curve");
            }

            println!("{}", report.summary);
        }
        Command::Paper {
            data,
            initial_balance,
            config,
            state_file,
            trades_log,
        } => {
            let run = resolve_config(config.as_ref())?;
            let mut feed = MemoryFeed::from_csv(&data)?;

            let fees = ConstantFeeModel::new(
                Decimal::from_f64(run.simulation.commission_per_unit).unwrap_or(Decimal::ZERO),
                Decimal::from_f64(run.simulation.spread_fraction).unwrap_or(Decimal::ZERO),
            );
            let trader = PaperTrader::new(
                Box::new(run.strategy),
                run.risk,
                to_balance(initial_balance)?,
                Box::new(VolatilitySlippage::new(run.simulation.slippage_volatility)),
                Box::new(fees),
                state_file.map(JsonStateStore::new),
                trades_log.map(TradeLogWriter::new),
                PaperTraderSettings {
                    heartbeat_every: run.simulation.heartbeat_every,
                },
            )?;
            let report = trader.run(&mut feed)?;
            println!("{}", report.summary);
        }
        Command::MonteCarlo {
            data,
            initial_balance,
            config,
            iterations,
        } => {
            let run = resolve_config(config.as_ref())?;
            let candles = load_candles(&data)?;
            let initial = to_balance(initial_balance)?;
            let risk_fraction = run.risk.base_risk_fraction;
            let engine = BacktestEngine::new(Box::new(run.strategy), run.risk, initial)?;
            let report = engine.run(&candles)?;

            let mc_config = MonteCarloConfig {
                iterations,
                initial_equity: initial,
                risk_fraction,
            };
            let Some(result) = MonteCarloEngine::resample(&report.r_multiples(), &mc_config) else {
                bail!("backtest produced no trades to resample");
            };

            println!("Simulations:        {}", iterations);
            println!("Trades per run:     {}", report.trades.len());
            println!("Mean final equity:  {:.2}", result.final_equity_mean);
            println!("Median:             {:.2}", result.final_equity_median);
            println!("5th percentile:     {:.2}", result.percentile_5);
            println!("95th percentile:    {:.2}", result.percentile_95);
            println!(
                "P(profit):          {:.1}%",
                result.probability_of_profit * 100.0
            );
            println!(
                "Mean max drawdown:  {:.2}%",
                result.max_drawdown_mean * 100.0
            );
            println!(
                "Worst max drawdown: {:.2}%",
                result.max_drawdown_worst * 100.0
            );
        }
    }
    Ok(())
}
