//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{load_trades, load_universe};
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::RunConfig;
use crate::domain::error::TradebookError;
use crate::domain::runner::{Backtest, Runner};
use crate::domain::strategy::DeclaredTrades;
use crate::domain::trade::ExitReason;
use crate::domain::universe::Universe;
use crate::ports::price_port::PricePort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradebook", about = "Trade valuation and history backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute declared trades against a price file and write reports
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        prices: Option<PathBuf>,
        #[arg(long)]
        trades: Option<PathBuf>,
        /// History report path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Wealth report path
        #[arg(long)]
        wealth: Option<PathBuf>,
        /// Per-bar lots traded, one column per asset
        #[arg(long)]
        transaction: Option<PathBuf>,
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Validate a trade declarations file
    Validate {
        #[arg(short, long)]
        trades: PathBuf,
        /// Also resolve every trade against this price file
        #[arg(long)]
        prices: Option<PathBuf>,
    },
    /// Show bars and assets of a price file
    Info {
        #[arg(long)]
        prices: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub prices: Option<PathBuf>,
    pub trades: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub wealth: Option<PathBuf>,
    pub transaction: Option<PathBuf>,
    pub threads: Option<usize>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            prices,
            trades,
            output,
            wealth,
            transaction,
            threads,
        } => {
            let overrides = Overrides {
                prices,
                trades,
                output,
                wealth,
                transaction,
                threads,
            };
            run_backtest(config.as_deref(), overrides)
        }
        Command::Validate { trades, prices } => run_validate(&trades, prices.as_deref()),
        Command::Info { prices } => run_info(&prices),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradebookError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn apply_overrides(adapter: &mut FileConfigAdapter, overrides: &Overrides) {
    let path = |p: &PathBuf| p.display().to_string();
    if let Some(p) = &overrides.prices {
        adapter.set("data", "prices", path(p));
    }
    if let Some(p) = &overrides.trades {
        adapter.set("data", "trades", path(p));
    }
    if let Some(p) = &overrides.output {
        adapter.set("report", "history", path(p));
    }
    if let Some(p) = &overrides.wealth {
        adapter.set("report", "wealth", path(p));
    }
    if let Some(p) = &overrides.transaction {
        adapter.set("report", "transaction", path(p));
    }
    if let Some(n) = overrides.threads {
        adapter.set("run", "threads", n.to_string());
    }
}

/// Load inputs, execute every declared trade and write the configured reports.
pub fn run_pipeline(rc: &RunConfig) -> Result<(Universe, Backtest), TradebookError> {
    let universe = load_universe(&rc.prices)?;
    let trades = load_trades(&rc.trades)?;
    let name = rc
        .trades
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "declared".to_string());
    let strategy = DeclaredTrades::new(name, trades);

    let backtest = Runner::new(rc.threads).run(&strategy, &universe)?;

    let reporter = CsvReportAdapter::new();
    if let Some(path) = &rc.history_output {
        reporter.write_history(&backtest.history, path)?;
    }
    if let Some(path) = &rc.wealth_output {
        let wealth = backtest.wealth(&universe)?;
        reporter.write_wealth(universe.bars(), &wealth, path)?;
    }
    if let Some(path) = &rc.transaction_output {
        let transaction = backtest.transaction(&universe)?;
        reporter.write_transaction(universe.bars(), universe.assets(), &transaction, path)?;
    }
    if rc.history_output.is_none()
        && rc.wealth_output.is_none()
        && rc.transaction_output.is_none()
    {
        warn!("no report outputs configured; results are only summarised");
    }
    Ok((universe, backtest))
}

fn run_backtest(config_path: Option<&Path>, overrides: Overrides) -> ExitCode {
    // Stage 1: Load config
    let mut adapter = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_config(path) {
                Ok(a) => a,
                Err(code) => return code,
            }
        }
        None => FileConfigAdapter::empty(),
    };
    apply_overrides(&mut adapter, &overrides);

    // Stage 2: Validate and resolve
    let rc = match RunConfig::from_config(&adapter) {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Execute and report
    let (universe, backtest) = match run_pipeline(&rc) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_summary(&universe, &backtest);
    if let Some(path) = &rc.history_output {
        eprintln!("History written to: {}", path.display());
    }
    if let Some(path) = &rc.wealth_output {
        eprintln!("Wealth written to: {}", path.display());
    }
    if let Some(path) = &rc.transaction_output {
        eprintln!("Transaction written to: {}", path.display());
    }
    ExitCode::SUCCESS
}

fn print_summary(universe: &Universe, backtest: &Backtest) {
    let h = &backtest.history;
    let count = |reason: ExitReason| {
        backtest
            .trades
            .iter()
            .filter(|t| t.exit_reason().ok() == Some(reason))
            .count()
    };

    eprintln!("\n=== Results ===");
    eprintln!("Bars:             {}", universe.n_bars());
    eprintln!("Trades:           {}", backtest.n_trades());
    eprintln!("Orders:           {}", backtest.n_orders());
    eprintln!("Take profit:      {}", count(ExitReason::TakeProfit));
    eprintln!("Stop loss:        {}", count(ExitReason::StopLoss));
    eprintln!("Forced close:     {}", count(ExitReason::ForcedClose));
    eprintln!("Total gain:       {:.4}", h.total_gain());
}

fn run_validate(trades_path: &Path, prices_path: Option<&Path>) -> ExitCode {
    eprintln!("Validating trades: {}", trades_path.display());
    let trades = match load_trades(trades_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if let Some(prices_path) = prices_path {
        let universe = match load_universe(prices_path) {
            Ok(u) => u,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        for (i, trade) in trades.iter().enumerate() {
            let resolved = trade
                .window(&universe)
                .and_then(|_| universe.asset_positions(trade.assets()));
            if let Err(e) = resolved {
                eprintln!("error: trade {i}: {e}");
                return (&e).into();
            }
        }
        info!("all trades resolve against {}", prices_path.display());
    }

    let n_orders: usize = trades.iter().map(|t| t.n_orders()).sum();
    eprintln!("{} trades, {} orders", trades.len(), n_orders);
    eprintln!("Trade declarations are valid.");
    ExitCode::SUCCESS
}

fn run_info(prices_path: &Path) -> ExitCode {
    let universe = match load_universe(prices_path) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (first, last) = match (universe.first_bar(), universe.last_bar()) {
        (Ok(f), Ok(l)) => (f, l),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("Bars:   {}", universe.n_bars());
    println!("Range:  {} to {}", first, last);
    println!("Assets: {}", universe.n_assets());
    for asset in universe.assets() {
        println!("  {}", asset);
    }
    ExitCode::SUCCESS
}
