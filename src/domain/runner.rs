//! Backtest run: generate trades, execute them, aggregate the history.
//!
//! Each trade's close bar depends only on its own orders and the shared,
//! read-only universe, so execution fans out over a rayon pool. History
//! aggregation runs after every trade has been executed.

use crate::domain::error::TradebookError;
use crate::domain::history::History;
use crate::domain::matrix::Matrix;
use crate::domain::strategy::Strategy;
use crate::domain::trade::Trade;
use crate::ports::price_port::PricePort;
use log::{debug, info};
use rayon::prelude::*;

/// Execute every trade in place, in parallel. Order is preserved; the first
/// error encountered is returned.
pub fn execute_all(trades: &mut [Trade], universe: &dyn PricePort) -> Result<(), TradebookError> {
    trades
        .par_iter_mut()
        .try_for_each(|t| t.execute(universe).map(|_| ()))
}

#[derive(Debug, Clone)]
pub struct Backtest {
    pub trades: Vec<Trade>,
    pub history: History,
}

impl Backtest {
    pub fn n_trades(&self) -> usize {
        self.trades.len()
    }

    pub fn n_orders(&self) -> usize {
        self.history.n_orders()
    }

    /// Cumulative PnL of all trades per bar.
    pub fn wealth(&self, universe: &dyn PricePort) -> Result<Vec<f64>, TradebookError> {
        let mut wealth = vec![0.0; universe.n_bars()];
        for trade in &self.trades {
            for (w, p) in wealth.iter_mut().zip(trade.series_pnl(universe)?) {
                *w += p;
            }
        }
        Ok(wealth)
    }

    /// Lots traded per bar and asset, shaped `(n_bars, n_assets)`: each order
    /// buys its lot on the open bar and sells it back on the close bar.
    pub fn transaction(&self, universe: &dyn PricePort) -> Result<Matrix, TradebookError> {
        let mut m = Matrix::from_fn(universe.n_bars(), universe.n_assets(), |_, _| 0.0);
        for r in self.history.records() {
            let j = universe.asset_position(&r.asset)?;
            let open = universe.bar_position(&r.open_bar)?;
            let close = universe.bar_position(&r.close_bar)?;
            m.row_mut(open)[j] += r.lot;
            m.row_mut(close)[j] -= r.lot;
        }
        Ok(m)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Runner {
    /// Worker threads for execution; 0 uses the global rayon pool.
    pub threads: usize,
}

impl Runner {
    pub fn new(threads: usize) -> Self {
        Self { threads }
    }

    pub fn run(
        &self,
        strategy: &dyn Strategy,
        universe: &dyn PricePort,
    ) -> Result<Backtest, TradebookError> {
        info!("generating trades for {}", strategy.name());
        if !strategy.description().is_empty() {
            debug!("{}: {}", strategy.name(), strategy.description());
        }
        let mut trades = strategy.logic(universe)?;
        if trades.is_empty() {
            return Err(TradebookError::NoTrades);
        }

        info!("executing {} trades", trades.len());
        if self.threads == 0 {
            execute_all(&mut trades, universe)?;
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()
                .map_err(|e| TradebookError::ConfigInvalid {
                    section: "run".into(),
                    key: "threads".into(),
                    reason: e.to_string(),
                })?;
            pool.install(|| execute_all(&mut trades, universe))?;
        }

        let history = History::build(&trades, universe)?;
        info!(
            "{} trades, {} orders, total gain {:.4}",
            trades.len(),
            history.n_orders(),
            history.total_gain()
        );
        Ok(Backtest { trades, history })
    }
}
