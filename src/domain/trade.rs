//! Trade declaration, valuation and exit determination.
//!
//! A [`Trade`] is a position over one or more assets with signed lots. It is
//! declared before any universe is known, then executed exactly once against
//! a universe to fix its close bar. All matrices are shaped
//! `(n_bars, n_orders)` and aligned with the universe's bar sequence.

use crate::domain::error::TradebookError;
use crate::domain::matrix::{first_true, Matrix};
use crate::domain::window::Window;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use log::debug;
use std::fmt;
use std::ops::{Div, Mul, Neg};

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    /// Reached the declared exit bar, or the end of the universe.
    ForcedClose,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "take",
            ExitReason::StopLoss => "stop",
            ExitReason::ForcedClose => "exit",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared -> Executed, once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionState {
    Declared,
    Executed {
        close_bar: NaiveDate,
        reason: ExitReason,
    },
}

#[derive(Debug, Clone)]
pub struct Trade {
    assets: Vec<String>,
    lots: Vec<f64>,
    entry: Option<NaiveDate>,
    exit: Option<NaiveDate>,
    take: Option<f64>,
    stop: Option<f64>,
    state: ExecutionState,
}

impl Trade {
    /// Declare a trade over `assets` with a lot of 1.0 on every order.
    pub fn new<I, S>(assets: I) -> Result<Self, TradebookError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let assets: Vec<String> = assets.into_iter().map(Into::into).collect();
        if assets.is_empty() {
            return Err(TradebookError::shape("a trade needs at least one asset"));
        }
        let lots = vec![1.0; assets.len()];
        Ok(Self {
            assets,
            lots,
            entry: None,
            exit: None,
            take: None,
            stop: None,
            state: ExecutionState::Declared,
        })
    }

    /// Single-asset trade with a lot of 1.0.
    pub fn single(asset: impl Into<String>) -> Self {
        Self {
            assets: vec![asset.into()],
            lots: vec![1.0],
            entry: None,
            exit: None,
            take: None,
            stop: None,
            state: ExecutionState::Declared,
        }
    }

    /// Same lot on every order.
    pub fn with_lot(self, lot: f64) -> Result<Self, TradebookError> {
        self.with_lots(vec![lot])
    }

    /// Per-order lots. A single value is broadcast to every order.
    pub fn with_lots(mut self, lots: Vec<f64>) -> Result<Self, TradebookError> {
        let lots = broadcast(lots, self.assets.len())?;
        check_finite(&lots)?;
        self.lots = lots;
        Ok(self)
    }

    pub fn with_entry(mut self, bar: NaiveDate) -> Self {
        self.entry = Some(bar);
        self
    }

    /// Forced-close bar.
    pub fn with_exit(mut self, bar: NaiveDate) -> Self {
        self.exit = Some(bar);
        self
    }

    /// Close once cumulative PnL reaches `take` (> 0).
    pub fn with_take(mut self, take: f64) -> Result<Self, TradebookError> {
        if !(take.is_finite() && take > 0.0) {
            return Err(TradebookError::InvalidThreshold {
                field: "take",
                value: take,
                reason: "must be positive",
            });
        }
        self.take = Some(take);
        Ok(self)
    }

    /// Close once cumulative PnL falls to `stop` (< 0).
    pub fn with_stop(mut self, stop: f64) -> Result<Self, TradebookError> {
        if !(stop.is_finite() && stop < 0.0) {
            return Err(TradebookError::InvalidThreshold {
                field: "stop",
                value: stop,
                reason: "must be negative",
            });
        }
        self.stop = Some(stop);
        Ok(self)
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn lots(&self) -> &[f64] {
        &self.lots
    }

    pub fn entry(&self) -> Option<NaiveDate> {
        self.entry
    }

    pub fn exit(&self) -> Option<NaiveDate> {
        self.exit
    }

    pub fn take(&self) -> Option<f64> {
        self.take
    }

    pub fn stop(&self) -> Option<f64> {
        self.stop
    }

    pub fn n_orders(&self) -> usize {
        self.assets.len()
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn is_executed(&self) -> bool {
        matches!(self.state, ExecutionState::Executed { .. })
    }

    pub fn close_bar(&self) -> Result<NaiveDate, TradebookError> {
        match self.state {
            ExecutionState::Executed { close_bar, .. } => Ok(close_bar),
            ExecutionState::Declared => Err(TradebookError::NotExecuted),
        }
    }

    pub fn exit_reason(&self) -> Result<ExitReason, TradebookError> {
        match self.state {
            ExecutionState::Executed { reason, .. } => Ok(reason),
            ExecutionState::Declared => Err(TradebookError::NotExecuted),
        }
    }

    /// Open and stop bars bound to `universe`.
    pub fn window(&self, universe: &dyn PricePort) -> Result<Window, TradebookError> {
        Window::resolve(self.entry, self.exit, universe)
    }

    /// `lot_i * price(asset_i, bar)` for every bar and order.
    pub fn value_matrix(&self, universe: &dyn PricePort) -> Result<Matrix, TradebookError> {
        check_finite(&self.lots)?;
        let ids = universe.asset_positions(&self.assets)?;
        Ok(Matrix::from_fn(universe.n_bars(), self.n_orders(), |t, i| {
            self.lots[i] * universe.price_at(t, ids[i])
        }))
    }

    /// Fix the close bar. A trade that is already executed is returned
    /// unchanged, whatever universe is passed.
    pub fn execute(&mut self, universe: &dyn PricePort) -> Result<&mut Self, TradebookError> {
        if self.is_executed() {
            return Ok(self);
        }

        let (close_bar, reason) = self.search_close(universe)?;
        debug!("executed {} -> close {} ({})", self, close_bar, reason);
        self.state = ExecutionState::Executed { close_bar, reason };
        Ok(self)
    }

    fn search_close(
        &self,
        universe: &dyn PricePort,
    ) -> Result<(NaiveDate, ExitReason), TradebookError> {
        check_finite(&self.lots)?;
        let window = self.window(universe)?;

        if self.take.is_none() && self.stop.is_none() {
            return Ok((window.stop_bar, ExitReason::ForcedClose));
        }

        let pnl = self.net_pnl_from_open(universe, window.open_index)?;
        let take = self.take.unwrap_or(f64::INFINITY);
        let stop = self.stop.unwrap_or(f64::NEG_INFINITY);
        let signal: Vec<bool> = pnl.iter().map(|&p| p >= take || p <= stop).collect();

        match first_true(&signal, window.open_index) {
            Some(i) if i <= window.stop_index => {
                let reason = if pnl[i] >= take {
                    ExitReason::TakeProfit
                } else {
                    ExitReason::StopLoss
                };
                Ok((universe.bars()[i], reason))
            }
            _ => Ok((window.stop_bar, ExitReason::ForcedClose)),
        }
    }

    /// Net cumulative PnL per bar; zero before the open bar.
    fn net_pnl_from_open(
        &self,
        universe: &dyn PricePort,
        open_index: usize,
    ) -> Result<Vec<f64>, TradebookError> {
        let value = self.value_matrix(universe)?.row_sums();
        let base = value[open_index];
        Ok(value
            .iter()
            .enumerate()
            .map(|(t, v)| if t < open_index { 0.0 } else { v - base })
            .collect())
    }

    /// Last bar index of the position lifetime: the close bar once executed,
    /// otherwise the stop bar.
    fn last_index(&self, universe: &dyn PricePort, window: &Window) -> Result<usize, TradebookError> {
        match self.state {
            ExecutionState::Executed { close_bar, .. } => universe.bar_position(&close_bar),
            ExecutionState::Declared => Ok(window.stop_index),
        }
    }

    /// Value matrix, zero outside `[open_bar, close_bar]`.
    pub fn exposure_matrix(&self, universe: &dyn PricePort) -> Result<Matrix, TradebookError> {
        let window = self.window(universe)?;
        let last = self.last_index(universe, &window)?;
        let mut m = self.value_matrix(universe)?;
        m.zero_outside(window.open_index, last);
        Ok(m)
    }

    /// Per-order PnL relative to the open bar, zero before it and held at
    /// its close value after the close bar.
    pub fn pnl_matrix(&self, universe: &dyn PricePort) -> Result<Matrix, TradebookError> {
        let window = self.window(universe)?;
        let last = self.last_index(universe, &window)?;
        let mut m = self.value_matrix(universe)?;
        m.rebase_to_row(window.open_index);
        m.zero_before(window.open_index);
        m.hold_from(last);
        Ok(m)
    }

    pub fn net_exposure(&self, universe: &dyn PricePort) -> Result<Vec<f64>, TradebookError> {
        Ok(self.exposure_matrix(universe)?.row_sums())
    }

    pub fn gross_exposure(&self, universe: &dyn PricePort) -> Result<Vec<f64>, TradebookError> {
        Ok(self.exposure_matrix(universe)?.abs_row_sums())
    }

    /// Net PnL of the whole trade per bar.
    pub fn series_pnl(&self, universe: &dyn PricePort) -> Result<Vec<f64>, TradebookError> {
        Ok(self.pnl_matrix(universe)?.row_sums())
    }

    /// Realized per-order PnL at the close bar.
    pub fn final_pnl(&self, universe: &dyn PricePort) -> Result<Vec<f64>, TradebookError> {
        let close_bar = self.close_bar()?;
        let close_index = universe.bar_position(&close_bar)?;
        Ok(self.pnl_matrix(universe)?.row(close_index).to_vec())
    }

    /// New trade with every lot multiplied by `k`.
    pub fn scaled(&self, k: f64) -> Trade {
        let mut t = self.clone();
        t.lots.iter_mut().for_each(|l| *l *= k);
        t
    }

    /// New trade with lots multiplied element-wise. A single factor is
    /// broadcast to every order. Non-finite products are rejected.
    pub fn scale_by(&self, factors: &[f64]) -> Result<Trade, TradebookError> {
        let factors = broadcast(factors.to_vec(), self.n_orders())?;
        let mut t = self.clone();
        t.lots.iter_mut().zip(&factors).for_each(|(l, k)| *l *= k);
        check_finite(&t.lots)?;
        Ok(t)
    }
}

fn check_finite(lots: &[f64]) -> Result<(), TradebookError> {
    match lots.iter().find(|l| !l.is_finite()) {
        Some(lot) => Err(TradebookError::shape(format!("lot {} is not finite", lot))),
        None => Ok(()),
    }
}

fn broadcast(values: Vec<f64>, n: usize) -> Result<Vec<f64>, TradebookError> {
    match values.len() {
        len if len == n => Ok(values),
        1 => Ok(vec![values[0]; n]),
        len => Err(TradebookError::shape(format!(
            "{} assets but {} lots",
            n, len
        ))),
    }
}

impl PartialEq for Trade {
    fn eq(&self, other: &Self) -> bool {
        self.assets == other.assets
            && self.entry == other.entry
            && self.exit == other.exit
            && self.take == other.take
            && self.stop == other.stop
            && self.lots == other.lots
    }
}

impl Mul<f64> for &Trade {
    type Output = Trade;

    fn mul(self, k: f64) -> Trade {
        self.scaled(k)
    }
}

impl Mul<f64> for Trade {
    type Output = Trade;

    fn mul(self, k: f64) -> Trade {
        self.scaled(k)
    }
}

impl Mul<Trade> for f64 {
    type Output = Trade;

    fn mul(self, trade: Trade) -> Trade {
        trade.scaled(self)
    }
}

impl Mul<&Trade> for f64 {
    type Output = Trade;

    fn mul(self, trade: &Trade) -> Trade {
        trade.scaled(self)
    }
}

impl Neg for Trade {
    type Output = Trade;

    fn neg(self) -> Trade {
        self.scaled(-1.0)
    }
}

impl Neg for &Trade {
    type Output = Trade;

    fn neg(self) -> Trade {
        self.scaled(-1.0)
    }
}

impl Div<f64> for Trade {
    type Output = Trade;

    fn div(self, k: f64) -> Trade {
        self.scaled(1.0 / k)
    }
}

impl Div<f64> for &Trade {
    type Output = Trade;

    fn div(self, k: f64) -> Trade {
        self.scaled(1.0 / k)
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lots: Vec<String> = self.lots.iter().map(|l| l.to_string()).collect();
        write!(f, "trade([{}], lot=[{}]", self.assets.join(", "), lots.join(", "))?;
        if let Some(entry) = self.entry {
            write!(f, ", entry={}", entry)?;
        }
        if let Some(exit) = self.exit {
            write!(f, ", exit={}", exit)?;
        }
        if let Some(take) = self.take {
            write!(f, ", take={}", take)?;
        }
        if let Some(stop) = self.stop {
            write!(f, ", stop={}", stop)?;
        }
        f.write_str(")")
    }
}
