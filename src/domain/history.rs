//! Per-order trade history.
//!
//! Flattens a sequence of executed trades into columnar per-order data.
//! Trade order and, within a trade, order declaration are both preserved.

use crate::domain::error::TradebookError;
use crate::domain::trade::{ExitReason, Trade};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct History {
    pub trade_index: Vec<usize>,
    pub order_index: Vec<usize>,
    pub asset: Vec<String>,
    pub lot: Vec<f64>,
    pub open_bar: Vec<NaiveDate>,
    pub close_bar: Vec<NaiveDate>,
    /// Resolved forced-close bar of the owning trade.
    pub exit_bar: Vec<NaiveDate>,
    pub take: Vec<Option<f64>>,
    pub stop: Vec<Option<f64>>,
    pub exit_reason: Vec<ExitReason>,
    pub open_price: Vec<f64>,
    pub close_price: Vec<f64>,
    /// Bars between open and close.
    pub duration: Vec<usize>,
    pub gain: Vec<f64>,
}

/// One row of a [`History`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub trade_index: usize,
    pub order_index: usize,
    pub asset: String,
    pub lot: f64,
    pub open_bar: NaiveDate,
    pub close_bar: NaiveDate,
    pub exit_bar: NaiveDate,
    pub take: Option<f64>,
    pub stop: Option<f64>,
    pub exit_reason: ExitReason,
    pub open_price: f64,
    pub close_price: f64,
    pub duration: usize,
    pub gain: f64,
}

impl History {
    /// Flatten executed `trades`. Empty input is [`TradebookError::NoTrades`],
    /// and every trade must already be executed.
    pub fn build(trades: &[Trade], universe: &dyn PricePort) -> Result<Self, TradebookError> {
        if trades.is_empty() {
            return Err(TradebookError::NoTrades);
        }

        let n_orders: usize = trades.iter().map(Trade::n_orders).sum();
        let mut h = History::with_capacity(n_orders);

        for (ti, trade) in trades.iter().enumerate() {
            let close_bar = trade.close_bar()?;
            let reason = trade.exit_reason()?;
            let window = trade.window(universe)?;
            let close_index = universe.bar_position(&close_bar)?;
            let asset_ids = universe.asset_positions(trade.assets())?;

            for ((asset, &lot), &aj) in trade.assets().iter().zip(trade.lots()).zip(&asset_ids) {
                let open_price = universe.price_at(window.open_index, aj);
                let close_price = universe.price_at(close_index, aj);

                h.trade_index.push(ti);
                h.order_index.push(h.order_index.len());
                h.asset.push(asset.clone());
                h.lot.push(lot);
                h.open_bar.push(window.open_bar);
                h.close_bar.push(close_bar);
                h.exit_bar.push(window.stop_bar);
                h.take.push(trade.take());
                h.stop.push(trade.stop());
                h.exit_reason.push(reason);
                h.open_price.push(open_price);
                h.close_price.push(close_price);
                h.duration.push(close_index - window.open_index);
                h.gain.push(lot * (close_price - open_price));
            }
        }

        Ok(h)
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            trade_index: Vec::with_capacity(n),
            order_index: Vec::with_capacity(n),
            asset: Vec::with_capacity(n),
            lot: Vec::with_capacity(n),
            open_bar: Vec::with_capacity(n),
            close_bar: Vec::with_capacity(n),
            exit_bar: Vec::with_capacity(n),
            take: Vec::with_capacity(n),
            stop: Vec::with_capacity(n),
            exit_reason: Vec::with_capacity(n),
            open_price: Vec::with_capacity(n),
            close_price: Vec::with_capacity(n),
            duration: Vec::with_capacity(n),
            gain: Vec::with_capacity(n),
        }
    }

    pub fn n_orders(&self) -> usize {
        self.order_index.len()
    }

    pub fn len(&self) -> usize {
        self.n_orders()
    }

    pub fn is_empty(&self) -> bool {
        self.order_index.is_empty()
    }

    pub fn n_trades(&self) -> usize {
        self.trade_index.last().map_or(0, |&t| t + 1)
    }

    pub fn total_gain(&self) -> f64 {
        self.gain.iter().sum()
    }

    pub fn record(&self, i: usize) -> HistoryRecord {
        HistoryRecord {
            trade_index: self.trade_index[i],
            order_index: self.order_index[i],
            asset: self.asset[i].clone(),
            lot: self.lot[i],
            open_bar: self.open_bar[i],
            close_bar: self.close_bar[i],
            exit_bar: self.exit_bar[i],
            take: self.take[i],
            stop: self.stop[i],
            exit_reason: self.exit_reason[i],
            open_price: self.open_price[i],
            close_price: self.close_price[i],
            duration: self.duration[i],
            gain: self.gain[i],
        }
    }

    pub fn records(&self) -> impl Iterator<Item = HistoryRecord> + '_ {
        (0..self.n_orders()).map(|i| self.record(i))
    }
}
