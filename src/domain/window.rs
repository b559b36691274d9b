//! Resolved valuation context for a trade.
//!
//! A trade is declared with optional entry/exit bars; binding it to a
//! universe turns those into concrete bar positions without touching the
//! declaration itself.

use crate::domain::error::TradebookError;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub open_bar: NaiveDate,
    pub stop_bar: NaiveDate,
    pub open_index: usize,
    pub stop_index: usize,
}

impl Window {
    /// Resolve `entry` (default: first bar) and `exit` (default: last bar)
    /// against the universe.
    pub fn resolve(
        entry: Option<NaiveDate>,
        exit: Option<NaiveDate>,
        universe: &dyn PricePort,
    ) -> Result<Self, TradebookError> {
        let open_bar = match entry {
            Some(bar) => bar,
            None => universe.first_bar()?,
        };
        let stop_bar = match exit {
            Some(bar) => bar,
            None => universe.last_bar()?,
        };
        let open_index = universe.bar_position(&open_bar)?;
        let stop_index = universe.bar_position(&stop_bar)?;

        if open_index > stop_index {
            return Err(TradebookError::InvalidWindow {
                open: open_bar,
                stop: stop_bar,
            });
        }

        Ok(Self {
            open_bar,
            stop_bar,
            open_index,
            stop_index,
        })
    }
}
