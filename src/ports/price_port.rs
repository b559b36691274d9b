//! Price repository port trait.
//!
//! The repository is the authority on which bars and assets exist. Trades
//! and the history aggregator only ever read from it, so implementations
//! must be safe to share across worker threads.

use crate::domain::error::TradebookError;
use chrono::NaiveDate;

pub trait PricePort: Sync {
    /// Ordered bar sequence.
    fn bars(&self) -> &[NaiveDate];

    /// Ordered asset sequence.
    fn assets(&self) -> &[String];

    fn bar_position(&self, bar: &NaiveDate) -> Result<usize, TradebookError>;

    fn asset_position(&self, asset: &str) -> Result<usize, TradebookError>;

    /// Positional read. Both indices must come from `bar_position` /
    /// `asset_position` (or be in range of `bars()` / `assets()`).
    fn price_at(&self, bar_index: usize, asset_index: usize) -> f64;

    fn n_bars(&self) -> usize {
        self.bars().len()
    }

    fn n_assets(&self) -> usize {
        self.assets().len()
    }

    fn asset_positions(&self, assets: &[String]) -> Result<Vec<usize>, TradebookError> {
        assets.iter().map(|a| self.asset_position(a)).collect()
    }

    fn price(&self, asset: &str, bar: &NaiveDate) -> Result<f64, TradebookError> {
        let i = self.bar_position(bar)?;
        let j = self.asset_position(asset)?;
        Ok(self.price_at(i, j))
    }

    fn first_bar(&self) -> Result<NaiveDate, TradebookError> {
        self.bars().first().copied().ok_or(TradebookError::EmptyUniverse)
    }

    fn last_bar(&self) -> Result<NaiveDate, TradebookError> {
        self.bars().last().copied().ok_or(TradebookError::EmptyUniverse)
    }
}
