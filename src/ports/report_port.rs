//! Report output port trait.

use crate::domain::error::TradebookError;
use crate::domain::history::History;
use crate::domain::matrix::Matrix;
use chrono::NaiveDate;
use std::path::Path;

/// Port for writing run results.
pub trait ReportPort {
    fn write_history(&self, history: &History, path: &Path) -> Result<(), TradebookError>;

    /// Write a per-bar wealth series aligned with `bars`.
    fn write_wealth(
        &self,
        bars: &[NaiveDate],
        wealth: &[f64],
        path: &Path,
    ) -> Result<(), TradebookError>;

    /// Write lots traded per bar, one column per asset.
    fn write_transaction(
        &self,
        bars: &[NaiveDate],
        assets: &[String],
        transaction: &Matrix,
        path: &Path,
    ) -> Result<(), TradebookError>;
}
