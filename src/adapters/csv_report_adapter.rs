//! CSV report adapter implementing ReportPort.
//!
//! The history report has one row per order; the wealth and transaction
//! reports one row per bar.

use crate::domain::error::TradebookError;
use crate::domain::history::History;
use crate::domain::matrix::Matrix;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use log::info;
use std::path::Path;

pub const HISTORY_HEADER: [&str; 14] = [
    "trade_index",
    "order_index",
    "asset",
    "lot",
    "open_bar",
    "close_bar",
    "exit_bar",
    "take",
    "stop",
    "exit_reason",
    "open_price",
    "close_price",
    "duration",
    "gain",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

impl ReportPort for CsvReportAdapter {
    fn write_history(&self, history: &History, path: &Path) -> Result<(), TradebookError> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(HISTORY_HEADER)?;
        for r in history.records() {
            wtr.write_record([
                r.trade_index.to_string(),
                r.order_index.to_string(),
                r.asset,
                r.lot.to_string(),
                r.open_bar.to_string(),
                r.close_bar.to_string(),
                r.exit_bar.to_string(),
                opt(r.take),
                opt(r.stop),
                r.exit_reason.to_string(),
                r.open_price.to_string(),
                r.close_price.to_string(),
                r.duration.to_string(),
                r.gain.to_string(),
            ])?;
        }
        wtr.flush()?;
        info!(
            "wrote {} history rows to {}",
            history.n_orders(),
            path.display()
        );
        Ok(())
    }

    fn write_wealth(
        &self,
        bars: &[NaiveDate],
        wealth: &[f64],
        path: &Path,
    ) -> Result<(), TradebookError> {
        if bars.len() != wealth.len() {
            return Err(TradebookError::shape(format!(
                "{} wealth values for {} bars",
                wealth.len(),
                bars.len()
            )));
        }
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["date", "wealth"])?;
        for (bar, w) in bars.iter().zip(wealth) {
            wtr.write_record([bar.to_string(), w.to_string()])?;
        }
        wtr.flush()?;
        info!("wrote {} wealth rows to {}", bars.len(), path.display());
        Ok(())
    }

    fn write_transaction(
        &self,
        bars: &[NaiveDate],
        assets: &[String],
        transaction: &Matrix,
        path: &Path,
    ) -> Result<(), TradebookError> {
        if transaction.n_rows() != bars.len() || transaction.n_cols() != assets.len() {
            return Err(TradebookError::shape(format!(
                "transaction is {}x{}, expected {}x{}",
                transaction.n_rows(),
                transaction.n_cols(),
                bars.len(),
                assets.len()
            )));
        }
        let mut wtr = csv::Writer::from_path(path)?;
        let header = std::iter::once("date").chain(assets.iter().map(String::as_str));
        wtr.write_record(header)?;
        for (bar, row) in bars.iter().zip(transaction.rows()) {
            let record = std::iter::once(bar.to_string()).chain(row.iter().map(f64::to_string));
            wtr.write_record(record)?;
        }
        wtr.flush()?;
        info!(
            "wrote {} transaction rows to {}",
            bars.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::Trade;
    use crate::domain::universe::Universe;
    use std::fs;
    use tempfile::TempDir;

    fn bar(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn history() -> History {
        let u = Universe::from_columns(
            (0..4).map(bar).collect(),
            vec![
                ("BHP", vec![10.0, 11.0, 12.0, 13.0]),
                ("RIO", vec![20.0, 19.0, 18.0, 17.0]),
            ],
        )
        .unwrap();
        let mut trades = vec![
            Trade::single("BHP").with_take(2.0).unwrap(),
            Trade::new(["BHP", "RIO"])
                .unwrap()
                .with_lots(vec![1.0, -2.0])
                .unwrap()
                .with_entry(bar(1)),
        ];
        for t in &mut trades {
            t.execute(&u).unwrap();
        }
        History::build(&trades, &u).unwrap()
    }

    #[test]
    fn writes_history_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.csv");
        CsvReportAdapter::new()
            .write_history(&history(), &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HISTORY_HEADER.join(","));
        assert_eq!(
            lines[1],
            "0,0,BHP,1,2024-01-01,2024-01-03,2024-01-04,2,,take,10,12,2,2"
        );
        assert_eq!(
            lines[3],
            "1,2,RIO,-2,2024-01-02,2024-01-04,2024-01-04,,,exit,19,17,2,4"
        );
    }

    #[test]
    fn writes_wealth_series() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wealth.csv");
        CsvReportAdapter::new()
            .write_wealth(&[bar(0), bar(1)], &[0.0, 1.5], &path)
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "date,wealth\n2024-01-01,0\n2024-01-02,1.5\n");
    }

    #[test]
    fn wealth_length_mismatch_is_shape_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wealth.csv");
        let result = CsvReportAdapter::new().write_wealth(&[bar(0)], &[], &path);
        assert!(matches!(result, Err(TradebookError::Shape { .. })));
    }

    #[test]
    fn writes_transaction_columns_per_asset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transaction.csv");
        let m = Matrix::from_fn(3, 2, |t, j| match (t, j) {
            (0, 0) => 1.0,
            (2, 0) => -1.0,
            (1, 1) => -2.5,
            _ => 0.0,
        });
        let assets = vec!["BHP".to_string(), "RIO".to_string()];
        CsvReportAdapter::new()
            .write_transaction(&[bar(0), bar(1), bar(2)], &assets, &m, &path)
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "date,BHP,RIO\n2024-01-01,1,0\n2024-01-02,0,-2.5\n2024-01-03,-1,0\n"
        );
    }

    #[test]
    fn transaction_shape_mismatch_is_shape_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("transaction.csv");
        let m = Matrix::from_fn(2, 1, |_, _| 0.0);
        let assets = vec!["BHP".to_string(), "RIO".to_string()];
        let result = CsvReportAdapter::new().write_transaction(&[bar(0), bar(1)], &assets, &m, &path);
        assert!(matches!(result, Err(TradebookError::Shape { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_path_fails() {
        let result = CsvReportAdapter::new()
            .write_history(&history(), Path::new("/nonexistent/dir/history.csv"));
        assert!(result.is_err());
    }
}
