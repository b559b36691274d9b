//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for tradebook.
#[derive(Debug, thiserror::Error)]
pub enum TradebookError {
    #[error("shape mismatch: {reason}")]
    Shape { reason: String },

    #[error("invalid {field} threshold {value}: {reason}")]
    InvalidThreshold {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("open bar {open} is after stop bar {stop}")]
    InvalidWindow { open: NaiveDate, stop: NaiveDate },

    #[error("bar {bar} is not in the universe")]
    UnknownBar { bar: NaiveDate },

    #[error("asset {asset} is not in the universe")]
    UnknownAsset { asset: String },

    #[error("universe has no bars")]
    EmptyUniverse,

    #[error("trade has not been executed")]
    NotExecuted,

    #[error("no trades yielded")]
    NoTrades,

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradebookError {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        TradebookError::Shape {
            reason: reason.into(),
        }
    }

    pub(crate) fn data(reason: impl Into<String>) -> Self {
        TradebookError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&TradebookError> for std::process::ExitCode {
    fn from(err: &TradebookError) -> Self {
        let code: u8 = match err {
            TradebookError::Io(_) => 1,
            TradebookError::ConfigParse { .. }
            | TradebookError::ConfigMissing { .. }
            | TradebookError::ConfigInvalid { .. } => 2,
            TradebookError::Data { .. } | TradebookError::Csv(_) => 3,
            TradebookError::Shape { .. }
            | TradebookError::InvalidThreshold { .. }
            | TradebookError::InvalidWindow { .. } => 4,
            TradebookError::UnknownBar { .. }
            | TradebookError::UnknownAsset { .. }
            | TradebookError::EmptyUniverse => 5,
            TradebookError::NoTrades | TradebookError::NotExecuted => 6,
        };
        std::process::ExitCode::from(code)
    }
}
