//! Run configuration validation.
//!
//! Validates every config field before a run starts and resolves the
//! validated values into a [`RunConfig`].

use crate::domain::error::TradebookError;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

const REPORT_KEYS: [&str; 3] = ["history", "wealth", "transaction"];

/// Validated run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub prices: PathBuf,
    pub trades: PathBuf,
    /// 0 uses the global rayon pool.
    pub threads: usize,
    pub history_output: Option<PathBuf>,
    pub wealth_output: Option<PathBuf>,
    pub transaction_output: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradebookError> {
        validate_run_config(config)?;
        Ok(Self {
            prices: required_path(config, "data", "prices")?,
            trades: required_path(config, "data", "trades")?,
            threads: threads(config)?,
            history_output: config.get_path("report", "history"),
            wealth_output: config.get_path("report", "wealth"),
            transaction_output: config.get_path("report", "transaction"),
        })
    }
}

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    required_path(config, "data", "prices")?;
    required_path(config, "data", "trades")?;
    threads(config)?;
    validate_outputs(config)?;
    Ok(())
}

fn required_path(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<PathBuf, TradebookError> {
    config
        .get_path(section, key)
        .ok_or_else(|| TradebookError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn threads(config: &dyn ConfigPort) -> Result<usize, TradebookError> {
    let Some(raw) = config.get_string("run", "threads") else {
        return Ok(0);
    };
    let invalid = |reason: &str| TradebookError::ConfigInvalid {
        section: "run".to_string(),
        key: "threads".to_string(),
        reason: reason.to_string(),
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("threads must be an integer"))?;
    usize::try_from(value).map_err(|_| invalid("threads must be non-negative"))
}

fn validate_outputs(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    let mut seen: Vec<(&str, PathBuf)> = Vec::new();
    for key in REPORT_KEYS {
        let Some(path) = config.get_path("report", key) else {
            continue;
        };
        if let Some((other, _)) = seen.iter().find(|(_, p)| *p == path) {
            return Err(TradebookError::ConfigInvalid {
                section: "report".to_string(),
                key: key.to_string(),
                reason: format!("{key} and {other} reports must be different files"),
            });
        }
        seen.push((key, path));
    }
    Ok(())
}
