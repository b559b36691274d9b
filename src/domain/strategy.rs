//! Strategies: sources of trade declarations bound to a universe.

use crate::domain::error::TradebookError;
use crate::domain::trade::Trade;
use crate::ports::price_port::PricePort;

pub trait Strategy {
    fn name(&self) -> &str;

    /// Free-form description, empty unless the strategy provides one.
    fn description(&self) -> &str {
        ""
    }

    /// Declare the trades to run against `universe`, in generation order.
    fn logic(&self, universe: &dyn PricePort) -> Result<Vec<Trade>, TradebookError>;
}

/// A fixed list of trades, e.g. loaded from a declarations file.
#[derive(Debug, Clone)]
pub struct DeclaredTrades {
    pub name: String,
    pub trades: Vec<Trade>,
}

impl DeclaredTrades {
    pub fn new(name: impl Into<String>, trades: Vec<Trade>) -> Self {
        Self {
            name: name.into(),
            trades,
        }
    }
}

impl Strategy for DeclaredTrades {
    fn name(&self) -> &str {
        &self.name
    }

    fn logic(&self, _universe: &dyn PricePort) -> Result<Vec<Trade>, TradebookError> {
        Ok(self.trades.clone())
    }
}

/// Strategy backed by a closure.
pub struct FnStrategy<F> {
    name: String,
    description: String,
    logic: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&dyn PricePort) -> Result<Vec<Trade>, TradebookError>,
{
    pub fn new(name: impl Into<String>, logic: F) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            logic,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl<F> Strategy for FnStrategy<F>
where
    F: Fn(&dyn PricePort) -> Result<Vec<Trade>, TradebookError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn logic(&self, universe: &dyn PricePort) -> Result<Vec<Trade>, TradebookError> {
        (self.logic)(universe)
    }
}
