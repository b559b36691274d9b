//! In-memory price universe.
//!
//! Stores one close-price column per asset over a shared, strictly ordered
//! bar timeline, with hash indices for bar and asset positions.

use crate::domain::error::TradebookError;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Universe {
    bars: Vec<NaiveDate>,
    assets: Vec<String>,
    columns: Vec<Vec<f64>>,
    bar_index: HashMap<NaiveDate, usize>,
    asset_index: HashMap<String, usize>,
}

impl Universe {
    /// Build a universe from a bar timeline and one price column per asset.
    ///
    /// Bars must be strictly increasing, asset codes unique, and every column
    /// as long as the timeline.
    pub fn from_columns<I, S>(bars: Vec<NaiveDate>, columns: I) -> Result<Self, TradebookError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        if let Some(w) = bars.windows(2).find(|w| w[0] >= w[1]) {
            return Err(TradebookError::data(format!(
                "bars must be strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }

        let bar_index = bars.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut assets = Vec::new();
        let mut prices = Vec::new();
        let mut asset_index = HashMap::new();

        for (asset, column) in columns {
            let asset = asset.into();
            if column.len() != bars.len() {
                return Err(TradebookError::shape(format!(
                    "asset {} has {} prices for {} bars",
                    asset,
                    column.len(),
                    bars.len()
                )));
            }
            if asset_index.contains_key(&asset) {
                return Err(TradebookError::data(format!("duplicate asset: {}", asset)));
            }
            asset_index.insert(asset.clone(), assets.len());
            assets.push(asset);
            prices.push(column);
        }

        Ok(Self {
            bars,
            assets,
            columns: prices,
            bar_index,
            asset_index,
        })
    }

    /// Price column of one asset, aligned with `bars()`.
    pub fn column(&self, asset: &str) -> Result<&[f64], TradebookError> {
        let j = self.asset_position(asset)?;
        Ok(&self.columns[j])
    }
}

impl PricePort for Universe {
    fn bars(&self) -> &[NaiveDate] {
        &self.bars
    }

    fn assets(&self) -> &[String] {
        &self.assets
    }

    fn bar_position(&self, bar: &NaiveDate) -> Result<usize, TradebookError> {
        self.bar_index
            .get(bar)
            .copied()
            .ok_or(TradebookError::UnknownBar { bar: *bar })
    }

    fn asset_position(&self, asset: &str) -> Result<usize, TradebookError> {
        self.asset_index
            .get(asset)
            .copied()
            .ok_or_else(|| TradebookError::UnknownAsset {
                asset: asset.to_string(),
            })
    }

    fn price_at(&self, bar_index: usize, asset_index: usize) -> f64 {
        self.columns[asset_index][bar_index]
    }
}
