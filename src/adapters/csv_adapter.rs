//! CSV loaders for price universes and trade declarations.
//!
//! Prices are wide: `date,<asset>,<asset>,...` with one row per bar.
//! Declarations are long: `trade,asset,lot,entry,exit,take,stop` with one
//! row per order; rows sharing a `trade` id form one multi-asset trade.

use crate::domain::error::TradebookError;
use crate::domain::trade::Trade;
use crate::domain::universe::Universe;
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn load_universe(path: &Path) -> Result<Universe, TradebookError> {
    let file = File::open(path).map_err(|e| {
        TradebookError::data(format!("failed to read {}: {}", path.display(), e))
    })?;
    let universe = read_universe(file)?;
    debug!(
        "loaded {} bars x {} assets from {}",
        universe.bars().len(),
        universe.assets().len(),
        path.display()
    );
    Ok(universe)
}

pub fn read_universe<R: Read>(reader: R) -> Result<Universe, TradebookError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(TradebookError::data(
            "price file needs a date column and at least one asset column",
        ));
    }
    let assets: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let date_str = record
            .get(0)
            .ok_or_else(|| TradebookError::data("missing date column"))?;
        let date = parse_date(date_str)?;

        let mut prices = Vec::with_capacity(assets.len());
        for (j, asset) in assets.iter().enumerate() {
            let cell = record.get(j + 1).ok_or_else(|| {
                TradebookError::data(format!("row {}: missing price for {}", line + 1, asset))
            })?;
            let price: f64 = cell.trim().parse().map_err(|e| {
                TradebookError::data(format!(
                    "row {}: invalid price for {}: {}",
                    line + 1,
                    asset,
                    e
                ))
            })?;
            prices.push(price);
        }
        rows.push((date, prices));
    }

    rows.sort_by_key(|(date, _)| *date);

    let bars: Vec<NaiveDate> = rows.iter().map(|(d, _)| *d).collect();
    let columns = assets.into_iter().enumerate().map(|(j, asset)| {
        let column: Vec<f64> = rows.iter().map(|(_, p)| p[j]).collect();
        (asset, column)
    });
    Universe::from_columns(bars, columns)
}

pub fn load_trades(path: &Path) -> Result<Vec<Trade>, TradebookError> {
    let file = File::open(path).map_err(|e| {
        TradebookError::data(format!("failed to read {}: {}", path.display(), e))
    })?;
    let trades = read_trades(file)?;
    debug!("loaded {} trades from {}", trades.len(), path.display());
    Ok(trades)
}

/// Trade-level fields, which must agree across a trade's rows.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TradeFields {
    entry: Option<NaiveDate>,
    exit: Option<NaiveDate>,
    take: Option<f64>,
    stop: Option<f64>,
}

struct Declaration {
    id: String,
    assets: Vec<String>,
    lots: Vec<f64>,
    fields: TradeFields,
}

struct Columns {
    trade: usize,
    asset: usize,
    lot: Option<usize>,
    entry: Option<usize>,
    exit: Option<usize>,
    take: Option<usize>,
    stop: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, TradebookError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| {
            find(name).ok_or_else(|| TradebookError::data(format!("missing {} column", name)))
        };
        Ok(Self {
            trade: required("trade")?,
            asset: required("asset")?,
            lot: find("lot"),
            entry: find("entry"),
            exit: find("exit"),
            take: find("take"),
            stop: find("stop"),
        })
    }
}

pub fn read_trades<R: Read>(reader: R) -> Result<Vec<Trade>, TradebookError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let cols = Columns::from_headers(&rdr.headers()?.clone())?;

    let mut declarations: Vec<Declaration> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let cell = |i: Option<usize>| {
            i.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let id = cell(Some(cols.trade))
            .ok_or_else(|| TradebookError::data(format!("row {}: missing trade id", line + 1)))?
            .to_string();
        let asset = cell(Some(cols.asset))
            .ok_or_else(|| TradebookError::data(format!("row {}: missing asset", line + 1)))?
            .to_string();
        let lot = match cell(cols.lot) {
            Some(s) => parse_f64(s, "lot")?,
            None => 1.0,
        };
        let fields = TradeFields {
            entry: cell(cols.entry).map(parse_date).transpose()?,
            exit: cell(cols.exit).map(parse_date).transpose()?,
            take: cell(cols.take).map(|s| parse_f64(s, "take")).transpose()?,
            stop: cell(cols.stop).map(|s| parse_f64(s, "stop")).transpose()?,
        };

        match by_id.get(&id) {
            Some(&k) => {
                let decl = &mut declarations[k];
                if decl.fields != fields {
                    return Err(TradebookError::data(format!(
                        "row {}: trade {} has conflicting entry/exit/take/stop",
                        line + 1,
                        id
                    )));
                }
                decl.assets.push(asset);
                decl.lots.push(lot);
            }
            None => {
                by_id.insert(id.clone(), declarations.len());
                declarations.push(Declaration {
                    id,
                    assets: vec![asset],
                    lots: vec![lot],
                    fields,
                });
            }
        }
    }

    declarations.into_iter().map(build_trade).collect()
}

fn build_trade(decl: Declaration) -> Result<Trade, TradebookError> {
    let mut trade = Trade::new(decl.assets)?.with_lots(decl.lots)?;
    if let Some(entry) = decl.fields.entry {
        trade = trade.with_entry(entry);
    }
    if let Some(exit) = decl.fields.exit {
        trade = trade.with_exit(exit);
    }
    if let Some(take) = decl.fields.take {
        trade = trade.with_take(take)?;
    }
    if let Some(stop) = decl.fields.stop {
        trade = trade.with_stop(stop)?;
    }
    debug!("declared trade {}: {}", decl.id, trade);
    Ok(trade)
}

fn parse_date(s: &str) -> Result<NaiveDate, TradebookError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| TradebookError::data(format!("invalid date {:?}: {}", s, e)))
}

fn parse_f64(s: &str, field: &str) -> Result<f64, TradebookError> {
    s.parse()
        .map_err(|e| TradebookError::data(format!("invalid {} value {:?}: {}", field, s, e)))
}
