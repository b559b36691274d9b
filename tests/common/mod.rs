#![allow(dead_code)]

use chrono::NaiveDate;
use std::io::Write;
use tradebook::domain::universe::Universe;

/// Bar `i` of the fixture timeline: 2024-01-01 plus `i` days.
pub fn bar(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

pub fn bars(n: usize) -> Vec<NaiveDate> {
    (0..n).map(bar).collect()
}

/// Universe with one column per `(asset, prices)` pair over `bar(0)..`.
pub fn universe_from(columns: &[(&str, &[f64])]) -> Universe {
    let n = columns.first().map_or(0, |(_, p)| p.len());
    Universe::from_columns(
        bars(n),
        columns.iter().map(|(a, p)| (a.to_string(), p.to_vec())),
    )
    .unwrap()
}

/// Single asset `A0` priced 1, 2, ..., n.
pub fn rising(n: usize) -> Universe {
    let prices: Vec<f64> = (1..=n).map(|p| p as f64).collect();
    universe_from(&[("A0", prices.as_slice())])
}

/// `A0` rising 1..=n and `A1` falling n..=1.
pub fn rising_and_falling(n: usize) -> Universe {
    let up: Vec<f64> = (1..=n).map(|p| p as f64).collect();
    let down: Vec<f64> = up.iter().rev().copied().collect();
    universe_from(&[("A0", up.as_slice()), ("A1", down.as_slice())])
}

/// Prices CSV text for `universe_from`-style columns.
pub fn prices_csv(columns: &[(&str, &[f64])]) -> String {
    let mut out = String::from("date");
    for (asset, _) in columns {
        out.push(',');
        out.push_str(asset);
    }
    out.push('\n');
    let n = columns.first().map_or(0, |(_, p)| p.len());
    for t in 0..n {
        out.push_str(&bar(t).to_string());
        for (_, prices) in columns {
            out.push_str(&format!(",{}", prices[t]));
        }
        out.push('\n');
    }
    out
}

pub fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
