//! Property tests for trade valuation invariants.
//!
//! Uses proptest to verify:
//! 1. Window: exposure is zero outside [open, close]
//! 2. Flat after close: PnL is held at its close value
//! 3. No-threshold default: close is the stop bar whatever the prices
//! 4. Close bounds: open <= close <= stop, forced closes land on the stop bar
//! 5. Linearity: scaling an executed trade scales its final PnL
//! 6. Idempotence: a second execution never moves the close bar

mod common;

use approx::relative_eq;
use common::*;
use proptest::prelude::*;
use tradebook::domain::trade::{ExitReason, Trade};
use tradebook::domain::universe::Universe;
use tradebook::ports::price_port::PricePort;

#[derive(Debug, Clone)]
struct Case {
    universe: Universe,
    trade: Trade,
    open_index: usize,
    stop_index: usize,
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_case() -> impl Strategy<Value = Case> {
    (3usize..20, 1usize..4)
        .prop_flat_map(|(n, k)| {
            (
                prop::collection::vec(prop::collection::vec(1.0..100.0f64, n), k),
                prop::collection::vec(-5.0..5.0f64, k),
                0..n,
                0..n,
                prop::option::of(0.1..20.0f64),
                prop::option::of(-20.0..-0.1f64),
            )
        })
        .prop_map(|(columns, lots, a, b, take, stop)| {
            let n = columns[0].len();
            let universe = Universe::from_columns(
                bars(n),
                columns
                    .into_iter()
                    .enumerate()
                    .map(|(j, c)| (format!("S{j}"), c)),
            )
            .unwrap();

            let (open_index, stop_index) = (a.min(b), a.max(b));
            let mut trade = Trade::new(universe.assets().to_vec())
                .unwrap()
                .with_lots(lots)
                .unwrap()
                .with_entry(bar(open_index))
                .with_exit(bar(stop_index));
            if let Some(take) = take {
                trade = trade.with_take(take).unwrap();
            }
            if let Some(stop) = stop {
                trade = trade.with_stop(stop).unwrap();
            }
            Case {
                universe,
                trade,
                open_index,
                stop_index,
            }
        })
}

fn executed(case: &Case) -> (Trade, usize) {
    let mut trade = case.trade.clone();
    trade.execute(&case.universe).unwrap();
    let close = case
        .universe
        .bar_position(&trade.close_bar().unwrap())
        .unwrap();
    (trade, close)
}

proptest! {
    #[test]
    fn exposure_zero_outside_lifetime(case in arb_case()) {
        let (trade, close) = executed(&case);
        let m = trade.exposure_matrix(&case.universe).unwrap();
        for t in (0..m.n_rows()).filter(|&t| t < case.open_index || t > close) {
            prop_assert!(m.row(t).iter().all(|&v| v == 0.0), "bar {} not flat", t);
        }
    }

    #[test]
    fn pnl_flat_after_close(case in arb_case()) {
        let (trade, close) = executed(&case);
        let m = trade.pnl_matrix(&case.universe).unwrap();
        for t in close..m.n_rows() {
            prop_assert_eq!(m.row(t), m.row(close));
        }
        for t in 0..case.open_index {
            prop_assert!(m.row(t).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn no_threshold_closes_on_stop_bar(case in arb_case()) {
        let mut trade = Trade::new(case.trade.assets().to_vec())
            .unwrap()
            .with_lots(case.trade.lots().to_vec())
            .unwrap()
            .with_entry(bar(case.open_index))
            .with_exit(bar(case.stop_index));
        trade.execute(&case.universe).unwrap();
        prop_assert_eq!(trade.close_bar().unwrap(), bar(case.stop_index));
        prop_assert_eq!(trade.exit_reason().unwrap(), ExitReason::ForcedClose);
    }

    #[test]
    fn close_within_window(case in arb_case()) {
        let (trade, close) = executed(&case);
        prop_assert!(close >= case.open_index);
        prop_assert!(close <= case.stop_index);

        let pnl = trade.series_pnl(&case.universe).unwrap();
        match trade.exit_reason().unwrap() {
            ExitReason::ForcedClose => prop_assert_eq!(close, case.stop_index),
            ExitReason::TakeProfit => {
                prop_assert!(pnl[close] >= case.trade.take().unwrap() - 1e-9);
            }
            ExitReason::StopLoss => {
                prop_assert!(pnl[close] <= case.trade.stop().unwrap() + 1e-9);
            }
        }
    }

    #[test]
    fn scaling_is_linear(case in arb_case(), k in -3.0..3.0f64) {
        let (trade, _) = executed(&case);
        let base = trade.final_pnl(&case.universe).unwrap();
        let scaled = (k * &trade).final_pnl(&case.universe).unwrap();
        for (s, b) in scaled.iter().zip(&base) {
            prop_assert!(
                relative_eq!(*s, k * b, epsilon = 1e-9, max_relative = 1e-9),
                "{} != {} * {}", s, k, b
            );
        }
    }

    #[test]
    fn execution_is_idempotent(case in arb_case()) {
        let (mut trade, _) = executed(&case);
        let first = trade.close_bar().unwrap();
        trade.execute(&case.universe).unwrap();
        prop_assert_eq!(trade.close_bar().unwrap(), first);
    }
}
