use chrono::{Duration, NaiveDate};
use pricing_risk_engine::core::currency::{CurrencyCode, PortfolioSpots};
use pricing_risk_engine::pricing::{price, PricingMode};
use pricing_risk_engine::risk::percentile::percentile;
use pricing_risk_engine::risk::{FxRateTable, PercentileMethod, RateRow, VarCalculator, VarConfig};
use proptest::prelude::*;

/// Spot, strike, rate, volatility, time to expiry.
fn arb_option() -> impl Strategy<Value = (f64, f64, f64, f64, f64)> {
    (
        1.0f64..1000.0,
        1.0f64..1000.0,
        -0.02f64..0.15,
        0.05f64..1.0,
        0.01f64..5.0,
    )
}

fn arb_method() -> impl Strategy<Value = PercentileMethod> {
    prop::sample::select(vec![
        PercentileMethod::NearestRank,
        PercentileMethod::Inclusive,
        PercentileMethod::Exclusive,
    ])
}

/// A rate sheet of 1..=3 currencies over 2..80 days, with matching spots.
fn arb_portfolio() -> impl Strategy<Value = (FxRateTable, PortfolioSpots)> {
    (1usize..=3, 2usize..80).prop_flat_map(|(width, days)| {
        (
            prop::collection::vec(prop::collection::vec(0.5f64..2.0, width), days),
            prop::collection::vec(1.0f64..1_000_000.0, width),
        )
            .prop_map(move |(history, exposures)| {
                let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
                let currencies: Vec<CurrencyCode> = (0..width)
                    .map(|c| CurrencyCode::new(format!("CCY{}", c + 1)))
                    .collect();
                let rows = history
                    .into_iter()
                    .enumerate()
                    .map(|(i, rates)| RateRow::new(start + Duration::days(i as i64), rates))
                    .collect();
                let table = FxRateTable::new(currencies.clone(), rows).unwrap();
                let spots = PortfolioSpots::from_pairs(currencies.into_iter().zip(exposures)).unwrap();
                (table, spots)
            })
    })
}

proptest! {
    // ===================================================================
    // No-arbitrage lower bounds.
    //
    // call >= max(0, S - K e^(-rT)) and put >= max(0, K e^(-rT) - S).
    // ===================================================================
    #[test]
    fn prices_respect_lower_bounds((s, k, r, v, t) in arb_option()) {
        for mode in [PricingMode::Spot, PricingMode::Forward] {
            let res = price(s, k, r, v, t, mode).unwrap();
            let pv_strike = k * (-r * t).exp();
            let tol = 1e-9 * s.max(k);
            prop_assert!(res.call >= (s - pv_strike).max(0.0) - tol,
                "call {} below bound {}", res.call, s - pv_strike);
            prop_assert!(res.put >= (pv_strike - s).max(0.0) - tol,
                "put {} below bound {}", res.put, pv_strike - s);
            prop_assert!(res.call >= 0.0 && res.put >= 0.0);
        }
    }

    // ===================================================================
    // Put-call parity: C - P = S - K e^(-rT).
    // ===================================================================
    #[test]
    fn put_call_parity_holds((s, k, r, v, t) in arb_option()) {
        for mode in [PricingMode::Spot, PricingMode::Forward] {
            let res = price(s, k, r, v, t, mode).unwrap();
            let parity = s - k * (-r * t).exp();
            prop_assert!((res.call - res.put - parity).abs() < 1e-6,
                "parity gap {} in {} mode", res.call - res.put - parity, mode);
        }
    }

    // ===================================================================
    // Spot and forward formulations agree.
    // ===================================================================
    #[test]
    fn spot_and_forward_modes_agree((s, k, r, v, t) in arb_option()) {
        let spot = price(s, k, r, v, t, PricingMode::Spot).unwrap();
        let fwd = price(s, k, r, v, t, PricingMode::Forward).unwrap();
        prop_assert!((spot.call - fwd.call).abs() < 1e-6);
        prop_assert!((spot.put - fwd.put).abs() < 1e-6);
    }

    // ===================================================================
    // Vanishing volatility: a deep in-the-money call tends to its
    // discounted intrinsic value.
    // ===================================================================
    #[test]
    fn low_vol_itm_call_tends_to_intrinsic(
        k in 10.0f64..500.0,
        r in 0.0f64..0.1,
        t in 0.1f64..3.0,
    ) {
        let s = 2.0 * k;
        let res = price(s, k, r, 1e-6, t, PricingMode::Spot).unwrap();
        let intrinsic = s - k * (-r * t).exp();
        prop_assert!((res.call - intrinsic).abs() < 1e-8 * s);
    }

    // ===================================================================
    // Unreachable strike: the call is worthless.
    // ===================================================================
    #[test]
    fn far_strike_call_tends_to_zero(
        s in 1.0f64..500.0,
        v in 0.05f64..0.5,
        t in 0.1f64..2.0,
    ) {
        let res = price(s, s * 1e6, 0.05, v, t, PricingMode::Forward).unwrap();
        prop_assert!(res.call < 1e-10);
    }

    // ===================================================================
    // VaR is a non-negative loss magnitude.
    // ===================================================================
    #[test]
    fn var_is_non_negative((table, spots) in arb_portfolio(), method in arb_method()) {
        let config = VarConfig { percentile: method, ..Default::default() };
        let calc = VarCalculator::new(table, spots, config).unwrap();
        let result = calc.compute_one_day_var();
        prop_assert!(result.var >= 0.0);
        prop_assert_eq!(result.var, (-result.percentile_pnl).max(0.0));
        prop_assert_eq!(result.observations, calc.table().len() - 1);
    }

    // ===================================================================
    // Total P&L is the sum of per-currency P&L, scenario by scenario.
    // ===================================================================
    #[test]
    fn total_pnl_sums_currencies((table, spots) in arb_portfolio()) {
        let calc = VarCalculator::new(table, spots, VarConfig::default()).unwrap();
        for (row, total) in calc.pnl().iter().zip(calc.total_pnl()) {
            let sum: f64 = row.iter().sum();
            prop_assert!((sum - total).abs() <= 1e-9 * sum.abs().max(1.0));
        }
    }

    // ===================================================================
    // Round trip: the exported total-P&L column, re-sorted, gives the
    // same percentile as the calculator.
    // ===================================================================
    #[test]
    fn exported_totals_reproduce_var((table, spots) in arb_portfolio(), method in arb_method()) {
        let config = VarConfig { percentile: method, ..Default::default() };
        let calc = VarCalculator::new(table, spots, config).unwrap();
        let mut buf = Vec::new();
        calc.write_working_table(&mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let idx = reader.headers().unwrap().iter().position(|h| h == "total_pnl").unwrap();
        let totals: Vec<f64> = reader
            .records()
            .filter_map(|r| r.ok())
            .filter_map(|r| r.get(idx).and_then(|v| v.parse().ok()))
            .collect();

        let result = calc.compute_one_day_var();
        prop_assert_eq!(totals.len(), result.observations);
        prop_assert_eq!(percentile(&totals, 1.0 - result.confidence, method), result.percentile_pnl);
    }

    // ===================================================================
    // The nearest-rank percentile is always an actual scenario.
    // ===================================================================
    #[test]
    fn nearest_rank_picks_an_observation((table, spots) in arb_portfolio()) {
        let calc = VarCalculator::new(table, spots, VarConfig::default()).unwrap();
        let result = calc.compute_one_day_var();
        prop_assert!(calc.total_pnl().contains(&result.percentile_pnl));
    }
}
