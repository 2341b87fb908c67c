//! Unit tests for derived snapshot analytics

use macrofeed::models::{MarketSnapshot, ProviderId, Quote};
use macrofeed::service::analytics;

fn snapshot_with(quotes: &[(&str, f64, f64)]) -> MarketSnapshot {
    let mut snapshot = MarketSnapshot::new();
    for (symbol, current, previous) in quotes {
        let quote = Quote::new(*symbol, *current, *previous, ProviderId::Yahoo);
        snapshot.quotes.insert(symbol.to_string(), (&quote).into());
    }
    snapshot
}

#[test]
fn curve_spreads_come_from_tenor_differences() {
    let snapshot = snapshot_with(&[
        ("UST2Y", 4.8, 4.8),
        ("UST10Y", 4.3, 4.3),
        ("UST30Y", 4.5, 4.5),
    ]);
    let analytics = analytics::compute(&snapshot);

    let spread = analytics.curve_spreads.spread_2s10s.unwrap();
    assert!((spread - (-0.5)).abs() < 1e-9);
    let long_end = analytics.curve_spreads.spread_10s30s.unwrap();
    assert!((long_end - 0.2).abs() < 1e-9);
    // 5y is missing, so the 5s10s spread is unavailable.
    assert!(analytics.curve_spreads.spread_5s10s.is_none());
}

#[test]
fn real_rates_subtract_tips_from_nominal() {
    let snapshot = snapshot_with(&[
        ("UST10Y", 4.3, 4.3),
        ("TIPS10Y", 2.1, 2.1),
    ]);
    let analytics = analytics::compute(&snapshot);

    let real = analytics.real_rates.real_yield_10y.unwrap();
    assert!((real - 2.2).abs() < 1e-9);
    assert!(analytics.real_rates.real_yield_5y.is_none());
}

#[test]
fn inverted_curve_and_high_vix_read_risk_off() {
    let snapshot = snapshot_with(&[
        ("UST2Y", 4.8, 4.8),
        ("UST10Y", 4.3, 4.3),
        ("VIX", 40.0, 38.0),
        ("DXY", 106.0, 105.0),
    ]);
    let signals = analytics::compute(&snapshot).risk_signals;

    assert_eq!(signals.volatility, "panic");
    assert_eq!(signals.yield_curve, "inverted");
    assert_eq!(signals.dollar, "strengthening");
    assert_eq!(signals.overall, "risk_off");
}

#[test]
fn calm_inputs_read_risk_on() {
    let snapshot = snapshot_with(&[
        ("UST2Y", 3.8, 3.8),
        ("UST10Y", 4.3, 4.3),
        ("VIX", 13.0, 13.5),
        ("DXY", 104.0, 104.1),
    ]);
    let signals = analytics::compute(&snapshot).risk_signals;

    assert_eq!(signals.volatility, "complacent");
    assert_eq!(signals.yield_curve, "normal");
    assert_eq!(signals.dollar, "stable");
    assert_eq!(signals.overall, "risk_on");
}

#[test]
fn missing_inputs_come_out_unknown() {
    let snapshot = snapshot_with(&[("GOLD", 2400.0, 2390.0)]);
    let signals = analytics::compute(&snapshot).risk_signals;

    assert_eq!(signals.volatility, "unknown");
    assert_eq!(signals.yield_curve, "unknown");
    assert_eq!(signals.dollar, "unknown");
    assert_eq!(signals.overall, "risk_on");
}
