//! Derived analytics over a snapshot
//!
//! Real yields, curve spreads and coarse risk signals computed from the
//! instruments already in a snapshot. Anything whose inputs are missing
//! simply comes out as None; analytics never trigger fetches.

use serde::Serialize;

use crate::models::{MarketSnapshot, SnapshotEntry};

#[derive(Debug, Clone, Serialize)]
pub struct RealRates {
    /// 5y nominal minus 5y TIPS yield.
    pub real_yield_5y: Option<f64>,
    /// 10y nominal minus 10y TIPS yield.
    pub real_yield_10y: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurveSpreads {
    pub spread_2s10s: Option<f64>,
    pub spread_5s10s: Option<f64>,
    pub spread_10s30s: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskSignals {
    pub volatility: &'static str,
    pub yield_curve: &'static str,
    pub dollar: &'static str,
    pub overall: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub real_rates: RealRates,
    pub curve_spreads: CurveSpreads,
    pub risk_signals: RiskSignals,
}

pub fn compute(snapshot: &MarketSnapshot) -> Analytics {
    let current = |key: &str| snapshot.quotes.get(key).map(|e| e.current);
    let diff = |a: &str, b: &str| match (current(a), current(b)) {
        (Some(a), Some(b)) => Some(a - b),
        _ => None,
    };

    let curve_spreads = CurveSpreads {
        spread_2s10s: diff("UST10Y", "UST2Y"),
        spread_5s10s: diff("UST10Y", "UST5Y"),
        spread_10s30s: diff("UST30Y", "UST10Y"),
    };

    let real_rates = RealRates {
        real_yield_5y: diff("UST5Y", "TIPS5Y"),
        real_yield_10y: diff("UST10Y", "TIPS10Y"),
    };

    let risk_signals = risk_signals(
        current("VIX"),
        curve_spreads.spread_2s10s,
        snapshot.quotes.get("DXY"),
    );

    Analytics {
        real_rates,
        curve_spreads,
        risk_signals,
    }
}

fn risk_signals(
    vix: Option<f64>,
    spread_2s10s: Option<f64>,
    dxy: Option<&SnapshotEntry>,
) -> RiskSignals {
    let volatility = match vix {
        Some(v) if v < 15.0 => "complacent",
        Some(v) if v < 25.0 => "normal",
        Some(v) if v < 35.0 => "elevated",
        Some(_) => "panic",
        None => "unknown",
    };

    let yield_curve = match spread_2s10s {
        Some(s) if s < 0.0 => "inverted",
        Some(s) if s < 0.25 => "flat",
        Some(_) => "normal",
        None => "unknown",
    };

    let dollar = match dxy.map(dxy_change_percent) {
        Some(c) if c > 0.5 => "strengthening",
        Some(c) if c < -0.5 => "weakening",
        Some(_) => "stable",
        None => "unknown",
    };

    let mut stress = 0;
    if matches!(volatility, "elevated" | "panic") {
        stress += 1;
    }
    if yield_curve == "inverted" {
        stress += 1;
    }
    if dollar == "strengthening" {
        stress += 1;
    }
    let overall = match stress {
        0 => "risk_on",
        1 => "neutral",
        _ => "risk_off",
    };

    RiskSignals {
        volatility,
        yield_curve,
        dollar,
        overall,
    }
}

fn dxy_change_percent(entry: &SnapshotEntry) -> f64 {
    if entry.previous == 0.0 {
        0.0
    } else {
        (entry.current - entry.previous) / entry.previous * 100.0
    }
}
