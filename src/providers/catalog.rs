//! Static instrument catalogue
//!
//! Maps each requested instrument key to the provider-specific
//! identifiers. Declared once, never derived at runtime; adapters that
//! have no identifier for a key simply do not participate in that
//! symbol's fan-out.

/// Markers used by the scraping fallback to locate the two numeric
/// values on a quote page.
#[derive(Debug, Clone, Copy)]
pub struct ScrapeTarget {
    /// Path on the scrape host, e.g. "/quote/gc-f".
    pub path: &'static str,
    pub current_marker: &'static str,
    pub previous_marker: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Instrument {
    /// Canonical key used by consumers ("UST10Y", "VIX", ...).
    pub key: &'static str,
    pub yahoo: Option<&'static str>,
    pub fred: Option<&'static str>,
    pub scrape: Option<ScrapeTarget>,
}

const fn scrape(path: &'static str) -> Option<ScrapeTarget> {
    Some(ScrapeTarget {
        path,
        current_marker: "data-last-price=\"",
        previous_marker: "data-previous-close=\"",
    })
}

pub const CATALOG: &[Instrument] = &[
    // Treasury tenors
    Instrument { key: "UST2Y", yahoo: Some("^UST2YR"), fred: Some("DGS2"), scrape: scrape("/rates/ust2y") },
    Instrument { key: "UST5Y", yahoo: Some("^FVX"), fred: Some("DGS5"), scrape: scrape("/rates/ust5y") },
    Instrument { key: "UST10Y", yahoo: Some("^TNX"), fred: Some("DGS10"), scrape: scrape("/rates/ust10y") },
    Instrument { key: "UST30Y", yahoo: Some("^TYX"), fred: Some("DGS30"), scrape: scrape("/rates/ust30y") },
    // TIPS real yields
    Instrument { key: "TIPS5Y", yahoo: Some("^T5YIE"), fred: Some("DFII5"), scrape: None },
    Instrument { key: "TIPS10Y", yahoo: Some("^T10YIE"), fred: Some("DFII10"), scrape: None },
    // Inflation expectations and fed funds
    Instrument { key: "INFL5Y5Y", yahoo: None, fred: Some("T5YIFR"), scrape: None },
    Instrument { key: "FEDFUNDS", yahoo: None, fred: Some("DFF"), scrape: None },
    // Equity / volatility
    Instrument { key: "SPY", yahoo: Some("SPY"), fred: Some("SP500"), scrape: scrape("/etf/spy") },
    Instrument { key: "VIX", yahoo: Some("^VIX"), fred: Some("VIXCLS"), scrape: scrape("/index/vix") },
    // Commodities
    Instrument { key: "GOLD", yahoo: Some("GC=F"), fred: None, scrape: scrape("/commodities/gold") },
    Instrument { key: "SILVER", yahoo: Some("SI=F"), fred: None, scrape: scrape("/commodities/silver") },
    Instrument { key: "OIL", yahoo: Some("CL=F"), fred: Some("DCOILWTICO"), scrape: scrape("/commodities/crude-oil") },
    // Currencies
    Instrument { key: "DXY", yahoo: Some("DX-Y.NYB"), fred: None, scrape: scrape("/currencies/dxy") },
    Instrument { key: "EURUSD", yahoo: Some("EURUSD=X"), fred: Some("DEXUSEU"), scrape: scrape("/currencies/eur-usd") },
    Instrument { key: "JPYUSD", yahoo: Some("JPYUSD=X"), fred: Some("DEXJPUS"), scrape: scrape("/currencies/jpy-usd") },
];

pub fn lookup(key: &str) -> Option<&'static Instrument> {
    CATALOG.iter().find(|i| i.key == key)
}

/// Instrument keys refreshed by the background loop when `SYMBOLS` is
/// not set.
pub fn default_symbols() -> Vec<String> {
    CATALOG.iter().map(|i| i.key.to_string()).collect()
}
