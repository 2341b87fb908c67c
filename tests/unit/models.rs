//! Unit tests for quote and snapshot models

use macrofeed::models::{MarketSnapshot, ProviderId, Quote, SnapshotEntry};

#[test]
fn change_percent_from_previous() {
    let quote = Quote::new("SPY", 110.0, 100.0, ProviderId::Yahoo);
    assert!((quote.change_percent() - 10.0).abs() < 1e-9);
}

#[test]
fn change_percent_with_zero_previous_is_zero() {
    let quote = Quote::new("SPY", 110.0, 0.0, ProviderId::Yahoo);
    assert_eq!(quote.change_percent(), 0.0);
}

#[test]
fn finite_non_negative_rejects_nan_and_negatives() {
    let mut quote = Quote::new("SPY", 110.0, 100.0, ProviderId::Yahoo);
    assert!(quote.is_finite_non_negative());

    quote.current = f64::NAN;
    assert!(!quote.is_finite_non_negative());

    quote.current = -1.0;
    assert!(!quote.is_finite_non_negative());
}

#[test]
fn provider_order_matches_priority() {
    assert!(ProviderId::Yahoo < ProviderId::Fred);
    assert!(ProviderId::Fred < ProviderId::Scrape);
    assert_eq!(ProviderId::Scrape.as_str(), "scrape");
}

#[test]
fn snapshot_entry_copies_quote_fields() {
    let quote = Quote::new("VIX", 22.5, 21.0, ProviderId::Fred);
    let entry = SnapshotEntry::from(&quote);
    assert_eq!(entry.current, 22.5);
    assert_eq!(entry.previous, 21.0);
    assert_eq!(entry.source, ProviderId::Fred);
}

#[test]
fn empty_snapshot_reports_empty() {
    let mut snapshot = MarketSnapshot::new();
    assert!(snapshot.is_empty());

    let quote = Quote::new("SPY", 1.0, 1.0, ProviderId::Yahoo);
    snapshot.quotes.insert("SPY".to_string(), (&quote).into());
    assert!(!snapshot.is_empty());
}

#[test]
fn snapshot_serializes_without_empty_failures() {
    let snapshot = MarketSnapshot::new();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert!(json.get("failures").is_none());
}
