//! Record validation and quality scoring
//!
//! Every record is scored on four axes before it may enter the cache:
//! completeness (required fields present), timeliness (record age),
//! consistency (plausible movement against the previously accepted
//! record) and accuracy (range checks). A record is admitted only when
//! all four scores clear their thresholds; a rejected record never
//! displaces a previously cached value.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::time::Duration;

use crate::models::{DataKind, QualityMetrics};

/// Minimum acceptable score per axis.
#[derive(Debug, Clone, Copy)]
pub struct QualityThresholds {
    pub completeness: f64,
    pub timeliness: f64,
    pub consistency: f64,
    pub accuracy: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            completeness: 0.95,
            timeliness: 1.0,
            consistency: 0.90,
            accuracy: 0.98,
        }
    }
}

/// A numeric field may move this fraction of its previous magnitude
/// between accepted records before it counts as inconsistent. Wide on
/// purpose: the check exists to catch decimal-point and unit mistakes,
/// not ordinary market moves.
const CONSISTENCY_TOLERANCE: f64 = 0.5;

/// Clock skew allowed before a timestamp counts as "in the future".
const FUTURE_SKEW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub metrics: QualityMetrics,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DataValidator {
    thresholds: QualityThresholds,
}

// Symbol and volume are range-checked when present but not required; a
// bare price observation is a complete market-data record.
fn required_fields(kind: DataKind) -> &'static [&'static str] {
    match kind {
        DataKind::MarketData => &["price", "timestamp"],
        DataKind::News => &["title", "content", "source", "published_at"],
        DataKind::Sentiment => &["score", "confidence", "timestamp"],
    }
}

/// Age beyond which a record scores zero timeliness.
fn max_age(kind: DataKind) -> Duration {
    match kind {
        DataKind::MarketData => Duration::from_secs(300),
        DataKind::News => Duration::from_secs(86_400),
        DataKind::Sentiment => Duration::from_secs(3600),
    }
}

impl DataValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    /// Scores `record` and decides admission. `historical` is the last
    /// record accepted for the same key, if any.
    pub fn validate(
        &self,
        kind: DataKind,
        record: &Value,
        historical: Option<&Value>,
    ) -> ValidationOutcome {
        let mut reasons = Vec::new();

        let Some(fields) = record.as_object() else {
            return ValidationOutcome {
                accepted: false,
                metrics: QualityMetrics {
                    completeness: 0.0,
                    timeliness: 0.0,
                    consistency: 0.0,
                    accuracy: 0.0,
                },
                reasons: vec!["record is not an object".to_string()],
            };
        };

        let required = required_fields(kind);
        let present = required
            .iter()
            .filter(|f| fields.get(**f).is_some_and(|v| !v.is_null()))
            .count();
        let completeness = present as f64 / required.len() as f64;
        for field in required {
            if !fields.get(*field).is_some_and(|v| !v.is_null()) {
                reasons.push(format!("missing required field: {field}"));
            }
        }

        let timeliness = score_timeliness(kind, fields, &mut reasons);
        let accuracy = score_accuracy(kind, fields, &mut reasons);
        let consistency = score_consistency(fields, historical.and_then(Value::as_object));

        let metrics = QualityMetrics {
            completeness,
            timeliness,
            consistency,
            accuracy,
        };

        if consistency < self.thresholds.consistency {
            reasons.push(format!(
                "inconsistent with previously accepted record (score {consistency:.2})"
            ));
        }

        let accepted = reasons.is_empty()
            && completeness >= self.thresholds.completeness
            && timeliness >= self.thresholds.timeliness
            && consistency >= self.thresholds.consistency
            && accuracy >= self.thresholds.accuracy;

        ValidationOutcome {
            accepted,
            metrics,
            reasons,
        }
    }
}

fn score_timeliness(
    kind: DataKind,
    fields: &serde_json::Map<String, Value>,
    reasons: &mut Vec<String>,
) -> f64 {
    let stamp_field = match kind {
        DataKind::News => "published_at",
        _ => "timestamp",
    };
    let Some(stamp) = fields.get(stamp_field).and_then(parse_timestamp) else {
        reasons.push(format!("unparseable {stamp_field}"));
        return 0.0;
    };

    let now = Utc::now();
    let skew = chrono::Duration::from_std(FUTURE_SKEW).unwrap_or_else(|_| chrono::Duration::zero());
    if stamp > now + skew {
        reasons.push(format!("{stamp_field} is in the future"));
        return 0.0;
    }

    let age = (now - stamp).to_std().unwrap_or(Duration::ZERO);
    if age <= max_age(kind) {
        1.0
    } else {
        reasons.push(format!("record too old: {}s", age.as_secs()));
        0.0
    }
}

/// Range checks per kind; accuracy is the fraction passed. Optional
/// fields are checked only when present.
fn score_accuracy(
    kind: DataKind,
    fields: &serde_json::Map<String, Value>,
    reasons: &mut Vec<String>,
) -> f64 {
    let mut checks = 0usize;
    let mut passed = 0usize;
    let mut check = |ok: bool, reason: String| {
        checks += 1;
        if ok {
            passed += 1;
        } else {
            reasons.push(reason);
        }
    };

    match kind {
        DataKind::MarketData => {
            if let Some(price) = fields.get("price").and_then(Value::as_f64) {
                check(
                    price.is_finite() && price > 0.0 && price <= 1_000_000.0,
                    format!("price out of range: {price}"),
                );
            }
            if let Some(volume) = fields.get("volume").and_then(Value::as_f64) {
                check(
                    volume.is_finite() && (0.0..=1_000_000_000.0).contains(&volume),
                    format!("volume out of range: {volume}"),
                );
            }
            if let Some(change) = fields.get("change").and_then(Value::as_f64) {
                check(
                    change.is_finite() && (-100.0..=100.0).contains(&change),
                    format!("change out of range: {change}"),
                );
            }
            if let Some(symbol) = fields.get("symbol").and_then(Value::as_str) {
                check(
                    !symbol.is_empty() && symbol.len() <= 10,
                    format!("implausible symbol: {symbol:?}"),
                );
            }
        }
        DataKind::News => {
            if let Some(title) = fields.get("title").and_then(Value::as_str) {
                check(
                    (10..=200).contains(&title.chars().count()),
                    "title length out of range".to_string(),
                );
            }
            if let Some(content) = fields.get("content").and_then(Value::as_str) {
                check(
                    (50..=10_000).contains(&content.chars().count()),
                    "content length out of range".to_string(),
                );
            }
            if let Some(source) = fields.get("source").and_then(Value::as_str) {
                check(!source.trim().is_empty(), "empty source".to_string());
            }
            if let Some(url) = fields.get("url").and_then(Value::as_str) {
                let parses = url::Url::parse(url)
                    .map(|u| matches!(u.scheme(), "http" | "https"))
                    .unwrap_or(false);
                check(parses, format!("invalid url: {url}"));
            }
        }
        DataKind::Sentiment => {
            if let Some(score) = fields.get("score").and_then(Value::as_f64) {
                check(
                    (-1.0..=1.0).contains(&score),
                    format!("sentiment score out of range: {score}"),
                );
            }
            if let Some(confidence) = fields.get("confidence").and_then(Value::as_f64) {
                check(
                    (0.0..=1.0).contains(&confidence),
                    format!("confidence out of range: {confidence}"),
                );
            }
            if let Some(magnitude) = fields.get("magnitude").and_then(Value::as_f64) {
                check(
                    (0.0..=1.0).contains(&magnitude),
                    format!("magnitude out of range: {magnitude}"),
                );
            }
        }
    }

    if checks == 0 {
        1.0
    } else {
        passed as f64 / checks as f64
    }
}

/// Fraction of shared numeric fields (timestamps excluded) whose value
/// moved within tolerance of the historical record. 1.0 with no
/// historical record or no comparable fields.
fn score_consistency(
    fields: &serde_json::Map<String, Value>,
    historical: Option<&serde_json::Map<String, Value>>,
) -> f64 {
    let Some(historical) = historical else {
        return 1.0;
    };

    let mut compared = 0usize;
    let mut consistent = 0usize;
    for (name, value) in fields {
        // Timestamps always move and "change" is a derived delta;
        // neither says anything about level plausibility.
        if matches!(name.as_str(), "timestamp" | "published_at" | "change") {
            continue;
        }
        let (Some(new), Some(old)) = (value.as_f64(), historical.get(name).and_then(Value::as_f64))
        else {
            continue;
        };
        compared += 1;
        if (new - old).abs() <= CONSISTENCY_TOLERANCE * old.abs().max(1.0) {
            consistent += 1;
        }
    }

    if compared == 0 {
        1.0
    } else {
        consistent as f64 / compared as f64
    }
}

/// Accepts either an epoch-seconds number (fractional allowed) or an
/// RFC 3339 string.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(epoch) = value.as_f64() {
        return Utc.timestamp_millis_opt((epoch * 1000.0) as i64).single();
    }
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
