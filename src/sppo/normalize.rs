//! Normalization of raw upstream records.
//!
//! Every field parse falls back to a default; a record is never dropped
//! because one of its fields is malformed.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use super::VehicleReport;

/// A vehicle heard from within this many minutes counts as active.
pub const ACTIVE_WINDOW_MINUTES: f64 = 5.0;

/// Line assigned to records without a usable `linha`.
pub const UNKNOWN_LINE: &str = "unknown";

const FIELD_LATITUDE: &str = "latitude";
const FIELD_LONGITUDE: &str = "longitude";
const FIELD_SPEED: &str = "velocidade";
const FIELD_TIMESTAMP: &str = "datahora";
const FIELD_LINE: &str = "linha";
const FIELD_VEHICLE: &str = "ordem";

const KNOWN_FIELDS: [&str; 6] = [
    FIELD_LATITUDE,
    FIELD_LONGITUDE,
    FIELD_SPEED,
    FIELD_TIMESTAMP,
    FIELD_LINE,
    FIELD_VEHICLE,
];

/// Parses a number or a comma-decimal string (`"-22,9068"`).
pub fn parse_decimal(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn parse_coordinate(value: Option<&Value>, limit: f64) -> f64 {
    value
        .and_then(parse_decimal)
        .filter(|v| v.abs() <= limit)
        .unwrap_or(0.0)
}

fn parse_speed(value: Option<&Value>) -> f64 {
    value
        .and_then(parse_decimal)
        .filter(|v| *v > 0.0)
        .unwrap_or(0.0)
}

/// Epoch milliseconds (number or numeric string). Unparseable input maps to
/// the Unix epoch, which the activity check then treats as long silent.
fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    let millis = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    millis
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn parse_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Normalizes one raw upstream record. Non-object input yields a report
/// made entirely of defaults.
pub fn normalize_record(raw: &Value) -> VehicleReport {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);

    let extra = fields
        .iter()
        .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    VehicleReport {
        vehicle_id: parse_text(fields.get(FIELD_VEHICLE)).unwrap_or_default(),
        line: parse_text(fields.get(FIELD_LINE)).unwrap_or_else(|| UNKNOWN_LINE.to_string()),
        latitude: parse_coordinate(fields.get(FIELD_LATITUDE), 90.0),
        longitude: parse_coordinate(fields.get(FIELD_LONGITUDE), 180.0),
        speed_kmh: parse_speed(fields.get(FIELD_SPEED)),
        observed_at: parse_timestamp(fields.get(FIELD_TIMESTAMP)),
        extra,
    }
}

/// Moving, or heard from within [`ACTIVE_WINDOW_MINUTES`].
pub fn is_active(report: &VehicleReport, now: DateTime<Utc>) -> bool {
    let minutes_since = (now - report.observed_at).num_milliseconds() as f64 / 60_000.0;
    report.speed_kmh > 0.0 || minutes_since <= ACTIVE_WINDOW_MINUTES
}

/// Normalizes and filters in a single pass.
pub fn collect_active(raw: &[Value], now: DateTime<Utc>) -> Vec<VehicleReport> {
    raw.iter()
        .map(normalize_record)
        .filter(|report| is_active(report, now))
        .collect()
}

/// Index key for a line: trimmed and lower-cased.
pub fn normalize_line_key(line: &str) -> String {
    line.trim().to_lowercase()
}
