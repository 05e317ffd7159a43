//! Vehicle and fleet data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// == Vehicle Report ==
/// One GPS sample for one vehicle at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleReport {
    /// Stable per physical vehicle (upstream `ordem`)
    pub vehicle_id: String,
    /// Route identifier as reported, trimmed (upstream `linha`)
    pub line: String,
    /// Decimal degrees, 0 when the source value was malformed
    pub latitude: f64,
    /// Decimal degrees, 0 when the source value was malformed
    pub longitude: f64,
    /// Never negative
    pub speed_kmh: f64,
    pub observed_at: DateTime<Utc>,
    /// Upstream fields carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VehicleReport {
    /// A report at exactly (0, 0) came from unparseable coordinates.
    pub fn has_position(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

// == Fleet Stats ==
/// Aggregates over the current active-vehicle set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub total: usize,
    pub count_by_line: BTreeMap<String, usize>,
    /// Rounded to 2 decimals
    pub avg_speed_kmh: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl FleetStats {
    pub fn from_reports(reports: &[VehicleReport]) -> Self {
        let mut count_by_line = BTreeMap::new();
        let mut speed_sum = 0.0;
        let mut last_update: Option<DateTime<Utc>> = None;

        for report in reports {
            *count_by_line.entry(report.line.clone()).or_insert(0) += 1;
            speed_sum += report.speed_kmh;
            last_update = Some(match last_update {
                Some(latest) => latest.max(report.observed_at),
                None => report.observed_at,
            });
        }

        let avg_speed_kmh = if reports.is_empty() {
            0.0
        } else {
            (speed_sum / reports.len() as f64 * 100.0).round() / 100.0
        };

        Self {
            total: reports.len(),
            count_by_line,
            avg_speed_kmh,
            last_update,
        }
    }
}
