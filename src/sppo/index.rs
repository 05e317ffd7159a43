//! Line Index Module
//!
//! Maps normalized line keys to the vehicles currently active on them.
//! Built whole from a fetch result and never mutated afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::{normalize_line_key, VehicleReport};

#[derive(Debug, Default)]
pub struct LineIndex {
    lines: BTreeMap<String, Vec<VehicleReport>>,
    built_at: Option<DateTime<Utc>>,
}

impl LineIndex {
    /// Groups `reports` by normalized line, keeping their original order.
    pub fn build(reports: &[VehicleReport], built_at: DateTime<Utc>) -> Self {
        let mut lines: BTreeMap<String, Vec<VehicleReport>> = BTreeMap::new();
        for report in reports {
            lines
                .entry(normalize_line_key(&report.line))
                .or_default()
                .push(report.clone());
        }
        Self {
            lines,
            built_at: Some(built_at),
        }
    }

    /// Exact match on an already-normalized key.
    pub fn exact(&self, key: &str) -> Option<&[VehicleReport]> {
        self.lines.get(key).map(Vec::as_slice)
    }

    /// Union of every line whose key contains `key` or is contained by it,
    /// in key order.
    ///
    /// Deliberately loose: a short key such as `"1"` matches every line with
    /// a 1 in it.
    pub fn containing(&self, key: &str) -> Vec<VehicleReport> {
        self.lines
            .iter()
            .filter(|(line, _)| line.contains(key) || key.contains(line.as_str()))
            .flat_map(|(_, reports)| reports.iter().cloned())
            .collect()
    }

    /// Exact match first, containment fallback second.
    pub fn lookup(&self, key: &str) -> Vec<VehicleReport> {
        if key.is_empty() {
            return Vec::new();
        }
        match self.exact(key) {
            Some(reports) => reports.to_vec(),
            None => self.containing(key),
        }
    }

    /// Empty, or built more than `max_age` before `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.built_at {
            Some(built_at) if !self.lines.is_empty() => now - built_at > max_age,
            _ => true,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn vehicle_count(&self) -> usize {
        self.lines.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
