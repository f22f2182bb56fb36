//! Ordered column dimensions: fixed vocabularies, day ranges and sessions.

use crate::types::{DimensionKey, Field, RawRow};
use crate::util::date_prefix;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// `day1..dayN` for every date in `start..=end`, labelled `Day N (Aug 7)`.
///
/// Empty when either bound is missing or the range is reversed.
pub fn congress_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<DimensionKey> {
    let (Some(start), Some(end)) = (start, end) else {
        return Vec::new();
    };
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .enumerate()
        .map(|(i, date)| DimensionKey {
            key: format!("day{}", i + 1),
            label: format!("Day {} ({})", i + 1, date.format("%b %-d")),
            date: Some(date.format("%Y-%m-%d").to_string()),
        })
        .collect()
}

/// The four retreat days. Dates are optional; without one a day only
/// matches rows that carry an explicit `day_key`.
pub fn retreat_days(dates: [Option<NaiveDate>; 4]) -> Vec<DimensionKey> {
    dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let date = date.map(|d| d.format("%Y-%m-%d").to_string());
            let label = match &date {
                Some(d) => format!("Day {} ({d})", i + 1),
                None => format!("Day {}", i + 1),
            };
            DimensionKey {
                key: format!("day{}", i + 1),
                label,
                date,
            }
        })
        .collect()
}

pub fn service_groups() -> Vec<DimensionKey> {
    vec![
        DimensionKey::new("thursday_rh", "TRETS"),
        DimensionKey::new("sunday_ws", "SWS"),
        DimensionKey::new("monday_bs", "MBS"),
        DimensionKey::new("sunday_koinonia", "HCF"),
    ]
}

pub const DEFAULT_SESSION_LABEL: &str = "Session";

/// Key under which a GCK row is filed: `label|date`.
pub fn session_key(row: &RawRow) -> String {
    let label = row.get(Field::SessionLabel).unwrap_or(DEFAULT_SESSION_LABEL);
    let date = row.get(Field::SessionDate).unwrap_or("");
    format!("{label}|{date}")
}

/// Distinct sessions seen in `rows`, ordered by date string.
pub fn sessions_from_rows(rows: &[RawRow]) -> Vec<DimensionKey> {
    let mut seen = HashSet::new();
    let mut sessions = Vec::new();
    for row in rows {
        let key = session_key(row);
        if !seen.insert(key.clone()) {
            continue;
        }
        let label = row.get(Field::SessionLabel).unwrap_or(DEFAULT_SESSION_LABEL);
        let date = row.get(Field::SessionDate).map(str::to_string);
        let display = match &date {
            Some(d) => format!("{label} ({d})"),
            None => label.to_string(),
        };
        sessions.push(DimensionKey {
            key,
            label: display,
            date,
        });
    }
    // Stable sort keeps first-seen order among sessions sharing a date.
    sessions.sort_by(|a, b| {
        a.date
            .as_deref()
            .unwrap_or("")
            .cmp(b.date.as_deref().unwrap_or(""))
    });
    sessions
}

/// Resolves a row to one of a set of day columns.
///
/// An explicit `day_key` wins; otherwise the registration date is matched
/// against the dates attached to the days.
#[derive(Debug, Clone)]
pub struct DayResolver {
    by_date: HashMap<String, String>,
}

impl DayResolver {
    pub fn new(days: &[DimensionKey]) -> Self {
        let by_date = days
            .iter()
            .filter_map(|d| d.date.clone().map(|date| (date, d.key.clone())))
            .collect();
        Self { by_date }
    }

    pub fn resolve(&self, row: &RawRow) -> Option<String> {
        if let Some(key) = row.get(Field::DayKey) {
            return Some(key.to_string());
        }
        let date = row.get(Field::RegistrationDate)?;
        self.by_date.get(date_prefix(date)).cloned()
    }
}
