//! Weekday aggregation of bike counts for a selected month.
//!
//! Calendar fields are derived from each reading's timestamp using English
//! names (`%A` / `%B`), the month filter is an exact name match, and the
//! output follows the fixed Monday-first week regardless of which weekday
//! appears first in the data.

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::dataset::Dataset;

/// Canonical display order of weekdays.
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Mean bike count for one weekday within the selected month.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeekdayAverage {
    /// Weekday name (e.g. "Monday")
    pub weekday: String,
    /// Mean number of cyclists per reading on that weekday
    pub mean_bike_count: f64,
    /// Number of readings averaged
    pub observations: usize,
}

/// English month name, e.g. "January".
pub fn month_name(ts: &NaiveDateTime) -> String {
    ts.format("%B").to_string()
}

/// Month names present in the dataset, deduplicated, in first-seen order.
pub fn month_options(dataset: &Dataset) -> Vec<String> {
    let mut months: Vec<String> = Vec::new();
    for reading in dataset.readings() {
        let name = month_name(&reading.timestamp);
        if !months.contains(&name) {
            months.push(name);
        }
    }
    months
}

/// Mean bike count per weekday for readings whose month name equals `month`.
///
/// Weekdays with no readings in that month are omitted, so the result holds
/// between zero and seven rows, always in Monday-first order.
pub fn average_by_weekday(dataset: &Dataset, month: &str) -> Vec<WeekdayAverage> {
    // (sum, count) indexed by days from Monday
    let mut groups = [(0u64, 0usize); 7];

    for reading in dataset.readings() {
        if month_name(&reading.timestamp) != month {
            continue;
        }
        let slot = &mut groups[reading.timestamp.weekday().num_days_from_monday() as usize];
        slot.0 += u64::from(reading.bike_count);
        slot.1 += 1;
    }

    WEEKDAY_ORDER
        .iter()
        .zip(groups)
        .filter(|(_, (_, count))| *count > 0)
        .map(|(day, (sum, count))| WeekdayAverage {
            weekday: weekday_label(*day).to_string(),
            mean_bike_count: sum as f64 / count as f64,
            observations: count,
        })
        .collect()
}

/// English weekday name, matching `%A`.
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
