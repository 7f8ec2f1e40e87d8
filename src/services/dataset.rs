//! Bike-counter dataset loader.
//!
//! Reads the Paris counter export (Parquet or CSV) with polars and converts
//! the columns the dashboard needs into typed [`Reading`]s:
//! - `date`: native datetime/date column, or a timestamp string; zoned
//!   datetimes are read as wall-clock time in their own zone
//! - `counter_name`: sensor identifier, also used as its display name
//! - `latitude` / `longitude`: WGS84 coordinates of the sensor
//! - `bike_count`: number of cyclists counted, a non-negative integer
//!
//! Any null or unparseable value aborts the whole load; rows are never
//! silently dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use polars::prelude::{
    Column, DataFrame, DataType, LazyCsvReader, LazyFileListReader, ParquetReader, PolarsError,
    SerReader, TimeUnit,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use utoipa::ToSchema;

pub const DATE_COLUMN: &str = "date";
pub const COUNTER_NAME_COLUMN: &str = "counter_name";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const BIKE_COUNT_COLUMN: &str = "bike_count";

/// Rows scanned by the CSV reader to infer column types.
const CSV_INFER_SCHEMA_ROWS: usize = 10_000;

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Errors that can occur while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error reading dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read table: {0}")]
    Polars(#[from] PolarsError),
    #[error("Unsupported dataset format: '{0}' (expected .parquet or .csv)")]
    UnsupportedFormat(String),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid value in column '{column}' at row {row}: {message}")]
    InvalidValue {
        column: String,
        row: usize,
        message: String,
    },
}

/// One measurement from one counter.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Measurement time, as wall-clock time stored in the file
    pub timestamp: NaiveDateTime,
    /// Sensor identifier and display name
    pub counter_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Cyclists counted during the measurement interval
    pub bike_count: u32,
}

/// A counter location for the map, one per distinct `counter_name`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorLocation {
    /// Counter name (shown in the marker popup)
    pub name: String,
    /// Latitude (WGS84)
    pub latitude: f64,
    /// Longitude (WGS84)
    pub longitude: f64,
}

/// The full in-memory table, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    readings: Vec<Reading>,
}

impl Dataset {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    /// Convert a loaded frame into typed readings.
    ///
    /// Only the required columns are read; any extra columns are ignored.
    pub fn from_frame(df: &DataFrame) -> Result<Self, DatasetError> {
        let timestamps = timestamps(required_column(df, DATE_COLUMN)?)?;
        let names = strings(required_column(df, COUNTER_NAME_COLUMN)?, COUNTER_NAME_COLUMN)?;
        let latitudes = coordinates(required_column(df, LATITUDE_COLUMN)?, LATITUDE_COLUMN)?;
        let longitudes = coordinates(required_column(df, LONGITUDE_COLUMN)?, LONGITUDE_COLUMN)?;
        let counts = bike_counts(required_column(df, BIKE_COUNT_COLUMN)?)?;

        let readings = timestamps
            .into_iter()
            .zip(names)
            .zip(latitudes.into_iter().zip(longitudes))
            .zip(counts)
            .map(
                |(((timestamp, counter_name), (latitude, longitude)), bike_count)| Reading {
                    timestamp,
                    counter_name,
                    latitude,
                    longitude,
                    bike_count,
                },
            )
            .collect();

        Ok(Self::new(readings))
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// One location per distinct counter, using the first row seen for it.
    ///
    /// Coordinates are constant per counter, so which row wins does not
    /// matter; first-seen keeps the output deterministic.
    pub fn sensor_locations(&self) -> Vec<SensorLocation> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.readings
            .iter()
            .filter(|r| seen.insert(r.counter_name.as_str()))
            .map(|r| SensorLocation {
                name: r.counter_name.clone(),
                latitude: r.latitude,
                longitude: r.longitude,
            })
            .collect()
    }

    /// Mean latitude/longitude over every reading, or `None` when empty.
    ///
    /// Busy counters weigh more than quiet ones since each row counts once.
    pub fn mean_position(&self) -> Option<(f64, f64)> {
        if self.readings.is_empty() {
            return None;
        }
        let n = self.readings.len() as f64;
        let (lat_sum, lon_sum) = self
            .readings
            .iter()
            .fold((0.0, 0.0), |(lat, lon), r| (lat + r.latitude, lon + r.longitude));
        Some((lat_sum / n, lon_sum / n))
    }
}

/// Load the dataset at `path`, choosing the reader by file extension.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let started = Instant::now();
    let df = read_frame(path)?;
    let dataset = Dataset::from_frame(&df)?;

    tracing::info!(
        "Loaded {} readings ({} counters) from {} in {} ms",
        dataset.len(),
        dataset.sensor_locations().len(),
        path.display(),
        started.elapsed().as_millis()
    );

    Ok(dataset)
}

/// Read the raw table without interpreting any column.
fn read_frame(path: &Path) -> Result<DataFrame, DatasetError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "parquet" => {
            let file = std::fs::File::open(path)?;
            Ok(ParquetReader::new(file).finish()?)
        }
        "csv" => {
            // Surface a missing file as an IO error rather than a polars one
            std::fs::metadata(path)?;
            let df = LazyCsvReader::new(path)
                .with_has_header(true)
                .with_infer_schema_length(Some(CSV_INFER_SCHEMA_ROWS))
                .finish()?
                .collect()?;
            Ok(df)
        }
        _ => Err(DatasetError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Parse a timestamp string as written by common exports.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.f]`, the same with a `T` separator,
/// RFC 3339 (keeping the wall-clock time), or a bare `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, DatasetError> {
    df.column(name)
        .map_err(|_| DatasetError::MissingColumn(name.to_string()))
}

fn invalid(column: &str, row: usize, message: impl Into<String>) -> DatasetError {
    DatasetError::InvalidValue {
        column: column.to_string(),
        row,
        message: message.into(),
    }
}

fn timestamps(column: &Column) -> Result<Vec<NaiveDateTime>, DatasetError> {
    match column.dtype() {
        DataType::Datetime(unit, time_zone) => {
            let unit = *unit;
            let zone = match time_zone {
                Some(name) => Some(name.as_str().parse::<Tz>().map_err(|_| {
                    invalid(DATE_COLUMN, 0, format!("unknown time zone '{}'", name))
                })?),
                None => None,
            };
            let raw = column.cast(&DataType::Int64)?;
            let values = raw.i64()?;
            values
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let value = value.ok_or_else(|| invalid(DATE_COLUMN, row, "null timestamp"))?;
                    let timestamp = match zone {
                        Some(zone) => epoch_to_local(value, unit, zone),
                        None => epoch_to_naive(value, unit),
                    };
                    timestamp.ok_or_else(|| {
                        invalid(DATE_COLUMN, row, format!("timestamp {} out of range", value))
                    })
                })
                .collect()
        }
        DataType::Date => {
            let raw = column.cast(&DataType::Int32)?;
            let values = raw.i32()?;
            values
                .into_iter()
                .enumerate()
                .map(|(row, days)| {
                    let days = days.ok_or_else(|| invalid(DATE_COLUMN, row, "null date"))?;
                    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
                        .and_then(NaiveDate::from_num_days_from_ce_opt)
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .ok_or_else(|| {
                            invalid(DATE_COLUMN, row, format!("date {} out of range", days))
                        })
                })
                .collect()
        }
        DataType::String => column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let value = value.ok_or_else(|| invalid(DATE_COLUMN, row, "null timestamp"))?;
                parse_timestamp(value).ok_or_else(|| {
                    invalid(DATE_COLUMN, row, format!("unparseable timestamp '{}'", value))
                })
            })
            .collect(),
        other => Err(invalid(
            DATE_COLUMN,
            0,
            format!("unsupported column type {}", other),
        )),
    }
}

fn epoch_to_utc(value: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    let (per_second, nanos_per_unit) = match unit {
        TimeUnit::Nanoseconds => (1_000_000_000, 1),
        TimeUnit::Microseconds => (1_000_000, 1_000),
        TimeUnit::Milliseconds => (1_000, 1_000_000),
    };
    let seconds = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * nanos_per_unit;
    DateTime::from_timestamp(seconds, nanos as u32)
}

/// Convert an epoch offset in `unit` to a naive UTC date-time.
fn epoch_to_naive(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    epoch_to_utc(value, unit).map(|dt| dt.naive_utc())
}

/// Convert an epoch offset in `unit` to the wall-clock time in `zone`.
fn epoch_to_local(value: i64, unit: TimeUnit, zone: Tz) -> Option<NaiveDateTime> {
    epoch_to_utc(value, unit).map(|dt| dt.with_timezone(&zone).naive_local())
}

fn strings(column: &Column, name: &str) -> Result<Vec<String>, DatasetError> {
    let raw = column.cast(&DataType::String)?;
    let values = raw.str()?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(invalid(name, row, "missing value")),
        })
        .collect()
}

fn coordinates(column: &Column, name: &str) -> Result<Vec<f64>, DatasetError> {
    let raw = column.cast(&DataType::Float64)?;
    let values = raw.f64()?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(invalid(name, row, format!("non-finite coordinate {}", v))),
            None => Err(invalid(name, row, "missing or non-numeric value")),
        })
        .collect()
}

fn bike_counts(column: &Column) -> Result<Vec<u32>, DatasetError> {
    let raw = column.cast(&DataType::Float64)?;
    let values = raw.f64()?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let v = value.ok_or_else(|| {
                invalid(BIKE_COUNT_COLUMN, row, "missing or non-numeric value")
            })?;
            // Counts are often stored as floats (e.g. 3.0); only whole values are accepted
            if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) {
                return Err(invalid(
                    BIKE_COUNT_COLUMN,
                    row,
                    format!("expected a non-negative integer count, got {}", v),
                ));
            }
            Ok(v as u32)
        })
        .collect()
}
