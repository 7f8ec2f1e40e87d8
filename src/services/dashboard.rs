//! Dashboard controller.
//!
//! Each user interaction maps to one call here: the map view is built from
//! the deduplicated counters, and every month selection runs a fresh weekday
//! aggregation over the cached dataset.

use chrono::Month;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::services::cache::DatasetCache;
use crate::services::dataset::{load_dataset, Dataset, SensorLocation};
use crate::services::weekday::{average_by_weekday, month_options, WeekdayAverage};

const CHART_X_AXIS_TITLE: &str = "Day of the Week";
const CHART_Y_AXIS_TITLE: &str = "Average number of cyclists";

/// Initial map position.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MapCenter {
    /// Latitude (WGS84)
    pub latitude: f64,
    /// Longitude (WGS84)
    pub longitude: f64,
}

/// Everything the page needs to draw the counter map.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SensorMap {
    /// Mean position of all readings; null when the dataset is empty
    pub center: Option<MapCenter>,
    /// Initial zoom level
    pub zoom: u8,
    /// One marker per counter
    pub markers: Vec<SensorLocation>,
}

/// Bar chart of average cyclists per weekday for one month.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeekdayChart {
    /// Selected month (e.g. "January")
    pub month: String,
    /// Chart title
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    /// Bars in Monday-first order; weekdays without readings are omitted
    pub rows: Vec<WeekdayAverage>,
}

/// Summary of a freshly loaded dataset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DatasetSummary {
    /// Path the dataset was read from
    pub path: String,
    /// Number of readings
    pub rows: usize,
    /// Number of distinct counters
    pub sensors: usize,
    /// Month names present, in first-seen order
    pub months: Vec<String>,
}

/// Controller over one dataset file.
#[derive(Debug)]
pub struct Dashboard {
    cache: DatasetCache,
    dataset_path: PathBuf,
    map_zoom: u8,
}

/// Shared controller handle for route state.
pub type SharedDashboard = Arc<Dashboard>;

impl Dashboard {
    pub fn new(dataset_path: impl Into<PathBuf>, map_zoom: u8) -> Self {
        Self {
            cache: DatasetCache::new(),
            dataset_path: dataset_path.into(),
            map_zoom,
        }
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    /// The cached dataset, loading it on first use.
    pub fn dataset(&self) -> Result<Arc<Dataset>, AppError> {
        Ok(self.cache.get_or_load(&self.dataset_path)?)
    }

    pub fn sensor_locations(&self) -> Result<Vec<SensorLocation>, AppError> {
        Ok(self.dataset()?.sensor_locations())
    }

    pub fn sensor_map(&self) -> Result<SensorMap, AppError> {
        let dataset = self.dataset()?;
        Ok(SensorMap {
            center: dataset
                .mean_position()
                .map(|(latitude, longitude)| MapCenter {
                    latitude,
                    longitude,
                }),
            zoom: self.map_zoom,
            markers: dataset.sensor_locations(),
        })
    }

    pub fn months(&self) -> Result<Vec<String>, AppError> {
        let dataset = self.dataset()?;
        Ok(month_options(&dataset))
    }

    /// Weekday averages for `month`.
    ///
    /// `month` must name a calendar month (any case, full or abbreviated);
    /// it is normalised to the English full name before filtering. A month
    /// missing from the data yields a chart with no rows.
    pub fn weekday_chart(&self, month: &str) -> Result<WeekdayChart, AppError> {
        let month = parse_month(month)?;
        let dataset = self.dataset()?;
        let rows = average_by_weekday(&dataset, month);

        if rows.is_empty() {
            tracing::debug!("No readings for {} in {}", month, self.dataset_path.display());
        }

        Ok(WeekdayChart {
            month: month.to_string(),
            title: format!("Avg # of cyclists per day of the week - {}", month),
            x_axis_title: CHART_X_AXIS_TITLE.to_string(),
            y_axis_title: CHART_Y_AXIS_TITLE.to_string(),
            rows,
        })
    }

    /// Read the file again and swap it into the cache.
    ///
    /// The cached dataset is only replaced once the new load succeeds, so a
    /// broken file leaves the dashboard serving the previous data.
    pub fn reload(&self) -> Result<DatasetSummary, AppError> {
        let dataset = self
            .cache
            .replace(&self.dataset_path, load_dataset(&self.dataset_path)?);
        Ok(DatasetSummary {
            path: self.dataset_path.display().to_string(),
            rows: dataset.len(),
            sensors: dataset.sensor_locations().len(),
            months: month_options(&dataset),
        })
    }
}

/// Canonical English name of a month given as free text.
fn parse_month(raw: &str) -> Result<&'static str, AppError> {
    raw.trim()
        .parse::<Month>()
        .map(|m| m.name())
        .map_err(|_| AppError::BadRequest(format!("Unknown month: '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dataset::test_support::{write_csv, CSV_HEADER, SAMPLE_CSV};
    use crate::services::dataset::DatasetError;
    use tempfile::NamedTempFile;

    /// The file guard must outlive the dashboard's first load.
    fn sample_dashboard() -> (NamedTempFile, Dashboard) {
        let file = write_csv(SAMPLE_CSV);
        let dashboard = Dashboard::new(file.path(), 13);
        (file, dashboard)
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("January").unwrap(), "January");
        assert_eq!(parse_month("september").unwrap(), "September");
        assert_eq!(parse_month(" Oct ").unwrap(), "October");
        assert!(matches!(parse_month("Smarch"), Err(AppError::BadRequest(_))));
        assert!(parse_month("").is_err());
    }

    #[test]
    fn test_weekday_chart() {
        let (_file, dashboard) = sample_dashboard();
        let chart = dashboard.weekday_chart("September").unwrap();
        assert_eq!(chart.month, "September");
        assert_eq!(chart.title, "Avg # of cyclists per day of the week - September");
        assert_eq!(chart.x_axis_title, "Day of the Week");
        assert_eq!(chart.y_axis_title, "Average number of cyclists");
        assert_eq!(chart.rows.len(), 3);
        assert_eq!(chart.rows[0].weekday, "Monday");
        assert_eq!(chart.rows[0].mean_bike_count, 111.0);
    }

    #[test]
    fn test_weekday_chart_json_shape() {
        let (_file, dashboard) = sample_dashboard();
        let chart = dashboard.weekday_chart("Oct").unwrap();
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["month"], "October");
        assert_eq!(json["rows"][0]["weekday"], "Monday");
        assert_eq!(json["rows"][0]["mean_bike_count"], 6.0);
        assert_eq!(json["rows"][0]["observations"], 2);
    }

    #[test]
    fn test_sensor_map_json_empty_center_is_null() {
        let map = SensorMap {
            center: Dataset::default()
                .mean_position()
                .map(|(latitude, longitude)| MapCenter {
                    latitude,
                    longitude,
                }),
            zoom: 12,
            markers: Vec::new(),
        };
        let json = serde_json::to_value(&map).unwrap();
        assert!(json["center"].is_null());
        assert_eq!(json["zoom"], 12);
        assert_eq!(json["markers"], serde_json::json!([]));
    }

    #[test]
    fn test_weekday_chart_absent_month_is_empty() {
        let (_file, dashboard) = sample_dashboard();
        let chart = dashboard.weekday_chart("February").unwrap();
        assert_eq!(chart.month, "February");
        assert!(chart.rows.is_empty());
    }

    #[test]
    fn test_weekday_chart_rejects_unknown_month() {
        let (_file, dashboard) = sample_dashboard();
        let err = dashboard.weekday_chart("Brumaire").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_sensor_map() {
        let (_file, dashboard) = sample_dashboard();
        let map = dashboard.sensor_map().unwrap();
        assert_eq!(map.zoom, 13);
        assert_eq!(map.markers.len(), 3);

        // Mean over all six rows, not over the three counters
        let center = map.center.unwrap();
        let expected_lat = (48.846028 * 2.0 + 48.86462 * 2.0 + 48.840801 * 2.0) / 6.0;
        assert!((center.latitude - expected_lat).abs() < 1e-9);
    }

    #[test]
    fn test_months() {
        let (_file, dashboard) = sample_dashboard();
        assert_eq!(dashboard.months().unwrap(), vec!["September", "October"]);
    }

    #[test]
    fn test_reload_picks_up_file_changes() {
        let (file, dashboard) = sample_dashboard();
        assert_eq!(dashboard.dataset().unwrap().len(), 6);

        std::fs::write(
            file.path(),
            format!("{}\nSolo,Solo site,7.0,2021-01-04 10:00:00,48.85,2.35\n", CSV_HEADER),
        )
        .unwrap();
        // Still cached
        assert_eq!(dashboard.dataset().unwrap().len(), 6);

        let summary = dashboard.reload().unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.sensors, 1);
        assert_eq!(summary.months, vec!["January"]);
        assert_eq!(dashboard.months().unwrap(), vec!["January"]);
    }

    #[test]
    fn test_failed_reload_keeps_serving_cached_dataset() {
        let (file, dashboard) = sample_dashboard();
        assert_eq!(dashboard.sensor_map().unwrap().markers.len(), 3);

        std::fs::write(
            file.path(),
            format!("{}\nSolo,Solo site,7.0,not a date,48.85,2.35\n", CSV_HEADER),
        )
        .unwrap();

        let err = dashboard.reload().unwrap_err();
        assert!(matches!(
            err,
            AppError::DataAccess(DatasetError::InvalidValue { .. })
        ));

        let map = dashboard.sensor_map().unwrap();
        assert_eq!(map.markers.len(), 3);
        assert_eq!(dashboard.dataset().unwrap().len(), 6);
        assert_eq!(
            dashboard.months().unwrap(),
            vec!["September", "October"]
        );
    }

    #[test]
    fn test_missing_dataset_is_data_access_error() {
        let dashboard = Dashboard::new("/nonexistent/paris-cyclists/train.parquet", 13);
        assert!(matches!(
            dashboard.sensor_map(),
            Err(AppError::DataAccess(_))
        ));
    }
}
