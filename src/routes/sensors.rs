//! Counter location endpoints.
//!
//! - GET /api/v1/sensors
//! - GET /api/v1/map

use axum::extract::State;
use axum::Json;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::run_blocking;
use crate::services::dashboard::{SensorMap, SharedDashboard};
use crate::services::dataset::SensorLocation;

/// List every counter once, with its coordinates.
#[utoipa::path(
    get,
    path = "/api/v1/sensors",
    tag = "Sensors",
    responses(
        (status = 200, description = "One entry per distinct counter", body = Vec<SensorLocation>),
        (status = 500, description = "Dataset could not be loaded", body = ErrorResponse),
    )
)]
pub async fn list_sensors(
    State(dashboard): State<SharedDashboard>,
) -> Result<Json<Vec<SensorLocation>>, AppError> {
    Ok(Json(run_blocking(dashboard, |d| d.sensor_locations()).await?))
}

/// Map view: initial center and zoom plus one marker per counter.
///
/// The center is the mean latitude/longitude over all readings.
#[utoipa::path(
    get,
    path = "/api/v1/map",
    tag = "Sensors",
    responses(
        (status = 200, description = "Map view of the counters", body = SensorMap),
        (status = 500, description = "Dataset could not be loaded", body = ErrorResponse),
    )
)]
pub async fn get_sensor_map(
    State(dashboard): State<SharedDashboard>,
) -> Result<Json<SensorMap>, AppError> {
    Ok(Json(run_blocking(dashboard, |d| d.sensor_map()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dashboard::Dashboard;
    use crate::services::dataset::test_support::write_csv;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_single_sensor() {
        let file = write_csv("Solo,Solo site,7.0,2021-01-04 10:00:00,48.85,2.35\n");
        let dashboard = Arc::new(Dashboard::new(file.path(), 13));

        let Json(sensors) = list_sensors(State(dashboard.clone())).await.unwrap();
        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].name, "Solo");
        assert_eq!(sensors[0].latitude, 48.85);
        assert_eq!(sensors[0].longitude, 2.35);

        let Json(map) = get_sensor_map(State(dashboard)).await.unwrap();
        assert_eq!(map.markers, sensors);
        let center = map.center.unwrap();
        assert_eq!(center.latitude, 48.85);
        assert_eq!(center.longitude, 2.35);
    }

    #[tokio::test]
    async fn test_missing_dataset() {
        let dashboard = Arc::new(Dashboard::new("/nonexistent/train.parquet", 13));
        assert!(list_sensors(State(dashboard)).await.is_err());
    }
}
