//! Dataset maintenance endpoint.
//!
//! POST /api/v1/dataset/reload reads the file again and swaps it into the cache.

use axum::extract::State;
use axum::Json;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::run_blocking;
use crate::services::dashboard::{DatasetSummary, SharedDashboard};

/// Reload the dataset from disk and replace the cached copy.
///
/// Use after replacing the dataset file; the cache otherwise keeps the
/// first load for the lifetime of the process. If the new file fails to
/// load, the previous dataset keeps being served.
#[utoipa::path(
    post,
    path = "/api/v1/dataset/reload",
    tag = "Dataset",
    responses(
        (status = 200, description = "Dataset reloaded", body = DatasetSummary),
        (status = 500, description = "Dataset could not be loaded", body = ErrorResponse),
    )
)]
pub async fn reload_dataset(
    State(dashboard): State<SharedDashboard>,
) -> Result<Json<DatasetSummary>, AppError> {
    let summary = run_blocking(dashboard, |d| d.reload()).await?;
    tracing::info!(
        "Reloaded {}: {} rows, {} counters",
        summary.path,
        summary.rows,
        summary.sensors
    );
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dashboard::Dashboard;
    use crate::services::dataset::test_support::{write_csv, SAMPLE_CSV};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reload_summary() {
        let file = write_csv(SAMPLE_CSV);
        let dashboard = Arc::new(Dashboard::new(file.path(), 13));
        let Json(summary) = reload_dataset(State(dashboard)).await.unwrap();
        assert_eq!(summary.rows, 6);
        assert_eq!(summary.sensors, 3);
        assert_eq!(summary.months, vec!["September", "October"]);
    }
}
