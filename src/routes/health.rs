use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::run_blocking;
use crate::services::dashboard::SharedDashboard;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" when healthy, "degraded" when the dataset cannot be loaded)
    pub status: String,
    /// API version
    pub version: String,
    /// Number of readings in the loaded dataset, null when unavailable
    pub rows: Option<usize>,
}

/// Health check endpoint.
///
/// Returns the API status and version. Verifies the dataset is loadable
/// (served from cache after the first load). Returns status "degraded"
/// (still 200) if it is not, so load balancers can distinguish partial failures.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(dashboard): State<SharedDashboard>) -> Json<HealthResponse> {
    let rows = run_blocking(dashboard, |d| Ok(d.dataset()?.len()))
        .await
        .ok();

    Json(HealthResponse {
        status: if rows.is_some() {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        rows,
    })
}
