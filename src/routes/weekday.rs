//! Weekday chart endpoints.
//!
//! - GET /api/v1/months
//! - GET /api/v1/weekday-averages?month=January

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{AppError, ErrorResponse};
use crate::routes::run_blocking;
use crate::services::dashboard::{SharedDashboard, WeekdayChart};

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeekdayQuery {
    /// Month name (e.g. "January"; case-insensitive, abbreviations accepted)
    pub month: String,
}

/// Month names present in the dataset, for the month selector.
#[utoipa::path(
    get,
    path = "/api/v1/months",
    tag = "Weekdays",
    responses(
        (status = 200, description = "Month names in first-seen order", body = Vec<String>),
        (status = 500, description = "Dataset could not be loaded", body = ErrorResponse),
    )
)]
pub async fn list_months(
    State(dashboard): State<SharedDashboard>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(run_blocking(dashboard, |d| d.months()).await?))
}

/// Average cyclists per weekday for the selected month.
///
/// Recomputed on every request. Weekdays without readings in that month are
/// omitted; a month absent from the data returns an empty `rows` list.
#[utoipa::path(
    get,
    path = "/api/v1/weekday-averages",
    tag = "Weekdays",
    params(WeekdayQuery),
    responses(
        (status = 200, description = "Weekday averages in Monday-first order", body = WeekdayChart),
        (status = 400, description = "Not a month name", body = ErrorResponse),
        (status = 500, description = "Dataset could not be loaded", body = ErrorResponse),
    )
)]
pub async fn get_weekday_averages(
    State(dashboard): State<SharedDashboard>,
    Query(params): Query<WeekdayQuery>,
) -> Result<Json<WeekdayChart>, AppError> {
    let chart = run_blocking(dashboard, move |d| d.weekday_chart(&params.month)).await?;
    Ok(Json(chart))
}
