//! GET /: the dashboard page.
//!
//! The page draws the counter map with Leaflet and the weekday bar chart
//! with Plotly, calling the JSON endpoints whenever the month changes.

use axum::response::Html;

const DASHBOARD_HTML: &str = include_str!("../../static/dashboard.html");

pub async fn dashboard_page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
