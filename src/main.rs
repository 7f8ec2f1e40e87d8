// Paris Cyclists Dashboard v0.1
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod routes;
mod services;

use config::AppConfig;
use services::dashboard::{Dashboard, SharedDashboard};

/// OpenAPI document for the dashboard API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Paris Cyclists Dashboard API",
        version = "0.1.0",
        description = "Map of the Paris bike counters and average number of cyclists \
            per weekday for a selected month, computed from a static counter dataset.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Sensors", description = "Counter locations and map view"),
        (name = "Weekdays", description = "Weekday averages by month"),
        (name = "Dataset", description = "Dataset cache maintenance"),
    ),
    paths(
        routes::health::health_check,
        routes::sensors::list_sensors,
        routes::sensors::get_sensor_map,
        routes::weekday::list_months,
        routes::weekday::get_weekday_averages,
        routes::dataset::reload_dataset,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            services::dataset::SensorLocation,
            services::dashboard::MapCenter,
            services::dashboard::SensorMap,
            services::dashboard::WeekdayChart,
            services::dashboard::DatasetSummary,
            services::weekday::WeekdayAverage,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paris_cyclists=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let dashboard: SharedDashboard =
        Arc::new(Dashboard::new(&config.dataset_path, config.map_zoom));

    // Load once up front so a missing or malformed file fails at startup
    match dashboard.dataset() {
        Ok(dataset) => {
            tracing::info!(
                "Dataset ready: {} readings from {}",
                dataset.len(),
                dashboard.dataset_path().display()
            );
            if dataset.is_empty() {
                tracing::warn!("Dataset {} has no rows", dashboard.dataset_path().display());
            }
        }
        Err(e) => {
            tracing::error!(
                "Failed to load dataset {}: {}",
                dashboard.dataset_path().display(),
                e
            );
            std::process::exit(1);
        }
    }

    // CORS: GET for dashboard data, POST only for the cache reload
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(routes::page::dashboard_page))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/sensors", get(routes::sensors::list_sensors))
        .route("/api/v1/map", get(routes::sensors::get_sensor_map))
        .route("/api/v1/months", get(routes::weekday::list_months))
        .route(
            "/api/v1/weekday-averages",
            get(routes::weekday::get_weekday_averages),
        )
        .route(
            "/api/v1/dataset/reload",
            post(routes::dataset::reload_dataset),
        )
        .with_state(dashboard)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Dashboard listening on http://localhost:{}/", config.port);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
