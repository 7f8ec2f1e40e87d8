pub mod dataset;
pub mod health;
pub mod page;
pub mod sensors;
pub mod weekday;

use crate::errors::AppError;
use crate::services::dashboard::{Dashboard, SharedDashboard};

/// Run a controller call on the blocking pool.
///
/// A cache miss or reload reads and parses the whole file, which must not
/// stall the async workers serving other requests.
pub(crate) async fn run_blocking<T, F>(dashboard: SharedDashboard, work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&Dashboard) -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&dashboard))
        .await
        .map_err(|e| AppError::InternalError(format!("Dashboard task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_run_blocking_returns_result() {
        let dashboard = Arc::new(Dashboard::new("/nonexistent/train.parquet", 13));
        let path = run_blocking(dashboard.clone(), |d| Ok(d.dataset_path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(path, std::path::PathBuf::from("/nonexistent/train.parquet"));

        let err = run_blocking(dashboard, |d| d.sensor_map()).await.unwrap_err();
        assert!(matches!(err, AppError::DataAccess(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_run_blocking_keeps_runtime_responsive() {
        // A slow controller call must not block other tasks on a single-threaded runtime
        let dashboard = Arc::new(Dashboard::new("/nonexistent/train.parquet", 13));
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        let slow = tokio::spawn(run_blocking(dashboard, move |_| {
            rx.recv_timeout(std::time::Duration::from_secs(5))
                .map_err(|e| AppError::InternalError(e.to_string()))
        }));

        let ticked = tokio::spawn(async { "ticked" }).await.unwrap();
        assert_eq!(ticked, "ticked");
        tx.send(()).unwrap();
        assert!(slow.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_run_blocking_panic_is_internal_error() {
        let dashboard = Arc::new(Dashboard::new("/nonexistent/train.parquet", 13));
        let err = run_blocking(dashboard, |_| -> Result<(), AppError> {
            panic!("controller bug")
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }
}
