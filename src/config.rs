/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Parquet or CSV file with the counter readings.
    pub dataset_path: String,
    pub port: u16,
    /// Initial zoom level of the counter map.
    pub map_zoom: u8,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            dataset_path: std::env::var("DATASET_PATH")
                .unwrap_or_else(|_| "./data/train.parquet".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            map_zoom: std::env::var("MAP_ZOOM")
                .unwrap_or_else(|_| "13".to_string())
                .parse()
                .expect("MAP_ZOOM must be a valid u8"),
        }
    }
}
