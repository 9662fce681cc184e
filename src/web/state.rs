use crate::config::AppConfig;
use crate::pipeline::SqlPipeline;
use std::sync::Arc;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: Arc<SqlPipeline>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: Arc<SqlPipeline>) -> Self {
        Self {
            config,
            pipeline,
            startup_time: chrono::Utc::now(),
        }
    }
}
