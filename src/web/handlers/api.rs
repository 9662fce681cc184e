use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub request_id: String,
    /// Generated SQL, or a human-readable error string.
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub gen_time: f64,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub sql: String,
    /// Correlates this execution with its generation's audit row. Without
    /// it the audit update falls back to the last row.
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    /// Row JSON, the no-results marker, or an error string.
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
}

// Generation failures come back as descriptive strings in `sql`, never as
// transport-level faults
pub async fn ask_sql(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Json<AskResponse> {
    info!("Received question for SQL generation: '{}'", payload.question);

    let candidate = state.pipeline.generate_sql(&payload.question).await;

    Json(AskResponse {
        request_id: candidate.request_id,
        sql: candidate.sql_text,
        input_tokens: candidate.input_tokens,
        output_tokens: candidate.output_tokens,
        cost: candidate.cost,
        gen_time: candidate.latency,
    })
}

pub async fn run_sql(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunRequest>,
) -> Json<RunResponse> {
    let result = state
        .pipeline
        .run_sql(&payload.sql, payload.request_id.as_deref())
        .await;

    Json(RunResponse { result })
}

pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
    })
}
