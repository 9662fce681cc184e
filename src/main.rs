use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

mod audit;
mod config;
mod db;
mod knowledge;
mod llm;
mod pipeline;
mod util;
mod web;

use crate::audit::AuditLogger;
use crate::config::{AppConfig, CliArgs};
use crate::db::executor::QueryExecutor;
use crate::knowledge::corpus;
use crate::llm::prompt::PromptBuilder;
use crate::llm::LlmManager;
use crate::pipeline::SqlPipeline;
use crate::util::logging::init_tracing;
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Initializing knowledge store with backend: {}",
        config.knowledge.backend
    );
    let store = knowledge::build_store(&config.knowledge)?;

    if args.seed {
        info!("Seeding knowledge store from the built-in corpus");
        knowledge::seed(store.as_ref(), &corpus::builtin()).await?;
        info!("Seeding complete");
        return Ok(());
    }

    // The in-memory backend holds nothing between runs, so it is seeded on
    // every start. The remote store is seeded once via --seed.
    if config.knowledge.backend == "memory" {
        knowledge::seed(store.as_ref(), &corpus::builtin()).await?;
    }

    info!("Initializing LLM backend: {}", config.llm.backend);
    let model = LlmManager::new(&config.llm)?;

    info!(
        "Opening DuckDB connection pool at {}",
        config.database.connection_string
    );
    let executor = QueryExecutor::new(&config.database)?;

    let audit = AuditLogger::new(config.audit.log_path.clone().into())?;

    let pipeline = Arc::new(SqlPipeline::new(
        store,
        Arc::new(model),
        PromptBuilder::new(config.llm.instructions.clone()),
        executor,
        Arc::new(audit),
        config.pricing.clone(),
    ));

    let app_state = Arc::new(AppState::new(config.clone(), pipeline));

    // The pool, HTTP clients and audit log all live inside the state for the
    // process lifetime and drop on every exit path once the server drains.
    info!(
        "Starting nl-teller server on {}:{}",
        config.web.host, config.web.port
    );
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
