use clap::Parser;
use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub pool_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub backend: String, // "remote" or "ollama"
    pub model: String,   // Model name
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub max_tokens: usize,
    pub timeout_secs: u64,
    /// Overrides the built-in system instructions of the prompt builder.
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    pub backend: String, // "remote" or "memory"
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Neighbors returned per collection on every lookup.
    pub max_results: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Price per input token, in dollars.
    pub input_token_rate: f64,
    /// Price per output token, in dollars.
    pub output_token_rate: f64,
    /// Extra scale factor applied to the per-token subtotal.
    pub cost_multiplier: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuditConfig {
    pub log_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
    pub knowledge: KnowledgeConfig,
    pub pricing: PricingConfig,
    pub audit: AuditConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the audit log file
    #[arg(long)]
    pub audit_log: Option<String>,

    /// Seed the knowledge store from the built-in corpus and exit
    #[arg(long)]
    pub seed: bool,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Defaults first, so a partial config file is enough
        let mut config_builder = Config::builder()
            .set_default("database.connection_string", "financial.duckdb")?
            .set_default("database.pool_size", 4)?
            .set_default("web.host", "127.0.0.1")?
            .set_default("web.port", 3000)?
            .set_default("llm.backend", "remote")?
            .set_default("llm.model", "gpt-4.1")?
            .set_default("llm.max_tokens", 1000)?
            .set_default("llm.timeout_secs", 60)?
            .set_default("knowledge.backend", "memory")?
            .set_default("knowledge.max_results", 5)?
            .set_default("knowledge.timeout_secs", 10)?
            .set_default("pricing.input_token_rate", 1.5e-6)?
            .set_default("pricing.output_token_rate", 6e-6)?
            .set_default("pricing.cost_multiplier", 1e-6)?
            .set_default("audit.log_path", "query_log.csv")?;

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/nl-teller/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // Build the config
        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(host) = &args.host {
            config.web.host = host.clone();
        }
        if let Some(port) = args.port {
            config.web.port = port;
        }
        if let Some(audit_log) = &args.audit_log {
            config.audit.log_path = audit_log.clone();
        }

        Ok(config)
    }
}
