use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::{AuditLogger, AuditRecord};
use crate::config::PricingConfig;
use crate::db::executor::QueryExecutor;
use crate::knowledge::KnowledgeStore;
use crate::llm::prompt::{render_transcript, PromptBuilder};
use crate::llm::{extract_sql, ChatMessage, ChatModel};

/// Returned when the model answered but nothing usable could be extracted.
const EMPTY_SQL_FALLBACK: &str = "Could not generate a valid SQL query.";
/// Returned when a statement executes but yields zero rows.
pub const NO_RESULTS_MARKER: &str = "Query executed, but no results were returned.";

/// One generated SQL candidate with its full provenance. On generation
/// failure `sql_text` carries a descriptive error string instead of SQL -
/// failures are data here, never faults.
#[derive(Debug, Clone)]
pub struct SqlCandidate {
    pub request_id: String,
    pub sql_text: String,
    pub prompt: Vec<ChatMessage>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cost: Option<f64>,
    /// Model round-trip in seconds.
    pub latency: f64,
}

/// Pipeline coordinator: retrieval, prompt assembly, generation, cost
/// accounting and audit logging for the generate path; execution plus
/// audit update for the run path.
pub struct SqlPipeline {
    knowledge: Arc<dyn KnowledgeStore>,
    model: Arc<dyn ChatModel>,
    prompts: PromptBuilder,
    executor: QueryExecutor,
    audit: Arc<AuditLogger>,
    pricing: PricingConfig,
}

impl SqlPipeline {
    pub fn new(
        knowledge: Arc<dyn KnowledgeStore>,
        model: Arc<dyn ChatModel>,
        prompts: PromptBuilder,
        executor: QueryExecutor,
        audit: Arc<AuditLogger>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            knowledge,
            model,
            prompts,
            executor,
            audit,
            pricing,
        }
    }

    /// Cost of one completion from reported token usage; absent when the
    /// backend did not report both counts.
    fn completion_cost(&self, input_tokens: Option<u64>, output_tokens: Option<u64>) -> Option<f64> {
        let input = input_tokens? as f64;
        let output = output_tokens? as f64;
        Some(
            (input * self.pricing.input_token_rate + output * self.pricing.output_token_rate)
                * self.pricing.cost_multiplier,
        )
    }

    /// Generates a SQL candidate for a question. Never errors past this
    /// boundary: retrieval failures degrade the prompt, generation failures
    /// become descriptive strings, and an audit row is emitted either way.
    pub async fn generate_sql(&self, question: &str) -> SqlCandidate {
        let request_id = Uuid::new_v4().to_string();
        info!("Generating SQL for question: {}", question);

        // A failed lookup just shrinks the grounding context
        let (examples, ddl, docs) = tokio::join!(
            self.knowledge.similar_examples(question),
            self.knowledge.relevant_ddl(question),
            self.knowledge.relevant_docs(question),
        );
        let examples = examples.unwrap_or_else(|e| {
            warn!("Example retrieval failed: {}", e);
            Vec::new()
        });
        let ddl = ddl.unwrap_or_else(|e| {
            warn!("DDL retrieval failed: {}", e);
            Vec::new()
        });
        let docs = docs.unwrap_or_else(|e| {
            warn!("Documentation retrieval failed: {}", e);
            Vec::new()
        });

        let prompt = self.prompts.build(question, &examples, &ddl, &docs);

        let started = Instant::now();
        let outcome = self.model.complete(&prompt).await;
        let latency = started.elapsed().as_secs_f64();

        let (sql_text, input_tokens, output_tokens) = match outcome {
            Ok(completion) => {
                let sql = extract_sql(&completion.content);
                let sql = if sql.trim().is_empty() {
                    EMPTY_SQL_FALLBACK.to_string()
                } else {
                    sql
                };
                info!("Generated SQL: {}", sql);
                (sql, completion.input_tokens, completion.output_tokens)
            }
            Err(e) => {
                error!("SQL generation failed: {}", e);
                (format!("Error generating SQL query: {}", e), None, None)
            }
        };
        let cost = self.completion_cost(input_tokens, output_tokens);

        let record = AuditRecord {
            question: question.to_string(),
            prompt: render_transcript(&prompt),
            llm_input_tokens: input_tokens,
            llm_output_tokens: output_tokens,
            llm_cost: cost,
            sql_gen_time: latency,
            sql_query: sql_text.clone(),
        };
        let audit = Arc::clone(&self.audit);
        let id = request_id.clone();
        // Audit failures never fail the user-facing request
        let appended = tokio::task::spawn_blocking(move || audit.append(&id, record)).await;
        match appended {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to append audit row: {}", e),
            Err(e) => error!("Audit task failed: {}", e),
        }

        SqlCandidate {
            request_id,
            sql_text,
            prompt,
            input_tokens,
            output_tokens,
            cost,
            latency,
        }
    }

    /// Runs a statement and records the fetch outcome on the matching audit
    /// row. Returns serialized rows, the no-results marker, or an error
    /// string - database errors are domain feedback, surfaced verbatim.
    pub async fn run_sql(&self, sql: &str, request_id: Option<&str>) -> String {
        info!("Executing SQL query: {}", sql);

        let sql = normalize_quoting(sql);
        let started = Instant::now();
        let (fetch_time, result) = match self.executor.execute(&sql).await {
            Ok(outcome) => {
                let rendered = if outcome.rows.is_empty() {
                    NO_RESULTS_MARKER.to_string()
                } else {
                    serde_json::to_string(&outcome.rows)
                        .unwrap_or_else(|e| format!("Error serializing query result: {}", e))
                };
                (outcome.fetch_time, rendered)
            }
            Err(e) => {
                error!("SQL execution failed: {}", e);
                (
                    started.elapsed().as_secs_f64(),
                    format!("Error executing SQL query: {}", e),
                )
            }
        };

        let audit = Arc::clone(&self.audit);
        let id = request_id.map(str::to_string);
        let recorded = result.clone();
        let updated = tokio::task::spawn_blocking(move || {
            audit.update_fetch(id.as_deref(), fetch_time, &recorded)
        })
        .await;
        match updated {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to update audit row: {}", e),
            Err(e) => error!("Audit task failed: {}", e),
        }

        result
    }
}

/// DuckDB has no backtick quoting; rewrite MySQL-style quoted identifiers
/// before execution.
fn normalize_quoting(sql: &str) -> String {
    let re = regex::Regex::new("`([A-Za-z0-9_]+)`").unwrap();
    re.replace_all(sql, "\"$1\"").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::knowledge::memory::MemoryKnowledgeStore;
    use crate::knowledge::{DdlEntry, DocEntry, SqlExample};
    use crate::llm::{Completion, LlmError, Role};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FixedModel {
        content: String,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
    }

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<Completion, LlmError> {
            Ok(Completion {
                content: self.content.clone(),
                input_tokens: self.input_tokens,
                output_tokens: self.output_tokens,
            })
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<Completion, LlmError> {
            Err(LlmError::ConnectionError("operation timed out".to_string()))
        }
    }

    async fn seeded_store() -> Arc<MemoryKnowledgeStore> {
        let store = MemoryKnowledgeStore::new(5);
        store
            .add_example(SqlExample {
                question: "How many total clients does the bank have?".to_string(),
                sql: "SELECT COUNT(client_id) FROM client;".to_string(),
            })
            .await
            .unwrap();
        store
            .add_ddl(DdlEntry {
                statement: "CREATE TABLE `client` (\n  `client_id` INT\n);".to_string(),
            })
            .await
            .unwrap();
        store
            .add_doc(DocEntry {
                text: "Table `client`: demographic information about clients.".to_string(),
            })
            .await
            .unwrap();
        Arc::new(store)
    }

    fn pricing(multiplier: f64) -> PricingConfig {
        PricingConfig {
            input_token_rate: 1.5e-6,
            output_token_rate: 6e-6,
            cost_multiplier: multiplier,
        }
    }

    async fn build_pipeline(
        model: Arc<dyn ChatModel>,
        multiplier: f64,
        dir: &TempDir,
    ) -> (SqlPipeline, std::path::PathBuf) {
        let log_path = dir.path().join("query_log.csv");
        let executor = QueryExecutor::new(&DatabaseConfig {
            connection_string: ":memory:".to_string(),
            pool_size: 1,
        })
        .unwrap();
        let audit = Arc::new(AuditLogger::new(log_path.clone()).unwrap());
        let pipeline = SqlPipeline::new(
            seeded_store().await,
            model,
            PromptBuilder::new(None),
            executor,
            audit,
            pricing(multiplier),
        );
        (pipeline, log_path)
    }

    fn read_rows(path: &std::path::Path) -> Vec<csv::StringRecord> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.records().map(|r| r.unwrap()).collect()
    }

    #[tokio::test]
    async fn generates_sql_and_appends_audit_row() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "```sql\nSELECT COUNT(client_id) FROM client;\n```".to_string(),
            input_tokens: Some(100),
            output_tokens: Some(50),
        });
        let (pipeline, log_path) = build_pipeline(model, 1.0, &dir).await;

        let candidate = pipeline
            .generate_sql("How many total clients does the bank have?")
            .await;

        assert_eq!(candidate.sql_text, "SELECT COUNT(client_id) FROM client;");
        assert!(candidate.latency >= 0.0);

        let rows = read_rows(&log_path);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get(0).unwrap(),
            "How many total clients does the bank have?"
        );
        assert!(rows[0].get(5).unwrap().parse::<f64>().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn cost_follows_the_documented_formula() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "SELECT 1;".to_string(),
            input_tokens: Some(100),
            output_tokens: Some(50),
        });
        // Unit multiplier isolates the per-token subtotal
        let (pipeline, _) = build_pipeline(model, 1.0, &dir).await;

        let candidate = pipeline.generate_sql("anything").await;
        let cost = candidate.cost.unwrap();
        assert!((cost - 0.00045).abs() < 1e-12);
    }

    #[tokio::test]
    async fn cost_is_scaled_by_the_configured_multiplier() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "SELECT 1;".to_string(),
            input_tokens: Some(100),
            output_tokens: Some(50),
        });
        let (pipeline, _) = build_pipeline(model, 1e-6, &dir).await;

        let candidate = pipeline.generate_sql("anything").await;
        let cost = candidate.cost.unwrap();
        assert!((cost - 0.00045e-6).abs() < 1e-18);
    }

    #[tokio::test]
    async fn absent_token_counts_yield_absent_cost() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "SELECT 1;".to_string(),
            input_tokens: None,
            output_tokens: Some(50),
        });
        let (pipeline, _) = build_pipeline(model, 1.0, &dir).await;

        let candidate = pipeline.generate_sql("anything").await;
        assert!(candidate.cost.is_none());
    }

    #[tokio::test]
    async fn prompt_contains_grounding_before_the_question() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "SELECT COUNT(client_id) FROM client;".to_string(),
            input_tokens: Some(10),
            output_tokens: Some(5),
        });
        let (pipeline, _) = build_pipeline(model, 1.0, &dir).await;

        let question = "How many total clients does the bank have?";
        let candidate = pipeline.generate_sql(question).await;

        let prompt = &candidate.prompt;
        assert!(prompt[0].content.contains("CREATE TABLE `client`"));
        let example_pos = prompt
            .iter()
            .position(|m| m.role == Role::Assistant)
            .unwrap();
        let question_pos = prompt.len() - 1;
        assert!(example_pos < question_pos);
        assert_eq!(prompt[question_pos].content, question);
    }

    #[tokio::test]
    async fn empty_knowledge_store_degrades_to_a_bare_prompt() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("query_log.csv");
        let executor = QueryExecutor::new(&DatabaseConfig {
            connection_string: ":memory:".to_string(),
            pool_size: 1,
        })
        .unwrap();
        let pipeline = SqlPipeline::new(
            Arc::new(MemoryKnowledgeStore::new(5)),
            Arc::new(FixedModel {
                content: "SELECT 1;".to_string(),
                input_tokens: Some(10),
                output_tokens: Some(5),
            }),
            PromptBuilder::new(None),
            executor,
            Arc::new(AuditLogger::new(log_path).unwrap()),
            pricing(1.0),
        );

        // All three lookups fail on empty collections; generation proceeds
        // with an instructions-only prompt.
        let candidate = pipeline.generate_sql("any question").await;
        assert_eq!(candidate.sql_text, "SELECT 1;");
        assert_eq!(candidate.prompt.len(), 2);
    }

    #[tokio::test]
    async fn generation_failure_is_reported_as_data_and_logged() {
        let dir = TempDir::new().unwrap();
        let (pipeline, log_path) = build_pipeline(Arc::new(FailingModel), 1.0, &dir).await;

        let candidate = pipeline.generate_sql("any question").await;

        assert!(candidate.sql_text.starts_with("Error generating SQL query:"));
        assert!(candidate.cost.is_none());

        let rows = read_rows(&log_path);
        assert_eq!(rows.len(), 1);
        assert!(rows[0]
            .get(6)
            .unwrap()
            .starts_with("Error generating SQL query:"));
        assert_eq!(rows[0].get(2).unwrap(), "");
    }

    #[tokio::test]
    async fn run_sql_returns_serialized_rows_and_updates_audit() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "SELECT 1 AS one".to_string(),
            input_tokens: Some(10),
            output_tokens: Some(5),
        });
        let (pipeline, log_path) = build_pipeline(model, 1.0, &dir).await;

        let candidate = pipeline.generate_sql("one please").await;
        let result = pipeline
            .run_sql("SELECT 1 AS one", Some(&candidate.request_id))
            .await;

        assert_eq!(result, "[{\"one\":1}]");

        let rows = read_rows(&log_path);
        assert_eq!(rows[0].get(8).unwrap(), "[{\"one\":1}]");
        assert!(rows[0].get(7).unwrap().parse::<f64>().unwrap() >= 0.0);
    }

    #[test]
    fn backtick_identifiers_are_rewritten_for_duckdb() {
        assert_eq!(
            normalize_quoting("SELECT * FROM `order` WHERE `k_symbol` = 'SIPO';"),
            "SELECT * FROM \"order\" WHERE \"k_symbol\" = 'SIPO';"
        );
        assert_eq!(normalize_quoting("SELECT 1;"), "SELECT 1;");
    }

    #[tokio::test]
    async fn run_sql_executes_backtick_quoted_statements() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "SELECT 1;".to_string(),
            input_tokens: None,
            output_tokens: None,
        });
        let (pipeline, _) = build_pipeline(model, 1.0, &dir).await;

        pipeline.generate_sql("quoted please").await;
        let result = pipeline.run_sql("SELECT 1 AS `one`", None).await;
        assert_eq!(result, "[{\"one\":1}]");
    }

    #[tokio::test]
    async fn run_sql_reports_the_no_results_marker() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "SELECT 1;".to_string(),
            input_tokens: None,
            output_tokens: None,
        });
        let (pipeline, _) = build_pipeline(model, 1.0, &dir).await;

        pipeline.generate_sql("empty please").await;
        let result = pipeline.run_sql("SELECT 1 WHERE 1=0", None).await;
        assert_eq!(result, NO_RESULTS_MARKER);
    }

    #[tokio::test]
    async fn run_sql_surfaces_database_errors_and_records_them() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(FixedModel {
            content: "SELECT 1;".to_string(),
            input_tokens: None,
            output_tokens: None,
        });
        let (pipeline, log_path) = build_pipeline(model, 1.0, &dir).await;

        let candidate = pipeline.generate_sql("bad table").await;
        let result = pipeline
            .run_sql("SELECT * FROM nonexistent_table", Some(&candidate.request_id))
            .await;

        assert!(result.starts_with("Error executing SQL query:"));

        let rows = read_rows(&log_path);
        assert!(rows[0]
            .get(8)
            .unwrap()
            .starts_with("Error executing SQL query:"));
    }
}
