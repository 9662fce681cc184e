use super::{DdlEntry, DocEntry, KnowledgeStore, RetrievalError, SqlExample};
use crate::config::KnowledgeConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const EXAMPLE_COLLECTION: &str = "SqlExample";
const DDL_COLLECTION: &str = "SchemaDdl";
const DOC_COLLECTION: &str = "SchemaDoc";

/// Client for an HTTP vector-search service holding the three knowledge
/// collections. The service embeds the query text and returns nearest
/// neighbors ordered by descending similarity.
pub struct RemoteKnowledgeStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_results: usize,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    properties: Value,
}

#[derive(Serialize)]
struct InsertRequest {
    properties: Value,
}

impl RemoteKnowledgeStore {
    pub fn new(config: &KnowledgeConfig) -> Result<Self, RetrievalError> {
        let base_url = config.url.clone().ok_or_else(|| {
            RetrievalError::ConfigError(
                "knowledge.url is required for the remote knowledge store".to_string(),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RetrievalError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn query(
        &self,
        collection: &'static str,
        text: &str,
    ) -> Result<Vec<Value>, RetrievalError> {
        let url = format!("{}/collections/{}/query", self.base_url, collection);
        let request = self.authorized(self.client.post(&url)).json(&QueryRequest {
            query: text,
            limit: self.max_results,
        });

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RetrievalError::BackendError(format!(
                "vector service responded with status code: {}",
                response.status()
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::BackendError(e.to_string()))?;

        if parsed.matches.is_empty() {
            return Err(RetrievalError::EmptyCollection(collection));
        }

        Ok(parsed.matches.into_iter().map(|m| m.properties).collect())
    }

    async fn insert(
        &self,
        collection: &'static str,
        properties: Value,
    ) -> Result<(), RetrievalError> {
        let url = format!("{}/collections/{}/objects", self.base_url, collection);
        let request = self
            .authorized(self.client.post(&url))
            .json(&InsertRequest { properties });

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RetrievalError::BackendError(format!(
                "vector service responded with status code: {}",
                response.status()
            )));
        }

        Ok(())
    }
}

fn text_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl KnowledgeStore for RemoteKnowledgeStore {
    async fn similar_examples(&self, question: &str) -> Result<Vec<SqlExample>, RetrievalError> {
        let matches = self.query(EXAMPLE_COLLECTION, question).await?;
        Ok(matches
            .iter()
            .map(|m| SqlExample {
                question: text_field(m, "question"),
                sql: text_field(m, "sql"),
            })
            .collect())
    }

    async fn relevant_ddl(&self, question: &str) -> Result<Vec<DdlEntry>, RetrievalError> {
        let matches = self.query(DDL_COLLECTION, question).await?;
        Ok(matches
            .iter()
            .map(|m| DdlEntry {
                statement: text_field(m, "ddl"),
            })
            .collect())
    }

    async fn relevant_docs(&self, question: &str) -> Result<Vec<DocEntry>, RetrievalError> {
        let matches = self.query(DOC_COLLECTION, question).await?;
        Ok(matches
            .iter()
            .map(|m| DocEntry {
                text: text_field(m, "documentation"),
            })
            .collect())
    }

    async fn add_example(&self, example: SqlExample) -> Result<(), RetrievalError> {
        self.insert(
            EXAMPLE_COLLECTION,
            json!({ "question": example.question, "sql": example.sql }),
        )
        .await
    }

    async fn add_ddl(&self, entry: DdlEntry) -> Result<(), RetrievalError> {
        self.insert(DDL_COLLECTION, json!({ "ddl": entry.statement })).await
    }

    async fn add_doc(&self, entry: DocEntry) -> Result<(), RetrievalError> {
        self.insert(DOC_COLLECTION, json!({ "documentation": entry.text }))
            .await
    }
}
