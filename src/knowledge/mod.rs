pub mod corpus;
pub mod memory;
pub mod remote;

use crate::config::KnowledgeConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub enum RetrievalError {
    ConnectionError(String),
    BackendError(String),
    EmptyCollection(&'static str),
    ConfigError(String),
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalError::ConnectionError(msg) => {
                write!(f, "Knowledge store connection error: {}", msg)
            }
            RetrievalError::BackendError(msg) => {
                write!(f, "Knowledge store backend error: {}", msg)
            }
            RetrievalError::EmptyCollection(name) => {
                write!(f, "Knowledge collection '{}' is empty", name)
            }
            RetrievalError::ConfigError(msg) => {
                write!(f, "Knowledge store configuration error: {}", msg)
            }
        }
    }
}

impl Error for RetrievalError {}

/// A prior question paired with the SQL that answers it, retrieved as a
/// few-shot demonstration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlExample {
    pub question: String,
    pub sql: String,
}

/// One schema definition fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdlEntry {
    pub statement: String,
}

/// One free-form schema explanation passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocEntry {
    pub text: String,
}

/// Similarity search over the three knowledge collections. The neighbor
/// count is fixed at construction; callers just ask for relevant items.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn similar_examples(&self, question: &str) -> Result<Vec<SqlExample>, RetrievalError>;
    async fn relevant_ddl(&self, question: &str) -> Result<Vec<DdlEntry>, RetrievalError>;
    async fn relevant_docs(&self, question: &str) -> Result<Vec<DocEntry>, RetrievalError>;

    async fn add_example(&self, example: SqlExample) -> Result<(), RetrievalError>;
    async fn add_ddl(&self, entry: DdlEntry) -> Result<(), RetrievalError>;
    async fn add_doc(&self, entry: DocEntry) -> Result<(), RetrievalError>;
}

/// The record sets a store is seeded with.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub ddl: Vec<DdlEntry>,
    pub docs: Vec<DocEntry>,
    pub examples: Vec<SqlExample>,
}

pub fn build_store(config: &KnowledgeConfig) -> Result<Arc<dyn KnowledgeStore>, RetrievalError> {
    match config.backend.as_str() {
        "remote" => Ok(Arc::new(remote::RemoteKnowledgeStore::new(config)?)),
        "memory" => Ok(Arc::new(memory::MemoryKnowledgeStore::new(config.max_results))),
        other => Err(RetrievalError::ConfigError(format!(
            "Unsupported knowledge backend: {}",
            other
        ))),
    }
}

/// Loads every corpus record into the store. Runs once, outside the
/// request-serving path.
pub async fn seed(store: &dyn KnowledgeStore, corpus: &Corpus) -> Result<(), RetrievalError> {
    for entry in &corpus.ddl {
        store.add_ddl(entry.clone()).await?;
    }
    for entry in &corpus.docs {
        store.add_doc(entry.clone()).await?;
    }
    for example in &corpus.examples {
        store.add_example(example.clone()).await?;
    }
    info!(
        "Seeded knowledge store: {} DDL statements, {} documentation entries, {} examples",
        corpus.ddl.len(),
        corpus.docs.len(),
        corpus.examples.len()
    );
    Ok(())
}
