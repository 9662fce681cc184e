use super::{DdlEntry, DocEntry, KnowledgeStore, RetrievalError, SqlExample};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// In-memory knowledge store ranked by lexical token overlap with the query.
/// Stands in for the vector service in tests and offline runs.
pub struct MemoryKnowledgeStore {
    max_results: usize,
    examples: RwLock<Vec<SqlExample>>,
    ddl: RwLock<Vec<DdlEntry>>,
    docs: RwLock<Vec<DocEntry>>,
}

impl MemoryKnowledgeStore {
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            examples: RwLock::new(Vec::new()),
            ddl: RwLock::new(Vec::new()),
            docs: RwLock::new(Vec::new()),
        }
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fraction of query tokens present in the candidate text.
fn overlap(query: &HashSet<String>, text: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let candidate = tokenize(text);
    let hits = query.iter().filter(|t| candidate.contains(*t)).count();
    hits as f64 / query.len() as f64
}

fn rank<T, F>(
    items: &[T],
    query: &str,
    max_results: usize,
    collection: &'static str,
    text_of: F,
) -> Result<Vec<T>, RetrievalError>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    if items.is_empty() {
        return Err(RetrievalError::EmptyCollection(collection));
    }

    let query_tokens = tokenize(query);
    let mut scored: Vec<(f64, usize)> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (overlap(&query_tokens, text_of(item)), i))
        .collect();
    // Stable sort: equal scores keep insertion order, so ranking is
    // deterministic across calls.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    Ok(scored
        .into_iter()
        .take(max_results)
        .map(|(_, i)| items[i].clone())
        .collect())
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    async fn similar_examples(&self, question: &str) -> Result<Vec<SqlExample>, RetrievalError> {
        let examples = self.examples.read().await;
        rank(&examples, question, self.max_results, "examples", |e| {
            e.question.as_str()
        })
    }

    async fn relevant_ddl(&self, question: &str) -> Result<Vec<DdlEntry>, RetrievalError> {
        let ddl = self.ddl.read().await;
        rank(&ddl, question, self.max_results, "ddl", |e| {
            e.statement.as_str()
        })
    }

    async fn relevant_docs(&self, question: &str) -> Result<Vec<DocEntry>, RetrievalError> {
        let docs = self.docs.read().await;
        rank(&docs, question, self.max_results, "documentation", |e| {
            e.text.as_str()
        })
    }

    async fn add_example(&self, example: SqlExample) -> Result<(), RetrievalError> {
        self.examples.write().await.push(example);
        Ok(())
    }

    async fn add_ddl(&self, entry: DdlEntry) -> Result<(), RetrievalError> {
        self.ddl.write().await.push(entry);
        Ok(())
    }

    async fn add_doc(&self, entry: DocEntry) -> Result<(), RetrievalError> {
        self.docs.write().await.push(entry);
        Ok(())
    }
}
