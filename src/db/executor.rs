use duckdb::types::ValueRef;
use duckdb::Connection;
use r2d2::{ManageConnection, Pool};
use serde_json::{Map, Number, Value};
use std::time::Instant;

use super::ExecutionError;
use crate::config::DatabaseConfig;

/// r2d2 adapter for connections to the financial database.
pub struct DuckDbConnectionManager {
    connection_string: String,
}

impl DuckDbConnectionManager {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }
}

impl ManageConnection for DuckDbConnectionManager {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        Connection::open(&self.connection_string)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.execute("SELECT 1", [])?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Runs SQL against the pooled financial database and materializes rows as
/// JSON objects (column name to value).
pub struct QueryExecutor {
    pool: Pool<DuckDbConnectionManager>,
}

#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub rows: Vec<Value>,
    /// Elapsed wall-clock seconds for the fetch.
    pub fetch_time: f64,
}

impl QueryExecutor {
    /// Builds the pool once at startup; it is held for the process lifetime.
    pub fn new(config: &DatabaseConfig) -> Result<Self, ExecutionError> {
        let manager = DuckDbConnectionManager::new(config.connection_string.clone());
        let pool = Pool::builder()
            .max_size(config.pool_size as u32)
            .build(manager)
            .map_err(|e| ExecutionError::ConnectionError(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn execute(&self, sql: &str) -> Result<QueryOutcome, ExecutionError> {
        let pool = self.pool.clone();
        let sql = sql.to_string();

        // DuckDB calls block, so they run off the cooperative scheduler
        tokio::task::spawn_blocking(move || run_query(&pool, &sql))
            .await
            .map_err(|e| ExecutionError::TaskError(e.to_string()))?
    }
}

fn run_query(
    pool: &Pool<DuckDbConnectionManager>,
    sql: &str,
) -> Result<QueryOutcome, ExecutionError> {
    let started = Instant::now();

    let conn = pool
        .get()
        .map_err(|e| ExecutionError::ConnectionError(e.to_string()))?;

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| ExecutionError::QueryError(e.to_string()))?;

    let column_count = stmt.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for i in 0..column_count {
        match stmt.column_name(i) {
            Ok(name) => columns.push(name.to_string()),
            Err(e) => return Err(ExecutionError::QueryError(e.to_string())),
        }
    }

    let mut rows = stmt
        .query([])
        .map_err(|e| ExecutionError::QueryError(e.to_string()))?;

    let mut out = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| ExecutionError::QueryError(e.to_string()))?
    {
        let mut object = Map::new();
        for (i, column) in columns.iter().enumerate() {
            let value = row
                .get_ref(i)
                .map_err(|e| ExecutionError::QueryError(e.to_string()))?;
            object.insert(column.clone(), value_ref_to_json(value));
        }
        out.push(Value::Object(object));
    }

    Ok(QueryOutcome {
        rows: out,
        fetch_time: started.elapsed().as_secs_f64(),
    })
}

fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::from(i),
        ValueRef::SmallInt(i) => Value::from(i),
        ValueRef::Int(i) => Value::from(i),
        ValueRef::BigInt(i) => Value::from(i),
        ValueRef::UTinyInt(i) => Value::from(i),
        ValueRef::USmallInt(i) => Value::from(i),
        ValueRef::UInt(i) => Value::from(i),
        ValueRef::UBigInt(i) => Value::from(i),
        ValueRef::Float(f) => Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Double(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        // Timestamps, decimals, intervals and nested types fall back to
        // their debug rendering
        other => Value::String(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> QueryExecutor {
        QueryExecutor::new(&DatabaseConfig {
            connection_string: ":memory:".to_string(),
            pool_size: 1,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn materializes_rows_as_json_objects() {
        let outcome = executor()
            .execute("SELECT 1 AS one, 'a' AS letter")
            .await
            .unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0]["one"], serde_json::json!(1));
        assert_eq!(outcome.rows[0]["letter"], serde_json::json!("a"));
        assert!(outcome.fetch_time >= 0.0);
    }

    #[tokio::test]
    async fn zero_row_query_yields_empty_rows() {
        let outcome = executor().execute("SELECT 1 WHERE 1=0").await.unwrap();
        assert!(outcome.rows.is_empty());
    }

    #[tokio::test]
    async fn missing_table_is_a_query_error() {
        let result = executor().execute("SELECT * FROM nonexistent_table").await;
        assert!(matches!(result, Err(ExecutionError::QueryError(_))));
    }

    #[tokio::test]
    async fn null_values_render_as_json_null() {
        let outcome = executor().execute("SELECT NULL AS missing").await.unwrap();
        assert_eq!(outcome.rows[0]["missing"], Value::Null);
    }
}
