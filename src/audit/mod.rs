use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Column order of the audit log. Fixed; readers depend on it.
pub const LOG_COLUMNS: [&str; 9] = [
    "question",
    "prompt",
    "llm_input_tokens",
    "llm_output_tokens",
    "llm_cost",
    "sql_gen_time",
    "sql_query",
    "fetch_time",
    "fetch_result",
];

const FETCH_TIME_COL: usize = 7;
const FETCH_RESULT_COL: usize = 8;

#[derive(Debug)]
pub enum LogWriteError {
    IoError(std::io::Error),
    CsvError(String),
}

impl fmt::Display for LogWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogWriteError::IoError(err) => write!(f, "Audit log IO error: {}", err),
            LogWriteError::CsvError(msg) => write!(f, "Audit log error: {}", msg),
        }
    }
}

impl Error for LogWriteError {}

impl From<std::io::Error> for LogWriteError {
    fn from(err: std::io::Error) -> Self {
        LogWriteError::IoError(err)
    }
}

impl From<csv::Error> for LogWriteError {
    fn from(err: csv::Error) -> Self {
        LogWriteError::CsvError(err.to_string())
    }
}

/// The generation-time half of an audit row. The trailing fetch columns are
/// written later by [`AuditLogger::update_fetch`].
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub question: String,
    pub prompt: String,
    pub llm_input_tokens: Option<u64>,
    pub llm_output_tokens: Option<u64>,
    pub llm_cost: Option<f64>,
    pub sql_gen_time: f64,
    pub sql_query: String,
}

struct LogIndex {
    rows: usize,
    by_request: HashMap<String, usize>,
}

/// CSV audit log: one row per question lifecycle. Rows are appended in
/// creation order; fetch results are written back onto the row identified
/// by request id. Callers without an id fall back to the last row, which
/// can misattribute under concurrent requests - the id path avoids that.
pub struct AuditLogger {
    path: PathBuf,
    index: Mutex<LogIndex>,
}

impl AuditLogger {
    /// Opens (or prepares to create) the log. Rows already on disk are
    /// counted so the last-row fallback lands where it should.
    pub fn new(path: PathBuf) -> Result<Self, LogWriteError> {
        let rows = if path.exists() {
            let mut reader =
                csv::Reader::from_path(&path).map_err(|e| LogWriteError::CsvError(e.to_string()))?;
            reader.records().filter_map(Result::ok).count()
        } else {
            0
        };

        Ok(Self {
            path,
            index: Mutex::new(LogIndex {
                rows,
                by_request: HashMap::new(),
            }),
        })
    }

    fn fields(record: &AuditRecord) -> [String; 9] {
        [
            record.question.clone(),
            record.prompt.clone(),
            record
                .llm_input_tokens
                .map(|t| t.to_string())
                .unwrap_or_default(),
            record
                .llm_output_tokens
                .map(|t| t.to_string())
                .unwrap_or_default(),
            record.llm_cost.map(|c| c.to_string()).unwrap_or_default(),
            record.sql_gen_time.to_string(),
            record.sql_query.clone(),
            String::new(),
            String::new(),
        ]
    }

    /// Appends one row, creating the file with its header when missing.
    pub fn append(&self, request_id: &str, record: AuditRecord) -> Result<(), LogWriteError> {
        let mut index = self.index.lock().unwrap();

        let new_file = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if new_file {
            writer.write_record(LOG_COLUMNS)?;
        }
        writer.write_record(Self::fields(&record))?;
        writer.flush()?;

        let row = index.rows;
        index.by_request.insert(request_id.to_string(), row);
        index.rows += 1;
        Ok(())
    }

    /// Writes the fetch columns onto the row matching `request_id`, or onto
    /// the most recently appended row when the id is absent or unknown.
    pub fn update_fetch(
        &self,
        request_id: Option<&str>,
        fetch_time: f64,
        fetch_result: &str,
    ) -> Result<(), LogWriteError> {
        let index = self.index.lock().unwrap();

        if index.rows == 0 {
            return Err(LogWriteError::CsvError(
                "audit log has no rows to update".to_string(),
            ));
        }

        let target = match request_id.and_then(|id| index.by_request.get(id).copied()) {
            Some(row) => row,
            None => {
                if request_id.is_some() {
                    warn!("Unknown audit request id, updating the last row instead");
                }
                index.rows - 1
            }
        };

        // CSV has no random access, so the file is rewritten with the one
        // row patched. The index lock serializes writers.
        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|e| LogWriteError::CsvError(e.to_string()))?;
        let mut records: Vec<csv::StringRecord> = Vec::with_capacity(index.rows);
        for record in reader.records() {
            records.push(record.map_err(|e| LogWriteError::CsvError(e.to_string()))?);
        }

        let row = records.get_mut(target).ok_or_else(|| {
            LogWriteError::CsvError(format!("audit row {} missing from log file", target))
        })?;
        let mut fields: Vec<String> = row.iter().map(str::to_string).collect();
        fields.resize(LOG_COLUMNS.len(), String::new());
        fields[FETCH_TIME_COL] = fetch_time.to_string();
        fields[FETCH_RESULT_COL] = fetch_result.to_string();
        *row = csv::StringRecord::from(fields);

        let mut writer =
            csv::Writer::from_path(&self.path).map_err(|e| LogWriteError::CsvError(e.to_string()))?;
        writer.write_record(LOG_COLUMNS)?;
        for record in &records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(question: &str, sql: &str) -> AuditRecord {
        AuditRecord {
            question: question.to_string(),
            prompt: format!("(user) {}", question),
            llm_input_tokens: Some(100),
            llm_output_tokens: Some(50),
            llm_cost: Some(0.00045),
            sql_gen_time: 0.5,
            sql_query: sql.to_string(),
        }
    }

    fn read_rows(path: &std::path::Path) -> Vec<csv::StringRecord> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.records().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn append_creates_file_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query_log.csv");
        let logger = AuditLogger::new(path.clone()).unwrap();

        logger.append("req-1", record("q1", "SELECT 1;")).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<&str> = reader.headers().unwrap().iter().collect();
        assert_eq!(headers, LOG_COLUMNS.to_vec());
        assert_eq!(read_rows(&path).len(), 1);
    }

    #[test]
    fn update_by_id_targets_the_right_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query_log.csv");
        let logger = AuditLogger::new(path.clone()).unwrap();

        logger.append("req-1", record("q1", "SELECT 1;")).unwrap();
        logger.append("req-2", record("q2", "SELECT 2;")).unwrap();

        logger
            .update_fetch(Some("req-1"), 0.25, "[{\"n\":1}]")
            .unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows[0].get(FETCH_RESULT_COL).unwrap(), "[{\"n\":1}]");
        assert_eq!(rows[1].get(FETCH_RESULT_COL).unwrap(), "");
    }

    #[test]
    fn missing_id_falls_back_to_last_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query_log.csv");
        let logger = AuditLogger::new(path.clone()).unwrap();

        logger.append("req-1", record("q1", "SELECT 1;")).unwrap();
        logger.append("req-2", record("q2", "SELECT 2;")).unwrap();

        logger.update_fetch(None, 0.1, "late result").unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows[0].get(FETCH_RESULT_COL).unwrap(), "");
        assert_eq!(rows[1].get(FETCH_RESULT_COL).unwrap(), "late result");
    }

    #[test]
    fn update_with_no_rows_is_an_error() {
        let dir = tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().join("query_log.csv")).unwrap();
        assert!(logger.update_fetch(None, 0.1, "x").is_err());
    }

    #[test]
    fn reopened_log_counts_existing_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query_log.csv");

        {
            let logger = AuditLogger::new(path.clone()).unwrap();
            logger.append("req-1", record("q1", "SELECT 1;")).unwrap();
            logger.append("req-2", record("q2", "SELECT 2;")).unwrap();
        }

        // A fresh process no longer knows the old ids, but the last-row
        // fallback must still land on the true last row.
        let logger = AuditLogger::new(path.clone()).unwrap();
        logger.update_fetch(None, 0.2, "resumed").unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get(FETCH_RESULT_COL).unwrap(), "resumed");
    }

    #[test]
    fn absent_token_counts_serialize_as_empty_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query_log.csv");
        let logger = AuditLogger::new(path.clone()).unwrap();

        let mut rec = record("q", "Error generating SQL query: timeout");
        rec.llm_input_tokens = None;
        rec.llm_output_tokens = None;
        rec.llm_cost = None;
        logger.append("req-1", rec).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows[0].get(2).unwrap(), "");
        assert_eq!(rows[0].get(3).unwrap(), "");
        assert_eq!(rows[0].get(4).unwrap(), "");
    }
}
