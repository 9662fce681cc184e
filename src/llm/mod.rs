pub mod prompt;
pub mod providers;

use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
        }
    }
}

impl Error for LlmError {}

/// Message role in a chat prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Model output plus the token usage the backend reported, when it did.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// A backend that turns an ordered message list into generated text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError>;
}

pub struct LlmManager {
    model: Box<dyn ChatModel + Send + Sync>,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let model: Box<dyn ChatModel + Send + Sync> = match config.backend.as_str() {
            "remote" => Box::new(providers::remote::RemoteChatModel::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaChatModel::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        Ok(Self { model })
    }
}

#[async_trait]
impl ChatModel for LlmManager {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        self.model.complete(messages).await
    }
}

/// Pulls a SQL statement out of a model answer. Fenced code blocks win,
/// then a statement-keyword scan; otherwise the raw content comes back.
pub fn extract_sql(content: &str) -> String {
    // Try to extract SQL from between ```sql and ``` markers
    if let Some(start) = content.find("```sql") {
        let after = &content[start + 6..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
        return after.trim().to_string();
    }

    // Plain code fence without a language specifier
    if let Some(start) = content.find("```") {
        let after = &content[start + 3..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    // No fences: scan for a line starting with a SQL keyword and collect
    // until the terminating semicolon
    let keywords = ["SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "CREATE"];
    let lines: Vec<&str> = content.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let upper = line.trim().to_uppercase();
        if keywords.iter().any(|kw| upper.starts_with(kw)) {
            let mut sql = line.trim().to_string();
            for next in &lines[i + 1..] {
                let next = next.trim();
                if next.starts_with("```") {
                    break;
                }
                sql.push(' ');
                sql.push_str(next);
                if next.ends_with(';') {
                    break;
                }
            }
            return sql;
        }
    }

    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_sql_fence() {
        let content = "Here you go:\n```sql\nSELECT 1;\n```\nDone.";
        assert_eq!(extract_sql(content), "SELECT 1;");
    }

    #[test]
    fn extracts_from_unterminated_fence() {
        let content = "```sql\nSELECT COUNT(*) FROM client;";
        assert_eq!(extract_sql(content), "SELECT COUNT(*) FROM client;");
    }

    #[test]
    fn extracts_from_plain_fence() {
        let content = "```\nSELECT 2;\n```";
        assert_eq!(extract_sql(content), "SELECT 2;");
    }

    #[test]
    fn scans_bare_statement_lines() {
        let content = "The query is:\nSELECT gender,\n  COUNT(*)\nFROM client;\nHope that helps.";
        assert_eq!(extract_sql(content), "SELECT gender, COUNT(*) FROM client;");
    }

    #[test]
    fn falls_back_to_raw_content() {
        let content = "I cannot answer that.";
        assert_eq!(extract_sql(content), "I cannot answer that.");
    }
}
