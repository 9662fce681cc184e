use super::ChatMessage;
use crate::knowledge::{DdlEntry, DocEntry, SqlExample};

const DEFAULT_INSTRUCTIONS: &str = r#"### Instructions:
Your task is to convert a question into a SQL query, given the database schema and documentation below.
Adhere to these rules:
- **Only use tables and columns that appear in the provided context** - never invent them
- **Deliberately go through the question and database schema word by word** to appropriately answer the question
- **Use Table Aliases** to prevent ambiguity. For example, `SELECT t1.col1, t2.col1 FROM table1 t1 JOIN table2 t2 ON t1.id = t2.id`.
- When creating a ratio, always cast the numerator as float
- Respond with the SQL query inside a ```sql code block"#;

/// Renders grounding context and a question into an ordered message list.
///
/// The order is fixed and significant: instructions plus schema/doc
/// grounding in one system message, then a user/assistant pair per
/// retrieved example, then the question itself. Identical inputs always
/// produce an identical sequence.
pub struct PromptBuilder {
    instructions: String,
}

impl PromptBuilder {
    pub fn new(instructions: Option<String>) -> Self {
        Self {
            instructions: instructions.unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        }
    }

    pub fn build(
        &self,
        question: &str,
        examples: &[SqlExample],
        ddl: &[DdlEntry],
        docs: &[DocEntry],
    ) -> Vec<ChatMessage> {
        let mut system = self.instructions.clone();

        if !ddl.is_empty() {
            system.push_str("\n\n### Database Schema:\n");
            for entry in ddl {
                system.push('\n');
                system.push_str(entry.statement.trim());
                system.push('\n');
            }
        }

        if !docs.is_empty() {
            system.push_str("\n### Documentation:\n");
            for entry in docs {
                system.push('\n');
                system.push_str(entry.text.trim());
                system.push('\n');
            }
        }

        let mut messages = Vec::with_capacity(examples.len() * 2 + 2);
        messages.push(ChatMessage::system(system));
        for example in examples {
            messages.push(ChatMessage::user(example.question.trim()));
            messages.push(ChatMessage::assistant(example.sql.trim()));
        }
        messages.push(ChatMessage::user(question));
        messages
    }
}

/// Audit-log rendering of a prompt: one `(role) content` line per message.
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("({}) {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    fn context() -> (Vec<SqlExample>, Vec<DdlEntry>, Vec<DocEntry>) {
        (
            vec![SqlExample {
                question: "How many total clients does the bank have?".to_string(),
                sql: "SELECT COUNT(client_id) FROM client;".to_string(),
            }],
            vec![DdlEntry {
                statement: "CREATE TABLE `client` (\n  `client_id` INT\n);".to_string(),
            }],
            vec![DocEntry {
                text: "Table `client`: demographic information.".to_string(),
            }],
        )
    }

    #[test]
    fn rendering_is_deterministic() {
        let builder = PromptBuilder::new(None);
        let (examples, ddl, docs) = context();
        let first = builder.build("How many accounts?", &examples, &ddl, &docs);
        let second = builder.build("How many accounts?", &examples, &ddl, &docs);
        assert_eq!(first, second);
    }

    #[test]
    fn grounding_and_examples_precede_the_question() {
        let builder = PromptBuilder::new(None);
        let (examples, ddl, docs) = context();
        let question = "How many total clients does the bank have?";
        let messages = builder.build(question, &examples, &ddl, &docs);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("CREATE TABLE `client`"));
        assert!(messages[0].content.contains("demographic information"));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, examples[0].question);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, examples[0].sql);
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(messages[3].content, question);
    }

    #[test]
    fn empty_context_still_builds() {
        let builder = PromptBuilder::new(None);
        let messages = builder.build("Any accounts?", &[], &[], &[]);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(!messages[0].content.contains("### Database Schema"));
        assert_eq!(messages[1].content, "Any accounts?");
    }

    #[test]
    fn custom_instructions_replace_the_default() {
        let builder = PromptBuilder::new(Some("Answer in DuckDB SQL.".to_string()));
        let messages = builder.build("q", &[], &[], &[]);
        assert!(messages[0].content.starts_with("Answer in DuckDB SQL."));
    }

    #[test]
    fn transcript_renders_role_annotations() {
        let messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("u"),
            ChatMessage::assistant("a"),
        ];
        assert_eq!(render_transcript(&messages), "(system) sys\n(user) u\n(assistant) a");
    }
}
