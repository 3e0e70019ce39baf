//! Prompt construction for query translation

use crate::exemplars::Exemplar;
use docent_domain::SchemaContract;

/// System message for translation requests
pub const SYSTEM_PROMPT: &str = "You are an assistant that generates MongoDB queries based on user questions and capable of handling general questions.";

/// Closing line of every translation prompt
pub const OUTPUT_INSTRUCTION: &str = "Output only the MongoDB query as JSON:";

const INSTRUCTIONS: &str = "You are a data analyst generating MongoDB queries based on the provided schema and conversation history.
Only use data from the schema and ensure queries are based solely on the `teams`, `careers`, `articles`, and `practices` collections, ignoring any unrelated or external context.
Absolutely do not reference any generic, historical, or publicly known figures or data. Only refer to data that exists in these collections.";

/// Builds the user message for one translation
pub struct PromptBuilder<'a> {
    question: &'a str,
    schema: Option<&'a SchemaContract>,
    exemplars: &'a [Exemplar],
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(question: &'a str) -> Self {
        Self {
            question,
            schema: None,
            exemplars: &[],
        }
    }

    /// List the contract's collections and fields
    pub fn with_schema(mut self, schema: &'a SchemaContract) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Add worked examples
    pub fn with_exemplars(mut self, exemplars: &'a [Exemplar]) -> Self {
        self.exemplars = exemplars;
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(INSTRUCTIONS);
        prompt.push_str("\n\n");

        if let Some(schema) = self.schema {
            prompt.push_str("### Schema\n\n");
            for collection in schema.collections() {
                prompt.push_str(&format!(
                    "- `{}` ({}): {}\n",
                    collection.name,
                    collection.description,
                    collection
                        .fields
                        .iter()
                        .map(|f| format!("`{}`", f))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
            prompt.push('\n');
        }

        if !self.exemplars.is_empty() {
            prompt.push_str("### Example Queries\n\n");
            for exemplar in self.exemplars {
                prompt.push_str(&format!("Example Question: {}\n", quote(exemplar.question)));
                prompt.push_str("Expected MongoDB Query:\n");
                prompt.push_str(exemplar.descriptor.trim());
                prompt.push_str("\n\n");
            }
        }

        prompt.push_str(&format!("Question: {}\n", quote(self.question)));
        prompt.push_str(OUTPUT_INSTRUCTION);

        prompt
    }
}

/// JSON string literal for `text`
fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}
