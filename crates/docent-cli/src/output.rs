//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use docent_domain::{QueryDescriptor, Record, SchemaContract, Turn};
use docent_gatekeeper::GuardReport;
use docent_orchestrator::{TurnOutcome, TurnReport};
use docent_translator::Exemplar;
use colored::*;
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Active output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format the outcome of one turn.
    pub fn format_report(&self, report: &TurnReport, show_query: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = json!({
                    "question": report.question,
                    "states": report.states.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                    "query": report.descriptor,
                    "rows": report.rows,
                    "elapsed_ms": report.elapsed.as_millis() as u64,
                });
                match &report.outcome {
                    TurnOutcome::Answered(answer) => value["answer"] = json!(answer),
                    TurnOutcome::Failed(failure) => value["error"] = json!(failure.to_string()),
                }
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(report.reply()),
            OutputFormat::Table => {
                let mut out = String::new();
                if show_query {
                    if let Some(descriptor) = &report.descriptor {
                        out.push_str(&self.colorize("Query:", "cyan"));
                        out.push('\n');
                        out.push_str(&serde_json::to_string_pretty(descriptor)?);
                        out.push('\n');
                        if let Some(rows) = report.rows {
                            out.push_str(&self.colorize(&format!("({} row(s))", rows), "cyan"));
                            out.push('\n');
                        }
                        out.push('\n');
                    }
                }
                match &report.outcome {
                    TurnOutcome::Answered(answer) => out.push_str(answer),
                    TurnOutcome::Failed(_) => out.push_str(&self.error(&report.reply())),
                }
                Ok(out)
            }
        }
    }

    /// Format a translated descriptor with the guard's verdict.
    pub fn format_translation(
        &self,
        descriptor: &QueryDescriptor,
        guard: &GuardReport,
    ) -> Result<String> {
        let violations: Vec<String> = guard.violations.iter().map(|v| v.to_string()).collect();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "query": descriptor,
                "plan": descriptor.plan().kind(),
                "violations": violations,
            }))?),
            OutputFormat::Quiet => Ok(serde_json::to_string(descriptor)?),
            OutputFormat::Table => {
                let mut out = serde_json::to_string_pretty(descriptor)?;
                out.push('\n');
                out.push_str(&self.info(&format!("Plan: {}", descriptor.plan().kind())));
                out.push('\n');
                if violations.is_empty() {
                    out.push_str(&self.success("Within the schema contract"));
                } else {
                    for violation in &violations {
                        out.push_str(&self.error(violation));
                        out.push('\n');
                    }
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    /// Format result rows.
    pub fn format_rows(&self, rows: &[Record]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
            OutputFormat::Quiet => Ok(rows
                .iter()
                .map(|r| serde_json::to_string(r))
                .collect::<std::result::Result<Vec<_>, _>>()?
                .join("\n")),
            OutputFormat::Table => Ok(self.rows_table(rows)),
        }
    }

    fn rows_table(&self, rows: &[Record]) -> String {
        if rows.is_empty() {
            return self.colorize("No records found.", "yellow");
        }

        let mut columns: Vec<&str> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }

        let mut builder = Builder::default();
        builder.push_record(columns.iter().copied());
        for row in rows {
            builder.push_record(columns.iter().map(|c| cell(row.get(*c))));
        }
        self.finish_table(builder)
    }

    /// Format the schema contract.
    pub fn format_schema(&self, contract: &SchemaContract) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let collections: Vec<Value> = contract
                    .collections()
                    .iter()
                    .map(|c| {
                        json!({
                            "name": c.name,
                            "description": c.description,
                            "fields": c.fields,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&collections)?)
            }
            OutputFormat::Quiet => Ok(contract.collection_names().collect::<Vec<_>>().join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Collection", "Description", "Fields"]);
                for collection in contract.collections() {
                    builder.push_record([
                        collection.name.to_string(),
                        collection.description.to_string(),
                        collection.fields.join(", "),
                    ]);
                }
                Ok(self.finish_table(builder))
            }
        }
    }

    /// Format the translator's worked examples.
    pub fn format_exemplars(&self, exemplars: &[Exemplar]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let items = exemplars
                    .iter()
                    .map(|e| {
                        let descriptor: Value = serde_json::from_str(e.descriptor)?;
                        Ok(json!({"question": e.question, "query": descriptor}))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(serde_json::to_string_pretty(&items)?)
            }
            OutputFormat::Quiet => Ok(exemplars
                .iter()
                .map(|e| e.question)
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["#", "Question", "Collection", "Plan"]);
                for (i, exemplar) in exemplars.iter().enumerate() {
                    let descriptor = exemplar.decode()?;
                    builder.push_record([
                        (i + 1).to_string(),
                        exemplar.question.to_string(),
                        descriptor.collection.clone(),
                        descriptor.plan().kind().to_string(),
                    ]);
                }
                Ok(self.finish_table(builder))
            }
        }
    }

    /// Format the conversation so far.
    pub fn format_history(&self, turns: &[Turn]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(turns)?),
            _ if turns.is_empty() => Ok(self.info("No questions asked yet")),
            _ => Ok(turns
                .iter()
                .map(|turn| {
                    let label = format!("{}:", turn.role);
                    let color = if turn.role == docent_domain::Role::User {
                        "cyan"
                    } else {
                        "magenta"
                    };
                    format!("{} {}", self.colorize(&label, color), turn.content)
                })
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn finish_table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Render one value for a table cell.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}
