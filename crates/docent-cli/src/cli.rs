//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use docent_llm::ProviderKind;
use std::path::PathBuf;

/// Docent - Ask questions about your firm's records in plain language.
#[derive(Debug, Parser)]
#[command(name = "docent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DOCENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// JSON fixture to query instead of the profile's data source
    #[arg(long, global = true, env = "DOCENT_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Print the generated query with each answer
    #[arg(long, global = true)]
    pub show_query: bool,

    /// Log pipeline activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (answers only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat session (default)
    Chat,

    /// Ask one question and print the answer
    Ask(QuestionArgs),

    /// Show the query a question translates to, without running it
    Translate(QuestionArgs),

    /// Show the collections and fields queries may use
    Schema,

    /// Show the worked examples the translator is primed with
    Exemplars,

    /// Manage configuration profiles
    Profile(ProfileArgs),
}

/// A question given on the command line.
#[derive(Debug, Parser)]
pub struct QuestionArgs {
    /// Question text (words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

impl QuestionArgs {
    /// The question as one string
    pub fn text(&self) -> String {
        self.question.join(" ")
    }
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update a profile
    Set(ProfileSetArgs),

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

/// Fields of a profile; unset options keep their current value.
#[derive(Debug, Default, Parser)]
pub struct ProfileSetArgs {
    /// Profile name
    pub name: String,

    /// Language model provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// Provider base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[arg(long)]
    pub api_key_env: Option<String>,

    /// MongoDB connection URI
    #[arg(long)]
    pub uri: Option<String>,

    /// MongoDB database name
    #[arg(long)]
    pub database: Option<String>,

    /// JSON fixture file
    #[arg(long)]
    pub fixture: Option<PathBuf>,
}

/// Provider argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// OpenAI-compatible endpoint
    #[value(name = "openai")]
    OpenAi,
    /// Local Ollama
    Ollama,
    /// Canned responses
    Mock,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<ProviderArg> for ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::OpenAi => ProviderKind::OpenAi,
            ProviderArg::Ollama => ProviderKind::Ollama,
            ProviderArg::Mock => ProviderKind::Mock,
        }
    }
}
