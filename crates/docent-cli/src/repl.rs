//! Interactive chat mode.

use crate::commands::Workspace;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use docent_domain::SchemaContract;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;
use tracing::debug;

/// What one line of chat input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// A question for the pipeline
    Ask(String),
    /// Show available commands
    Help,
    /// Show the conversation so far
    History,
    /// Start a new conversation
    Clear,
    /// Show the schema contract
    Schema,
    /// Toggle or set printing of generated queries
    ShowQuery(Option<bool>),
    /// Leave chat
    Exit,
    /// Nothing to do
    Empty,
}

/// Parse one line of chat input.
///
/// Lines starting with `/` are commands; anything else is a question.
pub fn parse_line(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }

    if matches!(line.to_lowercase().as_str(), "exit" | "quit") {
        return Ok(ReplCommand::Exit);
    }

    let Some(command) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Ask(line.to_string()));
    };

    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.as_slice() {
        ["exit" | "quit" | "q"] => Ok(ReplCommand::Exit),
        ["help" | "?"] => Ok(ReplCommand::Help),
        ["history"] => Ok(ReplCommand::History),
        ["clear" | "reset"] => Ok(ReplCommand::Clear),
        ["schema"] => Ok(ReplCommand::Schema),
        ["query"] => Ok(ReplCommand::ShowQuery(None)),
        ["query", "on"] => Ok(ReplCommand::ShowQuery(Some(true))),
        ["query", "off"] => Ok(ReplCommand::ShowQuery(Some(false))),
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: /{}. Type /help for available commands.",
            command
        ))),
    }
}

/// Run the interactive chat.
pub async fn run_chat(
    config: &Config,
    workspace: &mut Workspace,
    formatter: &Formatter,
    mut show_query: bool,
) -> Result<()> {
    println!(
        "{}",
        formatter.info("Docent chat - ask a question, /help for commands, exit to quit")
    );
    println!();

    let editor_config = rustyline::Config::builder()
        .max_history_size(config.settings.history_size)?
        .auto_add_history(false)
        .build();
    let mut editor: Editor<(), DefaultHistory> = Editor::with_config(editor_config)?;

    let history_path = history_path()?;
    if editor.load_history(&history_path).is_err() {
        debug!(path = %history_path.display(), "no chat history loaded");
    }

    loop {
        match editor.readline("docent> ") {
            Ok(line) => {
                let command = match parse_line(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                        continue;
                    }
                };
                if command != ReplCommand::Empty {
                    editor.add_history_entry(line.trim())?;
                }

                match command {
                    ReplCommand::Empty => {}
                    ReplCommand::Exit => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    ReplCommand::Help => print_help(formatter),
                    ReplCommand::History => {
                        println!(
                            "{}",
                            formatter.format_history(workspace.orchestrator.history())?
                        );
                    }
                    ReplCommand::Clear => {
                        workspace.orchestrator.reset();
                        println!("{}", formatter.success("Started a new conversation"));
                    }
                    ReplCommand::Schema => {
                        println!("{}", formatter.format_schema(SchemaContract::standard())?);
                    }
                    ReplCommand::ShowQuery(setting) => {
                        show_query = setting.unwrap_or(!show_query);
                        let state = if show_query { "on" } else { "off" };
                        println!("{}", formatter.info(&format!("Query display {}", state)));
                    }
                    ReplCommand::Ask(question) => {
                        if let Some(report) = workspace
                            .orchestrator
                            .submit_question(&question, &workspace.store)
                            .await
                        {
                            println!("{}", formatter.format_report(&report, show_query)?);
                            println!();
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    if let Err(e) = editor.save_history(&history_path) {
        debug!(error = %e, "could not save chat history");
    }

    Ok(())
}

fn history_path() -> Result<PathBuf> {
    let dir = Config::dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Type a question to ask it. Commands:"));
    println!();
    println!("  /history          - Show the conversation so far");
    println!("  /clear            - Start a new conversation");
    println!("  /schema           - Show the collections queries may use");
    println!("  /query [on|off]   - Print the generated query with answers");
    println!("  /help, /?         - Show this help");
    println!("  exit, quit, /q    - Leave chat");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(
            parse_line("  Who are the partners at FirmX?  ").unwrap(),
            ReplCommand::Ask("Who are the partners at FirmX?".to_string())
        );
    }

    #[test]
    fn test_blank_line_is_empty() {
        assert_eq!(parse_line("   ").unwrap(), ReplCommand::Empty);
    }

    #[test]
    fn test_exit_words() {
        assert_eq!(parse_line("exit").unwrap(), ReplCommand::Exit);
        assert_eq!(parse_line("QUIT").unwrap(), ReplCommand::Exit);
        assert_eq!(parse_line("/q").unwrap(), ReplCommand::Exit);
    }

    #[test]
    fn test_exit_inside_question_is_a_question() {
        assert!(matches!(
            parse_line("Which exit interviews were published?").unwrap(),
            ReplCommand::Ask(_)
        ));
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_line("/help").unwrap(), ReplCommand::Help);
        assert_eq!(parse_line("/history").unwrap(), ReplCommand::History);
        assert_eq!(parse_line("/clear").unwrap(), ReplCommand::Clear);
        assert_eq!(parse_line("/schema").unwrap(), ReplCommand::Schema);
    }

    #[test]
    fn test_query_toggle() {
        assert_eq!(parse_line("/query").unwrap(), ReplCommand::ShowQuery(None));
        assert_eq!(parse_line("/query on").unwrap(), ReplCommand::ShowQuery(Some(true)));
        assert_eq!(parse_line("/query off").unwrap(), ReplCommand::ShowQuery(Some(false)));
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_line("/frobnicate").unwrap_err();
        assert!(err.to_string().contains("/frobnicate"));
        assert!(parse_line("/query maybe").is_err());
    }
}
