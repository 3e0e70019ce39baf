//! Ask command implementation.

use crate::cli::QuestionArgs;
use crate::commands::Workspace;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Answer one question and print the result.
pub async fn execute_ask(
    args: QuestionArgs,
    workspace: &mut Workspace,
    formatter: &Formatter,
    show_query: bool,
) -> Result<()> {
    let question = args.text();
    let report = workspace
        .orchestrator
        .submit_question(&question, &workspace.store)
        .await
        .ok_or_else(|| CliError::InvalidInput("Question is empty".to_string()))?;

    println!("{}", formatter.format_report(&report, show_query)?);
    Ok(())
}
