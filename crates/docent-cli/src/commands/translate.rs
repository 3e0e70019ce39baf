//! Translate command implementation.

use crate::cli::QuestionArgs;
use crate::error::Result;
use crate::output::Formatter;
use docent_domain::traits::LlmProvider;
use docent_orchestrator::Orchestrator;

/// Translate a question and show the query with the contract verdict.
///
/// Nothing is read from the data source.
pub async fn execute_translate<L>(
    args: QuestionArgs,
    orchestrator: &Orchestrator<L>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync,
    L::Error: std::fmt::Display,
{
    let descriptor = orchestrator.translator().translate(&args.text()).await?;
    let report = orchestrator.guard().inspect(&descriptor);
    println!("{}", formatter.format_translation(&descriptor, &report)?);
    Ok(())
}
