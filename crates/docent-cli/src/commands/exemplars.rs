//! Exemplars command implementation.

use crate::error::Result;
use crate::output::Formatter;
use docent_translator::exemplars;

/// Print the worked examples included in every translation prompt.
pub fn execute_exemplars(formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_exemplars(exemplars())?);
    Ok(())
}
