//! Schema command implementation.

use crate::error::Result;
use crate::output::Formatter;
use docent_domain::SchemaContract;

/// Print the collections and fields queries may use.
pub fn execute_schema(formatter: &Formatter) -> Result<()> {
    println!("{}", formatter.format_schema(SchemaContract::standard())?);
    Ok(())
}
