//! Show command implementation.

use super::{describe, CliError, LocalState, OutputFormat};
use rulesync_engine::RemoteCollection;
use rulesync_model::{ParentKey, Rule};

/// Fetches a parent's rule list.
pub fn rules(state: &LocalState, parent: &str) -> Result<Vec<Rule>, CliError> {
    let parent = ParentKey::new(parent)?;
    let ctx = state.request_context()?;
    Ok(state.remote().fetch(&ctx, &parent)?)
}

/// Runs the show command.
pub fn run(state: &LocalState, parent: &str, format: OutputFormat) -> Result<(), CliError> {
    let rules = rules(state, parent)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
        OutputFormat::Text => {
            println!("Parent: {parent}");
            println!("Rules:  {}", rules.len());
            for rule in &rules {
                println!("  {}", describe(rule));
            }
        }
    }
    Ok(())
}
