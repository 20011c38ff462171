//! Observe command implementation.

use super::{describe, CliError, LocalState, OutputFormat};
use rulesync_model::{Rule, UnitId};
use serde::Serialize;

/// Drift report for one unit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserveReport {
    /// Unit that was observed.
    pub unit_id: String,
    /// Parent the unit's snapshot points at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    /// Rules still present remotely.
    pub owned: Vec<Rule>,
    /// Rules removed by someone else.
    pub missing: Vec<Rule>,
    /// Whether any rule went missing.
    pub drift: bool,
}

/// Observes a unit without printing.
pub fn report(state: &LocalState, unit: &str) -> Result<ObserveReport, CliError> {
    let unit_id = UnitId::new(unit)?;
    let observation = state.reconciler().observe(&unit_id)?;
    Ok(ObserveReport {
        unit_id: unit_id.to_string(),
        parent_key: observation.parent_key.as_ref().map(ToString::to_string),
        drift: observation.has_drift(),
        owned: observation.owned,
        missing: observation.missing,
    })
}

/// Runs the observe command.
pub fn run(state: &LocalState, unit: &str, format: OutputFormat) -> Result<(), CliError> {
    let report = report(state, unit)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &ObserveReport) {
    println!("Unit:    {}", report.unit_id);
    match &report.parent_key {
        Some(parent) => println!("Parent:  {parent}"),
        None => {
            println!("Parent:  (none; unit has no snapshot)");
            return;
        }
    }
    println!("Owned:   {}", report.owned.len());
    for rule in &report.owned {
        println!("  {}", describe(rule));
    }
    println!("Missing: {}", report.missing.len());
    for rule in &report.missing {
        println!("  {}", describe(rule));
    }
    if report.drift {
        println!();
        println!("✗ Some rules were removed outside this unit");
    }
}
