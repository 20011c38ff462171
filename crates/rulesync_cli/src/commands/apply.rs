//! Materialize, reconcile and retract commands.

use super::{read_rules, CliError, LocalState};
use rulesync_engine::{ConfigurationUnit, Outcome};
use rulesync_model::{ParentKey, UnitId};
use std::path::Path;

/// Runs the materialize command. Returns the unit that was applied.
pub fn materialize(
    state: &LocalState,
    parent: &str,
    unit: Option<&str>,
    rules_file: &Path,
) -> Result<ConfigurationUnit, CliError> {
    let parent = ParentKey::new(parent)?;
    let unit = match unit {
        Some(id) => ConfigurationUnit::with_id(parent, UnitId::new(id)?),
        None => ConfigurationUnit::new(parent),
    };
    let rules = read_rules(rules_file)?;

    let outcome = state.reconciler().materialize(&unit, &rules)?;
    print_outcome("Materialized", &unit.unit_id, &outcome);
    println!("{}", unit.unit_id);
    Ok(unit)
}

/// Runs the reconcile command.
pub fn reconcile(
    state: &LocalState,
    parent: &str,
    unit: &str,
    rules_file: &Path,
) -> Result<Outcome, CliError> {
    let unit = ConfigurationUnit::with_id(ParentKey::new(parent)?, UnitId::new(unit)?);
    let rules = read_rules(rules_file)?;

    let outcome = state.reconciler().reconcile(&unit, &rules)?;
    print_outcome("Reconciled", &unit.unit_id, &outcome);
    Ok(outcome)
}

/// Runs the retract command.
pub fn retract(state: &LocalState, unit: &str) -> Result<Outcome, CliError> {
    let unit_id = UnitId::new(unit)?;
    let outcome = state.reconciler().retract(&unit_id)?;
    print_outcome("Retracted", &unit_id, &outcome);
    Ok(outcome)
}

fn print_outcome(verb: &str, unit_id: &UnitId, outcome: &Outcome) {
    let write = if outcome.written {
        "written"
    } else {
        "unchanged"
    };
    eprintln!(
        "{verb} unit {unit_id}: {} added, {} removed ({write}, {:?})",
        outcome.added, outcome.removed, outcome.duration
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parent;
    use rulesync_engine::RemoteCollection;
    use rulesync_model::Rule;
    use tempfile::TempDir;

    fn write_rules(dir: &TempDir, name: &str, rules: &[Rule]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string(rules).unwrap()).unwrap();
        path
    }

    fn remote_rules(state: &LocalState, parent: &str) -> Vec<Rule> {
        let ctx = state.request_context().unwrap();
        state
            .remote()
            .fetch(&ctx, &ParentKey::new(parent).unwrap())
            .unwrap()
    }

    #[test]
    fn full_lifecycle_against_local_state() {
        let dir = TempDir::new().unwrap();
        let state = LocalState::open(&dir.path().join("state")).unwrap();
        parent::create_parent(&state, "tag-1").unwrap();

        let x = write_rules(&dir, "x.json", &[Rule::new("X", true)]);
        let y = write_rules(&dir, "y.json", &[Rule::new("Y", false)]);
        let z = write_rules(&dir, "z.json", &[Rule::new("Z", true)]);

        let a = materialize(&state, "tag-1", Some("a"), &x).unwrap();
        let b = materialize(&state, "tag-1", None, &y).unwrap();
        assert_ne!(a.unit_id, b.unit_id);

        let outcome = reconcile(&state, "tag-1", "a", &z).unwrap();
        assert_eq!((outcome.added, outcome.removed), (1, 1));

        retract(&state, b.unit_id.as_str()).unwrap();
        assert_eq!(remote_rules(&state, "tag-1"), vec![Rule::new("Z", true)]);
    }

    #[test]
    fn materialize_on_missing_parent_fails() {
        let dir = TempDir::new().unwrap();
        let state = LocalState::open(&dir.path().join("state")).unwrap();
        let x = write_rules(&dir, "x.json", &[Rule::new("X", true)]);

        let err = materialize(&state, "nowhere", Some("a"), &x).unwrap_err();
        assert!(matches!(err, CliError::Reconcile(_)));
    }

    #[test]
    fn unit_id_with_space_fails_before_any_write() {
        let dir = TempDir::new().unwrap();
        let state = LocalState::open(&dir.path().join("state")).unwrap();
        parent::create_parent(&state, "tag-1").unwrap();
        let x = write_rules(&dir, "x.json", &[Rule::new("X", true)]);

        let err = materialize(&state, "tag-1", Some("my unit"), &x).unwrap_err();
        assert!(matches!(err, CliError::Model(_)));
        assert!(remote_rules(&state, "tag-1").is_empty());
    }

    #[test]
    fn materializing_an_existing_unit_again_is_refused() {
        let dir = TempDir::new().unwrap();
        let state = LocalState::open(&dir.path().join("state")).unwrap();
        parent::create_parent(&state, "tag-1").unwrap();
        let x = write_rules(&dir, "x.json", &[Rule::new("X", true)]);
        let y = write_rules(&dir, "y.json", &[Rule::new("Y", true)]);

        materialize(&state, "tag-1", Some("a"), &x).unwrap();
        let err = materialize(&state, "tag-1", Some("a"), &y).unwrap_err();
        assert!(matches!(err, CliError::Reconcile(_)));

        retract(&state, "a").unwrap();
        assert!(remote_rules(&state, "tag-1").is_empty());
    }

    #[test]
    fn invalid_unit_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = LocalState::open(dir.path()).unwrap();
        assert!(matches!(retract(&state, "../a"), Err(CliError::Model(_))));
    }
}
