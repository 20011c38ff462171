//! Create-parent command implementation.

use super::{CliError, LocalState};
use rulesync_model::ParentKey;

/// Runs the create-parent command. An existing parent keeps its rules.
pub fn create_parent(state: &LocalState, parent: &str) -> Result<(), CliError> {
    let parent = ParentKey::new(parent)?;
    state.remote().create_parent(&parent)?;
    eprintln!("Created parent {parent}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::show;
    use rulesync_model::Rule;
    use tempfile::TempDir;

    #[test]
    fn create_parent_keeps_existing_rules() {
        let dir = TempDir::new().unwrap();
        let state = LocalState::open(dir.path()).unwrap();
        create_parent(&state, "tag-1").unwrap();
        std::fs::write(
            dir.path().join("remote/tag-1.json"),
            r#"[{"type": "ME", "enabled": false}]"#,
        )
        .unwrap();

        create_parent(&state, "tag-1").unwrap();
        assert_eq!(
            show::rules(&state, "tag-1").unwrap(),
            vec![Rule::new("ME", false)]
        );
    }

    #[test]
    fn blank_parent_is_rejected() {
        let dir = TempDir::new().unwrap();
        let state = LocalState::open(dir.path()).unwrap();
        assert!(matches!(
            create_parent(&state, " "),
            Err(CliError::Model(_))
        ));
    }
}
