//! Deletes a registry file.

use super::{Outcome, Session};
use crate::prompt::Prompter;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
pub struct DeleteRegistry {
    pub registry: Option<PathBuf>,
    pub yes: bool,
}

/// Deletes a registry file and forgets it. Helper files are left alone.
pub fn run<P: Prompter>(session: &mut Session<P>, opts: DeleteRegistry) -> Result<Outcome> {
    let Some(registry_path) = session.resolve_registry(opts.registry.as_deref())? else {
        return Ok(Outcome::Cancelled);
    };
    let shown = session.display_path(&registry_path);

    if !opts.yes && !session.ui.confirm(&format!("Delete registry {}?", shown), false)? {
        return Ok(Outcome::Cancelled);
    }

    std::fs::remove_file(&registry_path)
        .with_context(|| format!("Failed to delete {}", registry_path.display()))?;
    session.commit_registry_choice()?;
    session.prefs.remove(&registry_path)?;
    session.success(format!("Deleted registry {}", shown));
    Ok(Outcome::Completed)
}
