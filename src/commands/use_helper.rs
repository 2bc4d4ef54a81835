//! Inserts a registered helper's accessor call into a source file.

use super::{Outcome, Session};
use crate::prompt::Prompter;
use crate::registry;
use crate::rewriter;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct UseHelper {
    pub file: PathBuf,
    /// 1-indexed line the call is inserted before.
    pub line: usize,
    /// Accessor to use; chosen interactively when absent.
    pub accessor: Option<String>,
    pub registry: Option<PathBuf>,
}

pub fn run<P: Prompter>(session: &mut Session<P>, opts: UseHelper) -> Result<Outcome> {
    let target = session.resolve_path(&opts.file);
    if !target.is_file() {
        bail!("{} does not exist", target.display());
    }
    let Some(registry_path) = session.resolve_registry(opts.registry.as_deref())? else {
        return Ok(Outcome::Cancelled);
    };
    if target == registry_path {
        bail!("Helpers cannot be used inside their own registry");
    }

    let content = std::fs::read_to_string(&registry_path)
        .with_context(|| format!("Failed to read {}", registry_path.display()))?;
    let zones = registry::parse(&content);
    let own = rewriter::detect_circular_usage(&target, &registry_path)?;

    let mut available: Vec<(String, String)> = Vec::new();
    for accessor in zones.helper_accessors() {
        let class_name = accessor.return_type.clone().unwrap_or_default();
        if own.as_deref() == Some(accessor.name.as_str()) {
            session.info(format!(
                "Not offering {}: this file declares {} itself",
                accessor.name, class_name
            ));
            continue;
        }
        available.push((accessor.name.clone(), class_name));
    }

    let (accessor, class_name) = match opts.accessor {
        Some(wanted) => {
            if own.as_deref() == Some(wanted.as_str()) {
                session.warn(format!("Skipped {}: it would make this file use itself", wanted));
                return Ok(Outcome::Completed);
            }
            match available.into_iter().find(|(name, _)| *name == wanted) {
                Some(found) => found,
                None => bail!("Registry has no helper accessor named '{}'", wanted),
            }
        }
        None => {
            if available.is_empty() {
                bail!("Registry {} has no helpers to use", registry_path.display());
            }
            let items: Vec<String> = available
                .iter()
                .map(|(name, class)| format!("{} ({})", name, class))
                .collect();
            match session.ui.choose("Helper to use", &items)? {
                Some(index) => available.swap_remove(index),
                None => return Ok(Outcome::Cancelled),
            }
        }
    };

    rewriter::insert_helper_usage(
        &target,
        opts.line,
        &registry_path,
        &accessor,
        &class_name,
        &session.root,
        &session.config,
    )?;
    session.commit_registry_choice()?;
    let shown = session.display_path(&target);
    session.success(format!("Inserted {}() into {}:{}", accessor, shown, opts.line));
    Ok(Outcome::Completed)
}
