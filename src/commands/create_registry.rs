//! Creates a new registry class file.

use super::{Outcome, Session};
use crate::naming;
use crate::prompt::Prompter;
use crate::scanner::{self, NestingReport};
use crate::templates;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct CreateRegistry {
    /// Target directory; asked for when absent.
    pub directory: Option<PathBuf>,
    /// Registry class name; asked for when absent.
    pub name: Option<String>,
    pub label: Option<String>,
}

pub fn run<P: Prompter>(session: &mut Session<P>, opts: CreateRegistry) -> Result<Outcome> {
    let mut directory = match opts.directory {
        Some(dir) => session.resolve_path(&dir),
        None => match pick_directory(session)? {
            Some(dir) => dir,
            None => return Ok(Outcome::Cancelled),
        },
    };

    let name = match opts.name {
        Some(name) => {
            let name = name.trim().to_string();
            if let Err(reason) = session.config.check_class_name(&name) {
                bail!(reason);
            }
            name
        }
        None => {
            let config = session.config.clone();
            let validate = |s: &str| config.check_class_name(s);
            match session.ui.input("Registry class name", &validate)? {
                Some(name) => name,
                None => return Ok(Outcome::Cancelled),
            }
        }
    };

    if session.config.prevent_nesting {
        loop {
            let boundary = directory.starts_with(&session.root).then_some(session.root.as_path());
            let report = scanner::check_nesting(&directory, boundary, &session.config);
            if !report.is_nested() {
                break;
            }
            warn_nesting(session, &directory, &report);
            match choose_nesting_action(session)? {
                NestingAction::Proceed => break,
                NestingAction::Relocate => match pick_directory(session)? {
                    Some(dir) => directory = dir,
                    None => return Ok(Outcome::Cancelled),
                },
                NestingAction::Cancel => return Ok(Outcome::Cancelled),
            }
        }
    }

    let stem = naming::file_stem(&name, &session.config);
    if let Err(reason) = session.config.check_file_name(&stem) {
        bail!(reason);
    }
    let path = directory.join(format!("{}{}", stem, session.config.registry_extension));
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    std::fs::create_dir_all(&directory)
        .with_context(|| format!("Failed to create {}", directory.display()))?;
    std::fs::write(&path, templates::render_registry(&name, &session.config))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    session.prefs.upsert(&path, opts.label.as_deref())?;

    let shown = session.display_path(&path);
    session.success(format!("Created registry {} at {}", name, shown));
    Ok(Outcome::Completed)
}

enum NestingAction {
    Proceed,
    Relocate,
    Cancel,
}

fn pick_directory<P: Prompter>(session: &mut Session<P>) -> Result<Option<PathBuf>> {
    let root = session.root.clone();
    Ok(session
        .ui
        .pick_directory("Directory for the registry", &root)?
        .map(|dir| session.resolve_path(&dir)))
}

fn warn_nesting<P: Prompter>(session: &mut Session<P>, directory: &Path, report: &NestingReport) {
    let mut lines = vec![format!(
        "A registry in {} would nest with existing registries:",
        session.display_path(directory)
    )];
    for path in &report.ancestors {
        lines.push(format!("  above: {}", session.display_path(path)));
    }
    for path in &report.descendants {
        lines.push(format!("  below: {}", session.display_path(path)));
    }
    session.warn(lines.join("\n"));
}

fn choose_nesting_action<P: Prompter>(session: &mut Session<P>) -> Result<NestingAction> {
    let choices = [
        "Create it here anyway".to_string(),
        "Choose another location".to_string(),
        "Cancel".to_string(),
    ];
    Ok(match session.ui.choose("How do you want to continue?", &choices)? {
        Some(0) => NestingAction::Proceed,
        Some(1) => NestingAction::Relocate,
        _ => NestingAction::Cancel,
    })
}
