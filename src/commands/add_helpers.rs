//! Registers helper classes in a registry.

use super::{Outcome, Session};
use crate::prefs::SortOrder;
use crate::prompt::Prompter;
use crate::registry;
use crate::rewriter::{self, AdditionReport, SkipReason};
use crate::scanner::{self, ClassName, HelperClassDescriptor};
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Default, Clone)]
pub struct AddHelpers {
    pub registry: Option<PathBuf>,
    /// Helper files to add without prompting. Scans the workspace when empty.
    pub files: Vec<PathBuf>,
}

pub fn run<P: Prompter>(session: &mut Session<P>, opts: AddHelpers) -> Result<Outcome> {
    let Some(registry_path) = session.resolve_registry(opts.registry.as_deref())? else {
        return Ok(Outcome::Cancelled);
    };

    let selected = if opts.files.is_empty() {
        match pick_candidates(session, &registry_path)? {
            Some(selected) => selected,
            None => return Ok(Outcome::Cancelled),
        }
    } else {
        let mut files = Vec::with_capacity(opts.files.len());
        for file in &opts.files {
            let path = session.resolve_path(file);
            if !path.is_file() {
                bail!("Helper file {} does not exist", path.display());
            }
            files.push(path);
        }
        files
    };

    let report = rewriter::apply_helper_additions(
        &registry_path,
        &selected,
        &session.root,
        &session.config,
    )?;
    session.commit_registry_choice()?;
    report_additions(session, &registry_path, &report);
    Ok(Outcome::Completed)
}

/// Offers the workspace's unregistered helpers, ordered by the remembered sort
/// order. Unresolved and circular candidates are left out with a notice.
fn pick_candidates<P: Prompter>(
    session: &mut Session<P>,
    registry_path: &Path,
) -> Result<Option<Vec<PathBuf>>> {
    let content = std::fs::read_to_string(registry_path)
        .with_context(|| format!("Failed to read {}", registry_path.display()))?;
    let zones = registry::parse(&content);

    let mut offered = Vec::new();
    let mut registered = 0;
    for helper in scanner::find_candidate_helper_files(&session.root, &session.config) {
        let ClassName::Declared(class_name) = &helper.class_name else {
            let shown = session.display_path(&helper.file_path);
            session.info(format!(
                "Skipping {}: no class declaration found (would guess {})",
                shown,
                helper.class_name.as_str()
            ));
            continue;
        };
        if zones.imports_class(class_name) || zones.has_field(&helper.field_name) {
            registered += 1;
            continue;
        }
        if imports_own_accessor(session, &helper, registry_path) {
            let shown = session.display_path(&helper.file_path);
            session.info(format!(
                "Skipping {}: it imports {} from this registry",
                shown, helper.accessor_name
            ));
            continue;
        }
        offered.push(helper);
    }

    if registered > 0 {
        session.info(format!("{} helper(s) already registered", registered));
    }
    if offered.is_empty() {
        bail!("No unregistered helper files found under {}", session.root.display());
    }

    sort_candidates(&mut offered, session.prefs.sort_order());
    let items: Vec<String> = offered
        .iter()
        .map(|h| format!("{} ({})", h.class_name.as_str(), session.display_path(&h.file_path)))
        .collect();

    let Some(picked) = session.ui.pick_files("Helpers to add", &items)? else {
        return Ok(None);
    };
    Ok(Some(
        picked
            .into_iter()
            .map(|i| offered[i].file_path.clone())
            .collect(),
    ))
}

fn imports_own_accessor<P: Prompter>(
    session: &Session<P>,
    helper: &HelperClassDescriptor,
    registry_path: &Path,
) -> bool {
    std::fs::read_to_string(&helper.file_path).is_ok_and(|text| {
        rewriter::helper_imports_own_accessor(
            &text,
            &helper.file_path,
            registry_path,
            &helper.accessor_name,
            &session.root,
            &session.config,
        )
    })
}

pub(crate) fn sort_candidates(helpers: &mut [HelperClassDescriptor], order: SortOrder) {
    match order {
        SortOrder::Name => helpers.sort_by(|a, b| a.class_name.as_str().cmp(b.class_name.as_str())),
        SortOrder::Path => helpers.sort_by(|a, b| a.file_path.cmp(&b.file_path)),
        SortOrder::Modified => helpers.sort_by_key(|h| {
            std::cmp::Reverse(
                std::fs::metadata(&h.file_path)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH),
            )
        }),
    }
}

pub(crate) fn report_additions<P: Prompter>(
    session: &mut Session<P>,
    registry_path: &Path,
    report: &AdditionReport,
) {
    for skipped in &report.skipped {
        let why = match &skipped.reason {
            SkipReason::Duplicate => "already registered".to_string(),
            SkipReason::Circular { accessor } => {
                format!("it imports {} from this registry", accessor)
            }
            SkipReason::Unresolved => "no class declaration found".to_string(),
            SkipReason::Registry => "it is a registry, not a helper".to_string(),
            SkipReason::Unreadable => "file could not be read".to_string(),
        };
        session.info(format!("Skipped {}: {}", skipped.name, why));
    }

    let shown = session.display_path(registry_path);
    if report.is_unchanged() {
        session.info(format!("Nothing added; {} is unchanged", shown));
    } else {
        session.success(format!("Added {} to {}", report.added.join(", "), shown));
    }
}
