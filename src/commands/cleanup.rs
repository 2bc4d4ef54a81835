//! Removes registry entries whose helper files have disappeared.

use super::{Outcome, Session};
use crate::analyzer;
use crate::prompt::Prompter;
use crate::rewriter;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
pub struct Cleanup {
    pub registry: Option<PathBuf>,
    pub yes: bool,
}

pub fn run<P: Prompter>(session: &mut Session<P>, opts: Cleanup) -> Result<Outcome> {
    let Some(registry_path) = session.resolve_registry(opts.registry.as_deref())? else {
        return Ok(Outcome::Cancelled);
    };

    let orphans = analyzer::find_orphaned_entries(&registry_path, &session.root, &session.config)?;
    if orphans.is_empty() {
        session.commit_registry_choice()?;
        session.success("No orphaned entries");
        return Ok(Outcome::Completed);
    }

    for orphan in &orphans {
        session.info(format!(
            "{} ({}) imports missing '{}'",
            orphan.class_name, orphan.accessor, orphan.specifier
        ));
    }
    if !opts.yes
        && !session
            .ui
            .confirm(&format!("Remove {} orphaned entr(ies)?", orphans.len()), true)?
    {
        return Ok(Outcome::Cancelled);
    }

    let classes: Vec<String> = orphans.into_iter().map(|o| o.class_name).collect();
    let report = rewriter::apply_helper_removals(&registry_path, &classes, &session.config)?;
    session.commit_registry_choice()?;
    session.success(format!("Removed {}", report.removed.join(", ")));
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::prefs::PreferenceStore;
    use crate::prompt::{Answer, Level, ScriptedPrompter};
    use crate::templates::{render_helper, render_registry};
    use std::fs;

    #[test]
    fn removes_only_entries_with_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let pages = dir.path().join("pages");
        fs::create_dir_all(&pages).unwrap();
        let registry = pages.join("main-factory.ts");
        fs::write(&registry, render_registry("MainFactory", &config)).unwrap();
        fs::write(pages.join("login.page.ts"), render_helper("LoginPage", &config)).unwrap();
        fs::write(pages.join("cart.page.ts"), render_helper("CartPage", &config)).unwrap();
        rewriter::apply_helper_additions(
            &registry,
            &[pages.join("login.page.ts"), pages.join("cart.page.ts")],
            dir.path(),
            &config,
        )
        .unwrap();
        fs::remove_file(pages.join("cart.page.ts")).unwrap();

        let mut session = Session::new(
            dir.path(),
            config,
            PreferenceStore::in_memory(),
            ScriptedPrompter::new([Answer::Confirm(true)]),
        );
        assert_eq!(run(&mut session, Cleanup::default()).unwrap(), Outcome::Completed);

        let text = fs::read_to_string(&registry).unwrap();
        assert!(!text.contains("CartPage"));
        assert!(text.contains("getLoginPage"));
        assert!(session.ui.said(Level::Success, "Removed CartPage"));

        assert_eq!(run(&mut session, Cleanup::default()).unwrap(), Outcome::Completed);
        assert!(session.ui.said(Level::Success, "No orphaned entries"));
    }
}
