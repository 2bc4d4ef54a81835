//! Removes helpers from a registry, optionally deleting their files.

use super::{Outcome, Session};
use crate::analyzer;
use crate::naming;
use crate::prompt::Prompter;
use crate::registry;
use crate::rewriter;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
pub struct RemoveHelper {
    pub registry: Option<PathBuf>,
    /// Class names to remove; chosen interactively when empty.
    pub classes: Vec<String>,
    /// Also delete each helper's source file.
    pub delete_file: bool,
    /// Skip the confirmation prompt.
    pub yes: bool,
}

pub fn run<P: Prompter>(session: &mut Session<P>, opts: RemoveHelper) -> Result<Outcome> {
    let Some(registry_path) = session.resolve_registry(opts.registry.as_deref())? else {
        return Ok(Outcome::Cancelled);
    };
    let content = std::fs::read_to_string(&registry_path)
        .with_context(|| format!("Failed to read {}", registry_path.display()))?;
    let zones = registry::parse(&content);

    let classes = if opts.classes.is_empty() {
        let registered: Vec<String> = zones
            .helper_accessors()
            .iter()
            .filter_map(|a| a.return_type.clone())
            .collect();
        if registered.is_empty() {
            bail!("Registry {} has no helpers", registry_path.display());
        }
        match session.ui.pick_files("Helpers to remove", &registered)? {
            Some(picked) => picked.into_iter().map(|i| registered[i].clone()).collect(),
            None => return Ok(Outcome::Cancelled),
        }
    } else {
        opts.classes.clone()
    };

    let mut files = Vec::new();
    if opts.delete_file {
        let mut blocked = Vec::new();
        for class_name in &classes {
            let Some(file) =
                analyzer::helper_file(&registry_path, &zones, class_name, &session.root, &session.config)
            else {
                session.warn(format!("No source file found for {}; only its entry is removed", class_name));
                continue;
            };
            let references = analyzer::find_external_references(
                &session.root,
                class_name,
                &naming::accessor_name(class_name),
                &[registry_path.clone(), file.clone()],
                &session.config,
            );
            for reference in &references {
                blocked.push(format!(
                    "{}:{}: {}",
                    session.display_path(&reference.file),
                    reference.line,
                    reference.text
                ));
            }
            if references.is_empty() {
                files.push(file);
            }
        }
        if !blocked.is_empty() {
            bail!(
                "Refusing to delete helper files that are still referenced:\n  {}",
                blocked.join("\n  ")
            );
        }
    }

    if !opts.yes {
        let what = if files.is_empty() {
            format!("Remove {} from the registry?", classes.join(", "))
        } else {
            format!(
                "Remove {} from the registry and delete {} file(s)?",
                classes.join(", "),
                files.len()
            )
        };
        if !session.ui.confirm(&what, false)? {
            return Ok(Outcome::Cancelled);
        }
    }

    let report = rewriter::apply_helper_removals(&registry_path, &classes, &session.config)?;
    for file in &files {
        std::fs::remove_file(file).with_context(|| format!("Failed to delete {}", file.display()))?;
    }
    session.commit_registry_choice()?;

    for name in &report.missing {
        session.info(format!("{} is not in the registry", name));
    }
    if !report.removed.is_empty() {
        session.success(format!("Removed {}", report.removed.join(", ")));
    }
    for file in &files {
        let shown = session.display_path(file);
        session.success(format!("Deleted {}", shown));
    }
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
    use std::path::Path;

    struct Fixture {
        dir: tempfile::TempDir,
        registry: PathBuf,
        pristine: String,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = Config::default();
            let pages = dir.path().join("pages");
            fs::create_dir_all(&pages).unwrap();
            let registry = pages.join("main-factory.ts");
            let pristine = render_registry("MainFactory", &config);
            fs::write(&registry, &pristine).unwrap();
            for (file, class) in [("login.page.ts", "LoginPage"), ("cart.page.ts", "CartPage")] {
                fs::write(pages.join(file), render_helper(class, &config)).unwrap();
            }
            rewriter::apply_helper_additions(
                &registry,
                &[pages.join("login.page.ts"), pages.join("cart.page.ts")],
                dir.path(),
                &config,
            )
            .unwrap();
            Self {
                dir,
                registry,
                pristine,
            }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn session(&self, answers: Vec<Answer>) -> Session<ScriptedPrompter> {
            Session::new(
                self.root(),
                Config::default(),
                PreferenceStore::in_memory(),
                ScriptedPrompter::new(answers),
            )
        }
    }

    #[test]
    fn picked_helpers_are_removed_after_confirmation() {
        let fx = Fixture::new();
        let mut session = fx.session(vec![Answer::Files(Some(vec![0, 1])), Answer::Confirm(true)]);

        assert_eq!(run(&mut session, RemoveHelper::default()).unwrap(), Outcome::Completed);
        assert_eq!(fs::read_to_string(&fx.registry).unwrap(), fx.pristine);
        assert!(fx.root().join("pages/login.page.ts").exists());
    }

    #[test]
    fn declined_confirmation_changes_nothing() {
        let fx = Fixture::new();
        let before = fs::read(&fx.registry).unwrap();
        let mut session = fx.session(vec![Answer::Files(Some(vec![0])), Answer::Confirm(false)]);

        assert_eq!(run(&mut session, RemoveHelper::default()).unwrap(), Outcome::Cancelled);
        assert_eq!(fs::read(&fx.registry).unwrap(), before);
    }

    #[test]
    fn delete_file_removes_unreferenced_helper() {
        let fx = Fixture::new();
        let mut session = fx.session(vec![]);
        let opts = RemoveHelper {
            classes: vec!["CartPage".to_string()],
            delete_file: true,
            yes: true,
            ..RemoveHelper::default()
        };

        run(&mut session, opts).unwrap();
        assert!(!fx.root().join("pages/cart.page.ts").exists());
        let text = fs::read_to_string(&fx.registry).unwrap();
        assert!(!text.contains("CartPage"));
        assert!(text.contains("getLoginPage"));
    }

    #[test]
    fn delete_file_is_refused_when_referenced() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.root().join("tests")).unwrap();
        fs::write(
            fx.root().join("tests/cart.spec.ts"),
            "import { getCartPage } from '../pages/main-factory';\nconst cart = getCartPage();\n",
        )
        .unwrap();
        let before = fs::read(&fx.registry).unwrap();

        let mut session = fx.session(vec![]);
        let opts = RemoveHelper {
            classes: vec!["CartPage".to_string()],
            delete_file: true,
            yes: true,
            ..RemoveHelper::default()
        };

        let err = run(&mut session, opts).unwrap_err();
        assert!(err.to_string().contains("tests/cart.spec.ts:2"));
        assert!(fx.root().join("pages/cart.page.ts").exists());
        assert_eq!(fs::read(&fx.registry).unwrap(), before);
    }

    #[test]
    fn unknown_class_is_reported() {
        let fx = Fixture::new();
        let mut session = fx.session(vec![]);
        let opts = RemoveHelper {
            classes: vec!["GhostPage".to_string()],
            yes: true,
            ..RemoveHelper::default()
        };

        run(&mut session, opts).unwrap();
        assert!(session.ui.said(Level::Info, "GhostPage is not in the registry"));
    }
}
