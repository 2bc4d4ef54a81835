//! Creates a new helper class file, optionally registering it.

use super::add_helpers::report_additions;
use super::{Outcome, Session};
use crate::config::Config;
use crate::naming;
use crate::prompt::Prompter;
use crate::rewriter;
use crate::templates;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
pub struct CreateHelper {
    pub directory: Option<PathBuf>,
    /// Class name; the configured suffix is appended when missing.
    pub name: Option<String>,
    /// Register the new class; asked for when absent.
    pub register: Option<bool>,
    pub registry: Option<PathBuf>,
}

/// Checks a raw name the way it will be used: canonicalised for the class,
/// then reduced to a file stem.
fn check_helper_name(config: &Config, raw: &str) -> Result<(), String> {
    if raw.trim().is_empty() {
        return Err("Class name must not be empty".to_string());
    }
    let class_name = naming::to_canonical_identifier(raw, &config.class_suffix);
    if class_name == config.context_type {
        return Err(format!("{} is the context type's name", class_name));
    }
    config.check_class_name(&class_name)?;
    config.check_file_name(&naming::file_stem(&class_name, config))
}

pub fn run<P: Prompter>(session: &mut Session<P>, opts: CreateHelper) -> Result<Outcome> {
    let directory = match opts.directory {
        Some(dir) => session.resolve_path(&dir),
        None => {
            let root = session.root.clone();
            match session.ui.pick_directory("Directory for the helper", &root)? {
                Some(dir) => session.resolve_path(&dir),
                None => return Ok(Outcome::Cancelled),
            }
        }
    };

    let raw = match opts.name {
        Some(name) => {
            if let Err(reason) = check_helper_name(&session.config, &name) {
                bail!(reason);
            }
            name
        }
        None => {
            let config = session.config.clone();
            let validate = |s: &str| check_helper_name(&config, s);
            match session.ui.input("Helper class name", &validate)? {
                Some(name) => name,
                None => return Ok(Outcome::Cancelled),
            }
        }
    };

    let class_name = naming::to_canonical_identifier(&raw, &session.config.class_suffix);
    let stem = naming::file_stem(&class_name, &session.config);
    let path = directory.join(format!("{}{}", stem, session.config.helper_extension));
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let register = match opts.register {
        Some(register) => register,
        None => session
            .ui
            .confirm(&format!("Register {} in a registry?", class_name), true)?,
    };
    let registry_path = if register {
        match session.resolve_registry(opts.registry.as_deref())? {
            Some(path) => Some(path),
            None => return Ok(Outcome::Cancelled),
        }
    } else {
        None
    };

    std::fs::create_dir_all(&directory)
        .with_context(|| format!("Failed to create {}", directory.display()))?;
    std::fs::write(&path, templates::render_helper(&class_name, &session.config))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    let shown = session.display_path(&path);
    session.success(format!("Created {} at {}", class_name, shown));

    if let Some(registry_path) = registry_path {
        let report = rewriter::apply_helper_additions(
            &registry_path,
            std::slice::from_ref(&path),
            &session.root,
            &session.config,
        )?;
        session.commit_registry_choice()?;
        report_additions(session, &registry_path, &report);
    }
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::PreferenceStore;
    use crate::prompt::{Answer, Level, ScriptedPrompter};
    use crate::templates::render_registry;
    use std::fs;
    use std::path::Path;

    fn session(root: &Path, answers: Vec<Answer>) -> Session<ScriptedPrompter> {
        Session::new(
            root,
            Config::default(),
            PreferenceStore::in_memory(),
            ScriptedPrompter::new(answers),
        )
    }

    #[test]
    fn appends_suffix_and_uses_file_case() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(
            dir.path(),
            vec![
                Answer::Directory(Some(PathBuf::from("pages"))),
                Answer::Text(Some("UserProfile".to_string())),
                Answer::Confirm(false),
            ],
        );

        assert_eq!(run(&mut session, CreateHelper::default()).unwrap(), Outcome::Completed);
        let text = fs::read_to_string(dir.path().join("pages/user-profile.page.ts")).unwrap();
        assert!(text.contains("export class UserProfilePage {"));
    }

    #[test]
    fn creates_and_registers() {
        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("pages/main-factory.ts");
        fs::create_dir_all(registry.parent().unwrap()).unwrap();
        fs::write(&registry, render_registry("MainFactory", &Config::default())).unwrap();

        let mut session = session(dir.path(), vec![]);
        let opts = CreateHelper {
            directory: Some(PathBuf::from("pages")),
            name: Some("Login".to_string()),
            register: Some(true),
            registry: None,
        };

        assert_eq!(run(&mut session, opts).unwrap(), Outcome::Completed);
        let text = fs::read_to_string(&registry).unwrap();
        assert!(text.contains("import { LoginPage } from './login.page';"));
        assert!(text.contains("public getLoginPage(page?: Page): LoginPage {"));
        assert!(session.ui.said(Level::Success, "Added LoginPage"));
    }

    #[test]
    fn registering_without_registry_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), vec![]);
        let opts = CreateHelper {
            directory: Some(PathBuf::from("pages")),
            name: Some("Login".to_string()),
            register: Some(true),
            registry: None,
        };

        assert!(run(&mut session, opts).is_err());
        assert!(!dir.path().join("pages/login.page.ts").exists());
    }

    #[test]
    fn refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("pages/login.page.ts"), "// keep\n").unwrap();

        let mut session = session(dir.path(), vec![]);
        let opts = CreateHelper {
            directory: Some(PathBuf::from("pages")),
            name: Some("LoginPage".to_string()),
            register: Some(false),
            registry: None,
        };

        assert!(run(&mut session, opts).is_err());
        assert_eq!(
            fs::read_to_string(dir.path().join("pages/login.page.ts")).unwrap(),
            "// keep\n"
        );
    }

    #[test]
    fn rejects_names_failing_the_pattern() {
        let config = Config::default();
        assert!(check_helper_name(&config, "login").is_err());
        assert!(check_helper_name(&config, "Login").is_ok());
        assert!(check_helper_name(&config, "").is_err());
        assert!(check_helper_name(&config, "   ").is_err());
        assert!(check_helper_name(&config, "Page").is_err());
    }
}
