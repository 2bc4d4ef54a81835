//! User-facing workflows.
//!
//! Each submodule sequences prompts with calls into the scanner, rewriter and
//! preference store. Every workflow gathers all of its input before it touches
//! the filesystem, so a dismissed prompt returns [`Outcome::Cancelled`] with
//! nothing written.

pub mod add_helpers;
pub mod cleanup;
pub mod create_helper;
pub mod create_registry;
pub mod delete_registry;
pub mod registries;
pub mod remove_helper;
pub mod scan;
pub mod use_helper;
pub mod validate;

use crate::config::Config;
use crate::naming;
use crate::prefs::{PreferenceStore, RegistryEntry};
use crate::prompt::{Level, Prompter};
use crate::scanner;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// How a workflow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// A preference change decided while resolving a registry, applied by
/// [`Session::commit_registry_choice`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum PrefChange {
    Forget(PathBuf),
    Remember {
        path: PathBuf,
        label: Option<String>,
    },
}

/// Everything a workflow needs: the workspace, its configuration, remembered
/// registries and a way to ask the user.
pub struct Session<P: Prompter> {
    pub root: PathBuf,
    pub config: Config,
    pub prefs: PreferenceStore,
    pub ui: P,
    pending: Vec<PrefChange>,
}

impl<P: Prompter> Session<P> {
    pub fn new(root: impl Into<PathBuf>, config: Config, prefs: PreferenceStore, ui: P) -> Self {
        Self {
            root: naming::normalize(&root.into()),
            config,
            prefs,
            ui,
            pending: Vec::new(),
        }
    }

    pub fn info(&mut self, text: impl AsRef<str>) {
        self.ui.message(Level::Info, text.as_ref());
    }

    pub fn success(&mut self, text: impl AsRef<str>) {
        self.ui.message(Level::Success, text.as_ref());
    }

    pub fn warn(&mut self, text: impl AsRef<str>) {
        self.ui.message(Level::Warn, text.as_ref());
    }

    pub fn error(&mut self, text: impl AsRef<str>) {
        self.ui.message(Level::Error, text.as_ref());
    }

    /// Makes `path` absolute against the workspace root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            naming::normalize(path)
        } else {
            naming::normalize(&self.root.join(path))
        }
    }

    /// Path shown to the user: relative to the root when possible.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Picks the registry a workflow operates on.
    ///
    /// An explicit path wins. Otherwise the remembered registries are offered
    /// (a single live entry is used without asking); a stale entry triggers a
    /// remove / browse / cancel choice. With nothing remembered, the first
    /// registry under the root is used. `None` means the user cancelled.
    ///
    /// Preferences are not touched here. The choice (including any stale entry
    /// removed or relocated along the way) is held until the workflow calls
    /// [`Session::commit_registry_choice`] after its own changes.
    pub fn resolve_registry(&mut self, explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        self.pending.clear();

        if let Some(path) = explicit {
            let path = self.resolve_path(path);
            self.ensure_registry(&path)?;
            self.remember(&path, None);
            return Ok(Some(path));
        }

        loop {
            let entries: Vec<RegistryEntry> = self
                .prefs
                .list()
                .into_iter()
                .filter(|e| !self.pending.contains(&PrefChange::Forget(e.path.clone())))
                .collect();
            if entries.is_empty() {
                break;
            }

            let entry = if entries.len() == 1 && !entries[0].is_stale() {
                entries[0].clone()
            } else {
                let items: Vec<String> = entries.iter().map(|e| self.entry_item(e)).collect();
                let Some(index) = self.ui.choose("Select a registry", &items)? else {
                    return Ok(None);
                };
                entries[index].clone()
            };

            if !entry.is_stale() {
                self.remember(&entry.path, None);
                return Ok(Some(entry.path));
            }

            match self.recover_stale(&entry)? {
                Recovery::Replaced(path) => return Ok(Some(path)),
                Recovery::Removed => continue,
                Recovery::Cancelled => return Ok(None),
            }
        }

        match scanner::find_first_registry(&self.root, &self.config) {
            Some(path) => {
                self.info(format!("Using registry {}", self.display_path(&path)));
                self.remember(&path, None);
                Ok(Some(path))
            }
            None => bail!(
                "No registry found under {}. Run create-registry first",
                self.root.display()
            ),
        }
    }

    /// Persists the preference changes made by the last
    /// [`Session::resolve_registry`].
    pub fn commit_registry_choice(&mut self) -> Result<()> {
        for change in std::mem::take(&mut self.pending) {
            match change {
                PrefChange::Forget(path) => {
                    self.prefs.remove(&path)?;
                }
                PrefChange::Remember { path, label } => {
                    self.prefs.upsert(&path, label.as_deref())?;
                }
            }
        }
        Ok(())
    }

    fn remember(&mut self, path: &Path, label: Option<&str>) {
        self.pending.push(PrefChange::Remember {
            path: path.to_path_buf(),
            label: label.map(str::to_string),
        });
    }

    fn entry_item(&self, entry: &RegistryEntry) -> String {
        let marker = if entry.is_stale() { " [missing]" } else { "" };
        format!(
            "{} ({}){}",
            entry.label,
            self.display_path(&entry.path),
            marker
        )
    }

    fn recover_stale(&mut self, entry: &RegistryEntry) -> Result<Recovery> {
        self.warn(format!(
            "Registry '{}' no longer exists at {}",
            entry.label,
            entry.path.display()
        ));
        let choices = [
            "Remove it from the list".to_string(),
            "Browse for its new location".to_string(),
            "Cancel".to_string(),
        ];

        loop {
            match self.ui.choose("What should happen to it?", &choices)? {
                Some(0) => {
                    self.pending.push(PrefChange::Forget(entry.path.clone()));
                    self.info(format!("Forgetting registry '{}'", entry.label));
                    return Ok(Recovery::Removed);
                }
                Some(1) => {
                    let Some(picked) = self.ui.pick_file("Registry file")? else {
                        return Ok(Recovery::Cancelled);
                    };
                    let path = self.resolve_path(&picked);
                    if let Err(err) = self.ensure_registry(&path) {
                        self.error(err.to_string());
                        continue;
                    }
                    self.pending.push(PrefChange::Forget(entry.path.clone()));
                    self.remember(&path, Some(&entry.label));
                    return Ok(Recovery::Replaced(path));
                }
                _ => return Ok(Recovery::Cancelled),
            }
        }
    }

    fn ensure_registry(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            bail!("Registry {} does not exist", path.display());
        }
        if !scanner::is_registry_file(path, &self.config) {
            bail!("{} is not a registry", path.display());
        }
        Ok(())
    }
}

enum Recovery {
    Replaced(PathBuf),
    Removed,
    Cancelled,
}
