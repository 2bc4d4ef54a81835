//! Remembered registries and user preferences.
//!
//! A small JSON document holding the registries the user has worked with
//! (path, display label, last-used time) and the preferred ordering of helper
//! pick lists. Every mutation is written back immediately.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable overriding the preferences file location.
pub const PREFS_ENV: &str = "PAGE_REGISTRY_PREFS";

/// A remembered registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub path: PathBuf,
    pub label: String,
    /// Milliseconds since the Unix epoch.
    pub last_used: u64,
}

impl RegistryEntry {
    /// The path may have been moved or deleted since it was remembered.
    pub fn is_stale(&self) -> bool {
        !self.path.is_file()
    }
}

/// Ordering of helper files offered for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Name,
    Path,
    /// Most recently modified first.
    Modified,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Name, SortOrder::Path, SortOrder::Modified];

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Name => "class name",
            SortOrder::Path => "file path",
            SortOrder::Modified => "recently modified",
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    registries: Vec<RegistryEntry>,
    #[serde(default)]
    sort_order: SortOrder,
}

#[derive(Debug)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    prefs: Preferences,
}

impl PreferenceStore {
    /// Opens the store at `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let prefs = if path.is_file() {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&source)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Preferences::default()
        };
        Ok(Self {
            path: Some(path),
            prefs,
        })
    }

    /// A store that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            prefs: Preferences::default(),
        }
    }

    /// `$PAGE_REGISTRY_PREFS`, else `<config dir>/page-registry/preferences.json`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(PREFS_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("page-registry").join("preferences.json"))
    }

    /// Remembered registries, most recently used first.
    pub fn list(&self) -> Vec<RegistryEntry> {
        let mut entries = self.prefs.registries.clone();
        entries.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        entries
    }

    pub fn get(&self, path: &Path) -> Option<&RegistryEntry> {
        self.prefs.registries.iter().find(|e| e.path == path)
    }

    /// Marks `path` as just used.
    ///
    /// An existing entry keeps its label unless `label` is given. New entries
    /// default to the name of the registry's directory.
    pub fn upsert(&mut self, path: &Path, label: Option<&str>) -> Result<()> {
        let now = self.next_timestamp();
        match self.prefs.registries.iter_mut().find(|e| e.path == path) {
            Some(entry) => {
                entry.last_used = now;
                if let Some(label) = label {
                    entry.label = label.to_string();
                }
            }
            None => self.prefs.registries.push(RegistryEntry {
                path: path.to_path_buf(),
                label: label
                    .map(str::to_string)
                    .unwrap_or_else(|| default_label(path)),
                last_used: now,
            }),
        }
        self.save()
    }

    /// Forgets `path`. Returns whether it was remembered.
    pub fn remove(&mut self, path: &Path) -> Result<bool> {
        let before = self.prefs.registries.len();
        self.prefs.registries.retain(|e| e.path != path);
        let removed = self.prefs.registries.len() != before;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.prefs.registries.clear();
        self.save()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.prefs.sort_order
    }

    pub fn set_sort_order(&mut self, order: SortOrder) -> Result<()> {
        self.prefs.sort_order = order;
        self.save()
    }

    /// Wall-clock milliseconds, bumped past the newest entry so ordering is
    /// strict even within one millisecond.
    fn next_timestamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let newest = self
            .prefs
            .registries
            .iter()
            .map(|e| e.last_used)
            .max()
            .unwrap_or_default();
        now.max(newest + 1)
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.prefs)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn default_label(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_defaults_label_to_directory() {
        let mut store = PreferenceStore::in_memory();
        store.upsert(Path::new("/proj/pages/pages.ts"), None).unwrap();
        assert_eq!(store.list()[0].label, "pages");
    }

    #[test]
    fn upsert_without_label_preserves_previous() {
        let mut store = PreferenceStore::in_memory();
        let path = Path::new("/proj/pages/pages.ts");
        store.upsert(path, Some("Storefront")).unwrap();
        store.upsert(path, None).unwrap();
        assert_eq!(store.get(path).unwrap().label, "Storefront");

        store.upsert(path, Some("Checkout")).unwrap();
        assert_eq!(store.get(path).unwrap().label, "Checkout");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn list_is_most_recent_first() {
        let mut store = PreferenceStore::in_memory();
        store.upsert(Path::new("/a/r.ts"), None).unwrap();
        store.upsert(Path::new("/b/r.ts"), None).unwrap();
        store.upsert(Path::new("/a/r.ts"), None).unwrap();

        let paths: Vec<_> = store.list().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec![PathBuf::from("/a/r.ts"), PathBuf::from("/b/r.ts")]);
    }

    #[test]
    fn remove_and_clear() {
        let mut store = PreferenceStore::in_memory();
        store.upsert(Path::new("/a/r.ts"), None).unwrap();
        store.upsert(Path::new("/b/r.ts"), None).unwrap();
        assert!(store.remove(Path::new("/a/r.ts")).unwrap());
        assert!(!store.remove(Path::new("/a/r.ts")).unwrap());
        store.clear().unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested/prefs.json");

        let mut store = PreferenceStore::open(&file).unwrap();
        store.upsert(Path::new("/proj/pages/pages.ts"), Some("Main")).unwrap();
        store.set_sort_order(SortOrder::Modified).unwrap();

        let reopened = PreferenceStore::open(&file).unwrap();
        assert_eq!(reopened.list()[0].label, "Main");
        assert_eq!(reopened.sort_order(), SortOrder::Modified);
    }

    #[test]
    fn stale_entries_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.ts");
        std::fs::write(&path, "").unwrap();
        let mut store = PreferenceStore::in_memory();
        store.upsert(&path, None).unwrap();
        assert!(!store.list()[0].is_stale());

        std::fs::remove_file(&path).unwrap();
        assert!(store.list()[0].is_stale());
    }
}
