//! Workspace scanner.
//!
//! Recursively walks a project to collect TypeScript sources, skipping hidden
//! entries, the dependency directory and configured exclude globs. Files are
//! classified by content: a registry is recognised by the singleton shape the
//! generator emits, never by its file name.

use crate::config::Config;
use crate::naming;
use crate::registry;
use crate::templates::ACCESSOR_PLACEHOLDER;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static STATIC_INSTANCE_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"private[ \t]+static[ \t]+instance[ \t]*[?!]?[ \t]*:")
        .expect("static instance pattern should be valid")
});

static STATIC_ACCESSOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:public[ \t]+)?static[ \t]+getInstance[ \t]*\(")
        .expect("static accessor pattern should be valid")
});

static SINGLETON_EXPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^export[ \t]+const[ \t]+[\w$]+[ \t]*=[ \t]*\([ \t]*\)[ \t]*(?::[ \t]*[\w$]+[ \t]*)?=>[ \t]*[\w$]+\.getInstance\(\)")
        .expect("singleton export pattern should be valid")
});

/// Class identity of a scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum ClassName {
    /// Taken from a class declaration in the file.
    Declared(String),
    /// No declaration found; `guess` is derived from the file name.
    Unresolved { guess: String },
}

impl ClassName {
    pub fn as_str(&self) -> &str {
        match self {
            ClassName::Declared(name) => name,
            ClassName::Unresolved { guess } => guess,
        }
    }
}

/// A helper class discovered during a scan. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct HelperClassDescriptor {
    pub file_path: PathBuf,
    pub class_name: ClassName,
    pub field_name: String,
    pub accessor_name: String,
}

impl HelperClassDescriptor {
    pub fn new(file_path: PathBuf, class_name: ClassName, config: &Config) -> Self {
        let base = class_name.as_str().to_string();
        Self {
            field_name: naming::field_name(&base, &config.field_prefix),
            accessor_name: naming::accessor_name(&base),
            file_path,
            class_name,
        }
    }
}

/// Result of classifying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Registry,
    Helper(ClassName),
    Unreadable,
}

/// Collects all files with the configured source extension under `root`.
///
/// Directories that cannot be read are skipped; the walk continues elsewhere.
pub fn collect_source_files(root: &Path, config: &Config) -> Vec<PathBuf> {
    let excludes = config.exclude_patterns();
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e, config, &excludes))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && has_source_extension(entry.path(), config) {
            files.push(entry.into_path());
        }
    }

    files
}

fn is_skipped(entry: &walkdir::DirEntry, config: &Config, excludes: &[glob::Pattern]) -> bool {
    let hidden_or_dependency = entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.') || s == config.dependency_dir);
    hidden_or_dependency || excludes.iter().any(|p| p.matches_path(entry.path()))
}

fn has_source_extension(path: &Path, config: &Config) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(&config.source_extension))
}

/// Whether `text` has the shape of a generated registry.
pub fn is_registry_text(text: &str) -> bool {
    STATIC_INSTANCE_FIELD.is_match(text)
        || STATIC_ACCESSOR.is_match(text)
        || SINGLETON_EXPORT.is_match(text)
        || text.contains(ACCESSOR_PLACEHOLDER)
}

/// Classifies `path` as registry or helper by its content.
///
/// The file name only matters when the content cannot be read.
pub fn classify_file(path: &Path, config: &Config) -> FileKind {
    match std::fs::read_to_string(path) {
        Ok(text) if is_registry_text(&text) => FileKind::Registry,
        Ok(text) => FileKind::Helper(match extract_class_name(&text) {
            Some(name) => ClassName::Declared(name),
            None => ClassName::Unresolved {
                guess: guess_class_name(path, config),
            },
        }),
        Err(err) => {
            tracing::debug!(file = %path.display(), error = %err, "unreadable source file");
            if registry_like_name(path) {
                FileKind::Registry
            } else {
                FileKind::Unreadable
            }
        }
    }
}

pub fn is_registry_file(path: &Path, config: &Config) -> bool {
    classify_file(path, config) == FileKind::Registry
}

fn registry_like_name(path: &Path) -> bool {
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.split('.').next().unwrap_or(n).to_lowercase())
        .unwrap_or_default();
    ["registry", "manager", "factory"]
        .iter()
        .any(|suffix| stem.ends_with(suffix))
}

/// First class declared in `text`.
pub fn extract_class_name(text: &str) -> Option<String> {
    registry::class_declaration(text)
}

/// Best-effort class name from a file name, e.g. `user-profile.page.ts` ->
/// `UserProfilePage`.
pub fn guess_class_name(path: &Path, config: &Config) -> String {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let base = naming::strip_known_extension(file_name, &config.helper_extension);
    let base = naming::strip_known_extension(base, &config.source_extension);
    let pascal: String = base
        .split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().chain(chars).collect(),
            }
        })
        .collect();
    naming::to_canonical_identifier(&pascal, &config.class_suffix)
}

/// Every non-registry source file under `root`, with its class identity.
pub fn find_candidate_helper_files(root: &Path, config: &Config) -> Vec<HelperClassDescriptor> {
    collect_source_files(root, config)
        .into_iter()
        .filter_map(|path| match classify_file(&path, config) {
            FileKind::Helper(class_name) => {
                Some(HelperClassDescriptor::new(path, class_name, config))
            }
            FileKind::Registry | FileKind::Unreadable => None,
        })
        .collect()
}

/// Depth-first search for the first registry under `root`.
pub fn find_first_registry(root: &Path, config: &Config) -> Option<PathBuf> {
    collect_source_files(root, config)
        .into_iter()
        .find(|path| is_registry_file(path, config))
}

/// All registries under `root`.
pub fn find_registries(root: &Path, config: &Config) -> Vec<PathBuf> {
    collect_source_files(root, config)
        .into_iter()
        .filter(|path| is_registry_file(path, config))
        .collect()
}

/// Registries found above and below a candidate directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NestingReport {
    /// Registries in `candidate_dir` itself or any directory above it.
    pub ancestors: Vec<PathBuf>,
    /// Registries in sub-directories of `candidate_dir`.
    pub descendants: Vec<PathBuf>,
}

impl NestingReport {
    pub fn has_ancestor_registry(&self) -> bool {
        !self.ancestors.is_empty()
    }

    pub fn has_descendant_registry(&self) -> bool {
        !self.descendants.is_empty()
    }

    pub fn is_nested(&self) -> bool {
        self.has_ancestor_registry() || self.has_descendant_registry()
    }
}

/// Looks for registries in the directories above `candidate_dir` (up to and
/// including `boundary`, or the filesystem root) and anywhere below it.
///
/// Only reports; whether nesting blocks anything is the caller's decision.
pub fn check_nesting(candidate_dir: &Path, boundary: Option<&Path>, config: &Config) -> NestingReport {
    let mut report = NestingReport::default();

    for dir in candidate_dir.ancestors() {
        report.ancestors.extend(registries_in_dir(dir, config));
        if boundary.is_some_and(|b| dir == b) {
            break;
        }
    }

    if candidate_dir.is_dir() {
        let excludes = config.exclude_patterns();
        for entry in WalkDir::new(candidate_dir)
            .min_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped(e, config, &excludes))
            .filter_map(Result::ok)
        {
            if entry.file_type().is_file()
                && has_source_extension(entry.path(), config)
                && is_registry_file(entry.path(), config)
            {
                report.descendants.push(entry.into_path());
            }
        }
    }

    report
}

fn registries_in_dir(dir: &Path, config: &Config) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_source_extension(p, config))
        .filter(|p| is_registry_file(p, config))
        .collect();
    found.sort();
    found
}
