//! Workspace-wide checks.
//!
//! Reads every source file under a root and reports structural problems:
//! nested registries, registry entries whose helper file is gone, helpers
//! importing their own accessor, clashing class names, helpers nobody
//! registered, helper files without a class, and remembered registries that
//! no longer exist. Nothing here writes to disk.

use crate::config::Config;
use crate::naming;
use crate::prefs::PreferenceStore;
use crate::registry::{self, RegistryZones};
use crate::rewriter;
use crate::scanner::{self, ClassName, FileKind, HelperClassDescriptor};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    /// Another registry lives in an ancestor or descendant directory.
    NestedRegistry { other: PathBuf },
    /// The registry imports a helper from a file that no longer exists.
    OrphanedEntry { class_name: String, specifier: String },
    /// The helper imports its own accessor from a registry.
    CircularImport { accessor: String, registry: PathBuf },
    /// Another file declares the same helper class.
    DuplicateClass { class_name: String, other: PathBuf },
    UnregisteredHelper { class_name: String },
    /// A helper file with no class declaration.
    UnresolvedClass { guess: String },
    /// A remembered registry that is missing on disk.
    StalePreference { label: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub file: PathBuf,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    fn new(file: PathBuf, kind: FindingKind, config: &Config) -> Self {
        let (severity, message) = match &kind {
            FindingKind::NestedRegistry { other } => (
                if config.prevent_nesting {
                    Severity::Error
                } else {
                    Severity::Warning
                },
                format!("nested with registry {}", other.display()),
            ),
            FindingKind::OrphanedEntry {
                class_name,
                specifier,
            } => (
                Severity::Error,
                format!("{} is imported from '{}', which no longer exists", class_name, specifier),
            ),
            FindingKind::CircularImport { accessor, registry } => (
                Severity::Error,
                format!("imports its own accessor {} from {}", accessor, registry.display()),
            ),
            FindingKind::DuplicateClass { class_name, other } => (
                Severity::Warning,
                format!("class {} is also declared in {}", class_name, other.display()),
            ),
            FindingKind::UnregisteredHelper { class_name } => (
                Severity::Info,
                format!("{} is not registered in any registry", class_name),
            ),
            FindingKind::UnresolvedClass { guess } => (
                Severity::Warning,
                format!("no class declaration found (file name suggests {})", guess),
            ),
            FindingKind::StalePreference { label } => (
                Severity::Warning,
                format!("remembered registry '{}' no longer exists", label),
            ),
        };
        Self {
            file,
            severity,
            kind,
            message,
        }
    }
}

/// Summary statistics from a validation run.
#[derive(Debug, Default, Serialize)]
pub struct Diagnostics {
    pub files_scanned: usize,
    pub registries: usize,
    pub helpers: usize,
    pub registered_helpers: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
    pub diagnostics: Diagnostics,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.errors > 0
    }
}

/// A registry entry whose helper file is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedEntry {
    pub class_name: String,
    pub accessor: String,
    pub specifier: String,
}

/// A line outside the registry that mentions a helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalReference {
    pub file: PathBuf,
    /// 1-indexed.
    pub line: usize,
    pub text: String,
}

/// Validates every registry and helper under `root`.
pub fn validate_workspace(
    root: &Path,
    config: &Config,
    prefs: &PreferenceStore,
) -> Result<ValidationReport> {
    let root = naming::normalize(root);
    let files = scanner::collect_source_files(&root, config);

    let mut registries = Vec::new();
    let mut helpers = Vec::new();
    for file in &files {
        match scanner::classify_file(file, config) {
            FileKind::Registry => registries.push(file.clone()),
            FileKind::Helper(class_name) => {
                helpers.push(HelperClassDescriptor::new(file.clone(), class_name, config))
            }
            FileKind::Unreadable => {}
        }
    }

    let mut findings = Vec::new();
    findings.extend(nested_registries(&registries, config));

    let mut registered_files = HashSet::new();
    let mut registered_classes = HashSet::new();
    for registry_path in &registries {
        let content = std::fs::read_to_string(registry_path)
            .with_context(|| format!("Failed to read {}", registry_path.display()))?;
        let zones = registry::parse(&content);
        for accessor in zones.helper_accessors() {
            let Some(class_name) = accessor.return_type.as_deref() else {
                continue;
            };
            registered_classes.insert(class_name.to_string());
            if let Some(file) = helper_file(registry_path, &zones, class_name, &root, config) {
                registered_files.insert(file);
            }
        }
        for orphan in orphans_in(registry_path, &zones, &root, config) {
            findings.push(Finding::new(
                registry_path.clone(),
                FindingKind::OrphanedEntry {
                    class_name: orphan.class_name,
                    specifier: orphan.specifier,
                },
                config,
            ));
        }
    }

    let mut first_declaration: HashMap<String, PathBuf> = HashMap::new();
    for helper in &helpers {
        let is_helper_file = helper
            .file_path
            .to_string_lossy()
            .ends_with(&config.helper_extension);
        let class_name = match &helper.class_name {
            ClassName::Declared(name) => name,
            ClassName::Unresolved { guess } => {
                if is_helper_file {
                    findings.push(Finding::new(
                        helper.file_path.clone(),
                        FindingKind::UnresolvedClass {
                            guess: guess.clone(),
                        },
                        config,
                    ));
                }
                continue;
            }
        };

        match first_declaration.get(class_name) {
            Some(other) => findings.push(Finding::new(
                helper.file_path.clone(),
                FindingKind::DuplicateClass {
                    class_name: class_name.clone(),
                    other: other.clone(),
                },
                config,
            )),
            None => {
                first_declaration.insert(class_name.clone(), helper.file_path.clone());
            }
        }

        let text = std::fs::read_to_string(&helper.file_path).unwrap_or_default();
        for registry_path in &registries {
            if rewriter::helper_imports_own_accessor(
                &text,
                &helper.file_path,
                registry_path,
                &helper.accessor_name,
                &root,
                config,
            ) {
                findings.push(Finding::new(
                    helper.file_path.clone(),
                    FindingKind::CircularImport {
                        accessor: helper.accessor_name.clone(),
                        registry: registry_path.clone(),
                    },
                    config,
                ));
            }
        }

        if is_helper_file
            && !registered_files.contains(&helper.file_path)
            && !registered_classes.contains(class_name)
        {
            findings.push(Finding::new(
                helper.file_path.clone(),
                FindingKind::UnregisteredHelper {
                    class_name: class_name.clone(),
                },
                config,
            ));
        }
    }

    for entry in prefs.list() {
        if entry.path.starts_with(&root) && entry.is_stale() {
            findings.push(Finding::new(
                entry.path.clone(),
                FindingKind::StalePreference { label: entry.label },
                config,
            ));
        }
    }

    findings.sort_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.file.cmp(&b.file)));

    let diagnostics = Diagnostics {
        files_scanned: files.len(),
        registries: registries.len(),
        helpers: helpers.len(),
        registered_helpers: helpers
            .iter()
            .filter(|h| registered_files.contains(&h.file_path))
            .count(),
        errors: findings.iter().filter(|f| f.severity == Severity::Error).count(),
        warnings: findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count(),
    };

    Ok(ValidationReport {
        findings,
        diagnostics,
    })
}

/// One finding per pair of registries sharing a directory line, reported on
/// the deeper of the two.
fn nested_registries(registries: &[PathBuf], config: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (i, a) in registries.iter().enumerate() {
        for b in &registries[i + 1..] {
            let (Some(dir_a), Some(dir_b)) = (a.parent(), b.parent()) else {
                continue;
            };
            let (outer, inner) = if dir_b.starts_with(dir_a) {
                (a, b)
            } else if dir_a.starts_with(dir_b) {
                (b, a)
            } else {
                continue;
            };
            findings.push(Finding::new(
                inner.clone(),
                FindingKind::NestedRegistry {
                    other: outer.clone(),
                },
                config,
            ));
        }
    }
    findings
}

/// Registry entries whose imported helper file no longer exists.
///
/// Package imports are never orphans.
pub fn find_orphaned_entries(
    registry_path: &Path,
    root: &Path,
    config: &Config,
) -> Result<Vec<OrphanedEntry>> {
    let content = std::fs::read_to_string(registry_path)
        .with_context(|| format!("Failed to read {}", registry_path.display()))?;
    let zones = registry::parse(&content);
    Ok(orphans_in(registry_path, &zones, root, config))
}

fn orphans_in(
    registry_path: &Path,
    zones: &RegistryZones,
    root: &Path,
    config: &Config,
) -> Vec<OrphanedEntry> {
    let mut orphans = Vec::new();
    for accessor in zones.helper_accessors() {
        let Some(class_name) = accessor.return_type.as_deref() else {
            continue;
        };
        let Some(import) = zones.import_of(class_name) else {
            continue;
        };
        let Some(base) = naming::resolve_import_base(registry_path, &import.specifier, root, config)
        else {
            continue;
        };
        if naming::existing_import_target(&base, config).is_none() {
            orphans.push(OrphanedEntry {
                class_name: class_name.to_string(),
                accessor: accessor.name.clone(),
                specifier: import.specifier.clone(),
            });
        }
    }
    orphans
}

/// The file a registry imports `class_name` from, when it exists.
pub fn helper_file(
    registry_path: &Path,
    zones: &RegistryZones,
    class_name: &str,
    root: &Path,
    config: &Config,
) -> Option<PathBuf> {
    let import = zones.import_of(class_name)?;
    let base = naming::resolve_import_base(registry_path, &import.specifier, root, config)?;
    naming::existing_import_target(&base, config)
}

/// Lines in source files under `root`, other than `exclude`, mentioning
/// `class_name` or `accessor` as a whole word.
pub fn find_external_references(
    root: &Path,
    class_name: &str,
    accessor: &str,
    exclude: &[PathBuf],
    config: &Config,
) -> Vec<ExternalReference> {
    let pattern = format!(
        r"\b(?:{}|{})\b",
        regex::escape(class_name),
        regex::escape(accessor)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    let exclude: HashSet<PathBuf> = exclude.iter().map(|p| naming::normalize(p)).collect();

    let mut references = Vec::new();
    for file in scanner::collect_source_files(root, config) {
        if exclude.contains(&naming::normalize(&file)) {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&file) else {
            continue;
        };
        for (index, line) in text.lines().enumerate() {
            if re.is_match(line) {
                references.push(ExternalReference {
                    file: file.clone(),
                    line: index + 1,
                    text: line.trim().to_string(),
                });
            }
        }
    }
    references
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{render_helper, render_registry};
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn registered_workspace() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let registry = write(dir.path(), "pages/main-factory.ts", &render_registry("MainFactory", &config));
        let login = write(dir.path(), "pages/login.page.ts", &render_helper("LoginPage", &config));
        rewriter::apply_helper_additions(&registry, &[login.clone()], dir.path(), &config).unwrap();
        (dir, registry, login)
    }

    fn kinds(report: &ValidationReport) -> Vec<&FindingKind> {
        report.findings.iter().map(|f| &f.kind).collect()
    }

    #[test]
    fn clean_workspace_has_no_findings() {
        let (dir, _registry, _login) = registered_workspace();
        let report =
            validate_workspace(dir.path(), &Config::default(), &PreferenceStore::in_memory()).unwrap();
        assert!(report.findings.is_empty(), "{:?}", report.findings);
        assert_eq!(report.diagnostics.registries, 1);
        assert_eq!(report.diagnostics.registered_helpers, 1);
    }

    #[test]
    fn deleted_helper_becomes_orphan() {
        let (dir, registry, login) = registered_workspace();
        fs::remove_file(&login).unwrap();

        let orphans = find_orphaned_entries(&registry, dir.path(), &Config::default()).unwrap();
        assert_eq!(
            orphans,
            vec![OrphanedEntry {
                class_name: "LoginPage".to_string(),
                accessor: "getLoginPage".to_string(),
                specifier: "./login.page".to_string(),
            }]
        );

        let report =
            validate_workspace(dir.path(), &Config::default(), &PreferenceStore::in_memory()).unwrap();
        assert!(report.has_errors());
    }

    #[test]
    fn reports_nesting_duplicates_and_unregistered() {
        let (dir, _registry, _login) = registered_workspace();
        let config = Config::default();
        let inner = write(dir.path(), "pages/admin/admin-factory.ts", &render_registry("AdminFactory", &config));
        let dup = write(dir.path(), "pages/admin/login.page.ts", &render_helper("LoginPage", &config));
        let stray = write(dir.path(), "pages/stray.page.ts", &render_helper("StrayPage", &config));
        let blank = write(dir.path(), "pages/blank.page.ts", "export const nothing = 0;\n");

        let report = validate_workspace(dir.path(), &config, &PreferenceStore::in_memory()).unwrap();
        let kinds = kinds(&report);

        assert!(kinds.contains(&&FindingKind::NestedRegistry {
            other: dir.path().join("pages/main-factory.ts")
        }));
        assert!(report.findings.iter().any(|f| f.file == inner));
        // The walk visits pages/admin before pages/login.page.ts.
        assert!(kinds.contains(&&FindingKind::DuplicateClass {
            class_name: "LoginPage".to_string(),
            other: dup,
        }));
        assert!(report.findings.iter().any(|f| f.file == stray
            && f.kind == FindingKind::UnregisteredHelper { class_name: "StrayPage".to_string() }));
        assert!(report.findings.iter().any(|f| f.file == blank
            && matches!(f.kind, FindingKind::UnresolvedClass { .. })));
        assert_eq!(report.findings[0].severity, Severity::Error);
    }

    #[test]
    fn reports_circular_import_and_stale_preference() {
        let (dir, registry, login) = registered_workspace();
        let config = Config::default();
        let text = fs::read_to_string(&login).unwrap();
        fs::write(
            &login,
            format!("import {{ getLoginPage }} from './main-factory';\n{}", text),
        )
        .unwrap();

        let mut prefs = PreferenceStore::in_memory();
        prefs.upsert(&dir.path().join("gone/registry.ts"), Some("Gone")).unwrap();

        let report = validate_workspace(dir.path(), &config, &prefs).unwrap();
        let kinds = kinds(&report);
        assert!(kinds.contains(&&FindingKind::CircularImport {
            accessor: "getLoginPage".to_string(),
            registry,
        }));
        assert!(kinds.contains(&&FindingKind::StalePreference {
            label: "Gone".to_string()
        }));
    }

    #[test]
    fn external_references_skip_excluded_files() {
        let (dir, registry, login) = registered_workspace();
        let spec = write(
            dir.path(),
            "tests/login.spec.ts",
            "import { getLoginPage } from '../pages/main-factory';\n\nconst loginPage = getLoginPage();\n",
        );
        write(dir.path(), "tests/other.spec.ts", "const loginPageCount = 1;\n");

        let refs = find_external_references(
            dir.path(),
            "LoginPage",
            "getLoginPage",
            &[registry, login],
            &Config::default(),
        );
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.file == spec));
        assert_eq!(refs[1].line, 3);
    }
}
