//! Project configuration.
//!
//! Settings live in an optional `page-registry.toml`, discovered by walking up
//! from the workspace root. Every key is optional; missing keys fall back to
//! the defaults below, which match the shape the generator itself emits.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up when no explicit `--config` is given.
pub const CONFIG_FILE_NAME: &str = "page-registry.toml";

/// Casing applied when turning a class name into a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStyle {
    Pascal,
    Camel,
    #[default]
    Kebab,
    Snake,
}

/// Whether generated imports are relative to the importing file or rooted
/// at `import_prefix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStyle {
    #[default]
    Relative,
    Absolute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extension given to newly created helper files.
    pub helper_extension: String,
    /// Extension given to newly created registry files.
    pub registry_extension: String,
    /// Extension of files considered during workspace scans.
    pub source_extension: String,
    /// Suffix appended to helper class names, e.g. `Login` -> `LoginPage`.
    pub class_suffix: String,
    /// Prefix of the private backing field, e.g. `_loginPage`.
    pub field_prefix: String,
    pub file_case: CaseStyle,
    pub class_name_pattern: String,
    pub file_name_pattern: String,
    /// Refuse (unless overridden) to create a registry above or below another one.
    pub prevent_nesting: bool,
    pub import_prefix: String,
    pub import_style: ImportStyle,
    /// Custom registry body; `{{name}}` is replaced by the class name.
    pub registry_template: Option<String>,
    /// Custom helper body; `{{name}}` is replaced by the class name.
    pub helper_template: Option<String>,
    /// Type handed to every helper constructor.
    pub context_type: String,
    /// Module the context type is imported from.
    pub context_module: String,
    /// Name of the registry field holding the shared context.
    pub context_field: String,
    /// Directory name skipped during walks.
    pub dependency_dir: String,
    /// Extra glob patterns excluded from walks, e.g. `"**/generated/**"`.
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            helper_extension: ".page.ts".to_string(),
            registry_extension: ".ts".to_string(),
            source_extension: ".ts".to_string(),
            class_suffix: "Page".to_string(),
            field_prefix: "_".to_string(),
            file_case: CaseStyle::default(),
            class_name_pattern: r"^[A-Z][A-Za-z0-9]*$".to_string(),
            file_name_pattern: r"^[A-Za-z][A-Za-z0-9_.-]*$".to_string(),
            prevent_nesting: true,
            import_prefix: String::new(),
            import_style: ImportStyle::default(),
            registry_template: None,
            helper_template: None,
            context_type: "Page".to_string(),
            context_module: "@playwright/test".to_string(),
            context_field: "page".to_string(),
            dependency_dir: "node_modules".to_string(),
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Parses a config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&source)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` if given, else the nearest `page-registry.toml` at or
    /// above `root`, else the defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match discover(root) {
            Some(path) => {
                tracing::debug!(config = %path.display(), "loading configuration");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Checks that the validation patterns compile.
    pub fn validate(&self) -> Result<()> {
        Regex::new(&self.class_name_pattern).with_context(|| {
            format!("Invalid class_name_pattern '{}'", self.class_name_pattern)
        })?;
        Regex::new(&self.file_name_pattern)
            .with_context(|| format!("Invalid file_name_pattern '{}'", self.file_name_pattern))?;
        for pattern in &self.exclude {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid exclude pattern '{}'", pattern))?;
        }
        Ok(())
    }

    /// Validates a class name against `class_name_pattern`.
    pub fn check_class_name(&self, name: &str) -> Result<(), String> {
        check_pattern(&self.class_name_pattern, name, "class name")
    }

    /// Validates a file name (without extension) against `file_name_pattern`.
    pub fn check_file_name(&self, name: &str) -> Result<(), String> {
        check_pattern(&self.file_name_pattern, name, "file name")
    }

    pub fn exclude_patterns(&self) -> Vec<glob::Pattern> {
        self.exclude
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect()
    }
}

fn check_pattern(pattern: &str, value: &str, what: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("The {} must not be empty", what));
    }
    let re = Regex::new(pattern).map_err(|e| format!("Invalid {} pattern: {}", what, e))?;
    if re.is_match(value) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid {} (expected {})", value, what, pattern))
    }
}

/// Finds the nearest config file at or above `start`.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_for_missing_keys() {
        let config: Config = toml::from_str("class_suffix = \"Screen\"").unwrap();
        assert_eq!(config.class_suffix, "Screen");
        assert_eq!(config.field_prefix, "_");
        assert_eq!(config.file_case, CaseStyle::Kebab);
        assert!(config.prevent_nesting);
    }

    #[test]
    fn parses_enums_lowercase() {
        let config: Config =
            toml::from_str("file_case = \"snake\"\nimport_style = \"absolute\"").unwrap();
        assert_eq!(config.file_case, CaseStyle::Snake);
        assert_eq!(config.import_style, ImportStyle::Absolute);
    }

    #[test]
    fn class_name_check_rejects_lowercase_and_empty() {
        let config = Config::default();
        assert!(config.check_class_name("LoginPage").is_ok());
        assert!(config.check_class_name("loginPage").is_err());
        assert!(config.check_class_name("").is_err());
    }

    #[test]
    fn invalid_pattern_fails_validation() {
        let config = Config {
            class_name_pattern: "([".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn discovers_config_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "field_prefix = \"m_\"\n").unwrap();

        let config = Config::load(&nested, None).unwrap();
        assert_eq!(config.field_prefix, "m_");
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config.helper_extension, ".page.ts");
    }
}
